//! Cadence handling: turn the configured frequency into a step interval once,
//! then decide per step whether the expensive engine runs.

use crate::config::FrequencyUnits;
use crate::error::{DiagError, DiagResult};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Number of model steps between two active steps. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepInterval(u64);

impl StepInterval {
    pub fn new(steps: u64) -> DiagResult<Self> {
        if steps == 0 {
            return Err(DiagError::config("step_interval", 0.0, "must be at least 1"));
        }
        Ok(Self(steps))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }

    /// True when `step` is an active step for this interval.
    #[inline]
    pub fn is_active(self, step: u64) -> bool {
        cosp_do(self, step)
    }
}

/// Convert a cadence into a step interval.
///
/// `hours` requires the (floored) timestep to divide 3600 s; the interval is
/// then `3600 * frequency / dt`, computed in floating point and truncated.
pub fn normalize_frequency(
    frequency: i64,
    units: FrequencyUnits,
    dt_seconds: f64,
) -> DiagResult<StepInterval> {
    if frequency < 1 {
        return Err(DiagError::config(
            "frequency",
            frequency as f64,
            "must be at least 1",
        ));
    }

    match units {
        FrequencyUnits::Steps => StepInterval::new(frequency as u64),
        FrequencyUnits::Hours => {
            if !dt_seconds.is_finite() || dt_seconds < 1.0 {
                return Err(DiagError::config(
                    "dt",
                    dt_seconds,
                    "timestep must be a finite number of seconds >= 1",
                ));
            }
            let whole_dt = dt_seconds.floor() as u64;
            if (SECONDS_PER_HOUR as u64) % whole_dt != 0 {
                return Err(DiagError::TimestepNotDividingHour { dt_seconds });
            }
            let steps = (SECONDS_PER_HOUR * frequency as f64 / dt_seconds) as u64;
            StepInterval::new(steps)
        }
    }
}

/// Active iff `step mod N == 0`. Step 0 is always active.
#[inline]
pub fn cosp_do(interval: StepInterval, step: u64) -> bool {
    step % interval.get() == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_steps_passthrough() {
        let n = normalize_frequency(4, FrequencyUnits::Steps, 1800.0).unwrap();
        assert_eq!(n.get(), 4);
    }

    #[test]
    fn test_hours_to_steps() {
        let n = normalize_frequency(1, FrequencyUnits::Hours, 300.0).unwrap();
        assert_eq!(n.get(), 12);
        let n = normalize_frequency(3, FrequencyUnits::Hours, 1800.0).unwrap();
        assert_eq!(n.get(), 6);
        let n = normalize_frequency(1, FrequencyUnits::Hours, 3600.0).unwrap();
        assert_eq!(n.get(), 1);
    }

    #[test]
    fn test_hours_requires_divisor_of_hour() {
        let err = normalize_frequency(1, FrequencyUnits::Hours, 450.0).unwrap_err();
        assert_eq!(err, DiagError::TimestepNotDividingHour { dt_seconds: 450.0 });
        assert!(normalize_frequency(1, FrequencyUnits::Hours, 7200.0).is_err());
    }

    #[test]
    fn test_fractional_dt_uses_floor_for_check() {
        // floor(300.5) = 300 divides the hour; the interval truncates 11.98.
        let n = normalize_frequency(1, FrequencyUnits::Hours, 300.5).unwrap();
        assert_eq!(n.get(), 11);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(normalize_frequency(0, FrequencyUnits::Steps, 300.0).is_err());
        assert!(normalize_frequency(-2, FrequencyUnits::Hours, 300.0).is_err());
        assert!(normalize_frequency(1, FrequencyUnits::Hours, 0.5).is_err());
        assert!(normalize_frequency(1, FrequencyUnits::Hours, f64::NAN).is_err());
        assert!(StepInterval::new(0).is_err());
    }

    #[test]
    fn test_step_zero_always_active() {
        for n in 1..50 {
            assert!(cosp_do(StepInterval::new(n).unwrap(), 0));
        }
    }

    proptest! {
        #[test]
        fn decide_matches_modulo(n in 1u64..10_000, step in 0u64..u64::MAX) {
            let interval = StepInterval::new(n).unwrap();
            prop_assert_eq!(cosp_do(interval, step), step % n == 0);
            prop_assert_eq!(interval.is_active(step), cosp_do(interval, step));
        }

        #[test]
        fn interval_of_one_is_always_active(step in 0u64..u64::MAX) {
            prop_assert!(cosp_do(StepInterval::new(1).unwrap(), step));
        }
    }
}
