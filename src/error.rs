//! Error type shared by every stage of the diagnostics driver.
//!
//! Three families exist: configuration errors (raised while building the
//! driver), invariant violations (raised during a step, e.g. a layer with
//! non-positive thickness) and engine failures (propagated unchanged from the
//! external diagnostic engine). None of them is recovered locally.

use thiserror::Error;

/// Result alias used across the crate.
pub type DiagResult<T> = Result<T, DiagError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiagError {
    // ── Configuration ─────────────────────────────────────────────────────
    /// Frequency unit token other than `steps` or `hours`.
    #[error("cosp_frequency_units {0} not supported")]
    UnsupportedUnits(String),

    /// Hour cadence requested but the timestep does not divide one hour.
    #[error("cosp_frequency_units is hours but dt ({dt_seconds} s) does not evenly divide 1 hour")]
    TimestepNotDividingHour { dt_seconds: f64 },

    /// Other out-of-range configuration value.
    #[error("invalid configuration: {field}={value} ({reason})")]
    InvalidConfig {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    // ── Invariant violations ──────────────────────────────────────────────
    /// Layer thickness that is NaN, infinite, zero or negative.
    #[error("invalid layer thickness {value} at column {column}, level {level}")]
    InvalidThickness {
        column: usize,
        level: usize,
        value: f64,
    },

    /// Interface height that is non-finite or does not increase upward.
    #[error("non-monotonic interface height at column {column}, interface {interface}: {below} -> {above}")]
    NonMonotonicInterface {
        column: usize,
        interface: usize,
        below: f64,
        above: f64,
    },

    /// Mid-level height that is not strictly inside its layer.
    #[error("mid-level height {mid} outside layer ({below}, {above}) at column {column}, level {level}")]
    MidOutOfBounds {
        column: usize,
        level: usize,
        below: f64,
        mid: f64,
        above: f64,
    },

    /// Array whose shape disagrees with the declared column/level/bin counts.
    #[error("shape mismatch for {name}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        name: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    // ── Engine ────────────────────────────────────────────────────────────
    /// Opaque failure reported by the external diagnostic engine.
    #[error("diagnostic engine failed: {0}")]
    Engine(String),
}

impl DiagError {
    /// Shorthand for building an [`DiagError::InvalidConfig`].
    pub fn config(field: &'static str, value: f64, reason: &'static str) -> Self {
        DiagError::InvalidConfig {
            field,
            value,
            reason,
        }
    }

    /// True for errors that can only come from construction-time settings.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DiagError::UnsupportedUnits(_)
                | DiagError::TimestepNotDividingHour { .. }
                | DiagError::InvalidConfig { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_problem() {
        let err = DiagError::UnsupportedUnits("days".to_string());
        assert_eq!(err.to_string(), "cosp_frequency_units days not supported");

        let err = DiagError::InvalidThickness {
            column: 2,
            level: 5,
            value: -1.0,
        };
        assert!(err.to_string().contains("column 2, level 5"));
    }

    #[test]
    fn test_configuration_classification() {
        assert!(DiagError::TimestepNotDividingHour { dt_seconds: 450.0 }.is_configuration());
        assert!(DiagError::config("frequency", 0.0, "must be >= 1").is_configuration());
        assert!(!DiagError::Engine("boom".into()).is_configuration());
    }
}
