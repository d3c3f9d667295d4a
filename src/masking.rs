//! Night masking of the diagnostic outputs.
//!
//! Statistics are only meaningful for sunlit columns. Rather than leaving
//! night or skipped-step values undefined, they are written as exact zeros and
//! the illumination flags are echoed into `cosp_sunlit`, so a downstream time
//! average satisfies `avg(M * X) / avg(M) = avg(X | M)`.

use ndarray::{ArrayView1, Axis, Zip};
use rayon::prelude::*;

use crate::error::{DiagError, DiagResult};
use crate::outputs::DiagnosticOutputs;

#[inline]
fn is_unlit(flag: f64) -> bool {
    flag == 0.0
}

/// Apply the masking policy for one step.
///
/// - `active == false`: every entry of every output, echo included, is zeroed.
/// - `active == true`: the echo takes the illumination flags and every entry
///   of an unlit column is zeroed; lit columns are left as the engine wrote
///   them.
pub fn apply_mask(
    outputs: &mut DiagnosticOutputs,
    sunlit: ArrayView1<f64>,
    active: bool,
) -> DiagResult<()> {
    if sunlit.len() != outputs.ncol() {
        return Err(DiagError::ShapeMismatch {
            name: "sunlit",
            expected: vec![outputs.ncol()],
            actual: sunlit.shape().to_vec(),
        });
    }

    if active {
        outputs.sunlit.assign(&sunlit);
        zero_unlit_columns(outputs, sunlit);
    } else {
        zero_all(outputs);
    }

    log::trace!(
        "masked {} columns ({} unlit, active={active})",
        sunlit.len(),
        sunlit.iter().filter(|&&s| is_unlit(s)).count()
    );
    Ok(())
}

fn zero_all(outputs: &mut DiagnosticOutputs) {
    outputs.scalars.par_iter_mut().for_each(|a| a.fill(0.0));
    outputs.histograms.par_iter_mut().for_each(|h| h.fill(0.0));
    outputs.sunlit.fill(0.0);
}

fn zero_unlit_columns(outputs: &mut DiagnosticOutputs, sunlit: ArrayView1<f64>) {
    outputs.scalars.par_iter_mut().for_each(|a| {
        Zip::from(a).and(&sunlit).for_each(|v, &lit| {
            if is_unlit(lit) {
                *v = 0.0;
            }
        });
    });

    outputs.histograms.par_iter_mut().for_each(|h| {
        Zip::from(h.axis_iter_mut(Axis(0)))
            .and(&sunlit)
            .for_each(|mut column, &lit| {
                if is_unlit(lit) {
                    column.fill(0.0);
                }
            });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::{HistogramOutput, ScalarOutput};
    use ndarray::array;

    /// Buffers where every entry is distinct and non-zero.
    fn engine_like(ncol: usize) -> DiagnosticOutputs {
        let mut out = DiagnosticOutputs::zeros(ncol);
        let mut next = 1.0;
        for a in out.scalars.iter_mut() {
            a.mapv_inplace(|_| {
                next += 1.0;
                next
            });
        }
        for h in out.histograms.iter_mut() {
            h.mapv_inplace(|_| {
                next += 0.5;
                next
            });
        }
        out.sunlit.fill(7.0);
        out
    }

    #[test]
    fn test_passive_step_zeroes_everything() {
        let mut out = engine_like(3);
        apply_mask(&mut out, array![1.0, 1.0, 1.0].view(), false).unwrap();
        assert!(out.all_values().all(|v| v == 0.0));
        assert_eq!(out.sunlit_echo(), array![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_active_step_zeroes_unlit_columns_only() {
        let original = engine_like(3);
        let mut out = original.clone();
        apply_mask(&mut out, array![1.0, 0.0, 1.0].view(), true).unwrap();

        assert_eq!(out.sunlit_echo(), array![1.0, 0.0, 1.0]);
        assert!(out.column_values(1).all(|v| v == 0.0));
        for col in [0, 2] {
            assert!(out.column_values(col).eq(original.column_values(col)));
        }
        assert_eq!(
            out.histogram(HistogramOutput::MisrCthtau).index_axis(Axis(0), 0),
            original.histogram(HistogramOutput::MisrCthtau).index_axis(Axis(0), 0)
        );
        assert_eq!(out.scalar(ScalarOutput::ModisReffAll)[1], 0.0);
    }

    #[test]
    fn test_active_all_lit_keeps_engine_values() {
        let original = engine_like(4);
        let mut out = original.clone();
        let sunlit = array![1.0, 1.0, 1.0, 1.0];
        apply_mask(&mut out, sunlit.view(), true).unwrap();
        assert_eq!(out.scalars, original.scalars);
        assert_eq!(out.histograms, original.histograms);
        assert_eq!(out.sunlit_echo(), sunlit);
    }

    #[test]
    fn test_active_all_dark_matches_passive() {
        let mut active = engine_like(2);
        let mut passive = engine_like(2);
        apply_mask(&mut active, array![0.0, 0.0].view(), true).unwrap();
        apply_mask(&mut passive, array![1.0, 1.0].view(), false).unwrap();
        assert_eq!(active, passive);
    }

    #[test]
    fn test_length_mismatch() {
        let mut out = engine_like(3);
        let err = apply_mask(&mut out, array![1.0, 0.0].view(), true).unwrap_err();
        assert!(matches!(err, DiagError::ShapeMismatch { name: "sunlit", .. }));
    }
}
