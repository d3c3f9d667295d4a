use ndarray::{Array, Array1, ArrayView, ArrayView1, Axis, Dimension, RemoveAxis, Zip};

use crate::error::{DiagError, DiagResult};

/// Recovers daytime means from night-zeroed output series.
///
/// Sums the masked statistic and the `cosp_sunlit` echo over every step
/// (passive steps contribute zero to both) and divides per column. Columns
/// that were never lit at an active step yield NaN.
#[derive(Debug, Clone)]
pub struct DaytimeMean<D: Dimension> {
    weighted: Array<f64, D>,
    weight: Array1<f64>,
    samples: usize,
}

impl<D: RemoveAxis> DaytimeMean<D> {
    /// `shape` is the output field shape; axis 0 is the column axis.
    pub fn new(shape: D) -> Self {
        let ncol = shape.slice().first().copied().unwrap_or(0);
        Self {
            weighted: Array::zeros(shape),
            weight: Array1::zeros(ncol),
            samples: 0,
        }
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn accumulate(&mut self, masked: ArrayView<f64, D>, echo: ArrayView1<f64>) -> DiagResult<()> {
        if masked.shape() != self.weighted.shape() {
            return Err(DiagError::ShapeMismatch {
                name: "masked statistic",
                expected: self.weighted.shape().to_vec(),
                actual: masked.shape().to_vec(),
            });
        }
        if echo.len() != self.weight.len() {
            return Err(DiagError::ShapeMismatch {
                name: "cosp_sunlit",
                expected: vec![self.weight.len()],
                actual: echo.shape().to_vec(),
            });
        }
        self.weighted += &masked;
        self.weight += &echo;
        self.samples += 1;
        Ok(())
    }

    /// `sum(M * X) / sum(M)` per column.
    pub fn mean(&self) -> Array<f64, D> {
        let mut out = self.weighted.clone();
        Zip::from(out.axis_iter_mut(Axis(0)))
            .and(&self.weight)
            .for_each(|mut column, &w| {
                if w > 0.0 {
                    column.mapv_inplace(|v| v / w);
                } else {
                    column.fill(f64::NAN);
                }
            });
        out
    }
}
