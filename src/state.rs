use ndarray::{ArrayView1, ArrayView2};

use crate::error::DiagResult;
use crate::fields::{self, FieldSpec};

/// Read-only atmospheric column state for one invocation.
///
/// Profiles are `[C, L]` (or `[C, L+1]` for `p_int`), with level 0 at the
/// bottom of the column. `sunlit` holds 0/1 per column.
#[derive(Clone, Copy)]
pub struct ColumnState<'a> {
    pub p_mid: ArrayView2<'a, f64>,
    pub p_int: ArrayView2<'a, f64>,
    pub t_mid: ArrayView2<'a, f64>,
    pub qv: ArrayView2<'a, f64>,
    pub qc: ArrayView2<'a, f64>,
    pub qi: ArrayView2<'a, f64>,
    pub cldfrac: ArrayView2<'a, f64>,
    pub reff_qc: ArrayView2<'a, f64>,
    pub reff_qi: ArrayView2<'a, f64>,
    pub dtau067: ArrayView2<'a, f64>,
    pub dtau105: ArrayView2<'a, f64>,
    pub pseudo_density: ArrayView2<'a, f64>,
    pub phis: ArrayView1<'a, f64>,
    pub skt: ArrayView1<'a, f64>,
    pub sunlit: ArrayView1<'a, f64>,
}

impl ColumnState<'_> {
    pub fn ncol(&self) -> usize {
        self.p_mid.nrows()
    }

    pub fn nlev(&self) -> usize {
        self.p_mid.ncols()
    }

    fn shapes(&self) -> [(&'static FieldSpec, &[usize]); 15] {
        [
            (&fields::P_MID, self.p_mid.shape()),
            (&fields::P_INT, self.p_int.shape()),
            (&fields::T_MID, self.t_mid.shape()),
            (&fields::QV, self.qv.shape()),
            (&fields::QC, self.qc.shape()),
            (&fields::QI, self.qi.shape()),
            (&fields::CLDFRAC, self.cldfrac.shape()),
            (&fields::REFF_QC, self.reff_qc.shape()),
            (&fields::REFF_QI, self.reff_qi.shape()),
            (&fields::DTAU067, self.dtau067.shape()),
            (&fields::DTAU105, self.dtau105.shape()),
            (&fields::PSEUDO_DENSITY, self.pseudo_density.shape()),
            (&fields::PHIS, self.phis.shape()),
            (&fields::SURF_RADIATIVE_T, self.skt.shape()),
            (&fields::SUNLIT, self.sunlit.shape()),
        ]
    }

    /// Check every array against the driver's column and level counts.
    pub fn validate(&self, ncol: usize, nlev: usize) -> DiagResult<()> {
        for (spec, shape) in self.shapes() {
            spec.check_shape(shape, ncol, nlev)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use ndarray::{Array1, Array2};

    use super::ColumnState;

    /// Owned backing storage for a [`ColumnState`] in tests.
    pub(crate) struct OwnedState {
        pub p_mid: Array2<f64>,
        pub p_int: Array2<f64>,
        pub t_mid: Array2<f64>,
        pub qv: Array2<f64>,
        pub zeros: Array2<f64>,
        pub pseudo_density: Array2<f64>,
        pub phis: Array1<f64>,
        pub skt: Array1<f64>,
        pub sunlit: Array1<f64>,
    }

    impl OwnedState {
        /// Stratified atmosphere from 1000 hPa at the surface to 100 hPa.
        pub fn new(ncol: usize, nlev: usize, sunlit: &[f64]) -> Self {
            assert_eq!(sunlit.len(), ncol);
            let dp = 90_000.0 / nlev as f64;
            let p_int = Array2::from_shape_fn((ncol, nlev + 1), |(_, k)| 100_000.0 - dp * k as f64);
            let p_mid = Array2::from_shape_fn((ncol, nlev), |(_, k)| 100_000.0 - dp * (k as f64 + 0.5));
            let t_mid = Array2::from_shape_fn((ncol, nlev), |(i, k)| {
                288.0 - 70.0 * (k as f64 + 0.5) / nlev as f64 + i as f64
            });
            let qv = Array2::from_shape_fn((ncol, nlev), |(_, k)| 0.01 / (k as f64 + 1.0));
            Self {
                p_mid,
                p_int,
                t_mid,
                qv,
                zeros: Array2::zeros((ncol, nlev)),
                pseudo_density: Array2::from_elem((ncol, nlev), dp),
                phis: Array1::from_shape_fn(ncol, |i| 9.81 * 100.0 * i as f64),
                skt: Array1::from_elem(ncol, 290.0),
                sunlit: Array1::from(sunlit.to_vec()),
            }
        }

        pub fn view(&self) -> ColumnState<'_> {
            ColumnState {
                p_mid: self.p_mid.view(),
                p_int: self.p_int.view(),
                t_mid: self.t_mid.view(),
                qv: self.qv.view(),
                qc: self.zeros.view(),
                qi: self.zeros.view(),
                cldfrac: self.zeros.view(),
                reff_qc: self.zeros.view(),
                reff_qi: self.zeros.view(),
                dtau067: self.zeros.view(),
                dtau105: self.zeros.view(),
                pseudo_density: self.pseudo_density.view(),
                phis: self.phis.view(),
                skt: self.skt.view(),
                sunlit: self.sunlit.view(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::OwnedState;
    use crate::error::DiagError;
    use ndarray::Array2;

    #[test]
    fn test_validate_accepts_matching_shapes() {
        let owned = OwnedState::new(3, 4, &[1.0, 0.0, 1.0]);
        let state = owned.view();
        assert_eq!((state.ncol(), state.nlev()), (3, 4));
        assert!(state.validate(3, 4).is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_interface_count() {
        let owned = OwnedState::new(3, 4, &[1.0, 0.0, 1.0]);
        let bad_int = Array2::<f64>::zeros((3, 4));
        let mut state = owned.view();
        state.p_int = bad_int.view();
        match state.validate(3, 4) {
            Err(DiagError::ShapeMismatch { name, .. }) => assert_eq!(name, "p_int"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
