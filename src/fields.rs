//! Static catalog of the named arrays read and written by the driver.
//!
//! Each entry carries a stable identifier, a layout (which determines the
//! expected shape for a given column/level count) and a physical unit. The
//! tables are resolved once; nothing here is looked up by string per step
//! except through the Python binding.

use crate::config::{NUM_CTH, NUM_CTP, NUM_IWP, NUM_LWP, NUM_REI, NUM_REL, NUM_TAU};
use crate::error::{DiagError, DiagResult};

/// Attribute attached to every masked output.
pub const NIGHT_ZERO_NOTE: &str = "Night values are zero; divide by cosp_sunlit to get daytime mean";

/// Joint-histogram families and their two binned axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistogramKind {
    /// Optical depth × cloud-top pressure.
    CtpTau,
    /// Optical depth × cloud-top height.
    CthTau,
    /// Liquid water path × liquid effective radius.
    LwpRel,
    /// Ice water path × ice effective radius.
    IwpRei,
}

impl HistogramKind {
    pub fn bins(self) -> (usize, usize) {
        match self {
            HistogramKind::CtpTau => (NUM_TAU, NUM_CTP),
            HistogramKind::CthTau => (NUM_TAU, NUM_CTH),
            HistogramKind::LwpRel => (NUM_LWP, NUM_REL),
            HistogramKind::IwpRei => (NUM_IWP, NUM_REI),
        }
    }

    pub fn axis_names(self) -> (&'static str, &'static str) {
        match self {
            HistogramKind::CtpTau => ("cosp_tau", "cosp_prs"),
            HistogramKind::CthTau => ("cosp_tau", "cosp_cth"),
            HistogramKind::LwpRel => ("cosp_lwp", "cosp_reffliq"),
            HistogramKind::IwpRei => ("cosp_iwp", "cosp_reffice"),
        }
    }
}

/// Shape family of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLayout {
    /// One value per column, `[C]`.
    Column,
    /// Mid-level profile, `[C, L]`.
    Mid,
    /// Interface profile, `[C, L+1]`.
    Interface,
    /// Per-column joint histogram, `[C, nbins_a, nbins_b]`.
    Histogram(HistogramKind),
}

impl FieldLayout {
    pub fn shape(self, ncol: usize, nlev: usize) -> Vec<usize> {
        match self {
            FieldLayout::Column => vec![ncol],
            FieldLayout::Mid => vec![ncol, nlev],
            FieldLayout::Interface => vec![ncol, nlev + 1],
            FieldLayout::Histogram(kind) => {
                let (a, b) = kind.bins();
                vec![ncol, a, b]
            }
        }
    }

    /// Dimension names matching [`FieldLayout::shape`].
    pub fn dims(self) -> Vec<&'static str> {
        match self {
            FieldLayout::Column => vec!["ncol"],
            FieldLayout::Mid => vec!["ncol", "lev"],
            FieldLayout::Interface => vec!["ncol", "ilev"],
            FieldLayout::Histogram(kind) => {
                let (a, b) = kind.axis_names();
                vec!["ncol", a, b]
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub layout: FieldLayout,
    pub unit: &'static str,
}

impl FieldSpec {
    pub const fn new(name: &'static str, layout: FieldLayout, unit: &'static str) -> Self {
        Self { name, layout, unit }
    }

    /// Compare an actual shape against the one implied by the layout.
    pub fn check_shape(&self, actual: &[usize], ncol: usize, nlev: usize) -> DiagResult<()> {
        let expected = self.layout.shape(ncol, nlev);
        if actual != expected.as_slice() {
            return Err(DiagError::ShapeMismatch {
                name: self.name,
                expected,
                actual: actual.to_vec(),
            });
        }
        Ok(())
    }
}

// ── Inputs ────────────────────────────────────────────────────────────────

pub const P_MID: FieldSpec = FieldSpec::new("p_mid", FieldLayout::Mid, "Pa");
pub const P_INT: FieldSpec = FieldSpec::new("p_int", FieldLayout::Interface, "Pa");
pub const T_MID: FieldSpec = FieldSpec::new("T_mid", FieldLayout::Mid, "K");
pub const QV: FieldSpec = FieldSpec::new("qv", FieldLayout::Mid, "kg/kg");
pub const QC: FieldSpec = FieldSpec::new("qc", FieldLayout::Mid, "kg/kg");
pub const QI: FieldSpec = FieldSpec::new("qi", FieldLayout::Mid, "kg/kg");
pub const CLDFRAC: FieldSpec = FieldSpec::new("cldfrac_rad", FieldLayout::Mid, "1");
pub const REFF_QC: FieldSpec = FieldSpec::new("eff_radius_qc", FieldLayout::Mid, "micron");
pub const REFF_QI: FieldSpec = FieldSpec::new("eff_radius_qi", FieldLayout::Mid, "micron");
pub const DTAU067: FieldSpec = FieldSpec::new("dtau067", FieldLayout::Mid, "1");
pub const DTAU105: FieldSpec = FieldSpec::new("dtau105", FieldLayout::Mid, "1");
pub const PSEUDO_DENSITY: FieldSpec = FieldSpec::new("pseudo_density", FieldLayout::Mid, "Pa");
pub const PHIS: FieldSpec = FieldSpec::new("phis", FieldLayout::Column, "m2/s2");
pub const SURF_RADIATIVE_T: FieldSpec = FieldSpec::new("surf_radiative_T", FieldLayout::Column, "K");
pub const SUNLIT: FieldSpec = FieldSpec::new("sunlit", FieldLayout::Column, "1");

pub const INPUT_FIELDS: [FieldSpec; 15] = [
    P_MID,
    P_INT,
    T_MID,
    QV,
    QC,
    QI,
    CLDFRAC,
    REFF_QC,
    REFF_QI,
    DTAU067,
    DTAU105,
    PSEUDO_DENSITY,
    PHIS,
    SURF_RADIATIVE_T,
    SUNLIT,
];

/// Illumination echo written at the diagnostics cadence.
pub const COSP_SUNLIT: FieldSpec = FieldSpec::new("cosp_sunlit", FieldLayout::Column, "1");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_shapes() {
        assert_eq!(FieldLayout::Column.shape(3, 4), vec![3]);
        assert_eq!(FieldLayout::Mid.shape(3, 4), vec![3, 4]);
        assert_eq!(FieldLayout::Interface.shape(3, 4), vec![3, 5]);
        assert_eq!(
            FieldLayout::Histogram(HistogramKind::CthTau).shape(3, 4),
            vec![3, 7, 16]
        );
        assert_eq!(
            FieldLayout::Histogram(HistogramKind::LwpRel).shape(2, 4),
            vec![2, 7, 6]
        );
    }

    #[test]
    fn test_dims_follow_shape() {
        assert_eq!(FieldLayout::Interface.dims(), vec!["ncol", "ilev"]);
        assert_eq!(
            FieldLayout::Histogram(HistogramKind::IwpRei).dims(),
            vec!["ncol", "cosp_iwp", "cosp_reffice"]
        );
        let layouts = [
            FieldLayout::Column,
            FieldLayout::Mid,
            FieldLayout::Histogram(HistogramKind::CtpTau),
            FieldLayout::Histogram(HistogramKind::CthTau),
            FieldLayout::Histogram(HistogramKind::LwpRel),
        ];
        for layout in layouts {
            assert_eq!(layout.dims().len(), layout.shape(2, 3).len());
        }
    }

    #[test]
    fn test_check_shape_reports_mismatch() {
        assert!(P_INT.check_shape(&[3, 5], 3, 4).is_ok());
        let err = P_INT.check_shape(&[3, 4], 3, 4).unwrap_err();
        assert_eq!(
            err,
            DiagError::ShapeMismatch {
                name: "p_int",
                expected: vec![3, 5],
                actual: vec![3, 4],
            }
        );
    }

    #[test]
    fn test_input_names_are_unique() {
        let mut names: Vec<_> = INPUT_FIELDS.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), INPUT_FIELDS.len());
    }
}
