//! Output buffers written by the engine and the masking pass.

use ndarray::{Array1, Array3, ArrayView1, ArrayView3, ArrayViewMut1, ArrayViewMut3};

use crate::error::DiagResult;
use crate::fields::{FieldLayout, FieldSpec, HistogramKind, COSP_SUNLIT, NIGHT_ZERO_NOTE};

/// Scalar-per-column statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarOutput {
    IsccpCldtot,
    ModisCldtot,
    ModisClwtot,
    ModisClitot,
    ModisTaut,
    ModisTauw,
    ModisTaui,
    ModisReffw,
    ModisReffi,
    ModisLwp,
    ModisIwp,
    ModisCldQ06,
    ModisNdQ06,
    ModisLwpQ06,
    ModisTauQ06,
    ModisReffQ06,
    ModisCldAll,
    ModisNdAll,
    ModisLwpAll,
    ModisTauAll,
    ModisReffAll,
}

impl ScalarOutput {
    pub const ALL: [ScalarOutput; 21] = [
        ScalarOutput::IsccpCldtot,
        ScalarOutput::ModisCldtot,
        ScalarOutput::ModisClwtot,
        ScalarOutput::ModisClitot,
        ScalarOutput::ModisTaut,
        ScalarOutput::ModisTauw,
        ScalarOutput::ModisTaui,
        ScalarOutput::ModisReffw,
        ScalarOutput::ModisReffi,
        ScalarOutput::ModisLwp,
        ScalarOutput::ModisIwp,
        ScalarOutput::ModisCldQ06,
        ScalarOutput::ModisNdQ06,
        ScalarOutput::ModisLwpQ06,
        ScalarOutput::ModisTauQ06,
        ScalarOutput::ModisReffQ06,
        ScalarOutput::ModisCldAll,
        ScalarOutput::ModisNdAll,
        ScalarOutput::ModisLwpAll,
        ScalarOutput::ModisTauAll,
        ScalarOutput::ModisReffAll,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScalarOutput::IsccpCldtot => "isccp_cldtot",
            ScalarOutput::ModisCldtot => "modis_cldtot",
            ScalarOutput::ModisClwtot => "modis_clwtot",
            ScalarOutput::ModisClitot => "modis_clitot",
            ScalarOutput::ModisTaut => "modis_taut",
            ScalarOutput::ModisTauw => "modis_tauw",
            ScalarOutput::ModisTaui => "modis_taui",
            ScalarOutput::ModisReffw => "modis_reffw",
            ScalarOutput::ModisReffi => "modis_reffi",
            ScalarOutput::ModisLwp => "modis_lwp",
            ScalarOutput::ModisIwp => "modis_iwp",
            ScalarOutput::ModisCldQ06 => "modis_cld_Q06",
            ScalarOutput::ModisNdQ06 => "modis_nd_Q06",
            ScalarOutput::ModisLwpQ06 => "modis_lwp_Q06",
            ScalarOutput::ModisTauQ06 => "modis_tau_Q06",
            ScalarOutput::ModisReffQ06 => "modis_reff_Q06",
            ScalarOutput::ModisCldAll => "modis_cld_ALL",
            ScalarOutput::ModisNdAll => "modis_nd_ALL",
            ScalarOutput::ModisLwpAll => "modis_lwp_ALL",
            ScalarOutput::ModisTauAll => "modis_tau_ALL",
            ScalarOutput::ModisReffAll => "modis_reff_ALL",
        }
    }

    pub fn unit(self) -> &'static str {
        use ScalarOutput::*;
        match self {
            IsccpCldtot | ModisCldtot | ModisClwtot | ModisClitot => "%",
            ModisTaut | ModisTauw | ModisTaui => "1",
            ModisReffw | ModisReffi | ModisReffQ06 | ModisReffAll => "m",
            ModisLwp | ModisIwp | ModisLwpQ06 | ModisLwpAll => "kg/m2",
            ModisCldQ06 | ModisTauQ06 | ModisCldAll | ModisTauAll => "1",
            ModisNdQ06 | ModisNdAll => "1/cm3",
        }
    }

    pub fn spec(self) -> FieldSpec {
        FieldSpec::new(self.name(), FieldLayout::Column, self.unit())
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Per-column joint histograms, all in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistogramOutput {
    IsccpCtptau,
    ModisCtptau,
    ModisCtptauLiq,
    ModisCtptauIce,
    MisrCthtau,
    ModisLwpre,
    ModisIwpre,
}

impl HistogramOutput {
    pub const ALL: [HistogramOutput; 7] = [
        HistogramOutput::IsccpCtptau,
        HistogramOutput::ModisCtptau,
        HistogramOutput::ModisCtptauLiq,
        HistogramOutput::ModisCtptauIce,
        HistogramOutput::MisrCthtau,
        HistogramOutput::ModisLwpre,
        HistogramOutput::ModisIwpre,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HistogramOutput::IsccpCtptau => "isccp_ctptau",
            HistogramOutput::ModisCtptau => "modis_ctptau",
            HistogramOutput::ModisCtptauLiq => "modis_ctptau_liq",
            HistogramOutput::ModisCtptauIce => "modis_ctptau_ice",
            HistogramOutput::MisrCthtau => "misr_cthtau",
            HistogramOutput::ModisLwpre => "modis_lwpre",
            HistogramOutput::ModisIwpre => "modis_iwpre",
        }
    }

    pub fn kind(self) -> HistogramKind {
        match self {
            HistogramOutput::IsccpCtptau
            | HistogramOutput::ModisCtptau
            | HistogramOutput::ModisCtptauLiq
            | HistogramOutput::ModisCtptauIce => HistogramKind::CtpTau,
            HistogramOutput::MisrCthtau => HistogramKind::CthTau,
            HistogramOutput::ModisLwpre => HistogramKind::LwpRel,
            HistogramOutput::ModisIwpre => HistogramKind::IwpRei,
        }
    }

    pub fn spec(self) -> FieldSpec {
        FieldSpec::new(self.name(), FieldLayout::Histogram(self.kind()), "%")
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Every output spec, masked statistics first, echo last.
pub fn output_specs() -> Vec<FieldSpec> {
    ScalarOutput::ALL
        .iter()
        .map(|s| s.spec())
        .chain(HistogramOutput::ALL.iter().map(|h| h.spec()))
        .chain(std::iter::once(COSP_SUNLIT))
        .collect()
}

/// Descriptive attribute for an output: the night-zero note for masked
/// statistics, nothing for the echo.
pub fn output_note(name: &str) -> Option<&'static str> {
    let masked = ScalarOutput::ALL.iter().any(|s| s.name() == name)
        || HistogramOutput::ALL.iter().any(|h| h.name() == name);
    masked.then_some(NIGHT_ZERO_NOTE)
}

/// Output buffers owned by the caller and fully overwritten every step.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticOutputs {
    pub(crate) scalars: Vec<Array1<f64>>,
    pub(crate) histograms: Vec<Array3<f64>>,
    pub(crate) sunlit: Array1<f64>,
}

impl DiagnosticOutputs {
    pub fn zeros(ncol: usize) -> Self {
        Self::filled(ncol, 0.0)
    }

    /// Buffers with every entry set to `value`.
    pub fn filled(ncol: usize, value: f64) -> Self {
        let scalars = ScalarOutput::ALL
            .iter()
            .map(|_| Array1::from_elem(ncol, value))
            .collect();
        let histograms = HistogramOutput::ALL
            .iter()
            .map(|h| {
                let (a, b) = h.kind().bins();
                Array3::from_elem((ncol, a, b), value)
            })
            .collect();
        Self {
            scalars,
            histograms,
            sunlit: Array1::from_elem(ncol, value),
        }
    }

    pub fn ncol(&self) -> usize {
        self.sunlit.len()
    }

    pub fn scalar(&self, field: ScalarOutput) -> ArrayView1<'_, f64> {
        self.scalars[field.index()].view()
    }

    pub fn scalar_mut(&mut self, field: ScalarOutput) -> ArrayViewMut1<'_, f64> {
        self.scalars[field.index()].view_mut()
    }

    pub fn histogram(&self, field: HistogramOutput) -> ArrayView3<'_, f64> {
        self.histograms[field.index()].view()
    }

    pub fn histogram_mut(&mut self, field: HistogramOutput) -> ArrayViewMut3<'_, f64> {
        self.histograms[field.index()].view_mut()
    }

    /// Illumination flags recorded at the diagnostics cadence.
    pub fn sunlit_echo(&self) -> ArrayView1<'_, f64> {
        self.sunlit.view()
    }

    /// Iterate over every masked entry and the echo.
    pub fn all_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.scalars
            .iter()
            .flat_map(|a| a.iter().copied())
            .chain(self.histograms.iter().flat_map(|h| h.iter().copied()))
            .chain(self.sunlit.iter().copied())
    }

    /// Iterate over every masked entry that belongs to `column`.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = f64> + '_ {
        self.scalars
            .iter()
            .map(move |a| a[column])
            .chain(
                self.histograms
                    .iter()
                    .flat_map(move |h| h.index_axis(ndarray::Axis(0), column).into_iter().copied()),
            )
    }

    pub fn validate(&self, ncol: usize) -> DiagResult<()> {
        for (field, arr) in ScalarOutput::ALL.iter().zip(&self.scalars) {
            field.spec().check_shape(arr.shape(), ncol, 0)?;
        }
        for (field, arr) in HistogramOutput::ALL.iter().zip(&self.histograms) {
            field.spec().check_shape(arr.shape(), ncol, 0)?;
        }
        COSP_SUNLIT.check_shape(self.sunlit.shape(), ncol, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_order_matches_storage() {
        for (i, s) in ScalarOutput::ALL.iter().enumerate() {
            assert_eq!(s.index(), i);
        }
        for (i, h) in HistogramOutput::ALL.iter().enumerate() {
            assert_eq!(h.index(), i);
        }
    }

    #[test]
    fn test_shapes() {
        let out = DiagnosticOutputs::zeros(3);
        assert_eq!(out.ncol(), 3);
        assert_eq!(out.histogram(HistogramOutput::MisrCthtau).shape(), &[3, 7, 16]);
        assert_eq!(out.histogram(HistogramOutput::ModisIwpre).shape(), &[3, 7, 6]);
        assert!(out.validate(3).is_ok());
        assert!(out.validate(4).is_err());
    }

    #[test]
    fn test_specs_and_notes() {
        let specs = output_specs();
        assert_eq!(specs.len(), 21 + 7 + 1);
        assert_eq!(specs.last().map(|s| s.name), Some("cosp_sunlit"));
        assert_eq!(output_note("modis_lwpre"), Some(NIGHT_ZERO_NOTE));
        assert_eq!(output_note("modis_reff_ALL"), Some(NIGHT_ZERO_NOTE));
        assert_eq!(output_note("cosp_sunlit"), None);
        assert_eq!(ScalarOutput::ModisNdQ06.unit(), "1/cm3");
    }

    #[test]
    fn test_column_values_cover_every_output() {
        let out = DiagnosticOutputs::filled(2, 1.0);
        let per_column = 21 + 4 * 7 * 7 + 7 * 16 + 7 * 6 + 7 * 6;
        assert_eq!(out.column_values(1).count(), per_column);
        assert_eq!(out.all_values().count(), 2 * per_column + 2);
    }
}
