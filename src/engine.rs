//! Adapter around the external diagnostic engine.
//!
//! The engine is a black box: it receives column state, derived mid-level
//! heights and a fixed constant set, and writes every output array through a
//! mutable reference. Calls are synchronous and never issued concurrently.

use ndarray::{ArrayView1, ArrayView2};

use crate::config::EngineConstants;
use crate::error::DiagResult;
use crate::height::ColumnHeights;
use crate::outputs::DiagnosticOutputs;
use crate::state::ColumnState;

/// Everything marshaled into one engine call.
#[derive(Clone, Copy)]
pub struct EngineInput<'a> {
    pub ncol: usize,
    pub nlev: usize,
    pub constants: EngineConstants,
    pub sunlit: ArrayView1<'a, f64>,
    /// Surface emission (skin) temperature.
    pub skt: ArrayView1<'a, f64>,
    pub t_mid: ArrayView2<'a, f64>,
    pub p_mid: ArrayView2<'a, f64>,
    pub p_int: ArrayView2<'a, f64>,
    pub z_mid: ArrayView2<'a, f64>,
    pub qv: ArrayView2<'a, f64>,
    pub qc: ArrayView2<'a, f64>,
    pub qi: ArrayView2<'a, f64>,
    pub cldfrac: ArrayView2<'a, f64>,
    pub reff_qc: ArrayView2<'a, f64>,
    pub reff_qi: ArrayView2<'a, f64>,
    pub dtau067: ArrayView2<'a, f64>,
    pub dtau105: ArrayView2<'a, f64>,
}

impl<'a> EngineInput<'a> {
    pub fn new<'s: 'a>(state: &ColumnState<'s>, z_mid: ArrayView2<'a, f64>, constants: EngineConstants) -> Self {
        Self {
            ncol: state.ncol(),
            nlev: state.nlev(),
            constants,
            sunlit: state.sunlit.reborrow(),
            skt: state.skt.reborrow(),
            t_mid: state.t_mid.reborrow(),
            p_mid: state.p_mid.reborrow(),
            p_int: state.p_int.reborrow(),
            z_mid,
            qv: state.qv.reborrow(),
            qc: state.qc.reborrow(),
            qi: state.qi.reborrow(),
            cldfrac: state.cldfrac.reborrow(),
            reff_qc: state.reff_qc.reborrow(),
            reff_qi: state.reff_qi.reborrow(),
            dtau067: state.dtau067.reborrow(),
            dtau105: state.dtau105.reborrow(),
        }
    }
}

/// Capability to compute satellite-simulator statistics from column state.
pub trait DiagnosticEngine {
    /// Called once when the driver is built.
    fn initialize(&mut self, _ncol: usize, _subcolumns: usize, _nlev: usize) -> DiagResult<()> {
        Ok(())
    }

    /// Fill every entry of `outputs` for the given columns.
    fn compute(&mut self, input: &EngineInput<'_>, outputs: &mut DiagnosticOutputs) -> DiagResult<()>;

    /// Called once when the driver is finalized.
    fn finalize(&mut self) {}
}

impl<E: DiagnosticEngine + ?Sized> DiagnosticEngine for Box<E> {
    fn initialize(&mut self, ncol: usize, subcolumns: usize, nlev: usize) -> DiagResult<()> {
        (**self).initialize(ncol, subcolumns, nlev)
    }

    fn compute(&mut self, input: &EngineInput<'_>, outputs: &mut DiagnosticOutputs) -> DiagResult<()> {
        (**self).compute(input, outputs)
    }

    fn finalize(&mut self) {
        (**self).finalize()
    }
}

/// Marshal state and heights into a single engine call.
pub(crate) fn invoke<E: DiagnosticEngine + ?Sized>(
    engine: &mut E,
    state: &ColumnState<'_>,
    heights: &ColumnHeights,
    constants: EngineConstants,
    outputs: &mut DiagnosticOutputs,
) -> DiagResult<()> {
    let input = EngineInput::new(state, heights.z_mid.view(), constants);
    engine.compute(&input, outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagError;
    use crate::height::reconstruct_from_state;
    use crate::outputs::{HistogramOutput, ScalarOutput};
    use crate::state::fixtures::OwnedState;

    struct Recording {
        seen: Vec<(usize, usize, usize, f64)>,
    }

    impl DiagnosticEngine for Recording {
        fn compute(&mut self, input: &EngineInput<'_>, outputs: &mut DiagnosticOutputs) -> DiagResult<()> {
            assert_eq!(input.z_mid.dim(), (input.ncol, input.nlev));
            assert_eq!(input.p_int.dim(), (input.ncol, input.nlev + 1));
            self.seen.push((
                input.ncol,
                input.nlev,
                input.constants.subcolumns,
                input.constants.emsfc_lw,
            ));
            outputs.scalar_mut(ScalarOutput::ModisLwp).assign(&input.z_mid.column(0));
            outputs.histogram_mut(HistogramOutput::ModisCtptau).fill(1.0);
            Ok(())
        }
    }

    struct Failing;

    impl DiagnosticEngine for Failing {
        fn compute(&mut self, _: &EngineInput<'_>, _: &mut DiagnosticOutputs) -> DiagResult<()> {
            Err(DiagError::Engine("subcolumn generator diverged".into()))
        }
    }

    #[test]
    fn test_invoke_marshals_heights_and_constants() {
        let owned = OwnedState::new(3, 4, &[1.0, 0.0, 1.0]);
        let state = owned.view();
        let heights = reconstruct_from_state(&state).unwrap();
        let mut outputs = DiagnosticOutputs::zeros(3);
        let mut engine = Recording { seen: Vec::new() };

        invoke(&mut engine, &state, &heights, EngineConstants::new(10), &mut outputs).unwrap();

        assert_eq!(engine.seen, vec![(3, 4, 10, 0.99)]);
        assert_eq!(outputs.scalar(ScalarOutput::ModisLwp), heights.z_mid.column(0));
        assert!(outputs.histogram(HistogramOutput::ModisCtptau).iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_boxed_engine_forwards() {
        let owned = OwnedState::new(2, 3, &[1.0, 1.0]);
        let state = owned.view();
        let heights = reconstruct_from_state(&state).unwrap();
        let mut outputs = DiagnosticOutputs::zeros(2);
        let mut engine: Box<dyn DiagnosticEngine> = Box::new(Failing);

        let err = invoke(&mut engine, &state, &heights, EngineConstants::new(4), &mut outputs).unwrap_err();
        assert_eq!(err, DiagError::Engine("subcolumn generator diverged".into()));
    }
}
