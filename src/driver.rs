//! Per-step orchestration: decide → (reconstruct → invoke → mask) | mask.

use crate::config::{DiagnosticsConfig, EngineConstants};
use crate::engine::{invoke, DiagnosticEngine};
use crate::error::DiagResult;
use crate::height::reconstruct_from_state;
use crate::masking::apply_mask;
use crate::outputs::DiagnosticOutputs;
use crate::schedule::{normalize_frequency, StepInterval};
use crate::state::ColumnState;

/// Which branch a step took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Heights reconstructed, engine called, unlit columns zeroed.
    Active,
    /// Engine skipped, every output zeroed.
    Passive,
}

/// Periodic diagnostics driver for a fixed set of `ncol × nlev` columns.
///
/// The step interval is normalized once here and never changes. The driver
/// keeps no other state between steps apart from an engine call counter.
pub struct CospDriver<E: DiagnosticEngine> {
    config: DiagnosticsConfig,
    interval: StepInterval,
    constants: EngineConstants,
    ncol: usize,
    nlev: usize,
    engine: E,
    engine_calls: u64,
    finalized: bool,
}

impl<E: DiagnosticEngine> CospDriver<E> {
    pub fn new(
        config: DiagnosticsConfig,
        ncol: usize,
        nlev: usize,
        dt_seconds: f64,
        mut engine: E,
    ) -> DiagResult<Self> {
        config.validate()?;
        let interval = normalize_frequency(config.frequency, config.frequency_units, dt_seconds)?;
        engine.initialize(ncol, config.subcolumns, nlev)?;

        log::info!(
            "diagnostics every {} step(s) ({} {}, dt={dt_seconds}s), {} subcolumns, {ncol}x{nlev} columns",
            interval.get(),
            config.frequency,
            config.frequency_units,
            config.subcolumns,
        );

        Ok(Self {
            constants: EngineConstants::new(config.subcolumns),
            config,
            interval,
            ncol,
            nlev,
            engine,
            engine_calls: 0,
            finalized: false,
        })
    }

    pub fn config(&self) -> &DiagnosticsConfig {
        &self.config
    }

    pub fn interval(&self) -> StepInterval {
        self.interval
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.ncol, self.nlev)
    }

    /// Number of engine calls issued so far.
    pub fn engine_calls(&self) -> u64 {
        self.engine_calls
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Run one step. `outputs` is fully overwritten on both branches.
    ///
    /// After an `Err` the contents of `outputs` are unspecified: the engine
    /// may have written part of them and the `cosp_sunlit` echo may still
    /// hold the previous step's flags.
    pub fn run(
        &mut self,
        step: u64,
        state: &ColumnState<'_>,
        outputs: &mut DiagnosticOutputs,
    ) -> DiagResult<StepOutcome> {
        state.validate(self.ncol, self.nlev)?;
        outputs.validate(self.ncol)?;

        let active = self.interval.is_active(step);
        if active {
            log::debug!("step {step}: active, calling diagnostic engine");
            let heights = reconstruct_from_state(state)
                .inspect_err(|e| log::warn!("step {step}: height reconstruction failed: {e}"))?;
            invoke(&mut self.engine, state, &heights, self.constants, outputs)
                .inspect_err(|e| log::warn!("step {step}: {e}"))?;
            self.engine_calls += 1;
        } else {
            log::debug!("step {step}: passive, zeroing outputs");
        }

        apply_mask(outputs, state.sunlit, active)?;

        Ok(if active {
            StepOutcome::Active
        } else {
            StepOutcome::Passive
        })
    }

    /// Release engine resources. Further calls are no-ops.
    pub fn finalize(&mut self) {
        if !self.finalized {
            self.engine.finalize();
            self.finalized = true;
            log::info!("diagnostics finalized after {} engine call(s)", self.engine_calls);
        }
    }
}
