use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DiagError;

/// Histogram bin counts fixed by the satellite-simulator output contract.
pub const NUM_TAU: usize = 7; // optical-depth bins
pub const NUM_CTP: usize = 7; // cloud-top pressure bins
pub const NUM_CTH: usize = 16; // MISR cloud-top height bins
pub const NUM_LWP: usize = 7; // MODIS liquid water path bins
pub const NUM_IWP: usize = 7; // MODIS ice water path bins
pub const NUM_REL: usize = 6; // MODIS liquid effective radius bins
pub const NUM_REI: usize = 6; // MODIS ice effective radius bins

/// Surface longwave emissivity passed to every engine call.
pub const SURFACE_LW_EMISSIVITY: f64 = 0.99;

/// Unit in which the diagnostics cadence is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyUnits {
    #[default]
    Steps,
    Hours,
}

impl FromStr for FrequencyUnits {
    type Err = DiagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "steps" => Ok(FrequencyUnits::Steps),
            "hours" => Ok(FrequencyUnits::Hours),
            other => Err(DiagError::UnsupportedUnits(other.to_string())),
        }
    }
}

impl fmt::Display for FrequencyUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrequencyUnits::Steps => f.write_str("steps"),
            FrequencyUnits::Hours => f.write_str("hours"),
        }
    }
}

/// Construction-time settings of the driver.
///
/// Missing fields fall back to `frequency = 1`, `frequency_units = steps`,
/// `subcolumns = 10`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub frequency: i64,
    pub frequency_units: FrequencyUnits,
    pub subcolumns: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            frequency: 1,
            frequency_units: FrequencyUnits::Steps,
            subcolumns: 10,
        }
    }
}

impl DiagnosticsConfig {
    /// Build a config from the raw unit token, rejecting unknown units.
    pub fn from_parts(frequency: i64, units: &str, subcolumns: usize) -> Result<Self, DiagError> {
        Ok(Self {
            frequency,
            frequency_units: units.parse()?,
            subcolumns,
        })
    }

    pub(crate) fn validate(&self) -> Result<(), DiagError> {
        if self.subcolumns == 0 {
            return Err(DiagError::config("subcolumns", 0.0, "must be at least 1"));
        }
        Ok(())
    }
}

/// Constant set marshaled into every engine call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConstants {
    pub subcolumns: usize,
    pub num_tau: usize,
    pub num_ctp: usize,
    pub num_cth: usize,
    pub num_lwp: usize,
    pub num_iwp: usize,
    pub num_rel: usize,
    pub num_rei: usize,
    pub emsfc_lw: f64,
}

impl EngineConstants {
    pub fn new(subcolumns: usize) -> Self {
        Self {
            subcolumns,
            num_tau: NUM_TAU,
            num_ctp: NUM_CTP,
            num_cth: NUM_CTH,
            num_lwp: NUM_LWP,
            num_iwp: NUM_IWP,
            num_rel: NUM_REL,
            num_rei: NUM_REI,
            emsfc_lw: SURFACE_LW_EMISSIVITY,
        }
    }
}
