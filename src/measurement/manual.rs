use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::measurement::state::RoofMeasurement;
use crate::pricing::types::{Complexity, MeasurementSource};

pub const MIN_MANUAL_SQFT: f64 = 500.0;
pub const MAX_MANUAL_SQFT: f64 = 15000.0;

/// Pitch choices offered by the manual-entry form (rise over 12 run). Covers
/// every category bucket the calculator distinguishes.
pub const MANUAL_PITCH_OPTIONS: [f64; 5] = [4.0, 6.0, 8.0, 10.0, 12.0];

/// User-supplied alternative to provider data. Validated locally before it is
/// allowed anywhere near the state machine or calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualRoofData {
    pub sqft_total: f64,
    pub pitch_primary: f64,
    pub complexity: Complexity,
}

impl ManualRoofData {
    pub fn validate(&self) -> Result<()> {
        if !self.sqft_total.is_finite()
            || self.sqft_total < MIN_MANUAL_SQFT
            || self.sqft_total > MAX_MANUAL_SQFT
        {
            return Err(anyhow!(
                "sqftTotal must be between {MIN_MANUAL_SQFT} and {MAX_MANUAL_SQFT}, got {}",
                self.sqft_total
            ));
        }
        if !MANUAL_PITCH_OPTIONS.contains(&self.pitch_primary) {
            return Err(anyhow!(
                "pitchPrimary must be one of {MANUAL_PITCH_OPTIONS:?}, got {}",
                self.pitch_primary
            ));
        }
        Ok(())
    }

    /// Once validated, manual data is treated identically to provider data.
    pub fn into_measurement(self) -> RoofMeasurement {
        RoofMeasurement {
            sqft_total: self.sqft_total,
            pitch_primary: self.pitch_primary,
            complexity: self.complexity,
            source: MeasurementSource::Manual,
        }
    }
}
