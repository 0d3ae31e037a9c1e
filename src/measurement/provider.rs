use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::measurement::state::RoofMeasurement;

/// Tracking handle returned when the provider accepts a measurement job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementHandle {
    pub measurement_id: String,
}

/// Seam to the satellite-imagery provider. Implemented outside this crate;
/// the controller only ever talks to it through this trait.
#[async_trait]
pub trait MeasurementProvider: Send + Sync {
    /// Submit a measurement job for an address. `Err` means the provider
    /// rejected the request synchronously.
    async fn request_measurement(&self, address: &str) -> Result<MeasurementHandle>;

    /// Check whether the asynchronous result has materialized.
    /// `Ok(None)` means not ready yet; `Err` is a terminal failure.
    async fn fetch_result(&self, measurement_id: &str) -> Result<Option<RoofMeasurement>>;
}
