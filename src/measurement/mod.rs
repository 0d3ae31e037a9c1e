pub mod config;
pub mod controller;
pub mod manual;
pub mod provider;
pub mod state;

pub use config::MeasurementConfig;
pub use controller::{MeasurementController, MeasurementSnapshot, MeasurementUpdate};
pub use manual::{ManualRoofData, MANUAL_PITCH_OPTIONS, MAX_MANUAL_SQFT, MIN_MANUAL_SQFT};
pub use provider::{MeasurementHandle, MeasurementProvider};
pub use state::{
    check_timeout, MeasurementContext, MeasurementEvent, MeasurementState, RoofMeasurement,
};
