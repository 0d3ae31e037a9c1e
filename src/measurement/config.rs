use std::time::Duration;

/// Configuration for measurement acquisition with tunable wait thresholds.
#[derive(Debug, Clone)]
pub struct MeasurementConfig {
    /// "Typically done by now" point: offer manual entry while polling
    /// continues in the background
    pub soft_threshold: Duration,

    /// Abandon automation: user must choose retry or manual entry
    pub hard_threshold: Duration,

    /// How often the controller runs the timeout check and polls for a result
    pub tick_interval: Duration,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            soft_threshold: Duration::from_secs(45),
            hard_threshold: Duration::from_secs(120),
            tick_interval: Duration::from_secs(1),
        }
    }
}

impl MeasurementConfig {
    /// Compressed thresholds for interactive testing.
    pub fn debug() -> Self {
        Self {
            soft_threshold: Duration::from_secs(3),
            hard_threshold: Duration::from_secs(8),
            tick_interval: Duration::from_millis(250),
        }
    }
}
