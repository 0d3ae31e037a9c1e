use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::measurement::config::MeasurementConfig;
use crate::measurement::manual::ManualRoofData;
use crate::pricing::types::{Complexity, MeasurementSource};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementState {
    Idle,
    Requesting,
    Polling,
    Delayed,
    ManualEntry,
    Timeout,
    Complete,
}

impl Default for MeasurementState {
    fn default() -> Self {
        MeasurementState::Idle
    }
}

impl MeasurementState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementState::Idle => "idle",
            MeasurementState::Requesting => "requesting",
            MeasurementState::Polling => "polling",
            MeasurementState::Delayed => "delayed",
            MeasurementState::ManualEntry => "manual_entry",
            MeasurementState::Timeout => "timeout",
            MeasurementState::Complete => "complete",
        }
    }

    /// No further automation runs in these states.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MeasurementState::Complete | MeasurementState::ManualEntry | MeasurementState::Timeout
        )
    }
}

/// Roof measurement data, whether acquired from the satellite provider or
/// entered by hand. The pricing calculator treats both sources identically.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoofMeasurement {
    pub sqft_total: f64,
    pub pitch_primary: f64,
    pub complexity: Complexity,
    pub source: MeasurementSource,
}

#[derive(Debug, Clone)]
pub enum MeasurementEvent {
    Request,
    RequestSuccess { measurement_id: String },
    RequestFailed,
    PollSuccess { measurement_id: String, data: RoofMeasurement },
    Delayed,
    TimedOut,
    Retry,
    ManualEntry,
    SubmitManual { data: ManualRoofData },
}

impl MeasurementEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MeasurementEvent::Request => "REQUEST",
            MeasurementEvent::RequestSuccess { .. } => "REQUEST_SUCCESS",
            MeasurementEvent::RequestFailed => "REQUEST_FAILED",
            MeasurementEvent::PollSuccess { .. } => "POLL_SUCCESS",
            MeasurementEvent::Delayed => "DELAYED",
            MeasurementEvent::TimedOut => "TIMEOUT",
            MeasurementEvent::Retry => "RETRY",
            MeasurementEvent::ManualEntry => "MANUAL_ENTRY",
            MeasurementEvent::SubmitManual { .. } => "SUBMIT_MANUAL",
        }
    }
}

/// Working memory for one measurement acquisition run. Exactly one context
/// exists per in-progress quote, and state transitions are its only writers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementContext {
    pub state: MeasurementState,
    /// Monotonic anchor for timeout math; immune to system clock changes and
    /// controllable from paused-clock tests.
    #[serde(skip)]
    pub requested_at: Option<Instant>,
    pub requested_at_wall: Option<DateTime<Utc>>,
    pub measurement_id: Option<String>,
    pub data: Option<RoofMeasurement>,
    pub attempt: u32,
}

impl Default for MeasurementContext {
    fn default() -> Self {
        Self {
            state: MeasurementState::Idle,
            requested_at: None,
            requested_at_wall: None,
            measurement_id: None,
            data: None,
            attempt: 0,
        }
    }
}

impl MeasurementContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed_since_request(&self, now: Instant) -> Option<Duration> {
        self.requested_at
            .map(|anchor| now.saturating_duration_since(anchor))
    }

    /// Apply one event to the context. Returns true if the state changed;
    /// unlisted (state, event) pairs are no-ops. All waiting is modeled as
    /// state, never as a blocked call.
    pub fn dispatch(
        &mut self,
        event: MeasurementEvent,
        now: Instant,
        wall: DateTime<Utc>,
    ) -> bool {
        match (self.state, event) {
            (MeasurementState::Idle, MeasurementEvent::Request) => {
                self.state = MeasurementState::Requesting;
                self.requested_at = Some(now);
                self.requested_at_wall = Some(wall);
                true
            }
            (MeasurementState::Requesting, MeasurementEvent::RequestSuccess { measurement_id }) => {
                self.state = MeasurementState::Polling;
                self.measurement_id = Some(measurement_id);
                true
            }
            // Provider rejected synchronously: no silent retry, straight to
            // timeout so the user picks retry or manual entry.
            (MeasurementState::Requesting, MeasurementEvent::RequestFailed) => {
                self.state = MeasurementState::Timeout;
                self.clear_request_anchor();
                true
            }
            (
                MeasurementState::Polling | MeasurementState::Delayed,
                MeasurementEvent::PollSuccess { measurement_id, data },
            ) => {
                // Stale-result guard: a late success for a superseded request
                // must never overwrite the current attempt.
                if self.measurement_id.as_deref() != Some(measurement_id.as_str()) {
                    warn!(
                        "Ignoring poll result for stale measurement {measurement_id} in state {}",
                        self.state.as_str()
                    );
                    return false;
                }
                self.state = MeasurementState::Complete;
                self.data = Some(data);
                self.clear_request_anchor();
                true
            }
            (
                MeasurementState::Requesting | MeasurementState::Polling,
                MeasurementEvent::Delayed,
            ) => {
                // Polling continues in the background; the user is merely
                // offered the manual fallback.
                self.state = MeasurementState::Delayed;
                true
            }
            (
                MeasurementState::Requesting | MeasurementState::Polling | MeasurementState::Delayed,
                MeasurementEvent::TimedOut,
            ) => {
                self.state = MeasurementState::Timeout;
                self.clear_request_anchor();
                true
            }
            (MeasurementState::Timeout, MeasurementEvent::Retry) => {
                self.state = MeasurementState::Requesting;
                self.attempt += 1;
                self.measurement_id = None;
                self.data = None;
                self.requested_at = Some(now);
                self.requested_at_wall = Some(wall);
                true
            }
            (
                MeasurementState::Delayed | MeasurementState::Timeout,
                MeasurementEvent::ManualEntry,
            ) => {
                self.state = MeasurementState::ManualEntry;
                self.clear_request_anchor();
                true
            }
            (MeasurementState::ManualEntry, MeasurementEvent::SubmitManual { data }) => {
                self.state = MeasurementState::Complete;
                self.data = Some(data.into_measurement());
                true
            }
            (_, other) => {
                warn!(
                    "Ignoring event {} in state {}",
                    other.name(),
                    self.state.as_str()
                );
                false
            }
        }
    }

    fn clear_request_anchor(&mut self) {
        self.requested_at = None;
        self.requested_at_wall = None;
    }
}

/// Pure timeout check, run once per tick while awaiting the provider.
/// Compares monotonic elapsed time against the soft and hard thresholds and
/// returns the transition event to dispatch, if any.
pub fn check_timeout(
    ctx: &MeasurementContext,
    now: Instant,
    config: &MeasurementConfig,
) -> Option<MeasurementEvent> {
    let elapsed = ctx.elapsed_since_request(now)?;

    match ctx.state {
        MeasurementState::Requesting | MeasurementState::Polling => {
            if elapsed >= config.hard_threshold {
                Some(MeasurementEvent::TimedOut)
            } else if elapsed >= config.soft_threshold {
                Some(MeasurementEvent::Delayed)
            } else {
                None
            }
        }
        MeasurementState::Delayed => {
            if elapsed >= config.hard_threshold {
                Some(MeasurementEvent::TimedOut)
            } else {
                None
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn satellite_data(id_sqft: f64) -> RoofMeasurement {
        RoofMeasurement {
            sqft_total: id_sqft,
            pitch_primary: 6.0,
            complexity: Complexity::Moderate,
            source: MeasurementSource::Satellite,
        }
    }

    fn start_polling(ctx: &mut MeasurementContext, now: Instant) {
        assert!(ctx.dispatch(MeasurementEvent::Request, now, Utc::now()));
        assert!(ctx.dispatch(
            MeasurementEvent::RequestSuccess {
                measurement_id: "m1".to_string(),
            },
            now,
            Utc::now(),
        ));
    }

    #[test]
    fn happy_path_to_complete() {
        let now = Instant::now();
        let mut ctx = MeasurementContext::new();
        assert_eq!(ctx.state, MeasurementState::Idle);

        start_polling(&mut ctx, now);
        assert_eq!(ctx.state, MeasurementState::Polling);
        assert_eq!(ctx.measurement_id.as_deref(), Some("m1"));
        assert!(ctx.requested_at.is_some());

        assert!(ctx.dispatch(
            MeasurementEvent::PollSuccess {
                measurement_id: "m1".to_string(),
                data: satellite_data(2500.0),
            },
            now,
            Utc::now(),
        ));
        assert_eq!(ctx.state, MeasurementState::Complete);
        assert_eq!(ctx.data.as_ref().unwrap().source, MeasurementSource::Satellite);
        assert!(ctx.requested_at.is_none());
    }

    #[test]
    fn timeout_then_manual_entry() {
        let now = Instant::now();
        let mut ctx = MeasurementContext::new();
        start_polling(&mut ctx, now);

        assert!(ctx.dispatch(MeasurementEvent::TimedOut, now, Utc::now()));
        assert_eq!(ctx.state, MeasurementState::Timeout);

        assert!(ctx.dispatch(MeasurementEvent::ManualEntry, now, Utc::now()));
        assert_eq!(ctx.state, MeasurementState::ManualEntry);

        let manual = ManualRoofData {
            sqft_total: 2400.0,
            pitch_primary: 8.0,
            complexity: Complexity::Simple,
        };
        assert!(ctx.dispatch(MeasurementEvent::SubmitManual { data: manual }, now, Utc::now()));
        assert_eq!(ctx.state, MeasurementState::Complete);
        assert_eq!(ctx.data.as_ref().unwrap().source, MeasurementSource::Manual);
    }

    #[test]
    fn stale_poll_success_never_overwrites_manual_entry() {
        let now = Instant::now();
        let mut ctx = MeasurementContext::new();
        start_polling(&mut ctx, now);
        ctx.dispatch(MeasurementEvent::TimedOut, now, Utc::now());
        ctx.dispatch(MeasurementEvent::ManualEntry, now, Utc::now());

        // Late satellite result for the original handle arrives after the
        // user opted into manual entry.
        let changed = ctx.dispatch(
            MeasurementEvent::PollSuccess {
                measurement_id: "m1".to_string(),
                data: satellite_data(9999.0),
            },
            now,
            Utc::now(),
        );
        assert!(!changed);
        assert_eq!(ctx.state, MeasurementState::ManualEntry);
        assert!(ctx.data.is_none());
    }

    #[test]
    fn stale_poll_success_ignored_after_retry() {
        let now = Instant::now();
        let mut ctx = MeasurementContext::new();
        start_polling(&mut ctx, now);
        ctx.dispatch(MeasurementEvent::TimedOut, now, Utc::now());

        assert!(ctx.dispatch(MeasurementEvent::Retry, now, Utc::now()));
        assert_eq!(ctx.state, MeasurementState::Requesting);
        assert_eq!(ctx.attempt, 1);
        assert!(ctx.measurement_id.is_none());

        ctx.dispatch(
            MeasurementEvent::RequestSuccess {
                measurement_id: "m2".to_string(),
            },
            now,
            Utc::now(),
        );

        // Result from the superseded first request must not complete this one.
        let changed = ctx.dispatch(
            MeasurementEvent::PollSuccess {
                measurement_id: "m1".to_string(),
                data: satellite_data(9999.0),
            },
            now,
            Utc::now(),
        );
        assert!(!changed);
        assert_eq!(ctx.state, MeasurementState::Polling);
        assert!(ctx.data.is_none());
    }

    #[test]
    fn delayed_keeps_polling_alive() {
        let now = Instant::now();
        let mut ctx = MeasurementContext::new();
        start_polling(&mut ctx, now);

        assert!(ctx.dispatch(MeasurementEvent::Delayed, now, Utc::now()));
        assert_eq!(ctx.state, MeasurementState::Delayed);
        assert!(ctx.requested_at.is_some());

        // Background polling can still succeed from delayed.
        assert!(ctx.dispatch(
            MeasurementEvent::PollSuccess {
                measurement_id: "m1".to_string(),
                data: satellite_data(2500.0),
            },
            now,
            Utc::now(),
        ));
        assert_eq!(ctx.state, MeasurementState::Complete);
    }

    #[test]
    fn unlisted_events_are_noops() {
        let now = Instant::now();
        let mut ctx = MeasurementContext::new();

        assert!(!ctx.dispatch(MeasurementEvent::Retry, now, Utc::now()));
        assert!(!ctx.dispatch(MeasurementEvent::ManualEntry, now, Utc::now()));
        assert!(!ctx.dispatch(MeasurementEvent::TimedOut, now, Utc::now()));
        assert_eq!(ctx.state, MeasurementState::Idle);

        start_polling(&mut ctx, now);
        assert!(!ctx.dispatch(MeasurementEvent::Request, now, Utc::now()));
        assert_eq!(ctx.state, MeasurementState::Polling);
    }

    #[test]
    fn check_timeout_thresholds() {
        let config = MeasurementConfig::default();
        let start = Instant::now();
        let mut ctx = MeasurementContext::new();
        start_polling(&mut ctx, start);

        assert!(check_timeout(&ctx, start + Duration::from_secs(10), &config).is_none());

        let soft = check_timeout(&ctx, start + Duration::from_secs(45), &config);
        assert!(matches!(soft, Some(MeasurementEvent::Delayed)));

        let hard = check_timeout(&ctx, start + Duration::from_secs(120), &config);
        assert!(matches!(hard, Some(MeasurementEvent::TimedOut)));
    }

    #[test]
    fn check_timeout_in_delayed_only_fires_hard() {
        let config = MeasurementConfig::default();
        let start = Instant::now();
        let mut ctx = MeasurementContext::new();
        start_polling(&mut ctx, start);
        ctx.dispatch(MeasurementEvent::Delayed, start, Utc::now());

        assert!(check_timeout(&ctx, start + Duration::from_secs(60), &config).is_none());
        assert!(matches!(
            check_timeout(&ctx, start + Duration::from_secs(121), &config),
            Some(MeasurementEvent::TimedOut)
        ));
    }

    #[test]
    fn check_timeout_idle_after_terminal() {
        let config = MeasurementConfig::default();
        let start = Instant::now();
        let mut ctx = MeasurementContext::new();
        start_polling(&mut ctx, start);
        ctx.dispatch(MeasurementEvent::TimedOut, start, Utc::now());

        assert!(check_timeout(&ctx, start + Duration::from_secs(600), &config).is_none());
    }
}
