use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use log::{error, info, warn};
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{
    check_timeout,
    config::MeasurementConfig,
    manual::ManualRoofData,
    provider::MeasurementProvider,
    state::{MeasurementContext, MeasurementEvent, MeasurementState},
};

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementSnapshot {
    pub context: MeasurementContext,
    pub elapsed_ms: u64,
}

/// Pushed to subscribers on every state change so the UI never has to poll.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementUpdate {
    pub quote_id: String,
    pub context: MeasurementContext,
    pub elapsed_ms: u64,
}

/// Drives one measurement acquisition run: submits the provider request,
/// ticks the timeout check every second, polls for the asynchronous result,
/// and exposes the explicit retry / manual-entry escape hatches.
///
/// All context mutation funnels through the reducer under a single lock;
/// multiple UI surfaces referencing the same quote must share one instance.
#[derive(Clone)]
pub struct MeasurementController {
    quote_id: String,
    context: Arc<Mutex<MeasurementContext>>,
    provider: Arc<dyn MeasurementProvider>,
    config: MeasurementConfig,
    address: Arc<Mutex<Option<String>>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    cancel: Arc<Mutex<Option<CancellationToken>>>,
    updates: broadcast::Sender<MeasurementUpdate>,
}

impl MeasurementController {
    pub fn new(provider: Arc<dyn MeasurementProvider>, config: MeasurementConfig) -> Self {
        let (updates, _) = broadcast::channel(64);
        Self {
            quote_id: Uuid::new_v4().to_string(),
            context: Arc::new(Mutex::new(MeasurementContext::new())),
            provider,
            config,
            address: Arc::new(Mutex::new(None)),
            ticker: Arc::new(Mutex::new(None)),
            cancel: Arc::new(Mutex::new(None)),
            updates,
        }
    }

    pub fn quote_id(&self) -> &str {
        &self.quote_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MeasurementUpdate> {
        self.updates.subscribe()
    }

    pub async fn snapshot(&self) -> MeasurementSnapshot {
        let guard = self.context.lock().await;
        MeasurementSnapshot {
            elapsed_ms: elapsed_ms(&guard),
            context: guard.clone(),
        }
    }

    /// Kick off measurement acquisition for an address.
    pub async fn begin(&self, address: &str) -> Result<MeasurementSnapshot> {
        {
            let mut guard = self.context.lock().await;
            if guard.state != MeasurementState::Idle {
                bail!("measurement already in progress");
            }
            guard.dispatch(MeasurementEvent::Request, Instant::now(), Utc::now());
        }
        *self.address.lock().await = Some(address.to_string());

        info!("Requesting measurement for quote {}", self.quote_id);
        self.emit_update().await;
        self.spawn_ticker().await;
        self.spawn_request(address.to_string());

        Ok(self.snapshot().await)
    }

    /// Re-run the request after a timeout. Every retry is a deliberate user
    /// action; nothing here retries automatically.
    pub async fn retry(&self) -> Result<MeasurementSnapshot> {
        let address = self
            .address
            .lock()
            .await
            .clone()
            .ok_or_else(|| anyhow!("no measurement request to retry"))?;

        {
            let mut guard = self.context.lock().await;
            if guard.state != MeasurementState::Timeout {
                bail!(
                    "retry is only available after a timeout, not from {}",
                    guard.state.as_str()
                );
            }
            guard.dispatch(MeasurementEvent::Retry, Instant::now(), Utc::now());
            info!(
                "Retrying measurement for quote {} (attempt {})",
                self.quote_id, guard.attempt
            );
        }

        self.emit_update().await;
        self.spawn_ticker().await;
        self.spawn_request(address);

        Ok(self.snapshot().await)
    }

    /// Switch to manual entry from the delayed or timeout states. The
    /// in-flight provider call is not cancelled; a late result is dropped by
    /// the reducer's stale guard.
    pub async fn choose_manual(&self) -> Result<MeasurementSnapshot> {
        {
            let mut guard = self.context.lock().await;
            if !guard.dispatch(MeasurementEvent::ManualEntry, Instant::now(), Utc::now()) {
                bail!(
                    "manual entry is not available from state {}",
                    guard.state.as_str()
                );
            }
        }

        self.stop_ticker().await;
        self.emit_update().await;
        Ok(self.snapshot().await)
    }

    /// Accept a hand-entered measurement. Validation happens here, before the
    /// data is allowed anywhere near the reducer.
    pub async fn submit_manual(&self, data: ManualRoofData) -> Result<MeasurementSnapshot> {
        data.validate()?;

        {
            let mut guard = self.context.lock().await;
            if guard.state != MeasurementState::ManualEntry {
                bail!(
                    "manual submission requires manual entry, not {}",
                    guard.state.as_str()
                );
            }
            guard.dispatch(
                MeasurementEvent::SubmitManual { data },
                Instant::now(),
                Utc::now(),
            );
        }

        self.stop_ticker().await;
        self.emit_update().await;
        Ok(self.snapshot().await)
    }

    fn spawn_request(&self, address: String) {
        let context = self.context.clone();
        let provider = self.provider.clone();
        let updates = self.updates.clone();
        let quote_id = self.quote_id.clone();

        tokio::spawn(async move {
            match provider.request_measurement(&address).await {
                Ok(handle) => {
                    info!(
                        "Provider accepted measurement {} for quote {quote_id}",
                        handle.measurement_id
                    );
                    let mut guard = context.lock().await;
                    let changed = guard.dispatch(
                        MeasurementEvent::RequestSuccess {
                            measurement_id: handle.measurement_id,
                        },
                        Instant::now(),
                        Utc::now(),
                    );
                    if changed {
                        emit(&updates, &quote_id, &guard);
                    }
                }
                Err(err) => {
                    warn!("Provider rejected measurement for quote {quote_id}: {err:#}");
                    let mut guard = context.lock().await;
                    let changed =
                        guard.dispatch(MeasurementEvent::RequestFailed, Instant::now(), Utc::now());
                    if changed {
                        emit(&updates, &quote_id, &guard);
                    }
                }
            }
        });
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let token = CancellationToken::new();
        *self.cancel.lock().await = Some(token.clone());

        let context = self.context.clone();
        let provider = self.provider.clone();
        let updates = self.updates.clone();
        let quote_id = self.quote_id.clone();
        let config = self.config.clone();

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(config.tick_interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {}
                }

                let (state, measurement_id) = {
                    let mut guard = context.lock().await;
                    if let Some(event) = check_timeout(&guard, Instant::now(), &config) {
                        if guard.dispatch(event, Instant::now(), Utc::now()) {
                            emit(&updates, &quote_id, &guard);
                        }
                    }
                    (guard.state, guard.measurement_id.clone())
                };

                if state.is_terminal() {
                    break;
                }

                if !matches!(state, MeasurementState::Polling | MeasurementState::Delayed) {
                    continue;
                }
                let Some(id) = measurement_id else {
                    continue;
                };

                match provider.fetch_result(&id).await {
                    Ok(Some(data)) => {
                        let mut guard = context.lock().await;
                        let changed = guard.dispatch(
                            MeasurementEvent::PollSuccess {
                                measurement_id: id,
                                data,
                            },
                            Instant::now(),
                            Utc::now(),
                        );
                        if changed {
                            emit(&updates, &quote_id, &guard);
                        }
                        if guard.state.is_terminal() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        // Terminal provider failure recovers the same way as
                        // silence: retry or manual entry.
                        error!("Measurement {id} failed for quote {quote_id}: {err:#}");
                        let mut guard = context.lock().await;
                        if guard.dispatch(MeasurementEvent::TimedOut, Instant::now(), Utc::now()) {
                            emit(&updates, &quote_id, &guard);
                        }
                        break;
                    }
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    // Locks ticker before cancel, same order as spawn_ticker.
    async fn stop_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
        if let Some(token) = self.cancel.lock().await.take() {
            token.cancel();
        }
    }

    async fn emit_update(&self) {
        let guard = self.context.lock().await;
        emit(&self.updates, &self.quote_id, &guard);
    }
}

fn elapsed_ms(ctx: &MeasurementContext) -> u64 {
    ctx.elapsed_since_request(Instant::now())
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

fn emit(
    updates: &broadcast::Sender<MeasurementUpdate>,
    quote_id: &str,
    ctx: &MeasurementContext,
) {
    let _ = updates.send(MeasurementUpdate {
        quote_id: quote_id.to_string(),
        elapsed_ms: elapsed_ms(ctx),
        context: ctx.clone(),
    });
}
