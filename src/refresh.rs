//! Background data refresh system
//!
//! [`Scheduler`] fetches every resort in order, one request at a time, with a
//! pacing delay between locations. [`RefreshHandle`] runs it on a fixed interval
//! in a background task and publishes the result as a [`DashboardState`]
//! through a watch channel.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::clock::Clock;
use crate::data::{all_resorts, WeatherClient, WeatherData};

/// Default interval between refresh runs
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);
/// Default pause between consecutive location requests
pub const DEFAULT_PACING_DELAY: Duration = Duration::from_millis(1000);

/// Errors reported by a refresh run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// At least one location could not be loaded
    #[error("Failed to load weather for: {}", .missing.join(", "))]
    PartialFailure { missing: Vec<String> },
}

/// Configuration for the refresh schedule
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Interval between refresh runs
    pub interval: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

/// What the dashboard shows: the last complete data set plus status flags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    /// Last complete data set, kept across failed runs
    pub weather: Option<WeatherData>,
    /// A refresh run is in progress
    pub is_loading: bool,
    /// Error from the most recent run, if it failed
    pub error: Option<String>,
    /// When `weather` was last replaced
    pub last_updated: Option<DateTime<Utc>>,
}

impl DashboardState {
    /// Marks a refresh run as started
    pub fn begin_refresh(&mut self) {
        self.is_loading = true;
    }

    /// Applies the outcome of a refresh run
    ///
    /// A failed run keeps the previous data and records the error, so stale data
    /// is never presented as fresh.
    pub fn apply(&mut self, outcome: Result<WeatherData, RefreshError>, at: DateTime<Utc>) {
        self.is_loading = false;
        match outcome {
            Ok(weather) => {
                self.weather = Some(weather);
                self.error = None;
                self.last_updated = Some(at);
            }
            Err(e) => {
                self.error = Some(e.to_string());
            }
        }
    }
}

/// Fetches all resorts sequentially
pub struct Scheduler {
    client: WeatherClient,
    clock: Arc<dyn Clock>,
    pacing_delay: Duration,
}

impl Scheduler {
    pub fn new(client: WeatherClient, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            clock,
            pacing_delay: DEFAULT_PACING_DELAY,
        }
    }

    pub fn with_pacing_delay(mut self, pacing_delay: Duration) -> Self {
        self.pacing_delay = pacing_delay;
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Fetches every resort in list order and assembles the result
    ///
    /// One failing location does not stop the others; the run still fails as a
    /// whole if any location is missing.
    pub async fn refresh_all(&self) -> Result<WeatherData, RefreshError> {
        let resorts = all_resorts();
        let mut results = HashMap::with_capacity(resorts.len());

        for (i, resort) in resorts.iter().enumerate() {
            if i > 0 {
                self.clock.sleep(self.pacing_delay).await;
            }

            match self
                .client
                .fetch_and_cache_weather(&resort.coordinates())
                .await
            {
                Ok(weather) => {
                    results.insert(resort.id, weather);
                }
                Err(e) => {
                    tracing::warn!(resort = resort.id, error = %e, "Failed to load weather");
                }
            }
        }

        WeatherData::from_results(results).map_err(|missing| RefreshError::PartialFailure {
            missing: missing.into_iter().map(String::from).collect(),
        })
    }
}

/// Handle for controlling the background refresh task
pub struct RefreshHandle {
    state: watch::Receiver<DashboardState>,
    refresh_tx: mpsc::Sender<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Starts the refresh schedule
    ///
    /// The first run starts immediately, then one every `config.interval`
    /// regardless of how the previous run went.
    pub fn spawn(scheduler: Arc<Scheduler>, config: RefreshConfig) -> Self {
        let (state_tx, state_rx) = watch::channel(DashboardState::default());
        let (refresh_tx, mut refresh_rx) = mpsc::channel::<()>(1);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                // Shutdown is only observed between runs, so a run in flight
                // always completes.
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = interval.tick() => {}
                    Some(()) = refresh_rx.recv() => {
                        interval.reset();
                    }
                }

                tracing::info!("Refresh started");
                state_tx.send_modify(DashboardState::begin_refresh);

                let outcome = scheduler.refresh_all().await;
                match &outcome {
                    Ok(_) => tracing::info!("Refresh completed"),
                    Err(e) => tracing::warn!(error = %e, "Refresh incomplete, keeping previous data"),
                }

                let at = scheduler.clock().now();
                state_tx.send_modify(|state| state.apply(outcome, at));
            }

            tracing::debug!("Refresh task stopped");
        });

        Self {
            state: state_rx,
            refresh_tx,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// Returns a snapshot of the current dashboard state
    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Returns a receiver that is notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.clone()
    }

    /// Requests an immediate refresh
    ///
    /// Ignored if a request is already pending.
    pub fn request_refresh(&self) {
        let _ = self.refresh_tx.try_send(());
    }

    /// Stops the schedule and waits for any in-flight run to finish
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Refresh task ended abnormally");
            }
        }
    }
}
