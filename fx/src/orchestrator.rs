//! Triggers for refresh cycles: startup, fixed interval and on demand.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::aggregator::{RateAggregator, RefreshSummary};

/// What to do when a trigger fires while another cycle is still running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapPolicy {
    /// Run cycles concurrently.
    #[default]
    Allow,
    /// Drop the trigger if a cycle is in flight.
    SingleFlight,
}

impl fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlapPolicy::Allow => write!(f, "allow"),
            OverlapPolicy::SingleFlight => write!(f, "single-flight"),
        }
    }
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(OverlapPolicy::Allow),
            "single-flight" | "single_flight" | "singleflight" => Ok(OverlapPolicy::SingleFlight),
            other => Err(format!("unknown overlap policy: {}", other)),
        }
    }
}

/// Callback run after every trigger, with `None` for a coalesced trigger.
pub type CycleObserver = Arc<dyn Fn(Option<&RefreshSummary>) + Send + Sync>;

/// Drives the aggregator from the service lifecycle.
pub struct FetchOrchestrator {
    aggregator: Arc<RateAggregator>,
    refresh_interval: Duration,
    policy: OverlapPolicy,
    in_flight: Mutex<()>,
    observer: Option<CycleObserver>,
    shutdown_tx: watch::Sender<bool>,
}

impl FetchOrchestrator {
    pub fn new(
        aggregator: Arc<RateAggregator>,
        refresh_interval: Duration,
        policy: OverlapPolicy,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            aggregator,
            refresh_interval,
            policy,
            in_flight: Mutex::new(()),
            observer: None,
            shutdown_tx,
        }
    }

    /// Register a callback for trigger outcomes.
    pub fn with_observer(mut self, observer: CycleObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Initial cycle, run once the service is ready.
    pub async fn on_startup(&self) -> Option<RefreshSummary> {
        info!("Application ready, fetching initial exchange rates");
        self.refresh().await
    }

    /// Run a cycle now. Returns `None` if the trigger was coalesced into a
    /// cycle already in flight.
    pub async fn refresh(&self) -> Option<RefreshSummary> {
        let summary = self.run_cycle().await;
        if let Some(observer) = &self.observer {
            observer(summary.as_ref());
        }
        summary
    }

    async fn run_cycle(&self) -> Option<RefreshSummary> {
        match self.policy {
            OverlapPolicy::Allow => Some(self.aggregator.refresh().await),
            OverlapPolicy::SingleFlight => {
                let Ok(_guard) = self.in_flight.try_lock() else {
                    debug!("Refresh already in progress, skipping trigger");
                    return None;
                };
                Some(self.aggregator.refresh().await)
            }
        }
    }

    /// Run a cycle every `refresh_interval` until [`stop`](Self::stop) is called.
    ///
    /// The first cycle fires one full interval after the loop starts, so it
    /// does not repeat the startup cycle.
    pub async fn run_interval_loop(&self) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        if *shutdown_rx.borrow() {
            return;
        }

        let mut ticker = interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        info!(
            interval_secs = self.refresh_interval.as_secs(),
            policy = %self.policy,
            "Scheduled refresh started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    info!("Scheduled exchange rate refresh");
                    self.refresh().await;
                }
                _ = shutdown_rx.changed() => {
                    info!("Scheduled refresh stopped");
                    break;
                }
            }
        }
    }

    /// Stop the interval loop.
    pub fn stop(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}
