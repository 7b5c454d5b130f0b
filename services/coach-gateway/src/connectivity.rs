//! Connectivity monitor: periodic health probe with debounced transitions
//!
//! The monitor is the only writer of the connectivity snapshot. Readers get
//! a `ConnectivityHandle`, which exposes the latest snapshot through a watch
//! channel and the online/offline edges through a broadcast channel.

use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::ConnectivityConfig;
use crate::gateway::Gateway;

/// Belief about whether the backend is reachable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityState {
    Unknown,
    Online,
    Offline,
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectivityState::Unknown => write!(f, "Unknown"),
            ConnectivityState::Online => write!(f, "Online"),
            ConnectivityState::Offline => write!(f, "Offline"),
        }
    }
}

/// An online/offline edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub previous: ConnectivityState,
    pub current: ConnectivityState,
    pub timestamp_epoch_ms: u64,
}

/// Latest probe bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivitySnapshot {
    pub state: ConnectivityState,
    pub last_probe_epoch_ms: Option<u64>,
    pub last_change_epoch_ms: Option<u64>,
    pub consecutive_failures: u32,
}

impl Default for ConnectivitySnapshot {
    fn default() -> Self {
        Self {
            state: ConnectivityState::Unknown,
            last_probe_epoch_ms: None,
            last_change_epoch_ms: None,
            consecutive_failures: 0,
        }
    }
}

impl ConnectivitySnapshot {
    /// Apply one probe outcome.
    ///
    /// Returns a transition only for `Online <-> Offline` edges. Leaving
    /// `Unknown` updates the state silently, and a repeated outcome only
    /// refreshes the probe timestamp.
    pub fn record(&mut self, reachable: bool, now_ms: u64) -> Option<Transition> {
        let target = if reachable {
            ConnectivityState::Online
        } else {
            ConnectivityState::Offline
        };

        self.last_probe_epoch_ms = Some(now_ms);
        if reachable {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        }

        if target == self.state {
            return None;
        }

        let previous = self.state;
        self.state = target;
        self.last_change_epoch_ms = Some(now_ms);

        if previous == ConnectivityState::Unknown {
            return None;
        }

        Some(Transition {
            previous,
            current: target,
            timestamp_epoch_ms: now_ms,
        })
    }
}

/// Something that can tell whether the backend answers
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait Probe: Send + Sync {
    async fn probe(&self) -> crate::Result<()>;
}

#[async_trait]
impl Probe for Gateway {
    async fn probe(&self) -> crate::Result<()> {
        Gateway::probe(self).await
    }
}

pub struct ConnectivityMonitor {
    probe: Arc<dyn Probe>,
    config: ConnectivityConfig,
    snapshot: watch::Sender<ConnectivitySnapshot>,
    events: broadcast::Sender<Transition>,
    // Held for a whole probe so outcomes are applied in the order probes start
    probing: Mutex<()>,
}

impl fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectivityMonitor")
            .field("config", &self.config)
            .field("state", &self.snapshot.borrow().state)
            .finish()
    }
}

impl ConnectivityMonitor {
    pub fn new(probe: Arc<dyn Probe>, config: ConnectivityConfig) -> Self {
        let (snapshot, _) = watch::channel(ConnectivitySnapshot::default());
        let (events, _) = broadcast::channel(16);
        Self {
            probe,
            config,
            snapshot,
            events,
            probing: Mutex::new(()),
        }
    }

    /// Read side for observers
    pub fn handle(&self) -> ConnectivityHandle {
        ConnectivityHandle {
            snapshot: self.snapshot.subscribe(),
            events: self.events.clone(),
        }
    }

    /// Run one probe and publish its outcome.
    ///
    /// The probe runs in its own task so a panic inside it counts as a
    /// failed probe instead of tearing down the monitor. Overlapping calls
    /// queue behind each other, so a slow probe never overwrites a newer one.
    pub async fn probe_once(&self) -> Option<Transition> {
        let _probing = self.probing.lock().await;
        let probe = Arc::clone(&self.probe);
        let reachable = match tokio::spawn(async move { probe.probe().await }).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::debug!("Probe failed: {}", e);
                false
            }
            Err(e) => {
                tracing::warn!("Probe task aborted: {}", e);
                false
            }
        };

        let now_ms = current_epoch_ms();
        let mut previous = ConnectivityState::Unknown;
        let mut transition = None;
        self.snapshot.send_modify(|snapshot| {
            previous = snapshot.state;
            transition = snapshot.record(reachable, now_ms);
        });

        let snapshot = self.snapshot.borrow().clone();
        tracing::debug!(
            "Probe: reachable={} state={} (consecutive failures: {})",
            reachable,
            snapshot.state,
            snapshot.consecutive_failures
        );

        match transition {
            Some(t) if t.current == ConnectivityState::Online => {
                tracing::info!("Backend is back online");
            }
            Some(_) => tracing::warn!("Backend went offline"),
            None if previous == ConnectivityState::Unknown => {
                tracing::info!("Initial backend state: {}", snapshot.state);
            }
            None => {}
        }

        if let Some(transition) = transition {
            // No subscribers is fine; the snapshot still carries the state
            let _ = self.events.send(transition);
        }

        transition
    }

    /// Probe after the initial delay, then on every interval, until cancelled
    pub async fn run(&self, cancel: CancellationToken) {
        let start = tokio::time::Instant::now() + self.config.initial_delay();
        let mut ticker = tokio::time::interval_at(start, self.config.polling_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Connectivity monitor started (first probe in {:?}, then every {:?})",
            self.config.initial_delay(),
            self.config.polling_interval()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = self.probe_once() => {}
                        _ = cancel.cancelled() => {
                            tracing::debug!("Connectivity monitor cancelled mid-probe");
                            break;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    tracing::debug!("Connectivity monitor cancelled");
                    break;
                }
            }
        }
    }
}

/// Cheap, cloneable read access to connectivity
#[derive(Debug, Clone)]
pub struct ConnectivityHandle {
    snapshot: watch::Receiver<ConnectivitySnapshot>,
    events: broadcast::Sender<Transition>,
}

impl ConnectivityHandle {
    /// Point-in-time reachability; `Unknown` counts as not reachable
    pub fn is_reachable(&self) -> bool {
        self.state() == ConnectivityState::Online
    }

    pub fn state(&self) -> ConnectivityState {
        self.snapshot.borrow().state
    }

    pub fn snapshot(&self) -> ConnectivitySnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receive every future online/offline edge
    pub fn subscribe(&self) -> broadcast::Receiver<Transition> {
        self.events.subscribe()
    }

    /// Wait until the snapshot is next written (including same-state probes)
    pub async fn changed(&mut self) -> bool {
        self.snapshot.changed().await.is_ok()
    }
}

fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
