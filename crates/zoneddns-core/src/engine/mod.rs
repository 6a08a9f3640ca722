//! Core zoneddns engine
//!
//! The DdnsEngine is responsible for:
//! - Ticking on a fixed interval (first tick immediate)
//! - Discovering the public IP via IpSource
//! - Comparing it against the StateStore (change detection)
//! - Reconciling DNS records via the RecordReconciler on change
//!
//! ## Architecture
//!
//! ```text
//!  ┌──────────┐  tick   ┌──────────────┐  current()  ┌─────────────┐
//!  │ Interval │───────▶│  DdnsEngine  │────────────▶│  IpSource   │
//!  └──────────┘         └──────────────┘             └─────────────┘
//!                               │
//!         ┌─────────────────────┼───────────────────────────┐
//!         │                     │                           │
//!         ▼                     ▼                           ▼
//! ┌─────────────┐     ┌──────────────────┐         ┌─────────────┐
//! │ StateStore  │     │ RecordReconciler │         │   Events    │
//! │ (compare,   │     │  └ ZoneRegistry  │         │  (notify)   │
//! │  persist)   │     │    └ DnsProvider │         └─────────────┘
//! └─────────────┘     └──────────────────┘
//! ```
//!
//! ## Cycle State Machine
//!
//! `Idle → Checking → {Unchanged, Reconciling} → Idle`
//!
//! 1. Discover the current IP. On failure the cycle is abandoned without
//!    touching persisted state; the next tick retries
//! 2. Read the persisted IP
//! 3. Equal: log and return to idle
//! 4. Different (or never persisted): persist and reconcile, in the order
//!    given by [`PersistPolicy`]

pub mod reconciler;

pub use reconciler::{
    RecordReconciler, ReconcileReport, SkipReason, SubdomainOutcome, SubdomainReport,
};

use crate::config::{DdnsConfig, PersistPolicy};
use crate::error::Result;
use crate::registry::ZoneRegistry;
use crate::traits::{IpSource, PublicIp, StateStore};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, warn};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        subdomains_count: usize,
    },

    /// Discovered IP matches the persisted one
    IpUnchanged {
        ip: PublicIp,
    },

    /// Discovered IP differs from the persisted one
    IpChanged {
        previous: Option<PublicIp>,
        current: PublicIp,
    },

    /// Address record created
    RecordCreated {
        record_name: String,
        ip: PublicIp,
    },

    /// Address record edited
    RecordUpdated {
        record_name: String,
        ip: PublicIp,
    },

    /// Subdomain skipped (configuration gap)
    RecordSkipped {
        record_name: String,
        reason: String,
    },

    /// Provider call failed for a subdomain
    RecordFailed {
        record_name: String,
        error: String,
    },

    /// The whole cycle failed (IP discovery or persistence)
    CycleFailed {
        error: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Result of one check-and-reconcile cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing to do
    Unchanged {
        ip: PublicIp,
    },

    /// The IP changed and reconciliation ran
    Changed {
        previous: Option<PublicIp>,
        current: PublicIp,
        report: ReconcileReport,
    },
}

/// Core zoneddns engine
///
/// The engine drives the periodic check-and-reconcile loop.
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run()`]
/// 3. Engine runs until a shutdown signal is received
///
/// ## Scheduling
///
/// Cycles run one at a time on the calling task, so two cycles can never
/// overlap. The timer is independent of cycle duration; a tick that falls
/// due while a slow cycle is still running is skipped rather than queued.
pub struct DdnsEngine {
    /// IP source for discovery
    ip_source: Box<dyn IpSource>,

    /// State store for change detection
    state_store: Box<dyn StateStore>,

    /// Per-subdomain reconciliation
    reconciler: RecordReconciler,

    /// Time between ticks
    interval: Duration,

    /// Persist-before or persist-after reconciliation
    persist_policy: PersistPolicy,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `state_store`: State store implementation
    /// - `registry`: Per-domain provider clients, built once
    /// - `config`: zoneddns configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        ip_source: Box<dyn IpSource>,
        state_store: Box<dyn StateStore>,
        registry: ZoneRegistry,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        for domain in config.unknown_domains() {
            warn!(
                "Subdomains reference domain {} which has no zone configured; they will be skipped",
                domain
            );
        }

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            ip_source,
            state_store,
            reconciler: RecordReconciler::from_config(registry, &config),
            interval: config.engine.interval(),
            persist_policy: config.engine.persist_policy,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the engine
    ///
    /// Ticks immediately, then every interval, until Ctrl-C.
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Internal run implementation that accepts an optional shutdown signal
    ///
    /// # Parameters
    ///
    /// - `shutdown_rx`: Optional oneshot receiver to trigger shutdown (for testing)
    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        info!(
            "Starting DDNS for {} subdomain(s) across {} zone(s), interval {:?}",
            self.reconciler.enabled_count(),
            self.reconciler.registry().len(),
            self.interval
        );
        self.emit_event(EngineEvent::Started {
            subdomains_count: self.reconciler.enabled_count(),
        });

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = IntervalStream::new(interval);

        let shutdown = async {
            match shutdown_rx {
                // Test mode: wait for provided shutdown signal
                Some(rx) => {
                    let _ = rx.await;
                }
                // Production mode: wait for SIGINT
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for shutdown signal: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                Some(_) = ticks.next() => {
                    if let Err(e) = self.run_cycle().await {
                        error!("Error during IP check: {}", e);
                        self.emit_event(EngineEvent::CycleFailed {
                            error: e.to_string(),
                        });
                        // Continue running despite errors
                    }
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    self.emit_event(EngineEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }
            }
        }

        info!("Engine stopped");
        Ok(())
    }

    /// Run one check-and-reconcile cycle
    ///
    /// # Returns
    ///
    /// - `Ok(CycleOutcome)`: IP discovered; reconciliation ran if it changed
    ///   (per-subdomain failures are inside the report)
    /// - `Err(Error)`: IP discovery or persistence failed; nothing reconciled
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let current = self.ip_source.current().await?;
        let saved = self.state_store.saved_ip().await;
        let next_run = self.next_run_label();

        if saved.as_ref() == Some(&current) {
            info!("IP has not changed: {}. Next run: {}", current, next_run);
            self.emit_event(EngineEvent::IpUnchanged {
                ip: current.clone(),
            });
            return Ok(CycleOutcome::Unchanged { ip: current });
        }

        info!(
            "IP has changed from {} to {}. Next run: {}",
            saved.as_ref().map(PublicIp::as_str).unwrap_or("unknown"),
            current,
            next_run
        );
        self.emit_event(EngineEvent::IpChanged {
            previous: saved.clone(),
            current: current.clone(),
        });

        let report = match self.persist_policy {
            PersistPolicy::BeforeReconcile => {
                self.state_store.save_ip(&current).await?;
                self.reconcile(&current).await
            }
            PersistPolicy::AfterSuccess => {
                let report = self.reconcile(&current).await;
                if report.has_failures() {
                    warn!(
                        "{} subdomain(s) failed; not persisting {} so the next tick retries",
                        report.failed(),
                        current
                    );
                } else {
                    self.state_store.save_ip(&current).await?;
                }
                report
            }
        };

        Ok(CycleOutcome::Changed {
            previous: saved,
            current,
            report,
        })
    }

    /// Reconcile and publish per-subdomain events
    async fn reconcile(&self, ip: &PublicIp) -> ReconcileReport {
        let report = self.reconciler.reconcile(ip).await;

        for entry in &report.entries {
            let event = match &entry.outcome {
                SubdomainOutcome::Created { .. } => EngineEvent::RecordCreated {
                    record_name: entry.full_name.clone(),
                    ip: ip.clone(),
                },
                SubdomainOutcome::Updated { .. } => EngineEvent::RecordUpdated {
                    record_name: entry.full_name.clone(),
                    ip: ip.clone(),
                },
                SubdomainOutcome::Skipped { reason } => EngineEvent::RecordSkipped {
                    record_name: entry.full_name.clone(),
                    reason: reason.to_string(),
                },
                SubdomainOutcome::Failed { error, .. } => EngineEvent::RecordFailed {
                    record_name: entry.full_name.clone(),
                    error: error.clone(),
                },
            };
            self.emit_event(event);
        }

        debug!(
            "Reconciliation finished: {} created, {} updated, {} skipped, {} failed",
            report.created(),
            report.updated(),
            report.skipped(),
            report.failed()
        );
        report
    }

    /// Wall-clock time of the next tick, for log lines
    fn next_run_label(&self) -> String {
        chrono::Duration::from_std(self.interval)
            .ok()
            .and_then(|d| chrono::Local::now().checked_add_signed(d))
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Emit an engine event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                // Event processing is slower than event generation. The
                // event is dropped to keep memory bounded.
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                // Nobody is listening
            }
        }
    }

    /// Run the engine until `shutdown_rx` fires (or its sender is dropped)
    ///
    /// `None` behaves like [`DdnsEngine::run()`]. Embedders that handle
    /// signals themselves (the daemon waits on SIGTERM as well as SIGINT)
    /// pass a receiver.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }
}

impl std::fmt::Debug for DdnsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DdnsEngine")
            .field("ip_source", &self.ip_source.source_name())
            .field("reconciler", &self.reconciler)
            .field("interval", &self.interval)
            .field("persist_policy", &self.persist_policy)
            .finish()
    }
}
