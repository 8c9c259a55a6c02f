//! Single-pass reconciliation engine
//!
//! The DdnsEngine is the context object for one invocation. It owns the
//! collaborators and runs exactly one pass:
//! - Discover the current public address via AddressSource
//! - Compare it against the last committed address in StateStore
//! - Reconcile every configured domain concurrently via ProviderClient
//! - Commit the new address only if no domain failed
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐        ┌──────────────┐
//! │ AddressSource │──────▶ │  DdnsEngine  │ ◀────── StateStore (load)
//! └───────────────┘        └──────────────┘
//!                                 │
//!                                 ▼
//!                  ┌─────────────────────────────┐
//!                  │ ReconciliationCoordinator   │
//!                  └─────────────────────────────┘
//!                     │           │           │
//!                     ▼           ▼           ▼
//!              DomainReconciler (one task per domain)
//!                     │           │           │
//!                     └──── ProviderClient ───┘
//!                                 │
//!                                 ▼
//!                 aggregate ─▶ StateStore (commit, all-success only)
//! ```
//!
//! ## Event Flow
//!
//! 1. Address discovered (lookup failure aborts the pass)
//! 2. Unchanged → `NoUpdateNeeded`, done
//! 3. Changed → one `DomainReconciled` per domain
//! 4. `PassDecided` with the commit decision and failed domains
//! 5. `AddressCommitted` after a successful commit

pub mod coordinator;
pub mod outcome;
pub mod reconciler;

pub use coordinator::ReconciliationCoordinator;
pub use outcome::{DomainOutcome, DomainReport, PassState, ReconciliationResult};
pub use reconciler::DomainReconciler;

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::address::Address;
use crate::config::{AbsencePolicy, DdnsConfig, DomainSpec};
use crate::error::{Error, Result};
use crate::traits::{AddressSource, ProviderClient, StateStore};

/// Events a pass emits besides the per-domain ones: PassStarted,
/// AddressDiscovered, PassDecided and AddressCommitted
const EVENTS_PER_PASS: usize = 4;

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Pass started
    PassStarted { domains_count: usize },

    /// Current address determined
    AddressDiscovered {
        address: Address,
        previous: Option<Address>,
    },

    /// Address unchanged since the last commit
    NoUpdateNeeded { address: Address },

    /// One domain finished
    DomainReconciled {
        domain: String,
        record_name: String,
        outcome: DomainOutcome,
    },

    /// All domains reported; commit decided
    PassDecided {
        address: Address,
        should_commit: bool,
        updated_records: usize,
        failed_domains: Vec<String>,
    },

    /// New address durably recorded
    AddressCommitted { address: Address },
}

/// What one pass did
#[derive(Debug, Clone)]
pub struct PassReport {
    /// The aggregate the commit decision was based on
    pub result: ReconciliationResult,
    /// Terminal state of the pass
    pub state: PassState,
    /// Wall-clock duration of the pass
    pub elapsed: Duration,
}

impl PassReport {
    /// True when some domain failed and the commit was skipped
    pub fn has_failures(&self) -> bool {
        self.result.failed().next().is_some()
    }
}

/// Single-pass DDNS engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`] (validates configuration)
/// 2. Call [`DdnsEngine::run_once()`]
/// 3. Drop
///
/// ## Threading
///
/// The pass itself fans out across tokio tasks; the engine commits from the
/// calling task after every domain has reported, so the state store never
/// sees concurrent writers.
pub struct DdnsEngine {
    /// Public address discovery
    address_source: Box<dyn AddressSource>,

    /// DNS provider, shared with the domain tasks
    provider: Arc<dyn ProviderClient>,

    /// Last committed address
    state_store: Box<dyn StateStore>,

    /// Domains to reconcile
    domains: Vec<DomainSpec>,

    /// Commit policy for absent zones/records
    absence_policy: AbsencePolicy,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events.
    /// The channel holds every event of one pass, so the receiver can be
    /// drained after `run_once` returns.
    ///
    /// # Errors
    ///
    /// `Error::Config` if the configuration is invalid; nothing has touched
    /// the network at that point.
    pub fn new(
        address_source: Box<dyn AddressSource>,
        provider: Arc<dyn ProviderClient>,
        state_store: Box<dyn StateStore>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        // A pass emits at most one event per domain plus four; the receiver
        // may not be drained until the pass returns.
        let capacity = config
            .engine
            .event_channel_capacity
            .max(config.domains.len() + EVENTS_PER_PASS);
        let (tx, rx) = mpsc::channel(capacity);

        let engine = Self {
            address_source,
            provider,
            state_store,
            domains: config.domains,
            absence_policy: config.engine.absence_policy,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run one reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(PassReport)`: The pass completed (including passes where some
    ///   domains failed and the commit was skipped)
    /// - `Err(Error::AddressLookup)`: The current address is unknown; nothing
    ///   was reconciled
    /// - `Err(Error::StateStore)`: The last address could not be loaded or the
    ///   new one could not be committed
    pub async fn run_once(&self) -> Result<PassReport> {
        let started = Instant::now();
        debug!(
            "Beginning reconciliation pass (dnsync-core v{}, provider: {}, address source: {})",
            env!("CARGO_PKG_VERSION"),
            self.provider.provider_name(),
            self.address_source.source_name()
        );
        self.emit_event(EngineEvent::PassStarted {
            domains_count: self.domains.len(),
        });

        let current = self.address_source.current().await.map_err(|e| match e {
            Error::AddressLookup(_) => e,
            other => Error::address_lookup(other.to_string()),
        })?;
        info!("Got external address: {}", current);

        let previous = self.state_store.load_last_address().await?;
        self.emit_event(EngineEvent::AddressDiscovered {
            address: current,
            previous,
        });

        let coordinator =
            ReconciliationCoordinator::new(Arc::clone(&self.provider), self.absence_policy);
        let result = coordinator.run(&self.domains, previous, current).await;

        if result.no_update_needed {
            info!("DNS record update not needed for: {}", current);
            self.emit_event(EngineEvent::NoUpdateNeeded { address: current });
            return Ok(self.finish(result, started));
        }

        for report in &result.outcomes {
            self.log_outcome(report);
            self.emit_event(EngineEvent::DomainReconciled {
                domain: report.spec.domain.clone(),
                record_name: report.spec.record_name(),
                outcome: report.outcome.clone(),
            });
        }

        let failed_domains = result.failed_domains();
        self.emit_event(EngineEvent::PassDecided {
            address: current,
            should_commit: result.should_commit,
            updated_records: result.updated_records(),
            failed_domains: failed_domains.clone(),
        });

        if result.should_commit {
            self.state_store.commit_address(&current).await?;
            info!("Committed new address: {}", current);
            self.emit_event(EngineEvent::AddressCommitted { address: current });
        } else if failed_domains.is_empty() {
            warn!(
                "Not committing {}: some domains are missing at the provider (strict absence policy)",
                current
            );
        } else {
            warn!(
                failed = failed_domains.len(),
                "Not committing {}: update failed for {}; will retry next run",
                current,
                failed_domains.join(", ")
            );
        }

        Ok(self.finish(result, started))
    }

    fn finish(&self, result: ReconciliationResult, started: Instant) -> PassReport {
        let elapsed = started.elapsed();
        let state = result.terminal_state();
        info!(
            state = %state,
            updated_records = result.updated_records(),
            "Pass finished in {:.3} seconds",
            elapsed.as_secs_f64()
        );

        PassReport {
            result,
            state,
            elapsed,
        }
    }

    fn log_outcome(&self, report: &DomainReport) {
        let domain = report.spec.domain.as_str();
        let record = report.spec.record_name();
        let kind = report.outcome.kind();

        match &report.outcome {
            DomainOutcome::Updated(count) => {
                info!(domain, record = %record, outcome = kind, count, "Domain reconciled")
            }
            DomainOutcome::NoZoneFound | DomainOutcome::NoRecordsFound => {
                warn!(domain, record = %record, outcome = kind, "Domain skipped: {}", report.outcome)
            }
            DomainOutcome::Failed(reason) => {
                error!(domain, record = %record, outcome = kind, reason = %reason, "Domain failed")
            }
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full or closed, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}
