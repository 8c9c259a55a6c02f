//! Concurrent fan-out/fan-in over all configured domains
//!
//! One tokio task per domain, no shared mutable state between them. The
//! coordinator waits for every task before aggregating; a slow or failing
//! domain never cancels its siblings.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::address::Address;
use crate::config::{AbsencePolicy, DomainSpec};
use crate::engine::outcome::{DomainOutcome, DomainReport, PassState, ReconciliationResult};
use crate::engine::reconciler::DomainReconciler;
use crate::traits::ProviderClient;

/// Runs one reconciliation pass over a set of domains
///
/// Side-effect free apart from provider calls: it returns the commit
/// decision and never touches the state store.
#[derive(Clone)]
pub struct ReconciliationCoordinator {
    provider: Arc<dyn ProviderClient>,
    absence_policy: AbsencePolicy,
}

impl ReconciliationCoordinator {
    pub fn new(provider: Arc<dyn ProviderClient>, absence_policy: AbsencePolicy) -> Self {
        Self {
            provider,
            absence_policy,
        }
    }

    /// Compare addresses and, if they differ, reconcile every spec concurrently
    ///
    /// Returns only after every domain has reported. Outcomes are in the
    /// order of `specs`.
    pub async fn run(
        &self,
        specs: &[DomainSpec],
        last_address: Option<Address>,
        current_address: Address,
    ) -> ReconciliationResult {
        let mut state = PassState::Idle;
        transition(&mut state, PassState::Comparing);

        if last_address == Some(current_address) {
            transition(&mut state, PassState::NoopDone);
            return ReconciliationResult::no_update_needed(current_address, last_address);
        }

        transition(&mut state, PassState::Reconciling);
        debug!(
            "Reconciling {} domain(s): {} -> {}",
            specs.len(),
            last_address.map_or_else(|| "<none>".to_string(), |a| a.to_string()),
            current_address
        );

        let tasks: Vec<(DomainSpec, JoinHandle<DomainOutcome>)> = specs
            .iter()
            .map(|spec| {
                let reconciler = DomainReconciler::new(Arc::clone(&self.provider));
                let task_spec = spec.clone();
                let handle = tokio::spawn(async move {
                    reconciler.reconcile(&task_spec, &current_address).await
                });
                (spec.clone(), handle)
            })
            .collect();

        // Barrier: every handle is awaited, whatever the others returned.
        let mut outcomes = Vec::with_capacity(tasks.len());
        for (spec, handle) in tasks {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => DomainOutcome::Failed(format!("domain task aborted: {}", e)),
            };
            outcomes.push(DomainReport { spec, outcome });
        }

        transition(&mut state, PassState::Aggregated);
        let result = ReconciliationResult::aggregate(
            current_address,
            last_address,
            outcomes,
            self.absence_policy,
        );
        transition(&mut state, result.terminal_state());

        result
    }
}

fn transition(state: &mut PassState, next: PassState) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid pass transition {} -> {}",
        state,
        next
    );
    trace!("Pass state: {} -> {}", state, next);
    *state = next;
}
