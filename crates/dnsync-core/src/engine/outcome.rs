//! Per-domain outcomes, the pass aggregate and the pass state machine

use std::fmt;

use crate::address::Address;
use crate::config::{AbsencePolicy, DomainSpec};

/// Result of reconciling one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainOutcome {
    /// The provider has no zone for the domain
    NoZoneFound,
    /// The zone exists but holds no matching address records
    NoRecordsFound,
    /// Every matching record was written; carries the record count
    Updated(usize),
    /// At least one call failed; carries the first failure's reason
    Failed(String),
}

impl DomainOutcome {
    /// Short name of the outcome kind
    pub fn kind(&self) -> &'static str {
        match self {
            DomainOutcome::NoZoneFound => "no_zone_found",
            DomainOutcome::NoRecordsFound => "no_records_found",
            DomainOutcome::Updated(_) => "updated",
            DomainOutcome::Failed(_) => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, DomainOutcome::Failed(_))
    }

    /// Zone or records missing at the provider
    pub fn is_absence(&self) -> bool {
        matches!(
            self,
            DomainOutcome::NoZoneFound | DomainOutcome::NoRecordsFound
        )
    }

    /// Whether this outcome prevents committing the new address
    pub fn blocks_commit(&self, policy: AbsencePolicy) -> bool {
        match policy {
            AbsencePolicy::Lenient => self.is_failure(),
            AbsencePolicy::Strict => self.is_failure() || self.is_absence(),
        }
    }
}

impl fmt::Display for DomainOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainOutcome::NoZoneFound => f.write_str("no zone found"),
            DomainOutcome::NoRecordsFound => f.write_str("no A records found"),
            DomainOutcome::Updated(count) => write!(f, "updated {} record(s)", count),
            DomainOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// One domain's outcome, tagged with the spec it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainReport {
    pub spec: DomainSpec,
    pub outcome: DomainOutcome,
}

/// Aggregate of one reconciliation pass
///
/// The sole input to the commit decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationResult {
    /// Candidate address for the commit
    pub address: Address,
    /// Last committed address the pass compared against
    pub previous: Option<Address>,
    /// One report per configured domain, in configuration order
    pub outcomes: Vec<DomainReport>,
    /// The address had not changed; nothing was reconciled
    pub no_update_needed: bool,
    /// The caller may commit `address`
    pub should_commit: bool,
}

impl ReconciliationResult {
    /// Result of a pass that found the address unchanged
    pub fn no_update_needed(address: Address, previous: Option<Address>) -> Self {
        Self {
            address,
            previous,
            outcomes: Vec::new(),
            no_update_needed: true,
            should_commit: false,
        }
    }

    /// Aggregate domain reports and decide whether to commit
    pub fn aggregate(
        address: Address,
        previous: Option<Address>,
        outcomes: Vec<DomainReport>,
        policy: AbsencePolicy,
    ) -> Self {
        let should_commit = !outcomes
            .iter()
            .any(|report| report.outcome.blocks_commit(policy));

        Self {
            address,
            previous,
            outcomes,
            no_update_needed: false,
            should_commit,
        }
    }

    /// Reports whose outcome is `Failed`
    pub fn failed(&self) -> impl Iterator<Item = &DomainReport> {
        self.outcomes.iter().filter(|r| r.outcome.is_failure())
    }

    /// Record names of failed domains
    pub fn failed_domains(&self) -> Vec<String> {
        self.failed().map(|r| r.spec.record_name()).collect()
    }

    /// Total records written across all domains
    pub fn updated_records(&self) -> usize {
        self.outcomes
            .iter()
            .map(|r| match r.outcome {
                DomainOutcome::Updated(count) => count,
                _ => 0,
            })
            .sum()
    }

    /// Terminal state this result leads to
    pub fn terminal_state(&self) -> PassState {
        if self.no_update_needed {
            PassState::NoopDone
        } else if self.should_commit {
            PassState::CommitRequested
        } else {
            PassState::CommitSkipped
        }
    }
}

/// States of a single reconciliation pass
///
/// ```text
/// Idle → Comparing → NoopDone
///                  → Reconciling → Aggregated → CommitRequested
///                                             → CommitSkipped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    Comparing,
    NoopDone,
    Reconciling,
    Aggregated,
    CommitRequested,
    CommitSkipped,
}

impl PassState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PassState::NoopDone | PassState::CommitRequested | PassState::CommitSkipped
        )
    }

    /// Whether `next` directly follows `self`
    pub fn can_transition_to(&self, next: PassState) -> bool {
        use PassState::*;
        matches!(
            (self, next),
            (Idle, Comparing)
                | (Comparing, NoopDone)
                | (Comparing, Reconciling)
                | (Reconciling, Aggregated)
                | (Aggregated, CommitRequested)
                | (Aggregated, CommitSkipped)
        )
    }
}

impl fmt::Display for PassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PassState::Idle => "idle",
            PassState::Comparing => "comparing",
            PassState::NoopDone => "noop_done",
            PassState::Reconciling => "reconciling",
            PassState::Aggregated => "aggregated",
            PassState::CommitRequested => "commit_requested",
            PassState::CommitSkipped => "commit_skipped",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(domain: &str, outcome: DomainOutcome) -> DomainReport {
        DomainReport {
            spec: DomainSpec::apex(domain),
            outcome,
        }
    }

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn any_failure_blocks_commit() {
        let mixes = [
            vec![DomainOutcome::Failed("boom".into())],
            vec![DomainOutcome::Updated(1), DomainOutcome::Failed("boom".into())],
            vec![
                DomainOutcome::NoZoneFound,
                DomainOutcome::NoRecordsFound,
                DomainOutcome::Failed("boom".into()),
            ],
        ];

        for policy in [AbsencePolicy::Lenient, AbsencePolicy::Strict] {
            for mix in &mixes {
                let outcomes = mix
                    .iter()
                    .enumerate()
                    .map(|(i, o)| report(&format!("d{}.example.com", i), o.clone()))
                    .collect();
                let result =
                    ReconciliationResult::aggregate(addr("2.2.2.2"), None, outcomes, policy);
                assert!(!result.should_commit, "{:?} under {:?}", mix, policy);
                assert_eq!(result.terminal_state(), PassState::CommitSkipped);
            }
        }
    }

    #[test]
    fn no_failure_commits_under_lenient_policy() {
        let mixes = [
            vec![DomainOutcome::Updated(1)],
            vec![DomainOutcome::NoZoneFound],
            vec![DomainOutcome::NoRecordsFound, DomainOutcome::Updated(3)],
            vec![
                DomainOutcome::Updated(2),
                DomainOutcome::NoZoneFound,
                DomainOutcome::NoRecordsFound,
            ],
            vec![],
        ];

        for mix in mixes {
            let outcomes = mix
                .iter()
                .enumerate()
                .map(|(i, o)| report(&format!("d{}.example.com", i), o.clone()))
                .collect();
            let result = ReconciliationResult::aggregate(
                addr("2.2.2.2"),
                None,
                outcomes,
                AbsencePolicy::Lenient,
            );
            assert!(result.should_commit, "{:?}", mix);
            assert_eq!(result.terminal_state(), PassState::CommitRequested);
        }
    }

    #[test]
    fn strict_policy_blocks_on_absence() {
        let result = ReconciliationResult::aggregate(
            addr("2.2.2.2"),
            None,
            vec![
                report("a.example.com", DomainOutcome::Updated(1)),
                report("b.example.com", DomainOutcome::NoRecordsFound),
            ],
            AbsencePolicy::Strict,
        );
        assert!(!result.should_commit);
        assert!(result.failed_domains().is_empty());
    }

    #[test]
    fn summary_helpers() {
        let result = ReconciliationResult::aggregate(
            addr("2.2.2.2"),
            Some(addr("1.1.1.1")),
            vec![
                report("a.example.com", DomainOutcome::Updated(2)),
                report("b.example.com", DomainOutcome::Failed("denied".into())),
                report("c.example.com", DomainOutcome::Updated(1)),
            ],
            AbsencePolicy::Lenient,
        );
        assert_eq!(result.updated_records(), 3);
        assert_eq!(result.failed_domains(), vec!["b.example.com".to_string()]);
    }

    #[test]
    fn noop_result_never_commits() {
        let result = ReconciliationResult::no_update_needed(addr("1.1.1.1"), Some(addr("1.1.1.1")));
        assert!(result.no_update_needed);
        assert!(!result.should_commit);
        assert!(result.outcomes.is_empty());
        assert_eq!(result.terminal_state(), PassState::NoopDone);
    }

    #[test]
    fn pass_state_transitions() {
        use PassState::*;
        assert!(Idle.can_transition_to(Comparing));
        assert!(Comparing.can_transition_to(NoopDone));
        assert!(Aggregated.can_transition_to(CommitSkipped));
        assert!(!Comparing.can_transition_to(Aggregated));
        assert!(!NoopDone.can_transition_to(Comparing));
        assert!(!Reconciling.can_transition_to(Reconciling));

        for state in [NoopDone, CommitRequested, CommitSkipped] {
            assert!(state.is_terminal());
        }
        assert!(!Aggregated.is_terminal());
    }
}
