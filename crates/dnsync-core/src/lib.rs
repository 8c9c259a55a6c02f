// # dnsync-core
//
// Core library for one-shot dynamic DNS synchronization.
//
// ## Architecture Overview
//
// One pass points the A records of every configured domain at the host's
// current public IPv4 address:
// - **AddressSource**: Trait for discovering the current public address
// - **ProviderClient**: Trait for zone/record lookup and update at a DNS provider
// - **StateStore**: Trait for the last committed address
// - **ReconciliationCoordinator**: Concurrent fan-out over all domains, fan-in
//   into one commit decision
// - **DdnsEngine**: Single-pass driver (lookup → compare → reconcile → commit)
//
// ## Design Principles
//
// 1. **Library-First**: The binary only wires configuration to these types
// 2. **Fault Isolation**: One domain's failure never affects its siblings
// 3. **All-or-Nothing Commit**: The new address is recorded only when every
//    domain succeeded, so a failed domain is retried on the next run
// 4. **Idempotency**: An unchanged address costs zero provider calls

pub mod address;
pub mod config;
pub mod engine;
pub mod error;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use address::Address;
pub use config::{
    AbsencePolicy, AddressSourceConfig, DdnsConfig, DomainSpec, EngineConfig, ProviderConfig,
    RecordType, StateStoreConfig,
};
pub use engine::{
    DdnsEngine, DomainOutcome, DomainReport, EngineEvent, PassReport, PassState,
    ReconciliationCoordinator, ReconciliationResult,
};
pub use error::{Error, ProviderError, Result};
pub use state::{FileStateStore, MemoryStateStore};
pub use traits::{AddressSource, ProviderClient, RecordMatch, StateRecord, StateStore, Zone};
