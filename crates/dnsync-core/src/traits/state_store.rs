// # State Store Trait
//
// Persists the last address that was fully synchronized to every configured
// domain ("last known good").
//
// ## Purpose
//
// A run compares the current public address against this value and skips
// reconciliation entirely when they match. The value only advances after a
// pass in which no domain failed, so a failed domain is retried next run.
//
// ## Implementations
//
// - File-based: JSON file with atomic writes and backup recovery
// - Memory: tests and ephemeral deployments
//
// ## Usage
//
// ```rust,ignore
// use dnsync_core::StateStore;
//
// let last = store.load_last_address().await?; // None on first run
//
// // Only after every domain reported success
// store.commit_address(&current).await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Persisted state record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    /// The last committed address
    pub last_address: Address,
    /// When it was committed
    pub committed_at: chrono::DateTime<chrono::Utc>,
}

impl StateRecord {
    /// Create a new state record stamped with the current time
    ///
    /// `pub(crate)` so records are only minted by state store implementations.
    pub(crate) fn new(last_address: Address) -> Self {
        Self {
            last_address,
            committed_at: chrono::Utc::now(),
        }
    }
}

/// Trait for state store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently, although the engine calls
/// `commit_address` at most once per pass, after every domain has reported.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the last committed address
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Address))`: The last committed address
    /// - `Ok(None)`: Nothing committed yet (first run); always differs
    /// - `Err(Error)`: Storage error
    async fn load_last_address(&self) -> Result<Option<Address>, crate::Error>;

    /// Durably record `address` as fully synchronized
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Successfully persisted
    /// - `Err(Error)`: Storage error
    async fn commit_address(&self, address: &Address) -> Result<(), crate::Error>;
}
