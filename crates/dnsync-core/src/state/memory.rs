// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Crash Behavior
//
// - All state is lost when the process exits
// - Every run therefore starts as a first run and reconciles all domains
//
// ## When to Use
//
// - Testing environments
// - Forcing a full reconciliation on every invocation

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::address::Address;
use crate::traits::state_store::{StateRecord, StateStore};

/// In-memory state store implementation
///
/// Clones share the same underlying state.
///
/// # Example
///
/// ```rust,no_run
/// use dnsync_core::state::MemoryStateStore;
/// use dnsync_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStateStore::new();
///     store.commit_address(&"1.2.3.4".parse()?).await?;
///     assert_eq!(store.load_last_address().await?, Some("1.2.3.4".parse()?));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<Option<StateRecord>>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `address`
    pub fn with_address(address: Address) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(StateRecord::new(address)))),
        }
    }

    /// Forget the committed address
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load_last_address(&self) -> Result<Option<Address>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.as_ref().map(|record| record.last_address))
    }

    async fn commit_address(&self, address: &Address) -> Result<(), Error> {
        *self.inner.write().await = Some(StateRecord::new(*address));
        Ok(())
    }
}
