// # State Store Implementations
//
// This module provides implementations of the StateStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;

use crate::Error;
use crate::config::StateStoreConfig;
use crate::traits::StateStore;

/// Build the state store described by `config`
pub async fn from_config(config: &StateStoreConfig) -> Result<Box<dyn StateStore>, Error> {
    match config {
        StateStoreConfig::File { path } => Ok(Box::new(FileStateStore::new(path).await?)),
        StateStoreConfig::Memory => Ok(Box::new(MemoryStateStore::new())),
    }
}
