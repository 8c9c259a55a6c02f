//! Core traits for dnsync
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`ProviderClient`]: Zone/record lookup and update at the DNS provider
//! - [`AddressSource`]: Public address discovery
//! - [`StateStore`]: Last committed address

pub mod address_source;
pub mod provider_client;
pub mod state_store;

pub use address_source::AddressSource;
pub use provider_client::{ProviderClient, RecordMatch, Zone};
pub use state_store::{StateRecord, StateStore};
