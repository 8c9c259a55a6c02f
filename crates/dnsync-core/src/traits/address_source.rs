// # Address Source Trait
//
// Discovers the caller's current public address. Called once per pass,
// before any provider interaction.
//
// ## Implementations
//
// - HTTP lookup services: `dnsync-ip-http` crate

use async_trait::async_trait;

use crate::address::Address;

/// Trait for public address discovery
///
/// A failure here is fatal to the pass: there is no point reconciling
/// against an unknown target.
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Get the current public address
    ///
    /// # Returns
    ///
    /// - `Ok(Address)`: The current address
    /// - `Err(Error::AddressLookup)`: If the address could not be determined
    async fn current(&self) -> Result<Address, crate::Error>;

    /// Source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
