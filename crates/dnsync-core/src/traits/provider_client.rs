// # Provider Client Trait
//
// Typed capability over the remote DNS provider: zone lookup, address record
// lookup and record update.
//
// ## Implementations
//
// - Cloudflare: `dnsync-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use dnsync_core::ProviderClient;
//
// let zone = match client.find_zone("example.com").await? {
//     Some(zone) => zone,
//     None => return Ok(()), // not provisioned at this provider
// };
//
// for record in client.find_address_records(&zone, "home.example.com").await? {
//     client.update_address_record(&zone, &record, &new_address).await?;
// }
// ```

use async_trait::async_trait;

use crate::address::Address;
use crate::error::ProviderError;

/// Provider-side zone discovered by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Provider zone identifier
    pub id: String,
    /// Registered zone name
    pub name: String,
}

/// An address record returned by a record lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMatch {
    /// Provider record identifier
    pub id: String,
    /// Fully-qualified record name
    pub name: String,
    /// Current record content as reported by the provider
    pub content: String,
    /// Time-to-live, if the provider reports one
    pub ttl: Option<u32>,
    /// Provider proxy flag, if the provider has one
    pub proxied: Option<bool>,
}

impl RecordMatch {
    /// Whether the record already points at `address`
    pub fn points_to(&self, address: &Address) -> bool {
        self.content
            .parse::<Address>()
            .is_ok_and(|current| current == *address)
    }
}

/// Capability interface over a DNS provider
///
/// Implementations perform network calls only. They keep no state between
/// calls, do not retry, and leave timeouts to their HTTP transport.
///
/// Expected absence is not an error: an unknown zone is `Ok(None)` and a
/// lookup with no matching records is an empty `Vec`.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Return the first zone registered under `domain`, if any
    async fn find_zone(&self, domain: &str) -> Result<Option<Zone>, ProviderError>;

    /// Return all address records in `zone` named `record_name`
    async fn find_address_records(
        &self,
        zone: &Zone,
        record_name: &str,
    ) -> Result<Vec<RecordMatch>, ProviderError>;

    /// Point `record` at `new_content`
    ///
    /// # Idempotency
    ///
    /// Updating a record to the content it already holds must succeed, so
    /// that re-running after a partial failure is always safe.
    async fn update_address_record(
        &self,
        zone: &Zone,
        record: &RecordMatch,
        new_content: &Address,
    ) -> Result<(), ProviderError>;

    /// Provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
