//! Single-domain reconciliation
//!
//! Find the zone, find the matching address records, point each of them at
//! the new address. Every provider failure is contained here and reported as
//! [`DomainOutcome::Failed`]; nothing escapes to sibling domains.

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::address::Address;
use crate::config::DomainSpec;
use crate::engine::outcome::DomainOutcome;
use crate::error::ProviderError;
use crate::traits::ProviderClient;

/// Drives one domain through lookup-then-update
#[derive(Clone)]
pub struct DomainReconciler {
    provider: Arc<dyn ProviderClient>,
}

impl DomainReconciler {
    pub fn new(provider: Arc<dyn ProviderClient>) -> Self {
        Self { provider }
    }

    /// Reconcile `spec` to `new_address`
    ///
    /// All matching records are attempted even after one fails; the outcome
    /// is `Failed` with the first failure's reason if any call failed.
    pub async fn reconcile(&self, spec: &DomainSpec, new_address: &Address) -> DomainOutcome {
        match self.try_reconcile(spec, new_address).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    domain = %spec.domain,
                    record = %spec.record_name(),
                    error_kind = e.kind(),
                    "Error looking up records: {}",
                    e
                );
                DomainOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_reconcile(
        &self,
        spec: &DomainSpec,
        new_address: &Address,
    ) -> Result<DomainOutcome, ProviderError> {
        let record_name = spec.record_name();

        debug!(domain = %spec.domain, "Looking up zone");
        let zone = match self.provider.find_zone(&spec.domain).await? {
            Some(zone) => zone,
            None => {
                debug!(domain = %spec.domain, "Zone not found");
                return Ok(DomainOutcome::NoZoneFound);
            }
        };
        debug!(domain = %spec.domain, zone_id = %zone.id, "Found zone");

        let records = self
            .provider
            .find_address_records(&zone, &record_name)
            .await?;
        if records.is_empty() {
            info!(domain = %spec.domain, record = %record_name, "No A records found");
            return Ok(DomainOutcome::NoRecordsFound);
        }

        let mut updated = 0;
        let mut first_failure: Option<String> = None;

        for record in &records {
            if record.points_to(new_address) {
                debug!(record = %record.name, record_id = %record.id, "Record already points to {}", new_address);
            }

            match self
                .provider
                .update_address_record(&zone, record, new_address)
                .await
            {
                Ok(()) => {
                    updated += 1;
                    info!(
                        domain = %spec.domain,
                        record = %record.name,
                        record_id = %record.id,
                        "DNS record updated to {} (was {})",
                        new_address,
                        record.content
                    );
                }
                Err(e) => {
                    error!(
                        domain = %spec.domain,
                        record = %record.name,
                        record_id = %record.id,
                        error_kind = e.kind(),
                        "Error updating A record: {}",
                        e
                    );
                    first_failure.get_or_insert_with(|| e.to_string());
                }
            }
        }

        Ok(match first_failure {
            Some(reason) => DomainOutcome::Failed(reason),
            None => DomainOutcome::Updated(updated),
        })
    }
}
