//! Persists resolved lines as purchase intents.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use cartline_core::{Clock, IntentId, TenantId};
use cartline_pricing::ResolvedLine;

use crate::error::StoreError;
use crate::intent_store::{IntentStatus, PurchaseIntentRecord, PurchaseIntentStore};

/// Attempts per `record` call before a retryable store error is surfaced.
const RECORD_ATTEMPTS: usize = 3;

pub struct PurchaseIntentRecorder<S> {
    store: S,
    ttl_secs: u64,
    clock: Arc<dyn Clock>,
}

impl<S> PurchaseIntentRecorder<S>
where
    S: PurchaseIntentStore,
{
    pub fn new(store: S, ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            ttl_secs,
            clock,
        }
    }

    /// Write a new open intent for `line` and return its handle.
    ///
    /// Every attempt uses a fresh id, so a retried write never collides with
    /// one that landed without acknowledgement.
    #[instrument(skip(self, client_ip, line), fields(tenant_id = %tenant_id, product_id = %line.product_id))]
    pub async fn record(
        &self,
        tenant_id: TenantId,
        client_ip: &str,
        line: &ResolvedLine,
    ) -> Result<IntentId, StoreError> {
        let data = serde_json::to_string(line)
            .map_err(|e| StoreError::Serialization(format!("line does not serialize: {e}")))?;
        let ttl = i64::try_from(self.ttl_secs).unwrap_or(i64::MAX);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let created_at = self.clock.now();
            let record = PurchaseIntentRecord {
                id: IntentId::new(),
                tenant_id,
                client_ip: client_ip.to_string(),
                data: data.clone(),
                status: IntentStatus::Open,
                created_at,
                expires_at: created_at.saturating_add(ttl),
            };
            match self.store.create(record).await {
                Ok(id) => {
                    info!(intent_id = %id, expires_in = self.ttl_secs, "purchase intent recorded");
                    return Ok(id);
                }
                Err(err) if attempt < RECORD_ATTEMPTS && worth_retrying(&err) => {
                    warn!(attempt, error = %err, "retrying purchase intent write");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Read an intent back. Expired intents read as absent.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, intent_id = %id))]
    pub async fn fetch(
        &self,
        tenant_id: TenantId,
        id: IntentId,
    ) -> Result<Option<(PurchaseIntentRecord, ResolvedLine)>, StoreError> {
        let Some(record) = self.store.get(tenant_id, id).await? else {
            return Ok(None);
        };
        if record.is_expired(self.clock.now()) {
            return Ok(None);
        }
        let line = record.line()?;
        Ok(Some((record, line)))
    }
}

/// A conflict here is an id collision; the next attempt draws a new id.
fn worth_retrying(err: &StoreError) -> bool {
    err.is_retryable() || matches!(err, StoreError::Conflict(_))
}
