//! Write-once persistence of resolved lines.
//!
//! A purchase intent is created exactly once per successful resolution and is
//! never updated or deleted by this crate. Readers see it until it expires.

mod in_memory;
mod postgres;
#[cfg(feature = "redis")]
mod redis;

pub use in_memory::InMemoryIntentStore;
pub use postgres::PostgresIntentStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisIntentStore;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use cartline_core::{IntentId, TenantId, UnixSeconds};
use cartline_pricing::ResolvedLine;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentStatus {
    Open,
}

impl IntentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IntentStatus::Open => "open",
        }
    }

    pub fn parse(s: &str) -> Result<Self, StoreError> {
        match s {
            "open" => Ok(IntentStatus::Open),
            other => Err(StoreError::Serialization(format!("unknown intent status {other:?}"))),
        }
    }
}

/// Immutable stored snapshot.
///
/// `data` is the serialized [`ResolvedLine`], kept as text so the bytes read
/// back are the bytes written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseIntentRecord {
    pub id: IntentId,
    pub tenant_id: TenantId,
    pub client_ip: String,
    pub data: String,
    pub status: IntentStatus,
    pub created_at: UnixSeconds,
    pub expires_at: UnixSeconds,
}

impl PurchaseIntentRecord {
    pub fn is_expired(&self, now: UnixSeconds) -> bool {
        now >= self.expires_at
    }

    pub fn line(&self) -> Result<ResolvedLine, StoreError> {
        serde_json::from_str(&self.data)
            .map_err(|e| StoreError::Serialization(format!("stored line is unreadable: {e}")))
    }
}

/// Create/get only; records are never updated or deleted through this trait.
#[async_trait::async_trait]
pub trait PurchaseIntentStore: Send + Sync {
    /// Persist a new record. An existing id is a [`StoreError::Conflict`].
    async fn create(&self, record: PurchaseIntentRecord) -> Result<IntentId, StoreError>;

    /// Tenant-scoped lookup. Expired records may or may not be returned,
    /// depending on the backend; callers check [`PurchaseIntentRecord::is_expired`].
    async fn get(
        &self,
        tenant_id: TenantId,
        id: IntentId,
    ) -> Result<Option<PurchaseIntentRecord>, StoreError>;
}

#[async_trait::async_trait]
impl<S> PurchaseIntentStore for Arc<S>
where
    S: PurchaseIntentStore + ?Sized,
{
    async fn create(&self, record: PurchaseIntentRecord) -> Result<IntentId, StoreError> {
        (**self).create(record).await
    }

    async fn get(
        &self,
        tenant_id: TenantId,
        id: IntentId,
    ) -> Result<Option<PurchaseIntentRecord>, StoreError> {
        (**self).get(tenant_id, id).await
    }
}
