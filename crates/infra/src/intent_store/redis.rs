//! Redis-backed intent store (optional).
//!
//! Records are stored as JSON under `{prefix}buynow:{tenant}:{id}` with
//! `SET NX EX`, so write-once and expiry are both enforced by Redis.

use redis::Commands;

use cartline_core::{IntentId, TenantId};

use super::{PurchaseIntentRecord, PurchaseIntentStore};
use crate::config::StoreConfig;
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct RedisIntentStore {
    client: redis::Client,
    key_prefix: String,
}

fn redis_err(e: redis::RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_timeout() {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Backend(e.to_string())
    }
}

impl RedisIntentStore {
    pub fn new(redis_url: impl AsRef<str>, config: &StoreConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url.as_ref()).map_err(redis_err)?;
        Ok(Self {
            client,
            key_prefix: config.table("buynow"),
        })
    }

    fn key(&self, tenant_id: TenantId, id: IntentId) -> String {
        format!("{}:{}:{}", self.key_prefix, tenant_id, id)
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut redis::Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let client = self.client.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = client.get_connection().map_err(redis_err)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("redis task failed: {e}")))?
    }
}

#[async_trait::async_trait]
impl PurchaseIntentStore for RedisIntentStore {
    async fn create(&self, record: PurchaseIntentRecord) -> Result<IntentId, StoreError> {
        let key = self.key(record.tenant_id, record.id);
        let ttl = (record.expires_at - record.created_at).max(1);
        let payload = serde_json::to_string(&record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let id = record.id;

        let stored: Option<String> = self
            .blocking(move |conn| {
                redis::cmd("SET")
                    .arg(&key)
                    .arg(payload)
                    .arg("NX")
                    .arg("EX")
                    .arg(ttl)
                    .query(conn)
                    .map_err(redis_err)
            })
            .await?;

        match stored {
            Some(_) => Ok(id),
            None => Err(StoreError::Conflict(format!("intent {id} already exists"))),
        }
    }

    async fn get(
        &self,
        tenant_id: TenantId,
        id: IntentId,
    ) -> Result<Option<PurchaseIntentRecord>, StoreError> {
        let key = self.key(tenant_id, id);
        let raw: Option<String> = self
            .blocking(move |conn| conn.get(&key).map_err(redis_err))
            .await?;
        raw.map(|s| {
            serde_json::from_str(&s).map_err(|e| StoreError::Serialization(e.to_string()))
        })
        .transpose()
    }
}
