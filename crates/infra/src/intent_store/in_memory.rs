use std::collections::HashMap;
use std::sync::RwLock;

use cartline_core::{IntentId, TenantId};

use super::{PurchaseIntentRecord, PurchaseIntentStore};
use crate::error::StoreError;

/// In-memory intent store. Intended for tests/dev.
///
/// Expired records are dropped on the next `create`; until then readers
/// filter them out.
#[derive(Debug, Default)]
pub struct InMemoryIntentStore {
    records: RwLock<HashMap<IntentId, PurchaseIntentRecord>>,
}

impl InMemoryIntentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl PurchaseIntentStore for InMemoryIntentStore {
    async fn create(&self, record: PurchaseIntentRecord) -> Result<IntentId, StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        if records.contains_key(&record.id) {
            return Err(StoreError::Conflict(format!("intent {} already exists", record.id)));
        }
        records.retain(|_, r| !r.is_expired(record.created_at));
        let id = record.id;
        records.insert(id, record);
        Ok(id)
    }

    async fn get(
        &self,
        tenant_id: TenantId,
        id: IntentId,
    ) -> Result<Option<PurchaseIntentRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(records.get(&id).filter(|r| r.tenant_id == tenant_id).cloned())
    }
}
