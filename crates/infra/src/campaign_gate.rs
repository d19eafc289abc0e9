//! Per-campaign serialization of capacity decisions.
//!
//! Two resolutions against the same campaign in one process take turns: the
//! second one reads seat and order counts only after the first has written
//! its seat hold, so it sees that seat as taken. Resolutions against different
//! campaigns never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use cartline_core::{CampaignId, TenantId};

type Key = (TenantId, CampaignId);

#[derive(Debug, Default)]
pub struct CampaignGate {
    slots: Mutex<HashMap<Key, Arc<AsyncMutex<()>>>>,
}

/// Held while a campaign's facts are read, decided on and the seat is held.
#[derive(Debug)]
pub struct CampaignPermit {
    _guard: OwnedMutexGuard<()>,
}

impl CampaignGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enter(&self, tenant_id: TenantId, campaign_id: CampaignId) -> CampaignPermit {
        let slot = {
            let mut slots = match self.slots.lock() {
                Ok(s) => s,
                Err(poisoned) => poisoned.into_inner(),
            };
            // Drop idle slots so the map tracks only campaigns in use.
            slots.retain(|_, m| Arc::strong_count(m) > 1);
            slots
                .entry((tenant_id, campaign_id))
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        CampaignPermit {
            _guard: slot.lock_owned().await,
        }
    }

    /// Campaigns with a permit currently held or awaited.
    #[cfg(test)]
    fn active(&self) -> usize {
        match self.slots.lock() {
            Ok(s) => s.values().filter(|m| Arc::strong_count(m) > 1).count(),
            Err(poisoned) => poisoned
                .into_inner()
                .values()
                .filter(|m| Arc::strong_count(m) > 1)
                .count(),
        }
    }
}
