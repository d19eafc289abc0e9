//! Resolve-then-record, the one write path exposed to callers.

use serde::Serialize;
use tracing::{instrument, warn};

use cartline_core::{IntentId, TenantId};
use cartline_pricing::{PurchaseRequest, ResolvedLine};

use crate::catalog_store::CatalogStore;
use crate::error::ResolveError;
use crate::intent_store::{PurchaseIntentRecord, PurchaseIntentStore};
use crate::points::PointsLedger;
use crate::recorder::PurchaseIntentRecorder;
use crate::resolver::PricingResolver;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseOutcome {
    pub intent_id: IntentId,
    pub line: ResolvedLine,
}

pub struct PurchaseService<C, P, S> {
    resolver: PricingResolver<C, P>,
    recorder: PurchaseIntentRecorder<S>,
}

impl<C, P, S> PurchaseService<C, P, S>
where
    C: CatalogStore,
    P: PointsLedger,
    S: PurchaseIntentStore,
{
    pub fn new(resolver: PricingResolver<C, P>, recorder: PurchaseIntentRecorder<S>) -> Self {
        Self { resolver, recorder }
    }

    pub fn resolver(&self) -> &PricingResolver<C, P> {
        &self.resolver
    }

    /// Nothing is written when the line is rejected. A group-buy seat held
    /// for a line whose intent could not be written is released again.
    #[instrument(skip_all, fields(tenant_id = %request.tenant_id()))]
    pub async fn resolve_purchase(
        &self,
        request: &PurchaseRequest,
    ) -> Result<PurchaseOutcome, ResolveError> {
        let line = self.resolver.resolve(request).await?;
        let intent_id = match self
            .recorder
            .record(request.tenant_id(), request.client_ip(), &line)
            .await
        {
            Ok(id) => id,
            Err(err) => {
                if let Err(release_err) = self.resolver.release_seat(&line).await {
                    // The hold still lapses on its own at `hold_until`.
                    warn!(store_error = %release_err, "could not release group-buy seat");
                }
                return Err(err.into());
            }
        };
        Ok(PurchaseOutcome { intent_id, line })
    }

    pub async fn fetch_intent(
        &self,
        tenant_id: TenantId,
        id: IntentId,
    ) -> Result<Option<(PurchaseIntentRecord, ResolvedLine)>, ResolveError> {
        Ok(self.recorder.fetch(tenant_id, id).await?)
    }
}
