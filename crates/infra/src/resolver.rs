//! Loads the facts one request needs and hands them to the pricing rules.
//!
//! ```text
//! PurchaseRequest
//!   -> product lookup (missing or inactive stops here)
//!   -> campaign permit (promotional paths only)
//!   -> category, points balance, path facts
//!   -> cartline_pricing::resolve
//!   -> seat hold (group buy only; a version conflict re-reads the facts)
//! ```

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use cartline_core::{Clock, ExpectedVersion, UnixSeconds};
use cartline_pricing::{
    check_product, resolve, LineFacts, PathFacts, PromotionRef, PurchaseRequest, Rejection,
    ResolvedLine,
};

use crate::campaign_gate::CampaignGate;
use crate::catalog_store::CatalogStore;
use crate::config::DEFAULT_INTENT_TTL_SECS;
use crate::error::{ResolveError, StoreError};
use crate::points::PointsLedger;

/// Decide-and-hold rounds before a group-buy version conflict is surfaced.
const SEAT_ATTEMPTS: usize = 3;

pub struct PricingResolver<C, P> {
    catalog: C,
    points: P,
    gate: CampaignGate,
    clock: Arc<dyn Clock>,
    seat_hold_secs: u64,
}

impl<C, P> PricingResolver<C, P> {
    pub fn new(catalog: C, points: P, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog,
            points,
            gate: CampaignGate::new(),
            clock,
            seat_hold_secs: DEFAULT_INTENT_TTL_SECS,
        }
    }

    /// How long a held group-buy seat counts against the campaign. Matches
    /// the intent TTL in deployment so a seat lapses with its intent.
    pub fn with_seat_hold(mut self, secs: u64) -> Self {
        self.seat_hold_secs = secs;
        self
    }
}

impl<C, P> PricingResolver<C, P>
where
    C: CatalogStore,
    P: PointsLedger,
{
    /// Price one line or explain why it cannot be bought.
    ///
    /// Rejections are logged at `info`; store failures at `warn`.
    #[instrument(
        name = "resolve_line",
        skip(self, request),
        fields(
            tenant_id = %request.tenant_id(),
            product_id = %request.product_id(),
            quantity = request.quantity(),
            promotion = request.promotion().kind(),
        )
    )]
    pub async fn resolve(&self, request: &PurchaseRequest) -> Result<ResolvedLine, ResolveError> {
        let outcome = self.resolve_line(request).await;
        match &outcome {
            Ok(line) => debug!(
                unit_price = %line.unit_price,
                total = %line.total,
                pricing_path = ?line.pricing_path,
                "line resolved"
            ),
            Err(ResolveError::Rejected(rejection)) => info!(
                rejection = rejection.code(),
                reason = %rejection.message,
                "purchase rejected"
            ),
            Err(ResolveError::Store(err)) => warn!(
                store_error = %err,
                retryable = err.is_retryable(),
                "catalogue lookup failed"
            ),
        }
        outcome
    }

    async fn resolve_line(&self, request: &PurchaseRequest) -> Result<ResolvedLine, ResolveError> {
        let tenant_id = request.tenant_id();
        let product_id = request.product_id();

        let Some(product) = self.catalog.get_product(tenant_id, product_id).await? else {
            return Err(Rejection::not_found("unavailable").into());
        };
        check_product(Some(&product))?;

        // Held until the seat hold below is written (or the line is rejected).
        let _permit = match request.promotion().campaign_id() {
            Some(campaign_id) => Some(self.gate.enter(tenant_id, campaign_id).await),
            None => None,
        };

        let category = match product.category_id {
            Some(category_id) => self.catalog.get_category(tenant_id, category_id).await?,
            None => None,
        };

        let points_balance = match request.member_id() {
            Some(member_id) if product.pay_points_per_unit() > 0 => {
                self.points.balance(tenant_id, member_id).await?
            }
            _ => None,
        };

        let hold_secs = i64::try_from(self.seat_hold_secs).unwrap_or(i64::MAX);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let now = self.clock.now();
            let facts = LineFacts {
                product: Some(product.clone()),
                category: category.clone(),
                path: self.load_path(request, now).await?,
                points_balance,
            };
            let mut line = resolve(request, &facts, now)?;

            let (PromotionRef::GroupBuy(campaign_id), Some(version)) =
                (request.promotion(), line.campaign_version)
            else {
                return Ok(line);
            };

            let hold_until = now.saturating_add(hold_secs);
            let held = self
                .catalog
                .hold_group_buy_seat(
                    tenant_id,
                    campaign_id,
                    request.member_id(),
                    ExpectedVersion::new(version),
                    hold_until,
                )
                .await;
            match held {
                Ok(hold) => {
                    debug!(seat_id = %hold.seat_id, hold_until, "group-buy seat held");
                    line.seat_id = Some(hold.seat_id);
                    line.campaign_version = Some(hold.campaign_version);
                    return Ok(line);
                }
                Err(StoreError::Conflict(reason)) if attempt < SEAT_ATTEMPTS => {
                    debug!(attempt, %reason, "campaign changed while deciding; re-reading");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn load_path(
        &self,
        request: &PurchaseRequest,
        now: UnixSeconds,
    ) -> Result<PathFacts, StoreError> {
        let tenant_id = request.tenant_id();
        let product_id = request.product_id();
        Ok(match request.promotion() {
            PromotionRef::None => PathFacts::Regular {
                variants: self.catalog.list_variants(tenant_id, product_id).await?,
                tiers: self.catalog.list_discount_tiers(tenant_id, product_id).await?,
            },
            PromotionRef::GroupBuy(campaign_id) => PathFacts::GroupBuy(
                self.catalog
                    .load_group_buy_facts(tenant_id, product_id, campaign_id, now)
                    .await?,
            ),
            PromotionRef::FlashSale(campaign_id) => PathFacts::FlashSale(
                self.catalog
                    .load_flash_sale_facts(tenant_id, product_id, campaign_id, request.member_id())
                    .await?,
            ),
        })
    }

    /// Give back the group-buy seat held for `line`, if it has one.
    #[instrument(skip_all, fields(tenant_id = %line.tenant_id))]
    pub async fn release_seat(&self, line: &ResolvedLine) -> Result<(), StoreError> {
        let (Some(campaign_id), Some(seat_id)) = (line.campaign_id, line.seat_id) else {
            return Ok(());
        };
        self.catalog
            .release_group_buy_seat(line.tenant_id, campaign_id, seat_id)
            .await?;
        info!(%seat_id, "group-buy seat released");
        Ok(())
    }
}
