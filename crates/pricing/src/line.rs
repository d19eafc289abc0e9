//! The priced line and its finalization arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cartline_catalog::{Category, Product};
use cartline_core::money::{extend, round_money};
use cartline_core::{
    CampaignId, CategoryId, MemberId, ProductId, SeatId, TenantId, UnixSeconds, VariantId,
};

use crate::request::PurchaseRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingPath {
    Regular,
    GroupBuy,
    FlashSale,
}

/// Result of the path-specific step, before quantities are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPricing {
    pub path: PricingPath,
    pub unit_price: Decimal,
    pub variant_id: Option<VariantId>,
    pub sku: Option<String>,
    pub image: Option<String>,
    pub discount_percentage: Option<Decimal>,
    pub campaign_id: Option<CampaignId>,
    pub campaign_version: Option<u64>,
}

impl UnitPricing {
    pub fn regular(unit_price: Decimal) -> Self {
        Self {
            path: PricingPath::Regular,
            unit_price,
            variant_id: None,
            sku: None,
            image: None,
            discount_percentage: None,
            campaign_id: None,
            campaign_version: None,
        }
    }
}

/// Flat, serializable price snapshot handed to checkout.
///
/// Field order here is the serialized order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLine {
    pub tenant_id: TenantId,
    pub member_id: Option<MemberId>,
    pub product_id: ProductId,
    pub title: String,
    pub category_id: Option<CategoryId>,
    pub category_title: Option<String>,
    pub image: Option<String>,
    pub variant_id: Option<VariantId>,
    pub sku: Option<String>,
    pub quantity: u32,
    pub base_price: Decimal,
    pub unit_price: Decimal,
    pub discount_percentage: Option<Decimal>,
    pub total: Decimal,
    pub pricing_path: PricingPath,
    pub campaign_id: Option<CampaignId>,
    pub campaign_version: Option<u64>,
    /// Group-buy seat held for this line; checkout confirms or cancels it.
    pub seat_id: Option<SeatId>,
    pub points_only: bool,
    pub paid_points_total: i64,
    pub points_price_total: Decimal,
    pub weight_total: Decimal,
    pub returned_points: i64,
    pub resolved_at: UnixSeconds,
}

impl ResolvedLine {
    /// Apply quantity to a unit price and derive the points and weight totals.
    pub fn finalize(
        request: &PurchaseRequest,
        product: &Product,
        category: Option<&Category>,
        unit: UnitPricing,
        now: UnixSeconds,
    ) -> Self {
        let quantity = request.quantity();
        let qty = Decimal::from(quantity);

        let (total, points_price_total) = if product.points_only {
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            (
                extend(unit.unit_price, quantity),
                round_money(product.points_price_per_unit() * qty),
            )
        };

        let paid_points_total = product
            .pay_points_per_unit()
            .saturating_mul(i64::from(quantity));
        let returned_points = product.earn.returned_points(quantity, total);
        let weight_total = product.weight.max(Decimal::ZERO) * qty;

        Self {
            tenant_id: request.tenant_id(),
            member_id: request.member_id(),
            product_id: product.id,
            title: product.title.clone(),
            category_id: product.category_id,
            category_title: category.map(|c| c.title.clone()),
            image: unit.image.or_else(|| product.image.clone()),
            variant_id: unit.variant_id,
            sku: unit.sku,
            quantity,
            base_price: product.price,
            unit_price: unit.unit_price,
            discount_percentage: unit.discount_percentage,
            total,
            pricing_path: unit.path,
            campaign_id: unit.campaign_id,
            campaign_version: unit.campaign_version,
            seat_id: None,
            points_only: product.points_only,
            paid_points_total,
            points_price_total,
            weight_total,
            returned_points,
            resolved_at: now,
        }
    }
}
