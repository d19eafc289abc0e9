//! Group-buy and flash-sale eligibility.
//!
//! Both validators run their checks in a fixed order and stop at the first
//! failure, so the rejection a caller sees is always the earliest one.

use rust_decimal::Decimal;

use cartline_catalog::{SkuSelector, Variant, WindowPosition, match_variant};
use cartline_core::{CampaignId, ProductId, UnixSeconds};

use crate::facts::{FlashSaleFacts, GroupBuyFacts};
use crate::line::{PricingPath, UnitPricing};
use crate::rejection::Rejection;

pub struct GroupBuyValidator;

impl GroupBuyValidator {
    pub fn validate(
        facts: &GroupBuyFacts,
        product_id: ProductId,
        campaign_id: CampaignId,
        quantity: u32,
        selector: &SkuSelector,
        now: UnixSeconds,
    ) -> Result<UnitPricing, Rejection> {
        let campaign = facts
            .campaign
            .as_ref()
            .filter(|c| c.id == campaign_id && c.product_id == product_id && c.is_active())
            .ok_or_else(|| Rejection::not_found("not open or delisted"))?;

        if !campaign.window.contains(now) {
            return Err(Rejection::out_of_window("outside validity window"));
        }
        if campaign.is_full(facts.seated) {
            return Err(Rejection::capacity("campaign full"));
        }
        check_order_limits(quantity, campaign.buy_limit, campaign.buy_max)?;

        let unit = promotional_unit(
            &facts.variants,
            product_id,
            campaign_id,
            quantity,
            selector,
            campaign.price,
        )?;

        Ok(UnitPricing {
            path: PricingPath::GroupBuy,
            campaign_version: Some(campaign.version),
            ..unit
        })
    }
}

pub struct FlashSaleValidator;

impl FlashSaleValidator {
    pub fn validate(
        facts: &FlashSaleFacts,
        product_id: ProductId,
        campaign_id: CampaignId,
        quantity: u32,
        selector: &SkuSelector,
        now: UnixSeconds,
    ) -> Result<UnitPricing, Rejection> {
        let campaign = facts
            .campaign
            .as_ref()
            .filter(|c| c.id == campaign_id && c.product_id == product_id && c.is_active())
            .ok_or_else(|| Rejection::not_found("not found"))?;

        match campaign.window.position(now) {
            WindowPosition::NotStarted => return Err(Rejection::out_of_window("not started")),
            WindowPosition::Ended => return Err(Rejection::out_of_window("ended")),
            WindowPosition::Open => {}
        }
        check_order_limits(quantity, campaign.buy_limit, campaign.buy_max)?;
        if campaign.member_limit_reached(facts.member_orders) {
            return Err(Rejection::capacity("member purchase limit reached"));
        }

        let unit = promotional_unit(
            &facts.variants,
            product_id,
            campaign_id,
            quantity,
            selector,
            campaign.price,
        )?;

        Ok(UnitPricing {
            path: PricingPath::FlashSale,
            campaign_version: Some(campaign.version),
            ..unit
        })
    }
}

fn check_order_limits(quantity: u32, buy_limit: u32, buy_max: u32) -> Result<(), Rejection> {
    if quantity > buy_limit {
        return Err(Rejection::capacity(format!(
            "exceeds per-order limit of {buy_limit}"
        )));
    }
    if buy_max != 0 && quantity > buy_max {
        return Err(Rejection::capacity("exceeds per-order maximum"));
    }
    Ok(())
}

/// Campaign price, or the campaign SKU's price when a selector is given.
fn promotional_unit(
    variants: &[Variant],
    product_id: ProductId,
    campaign_id: CampaignId,
    quantity: u32,
    selector: &SkuSelector,
    campaign_price: Decimal,
) -> Result<UnitPricing, Rejection> {
    let mut unit = UnitPricing {
        campaign_id: Some(campaign_id),
        ..UnitPricing::regular(campaign_price)
    };
    if selector.is_empty() {
        return Ok(unit);
    }

    let variant = match_variant(variants, product_id, Some(campaign_id), selector)
        .ok_or_else(|| Rejection::not_found("no matching promotional sku"))?;
    if variant.stock < quantity {
        return Err(Rejection::stock("insufficient promotional stock"));
    }

    unit.unit_price = variant.price;
    unit.variant_id = Some(variant.id);
    unit.sku = Some(variant.tokens.to_string());
    unit.image = variant.image.clone();
    Ok(unit)
}
