//! The resolution state machine.

use cartline_catalog::{DiscountTier, Product, Variant, match_variant, select_tier};
use cartline_core::UnixSeconds;

use crate::facts::{LineFacts, PathFacts};
use crate::line::{ResolvedLine, UnitPricing};
use crate::promotion::{FlashSaleValidator, GroupBuyValidator};
use crate::rejection::Rejection;
use crate::request::{PromotionRef, PurchaseRequest};

/// `Start -> ProductLoaded`: the product must exist and be listed.
pub fn check_product(product: Option<&Product>) -> Result<&Product, Rejection> {
    let product = product.ok_or_else(|| Rejection::not_found("unavailable"))?;
    if !product.is_available() {
        return Err(Rejection::unavailable("unavailable"));
    }
    Ok(product)
}

/// Regular path: variant override first, then the quantity discount tier
/// against the (possibly overridden) price.
pub fn price_regular(
    product: &Product,
    variants: &[Variant],
    tiers: &[DiscountTier],
    request: &PurchaseRequest,
) -> Result<UnitPricing, Rejection> {
    let quantity = request.quantity();
    let mut unit = UnitPricing::regular(product.price);
    let mut stock = product.stock;

    if let Some(variant) = match_variant(variants, product.id, None, request.selector()) {
        unit.unit_price = variant.price;
        unit.variant_id = Some(variant.id);
        unit.sku = Some(variant.tokens.to_string());
        unit.image = variant.image.clone();
        stock = variant.stock;
    }

    if stock < quantity {
        return Err(Rejection::stock("insufficient stock"));
    }

    if let Some(tier) = select_tier(tiers, quantity) {
        unit.unit_price = tier.apply(unit.unit_price);
        unit.discount_percentage = Some(tier.percentage);
    }

    Ok(unit)
}

fn check_points(line: &ResolvedLine, balance: Option<i64>) -> Result<(), Rejection> {
    if line.paid_points_total == 0 {
        return Ok(());
    }
    match balance {
        Some(b) if b >= line.paid_points_total => Ok(()),
        Some(b) => Err(Rejection::insufficient_points(format!(
            "insufficient points: {} required, {b} available",
            line.paid_points_total
        ))),
        None => Err(Rejection::insufficient_points(format!(
            "insufficient points: {} required",
            line.paid_points_total
        ))),
    }
}

/// Decide one line from pre-loaded facts.
///
/// `facts.path` must correspond to `request.promotion()`.
pub fn resolve(
    request: &PurchaseRequest,
    facts: &LineFacts,
    now: UnixSeconds,
) -> Result<ResolvedLine, Rejection> {
    let product = check_product(facts.product.as_ref())?;
    let product_id = request.product_id();
    let quantity = request.quantity();
    let selector = request.selector();

    let unit = match (request.promotion(), &facts.path) {
        (PromotionRef::None, PathFacts::Regular { variants, tiers }) => {
            price_regular(product, variants, tiers, request)?
        }
        (PromotionRef::GroupBuy(campaign_id), PathFacts::GroupBuy(gb)) => {
            GroupBuyValidator::validate(gb, product_id, campaign_id, quantity, selector, now)?
        }
        (PromotionRef::FlashSale(campaign_id), PathFacts::FlashSale(fs)) => {
            if request.member_id().is_none() {
                return Err(Rejection::invalid_request("login required for flash sale"));
            }
            FlashSaleValidator::validate(fs, product_id, campaign_id, quantity, selector, now)?
        }
        _ => {
            return Err(Rejection::invalid_request(
                "loaded facts do not match the requested promotion",
            ));
        }
    };

    let line = ResolvedLine::finalize(request, product, facts.category.as_ref(), unit, now);
    check_points(&line, facts.points_balance)?;
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{FlashSaleFacts, GroupBuyFacts};
    use crate::line::PricingPath;
    use crate::rejection::RejectionKind;
    use cartline_catalog::{
        CampaignStatus, Category, FlashSaleCampaign, GroupBuyCampaign, PointsMethod, PointsRule,
        ProductStatus, SkuSelector, ValidityWindow,
    };
    use cartline_core::{CampaignId, CategoryId, MemberId, ProductId, TenantId, VariantId};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const NOW: UnixSeconds = 1_700_000_050;

    fn test_tenant_id() -> TenantId {
        TenantId::new()
    }

    fn product(price: Decimal) -> Product {
        Product {
            id: ProductId::new(),
            tenant_id: test_tenant_id(),
            category_id: None,
            title: "Linen shirt".to_string(),
            price,
            stock: 100,
            weight: dec!(0.25),
            image: Some("shirt.png".to_string()),
            earn: PointsRule::none(),
            pay_points: 0,
            points_price: Decimal::ZERO,
            points_only: false,
            status: ProductStatus::Active,
        }
    }

    fn request(product: &Product, quantity: u32, selector: &str, promotion: PromotionRef) -> PurchaseRequest {
        PurchaseRequest::new(
            product.tenant_id,
            Some(MemberId::new()),
            "10.0.0.1",
            product.id,
            quantity,
            SkuSelector::parse(selector),
            promotion,
        )
        .unwrap()
    }

    fn regular_facts(product: &Product, variants: Vec<Variant>, tiers: Vec<DiscountTier>) -> LineFacts {
        LineFacts {
            product: Some(product.clone()),
            category: None,
            path: PathFacts::Regular { variants, tiers },
            points_balance: None,
        }
    }

    fn variant(product: &Product, tokens: &str, price: Decimal, stock: u32) -> Variant {
        Variant {
            id: VariantId::new(),
            product_id: product.id,
            campaign_id: None,
            tokens: SkuSelector::parse(tokens),
            price,
            stock,
            image: None,
        }
    }

    #[test]
    fn scenario_tier_discount_on_base_price() {
        let p = product(dec!(100.00));
        let facts = regular_facts(&p, vec![], vec![DiscountTier::new(3, dec!(90)).unwrap()]);
        let line = resolve(&request(&p, 3, "", PromotionRef::None), &facts, NOW).unwrap();
        assert_eq!(line.unit_price, dec!(90.00));
        assert_eq!(line.total, dec!(270.00));
        assert_eq!(line.discount_percentage, Some(dec!(90)));
        assert_eq!(line.pricing_path, PricingPath::Regular);
    }

    #[test]
    fn scenario_variant_override() {
        let p = product(dec!(100.00));
        let v = variant(&p, "red,L", dec!(80.00), 5);
        let facts = regular_facts(&p, vec![v.clone()], vec![DiscountTier::new(3, dec!(90)).unwrap()]);
        let line = resolve(&request(&p, 2, "red,L", PromotionRef::None), &facts, NOW).unwrap();
        assert_eq!(line.unit_price, dec!(80.00));
        assert_eq!(line.total, dec!(160.00));
        assert_eq!(line.variant_id, Some(v.id));
        assert_eq!(line.discount_percentage, None);
        assert_eq!(line.image.as_deref(), Some("shirt.png"));
    }

    #[test]
    fn tier_applies_on_top_of_variant_price() {
        let p = product(dec!(100.00));
        let facts = regular_facts(
            &p,
            vec![variant(&p, "red,L", dec!(80.00), 5)],
            vec![DiscountTier::new(2, dec!(90)).unwrap()],
        );
        let line = resolve(&request(&p, 2, "red,L", PromotionRef::None), &facts, NOW).unwrap();
        assert_eq!(line.unit_price, dec!(72.00));
        assert_eq!(line.total, dec!(144.00));
    }

    #[test]
    fn regular_stock_is_checked_against_effective_stock() {
        let p = product(dec!(100.00));
        let facts = regular_facts(&p, vec![variant(&p, "red,L", dec!(80.00), 5)], vec![]);
        let err = resolve(&request(&p, 6, "red,L", PromotionRef::None), &facts, NOW).unwrap_err();
        assert_eq!(err.kind, RejectionKind::StockInsufficient);

        let mut low = product(dec!(10));
        low.stock = 1;
        let facts = regular_facts(&low, vec![], vec![]);
        let err = resolve(&request(&low, 2, "", PromotionRef::None), &facts, NOW).unwrap_err();
        assert_eq!(err.message, "insufficient stock");
    }

    #[test]
    fn unmatched_selector_keeps_base_price() {
        let p = product(dec!(100.00));
        let facts = regular_facts(&p, vec![variant(&p, "red,L", dec!(80.00), 5)], vec![]);
        let line = resolve(&request(&p, 1, "green", PromotionRef::None), &facts, NOW).unwrap();
        assert_eq!(line.unit_price, dec!(100.00));
        assert_eq!(line.variant_id, None);
    }

    #[test]
    fn missing_and_inactive_products_are_rejected() {
        let p = product(dec!(1));
        let mut facts = regular_facts(&p, vec![], vec![]);
        let req = request(&p, 1, "", PromotionRef::None);

        facts.product = None;
        assert_eq!(resolve(&req, &facts, NOW).unwrap_err().kind, RejectionKind::NotFound);

        let mut inactive = p.clone();
        inactive.status = ProductStatus::Inactive;
        facts.product = Some(inactive);
        let err = resolve(&req, &facts, NOW).unwrap_err();
        assert_eq!(err.kind, RejectionKind::Unavailable);
        assert_eq!(err.message, "unavailable");
    }

    #[test]
    fn group_buy_skips_tiers() {
        let p = product(dec!(100.00));
        let campaign = GroupBuyCampaign {
            id: CampaignId::new(),
            tenant_id: p.tenant_id,
            product_id: p.id,
            window: ValidityWindow::new(NOW - 10, NOW + 10).unwrap(),
            status: CampaignStatus::Active,
            head_count: 10,
            buy_limit: 5,
            buy_max: 0,
            price: dec!(60.00),
            version: 4,
        };
        let req = request(&p, 3, "", PromotionRef::GroupBuy(campaign.id));
        let facts = LineFacts {
            product: Some(p.clone()),
            category: None,
            path: PathFacts::GroupBuy(GroupBuyFacts {
                campaign: Some(campaign.clone()),
                seated: 10,
                variants: vec![],
            }),
            points_balance: None,
        };
        let err = resolve(&req, &facts, NOW).unwrap_err();
        assert_eq!(err.kind, RejectionKind::CapacityExceeded);
        assert_eq!(err.message, "campaign full");

        let facts = LineFacts {
            path: PathFacts::GroupBuy(GroupBuyFacts {
                campaign: Some(campaign.clone()),
                seated: 2,
                variants: vec![],
            }),
            ..facts
        };
        let line = resolve(&req, &facts, NOW).unwrap();
        assert_eq!(line.unit_price, dec!(60.00));
        assert_eq!(line.total, dec!(180.00));
        assert_eq!(line.discount_percentage, None);
        assert_eq!(line.campaign_id, Some(campaign.id));
        assert_eq!(line.campaign_version, Some(4));
    }

    fn flash_facts(p: &Product, buy_limit: u32) -> (CampaignId, LineFacts) {
        let campaign = FlashSaleCampaign {
            id: CampaignId::new(),
            tenant_id: p.tenant_id,
            product_id: p.id,
            window: ValidityWindow::new(NOW - 10, NOW + 10).unwrap(),
            status: CampaignStatus::Active,
            buy_limit,
            buy_max: 0,
            member_buy_max: 0,
            price: dec!(1.00),
            version: 1,
        };
        let id = campaign.id;
        (
            id,
            LineFacts {
                product: Some(p.clone()),
                category: None,
                path: PathFacts::FlashSale(FlashSaleFacts {
                    campaign: Some(campaign),
                    member_orders: 0,
                    variants: vec![],
                }),
                points_balance: None,
            },
        )
    }

    #[test]
    fn scenario_flash_sale_per_order_limit() {
        let p = product(dec!(100.00));
        let (id, facts) = flash_facts(&p, 2);
        let err = resolve(&request(&p, 3, "", PromotionRef::FlashSale(id)), &facts, NOW).unwrap_err();
        assert_eq!(err.kind, RejectionKind::CapacityExceeded);
        assert_eq!(err.message, "exceeds per-order limit of 2");
    }

    #[test]
    fn flash_sale_requires_a_member() {
        let p = product(dec!(100.00));
        let (id, facts) = flash_facts(&p, 2);
        let req = PurchaseRequest::new(
            p.tenant_id,
            None,
            "10.0.0.1",
            p.id,
            1,
            SkuSelector::default(),
            PromotionRef::FlashSale(id),
        )
        .unwrap();
        let err = resolve(&req, &facts, NOW).unwrap_err();
        assert_eq!(err.kind, RejectionKind::InvalidRequest);
    }

    #[test]
    fn mismatched_facts_are_refused() {
        let p = product(dec!(1));
        let facts = regular_facts(&p, vec![], vec![]);
        let req = request(&p, 1, "", PromotionRef::GroupBuy(CampaignId::new()));
        assert_eq!(
            resolve(&req, &facts, NOW).unwrap_err().kind,
            RejectionKind::InvalidRequest
        );
    }

    #[test]
    fn finalize_points_weight_and_category() {
        let mut p = product(dec!(10.00));
        p.category_id = Some(CategoryId::new());
        p.earn = PointsRule {
            method: PointsMethod::PercentOfTotal,
            rate: 10,
        };
        p.pay_points = 50;
        p.points_price = dec!(2.50);
        let category = Category {
            id: p.category_id.unwrap(),
            tenant_id: p.tenant_id,
            title: "Shirts".to_string(),
        };
        let mut facts = regular_facts(&p, vec![], vec![]);
        facts.category = Some(category);
        facts.points_balance = Some(150);

        let line = resolve(&request(&p, 3, "", PromotionRef::None), &facts, NOW).unwrap();
        assert_eq!(line.total, dec!(30.00));
        assert_eq!(line.paid_points_total, 150);
        assert_eq!(line.points_price_total, dec!(7.50));
        assert_eq!(line.weight_total, dec!(0.75));
        assert_eq!(line.returned_points, 3);
        assert_eq!(line.category_title.as_deref(), Some("Shirts"));
        assert_eq!(line.resolved_at, NOW);
    }

    #[test]
    fn insufficient_points_are_rejected() {
        let mut p = product(dec!(10.00));
        p.pay_points = 50;
        let mut facts = regular_facts(&p, vec![], vec![]);
        let req = request(&p, 3, "", PromotionRef::None);

        facts.points_balance = Some(149);
        assert_eq!(
            resolve(&req, &facts, NOW).unwrap_err().kind,
            RejectionKind::InsufficientPoints
        );
        facts.points_balance = None;
        assert_eq!(
            resolve(&req, &facts, NOW).unwrap_err().kind,
            RejectionKind::InsufficientPoints
        );
    }

    #[test]
    fn negative_points_clamp_to_zero() {
        let mut p = product(dec!(10.00));
        p.pay_points = -5;
        p.points_price = dec!(-1);
        p.earn = PointsRule {
            method: PointsMethod::PerUnit,
            rate: -3,
        };
        let facts = regular_facts(&p, vec![], vec![]);
        let line = resolve(&request(&p, 2, "", PromotionRef::None), &facts, NOW).unwrap();
        assert_eq!(line.paid_points_total, 0);
        assert_eq!(line.points_price_total, Decimal::ZERO);
        assert_eq!(line.returned_points, 0);
    }

    #[test]
    fn serialization_is_deterministic() {
        let p = product(dec!(100.00));
        let facts = regular_facts(&p, vec![], vec![]);
        let req = request(&p, 1, "", PromotionRef::None);
        let a = serde_json::to_string(&resolve(&req, &facts, NOW).unwrap()).unwrap();
        let b = serde_json::to_string(&resolve(&req, &facts, NOW).unwrap()).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("{\"tenant_id\":"));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Points-only products never carry a cash total.
            #[test]
            fn points_only_zeroes_cash_totals(
                cents in 0i64..1_000_000,
                quantity in 1u32..50,
                points_price in 0i64..10_000
            ) {
                let mut p = product(Decimal::new(cents, 2));
                p.points_only = true;
                p.points_price = Decimal::new(points_price, 2);
                let facts = regular_facts(&p, vec![], vec![]);
                let line = resolve(&request(&p, quantity, "", PromotionRef::None), &facts, NOW).unwrap();
                prop_assert_eq!(line.total, Decimal::ZERO);
                prop_assert_eq!(line.points_price_total, Decimal::ZERO);
            }

            /// Total is always unit price times quantity.
            #[test]
            fn total_is_unit_times_quantity(
                cents in 0i64..1_000_000,
                quantity in 1u32..100,
                min in 1u32..100,
                pct in 1u32..=100
            ) {
                let p = product(Decimal::new(cents, 2));
                let facts = regular_facts(&p, vec![], vec![DiscountTier::new(min, Decimal::from(pct)).unwrap()]);
                let line = resolve(&request(&p, quantity, "", PromotionRef::None), &facts, NOW).unwrap();
                prop_assert_eq!(line.total, line.unit_price * Decimal::from(quantity));
                prop_assert!(line.unit_price <= p.price);
            }

            /// On a ladder whose percentage falls as the minimum rises, one
            /// more unit never costs more per unit, and every tier starts at
            /// exactly its own minimum.
            #[test]
            fn unit_price_never_rises_with_quantity(
                cents in 1i64..1_000_000,
                steps in proptest::collection::vec((1u32..10, 1u32..10), 1..6),
                quantity in 1u32..60
            ) {
                let mut min = 0;
                let mut pct = 100u32;
                let mut tiers = Vec::new();
                for (more_units, less_pct) in steps {
                    min += more_units;
                    pct -= less_pct;
                    tiers.push(DiscountTier::new(min, Decimal::from(pct)).unwrap());
                }
                let p = product(Decimal::new(cents, 2));
                let facts = regular_facts(&p, vec![], tiers.clone());
                let line_at = |q: u32| {
                    resolve(&request(&p, q, "", PromotionRef::None), &facts, NOW).unwrap()
                };

                prop_assert!(line_at(quantity + 1).unit_price <= line_at(quantity).unit_price);

                for tier in &tiers {
                    let at_min = line_at(tier.min_quantity);
                    prop_assert_eq!(at_min.discount_percentage, Some(tier.percentage));
                    prop_assert_eq!(at_min.unit_price, tier.apply(p.price));
                    if tier.min_quantity > 1 {
                        let below = line_at(tier.min_quantity - 1);
                        prop_assert_ne!(below.discount_percentage, Some(tier.percentage));
                    }
                }
            }
        }
    }
}
