use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use cartline_core::{CategoryId, ProductId, TenantId};

/// Product listing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
}

/// How loyalty points are earned on a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointsMethod {
    /// `rate` points per unit bought.
    PerUnit,
    /// `rate` percent of the line total, in points.
    PercentOfTotal,
}

/// Earn rule attached to a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsRule {
    pub method: PointsMethod,
    pub rate: i64,
}

impl PointsRule {
    pub fn none() -> Self {
        Self {
            method: PointsMethod::PerUnit,
            rate: 0,
        }
    }

    /// Points returned to the buyer for `quantity` units totalling `total`.
    ///
    /// Negative rates clamp to zero. Percent-of-total truncates to whole
    /// points.
    pub fn returned_points(&self, quantity: u32, total: Decimal) -> i64 {
        let rate = self.rate.max(0);
        match self.method {
            PointsMethod::PerUnit => rate.saturating_mul(i64::from(quantity)),
            PointsMethod::PercentOfTotal => {
                let points = (total * Decimal::from(rate) / Decimal::ONE_HUNDRED).trunc();
                points.to_i64().unwrap_or(i64::MAX).max(0)
            }
        }
    }
}

/// Catalogue product as the resolver sees it (read-only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub tenant_id: TenantId,
    pub category_id: Option<CategoryId>,
    pub title: String,
    pub price: Decimal,
    pub stock: u32,
    pub weight: Decimal,
    pub image: Option<String>,
    /// Points earned by buying.
    pub earn: PointsRule,
    /// Points the buyer must spend per unit.
    pub pay_points: i64,
    /// Cash amount the spent points stand in for, per unit.
    pub points_price: Decimal,
    /// Redeemable with points only; the cash total is forced to zero.
    pub points_only: bool,
    pub status: ProductStatus,
}

impl Product {
    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Redemption points per unit, clamped at zero.
    pub fn pay_points_per_unit(&self) -> i64 {
        self.pay_points.max(0)
    }

    /// Redemption cash value per unit, clamped at zero.
    pub fn points_price_per_unit(&self) -> Decimal {
        self.points_price.max(Decimal::ZERO)
    }
}
