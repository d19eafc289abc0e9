//! Quantity discount tiers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cartline_core::money::apply_percentage;
use cartline_core::{DomainError, DomainResult};

/// "Buy at least `min_quantity`, pay `percentage`% of the unit price."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountTier {
    pub min_quantity: u32,
    pub percentage: Decimal,
}

impl DiscountTier {
    pub fn new(min_quantity: u32, percentage: Decimal) -> DomainResult<Self> {
        if min_quantity == 0 {
            return Err(DomainError::invariant("discount tier min_quantity must be >= 1"));
        }
        if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
            return Err(DomainError::invariant(format!(
                "discount tier percentage must be within 0..=100, got {percentage}"
            )));
        }
        Ok(Self {
            min_quantity,
            percentage,
        })
    }

    pub fn qualifies(&self, quantity: u32) -> bool {
        self.min_quantity <= quantity
    }

    /// `round(price * percentage / 100, 2)`.
    pub fn apply(&self, price: Decimal) -> Decimal {
        apply_percentage(price, self.percentage)
    }
}

/// Pick the tier for `quantity`: the largest qualifying `min_quantity`, and
/// among equal minimums the lowest percentage (lowest resulting price).
pub fn select_tier(tiers: &[DiscountTier], quantity: u32) -> Option<&DiscountTier> {
    tiers
        .iter()
        .filter(|t| t.qualifies(quantity))
        .min_by(|a, b| {
            b.min_quantity
                .cmp(&a.min_quantity)
                .then_with(|| a.percentage.cmp(&b.percentage))
        })
}
