//! Money arithmetic on `rust_decimal::Decimal`.
//!
//! All prices are carried as decimals and rounded to two places with
//! midpoint-away-from-zero (0.005 becomes 0.01).

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits kept on prices.
pub const MONEY_SCALE: u32 = 2;

/// Round an amount to [`MONEY_SCALE`] places.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `round(amount * percentage / 100, 2)`.
pub fn apply_percentage(amount: Decimal, percentage: Decimal) -> Decimal {
    round_money(amount * percentage / Decimal::ONE_HUNDRED)
}

/// `amount * quantity`, rounded.
pub fn extend(amount: Decimal, quantity: u32) -> Decimal {
    round_money(amount * Decimal::from(quantity))
}
