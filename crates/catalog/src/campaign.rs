//! Promotional campaigns: group-buy and flash-sale.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cartline_core::{CampaignId, DomainError, DomainResult, ProductId, TenantId, UnixSeconds};

/// Inclusive `[begin, end]` window in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    pub begin: UnixSeconds,
    pub end: UnixSeconds,
}

/// Where an instant falls relative to a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    NotStarted,
    Open,
    Ended,
}

impl ValidityWindow {
    pub fn new(begin: UnixSeconds, end: UnixSeconds) -> DomainResult<Self> {
        if end < begin {
            return Err(DomainError::invariant(format!(
                "validity window ends before it begins ({begin} > {end})"
            )));
        }
        Ok(Self { begin, end })
    }

    pub fn position(&self, now: UnixSeconds) -> WindowPosition {
        if now < self.begin {
            WindowPosition::NotStarted
        } else if now > self.end {
            WindowPosition::Ended
        } else {
            WindowPosition::Open
        }
    }

    pub fn contains(&self, now: UnixSeconds) -> bool {
        self.position(now) == WindowPosition::Open
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Inactive,
}

/// Status of a group-buy participation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Pending,
    Paid,
    Confirmed,
    Cancelled,
    Refunded,
}

impl ParticipantStatus {
    /// Whether this participant occupies a seat in the group.
    pub fn occupies_seat(self) -> bool {
        matches!(
            self,
            ParticipantStatus::Pending | ParticipantStatus::Paid | ParticipantStatus::Confirmed
        )
    }
}

/// Group-buy offer for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBuyCampaign {
    pub id: CampaignId,
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub window: ValidityWindow,
    pub status: CampaignStatus,
    /// Seats in the group.
    pub head_count: u32,
    /// Max units in a single order.
    pub buy_limit: u32,
    /// Secondary per-order cap; `0` means uncapped.
    pub buy_max: u32,
    pub price: Decimal,
    pub version: u64,
}

impl GroupBuyCampaign {
    pub fn is_active(&self) -> bool {
        self.status == CampaignStatus::Active
    }

    pub fn is_full(&self, seated: u64) -> bool {
        seated >= u64::from(self.head_count)
    }
}

/// Flash-sale offer for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashSaleCampaign {
    pub id: CampaignId,
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub window: ValidityWindow,
    pub status: CampaignStatus,
    pub buy_limit: u32,
    /// `0` means uncapped.
    pub buy_max: u32,
    /// Orders one member may place against the sale; `0` means uncapped.
    pub member_buy_max: u32,
    pub price: Decimal,
    pub version: u64,
}

impl FlashSaleCampaign {
    pub fn is_active(&self) -> bool {
        self.status == CampaignStatus::Active
    }

    pub fn member_limit_reached(&self, member_orders: u64) -> bool {
        self.member_buy_max > 0 && member_orders >= u64::from(self.member_buy_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_rejects_inverted_bounds() {
        assert!(ValidityWindow::new(10, 9).is_err());
        assert!(ValidityWindow::new(10, 10).is_ok());
    }

    #[test]
    fn only_live_participants_occupy_seats() {
        assert!(ParticipantStatus::Pending.occupies_seat());
        assert!(ParticipantStatus::Paid.occupies_seat());
        assert!(ParticipantStatus::Confirmed.occupies_seat());
        assert!(!ParticipantStatus::Cancelled.occupies_seat());
        assert!(!ParticipantStatus::Refunded.occupies_seat());
    }

    #[test]
    fn zero_member_cap_is_uncapped() {
        let sale = FlashSaleCampaign {
            id: CampaignId::new(),
            tenant_id: TenantId::new(),
            product_id: ProductId::new(),
            window: ValidityWindow::new(0, 10).unwrap(),
            status: CampaignStatus::Active,
            buy_limit: 5,
            buy_max: 0,
            member_buy_max: 0,
            price: Decimal::ONE,
            version: 1,
        };
        assert!(!sale.member_limit_reached(1_000));
        let capped = FlashSaleCampaign {
            member_buy_max: 2,
            ..sale
        };
        assert!(!capped.member_limit_reached(1));
        assert!(capped.member_limit_reached(2));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Both bounds are inside the window; one second outside is not.
            #[test]
            fn window_is_inclusive_at_both_ends(t in -1_000_000i64..1_000_000, len in 0i64..10_000) {
                let w = ValidityWindow::new(t, t + len).unwrap();
                prop_assert!(w.contains(t));
                prop_assert!(w.contains(t + len));
                prop_assert_eq!(w.position(t - 1), WindowPosition::NotStarted);
                prop_assert_eq!(w.position(t + len + 1), WindowPosition::Ended);
            }
        }
    }
}
