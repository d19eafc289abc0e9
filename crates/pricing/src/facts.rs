//! Catalogue facts loaded for one resolution.
//!
//! The infra layer fills these from a store snapshot; the pricing rules only
//! ever look at what is in here.

use cartline_catalog::{Category, DiscountTier, FlashSaleCampaign, GroupBuyCampaign, Product, Variant};

/// Everything a group-buy decision reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBuyFacts {
    pub campaign: Option<GroupBuyCampaign>,
    /// Participants whose status occupies a seat.
    pub seated: u64,
    /// The campaign's own SKU table.
    pub variants: Vec<Variant>,
}

/// Everything a flash-sale decision reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashSaleFacts {
    pub campaign: Option<FlashSaleCampaign>,
    /// Orders the requesting member has already placed against the sale.
    pub member_orders: u64,
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathFacts {
    Regular {
        variants: Vec<Variant>,
        tiers: Vec<DiscountTier>,
    },
    GroupBuy(GroupBuyFacts),
    FlashSale(FlashSaleFacts),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFacts {
    pub product: Option<Product>,
    pub category: Option<Category>,
    pub path: PathFacts,
    /// Member's points balance; `None` when not looked up or anonymous.
    pub points_balance: Option<i64>,
}
