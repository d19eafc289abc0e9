//! `cartline-catalog`: read-only catalogue records and the pure rules that
//! select among them (variant matching, quantity discount tiers, campaign
//! windows).

pub mod campaign;
pub mod category;
pub mod discount;
pub mod product;
pub mod variant;

pub use campaign::{
    CampaignStatus, FlashSaleCampaign, GroupBuyCampaign, ParticipantStatus, ValidityWindow,
    WindowPosition,
};
pub use category::Category;
pub use discount::{DiscountTier, select_tier};
pub use product::{PointsMethod, PointsRule, Product, ProductStatus};
pub use variant::{SkuSelector, Variant, match_variant};
