//! The typed, immutable purchase request.

use serde::{Deserialize, Serialize};

use cartline_catalog::SkuSelector;
use cartline_core::{CampaignId, MemberId, ProductId, TenantId, ValueObject};

use crate::rejection::Rejection;

/// Promotional context of a line. At most one promotion by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "campaign_id", rename_all = "snake_case")]
pub enum PromotionRef {
    None,
    GroupBuy(CampaignId),
    FlashSale(CampaignId),
}

impl PromotionRef {
    /// Build from the two optional ids a client may send. Supplying both is a
    /// `ConflictingPromotions` rejection.
    pub fn from_ids(
        group_buy: Option<CampaignId>,
        flash_sale: Option<CampaignId>,
    ) -> Result<Self, Rejection> {
        match (group_buy, flash_sale) {
            (Some(_), Some(_)) => Err(Rejection::conflicting_promotions()),
            (Some(id), None) => Ok(PromotionRef::GroupBuy(id)),
            (None, Some(id)) => Ok(PromotionRef::FlashSale(id)),
            (None, None) => Ok(PromotionRef::None),
        }
    }

    pub fn campaign_id(&self) -> Option<CampaignId> {
        match self {
            PromotionRef::None => None,
            PromotionRef::GroupBuy(id) | PromotionRef::FlashSale(id) => Some(*id),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PromotionRef::None => "regular",
            PromotionRef::GroupBuy(_) => "group_buy",
            PromotionRef::FlashSale(_) => "flash_sale",
        }
    }
}

/// One cart line to be priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    tenant_id: TenantId,
    member_id: Option<MemberId>,
    client_ip: String,
    product_id: ProductId,
    quantity: u32,
    selector: SkuSelector,
    promotion: PromotionRef,
}

impl ValueObject for PurchaseRequest {}

impl PurchaseRequest {
    pub fn new(
        tenant_id: TenantId,
        member_id: Option<MemberId>,
        client_ip: impl Into<String>,
        product_id: ProductId,
        quantity: u32,
        selector: SkuSelector,
        promotion: PromotionRef,
    ) -> Result<Self, Rejection> {
        if quantity == 0 {
            return Err(Rejection::invalid_request("quantity must be at least 1"));
        }
        Ok(Self {
            tenant_id,
            member_id,
            client_ip: client_ip.into(),
            product_id,
            quantity,
            selector,
            promotion,
        })
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn member_id(&self) -> Option<MemberId> {
        self.member_id
    }

    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn selector(&self) -> &SkuSelector {
        &self.selector
    }

    pub fn promotion(&self) -> PromotionRef {
        self.promotion
    }
}
