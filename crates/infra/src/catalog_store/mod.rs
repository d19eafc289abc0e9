//! Read access to catalogue records.

mod in_memory;
mod postgres;
pub mod schema;

pub use in_memory::InMemoryCatalogStore;
pub use postgres::PostgresCatalogStore;

use std::sync::Arc;

use cartline_catalog::{Category, DiscountTier, FlashSaleCampaign, GroupBuyCampaign, Product, Variant};
use cartline_core::{
    CampaignId, CategoryId, ExpectedVersion, MemberId, ProductId, SeatId, TenantId, UnixSeconds,
};
use cartline_pricing::{FlashSaleFacts, GroupBuyFacts};

use crate::error::StoreError;

/// A pending group-buy participant written for one resolution.
///
/// The seat counts against the campaign's head-count until `hold_until`,
/// unless checkout confirms or cancels it first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatHold {
    pub seat_id: SeatId,
    /// Campaign version after the hold was written.
    pub campaign_version: u64,
    pub hold_until: UnixSeconds,
}

/// Tenant-scoped catalogue.
///
/// Every lookup takes the tenant explicitly; a record belonging to another
/// tenant is indistinguishable from a missing one.
///
/// List operations return rows in storage order. Variant matching depends on
/// it (first match wins).
///
/// The only writes are group-buy seat holds and their release.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Option<Product>, StoreError>;

    async fn get_category(
        &self,
        tenant_id: TenantId,
        category_id: CategoryId,
    ) -> Result<Option<Category>, StoreError>;

    /// Regular (non-campaign) SKU rows of a product.
    async fn list_variants(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Vec<Variant>, StoreError>;

    async fn list_discount_tiers(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Vec<DiscountTier>, StoreError>;

    async fn get_group_buy_campaign(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        campaign_id: CampaignId,
    ) -> Result<Option<GroupBuyCampaign>, StoreError>;

    /// Participants whose status occupies a seat (pending, paid, confirmed).
    /// Pending holds whose `hold_until` has passed at `now` are not counted.
    async fn count_group_buy_participants(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
        now: UnixSeconds,
    ) -> Result<u64, StoreError>;

    /// Write a pending participant and move the campaign to its next version.
    ///
    /// Fails with [`StoreError::Conflict`] when the campaign is no longer at
    /// `expected` (another seat was taken or released since the decision) or
    /// no longer exists.
    async fn hold_group_buy_seat(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
        member_id: Option<MemberId>,
        expected: ExpectedVersion,
        hold_until: UnixSeconds,
    ) -> Result<SeatHold, StoreError>;

    /// Cancel a hold that never made it into a purchase intent.
    /// Releasing an unknown or already settled seat is a no-op.
    async fn release_group_buy_seat(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
        seat_id: SeatId,
    ) -> Result<(), StoreError>;

    async fn get_flash_sale_campaign(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        campaign_id: CampaignId,
    ) -> Result<Option<FlashSaleCampaign>, StoreError>;

    async fn count_member_flash_sale_orders(
        &self,
        tenant_id: TenantId,
        member_id: MemberId,
        campaign_id: CampaignId,
    ) -> Result<u64, StoreError>;

    /// A campaign's own SKU rows for a product.
    async fn list_campaign_variants(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        campaign_id: CampaignId,
    ) -> Result<Vec<Variant>, StoreError>;

    /// Everything a group-buy decision reads.
    ///
    /// The default composes the single lookups. Backends that can read them
    /// from one consistent snapshot should override it.
    async fn load_group_buy_facts(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        campaign_id: CampaignId,
        now: UnixSeconds,
    ) -> Result<GroupBuyFacts, StoreError> {
        let Some(campaign) = self
            .get_group_buy_campaign(tenant_id, product_id, campaign_id)
            .await?
        else {
            return Ok(GroupBuyFacts {
                campaign: None,
                seated: 0,
                variants: vec![],
            });
        };
        let seated = self
            .count_group_buy_participants(tenant_id, campaign_id, now)
            .await?;
        let variants = self
            .list_campaign_variants(tenant_id, product_id, campaign_id)
            .await?;
        Ok(GroupBuyFacts {
            campaign: Some(campaign),
            seated,
            variants,
        })
    }

    /// Everything a flash-sale decision reads.
    async fn load_flash_sale_facts(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        campaign_id: CampaignId,
        member_id: Option<MemberId>,
    ) -> Result<FlashSaleFacts, StoreError> {
        let Some(campaign) = self
            .get_flash_sale_campaign(tenant_id, product_id, campaign_id)
            .await?
        else {
            return Ok(FlashSaleFacts {
                campaign: None,
                member_orders: 0,
                variants: vec![],
            });
        };
        let member_orders = match member_id {
            Some(member_id) => {
                self.count_member_flash_sale_orders(tenant_id, member_id, campaign_id)
                    .await?
            }
            None => 0,
        };
        let variants = self
            .list_campaign_variants(tenant_id, product_id, campaign_id)
            .await?;
        Ok(FlashSaleFacts {
            campaign: Some(campaign),
            member_orders,
            variants,
        })
    }
}

#[async_trait::async_trait]
impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    async fn get_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Option<Product>, StoreError> {
        (**self).get_product(tenant_id, product_id).await
    }

    async fn get_category(
        &self,
        tenant_id: TenantId,
        category_id: CategoryId,
    ) -> Result<Option<Category>, StoreError> {
        (**self).get_category(tenant_id, category_id).await
    }

    async fn list_variants(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Vec<Variant>, StoreError> {
        (**self).list_variants(tenant_id, product_id).await
    }

    async fn list_discount_tiers(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Vec<DiscountTier>, StoreError> {
        (**self).list_discount_tiers(tenant_id, product_id).await
    }

    async fn get_group_buy_campaign(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        campaign_id: CampaignId,
    ) -> Result<Option<GroupBuyCampaign>, StoreError> {
        (**self)
            .get_group_buy_campaign(tenant_id, product_id, campaign_id)
            .await
    }

    async fn count_group_buy_participants(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
        now: UnixSeconds,
    ) -> Result<u64, StoreError> {
        (**self)
            .count_group_buy_participants(tenant_id, campaign_id, now)
            .await
    }

    async fn hold_group_buy_seat(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
        member_id: Option<MemberId>,
        expected: ExpectedVersion,
        hold_until: UnixSeconds,
    ) -> Result<SeatHold, StoreError> {
        (**self)
            .hold_group_buy_seat(tenant_id, campaign_id, member_id, expected, hold_until)
            .await
    }

    async fn release_group_buy_seat(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
        seat_id: SeatId,
    ) -> Result<(), StoreError> {
        (**self)
            .release_group_buy_seat(tenant_id, campaign_id, seat_id)
            .await
    }

    async fn get_flash_sale_campaign(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        campaign_id: CampaignId,
    ) -> Result<Option<FlashSaleCampaign>, StoreError> {
        (**self)
            .get_flash_sale_campaign(tenant_id, product_id, campaign_id)
            .await
    }

    async fn count_member_flash_sale_orders(
        &self,
        tenant_id: TenantId,
        member_id: MemberId,
        campaign_id: CampaignId,
    ) -> Result<u64, StoreError> {
        (**self)
            .count_member_flash_sale_orders(tenant_id, member_id, campaign_id)
            .await
    }

    async fn list_campaign_variants(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        campaign_id: CampaignId,
    ) -> Result<Vec<Variant>, StoreError> {
        (**self)
            .list_campaign_variants(tenant_id, product_id, campaign_id)
            .await
    }

    async fn load_group_buy_facts(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        campaign_id: CampaignId,
        now: UnixSeconds,
    ) -> Result<GroupBuyFacts, StoreError> {
        (**self)
            .load_group_buy_facts(tenant_id, product_id, campaign_id, now)
            .await
    }

    async fn load_flash_sale_facts(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        campaign_id: CampaignId,
        member_id: Option<MemberId>,
    ) -> Result<FlashSaleFacts, StoreError> {
        (**self)
            .load_flash_sale_facts(tenant_id, product_id, campaign_id, member_id)
            .await
    }
}
