use std::collections::HashMap;
use std::sync::RwLock;

use cartline_catalog::{
    Category, DiscountTier, FlashSaleCampaign, GroupBuyCampaign, ParticipantStatus, Product, Variant,
};
use cartline_core::{
    CampaignId, CategoryId, ExpectedVersion, MemberId, ProductId, SeatId, TenantId, UnixSeconds,
};

use super::{CatalogStore, SeatHold};
use crate::error::StoreError;

#[derive(Debug, Clone)]
struct Participant {
    id: SeatId,
    tenant_id: TenantId,
    campaign_id: CampaignId,
    status: ParticipantStatus,
    /// Set on seats held by a resolution; `None` for rows seeded as-is.
    hold_until: Option<UnixSeconds>,
}

impl Participant {
    fn occupies_seat(&self, now: UnixSeconds) -> bool {
        match self.status {
            ParticipantStatus::Pending => self.hold_until.is_none_or(|until| now < until),
            status => status.occupies_seat(),
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    products: HashMap<(TenantId, ProductId), Product>,
    categories: HashMap<(TenantId, CategoryId), Category>,
    /// Regular and campaign SKU rows, in insertion order.
    variants: Vec<(TenantId, Variant)>,
    tiers: HashMap<(TenantId, ProductId), Vec<DiscountTier>>,
    group_buys: HashMap<(TenantId, CampaignId), GroupBuyCampaign>,
    participants: Vec<Participant>,
    flash_sales: HashMap<(TenantId, CampaignId), FlashSaleCampaign>,
    flash_sale_orders: Vec<(TenantId, CampaignId, MemberId)>,
}

/// In-memory catalogue.
///
/// Intended for tests/dev. Seeded through the `insert_*`/`add_*` methods.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    tables: RwLock<Tables>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(f(&tables))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut tables = match self.tables.write() {
            Ok(t) => t,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut tables)
    }

    pub fn insert_product(&self, product: Product) {
        self.write(|t| {
            t.products.insert((product.tenant_id, product.id), product);
        });
    }

    pub fn insert_category(&self, category: Category) {
        self.write(|t| {
            t.categories.insert((category.tenant_id, category.id), category);
        });
    }

    /// Append a SKU row (regular when `campaign_id` is `None`).
    pub fn add_variant(&self, tenant_id: TenantId, variant: Variant) {
        self.write(|t| t.variants.push((tenant_id, variant)));
    }

    pub fn add_discount_tier(&self, tenant_id: TenantId, product_id: ProductId, tier: DiscountTier) {
        self.write(|t| t.tiers.entry((tenant_id, product_id)).or_default().push(tier));
    }

    pub fn insert_group_buy(&self, campaign: GroupBuyCampaign) {
        self.write(|t| {
            t.group_buys.insert((campaign.tenant_id, campaign.id), campaign);
        });
    }

    /// Seed a participant row. `member_id` is kept for parity with the
    /// Postgres table; seat counting does not look at it.
    pub fn add_participant(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
        _member_id: MemberId,
        status: ParticipantStatus,
    ) -> SeatId {
        let id = SeatId::new();
        self.write(|t| {
            t.participants.push(Participant {
                id,
                tenant_id,
                campaign_id,
                status,
                hold_until: None,
            })
        });
        id
    }

    pub fn seat_status(&self, tenant_id: TenantId, seat_id: SeatId) -> Option<ParticipantStatus> {
        self.read(|t| {
            t.participants
                .iter()
                .find(|p| p.tenant_id == tenant_id && p.id == seat_id)
                .map(|p| p.status)
        })
        .ok()
        .flatten()
    }

    pub fn insert_flash_sale(&self, campaign: FlashSaleCampaign) {
        self.write(|t| {
            t.flash_sales.insert((campaign.tenant_id, campaign.id), campaign);
        });
    }

    pub fn add_flash_sale_order(&self, tenant_id: TenantId, campaign_id: CampaignId, member_id: MemberId) {
        self.write(|t| t.flash_sale_orders.push((tenant_id, campaign_id, member_id)));
    }

    fn variants_where(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        campaign_id: Option<CampaignId>,
    ) -> Result<Vec<Variant>, StoreError> {
        self.read(|t| {
            t.variants
                .iter()
                .filter(|(tid, v)| {
                    *tid == tenant_id && v.product_id == product_id && v.campaign_id == campaign_id
                })
                .map(|(_, v)| v.clone())
                .collect()
        })
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn get_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Option<Product>, StoreError> {
        self.read(|t| t.products.get(&(tenant_id, product_id)).cloned())
    }

    async fn get_category(
        &self,
        tenant_id: TenantId,
        category_id: CategoryId,
    ) -> Result<Option<Category>, StoreError> {
        self.read(|t| t.categories.get(&(tenant_id, category_id)).cloned())
    }

    async fn list_variants(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Vec<Variant>, StoreError> {
        self.variants_where(tenant_id, product_id, None)
    }

    async fn list_discount_tiers(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Vec<DiscountTier>, StoreError> {
        self.read(|t| {
            t.tiers
                .get(&(tenant_id, product_id))
                .cloned()
                .unwrap_or_default()
        })
    }

    async fn get_group_buy_campaign(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        campaign_id: CampaignId,
    ) -> Result<Option<GroupBuyCampaign>, StoreError> {
        self.read(|t| {
            t.group_buys
                .get(&(tenant_id, campaign_id))
                .filter(|c| c.product_id == product_id)
                .cloned()
        })
    }

    async fn count_group_buy_participants(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
        now: UnixSeconds,
    ) -> Result<u64, StoreError> {
        self.read(|t| {
            t.participants
                .iter()
                .filter(|p| {
                    p.tenant_id == tenant_id && p.campaign_id == campaign_id && p.occupies_seat(now)
                })
                .count() as u64
        })
    }

    async fn hold_group_buy_seat(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
        _member_id: Option<MemberId>,
        expected: ExpectedVersion,
        hold_until: UnixSeconds,
    ) -> Result<SeatHold, StoreError> {
        self.write(|t| {
            let campaign = t
                .group_buys
                .get_mut(&(tenant_id, campaign_id))
                .ok_or_else(|| StoreError::Conflict(format!("group buy {campaign_id} is gone")))?;
            let version = expected.advance(campaign.version)?;
            campaign.version = version;

            let seat_id = SeatId::new();
            t.participants.push(Participant {
                id: seat_id,
                tenant_id,
                campaign_id,
                status: ParticipantStatus::Pending,
                hold_until: Some(hold_until),
            });
            Ok(SeatHold {
                seat_id,
                campaign_version: version,
                hold_until,
            })
        })
    }

    async fn release_group_buy_seat(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
        seat_id: SeatId,
    ) -> Result<(), StoreError> {
        self.write(|t| {
            let Some(seat) = t.participants.iter_mut().find(|p| {
                p.tenant_id == tenant_id
                    && p.campaign_id == campaign_id
                    && p.id == seat_id
                    && p.status == ParticipantStatus::Pending
            }) else {
                return;
            };
            seat.status = ParticipantStatus::Cancelled;
            if let Some(campaign) = t.group_buys.get_mut(&(tenant_id, campaign_id)) {
                campaign.version = campaign.version.saturating_add(1);
            }
        });
        Ok(())
    }

    async fn get_flash_sale_campaign(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        campaign_id: CampaignId,
    ) -> Result<Option<FlashSaleCampaign>, StoreError> {
        self.read(|t| {
            t.flash_sales
                .get(&(tenant_id, campaign_id))
                .filter(|c| c.product_id == product_id)
                .cloned()
        })
    }

    async fn count_member_flash_sale_orders(
        &self,
        tenant_id: TenantId,
        member_id: MemberId,
        campaign_id: CampaignId,
    ) -> Result<u64, StoreError> {
        self.read(|t| {
            t.flash_sale_orders
                .iter()
                .filter(|(tid, cid, mid)| *tid == tenant_id && *cid == campaign_id && *mid == member_id)
                .count() as u64
        })
    }

    async fn list_campaign_variants(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        campaign_id: CampaignId,
    ) -> Result<Vec<Variant>, StoreError> {
        self.variants_where(tenant_id, product_id, Some(campaign_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartline_catalog::{CampaignStatus, SkuSelector, ValidityWindow};
    use cartline_core::VariantId;
    use rust_decimal_macros::dec;

    fn campaign(tenant_id: TenantId, product_id: ProductId) -> GroupBuyCampaign {
        GroupBuyCampaign {
            id: CampaignId::new(),
            tenant_id,
            product_id,
            window: ValidityWindow::new(0, 100).unwrap(),
            status: CampaignStatus::Active,
            head_count: 3,
            buy_limit: 1,
            buy_max: 0,
            price: dec!(1),
            version: 1,
        }
    }

    #[tokio::test]
    async fn only_seated_participants_are_counted() {
        let store = InMemoryCatalogStore::new();
        let tenant_id = TenantId::new();
        let c = campaign(tenant_id, ProductId::new());
        store.insert_group_buy(c.clone());
        for status in [
            ParticipantStatus::Pending,
            ParticipantStatus::Paid,
            ParticipantStatus::Cancelled,
            ParticipantStatus::Refunded,
        ] {
            store.add_participant(tenant_id, c.id, MemberId::new(), status);
        }
        assert_eq!(store.count_group_buy_participants(tenant_id, c.id, 50).await.unwrap(), 2);
        assert_eq!(
            store.count_group_buy_participants(TenantId::new(), c.id, 50).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn held_seat_counts_until_it_lapses() {
        let store = InMemoryCatalogStore::new();
        let tenant_id = TenantId::new();
        let c = campaign(tenant_id, ProductId::new());
        store.insert_group_buy(c.clone());

        let hold = store
            .hold_group_buy_seat(tenant_id, c.id, None, ExpectedVersion::new(1), 60)
            .await
            .unwrap();
        assert_eq!(hold.campaign_version, 2);
        assert_eq!(store.count_group_buy_participants(tenant_id, c.id, 59).await.unwrap(), 1);
        assert_eq!(store.count_group_buy_participants(tenant_id, c.id, 60).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn hold_against_stale_version_conflicts() {
        let store = InMemoryCatalogStore::new();
        let tenant_id = TenantId::new();
        let c = campaign(tenant_id, ProductId::new());
        store.insert_group_buy(c.clone());

        store
            .hold_group_buy_seat(tenant_id, c.id, None, ExpectedVersion::new(1), 60)
            .await
            .unwrap();
        let err = store
            .hold_group_buy_seat(tenant_id, c.id, None, ExpectedVersion::new(1), 60)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.count_group_buy_participants(tenant_id, c.id, 0).await.unwrap(), 1);

        let err = store
            .hold_group_buy_seat(tenant_id, CampaignId::new(), None, ExpectedVersion::new(1), 60)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn released_hold_frees_the_seat_once() {
        let store = InMemoryCatalogStore::new();
        let tenant_id = TenantId::new();
        let c = campaign(tenant_id, ProductId::new());
        store.insert_group_buy(c.clone());
        let hold = store
            .hold_group_buy_seat(tenant_id, c.id, Some(MemberId::new()), ExpectedVersion::new(1), 60)
            .await
            .unwrap();

        store.release_group_buy_seat(tenant_id, c.id, hold.seat_id).await.unwrap();
        assert_eq!(store.seat_status(tenant_id, hold.seat_id), Some(ParticipantStatus::Cancelled));
        assert_eq!(store.count_group_buy_participants(tenant_id, c.id, 0).await.unwrap(), 0);

        // A second release neither fails nor moves the version again.
        store.release_group_buy_seat(tenant_id, c.id, hold.seat_id).await.unwrap();
        let next = store
            .hold_group_buy_seat(tenant_id, c.id, None, ExpectedVersion::new(3), 60)
            .await
            .unwrap();
        assert_eq!(next.campaign_version, 4);
    }

    #[tokio::test]
    async fn flash_sale_lookup_is_scoped_to_product() {
        let store = InMemoryCatalogStore::new();
        let tenant_id = TenantId::new();
        let product_id = ProductId::new();
        let sale = FlashSaleCampaign {
            id: CampaignId::new(),
            tenant_id,
            product_id,
            window: ValidityWindow::new(0, 100).unwrap(),
            status: CampaignStatus::Active,
            buy_limit: 1,
            buy_max: 0,
            member_buy_max: 0,
            price: dec!(1),
            version: 1,
        };
        store.insert_flash_sale(sale.clone());

        assert!(store
            .get_flash_sale_campaign(tenant_id, product_id, sale.id)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .get_flash_sale_campaign(tenant_id, ProductId::new(), sale.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn campaign_lookup_is_scoped_to_product_and_tenant() {
        let store = InMemoryCatalogStore::new();
        let tenant_id = TenantId::new();
        let product_id = ProductId::new();
        let c = campaign(tenant_id, product_id);
        store.insert_group_buy(c.clone());

        assert!(store.get_group_buy_campaign(tenant_id, product_id, c.id).await.unwrap().is_some());
        assert!(store
            .get_group_buy_campaign(tenant_id, ProductId::new(), c.id)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .get_group_buy_campaign(TenantId::new(), product_id, c.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn variants_keep_insertion_order_and_scope() {
        let store = InMemoryCatalogStore::new();
        let tenant_id = TenantId::new();
        let product_id = ProductId::new();
        let campaign_id = CampaignId::new();
        for (tokens, cid) in [("a", None), ("b", Some(campaign_id)), ("c", None)] {
            store.add_variant(
                tenant_id,
                Variant {
                    id: VariantId::new(),
                    product_id,
                    campaign_id: cid,
                    tokens: SkuSelector::parse(tokens),
                    price: dec!(1),
                    stock: 1,
                    image: None,
                },
            );
        }
        let regular: Vec<String> = store
            .list_variants(tenant_id, product_id)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.tokens.to_string())
            .collect();
        assert_eq!(regular, vec!["a", "c"]);
        let promo = store
            .list_campaign_variants(tenant_id, product_id, campaign_id)
            .await
            .unwrap();
        assert_eq!(promo.len(), 1);
    }

    #[tokio::test]
    async fn default_fact_loading_skips_counts_for_missing_campaigns() {
        let store = InMemoryCatalogStore::new();
        let facts = store
            .load_group_buy_facts(TenantId::new(), ProductId::new(), CampaignId::new(), 0)
            .await
            .unwrap();
        assert!(facts.campaign.is_none());
        assert_eq!(facts.seated, 0);
    }
}
