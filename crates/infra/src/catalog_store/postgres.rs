//! Postgres-backed catalogue.
//!
//! Table names come from the [`StoreConfig`] handed to [`PostgresCatalogStore::new`];
//! SQL text is built once at construction.
//!
//! Campaign facts (campaign row, seat or member-order count, campaign SKU
//! rows) are read inside a single `REPEATABLE READ READ ONLY` transaction so
//! a decision never mixes rows from different commits.
//!
//! A seat hold locks the campaign row (`FOR UPDATE`), checks its version,
//! inserts the pending participant and bumps the version in one transaction.
//! Any other process deciding on the same campaign then fails its own hold
//! with a conflict instead of overselling.
//!
//! SKU superset matching is not pushed into SQL: rows are returned in `seq`
//! order and matched with the same rule the in-memory store uses.

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use cartline_catalog::{
    CampaignStatus, Category, DiscountTier, FlashSaleCampaign, GroupBuyCampaign, PointsMethod,
    PointsRule, Product, ProductStatus, SkuSelector, ValidityWindow, Variant,
};
use cartline_core::{
    CampaignId, CategoryId, ExpectedVersion, MemberId, ProductId, SeatId, TenantId, UnixSeconds,
    VariantId,
};
use cartline_pricing::{FlashSaleFacts, GroupBuyFacts};

use super::{CatalogStore, SeatHold};
use super::schema::TableNames;
use crate::config::StoreConfig;
use crate::error::{StoreError, map_sqlx_error};

#[derive(Debug)]
struct Queries {
    product: String,
    category: String,
    variants: String,
    tiers: String,
    group_buy: String,
    seated: String,
    lock_group_buy: String,
    set_group_buy_version: String,
    bump_group_buy_version: String,
    insert_seat: String,
    cancel_seat: String,
    group_buy_variants: String,
    flash_sale: String,
    member_orders: String,
    flash_sale_variants: String,
}

impl Queries {
    fn new(t: &TableNames) -> Self {
        let sku_select = |table: &str, scope: Option<&str>| {
            let (col, filter) = match scope {
                Some(c) => (format!("{c} AS campaign_id"), format!(" AND {c} = $3")),
                None => ("NULL::uuid AS campaign_id".to_string(), String::new()),
            };
            format!(
                r#"SELECT id, goods_id, {col}, sku, price, quantity, image
                   FROM "{table}"
                   WHERE tenant_id = $1 AND goods_id = $2{filter}
                   ORDER BY seq ASC"#
            )
        };

        Self {
            product: format!(
                r#"SELECT id, tenant_id, cat_id, title, price, quantity, weight, image,
                          points_method, points, pay_points, points_price, is_points_goods, status
                   FROM "{}" WHERE tenant_id = $1 AND id = $2"#,
                t.goods
            ),
            category: format!(
                r#"SELECT id, tenant_id, title FROM "{}" WHERE tenant_id = $1 AND id = $2"#,
                t.category
            ),
            variants: sku_select(&t.goods_sku_value, None),
            tiers: format!(
                r#"SELECT min_quantity, percentage FROM "{}"
                   WHERE tenant_id = $1 AND goods_id = $2 ORDER BY seq ASC"#,
                t.goods_discount
            ),
            group_buy: format!(
                r#"SELECT id, tenant_id, goods_id, begin_date, end_date, status, people_num,
                          buy_limit, buy_max, price, version
                   FROM "{}" WHERE tenant_id = $1 AND goods_id = $2 AND id = $3"#,
                t.tuan_goods
            ),
            seated: format!(
                r#"SELECT COUNT(*) AS total FROM "{}"
                   WHERE tenant_id = $1 AND tuan_id = $2
                     AND (status IN (1, 2)
                          OR (status = 0 AND (hold_until IS NULL OR hold_until > $3)))"#,
                t.tuan_follow
            ),
            lock_group_buy: format!(
                r#"SELECT version FROM "{}" WHERE tenant_id = $1 AND id = $2 FOR UPDATE"#,
                t.tuan_goods
            ),
            set_group_buy_version: format!(
                r#"UPDATE "{}" SET version = $3 WHERE tenant_id = $1 AND id = $2"#,
                t.tuan_goods
            ),
            bump_group_buy_version: format!(
                r#"UPDATE "{}" SET version = version + 1 WHERE tenant_id = $1 AND id = $2"#,
                t.tuan_goods
            ),
            insert_seat: format!(
                r#"INSERT INTO "{}" (id, tenant_id, tuan_id, uid, status, hold_until)
                   VALUES ($1, $2, $3, $4, 0, $5)"#,
                t.tuan_follow
            ),
            cancel_seat: format!(
                r#"UPDATE "{}" SET status = 3
                   WHERE tenant_id = $1 AND tuan_id = $2 AND id = $3 AND status = 0"#,
                t.tuan_follow
            ),
            group_buy_variants: sku_select(&t.tuan_goods_sku_value, Some("tuan_id")),
            flash_sale: format!(
                r#"SELECT id, tenant_id, goods_id, begin_date, end_date, status, buy_limit,
                          buy_max, member_buy_max, price, version
                   FROM "{}" WHERE tenant_id = $1 AND goods_id = $2 AND id = $3"#,
                t.miaosha_goods
            ),
            member_orders: format!(
                r#"SELECT COUNT(*) AS total FROM "{}"
                   WHERE tenant_id = $1 AND uid = $2 AND ms_id = $3"#,
                t.order
            ),
            flash_sale_variants: sku_select(&t.miaosha_goods_sku_value, Some("ms_id")),
        }
    }
}

/// Postgres-backed, tenant-scoped catalogue.
#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: Arc<PgPool>,
    tables: Arc<TableNames>,
    queries: Arc<Queries>,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool, config: &StoreConfig) -> Self {
        let tables = TableNames::new(config);
        let queries = Queries::new(&tables);
        Self {
            pool: Arc::new(pool),
            tables: Arc::new(tables),
            queries: Arc::new(queries),
        }
    }

    /// Create any missing tables (dev/test convenience).
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for stmt in self.tables.ddl() {
            sqlx::query(&stmt)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    async fn begin_snapshot(&self) -> Result<sqlx::Transaction<'static, sqlx::Postgres>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_snapshot", e))?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("begin_snapshot", e))?;
        Ok(tx)
    }
}

fn decode_err(operation: &str) -> impl Fn(sqlx::Error) -> StoreError + '_ {
    move |e| StoreError::Serialization(format!("failed to decode row in {operation}: {e}"))
}

fn non_negative(v: i32) -> u32 {
    u32::try_from(v).unwrap_or(0)
}

fn active(status: i16) -> CampaignStatus {
    if status == 1 {
        CampaignStatus::Active
    } else {
        CampaignStatus::Inactive
    }
}

fn window(row: &PgRow, operation: &str) -> Result<ValidityWindow, StoreError> {
    let begin: i64 = row.try_get("begin_date").map_err(decode_err(operation))?;
    let end: i64 = row.try_get("end_date").map_err(decode_err(operation))?;
    ValidityWindow::new(begin, end).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    let d = decode_err("get_product");
    let points_method: i16 = row.try_get("points_method").map_err(&d)?;
    let status: i16 = row.try_get("status").map_err(&d)?;
    Ok(Product {
        id: ProductId::from_uuid(row.try_get("id").map_err(&d)?),
        tenant_id: TenantId::from_uuid(row.try_get("tenant_id").map_err(&d)?),
        category_id: row
            .try_get::<Option<Uuid>, _>("cat_id")
            .map_err(&d)?
            .map(CategoryId::from_uuid),
        title: row.try_get("title").map_err(&d)?,
        price: row.try_get("price").map_err(&d)?,
        stock: non_negative(row.try_get("quantity").map_err(&d)?),
        weight: row.try_get("weight").map_err(&d)?,
        image: row.try_get("image").map_err(&d)?,
        earn: PointsRule {
            method: if points_method == 1 {
                PointsMethod::PercentOfTotal
            } else {
                PointsMethod::PerUnit
            },
            rate: row.try_get("points").map_err(&d)?,
        },
        pay_points: row.try_get("pay_points").map_err(&d)?,
        points_price: row.try_get("points_price").map_err(&d)?,
        points_only: row.try_get("is_points_goods").map_err(&d)?,
        status: if status == 1 {
            ProductStatus::Active
        } else {
            ProductStatus::Inactive
        },
    })
}

fn variant_from_row(row: &PgRow) -> Result<Variant, StoreError> {
    let d = decode_err("list_variants");
    let sku: String = row.try_get("sku").map_err(&d)?;
    Ok(Variant {
        id: VariantId::from_uuid(row.try_get("id").map_err(&d)?),
        product_id: ProductId::from_uuid(row.try_get("goods_id").map_err(&d)?),
        campaign_id: row
            .try_get::<Option<Uuid>, _>("campaign_id")
            .map_err(&d)?
            .map(CampaignId::from_uuid),
        tokens: SkuSelector::parse(&sku),
        price: row.try_get("price").map_err(&d)?,
        stock: non_negative(row.try_get("quantity").map_err(&d)?),
        image: row.try_get("image").map_err(&d)?,
    })
}

fn group_buy_from_row(row: &PgRow) -> Result<GroupBuyCampaign, StoreError> {
    let d = decode_err("get_group_buy_campaign");
    let version: i64 = row.try_get("version").map_err(&d)?;
    Ok(GroupBuyCampaign {
        id: CampaignId::from_uuid(row.try_get("id").map_err(&d)?),
        tenant_id: TenantId::from_uuid(row.try_get("tenant_id").map_err(&d)?),
        product_id: ProductId::from_uuid(row.try_get("goods_id").map_err(&d)?),
        window: window(row, "get_group_buy_campaign")?,
        status: active(row.try_get("status").map_err(&d)?),
        head_count: non_negative(row.try_get("people_num").map_err(&d)?),
        buy_limit: non_negative(row.try_get("buy_limit").map_err(&d)?),
        buy_max: non_negative(row.try_get("buy_max").map_err(&d)?),
        price: row.try_get("price").map_err(&d)?,
        version: u64::try_from(version).unwrap_or(0),
    })
}

fn flash_sale_from_row(row: &PgRow) -> Result<FlashSaleCampaign, StoreError> {
    let d = decode_err("get_flash_sale_campaign");
    let version: i64 = row.try_get("version").map_err(&d)?;
    Ok(FlashSaleCampaign {
        id: CampaignId::from_uuid(row.try_get("id").map_err(&d)?),
        tenant_id: TenantId::from_uuid(row.try_get("tenant_id").map_err(&d)?),
        product_id: ProductId::from_uuid(row.try_get("goods_id").map_err(&d)?),
        window: window(row, "get_flash_sale_campaign")?,
        status: active(row.try_get("status").map_err(&d)?),
        buy_limit: non_negative(row.try_get("buy_limit").map_err(&d)?),
        buy_max: non_negative(row.try_get("buy_max").map_err(&d)?),
        member_buy_max: non_negative(row.try_get("member_buy_max").map_err(&d)?),
        price: row.try_get("price").map_err(&d)?,
        version: u64::try_from(version).unwrap_or(0),
    })
}

async fn fetch_variants<'e, E: PgExecutor<'e>>(
    sql: &str,
    executor: E,
    tenant_id: TenantId,
    product_id: ProductId,
    campaign_id: Option<CampaignId>,
) -> Result<Vec<Variant>, StoreError> {
    let mut query = sqlx::query(sql)
        .bind(*tenant_id.as_uuid())
        .bind(*product_id.as_uuid());
    if let Some(campaign_id) = campaign_id {
        query = query.bind(*campaign_id.as_uuid());
    }
    let rows = query
        .fetch_all(executor)
        .await
        .map_err(|e| map_sqlx_error("list_variants", e))?;
    rows.iter().map(variant_from_row).collect()
}

async fn fetch_count<'e, E: PgExecutor<'e>>(
    operation: &str,
    sql: &str,
    executor: E,
    binds: &[Uuid],
) -> Result<u64, StoreError> {
    let mut query = sqlx::query(sql);
    for b in binds {
        query = query.bind(*b);
    }
    let row = query
        .fetch_one(executor)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?;
    let total: i64 = row.try_get("total").map_err(decode_err(operation))?;
    Ok(u64::try_from(total).unwrap_or(0))
}

async fn fetch_seated<'e, E: PgExecutor<'e>>(
    operation: &str,
    sql: &str,
    executor: E,
    tenant_id: TenantId,
    campaign_id: CampaignId,
    now: UnixSeconds,
) -> Result<u64, StoreError> {
    let row = sqlx::query(sql)
        .bind(*tenant_id.as_uuid())
        .bind(*campaign_id.as_uuid())
        .bind(now)
        .fetch_one(executor)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?;
    let total: i64 = row.try_get("total").map_err(decode_err(operation))?;
    Ok(u64::try_from(total).unwrap_or(0))
}

#[async_trait::async_trait]
impl CatalogStore for PostgresCatalogStore {
    #[instrument(skip(self), err)]
    async fn get_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&self.queries.product)
            .bind(*tenant_id.as_uuid())
            .bind(*product_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn get_category(
        &self,
        tenant_id: TenantId,
        category_id: CategoryId,
    ) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query(&self.queries.category)
            .bind(*tenant_id.as_uuid())
            .bind(*category_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_category", e))?;
        let d = decode_err("get_category");
        row.map(|row| -> Result<Category, StoreError> {
            Ok(Category {
                id: CategoryId::from_uuid(row.try_get("id").map_err(&d)?),
                tenant_id: TenantId::from_uuid(row.try_get("tenant_id").map_err(&d)?),
                title: row.try_get("title").map_err(&d)?,
            })
        })
        .transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_variants(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Vec<Variant>, StoreError> {
        fetch_variants(&self.queries.variants, &*self.pool, tenant_id, product_id, None).await
    }

    #[instrument(skip(self), err)]
    async fn list_discount_tiers(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Vec<DiscountTier>, StoreError> {
        let rows = sqlx::query(&self.queries.tiers)
            .bind(*tenant_id.as_uuid())
            .bind(*product_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_discount_tiers", e))?;
        let d = decode_err("list_discount_tiers");
        rows.iter()
            .map(|row| -> Result<DiscountTier, StoreError> {
                let min_quantity: i32 = row.try_get("min_quantity").map_err(&d)?;
                let percentage: Decimal = row.try_get("percentage").map_err(&d)?;
                DiscountTier::new(non_negative(min_quantity), percentage)
                    .map_err(|e| StoreError::Serialization(e.to_string()))
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn get_group_buy_campaign(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        campaign_id: CampaignId,
    ) -> Result<Option<GroupBuyCampaign>, StoreError> {
        let row = sqlx::query(&self.queries.group_buy)
            .bind(*tenant_id.as_uuid())
            .bind(*product_id.as_uuid())
            .bind(*campaign_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_group_buy_campaign", e))?;
        row.as_ref().map(group_buy_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn count_group_buy_participants(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
        now: UnixSeconds,
    ) -> Result<u64, StoreError> {
        fetch_seated(
            "count_group_buy_participants",
            &self.queries.seated,
            &*self.pool,
            tenant_id,
            campaign_id,
            now,
        )
        .await
    }

    #[instrument(skip(self), err)]
    async fn hold_group_buy_seat(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
        member_id: Option<MemberId>,
        expected: ExpectedVersion,
        hold_until: UnixSeconds,
    ) -> Result<SeatHold, StoreError> {
        let op = "hold_group_buy_seat";
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error(op, e))?;

        let row = sqlx::query(&self.queries.lock_group_buy)
            .bind(*tenant_id.as_uuid())
            .bind(*campaign_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(op, e))?
            .ok_or_else(|| StoreError::Conflict(format!("group buy {campaign_id} is gone")))?;
        let current: i64 = row.try_get("version").map_err(decode_err(op))?;
        let version = expected.advance(u64::try_from(current).unwrap_or(0))?;
        let stored = i64::try_from(version)
            .map_err(|_| StoreError::Backend("campaign version out of range".to_string()))?;

        sqlx::query(&self.queries.set_group_buy_version)
            .bind(*tenant_id.as_uuid())
            .bind(*campaign_id.as_uuid())
            .bind(stored)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(op, e))?;

        let seat_id = SeatId::new();
        sqlx::query(&self.queries.insert_seat)
            .bind(*seat_id.as_uuid())
            .bind(*tenant_id.as_uuid())
            .bind(*campaign_id.as_uuid())
            .bind(member_id.map(|m| *m.as_uuid()))
            .bind(hold_until)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(op, e))?;

        tx.commit().await.map_err(|e| map_sqlx_error(op, e))?;
        Ok(SeatHold {
            seat_id,
            campaign_version: version,
            hold_until,
        })
    }

    #[instrument(skip(self), err)]
    async fn release_group_buy_seat(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
        seat_id: SeatId,
    ) -> Result<(), StoreError> {
        let op = "release_group_buy_seat";
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error(op, e))?;

        let cancelled = sqlx::query(&self.queries.cancel_seat)
            .bind(*tenant_id.as_uuid())
            .bind(*campaign_id.as_uuid())
            .bind(*seat_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(op, e))?
            .rows_affected();
        if cancelled > 0 {
            sqlx::query(&self.queries.bump_group_buy_version)
                .bind(*tenant_id.as_uuid())
                .bind(*campaign_id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error(op, e))?;
        }

        tx.commit().await.map_err(|e| map_sqlx_error(op, e))
    }

    #[instrument(skip(self), err)]
    async fn get_flash_sale_campaign(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        campaign_id: CampaignId,
    ) -> Result<Option<FlashSaleCampaign>, StoreError> {
        let row = sqlx::query(&self.queries.flash_sale)
            .bind(*tenant_id.as_uuid())
            .bind(*product_id.as_uuid())
            .bind(*campaign_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_flash_sale_campaign", e))?;
        row.as_ref().map(flash_sale_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn count_member_flash_sale_orders(
        &self,
        tenant_id: TenantId,
        member_id: MemberId,
        campaign_id: CampaignId,
    ) -> Result<u64, StoreError> {
        fetch_count(
            "count_member_flash_sale_orders",
            &self.queries.member_orders,
            &*self.pool,
            &[*tenant_id.as_uuid(), *member_id.as_uuid(), *campaign_id.as_uuid()],
        )
        .await
    }

    #[instrument(skip(self), err)]
    async fn list_campaign_variants(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        campaign_id: CampaignId,
    ) -> Result<Vec<Variant>, StoreError> {
        // Group-buy and flash-sale SKUs live in separate tables; a campaign id
        // only ever appears in one of them.
        let mut rows = fetch_variants(
            &self.queries.group_buy_variants,
            &*self.pool,
            tenant_id,
            product_id,
            Some(campaign_id),
        )
        .await?;
        if rows.is_empty() {
            rows = fetch_variants(
                &self.queries.flash_sale_variants,
                &*self.pool,
                tenant_id,
                product_id,
                Some(campaign_id),
            )
            .await?;
        }
        Ok(rows)
    }

    #[instrument(skip(self), err)]
    async fn load_group_buy_facts(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        campaign_id: CampaignId,
        now: UnixSeconds,
    ) -> Result<GroupBuyFacts, StoreError> {
        let mut tx = self.begin_snapshot().await?;

        let row = sqlx::query(&self.queries.group_buy)
            .bind(*tenant_id.as_uuid())
            .bind(*product_id.as_uuid())
            .bind(*campaign_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("load_group_buy_facts", e))?;
        let campaign = row.as_ref().map(group_buy_from_row).transpose()?;

        let facts = match campaign {
            None => GroupBuyFacts {
                campaign: None,
                seated: 0,
                variants: vec![],
            },
            Some(campaign) => {
                let seated = fetch_seated(
                    "load_group_buy_facts",
                    &self.queries.seated,
                    &mut *tx,
                    tenant_id,
                    campaign_id,
                    now,
                )
                .await?;
                let variants = fetch_variants(
                    &self.queries.group_buy_variants,
                    &mut *tx,
                    tenant_id,
                    product_id,
                    Some(campaign_id),
                )
                .await?;
                GroupBuyFacts {
                    campaign: Some(campaign),
                    seated,
                    variants,
                }
            }
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("load_group_buy_facts", e))?;
        Ok(facts)
    }

    #[instrument(skip(self), err)]
    async fn load_flash_sale_facts(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        campaign_id: CampaignId,
        member_id: Option<MemberId>,
    ) -> Result<FlashSaleFacts, StoreError> {
        let mut tx = self.begin_snapshot().await?;

        let row = sqlx::query(&self.queries.flash_sale)
            .bind(*tenant_id.as_uuid())
            .bind(*product_id.as_uuid())
            .bind(*campaign_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("load_flash_sale_facts", e))?;
        let campaign = row.as_ref().map(flash_sale_from_row).transpose()?;

        let facts = match campaign {
            None => FlashSaleFacts {
                campaign: None,
                member_orders: 0,
                variants: vec![],
            },
            Some(campaign) => {
                let member_orders = match member_id {
                    Some(member_id) => {
                        fetch_count(
                            "load_flash_sale_facts",
                            &self.queries.member_orders,
                            &mut *tx,
                            &[*tenant_id.as_uuid(), *member_id.as_uuid(), *campaign_id.as_uuid()],
                        )
                        .await?
                    }
                    None => 0,
                };
                let variants = fetch_variants(
                    &self.queries.flash_sale_variants,
                    &mut *tx,
                    tenant_id,
                    product_id,
                    Some(campaign_id),
                )
                .await?;
                FlashSaleFacts {
                    campaign: Some(campaign),
                    member_orders,
                    variants,
                }
            }
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("load_flash_sale_facts", e))?;
        Ok(facts)
    }
}
