//! Table names and DDL, derived from a [`StoreConfig`] prefix.

use crate::config::StoreConfig;

/// Fully-qualified table names for one prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub goods: String,
    pub goods_sku_value: String,
    pub goods_discount: String,
    pub category: String,
    pub tuan_goods: String,
    pub tuan_goods_sku_value: String,
    pub tuan_follow: String,
    pub miaosha_goods: String,
    pub miaosha_goods_sku_value: String,
    pub order: String,
    pub member: String,
    pub goods_buynowinfo: String,
}

impl TableNames {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            goods: config.table("goods"),
            goods_sku_value: config.table("goods_sku_value"),
            goods_discount: config.table("goods_discount"),
            category: config.table("category"),
            tuan_goods: config.table("tuan_goods"),
            tuan_goods_sku_value: config.table("tuan_goods_sku_value"),
            tuan_follow: config.table("tuan_follow"),
            miaosha_goods: config.table("miaosha_goods"),
            miaosha_goods_sku_value: config.table("miaosha_goods_sku_value"),
            order: config.table("order"),
            member: config.table("member"),
            goods_buynowinfo: config.table("goods_buynowinfo"),
        }
    }

    /// `CREATE TABLE IF NOT EXISTS` statements for every table.
    ///
    /// Status columns are small integers: products and campaigns use `1` for
    /// active; participants use 0 pending, 1 paid, 2 confirmed, 3 cancelled,
    /// 4 refunded. `hold_until` is set on pending rows written by a seat hold.
    pub fn ddl(&self) -> Vec<String> {
        let sku_table = |name: &str, campaign_col: Option<&str>| {
            let campaign = campaign_col
                .map(|c| format!("{c} UUID NOT NULL,"))
                .unwrap_or_default();
            format!(
                r#"CREATE TABLE IF NOT EXISTS "{name}" (
                    seq BIGSERIAL PRIMARY KEY,
                    id UUID NOT NULL UNIQUE,
                    tenant_id UUID NOT NULL,
                    goods_id UUID NOT NULL,
                    {campaign}
                    sku TEXT NOT NULL,
                    price NUMERIC(12, 2) NOT NULL,
                    quantity INTEGER NOT NULL DEFAULT 0,
                    image TEXT
                )"#
            )
        };

        vec![
            format!(
                r#"CREATE TABLE IF NOT EXISTS "{}" (
                    id UUID PRIMARY KEY,
                    tenant_id UUID NOT NULL,
                    cat_id UUID,
                    title TEXT NOT NULL,
                    price NUMERIC(12, 2) NOT NULL,
                    quantity INTEGER NOT NULL DEFAULT 0,
                    weight NUMERIC(12, 3) NOT NULL DEFAULT 0,
                    image TEXT,
                    points_method SMALLINT NOT NULL DEFAULT 0,
                    points BIGINT NOT NULL DEFAULT 0,
                    pay_points BIGINT NOT NULL DEFAULT 0,
                    points_price NUMERIC(12, 2) NOT NULL DEFAULT 0,
                    is_points_goods BOOLEAN NOT NULL DEFAULT FALSE,
                    status SMALLINT NOT NULL DEFAULT 1
                )"#,
                self.goods
            ),
            format!(
                r#"CREATE TABLE IF NOT EXISTS "{}" (
                    id UUID PRIMARY KEY,
                    tenant_id UUID NOT NULL,
                    title TEXT NOT NULL
                )"#,
                self.category
            ),
            sku_table(&self.goods_sku_value, None),
            format!(
                r#"CREATE TABLE IF NOT EXISTS "{}" (
                    seq BIGSERIAL PRIMARY KEY,
                    tenant_id UUID NOT NULL,
                    goods_id UUID NOT NULL,
                    min_quantity INTEGER NOT NULL CHECK (min_quantity > 0),
                    percentage NUMERIC(5, 2) NOT NULL CHECK (percentage >= 0 AND percentage <= 100)
                )"#,
                self.goods_discount
            ),
            format!(
                r#"CREATE TABLE IF NOT EXISTS "{}" (
                    id UUID PRIMARY KEY,
                    tenant_id UUID NOT NULL,
                    goods_id UUID NOT NULL,
                    begin_date BIGINT NOT NULL,
                    end_date BIGINT NOT NULL,
                    status SMALLINT NOT NULL DEFAULT 1,
                    people_num INTEGER NOT NULL,
                    buy_limit INTEGER NOT NULL,
                    buy_max INTEGER NOT NULL DEFAULT 0,
                    price NUMERIC(12, 2) NOT NULL,
                    version BIGINT NOT NULL DEFAULT 1
                )"#,
                self.tuan_goods
            ),
            sku_table(&self.tuan_goods_sku_value, Some("tuan_id")),
            format!(
                r#"CREATE TABLE IF NOT EXISTS "{}" (
                    id UUID PRIMARY KEY,
                    tenant_id UUID NOT NULL,
                    tuan_id UUID NOT NULL,
                    uid UUID,
                    status SMALLINT NOT NULL DEFAULT 0,
                    hold_until BIGINT
                )"#,
                self.tuan_follow
            ),
            format!(
                r#"CREATE TABLE IF NOT EXISTS "{}" (
                    id UUID PRIMARY KEY,
                    tenant_id UUID NOT NULL,
                    goods_id UUID NOT NULL,
                    begin_date BIGINT NOT NULL,
                    end_date BIGINT NOT NULL,
                    status SMALLINT NOT NULL DEFAULT 1,
                    buy_limit INTEGER NOT NULL,
                    buy_max INTEGER NOT NULL DEFAULT 0,
                    member_buy_max INTEGER NOT NULL DEFAULT 0,
                    price NUMERIC(12, 2) NOT NULL,
                    version BIGINT NOT NULL DEFAULT 1
                )"#,
                self.miaosha_goods
            ),
            sku_table(&self.miaosha_goods_sku_value, Some("ms_id")),
            format!(
                r#"CREATE TABLE IF NOT EXISTS "{}" (
                    id UUID PRIMARY KEY,
                    tenant_id UUID NOT NULL,
                    uid UUID NOT NULL,
                    ms_id UUID
                )"#,
                self.order
            ),
            format!(
                r#"CREATE TABLE IF NOT EXISTS "{}" (
                    id UUID PRIMARY KEY,
                    tenant_id UUID NOT NULL,
                    points BIGINT NOT NULL DEFAULT 0
                )"#,
                self.member
            ),
            format!(
                r#"CREATE TABLE IF NOT EXISTS "{}" (
                    id UUID PRIMARY KEY,
                    tenant_id UUID NOT NULL,
                    ip TEXT NOT NULL,
                    data TEXT NOT NULL,
                    status TEXT NOT NULL,
                    created_at BIGINT NOT NULL,
                    expire_time BIGINT NOT NULL
                )"#,
                self.goods_buynowinfo
            ),
        ]
    }
}
