use std::sync::Arc;

use sqlx::{PgPool, Row};
use tracing::instrument;

use cartline_core::{IntentId, TenantId};

use super::{IntentStatus, PurchaseIntentRecord, PurchaseIntentStore};
use crate::catalog_store::schema::TableNames;
use crate::config::StoreConfig;
use crate::error::{StoreError, map_sqlx_error};

/// Intents stored in the `goods_buynowinfo` table.
#[derive(Debug, Clone)]
pub struct PostgresIntentStore {
    pool: Arc<PgPool>,
    insert_sql: Arc<str>,
    select_sql: Arc<str>,
}

impl PostgresIntentStore {
    pub fn new(pool: PgPool, config: &StoreConfig) -> Self {
        let table = TableNames::new(config).goods_buynowinfo;
        let insert_sql = format!(
            r#"INSERT INTO "{table}" (id, tenant_id, ip, data, status, created_at, expire_time)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#
        );
        let select_sql = format!(
            r#"SELECT id, tenant_id, ip, data, status, created_at, expire_time
               FROM "{table}" WHERE tenant_id = $1 AND id = $2"#
        );
        Self {
            pool: Arc::new(pool),
            insert_sql: insert_sql.into(),
            select_sql: select_sql.into(),
        }
    }
}

#[async_trait::async_trait]
impl PurchaseIntentStore for PostgresIntentStore {
    #[instrument(skip(self, record), fields(intent_id = %record.id, tenant_id = %record.tenant_id), err)]
    async fn create(&self, record: PurchaseIntentRecord) -> Result<IntentId, StoreError> {
        sqlx::query(&self.insert_sql)
            .bind(*record.id.as_uuid())
            .bind(*record.tenant_id.as_uuid())
            .bind(&record.client_ip)
            .bind(&record.data)
            .bind(record.status.as_str())
            .bind(record.created_at)
            .bind(record.expires_at)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_intent", e))?;
        Ok(record.id)
    }

    #[instrument(skip(self), err)]
    async fn get(
        &self,
        tenant_id: TenantId,
        id: IntentId,
    ) -> Result<Option<PurchaseIntentRecord>, StoreError> {
        let row = sqlx::query(&self.select_sql)
            .bind(*tenant_id.as_uuid())
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_intent", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let decode = |e: sqlx::Error| StoreError::Serialization(format!("failed to decode intent row: {e}"));
        let status: String = row.try_get("status").map_err(decode)?;
        Ok(Some(PurchaseIntentRecord {
            id: IntentId::from_uuid(row.try_get("id").map_err(decode)?),
            tenant_id: TenantId::from_uuid(row.try_get("tenant_id").map_err(decode)?),
            client_ip: row.try_get("ip").map_err(decode)?,
            data: row.try_get("data").map_err(decode)?,
            status: IntentStatus::parse(&status)?,
            created_at: row.try_get("created_at").map_err(decode)?,
            expires_at: row.try_get("expire_time").map_err(decode)?,
        }))
    }
}
