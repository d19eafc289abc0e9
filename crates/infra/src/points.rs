//! Member points balances.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use sqlx::{PgPool, Row};
use tracing::instrument;

use cartline_core::{MemberId, TenantId};

use crate::catalog_store::schema::TableNames;
use crate::config::StoreConfig;
use crate::error::{StoreError, map_sqlx_error};

/// Read access to a member's spendable points.
#[async_trait::async_trait]
pub trait PointsLedger: Send + Sync {
    /// `None` when the member is unknown to the tenant.
    async fn balance(&self, tenant_id: TenantId, member_id: MemberId) -> Result<Option<i64>, StoreError>;
}

#[async_trait::async_trait]
impl<S> PointsLedger for Arc<S>
where
    S: PointsLedger + ?Sized,
{
    async fn balance(&self, tenant_id: TenantId, member_id: MemberId) -> Result<Option<i64>, StoreError> {
        (**self).balance(tenant_id, member_id).await
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPointsLedger {
    balances: RwLock<HashMap<(TenantId, MemberId), i64>>,
}

impl InMemoryPointsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, tenant_id: TenantId, member_id: MemberId, points: i64) {
        let mut balances = match self.balances.write() {
            Ok(b) => b,
            Err(poisoned) => poisoned.into_inner(),
        };
        balances.insert((tenant_id, member_id), points);
    }
}

#[async_trait::async_trait]
impl PointsLedger for InMemoryPointsLedger {
    async fn balance(&self, tenant_id: TenantId, member_id: MemberId) -> Result<Option<i64>, StoreError> {
        let balances = self
            .balances
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(balances.get(&(tenant_id, member_id)).copied())
    }
}

/// Balances read from the member table.
#[derive(Debug, Clone)]
pub struct PostgresPointsLedger {
    pool: Arc<PgPool>,
    sql: Arc<str>,
}

impl PostgresPointsLedger {
    pub fn new(pool: PgPool, config: &StoreConfig) -> Self {
        let tables = TableNames::new(config);
        let sql = format!(
            r#"SELECT points FROM "{}" WHERE tenant_id = $1 AND id = $2"#,
            tables.member
        );
        Self {
            pool: Arc::new(pool),
            sql: sql.into(),
        }
    }
}

#[async_trait::async_trait]
impl PointsLedger for PostgresPointsLedger {
    #[instrument(skip(self), err)]
    async fn balance(&self, tenant_id: TenantId, member_id: MemberId) -> Result<Option<i64>, StoreError> {
        let row = sqlx::query(&self.sql)
            .bind(*tenant_id.as_uuid())
            .bind(*member_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("points_balance", e))?;
        row.map(|r| r.try_get::<i64, _>("points"))
            .transpose()
            .map_err(|e| StoreError::Serialization(format!("failed to decode points: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn balances_are_tenant_scoped() {
        let ledger = InMemoryPointsLedger::new();
        let tenant_id = TenantId::new();
        let member_id = MemberId::new();
        ledger.set_balance(tenant_id, member_id, 120);
        assert_eq!(ledger.balance(tenant_id, member_id).await.unwrap(), Some(120));
        assert_eq!(ledger.balance(TenantId::new(), member_id).await.unwrap(), None);
    }
}
