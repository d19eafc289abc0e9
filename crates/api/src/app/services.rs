//! Store wiring for the HTTP layer.
//!
//! `DATABASE_URL` selects Postgres for the catalogue, points and intents;
//! without it everything is in memory. With the `redis` feature and
//! `REDIS_URL` set, intents go to Redis instead of Postgres.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use cartline_core::{Clock, SystemClock};
use cartline_infra::catalog_store::{CatalogStore, InMemoryCatalogStore, PostgresCatalogStore};
use cartline_infra::intent_store::{InMemoryIntentStore, PostgresIntentStore, PurchaseIntentStore};
use cartline_infra::points::{InMemoryPointsLedger, PointsLedger, PostgresPointsLedger};
use cartline_infra::{
    AppConfig, PricingResolver, PurchaseIntentRecorder, PurchaseService, StoreConfig, StoreError,
};

pub type DynPurchaseService =
    PurchaseService<Arc<dyn CatalogStore>, Arc<dyn PointsLedger>, Arc<dyn PurchaseIntentStore>>;

pub struct AppServices {
    pub purchases: DynPurchaseService,
    pub backend: &'static str,
}

/// Direct handles on the in-memory stores, for seeding.
#[derive(Clone)]
pub struct InMemoryBackends {
    pub catalog: Arc<InMemoryCatalogStore>,
    pub points: Arc<InMemoryPointsLedger>,
    pub intents: Arc<InMemoryIntentStore>,
}

#[derive(Debug, Error)]
pub enum ServicesError {
    #[error("cannot connect to postgres: {0}")]
    Connect(#[from] sqlx::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn wire(
    catalog: Arc<dyn CatalogStore>,
    points: Arc<dyn PointsLedger>,
    intents: Arc<dyn PurchaseIntentStore>,
    intent_ttl_secs: u64,
    clock: Arc<dyn Clock>,
    backend: &'static str,
) -> AppServices {
    AppServices {
        purchases: PurchaseService::new(
            PricingResolver::new(catalog, points, clock.clone()).with_seat_hold(intent_ttl_secs),
            PurchaseIntentRecorder::new(intents, intent_ttl_secs, clock),
        ),
        backend,
    }
}

pub fn build_in_memory_services(
    intent_ttl_secs: u64,
    clock: Arc<dyn Clock>,
) -> (AppServices, InMemoryBackends) {
    let backends = InMemoryBackends {
        catalog: Arc::new(InMemoryCatalogStore::new()),
        points: Arc::new(InMemoryPointsLedger::new()),
        intents: Arc::new(InMemoryIntentStore::new()),
    };
    let services = wire(
        backends.catalog.clone(),
        backends.points.clone(),
        backends.intents.clone(),
        intent_ttl_secs,
        clock,
        "in_memory",
    );
    (services, backends)
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, ServicesError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; using in-memory stores");
        let (services, _) = build_in_memory_services(config.intent_ttl_secs, clock);
        return Ok(services);
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    let catalog = PostgresCatalogStore::new(pool.clone(), &config.store);
    catalog.ensure_schema().await?;
    let points = PostgresPointsLedger::new(pool.clone(), &config.store);
    let intents = intent_store(pool, config.redis_url.as_deref(), &config.store)?;

    tracing::info!(table_prefix = %config.store.table_prefix, "using postgres stores");
    Ok(wire(
        Arc::new(catalog),
        Arc::new(points),
        intents,
        config.intent_ttl_secs,
        clock,
        "postgres",
    ))
}

#[cfg(feature = "redis")]
fn intent_store(
    pool: sqlx::PgPool,
    redis_url: Option<&str>,
    store: &StoreConfig,
) -> Result<Arc<dyn PurchaseIntentStore>, ServicesError> {
    match redis_url {
        Some(url) => {
            tracing::info!("purchase intents stored in redis");
            Ok(Arc::new(cartline_infra::intent_store::RedisIntentStore::new(url, store)?))
        }
        None => Ok(Arc::new(PostgresIntentStore::new(pool, store))),
    }
}

#[cfg(not(feature = "redis"))]
fn intent_store(
    pool: sqlx::PgPool,
    redis_url: Option<&str>,
    store: &StoreConfig,
) -> Result<Arc<dyn PurchaseIntentStore>, ServicesError> {
    if redis_url.is_some() {
        tracing::warn!("REDIS_URL set but redis feature not enabled; intents stored in postgres");
    }
    Ok(Arc::new(PostgresIntentStore::new(pool, store)))
}
