//! `cartline-infra`: stores, configuration and the async resolution
//! pipeline around the pure pricing rules.
//!
//! Store traits have an in-memory backend for tests and a Postgres backend for
//! deployment. Purchase intents can also live in Redis (`redis` feature).

pub mod campaign_gate;
pub mod catalog_store;
pub mod config;
pub mod error;
pub mod intent_store;
pub mod points;
pub mod recorder;
pub mod resolver;
pub mod service;

pub use campaign_gate::CampaignGate;
pub use config::{AppConfig, ConfigError, Environment, StoreConfig};
pub use error::{ResolveError, StoreError};
pub use recorder::PurchaseIntentRecorder;
pub use resolver::PricingResolver;
pub use service::{PurchaseOutcome, PurchaseService};
