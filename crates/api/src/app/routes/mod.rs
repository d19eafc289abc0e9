use axum::{
    routing::{get, post},
    Router,
};

pub mod purchase_intents;
pub mod system;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/purchase-intents", post(purchase_intents::create_purchase_intent))
        .route("/purchase-intents/:id", get(purchase_intents::get_purchase_intent))
}
