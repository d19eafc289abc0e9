use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use cartline_core::IntentId;
use cartline_pricing::PurchaseRequest;

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::{MemberContext, TenantContext};
use crate::middleware::client_ip;

pub async fn create_purchase_intent(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(member): Extension<MemberContext>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<dto::CreatePurchaseIntentRequest>,
) -> axum::response::Response {
    let parsed = match body.parse() {
        Ok(p) => p,
        Err(r) => return errors::rejection_to_response(r),
    };

    let request = match PurchaseRequest::new(
        tenant.tenant_id(),
        member.member_id(),
        client_ip(&headers, peer.map(|ConnectInfo(addr)| addr)),
        parsed.product_id,
        parsed.quantity,
        parsed.selector,
        parsed.promotion,
    ) {
        Ok(r) => r,
        Err(r) => return errors::rejection_to_response(r),
    };

    match services.purchases.resolve_purchase(&request).await {
        Ok(outcome) => (
            StatusCode::CREATED,
            Json(dto::PurchaseIntentCreated {
                intent_id: outcome.intent_id,
                line: outcome.line,
            }),
        )
            .into_response(),
        Err(e) => errors::resolve_error_to_response(e),
    }
}

pub async fn get_purchase_intent(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let Ok(id) = id.parse::<IntentId>() else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_request", "invalid intent id");
    };

    match services.purchases.fetch_intent(tenant.tenant_id(), id).await {
        Ok(Some((record, line))) => (
            StatusCode::OK,
            Json(serde_json::json!({ "intent": dto::PurchaseIntentView::new(record, line) })),
        )
            .into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "purchase intent not found"),
        Err(e) => errors::resolve_error_to_response(e),
    }
}
