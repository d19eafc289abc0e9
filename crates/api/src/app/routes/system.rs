use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::context::{MemberContext, TenantContext};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(tenant): Extension<TenantContext>,
    Extension(member): Extension<MemberContext>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "tenant_id": tenant.tenant_id().to_string(),
        "member_id": member.member_id().map(|m| m.to_string()),
    }))
}
