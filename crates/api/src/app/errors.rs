use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use cartline_infra::{ResolveError, StoreError};
use cartline_pricing::{Rejection, RejectionKind};

pub fn rejection_status(kind: RejectionKind) -> StatusCode {
    match kind {
        RejectionKind::NotFound => StatusCode::NOT_FOUND,
        RejectionKind::InvalidRequest | RejectionKind::ConflictingPromotions => StatusCode::BAD_REQUEST,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

pub fn rejection_to_response(rejection: Rejection) -> axum::response::Response {
    json_error(rejection_status(rejection.kind), rejection.code(), rejection.message)
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    // A conflict here is a campaign that kept changing under the seat hold.
    let (status, code) = match err {
        StoreError::Conflict(_) => (StatusCode::CONFLICT, "campaign_busy"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable"),
    };
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": err.to_string(),
            "retryable": err.is_retryable(),
        })),
    )
        .into_response()
}

pub fn resolve_error_to_response(err: ResolveError) -> axum::response::Response {
    match err {
        ResolveError::Rejected(r) => rejection_to_response(r),
        ResolveError::Store(e) => store_error_to_response(e),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
