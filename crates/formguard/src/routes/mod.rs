//! HTTP route handlers for FormGuard.

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use formguard_common::constants::headers::X_CLIENT_ID;
use formguard_common::{FieldErrors, GuardError};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

mod contact;
mod debug;
mod health;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(health::health_check))

        // Contact form
        .route("/session", post(contact::open_session))
        .route("/session/{id}", get(contact::get_session))
        .route("/session/{id}/events", post(contact::record_events))
        .route("/session/{id}/submit", post(contact::submit))

        // Debug panel (404 unless enabled)
        .route("/debug/session/{id}", get(debug::session_counters))

        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())

        // Add shared state
        .with_state(state)
}

/// Client identity for submission history: the `X-Client-Id` header, or
/// the session id when the header is missing or empty
pub(crate) fn client_id(headers: &HeaderMap, session_id: &str) -> String {
    headers
        .get(X_CLIENT_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(session_id)
        .to_string()
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<FieldErrors>,
    retryable: bool,
}

/// Guard errors rendered as JSON with the matching status code
pub struct ApiError(GuardError);

impl From<GuardError> for ApiError {
    fn from(err: GuardError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: self.0.user_message(),
            fields: self.0.field_errors().cloned(),
            retryable: self.0.is_retryable(),
        };
        (status, Json(body)).into_response()
    }
}
