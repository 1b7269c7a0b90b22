//! Contact form endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use chrono::Utc;
use formguard_common::{FormState, InteractionBatch};
use serde::Serialize;

use super::{ApiError, client_id};
use crate::session::FormSession;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SessionResponse {
    id: String,
    question: String,
}

impl From<FormSession> for SessionResponse {
    fn from(session: FormSession) -> Self {
        Self {
            id: session.id,
            question: session.challenge.question,
        }
    }
}

/// Start a new form session (page load)
pub async fn open_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let session = state.sessions.open(Utc::now()).await;
    Json(session.into())
}

/// Current question for a session
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.sessions.get(&id).await?;
    Ok(Json(session.into()))
}

/// Record a batch of keystrokes, mouse moves and field focus events
pub async fn record_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(batch): Json<InteractionBatch>,
) -> Result<StatusCode, ApiError> {
    state.sessions.record(&id, &batch, Utc::now()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    status: &'static str,
    attempt_count: u32,
    /// Question for the next message
    question: String,
}

/// Submit the contact form
pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(form): Json<FormState>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let client_id = client_id(&headers, &id);

    let receipt = state
        .contact
        .submit(&id, &client_id, &form, Utc::now())
        .await?;

    let session = state.sessions.get(&id).await?;

    Ok(Json(SubmitResponse {
        status: "sent",
        attempt_count: receipt.attempt_count,
        question: session.challenge.question,
    }))
}
