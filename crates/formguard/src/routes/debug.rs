//! Debug panel exposing internal counters. Only mounted in debug mode.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use formguard_common::{InteractionLog, SubmissionHistory};
use serde::Serialize;

use super::{ApiError, client_id};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugResponse {
    session_id: String,
    elapsed_secs: i64,
    in_flight: bool,
    interactions: InteractionLog,
    history: SubmissionHistory,
}

pub async fn session_counters(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if !state.config.debug {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }

    let session = state.sessions.get(&id).await?;
    let history = state
        .contact
        .history()
        .load(&client_id(&headers, &id))
        .await?;

    Ok(Json(DebugResponse {
        elapsed_secs: (Utc::now() - session.started_at).num_seconds(),
        session_id: session.id,
        in_flight: session.in_flight,
        interactions: session.interactions,
        history,
    })
    .into_response())
}
