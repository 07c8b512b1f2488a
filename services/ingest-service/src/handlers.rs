use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse};

use crate::db;
use crate::service;
use crate::state::AppState;

pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

pub async fn readyz(State(state): State<AppState>) -> StatusCode {
    let db = state.db.lock().await;
    match db::ping(&*db).await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            tracing::warn!(error = %err, "readiness probe failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// POST /v1/readings — the upload endpoint. Responses are plain text; the
/// sensor firmware on the other end only understands simple status lines.
pub async fn upload_readings(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    match service::store_readings(&state, &body).await {
        Ok(message) => (StatusCode::OK, message).into_response(),
        Err(err) => (err.status, err.message).into_response(),
    }
}
