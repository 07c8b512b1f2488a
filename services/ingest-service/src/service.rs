use axum::http::StatusCode;
use chrono::Utc;
use std::collections::HashMap;

use crate::db::ReadingStore;
use crate::models::{decode_form, ReadingBatch};
use crate::state::AppState;

const NO_READINGS_MESSAGE: &str = "No recognized sensor values found.";

pub struct ServiceError {
    pub status: StatusCode,
    pub message: String,
}

impl ServiceError {
    pub fn new(status: StatusCode, message: String) -> Self {
        Self { status, message }
    }
}

/// Handle one upload: decode the body, validate identifiers, then insert one
/// row per present reading category.
pub async fn store_readings(state: &AppState, body: &[u8]) -> Result<String, ServiceError> {
    let params = decode_form(body);
    let recorded_at = Utc::now()
        .with_timezone(&state.timezone)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    if let Some(message) = missing_identifiers(&params) {
        return Err(ServiceError::new(StatusCode::BAD_REQUEST, message));
    }

    let batch = ReadingBatch::from_params(&params, recorded_at);

    let stored = {
        let db = state.db.lock().await;
        run_inserts(&*db, &batch).await.map_err(storage_error)?
    };

    tracing::info!(
        profile_id = batch.profile_id,
        sensor_id = batch.sensor_id,
        stored = stored.len(),
        "upload handled"
    );

    Ok(render_response(&stored))
}

/// Fixed-order fan-out over the reading categories. Each category inserts
/// independently and without a transaction; a failure stops the remaining
/// categories while rows already written stay committed.
async fn run_inserts<S: ReadingStore>(
    store: &S,
    batch: &ReadingBatch,
) -> Result<Vec<&'static str>, S::Error> {
    let mut stored = Vec::new();

    if let Some(temperature) = batch.temperature {
        store.insert_temperature(batch, temperature).await?;
        stored.push("Temperature stored");
    }

    if let Some(pulse) = &batch.pulse_oximetry {
        store.insert_pulse_oximetry(batch, pulse).await?;
        stored.push("PulOxym stored");
    }

    if let Some(value) = batch.ecg {
        store.insert_ecg(batch, value).await?;
        stored.push("ECG stored");
    }

    Ok(stored)
}

/// Presence check for the two required identifiers. Values are not
/// inspected here; even an empty string counts as present.
fn missing_identifiers(params: &HashMap<String, String>) -> Option<String> {
    match (params.contains_key("P"), params.contains_key("S")) {
        (true, true) => None,
        (false, true) => Some("Missing Profile ID.".to_string()),
        (true, false) => Some("Missing Sensor ID.".to_string()),
        (false, false) => Some("Missing Profile ID and Sensor ID.".to_string()),
    }
}

fn render_response(stored: &[&str]) -> String {
    if stored.is_empty() {
        NO_READINGS_MESSAGE.to_string()
    } else {
        stored.join(" | ")
    }
}

fn storage_error(err: impl std::fmt::Display) -> ServiceError {
    tracing::error!(error = %err, "reading insert failed");
    ServiceError::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Database error: {err}"),
    )
}
