mod app;
mod db;
mod handlers;
mod models;
mod service;
mod state;

use std::sync::Arc;

use chrono_tz::Tz;
use tokio::sync::Mutex;
use tokio_postgres::NoTls;
use vitalink_common::{bind_listener, env_or, init_tracing, shutdown_signal};

use crate::state::AppState;

#[tokio::main]
async fn main() {
    let _guards = init_tracing("ingest-service");

    let port = env_or("PORT", 8080u16);
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL is required");
    // The civil time zone for reading timestamps is fixed at startup and
    // never changes for the lifetime of the process.
    let timezone: Tz = std::env::var("INGEST_TZ")
        .unwrap_or_else(|_| "Asia/Karachi".to_string())
        .parse()
        .expect("INGEST_TZ must be a valid IANA time zone name");

    let (db, connection) = tokio_postgres::connect(&database_url, NoTls)
        .await
        .expect("connect db");
    tokio::spawn(async move {
        // Drive the connection in the background.
        if let Err(err) = connection.await {
            tracing::error!(error = %err, "database connection error");
        }
    });

    let state = AppState {
        db: Arc::new(Mutex::new(db)),
        timezone,
    };

    tracing::info!(port, timezone = %timezone, "starting ingest service");

    let app = app::build_router(state);
    let listener = bind_listener(port).await;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("serve");
}
