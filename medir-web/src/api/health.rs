//! Liveness and store status

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" when the Entity Store cannot be queried
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub build: &'static str,
    pub database: bool,
    /// Records in the Directory Snapshot; 0 when the file is absent
    pub snapshot_records: usize,
}

/// GET /health
///
/// Public. Answers 503 while the database is unreachable.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => true,
        Err(e) => {
            warn!("Health check: database unavailable: {}", e);
            false
        }
    };
    let snapshot_records = state.snapshot.load().await.doctors_specialties.len();

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if database { "ok" } else { "degraded" },
            module: "medir-web",
            version: env!("CARGO_PKG_VERSION"),
            build: env!("GIT_HASH"),
            database,
            snapshot_records,
        }),
    )
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
