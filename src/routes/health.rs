use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::upload::QueueCounts;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub queue: QueueHealth,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueueHealth {
    pub worker: String,
    pub in_flight: Option<Uuid>,
    pub counts: QueueCounts,
}

/// GET /health: liveness plus a summary of the in-memory queue.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let in_flight = state.queue.in_flight();
    let counts = state.queue.counts();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        queue: QueueHealth {
            worker: (if in_flight.is_some() { "busy" } else { "idle" }).to_string(),
            in_flight,
            counts,
        },
    })
}
