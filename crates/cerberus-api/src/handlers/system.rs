//! Health check.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{ok, ApiResponse, AppState};
use cerberus_db::log_pool_metrics;

/// Report service health and connection pool usage.
#[utoipa::path(get, path = "/health", tag = "System",
    responses((status = 200, description = "Service is up")))]
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    log_pool_metrics(&state.db.pool);
    ok(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "pool_size": state.db.pool.size(),
        "pool_idle": state.db.pool.num_idle(),
    }))
}
