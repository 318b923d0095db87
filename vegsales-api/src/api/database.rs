//! Database lifecycle endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;

use crate::{AppState, ApiResult};

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// POST /init_database
///
/// Empties bronze, silver and gold. Safe to call repeatedly.
pub async fn init_database(State(state): State<AppState>) -> ApiResult<Json<StatusResponse>> {
    state.pipeline.reset().await?;

    Ok(Json(StatusResponse {
        status: "Database initialized".to_string(),
    }))
}

pub fn database_routes() -> Router<AppState> {
    Router::new().route("/init_database", post(init_database))
}
