//! Sales ingestion and query endpoints
//!
//! - POST /post_sales/ accepts a JSON array of weekly records
//! - GET /get_raw_sales/ returns bronze rows as submitted
//! - GET /get_monthly_sales/ returns gold rows, optionally without outliers

use axum::{
    body::Bytes,
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use vegsales_common::models::{MonthlySale, RawSale};

use crate::api::database::StatusResponse;
use crate::{AppState, ApiError, ApiResult};

/// Query parameters for GET /get_monthly_sales/
#[derive(Debug, Default, Deserialize)]
pub struct MonthlySalesQuery {
    /// Case-insensitive "true" drops outliers; anything else keeps them
    pub remove_outliers: Option<String>,
}

impl MonthlySalesQuery {
    pub fn exclude_outliers(&self) -> bool {
        self.remove_outliers
            .as_deref()
            .map(|value| value.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }
}

/// POST /post_sales/
///
/// The body is decoded here rather than with the `Json` extractor so malformed JSON gets the
/// same `{"error": ...}` response as every other rejection.
pub async fn post_sales(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<StatusResponse>> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Malformed JSON body: {}", e)))?;

    let summary = state.pipeline.ingest_json(&payload).await?;
    debug!("post_sales summary: {:?}", summary);

    Ok(Json(StatusResponse {
        status: "success".to_string(),
    }))
}

/// GET /get_raw_sales/
pub async fn get_raw_sales(State(state): State<AppState>) -> ApiResult<Json<Vec<RawSale>>> {
    Ok(Json(state.pipeline.raw_sales().await?))
}

/// GET /get_monthly_sales/?remove_outliers=true
pub async fn get_monthly_sales(
    State(state): State<AppState>,
    Query(query): Query<MonthlySalesQuery>,
) -> ApiResult<Json<Vec<MonthlySale>>> {
    Ok(Json(state.pipeline.monthly_sales(query.exclude_outliers()).await?))
}

pub fn sales_routes() -> Router<AppState> {
    Router::new()
        .route("/post_sales/", post(post_sales))
        .route("/get_raw_sales/", get(get_raw_sales))
        .route("/get_monthly_sales/", get(get_monthly_sales))
}
