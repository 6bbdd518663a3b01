use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::warn;

use crate::AppState;

/// Query parameters for `/graph-data`.
///
/// Absent values default to the store's overall range; malformed values are
/// rejected with 400 by the extractor before this handler runs. The two
/// cases are deliberately distinct: missing means "give me everything",
/// invalid means the caller made a mistake.
#[derive(Deserialize)]
pub struct GraphDataQuery {
    start_time: Option<i64>,
    end_time: Option<i64>,
}

pub async fn graph_data(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GraphDataQuery>,
) -> impl IntoResponse {
    let range = match state.reader.overall_range().await {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "Failed to resolve overall range");
            return store_error(StatusCode::SERVICE_UNAVAILABLE);
        }
    };

    let start = params.start_time.unwrap_or(range.min_ts);
    let end = params.end_time.unwrap_or(range.max_ts);

    match state.reader.windowed_view(start, end).await {
        Ok(view) => Json(serde_json::json!({
            "nodes": view.nodes,
            "links": view.edges,
            "min_timestamp": range.min_ts,
            "max_timestamp": range.max_ts,
        }))
        .into_response(),
        Err(e) => {
            warn!(error = %e, start, end, "Failed to load windowed view");
            store_error(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Store failures answer with an explicit error body so callers can tell
/// "no data in range" apart from "could not reach the store".
fn store_error(status: StatusCode) -> axum::response::Response {
    (
        status,
        Json(serde_json::json!({
            "error": "failed to retrieve graph data from the store"
        })),
    )
        .into_response()
}
