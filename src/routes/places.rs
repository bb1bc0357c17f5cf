use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult, middleware::request_id::RequestId, models::Candidate, routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
}

/// Handler for place search endpoint
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Candidate>>> {
    tracing::info!(request_id = %request_id, keyword = %params.q, "Place search");

    let places = state.place_searcher.search_places(&params.q).await?;
    Ok(Json(places))
}
