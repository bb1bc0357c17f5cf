use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::Candidate,
    routes::AppState,
    services::{providers::ImageSearcher, ranking::rank_image_candidates},
};

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    #[default]
    Kakao,
    Unsplash,
}

#[derive(Debug, Deserialize)]
pub struct BestImageQuery {
    q: String,
    #[serde(default)]
    source: ImageSource,
}

#[derive(Debug, Serialize)]
pub struct BestImageResponse {
    pub source: ImageSource,
    /// `null` when the search returned no usable image
    pub candidate: Option<Candidate>,
    /// Image-bearing results the pick was made from
    pub considered: usize,
}

impl AppState {
    pub fn image_searcher(&self, source: ImageSource) -> &Arc<dyn ImageSearcher> {
        match source {
            ImageSource::Kakao => &self.web_images,
            ImageSource::Unsplash => &self.stock_photos,
        }
    }
}

/// Handler for best image endpoint
pub async fn best(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<BestImageQuery>,
) -> AppResult<Json<BestImageResponse>> {
    let images = state
        .image_searcher(params.source)
        .search_images(&params.q)
        .await?;

    let ranked = rank_image_candidates(&images, &state.image_denylist, &state.scoring);
    let candidate = ranked.first().map(|best| best.candidate.clone());

    tracing::info!(
        request_id = %request_id,
        keyword = %params.q,
        source = ?params.source,
        results = images.len(),
        considered = ranked.len(),
        found = candidate.is_some(),
        "Best image lookup"
    );

    Ok(Json(BestImageResponse {
        source: params.source,
        candidate,
        considered: ranked.len(),
    }))
}
