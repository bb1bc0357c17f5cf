use std::sync::Arc;

use crate::{
    cache::Cache,
    config::{default_course_profile, CategoryProfile, Config},
    error::AppResult,
    services::{
        providers::{ImageSearcher, KakaoProvider, PlaceSearcher, UnsplashProvider},
        AssemblyOptions, ScoringWeights,
    },
};

/// Shared application state
pub struct AppState {
    pub place_searcher: Arc<dyn PlaceSearcher>,
    /// Web images for a place (Kakao)
    pub web_images: Arc<dyn ImageSearcher>,
    /// Stock photos (Unsplash)
    pub stock_photos: Arc<dyn ImageSearcher>,
    pub image_denylist: Vec<String>,
    pub scoring: ScoringWeights,
    pub assembly: AssemblyOptions,
    pub course_profile: Vec<CategoryProfile>,
}

impl AppState {
    /// Wires the real providers from configuration
    pub fn from_config(config: &Config, cache: Cache) -> AppResult<Self> {
        let kakao = Arc::new(KakaoProvider::new(
            cache.clone(),
            config.kakao_rest_api_key.clone(),
            config.kakao_api_url.clone(),
        ));
        let unsplash = Arc::new(UnsplashProvider::new(
            cache,
            config.unsplash_access_key.clone(),
            config.unsplash_api_url.clone(),
        ));

        let course_profile = default_course_profile();
        let assembly = AssemblyOptions::from_config(config, &course_profile)?;

        Ok(Self {
            place_searcher: kakao.clone(),
            web_images: kakao,
            stock_photos: unsplash,
            image_denylist: config.image_domain_denylist.clone(),
            scoring: ScoringWeights::default(),
            assembly,
            course_profile,
        })
    }
}
