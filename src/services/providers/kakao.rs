/// Kakao search provider
///
/// One REST key covers both endpoints used here:
/// 1. Place search: /v2/local/search/keyword.json → places with a place page URL
/// 2. Image search: /v2/search/image → web images with their pixel dimensions
///
/// Every request sends `Authorization: KakaoAK {key}`.
use crate::{
    cache::{Cache, CacheKey},
    cached,
    error::AppResult,
    models::{
        kakao::{KakaoImage, KakaoPlace, KakaoResponse},
        Candidate,
    },
    services::providers::{
        check_status, require_api_key, require_keyword, ImageSearcher, PlaceSearcher,
    },
};
use reqwest::Client as HttpClient;

const PLACE_CACHE_TTL: u64 = 21600; // 6 hours
const IMAGE_CACHE_TTL: u64 = 86400; // 1 day

/// Kakao caps keyword search pages at 15 documents
const PLACE_PAGE_SIZE: u32 = 15;
const IMAGE_PAGE_SIZE: u32 = 30;

const PROVIDER: &str = "kakao";

#[derive(Clone)]
pub struct KakaoProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    cache: Cache,
}

impl KakaoProvider {
    pub fn new(cache: Cache, api_key: Option<String>, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    fn authorization(&self) -> AppResult<String> {
        let key = require_api_key(&self.api_key, "KAKAO_REST_API_KEY")?;
        Ok(format!("KakaoAK {}", key))
    }

    async fn fetch_places(&self, keyword: &str) -> AppResult<Vec<Candidate>> {
        let authorization = self.authorization()?;
        let url = format!("{}/v2/local/search/keyword.json", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", authorization)
            .query(&[
                ("query", keyword.to_string()),
                ("size", PLACE_PAGE_SIZE.to_string()),
            ])
            .send()
            .await?;
        let response = check_status(PROVIDER, response).await?;

        let body: KakaoResponse<KakaoPlace> = response.json().await?;
        let places: Vec<Candidate> = body.documents.into_iter().map(Candidate::from).collect();

        tracing::info!(
            keyword = %keyword,
            results = places.len(),
            provider = PROVIDER,
            "Place search completed"
        );

        Ok(places)
    }

    async fn fetch_images(&self, keyword: &str) -> AppResult<Vec<Candidate>> {
        let authorization = self.authorization()?;
        let url = format!("{}/v2/search/image", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", authorization)
            .query(&[
                ("query", keyword.to_string()),
                ("sort", "accuracy".to_string()),
                ("size", IMAGE_PAGE_SIZE.to_string()),
            ])
            .send()
            .await?;
        let response = check_status(PROVIDER, response).await?;

        let body: KakaoResponse<KakaoImage> = response.json().await?;
        let images: Vec<Candidate> = body
            .documents
            .into_iter()
            .enumerate()
            .map(|(index, image)| image.into_candidate(index))
            .collect();

        tracing::info!(
            keyword = %keyword,
            results = images.len(),
            provider = PROVIDER,
            "Image search completed"
        );

        Ok(images)
    }
}

#[async_trait::async_trait]
impl PlaceSearcher for KakaoProvider {
    async fn search_places(&self, keyword: &str) -> AppResult<Vec<Candidate>> {
        let keyword = require_keyword(keyword)?;

        cached!(
            self.cache,
            CacheKey::PlaceSearch(keyword.to_string()),
            PLACE_CACHE_TTL,
            self.fetch_places(keyword)
        )
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

#[async_trait::async_trait]
impl ImageSearcher for KakaoProvider {
    async fn search_images(&self, keyword: &str) -> AppResult<Vec<Candidate>> {
        let keyword = require_keyword(keyword)?;

        cached!(
            self.cache,
            CacheKey::ImageSearch {
                provider: PROVIDER,
                query: keyword.to_string(),
            },
            IMAGE_CACHE_TTL,
            self.fetch_images(keyword)
        )
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
