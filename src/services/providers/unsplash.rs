/// Unsplash stock photo provider
///
/// Used as an image source when a place has no usable web image of its own.
/// Searches are restricted to landscape photos, which is what course cards show.
use crate::{
    cache::{Cache, CacheKey},
    cached,
    error::AppResult,
    models::{unsplash::UnsplashSearchResponse, Candidate},
    services::providers::{check_status, require_api_key, require_keyword, ImageSearcher},
};
use reqwest::Client as HttpClient;

const IMAGE_CACHE_TTL: u64 = 604800; // 1 week
const PER_PAGE: u32 = 20;

const PROVIDER: &str = "unsplash";

#[derive(Clone)]
pub struct UnsplashProvider {
    http_client: HttpClient,
    access_key: Option<String>,
    api_url: String,
    cache: Cache,
}

impl UnsplashProvider {
    pub fn new(cache: Cache, access_key: Option<String>, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            access_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    async fn fetch_photos(&self, keyword: &str) -> AppResult<Vec<Candidate>> {
        let access_key = require_api_key(&self.access_key, "UNSPLASH_ACCESS_KEY")?;
        let url = format!("{}/search/photos", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Client-ID {}", access_key))
            .header("Accept-Version", "v1")
            .query(&[
                ("query", keyword.to_string()),
                ("per_page", PER_PAGE.to_string()),
                ("orientation", "landscape".to_string()),
            ])
            .send()
            .await?;
        let response = check_status(PROVIDER, response).await?;

        let body: UnsplashSearchResponse = response.json().await?;
        let photos: Vec<Candidate> = body.results.into_iter().map(Candidate::from).collect();

        tracing::info!(
            keyword = %keyword,
            total = body.total,
            results = photos.len(),
            provider = PROVIDER,
            "Photo search completed"
        );

        Ok(photos)
    }
}

#[async_trait::async_trait]
impl ImageSearcher for UnsplashProvider {
    async fn search_images(&self, keyword: &str) -> AppResult<Vec<Candidate>> {
        let keyword = require_keyword(keyword)?;

        cached!(
            self.cache,
            CacheKey::ImageSearch {
                provider: PROVIDER,
                query: keyword.to_string(),
            },
            IMAGE_CACHE_TTL,
            self.fetch_photos(keyword)
        )
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
