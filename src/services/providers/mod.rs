/// External search providers
///
/// Places and images come from third-party keyword searches (Kakao Local, Kakao
/// image search, Unsplash). Each provider normalizes its results into
/// [`Candidate`]s so the ranking and assembly code never sees a vendor format.
use crate::{
    error::{AppError, AppResult},
    models::Candidate,
};

pub mod kakao;
pub mod unsplash;

pub use kakao::KakaoProvider;
pub use unsplash::UnsplashProvider;

/// Keyword place search
///
/// Implementations resolve to an empty list when nothing matched. Errors are
/// reserved for failures; only [`AppError::Configuration`] is treated as fatal
/// by course assembly, anything else costs just the category that hit it.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlaceSearcher: Send + Sync {
    /// Places matching `keyword`, most relevant first
    async fn search_places(&self, keyword: &str) -> AppResult<Vec<Candidate>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Keyword image search
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ImageSearcher: Send + Sync {
    /// Images matching `keyword`, in provider order
    async fn search_images(&self, keyword: &str) -> AppResult<Vec<Candidate>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Rejects blank keywords before any request is made
fn require_keyword(keyword: &str) -> AppResult<&str> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(AppError::InvalidInput(
            "Search keyword cannot be empty".to_string(),
        ));
    }
    Ok(keyword)
}

/// Returns the configured key, or a fatal configuration error naming `variable`
fn require_api_key<'a>(key: &'a Option<String>, variable: &str) -> AppResult<&'a str> {
    key.as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| AppError::Configuration(format!("{} is not set", variable)))
}

/// Maps a non-success response to [`AppError::ExternalApi`]
async fn check_status(provider: &str, response: reqwest::Response) -> AppResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::error!(
        provider = provider,
        status = %status,
        body = %body,
        "External search request failed"
    );
    Err(AppError::ExternalApi(format!(
        "{} API returned status {}: {}",
        provider, status, body
    )))
}
