use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Redis connection URL. Caching is disabled when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Kakao REST API key, used for both local (place) and image search
    #[serde(default)]
    pub kakao_rest_api_key: Option<String>,

    /// Kakao API base URL
    #[serde(default = "default_kakao_api_url")]
    pub kakao_api_url: String,

    /// Unsplash access key
    #[serde(default)]
    pub unsplash_access_key: Option<String>,

    /// Unsplash API base URL
    #[serde(default = "default_unsplash_api_url")]
    pub unsplash_api_url: String,

    /// Number of leading search results a course step is sampled from
    #[serde(default = "default_course_top_n")]
    pub course_top_n: usize,

    /// Per-category search time bound, in milliseconds
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,

    /// Substrings of image URLs that should not be picked as a representative
    /// image (comma separated in the environment)
    #[serde(default = "default_image_domain_denylist")]
    pub image_domain_denylist: Vec<String>,

    /// Places whose name matches this pattern never end up in a course
    #[serde(default = "default_deny_name_pattern")]
    pub deny_name_pattern: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_kakao_api_url() -> String {
    "https://dapi.kakao.com".to_string()
}

fn default_unsplash_api_url() -> String {
    "https://api.unsplash.com".to_string()
}

fn default_course_top_n() -> usize {
    5
}

fn default_search_timeout_ms() -> u64 {
    5000
}

fn default_image_domain_denylist() -> Vec<String> {
    vec![
        "blogthumb".to_string(),
        "postfiles".to_string(),
        "cafeptthumb".to_string(),
        "tistory.com".to_string(),
        "youtube.com".to_string(),
        "ytimg.com".to_string(),
    ]
}

fn default_deny_name_pattern() -> String {
    "스터디|독서실|학원|공부|study".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}

/// One category of an automatic course: the keyword suffix appended to the
/// region, and optional name filters applied to its search results.
#[derive(Debug, Clone)]
pub struct CategoryProfile {
    pub category: String,
    pub keyword_suffix: String,
    pub include_pattern: Option<String>,
    pub exclude_pattern: Option<String>,
}

impl CategoryProfile {
    fn new(category: &str, keyword_suffix: &str) -> Self {
        Self {
            category: category.to_string(),
            keyword_suffix: keyword_suffix.to_string(),
            include_pattern: None,
            exclude_pattern: None,
        }
    }

    fn include(mut self, pattern: &str) -> Self {
        self.include_pattern = Some(pattern.to_string());
        self
    }

    fn exclude(mut self, pattern: &str) -> Self {
        self.exclude_pattern = Some(pattern.to_string());
        self
    }
}

/// Cafe, then food, then an activity.
pub fn default_course_profile() -> Vec<CategoryProfile> {
    vec![
        CategoryProfile::new("cafe", "카페")
            .include("카페|커피|디저트|베이커리|(?i)coffee|(?i)cafe"),
        CategoryProfile::new("food", "맛집").exclude("카페|커피|디저트|베이커리|(?i)cafe"),
        CategoryProfile::new("activity", "데이트 코스"),
    ]
}
