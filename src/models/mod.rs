use reqwest::Url;
use serde::{Deserialize, Serialize};

pub mod course;
pub mod kakao;
pub mod unsplash;

pub use course::{CategoryQuery, Course, CourseStep};

/// Name shown for candidates the provider returned without one
pub const UNKNOWN_NAME: &str = "unknown";

/// A place or image returned by an external keyword search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Candidate {
    /// Opaque identifier, unique within one search response
    pub id: String,
    pub name: Option<String>,
    /// Canonical external URL (place page, photo page), possibly empty
    pub url: String,
    pub image_url: Option<String>,
    /// 0 when unknown
    pub width: u32,
    /// 0 when unknown
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

/// WGS84 position of a place
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

impl Candidate {
    pub fn new(id: impl Into<String>, name: Option<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name,
            url: url.into(),
            ..Default::default()
        }
    }

    /// Attaches an image, coercing negative dimensions to "unknown"
    pub fn with_image(mut self, image_url: impl Into<String>, width: i64, height: i64) -> Self {
        self.image_url = Some(image_url.into());
        self.width = coerce_dimension(width);
        self.height = coerce_dimension(height);
        self
    }

    /// Name to render; providers sometimes omit it
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(UNKNOWN_NAME)
    }

    /// Host of `image_url`, if it parses
    pub fn source_domain(&self) -> Option<String> {
        let image_url = self.image_url.as_deref()?;
        Url::parse(image_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_lowercase))
    }

    pub fn has_image(&self) -> bool {
        self.image_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

fn coerce_dimension(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
