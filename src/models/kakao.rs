//! Kakao Local / Kakao image search response types

use serde::Deserialize;

use super::{Candidate, Coordinates};

/// Envelope shared by every Kakao search endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct KakaoResponse<T> {
    #[serde(default)]
    pub meta: Option<KakaoMeta>,
    #[serde(default = "Vec::new")]
    pub documents: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KakaoMeta {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub is_end: bool,
}

/// Result of `/v2/local/search/keyword.json`
#[derive(Debug, Clone, Deserialize)]
pub struct KakaoPlace {
    pub id: String,
    #[serde(default)]
    pub place_name: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub address_name: Option<String>,
    #[serde(default)]
    pub road_address_name: Option<String>,
    /// Longitude, as a decimal string
    #[serde(default)]
    pub x: Option<String>,
    /// Latitude, as a decimal string
    #[serde(default)]
    pub y: Option<String>,
    #[serde(default)]
    pub place_url: Option<String>,
}

impl From<KakaoPlace> for Candidate {
    fn from(place: KakaoPlace) -> Self {
        let coordinates = match (
            place.x.as_deref().and_then(|x| x.parse::<f64>().ok()),
            place.y.as_deref().and_then(|y| y.parse::<f64>().ok()),
        ) {
            (Some(lon), Some(lat)) => Some(Coordinates { lon, lat }),
            _ => None,
        };

        // Road address reads better; lot-number address is the fallback
        let address = place
            .road_address_name
            .filter(|a| !a.is_empty())
            .or(place.address_name.filter(|a| !a.is_empty()));

        Candidate {
            id: place.id,
            name: place.place_name.filter(|n| !n.is_empty()),
            url: place.place_url.unwrap_or_default(),
            image_url: None,
            width: 0,
            height: 0,
            address,
            category_name: place.category_name.filter(|c| !c.is_empty()),
            coordinates,
        }
    }
}

/// Result of `/v2/search/image`
#[derive(Debug, Clone, Deserialize)]
pub struct KakaoImage {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub height: i64,
    #[serde(default)]
    pub display_sitename: Option<String>,
    #[serde(default)]
    pub doc_url: Option<String>,
}

impl KakaoImage {
    /// Image documents carry no identifier; their position in the response is used.
    pub fn into_candidate(self, index: usize) -> Candidate {
        let mut candidate = Candidate::new(
            index.to_string(),
            self.display_sitename.filter(|s| !s.is_empty()),
            self.doc_url.unwrap_or_default(),
        );
        if let Some(image_url) = self.image_url.filter(|u| !u.is_empty()) {
            candidate = candidate.with_image(image_url, self.width, self.height);
        }
        candidate
    }
}
