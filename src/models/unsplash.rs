//! Unsplash photo search response types

use serde::Deserialize;

use super::Candidate;

#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashSearchResponse {
    #[serde(default)]
    pub total: u64,
    #[serde(default = "Vec::new")]
    pub results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashPhoto {
    pub id: String,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub height: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub alt_description: Option<String>,
    pub urls: UnsplashUrls,
    #[serde(default)]
    pub links: Option<UnsplashLinks>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashUrls {
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub full: Option<String>,
    #[serde(default)]
    pub regular: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashLinks {
    #[serde(default)]
    pub html: Option<String>,
}

impl From<UnsplashPhoto> for Candidate {
    fn from(photo: UnsplashPhoto) -> Self {
        let name = photo
            .description
            .filter(|d| !d.is_empty())
            .or(photo.alt_description)
            .filter(|d| !d.is_empty());
        let url = photo.links.and_then(|l| l.html).unwrap_or_default();
        let candidate = Candidate::new(photo.id, name, url);

        // `regular` is a 1080px-wide rendition; width/height describe the original,
        // which is what `full` serves
        match photo.urls.full.or(photo.urls.regular).or(photo.urls.raw) {
            Some(image_url) => candidate.with_image(image_url, photo.width, photo.height),
            None => candidate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_to_candidate() {
        let json = r#"{
            "total": 1,
            "total_pages": 1,
            "results": [{
                "id": "Dwu85P9SOIk",
                "width": 4000,
                "height": 2250,
                "description": null,
                "alt_description": "couple walking by the river",
                "urls": {
                    "raw": "https://images.unsplash.com/photo-1?ixid=raw",
                    "full": "https://images.unsplash.com/photo-1?ixid=full",
                    "regular": "https://images.unsplash.com/photo-1?w=1080"
                },
                "links": {"html": "https://unsplash.com/photos/Dwu85P9SOIk"}
            }]
        }"#;

        let response: UnsplashSearchResponse = serde_json::from_str(json).unwrap();
        let candidate: Candidate = response.results.into_iter().next().unwrap().into();

        assert_eq!(candidate.id, "Dwu85P9SOIk");
        assert_eq!(candidate.display_name(), "couple walking by the river");
        assert_eq!(candidate.url, "https://unsplash.com/photos/Dwu85P9SOIk");
        assert_eq!(
            candidate.image_url.as_deref(),
            Some("https://images.unsplash.com/photo-1?ixid=full")
        );
        assert_eq!((candidate.width, candidate.height), (4000, 2250));
    }

    #[test]
    fn test_empty_description_falls_back_to_alt_description() {
        let json = r#"{
            "id": "hX3mZ2",
            "width": 3000,
            "height": 2000,
            "description": "",
            "alt_description": "cafe terrace at night",
            "urls": {"regular": "https://images.unsplash.com/photo-2?w=1080"}
        }"#;

        let photo: UnsplashPhoto = serde_json::from_str(json).unwrap();
        let candidate = Candidate::from(photo);

        assert_eq!(candidate.name.as_deref(), Some("cafe terrace at night"));
    }
}
