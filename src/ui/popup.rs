//! Popup content for transgression markers

use crate::core::constants::PLACEHOLDER_IMAGE;
use crate::data::geojson::Feature;
use maud::{html, Markup};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left untouched by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Image URL for a photo id, or the placeholder when either the photo host
/// or the id is missing.
pub fn photo_url(photos_url: Option<&str>, photo_id: Option<&str>) -> String {
    match (photos_url, photo_id) {
        (Some(base), Some(id)) if !base.is_empty() && !id.is_empty() => format!(
            "{}/{}.jpg",
            base.trim_end_matches('/'),
            utf8_percent_encode(id, URI_COMPONENT)
        ),
        _ => PLACEHOLDER_IMAGE.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupContent {
    pub image_url: String,
    pub description: String,
}

impl PopupContent {
    pub fn new(image_url: String, description: String) -> Self {
        Self {
            image_url,
            description,
        }
    }

    /// Popup for a feature, resolving its photo against `photos_url`
    pub fn for_feature(feature: &Feature, photos_url: Option<&str>) -> Self {
        let photo_id = feature.photo_id();
        Self::new(
            photo_url(photos_url, photo_id.as_deref()),
            feature.description().to_string(),
        )
    }

    pub fn to_html(&self) -> String {
        self.markup().into_string()
    }

    /// Image above the description; maud escapes both
    pub fn markup(&self) -> Markup {
        html! {
            section {
                img src=(self.image_url)
                    alt="Image"
                    style="max-width:200px; display:block; margin-bottom:8px;";
                p { (self.description) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;

    #[test]
    fn test_photo_url_encoding() {
        assert_eq!(
            photo_url(Some("https://photos.example"), Some("abc 1/2")),
            "https://photos.example/abc%201%2F2.jpg"
        );
        assert_eq!(
            photo_url(Some("https://photos.example/"), Some("it's-(ok)")),
            "https://photos.example/it's-(ok).jpg"
        );
    }

    #[test]
    fn test_placeholder_fallbacks() {
        assert_eq!(photo_url(None, Some("abc")), PLACEHOLDER_IMAGE);
        assert_eq!(photo_url(Some("https://photos.example"), None), PLACEHOLDER_IMAGE);
        assert_eq!(photo_url(Some(""), Some("abc")), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_popup_for_feature() {
        let feature = Feature::point(LatLng::new(40.0, -74.0), Some("Car in bus lane"), Some("p1"));
        let popup = PopupContent::for_feature(&feature, Some("https://photos.example"));

        assert_eq!(popup.image_url, "https://photos.example/p1.jpg");
        let html = popup.to_html();
        assert!(html.starts_with("<section>"));
        assert!(html.contains("src=\"https://photos.example/p1.jpg\""));
        assert!(html.contains("<p>Car in bus lane</p>"));
    }

    #[test]
    fn test_description_is_escaped() {
        let popup = PopupContent::new(PLACEHOLDER_IMAGE.to_string(), "<b>\"x\" & y</b>".to_string());
        assert!(popup.to_html().contains("<p>&lt;b&gt;&quot;x&quot; &amp; y&lt;/b&gt;</p>"));
    }

    #[test]
    fn test_image_url_is_escaped() {
        let popup = PopupContent::new("/a\"><script>".to_string(), String::new());
        let html = popup.to_html();
        assert!(html.contains("src=\"/a&quot;&gt;&lt;script&gt;\""));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_missing_description_renders_empty() {
        let feature = Feature::default();
        let popup = PopupContent::for_feature(&feature, None);
        assert_eq!(popup.description, "");
        assert!(popup.to_html().contains("<p></p>"));
    }
}
