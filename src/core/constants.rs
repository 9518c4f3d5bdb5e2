//! Core constants for the transgression map view.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Fallback map center as `(longitude, latitude)` when no location fix is available.
pub const FALLBACK_CENTER: (f64, f64) = (-74.0242, 40.6941);

/// Zoom level the map is created with.
pub const INITIAL_ZOOM: f64 = 11.12;

/// Media type used for both `Content-Type` and `Accept` on dataset requests.
pub const GEOJSON_MEDIA_TYPE: &str = "application/geo+json";

/// Image shown in popups when a feature has no photo or no photo host is configured.
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.jpg";

/// Marker pin color.
pub const MARKER_COLOR: &str = "black";

/// Marker pin rotation in degrees.
pub const MARKER_ROTATION: f64 = 45.0;

/// Source id of the location indicator overlay.
pub const LOCATION_SOURCE_ID: &str = "center";

/// Inner orb of the location indicator: layer id, radius in pixels, color.
pub const LOCATION_ORB: (&str, f64, &str) = ("locationOrb", 8.0, "#ff0000");

/// Halo around the location indicator: layer id, radius in pixels, color, opacity.
pub const LOCATION_HALO: (&str, f64, &str, f64) = ("locationOrbOutline", 12.0, "#ffffff", 0.5);
