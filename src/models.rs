//! Data models shared across the recommendation pipeline

use serde::{Deserialize, Serialize};

/// A resolved place with geographic coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Location name (city, region, etc.)
    pub name: String,
    /// Country name or code, when the geocoder provides one
    pub country: Option<String>,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, name: String) -> Self {
        Self {
            latitude,
            longitude,
            name,
            country: None,
        }
    }

    /// Create location with country
    #[must_use]
    pub fn with_country(latitude: f64, longitude: f64, name: String, country: String) -> Self {
        Self {
            latitude,
            longitude,
            name,
            country: Some(country),
        }
    }

    /// True when both coordinates are finite and within valid ranges
    #[must_use]
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }
}

/// Current-condition metrics consumed by the recommendation prompt.
///
/// The field names match the Open-Meteo variable names on purpose: the
/// serialized form of this struct is embedded verbatim in the prompt and
/// mirrored back by the assistant.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    /// Air temperature at 2m, in °C
    pub temperature_2m: f64,
    /// Perceived temperature, in °C
    pub apparent_temperature: f64,
    /// Relative humidity at 2m, in %
    pub relative_humidity_2m: f64,
    /// Precipitation in the current interval, in mm
    pub precipitation: f64,
    /// WMO weather interpretation code
    pub weather_code: f64,
    /// Wind gusts at 10m, in km/h
    pub wind_gusts_10m: f64,
    /// Cloud cover, in %
    pub cloud_cover: f64,
}

impl WeatherSnapshot {
    /// Human-readable description of the WMO weather code
    #[must_use]
    pub fn description(&self) -> &'static str {
        crate::weather::weather_code_to_description(self.weather_code as u8)
    }
}

/// Target shape of the assistant's reply.
///
/// `Default` doubles as the skeleton embedded in the prompt: every leaf is
/// an empty string placeholder the model is asked to fill in. Missing or
/// extra fields in the actual reply are tolerated (`serde(default)`), so
/// schema conformance stays advisory.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StyleRecommendation {
    /// One-line weather summary
    pub summary: String,
    /// What to wear
    pub clothing: ClothingSuggestion,
    /// What to do
    pub activity: ActivityRecommendation,
}

/// Clothing part of a [`StyleRecommendation`]
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ClothingSuggestion {
    /// Suggested pieces, free text
    pub pieces: String,
    /// Most appropriate color
    pub color: String,
}

/// Activity part of a [`StyleRecommendation`]
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ActivityRecommendation {
    /// Outdoor or indoor
    #[serde(rename = "type")]
    pub kind: String,
    /// Free-text details
    pub details: String,
}

impl StyleRecommendation {
    /// Lenient projection of an arbitrary JSON value onto the target shape.
    ///
    /// Never fails: non-conforming values fall back to empty placeholders,
    /// matching the advisory schema policy of the extractor.
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_location_coordinate_validation() {
        let ok = Location::new(-23.5505, -46.6333, "São Paulo".to_string());
        assert!(ok.has_valid_coordinates());

        let bad_lat = Location::new(91.0, 0.0, "nowhere".to_string());
        assert!(!bad_lat.has_valid_coordinates());

        let bad_lon = Location::new(0.0, -181.0, "nowhere".to_string());
        assert!(!bad_lon.has_valid_coordinates());

        let nan = Location::new(f64::NAN, 0.0, "nowhere".to_string());
        assert!(!nan.has_valid_coordinates());
    }

    #[test]
    fn test_rounded_coordinates() {
        let location = Location::new(-23.55052, -46.63331, "São Paulo".to_string());
        let (lat, lon) = location.rounded_coordinates(2);
        assert_eq!(lat, -23.55);
        assert_eq!(lon, -46.63);
    }

    #[test]
    fn test_skeleton_has_empty_string_placeholders() {
        let skeleton = serde_json::to_value(StyleRecommendation::default()).unwrap();
        assert_eq!(
            skeleton,
            json!({
                "summary": "",
                "clothing": { "pieces": "", "color": "" },
                "activity": { "type": "", "details": "" }
            })
        );
    }

    #[test]
    fn test_recommendation_round_trip() {
        let recommendation = StyleRecommendation {
            summary: "Sunny and mild".to_string(),
            clothing: ClothingSuggestion {
                pieces: "t-shirt, light jacket".to_string(),
                color: "light blue".to_string(),
            },
            activity: ActivityRecommendation {
                kind: "Outdoor".to_string(),
                details: "A walk in Ibirapuera park".to_string(),
            },
        };

        let value = serde_json::to_value(&recommendation).unwrap();
        assert_eq!(StyleRecommendation::from_value(&value), recommendation);
    }

    #[test]
    fn test_projection_tolerates_non_conforming_values() {
        let projected = StyleRecommendation::from_value(&json!({"a": 1}));
        assert_eq!(projected, StyleRecommendation::default());

        let partial = StyleRecommendation::from_value(&json!({"summary": "rainy"}));
        assert_eq!(partial.summary, "rainy");
        assert_eq!(partial.clothing.pieces, "");
    }
}
