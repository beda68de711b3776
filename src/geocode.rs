//! Place-name resolution via the Open-Meteo geocoding API
//!
//! A free-text place name goes in; the first/best-ranked candidate comes
//! out. An unknown place is a value (`None`), not an error — only
//! transport and decode failures are errors.

use std::time::Duration;

use anyhow::{Context, Result, ensure};
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::config::GeocodingConfig;
use crate::models::Location;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// HTTP client for the Open-Meteo geocoding API
pub struct Geocoder {
    http: Client,
    config: GeocodingConfig,
}

impl Geocoder {
    /// Create a new geocoding client
    pub fn new(config: GeocodingConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("stylecast/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self { http, config })
    }

    /// All geocoding candidates for a place name, best-ranked first
    #[instrument(skip(self))]
    pub async fn geocode(&self, place: &str) -> Result<Vec<Location>> {
        let url = format!(
            "{}/search?name={}&count={}&language=en&format=json",
            self.config.base_url,
            urlencoding::encode(place),
            self.config.result_count
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| "Geocoding request failed")?;

        let status = response.status();
        ensure!(status.is_success(), "Geocoding API returned HTTP {status}");

        let geocoding: openmeteo::GeocodingResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse Open-Meteo geocoding response")?;

        let locations: Vec<Location> = geocoding
            .results
            .unwrap_or_default()
            .into_iter()
            .map(Location::from)
            .collect();

        if locations.is_empty() {
            warn!("No results found for place '{place}'");
        } else {
            debug!(
                "Geocoding candidates: {:?}",
                locations
                    .iter()
                    .map(|l| format!("{} ({})", l.name, l.format_coordinates()))
                    .collect::<Vec<_>>()
            );
        }

        Ok(locations)
    }

    /// First/best-ranked match for a place name; `None` when unknown
    pub async fn resolve(&self, place: &str) -> Result<Option<Location>> {
        let place = place.trim();
        ensure!(!place.is_empty(), "place name must not be empty");

        let mut results = self.geocode(place).await?;
        if results.is_empty() {
            return Ok(None);
        }

        let best = results.swap_remove(0);
        info!(
            "Resolved '{place}' to {} at ({})",
            best.name,
            best.format_coordinates()
        );
        Ok(Some(best))
    }
}

/// `OpenMeteo` geocoding API response structures
mod openmeteo {
    use crate::models::Location;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct GeocodingResponse {
        pub results: Option<Vec<GeocodingResult>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct GeocodingResult {
        pub name: String,
        pub latitude: f64,
        pub longitude: f64,
        pub country: Option<String>,
        pub admin1: Option<String>,
    }

    impl From<GeocodingResult> for Location {
        fn from(result: GeocodingResult) -> Self {
            let name = match &result.admin1 {
                Some(admin1) if !admin1.is_empty() => format!("{}, {}", result.name, admin1),
                _ => result.name,
            };

            match result.country {
                Some(country) => {
                    Location::with_country(result.latitude, result.longitude, name, country)
                }
                None => Location::new(result.latitude, result.longitude, name),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> Geocoder {
        Geocoder::new(GeocodingConfig {
            base_url: server.uri(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_geocoding_result_to_location() {
        let result = openmeteo::GeocodingResult {
            name: "São Paulo".to_string(),
            latitude: -23.5505,
            longitude: -46.6333,
            country: Some("Brazil".to_string()),
            admin1: Some("São Paulo".to_string()),
        };

        let location = Location::from(result);
        assert_eq!(location.name, "São Paulo, São Paulo");
        assert_eq!(location.latitude, -23.5505);
        assert_eq!(location.longitude, -46.6333);
        assert_eq!(location.country, Some("Brazil".to_string()));
    }

    #[test]
    fn test_geocoding_result_without_admin_area() {
        let result = openmeteo::GeocodingResult {
            name: "Berlin".to_string(),
            latitude: 52.52,
            longitude: 13.41,
            country: None,
            admin1: None,
        };

        let location = Location::from(result);
        assert_eq!(location.name, "Berlin");
        assert_eq!(location.country, None);
    }

    #[tokio::test]
    async fn test_resolve_picks_best_ranked_candidate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("name", "São Paulo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {
                        "name": "São Paulo",
                        "latitude": -23.5505,
                        "longitude": -46.6333,
                        "country": "Brazil",
                        "admin1": "São Paulo"
                    },
                    {
                        "name": "São Paulo de Olivença",
                        "latitude": -3.3783,
                        "longitude": -68.8725,
                        "country": "Brazil",
                        "admin1": "Amazonas"
                    }
                ]
            })))
            .mount(&server)
            .await;

        let resolved = client_for(&server).resolve("São Paulo").await.unwrap();
        let location = resolved.unwrap();
        assert_eq!(location.latitude, -23.5505);
        assert!(location.has_valid_coordinates());
    }

    #[tokio::test]
    async fn test_resolve_unknown_place_is_none() {
        let server = MockServer::start().await;
        // Open-Meteo omits `results` entirely when nothing matches
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"generationtime_ms": 0.5})),
            )
            .mount(&server)
            .await;

        let resolved = client_for(&server).resolve("Nowhereville").await.unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_resolve_provider_error_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).resolve("São Paulo").await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_resolve_rejects_empty_place() {
        let server = MockServer::start().await;
        let err = client_for(&server).resolve("   ").await.unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }
}
