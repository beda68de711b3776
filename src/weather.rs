//! Current-weather retrieval from the Open-Meteo forecast API
//!
//! Responses are served from the persistent response cache inside a
//! freshness window, with retry-with-backoff on transient transport
//! failures. The set of `current` variables requested from the provider is
//! positional: [`CONSUMED_METRICS`] pins which index of the request list
//! feeds which snapshot field, and the table is validated once at startup.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, ensure};
use chrono::NaiveDateTime;
use rand::RngExt;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::cache;
use crate::config::WeatherConfig;
use crate::models::{Location, WeatherSnapshot};

/// Ordered `current` variable list sent to the forecast endpoint.
///
/// Positions are load-bearing: [`CONSUMED_METRICS`] refers into this list
/// by index, mirroring the provider's positional variable layout.
pub const CURRENT_VARIABLES: [&str; 15] = [
    "temperature_2m",
    "relative_humidity_2m",
    "apparent_temperature",
    "is_day",
    "precipitation",
    "rain",
    "showers",
    "snowfall",
    "weather_code",
    "cloud_cover",
    "pressure_msl",
    "surface_pressure",
    "wind_speed_10m",
    "wind_direction_10m",
    "wind_gusts_10m",
];

/// Index → metric name for the requested variables the pipeline consumes.
///
/// Must stay bijective and consistent with [`CURRENT_VARIABLES`];
/// [`validate_metric_table`] enforces that at startup.
pub const CONSUMED_METRICS: [(usize, &str); 7] = [
    (0, "temperature_2m"),
    (1, "relative_humidity_2m"),
    (2, "apparent_temperature"),
    (4, "precipitation"),
    (8, "weather_code"),
    (9, "cloud_cover"),
    (14, "wind_gusts_10m"),
];

/// Check the index → metric mapping against the request list: every index
/// in range, no index claimed twice, and the metric name at each index
/// matching the variable actually requested at that position.
pub fn validate_metric_table() -> Result<()> {
    validate_entries(&CONSUMED_METRICS)
}

fn validate_entries(entries: &[(usize, &str)]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for (index, name) in entries {
        let requested = CURRENT_VARIABLES
            .get(*index)
            .ok_or_else(|| anyhow!("metric index {index} is out of range of the request list"))?;
        ensure!(
            requested == name,
            "metric index {index} maps to \"{name}\" but position {index} of the request list is \"{requested}\""
        );
        ensure!(
            seen.insert(*index),
            "metric index {index} is mapped to more than one name"
        );
    }
    Ok(())
}

/// Look up the consumed metric registered at `index` in the provider's
/// `current` block.
fn consumed_metric(current: &serde_json::Map<String, Value>, index: usize) -> Result<f64> {
    let (_, name) = CONSUMED_METRICS
        .iter()
        .find(|(idx, _)| *idx == index)
        .ok_or_else(|| anyhow!("no consumed metric registered at index {index}"))?;

    current
        .get(*name)
        .and_then(Value::as_f64)
        .ok_or_else(|| anyhow!("missing or non-numeric metric \"{name}\" in provider response"))
}

fn snapshot_from_current(current: &serde_json::Map<String, Value>) -> Result<WeatherSnapshot> {
    Ok(WeatherSnapshot {
        temperature_2m: consumed_metric(current, 0)?,
        relative_humidity_2m: consumed_metric(current, 1)?,
        apparent_temperature: consumed_metric(current, 2)?,
        precipitation: consumed_metric(current, 4)?,
        weather_code: consumed_metric(current, 8)?,
        cloud_cover: consumed_metric(current, 9)?,
        wind_gusts_10m: consumed_metric(current, 14)?,
    })
}

/// HTTP client for the Open-Meteo forecast API
pub struct WeatherClient {
    http: ClientWithMiddleware,
    config: WeatherConfig,
}

impl WeatherClient {
    /// Create a new weather client with retry-with-backoff middleware
    pub fn new(config: WeatherConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("stylecast/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let http = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { http, config })
    }

    /// Current conditions for a location, cached within the freshness window
    #[instrument(skip(self, location), fields(lat = location.latitude, lon = location.longitude))]
    pub async fn fetch_current(&self, location: &Location) -> Result<WeatherSnapshot> {
        ensure!(
            location.has_valid_coordinates(),
            "refusing to fetch weather for invalid coordinates {}",
            location.format_coordinates()
        );

        let (lat, lon) = location.rounded_coordinates(2);
        let key = format!("current:{lat:.2}:{lon:.2}");

        if let Some(cached) = cache::get::<WeatherSnapshot>(&key).await? {
            debug!("Serving current weather from cache");
            return Ok(cached);
        }

        let snapshot = self.fetch_current_call(location).await?;

        // Jitter spreads refreshes of popular places across the window
        let jitter: f32 = rand::rng().random_range(0.9..1.1);
        let ttl = Duration::from_secs((self.config.cache_ttl_seconds as f32 * jitter) as u64);
        cache::put(&key, snapshot.clone(), ttl).await?;

        Ok(snapshot)
    }

    async fn fetch_current_call(&self, location: &Location) -> Result<WeatherSnapshot> {
        debug!("Calling the forecast API");
        let url = format!(
            "{}/forecast?latitude={}&longitude={}&current={}&timezone=auto",
            self.config.base_url,
            location.latitude,
            location.longitude,
            CURRENT_VARIABLES.join(",")
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| "Weather request failed")?;

        let status = response.status();
        ensure!(status.is_success(), "Weather API returned HTTP {status}");

        let forecast: openmeteo::ForecastResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse Open-Meteo forecast response")?;

        let current = forecast
            .current
            .ok_or_else(|| anyhow!("No current weather block in provider response"))?;

        if let Some(observed) = current
            .get("time")
            .and_then(Value::as_str)
            .and_then(|t| NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M").ok())
        {
            debug!("Conditions observed at {observed} local time");
        }

        let snapshot = snapshot_from_current(&current)?;
        info!(
            "Current weather for {}: {} ({:.1} °C)",
            location.name,
            snapshot.description(),
            snapshot.temperature_2m
        );
        Ok(snapshot)
    }
}

/// Convert an Open-Meteo weather code to a human-readable description
#[must_use]
pub fn weather_code_to_description(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

/// `OpenMeteo` API response structures
mod openmeteo {
    use serde::Deserialize;
    use serde_json::Value;

    /// Forecast response; only the `current` block is consumed, kept as a
    /// raw map so extraction goes through the validated metric table.
    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        #[allow(dead_code)]
        pub latitude: f64,
        #[allow(dead_code)]
        pub longitude: f64,
        pub current: Option<serde_json::Map<String, Value>>,
    }
}
