//! Recommendation pipeline orchestration
//!
//! Runs the four stages in order: resolve the place, fetch current
//! weather, ask the style assistant, extract the structured reply. Each
//! stage blocks on the previous one and the first failure short-circuits
//! the request; there is no orchestration-level retry.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::error::StylecastError;
use crate::extract::{self, ModelReply};
use crate::geocode::Geocoder;
use crate::models::{Location, StyleRecommendation, WeatherSnapshot};
use crate::stylist::GeminiStylist;
use crate::weather::WeatherClient;

/// Resolves a free-text place name to coordinates
#[async_trait]
pub trait PlaceResolver: Send + Sync {
    /// First/best-ranked match; `None` when the place is unknown
    async fn resolve(&self, place: &str) -> anyhow::Result<Option<Location>>;
}

/// Supplies current conditions for a resolved location
#[async_trait]
pub trait CurrentWeatherProvider: Send + Sync {
    async fn fetch_current(&self, location: &Location) -> anyhow::Result<WeatherSnapshot>;
}

/// Produces a raw model reply for a place and its conditions
#[async_trait]
pub trait StyleAdvisor: Send + Sync {
    async fn request(&self, city: &str, weather: &WeatherSnapshot) -> anyhow::Result<ModelReply>;
}

#[async_trait]
impl PlaceResolver for Geocoder {
    async fn resolve(&self, place: &str) -> anyhow::Result<Option<Location>> {
        Geocoder::resolve(self, place).await
    }
}

#[async_trait]
impl CurrentWeatherProvider for WeatherClient {
    async fn fetch_current(&self, location: &Location) -> anyhow::Result<WeatherSnapshot> {
        WeatherClient::fetch_current(self, location).await
    }
}

#[async_trait]
impl StyleAdvisor for GeminiStylist {
    async fn request(&self, city: &str, weather: &WeatherSnapshot) -> anyhow::Result<ModelReply> {
        GeminiStylist::request(self, city, weather).await
    }
}

/// Everything the result view needs for one request
#[derive(Debug, Clone)]
pub struct Recommendation {
    /// The place name as the user typed it
    pub query: String,
    /// Resolved location
    pub location: Location,
    /// Current conditions the recommendation is based on
    pub weather: WeatherSnapshot,
    /// JSON recovered from the model reply, verbatim
    pub raw: Value,
    /// Lenient typed projection of `raw`
    pub style: StyleRecommendation,
}

/// Sequential pipeline over the three outbound collaborators
pub struct RecommendationService {
    resolver: Arc<dyn PlaceResolver>,
    weather: Arc<dyn CurrentWeatherProvider>,
    stylist: Arc<dyn StyleAdvisor>,
}

impl RecommendationService {
    pub fn new(
        resolver: Arc<dyn PlaceResolver>,
        weather: Arc<dyn CurrentWeatherProvider>,
        stylist: Arc<dyn StyleAdvisor>,
    ) -> Self {
        Self {
            resolver,
            weather,
            stylist,
        }
    }

    /// Produce a style recommendation for a free-text place name
    #[instrument(skip(self))]
    pub async fn recommend(&self, place: &str) -> crate::Result<Recommendation> {
        let location = self
            .resolver
            .resolve(place)
            .await
            .map_err(StylecastError::geocoding)?;

        let Some(location) = location else {
            info!("No coordinates found for '{place}'");
            return Err(StylecastError::place_not_found(place));
        };

        let weather = self
            .weather
            .fetch_current(&location)
            .await
            .map_err(StylecastError::weather)?;

        let reply = self
            .stylist
            .request(place, &weather)
            .await
            .map_err(StylecastError::stylist)?;

        let raw = extract::extract(reply).inspect_err(|e| {
            // Raw model text goes to the server log only
            match e.raw_reply() {
                Some(raw_text) => error!("Unusable assistant reply: {raw_text}"),
                None => error!("Assistant returned an empty reply"),
            }
        })?;

        info!("Parsed assistant reply: {raw}");

        let style = StyleRecommendation::from_value(&raw);
        Ok(Recommendation {
            query: place.to_string(),
            location,
            weather,
            raw,
            style,
        })
    }
}
