//! End-to-end tests of the recommendation pipeline with mocked collaborators

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;

use stylecast::extract::ModelReply;
use stylecast::models::{Location, WeatherSnapshot};
use stylecast::recommend::{
    CurrentWeatherProvider, PlaceResolver, RecommendationService, StyleAdvisor,
};
use stylecast::{ExtractionError, StylecastError};

fn sao_paulo_snapshot() -> WeatherSnapshot {
    WeatherSnapshot {
        temperature_2m: 25.3,
        apparent_temperature: 26.8,
        relative_humidity_2m: 58.0,
        precipitation: 0.0,
        weather_code: 1.0,
        wind_gusts_10m: 18.4,
        cloud_cover: 20.0,
    }
}

/// Resolver stub counting calls; `None` location means "unknown place"
struct StubResolver {
    location: Option<Location>,
    calls: AtomicUsize,
}

impl StubResolver {
    fn returning(location: Option<Location>) -> Self {
        Self {
            location,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PlaceResolver for StubResolver {
    async fn resolve(&self, _place: &str) -> anyhow::Result<Option<Location>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.location.clone())
    }
}

struct StubWeather {
    snapshot: WeatherSnapshot,
    calls: AtomicUsize,
}

impl StubWeather {
    fn returning(snapshot: WeatherSnapshot) -> Self {
        Self {
            snapshot,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CurrentWeatherProvider for StubWeather {
    async fn fetch_current(&self, _location: &Location) -> anyhow::Result<WeatherSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot.clone())
    }
}

struct StubStylist {
    reply: String,
    calls: AtomicUsize,
}

impl StubStylist {
    fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl StyleAdvisor for StubStylist {
    async fn request(&self, _city: &str, _weather: &WeatherSnapshot) -> anyhow::Result<ModelReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ModelReply::Content(self.reply.clone()))
    }
}

#[tokio::test]
async fn recommendation_for_sao_paulo_keeps_summary_unchanged() {
    let location = Location::with_country(
        -23.5505,
        -46.6333,
        "São Paulo, São Paulo".to_string(),
        "Brazil".to_string(),
    );

    // Sanity: coordinates fall inside Brazil's bounding box
    assert!((-34.0..=5.5).contains(&location.latitude));
    assert!((-74.5..=-32.0).contains(&location.longitude));

    let resolver = Arc::new(StubResolver::returning(Some(location)));
    let weather = Arc::new(StubWeather::returning(sao_paulo_snapshot()));
    // Prose-wrapped JSON, the usual failure mode of "return only the JSON"
    let stylist = Arc::new(StubStylist::replying(
        "Claro! Aqui está a sua recomendação:\n\
         {\"summary\": \"ensolarado\",\n\
          \"clothing\": {\"pieces\": \"camiseta leve e calça jeans\", \"color\": \"branco\"},\n\
          \"activity\": {\"type\": \"Outdoor\", \"details\": \"caminhada no Parque Ibirapuera\"}}\n\
         Espero que ajude!",
    ));

    let service =
        RecommendationService::new(resolver.clone(), weather.clone(), stylist.clone());

    let recommendation = service.recommend("São Paulo").await.unwrap();

    // The extracted summary survives the pipeline unchanged
    assert_eq!(recommendation.style.summary, "ensolarado");
    assert_eq!(recommendation.style.clothing.color, "branco");
    assert_eq!(recommendation.style.activity.kind, "Outdoor");
    assert_eq!(recommendation.raw["summary"], json!("ensolarado"));
    assert_eq!(recommendation.query, "São Paulo");

    assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    assert_eq!(weather.calls.load(Ordering::SeqCst), 1);
    assert_eq!(stylist.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_place_short_circuits_before_weather_and_stylist() {
    let resolver = Arc::new(StubResolver::returning(None));
    let weather = Arc::new(StubWeather::returning(sao_paulo_snapshot()));
    let stylist = Arc::new(StubStylist::replying("{}"));

    let service =
        RecommendationService::new(resolver.clone(), weather.clone(), stylist.clone());

    let err = service.recommend("Cidade Inexistente").await.unwrap_err();
    assert!(matches!(err, StylecastError::PlaceNotFound { .. }));
    assert!(err.user_message().contains("Cidade Inexistente"));

    assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    assert_eq!(stylist.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn resolver_transport_failure_is_a_geocoding_error() {
    struct FailingResolver;

    #[async_trait]
    impl PlaceResolver for FailingResolver {
        async fn resolve(&self, _place: &str) -> anyhow::Result<Option<Location>> {
            Err(anyhow::anyhow!("connection reset"))
        }
    }

    let service = RecommendationService::new(
        Arc::new(FailingResolver),
        Arc::new(StubWeather::returning(sao_paulo_snapshot())),
        Arc::new(StubStylist::replying("{}")),
    );

    let err = service.recommend("São Paulo").await.unwrap_err();
    assert!(matches!(err, StylecastError::Geocoding { .. }));
}

#[tokio::test]
async fn prose_only_reply_fails_extraction() {
    let location = Location::new(-23.5505, -46.6333, "São Paulo".to_string());
    let service = RecommendationService::new(
        Arc::new(StubResolver::returning(Some(location))),
        Arc::new(StubWeather::returning(sao_paulo_snapshot())),
        Arc::new(StubStylist::replying(
            "Sorry, I cannot produce a recommendation right now.",
        )),
    );

    let err = service.recommend("São Paulo").await.unwrap_err();
    match err {
        StylecastError::Extraction(ExtractionError::NoJsonFound { raw }) => {
            assert!(raw.contains("cannot produce"));
        }
        other => panic!("expected NoJsonFound, got {other}"),
    }
}

#[tokio::test]
async fn empty_reply_fails_extraction() {
    let location = Location::new(-23.5505, -46.6333, "São Paulo".to_string());
    let service = RecommendationService::new(
        Arc::new(StubResolver::returning(Some(location))),
        Arc::new(StubWeather::returning(sao_paulo_snapshot())),
        Arc::new(StubStylist::replying("   ")),
    );

    let err = service.recommend("São Paulo").await.unwrap_err();
    assert!(matches!(
        err,
        StylecastError::Extraction(ExtractionError::EmptyReply)
    ));
}
