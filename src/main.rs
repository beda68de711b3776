use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use stylecast::{
    Geocoder, GeminiStylist, RecommendationService, StylecastConfig, WeatherClient, api, cache,
    weather, web,
};

fn init_tracing(config: &StylecastConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = StylecastConfig::load()?;
    init_tracing(&config);

    weather::validate_metric_table().with_context(|| "Invalid weather metric table")?;

    cache::init(config.cache_path()).with_context(|| "Failed to open response cache")?;

    let geocoder = Geocoder::new(config.geocoding.clone())?;
    let weather_client = WeatherClient::new(config.weather.clone())?;
    let stylist = GeminiStylist::new(config.stylist.clone())?;

    let service = Arc::new(RecommendationService::new(
        Arc::new(geocoder),
        Arc::new(weather_client),
        Arc::new(stylist),
    ));

    web::run(config.server.port, api::router(service)).await
}
