//! `stylecast` - weather-aware outfit and activity recommendations
//!
//! This library wires a four-stage pipeline behind one web endpoint:
//! geocode a city name, fetch its current weather, ask a language model
//! for a styled JSON recommendation, and recover that JSON from the reply.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod geocode;
pub mod models;
pub mod recommend;
pub mod stylist;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use config::StylecastConfig;
pub use error::StylecastError;
pub use extract::{ExtractionError, ModelReply};
pub use geocode::Geocoder;
pub use models::{Location, StyleRecommendation, WeatherSnapshot};
pub use recommend::{Recommendation, RecommendationService};
pub use stylist::GeminiStylist;
pub use weather::WeatherClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, StylecastError>;
