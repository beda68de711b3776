//! Error types and handling for the `stylecast` application

use thiserror::Error;

use crate::extract::ExtractionError;

/// Main error type for the `stylecast` application
#[derive(Error, Debug)]
pub enum StylecastError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The geocoder returned no match for the requested place
    #[error("No coordinates found for \"{query}\"")]
    PlaceNotFound { query: String },

    /// The geocoding provider could not be reached or returned garbage
    #[error("Geocoding failed: {source}")]
    Geocoding { source: anyhow::Error },

    /// The weather provider could not be reached or returned garbage
    #[error("Weather lookup failed: {source}")]
    Weather { source: anyhow::Error },

    /// The language-model provider could not be reached
    #[error("Style assistant request failed: {source}")]
    Stylist { source: anyhow::Error },

    /// The assistant's reply did not contain usable JSON
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl StylecastError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new place-not-found error
    pub fn place_not_found<S: Into<String>>(query: S) -> Self {
        Self::PlaceNotFound {
            query: query.into(),
        }
    }

    /// Wrap a geocoding provider failure
    pub fn geocoding(source: anyhow::Error) -> Self {
        Self::Geocoding { source }
    }

    /// Wrap a weather provider failure
    pub fn weather(source: anyhow::Error) -> Self {
        Self::Weather { source }
    }

    /// Wrap a language-model provider failure
    pub fn stylist(source: anyhow::Error) -> Self {
        Self::Stylist { source }
    }

    /// Get a user-friendly error message.
    ///
    /// Provider failures deliberately stay generic; the detailed cause is
    /// logged server-side only.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            StylecastError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            StylecastError::PlaceNotFound { query } => {
                format!("No coordinates found for \"{query}\".")
            }
            StylecastError::Geocoding { .. } => {
                "Unable to resolve the requested place. Please try again later.".to_string()
            }
            StylecastError::Weather { .. } => {
                "Unable to retrieve weather data. Please try again later.".to_string()
            }
            StylecastError::Stylist { .. } => {
                "Unable to reach the style assistant. Please try again later.".to_string()
            }
            StylecastError::Extraction(_) => {
                "The style assistant returned an unusable reply. Please try again.".to_string()
            }
        }
    }
}
