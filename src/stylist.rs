//! Style recommendations from the Gemini generative-language API
//!
//! Builds the weather/style prompt, submits it with a fixed (high)
//! sampling temperature, and hands the raw reply to the extractor. The
//! API credential is part of the client's configuration and its absence
//! is a hard construction error, not a warning.

use std::time::Duration;

use anyhow::{Context, Result, ensure};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::StylecastError;
use crate::config::StylistConfig;
use crate::extract::ModelReply;
use crate::models::{StyleRecommendation, WeatherSnapshot};

/// HTTP client for the Gemini `generateContent` endpoint
#[derive(Debug)]
pub struct GeminiStylist {
    http: Client,
    config: StylistConfig,
    api_key: String,
}

impl GeminiStylist {
    /// Create a new stylist client.
    ///
    /// Fails with a configuration error when no API credential is set, so
    /// a misconfigured deployment dies at startup instead of on the first
    /// request.
    pub fn new(config: StylistConfig) -> Result<Self, StylecastError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            StylecastError::config(
                "Missing stylist API key. Set STYLECAST_STYLIST__API_KEY or stylist.api_key in config.toml.",
            )
        })?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("stylecast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StylecastError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            config,
            api_key,
        })
    }

    /// Ask the model for a style recommendation for the given conditions
    #[instrument(skip(self, weather), fields(model = %self.config.model))]
    pub async fn request(&self, city: &str, weather: &WeatherSnapshot) -> Result<ModelReply> {
        let prompt = build_prompt(city, weather)?;
        debug!("Submitting prompt ({} chars)", prompt.len());

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let request = gemini::GenerateContentRequest::user_text(&prompt, self.config.temperature);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .with_context(|| "Style assistant request failed")?;

        let status = response.status();
        ensure!(status.is_success(), "Stylist API returned HTTP {status}");

        let body: Value = response
            .json()
            .await
            .with_context(|| "Failed to parse stylist response body")?;

        Ok(gemini::reply_from_response(body))
    }
}

/// Render the prompt for a city and its current conditions.
///
/// The expected output shape is spelled out as a skeleton JSON object with
/// empty-string placeholders, rendered from the output type itself so the
/// two can't drift apart.
pub fn build_prompt(city: &str, weather: &WeatherSnapshot) -> Result<String> {
    let weather_json = serde_json::to_string_pretty(weather)
        .with_context(|| "Failed to serialize weather snapshot")?;
    let skeleton = serde_json::to_string_pretty(&StyleRecommendation::default())
        .with_context(|| "Failed to serialize recommendation skeleton")?;

    Ok(format!(
        "Act as a weather and style assistant. Analyze the weather data provided below \
         and generate a JSON object containing a short weather summary, a clothing \
         suggestion (including the pieces and the most appropriate color), and an \
         activity recommendation (specifying whether Outdoor or Indoor is the better \
         choice).\n\n\
         City of {city} ({condition}):\n\n\
         {weather_json}\n\n\
         Return only the JSON, in the following format:\n\n\
         {skeleton}\n",
        condition = weather.description(),
    ))
}

/// Gemini `generateContent` request/response structures
mod gemini {
    use crate::extract::ModelReply;
    use serde::{Deserialize, Serialize};
    use serde_json::Value;

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GenerateContentRequest {
        pub contents: Vec<Content>,
        pub generation_config: GenerationConfig,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Content {
        #[serde(default)]
        pub parts: Vec<Part>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub role: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Part {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub text: Option<String>,
    }

    #[derive(Debug, Serialize)]
    pub struct GenerationConfig {
        pub temperature: f64,
    }

    #[derive(Debug, Deserialize)]
    pub struct GenerateContentResponse {
        #[serde(default)]
        pub candidates: Vec<Candidate>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Candidate {
        pub content: Option<Content>,
    }

    impl GenerateContentRequest {
        /// Single-turn user request with the given sampling temperature
        pub fn user_text(text: &str, temperature: f64) -> Self {
            Self {
                contents: vec![Content {
                    parts: vec![Part {
                        text: Some(text.to_string()),
                    }],
                    role: Some("user".to_string()),
                }],
                generation_config: GenerationConfig { temperature },
            }
        }
    }

    impl GenerateContentResponse {
        /// Concatenated text parts of the primary candidate
        pub fn primary_text(&self) -> Option<String> {
            let content = self.candidates.first()?.content.as_ref()?;
            let text: String = content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect();
            (!text.is_empty()).then_some(text)
        }
    }

    /// Normalize a raw response body into a [`ModelReply`], in fixed
    /// precedence order: candidate content text, then a top-level
    /// `content` entry, then a top-level `text` entry, then the body
    /// itself as a last resort.
    pub fn reply_from_response(body: Value) -> ModelReply {
        if let Ok(parsed) = serde_json::from_value::<GenerateContentResponse>(body.clone()) {
            if let Some(text) = parsed.primary_text() {
                return ModelReply::Content(text);
            }
        }

        match body {
            Value::Object(map) if map.contains_key("content") => ModelReply::Keyed(map),
            Value::Object(map) => match map.get("text") {
                Some(Value::String(text)) => ModelReply::Text(text.clone()),
                _ => ModelReply::Raw(Value::Object(map)),
            },
            other => ModelReply::Raw(other),
        }
    }
}
