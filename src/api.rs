//! Web API: the city form and the recommendation result view

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::error;

use crate::StylecastError;
use crate::recommend::{Recommendation, RecommendationService};

pub fn router(service: Arc<RecommendationService>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/recommendation", get(get_recommendation))
        .with_state(service)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../assets/index.html"))
}

#[derive(Deserialize)]
struct CityQuery {
    #[serde(default)]
    city: String,
}

async fn get_recommendation(
    State(service): State<Arc<RecommendationService>>,
    Query(query): Query<CityQuery>,
) -> Response {
    let city = query.city.trim();
    if city.is_empty() {
        return Redirect::to("/").into_response();
    }

    match service.recommend(city).await {
        Ok(recommendation) => Html(render_recommendation(&recommendation)).into_response(),
        Err(err) => err.into_response(),
    }
}

impl IntoResponse for StylecastError {
    fn into_response(self) -> Response {
        let status = match &self {
            StylecastError::PlaceNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Detailed cause stays server-side; the client gets the generic message
        error!("Request failed: {self}");
        (status, self.user_message()).into_response()
    }
}

fn render_recommendation(recommendation: &Recommendation) -> String {
    let weather = &recommendation.weather;
    let style = &recommendation.style;
    let raw_json = serde_json::to_string_pretty(&recommendation.raw)
        .unwrap_or_else(|_| recommendation.raw.to_string());

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Stylecast — {city}</title>
</head>
<body>
  <h1>{city}</h1>
  <p class="resolved">{resolved} ({coords})</p>
  <section class="weather">
    <h2>Current weather</h2>
    <p>{condition}, {temperature:.1} °C (feels like {apparent:.1} °C)</p>
    <p>Humidity {humidity:.0}% · Precipitation {precipitation:.1} mm · Cloud cover {clouds:.0}% · Gusts {gusts:.1} km/h</p>
  </section>
  <section class="style">
    <h2>Summary</h2>
    <p>{summary}</p>
    <h2>What to wear</h2>
    <p>{pieces}</p>
    <p>Best color: {color}</p>
    <h2>What to do</h2>
    <p>{kind}: {details}</p>
  </section>
  <details>
    <summary>Assistant reply</summary>
    <pre>{raw}</pre>
  </details>
  <p><a href="/">Try another city</a></p>
</body>
</html>
"#,
        city = escape_html(&recommendation.query),
        resolved = escape_html(&recommendation.location.name),
        coords = recommendation.location.format_coordinates(),
        condition = weather.description(),
        temperature = weather.temperature_2m,
        apparent = weather.apparent_temperature,
        humidity = weather.relative_humidity_2m,
        precipitation = weather.precipitation,
        clouds = weather.cloud_cover,
        gusts = weather.wind_gusts_10m,
        summary = escape_html(&style.summary),
        pieces = escape_html(&style.clothing.pieces),
        color = escape_html(&style.clothing.color),
        kind = escape_html(&style.activity.kind),
        details = escape_html(&style.activity.details),
        raw = escape_html(&raw_json),
    )
}

/// Minimal HTML entity escaping for untrusted text
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
