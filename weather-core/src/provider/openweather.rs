use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    Config, WeatherObservation,
    config::DEFAULT_BASE_URL,
    error::{ConfigError, FetchError},
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    /// Point the client at another host, e.g. a proxy or a mock server.
    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Rejects a missing or blank key up front rather than per request.
    pub fn try_new(
        api_key: Option<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Self::with_base_url(api_key, base_url))
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::try_new(config.resolved_api_key(), config.base_url.as_str())
    }

    async fn request_current(&self, city: &str) -> Result<WeatherObservation, FetchError> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        tracing::debug!(%url, city, "requesting current weather");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: OwCurrentResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))?;

        let description = parsed
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .ok_or_else(|| FetchError::Malformed("no weather description".to_string()))?;

        Ok(WeatherObservation {
            city: parsed.name,
            temperature: parsed.main.temp,
            feels_like: parsed.main.feels_like,
            humidity: parsed.main.humidity,
            description,
            timestamp: WeatherObservation::now(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: i64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_current(&self, city: &str) -> Result<WeatherObservation, FetchError> {
        let result = self.request_current(city).await;
        if let Err(e) = &result {
            tracing::warn!(city, error = %e, "error fetching weather");
        }
        result
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn london_body() -> serde_json::Value {
        serde_json::json!({
            "coord": { "lon": -0.1257, "lat": 51.5085 },
            "weather": [
                { "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d" }
            ],
            "main": {
                "temp": 11.4,
                "feels_like": 10.7,
                "temp_min": 10.1,
                "temp_max": 12.3,
                "pressure": 1012,
                "humidity": 81
            },
            "dt": 1_700_000_000,
            "name": "London",
            "cod": 200
        })
    }

    #[tokio::test]
    async fn maps_current_weather_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "london"))
            .and(query_param("appid", "KEY"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(london_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), mock_server.uri());
        let before = WeatherObservation::now();
        let obs = provider.fetch_current("london").await.unwrap();

        assert_eq!(obs.city, "London");
        assert_eq!(obs.temperature, 11.4);
        assert_eq!(obs.feels_like, 10.7);
        assert_eq!(obs.humidity, 81);
        assert_eq!(obs.description, "broken clouds");
        // Stamped locally, not from the payload's `dt`.
        assert!(obs.timestamp >= before);
    }

    #[tokio::test]
    async fn city_is_sent_verbatim() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", " New York "))
            .respond_with(ResponseTemplate::new(200).set_body_json(london_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), mock_server.uri());
        assert!(provider.fetch_current(" New York ").await.is_ok());
    }

    #[tokio::test]
    async fn unknown_city_is_absent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "cod": "404",
                "message": "city not found"
            })))
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), mock_server.uri());
        let err = provider.fetch_current("InvalidCityNameXYZ123").await.unwrap_err();

        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status.as_u16(), 404);
                assert!(body.contains("city not found"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_fields_are_absent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "London",
                "weather": [{ "description": "mist" }]
            })))
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), mock_server.uri());
        let err = provider.fetch_current("London").await.unwrap_err();

        assert!(matches!(err, FetchError::Malformed(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn empty_weather_array_is_absent() {
        let mock_server = MockServer::start().await;

        let mut body = london_body();
        body["weather"] = serde_json::json!([]);

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), mock_server.uri());
        let err = provider.fetch_current("London").await.unwrap_err();

        assert!(err.to_string().contains("no weather description"));
    }

    #[tokio::test]
    async fn connection_refused_is_absent() {
        // Nothing listens on port 1.
        let provider = OpenWeatherProvider::with_base_url("KEY".into(), "http://127.0.0.1:1");
        let err = provider.fetch_current("London").await.unwrap_err();

        assert!(matches!(err, FetchError::Transport(_)), "got {err:?}");
    }

    #[test]
    fn missing_api_key_fails_at_construction() {
        let err = OpenWeatherProvider::try_new(None, DEFAULT_BASE_URL).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));

        let err = OpenWeatherProvider::try_new(Some("   ".into()), DEFAULT_BASE_URL).unwrap_err();
        assert!(err.to_string().contains("WEATHER_API_KEY"));
    }

    #[test]
    fn trailing_slash_in_base_url_is_dropped() {
        let provider = OpenWeatherProvider::with_base_url("KEY".into(), "http://localhost:8080/");
        assert_eq!(provider.base_url, "http://localhost:8080");
    }

    #[test]
    fn truncate_body_limits_length() {
        let long = "x".repeat(500);
        let truncated = truncate_body(&long);

        assert_eq!(truncated.len(), 203);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
