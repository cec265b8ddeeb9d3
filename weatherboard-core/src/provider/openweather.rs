use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    config::ApiConfig,
    error::FetchError,
    model::WeatherRecord,
    provider::{describe_transport_error, truncate_body},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Current-conditions client for the OpenWeather API.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api: ApiConfig,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api: ApiConfig) -> Self {
        Self {
            api,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

// Every field defaults so that a provider omitting one does not sink the whole
// decode; `into_record` decides whether what arrived is usable.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
}

impl OwCurrentResponse {
    fn into_record(self) -> Result<WeatherRecord, FetchError> {
        if self.name.trim().is_empty() {
            return Err(FetchError::Semantic("response has no location name".into()));
        }

        let Some(primary) = self.weather.into_iter().next() else {
            return Err(FetchError::Semantic("response has no weather conditions".into()));
        };

        Ok(WeatherRecord {
            city_name: self.name,
            temperature_c: self.main.temp,
            feels_like_c: self.main.feels_like,
            humidity_pct: self.main.humidity,
            pressure_hpa: self.main.pressure,
            description: primary.description,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch(&self, city: &str) -> Result<WeatherRecord, FetchError> {
        let city = city.trim();
        if city.is_empty() {
            tracing::warn!("Rejected weather lookup with an empty city name");
            return Err(FetchError::InvalidInput("city name cannot be empty".into()));
        }

        if !self.api.is_configured() {
            tracing::warn!("Weather API key not configured");
            return Err(FetchError::Unconfigured);
        }

        tracing::debug!(city, url = %self.base_url, "Requesting current weather");

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", city),
                ("appid", self.api.key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| {
                let detail = describe_transport_error(e);
                tracing::warn!(city, %detail, "OpenWeather request failed");
                FetchError::Network { detail }
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            let detail = describe_transport_error(e);
            tracing::warn!(city, %detail, "Failed to read OpenWeather response body");
            FetchError::Network { detail }
        })?;

        if !status.is_success() {
            let body = truncate_body(&body);
            tracing::warn!(city, status = status.as_u16(), %body, "OpenWeather returned an error status");
            return Err(FetchError::Protocol { status: status.as_u16(), body });
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(city, error = %e, "Failed to parse OpenWeather JSON");
            FetchError::Decode { detail: e.to_string() }
        })?;

        let record = parsed.into_record().inspect_err(|e| {
            tracing::warn!(city, error = %e, "OpenWeather response failed validation");
        })?;

        tracing::info!(city = %record.city_name, temp_c = record.temperature_c, "Weather loaded");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "test-key";

    fn london() -> serde_json::Value {
        json!({
            "coord": {"lon": -0.1257, "lat": 51.5085},
            "weather": [
                {"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"},
                {"id": 701, "main": "Mist", "description": "mist", "icon": "50d"}
            ],
            "main": {
                "temp": 14.2,
                "feels_like": 13.1,
                "temp_min": 12.0,
                "temp_max": 15.9,
                "pressure": 1021,
                "humidity": 71
            },
            "visibility": 10000,
            "name": "London",
            "cod": 200
        })
    }

    fn provider_for(server: &MockServer) -> OpenWeatherProvider {
        OpenWeatherProvider::new(ApiConfig::new(KEY))
            .with_base_url(format!("{}/data/2.5/weather", server.uri()))
    }

    #[tokio::test]
    async fn fetch_decodes_current_weather() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "London"))
            .and(query_param("appid", KEY))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(london()))
            .expect(1)
            .mount(&server)
            .await;

        let record = provider_for(&server).fetch("  London ").await.unwrap();

        assert_eq!(record.city_name, "London");
        assert_eq!(record.temperature_c, 14.2);
        assert_eq!(record.feels_like_c, 13.1);
        assert_eq!(record.humidity_pct, 71);
        assert_eq!(record.pressure_hpa, 1021);
        assert_eq!(record.description, "clear sky");
    }

    #[tokio::test]
    async fn city_is_percent_encoded() {
        let server = MockServer::start().await;

        // wiremock compares against the decoded query value
        Mock::given(method("GET"))
            .and(query_param("q", "São Paulo & Co"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "São Paulo",
                "main": {"temp": 25.0, "feels_like": 26.0, "humidity": 60, "pressure": 1012},
                "weather": [{"description": "few clouds"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let record = provider_for(&server).fetch("São Paulo & Co").await.unwrap();
        assert_eq!(record.city_name, "São Paulo");
    }

    #[tokio::test]
    async fn blank_city_makes_no_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(london()))
            .expect(0)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        for city in ["", "   ", "\t\n"] {
            let err = provider.fetch(city).await.unwrap_err();
            assert!(matches!(err, FetchError::InvalidInput(_)), "{city:?} gave {err:?}");
        }
    }

    #[tokio::test]
    async fn placeholder_key_makes_no_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(london()))
            .expect(0)
            .mount(&server)
            .await;

        let provider = OpenWeatherProvider::new(ApiConfig::new(crate::config::PLACEHOLDER_API_KEY))
            .with_base_url(server.uri());

        let err = provider.fetch("London").await.unwrap_err();
        assert!(matches!(err, FetchError::Unconfigured));
    }

    #[tokio::test]
    async fn missing_optional_fields_default_to_zero() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Reykjavik",
                "main": {"temp": 3.5, "humidity": 88},
                "weather": [{"main": "Rain"}],
                "new_field_from_provider": {"nested": true}
            })))
            .mount(&server)
            .await;

        let record = provider_for(&server).fetch("Reykjavik").await.unwrap();

        assert_eq!(record.temperature_c, 3.5);
        assert_eq!(record.feels_like_c, 0.0);
        assert_eq!(record.pressure_hpa, 0);
        assert_eq!(record.humidity_pct, 88);
        assert_eq!(record.description, "");
    }

    #[tokio::test]
    async fn empty_condition_list_is_semantic_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "London",
                "main": {"temp": 14.2, "feels_like": 13.1, "humidity": 71, "pressure": 1021},
                "weather": []
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server).fetch("London").await.unwrap_err();
        assert!(matches!(err, FetchError::Semantic(_)));
    }

    #[tokio::test]
    async fn missing_name_is_semantic_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "main": {"temp": 1.0},
                "weather": [{"description": "snow"}]
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server).fetch("Nowhere").await.unwrap_err();
        assert!(matches!(err, FetchError::Semantic(_)));
    }

    #[tokio::test]
    async fn non_success_status_is_protocol_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_string(r#"{"cod":"404","message":"city not found"}"#),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server).fetch("Atlantis").await.unwrap_err();
        match err {
            FetchError::Protocol { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("city not found"));
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"name\": \"London\""))
            .mount(&server)
            .await;

        let err = provider_for(&server).fetch("London").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[tokio::test]
    async fn wrong_shape_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "London",
                "main": "warm",
                "weather": [{"description": "clear sky"}]
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server).fetch("London").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        // Grab a free port, then release it so nothing is listening there.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let provider = OpenWeatherProvider::new(ApiConfig::new(KEY))
            .with_base_url(format!("http://127.0.0.1:{port}/data/2.5/weather"));

        let err = provider.fetch("London").await.unwrap_err();
        match err {
            FetchError::Network { detail } => assert!(!detail.contains(KEY)),
            other => panic!("expected network error, got {other:?}"),
        }
    }

    #[test]
    fn default_base_url_is_openweather() {
        let provider = OpenWeatherProvider::new(ApiConfig::new(KEY));
        assert_eq!(provider.base_url(), DEFAULT_BASE_URL);
    }
}
