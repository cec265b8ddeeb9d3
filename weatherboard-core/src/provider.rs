use crate::{Config, WeatherRecord, error::FetchError, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for `city`. One request, no retries.
    async fn fetch(&self, city: &str) -> Result<WeatherRecord, FetchError>;
}

/// Construct the weather provider described by `config`.
///
/// A missing API key is not an error here; `fetch` reports it as
/// [`FetchError::Unconfigured`] without touching the network.
pub fn provider_from_config(config: &Config) -> Box<dyn WeatherProvider> {
    let provider = OpenWeatherProvider::new(config.api_config());

    match &config.weather.base_url {
        Some(url) => Box::new(provider.with_base_url(url.clone())),
        None => Box::new(provider),
    }
}

/// Cut a response body down to something that fits in a log line.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Flatten a transport error and its causes, leaving out the request URL (it carries the key).
pub(crate) fn describe_transport_error(err: reqwest::Error) -> String {
    let err = err.without_url();
    let mut detail = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_bodies() {
        assert_eq!(truncate_body("city not found"), "city not found");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "é".repeat(300);
        let out = truncate_body(&body);

        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
    }

    #[tokio::test]
    async fn provider_from_config_without_key_is_unconfigured() {
        let provider = provider_from_config(&Config::default());
        let err = provider.fetch("London").await.unwrap_err();

        assert!(matches!(err, FetchError::Unconfigured));
    }
}
