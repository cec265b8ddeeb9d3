//! Core library for `weatherboard`.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather current-conditions client
//! - The SQLite high-score store and its async leaderboard handle
//!
//! It is used by `weatherboard-cli`, but the two pipelines are independent and
//! can be embedded separately.

pub mod config;
pub mod error;
pub mod leaderboard;
pub mod model;
pub mod provider;
pub mod store;

pub use config::{ApiConfig, Config};
pub use error::{FetchError, StoreError};
pub use leaderboard::Leaderboard;
pub use model::{DEFAULT_LEVEL, NewScore, ScoreRecord, WeatherRecord};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
pub use store::{DEFAULT_LIMIT, ScoreStore};
