use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Level name used when a score is submitted without one.
pub const DEFAULT_LEVEL: &str = "Default";

/// Current conditions for a city, as validated from a provider response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city_name: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    /// First condition descriptor, e.g. "clear sky".
    pub description: String,
}

/// A persisted high-score row. Only the store creates these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub id: i64,
    pub player_name: String,
    pub score: i64,
    pub level_name: String,
    pub achieved_at: DateTime<Utc>,
    pub completion_time_secs: f64,
}

impl fmt::Display for ScoreRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} points on {} ({:.2}s)",
            self.player_name, self.score, self.level_name, self.completion_time_secs
        )
    }
}

/// A score submission. The store assigns the id and, unless given, the timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewScore {
    pub player_name: String,
    pub score: i64,
    pub level_name: String,
    pub completion_time_secs: f64,
    pub achieved_at: Option<DateTime<Utc>>,
}

impl NewScore {
    pub fn new(player_name: impl Into<String>, score: i64) -> Self {
        Self {
            player_name: player_name.into(),
            score,
            level_name: DEFAULT_LEVEL.to_string(),
            completion_time_secs: 0.0,
            achieved_at: None,
        }
    }

    pub fn level(mut self, level_name: impl Into<String>) -> Self {
        self.level_name = level_name.into();
        self
    }

    pub fn completion_time(mut self, secs: f64) -> Self {
        self.completion_time_secs = secs;
        self
    }

    pub fn achieved_at(mut self, at: DateTime<Utc>) -> Self {
        self.achieved_at = Some(at);
        self
    }
}
