//! Typed failures for the weather and score pipelines.
//!
//! Callers get the precise kind so they can pick their own wording;
//! `user_message()` is a ready-made short status line for simple front-ends.

use thiserror::Error;

/// Why a weather lookup did not produce a record.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("weather API key is not configured")]
    Unconfigured,

    #[error("network error: {detail}")]
    Network { detail: String },

    #[error("weather provider returned HTTP {status}: {body}")]
    Protocol { status: u16, body: String },

    #[error("failed to decode weather response: {detail}")]
    Decode { detail: String },

    #[error("weather response is not usable: {0}")]
    Semantic(String),
}

impl FetchError {
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::InvalidInput(_) => "Please enter a city name.",
            FetchError::Unconfigured => {
                "No API key configured. Run `weatherboard configure` first."
            }
            FetchError::Network { .. } => "Unable to connect. Check your internet connection.",
            FetchError::Protocol { status: 401, .. } => "The API key was rejected.",
            FetchError::Protocol { status: 404, .. } => "City not found.",
            FetchError::Protocol { .. } => "The weather service returned an error.",
            FetchError::Decode { .. } => "Received an unexpected response from the weather service.",
            FetchError::Semantic(_) => "Weather data could not be retrieved for that location.",
        }
    }
}

/// Failures of the high-score store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("score store is not open")]
    NotOpen,

    #[error("score storage failed: {0}")]
    Persist(#[from] rusqlite::Error),

    #[error("score storage task did not complete: {0}")]
    Interrupted(String),
}

impl StoreError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StoreError::NotOpen => "The score database is not available.",
            StoreError::Persist(_) => "Saving scores failed. Check disk space and permissions.",
            StoreError::Interrupted(_) => "The score operation was interrupted. Please try again.",
        }
    }
}
