//! Typed failures for the library.
//!
//! A fetch that ends in any [`FetchError`] is the "absent" outcome: the
//! pipeline counts the city as failed for this run and moves on.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "No API key configured.\n\
         Hint: set WEATHER_API_KEY or run `weather configure` and enter your OpenWeather key."
    )]
    MissingApiKey,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to OpenWeather failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("OpenWeather request failed with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected OpenWeather response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid observation: {0}")]
    Invalid(&'static str),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),
}
