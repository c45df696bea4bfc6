//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the [`WeatherProvider`] trait
//! - The SQLite observation store
//! - The collection pipeline that ties the two together
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod store;

pub use config::Config;
pub use error::{ConfigError, FetchError, StoreError};
pub use model::{RunSummary, WeatherObservation};
pub use pipeline::Pipeline;
pub use provider::{OpenWeatherProvider, WeatherProvider, provider_from_config};
pub use store::{DEFAULT_HISTORY_LIMIT, ObservationStore};
