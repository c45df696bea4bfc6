use crate::{
    Config, WeatherObservation,
    error::{ConfigError, FetchError},
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// Source of current weather readings.
///
/// Every failure is reported as an `Err`; callers treat it as "no data for
/// this city" and never need to branch on the variant.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_current(&self, city: &str) -> Result<WeatherObservation, FetchError>;
}

/// Construct the OpenWeather provider from config.
///
/// Fails immediately when no API key is available.
pub fn provider_from_config(config: &Config) -> Result<Box<dyn WeatherProvider>, ConfigError> {
    Ok(Box::new(OpenWeatherProvider::from_config(config)?))
}
