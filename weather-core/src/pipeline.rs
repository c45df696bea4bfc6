//! Collection pipeline: fetch and persist every tracked city, in order.
//!
//! Runs are strictly sequential. Each city is fetched and saved before the
//! next one starts, with a fixed pause in between to stay under the
//! provider's rate limit. A city that fails never stops the run.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::{Config, ObservationStore, RunSummary, WeatherProvider};

#[derive(Debug)]
pub struct Pipeline {
    provider: Box<dyn WeatherProvider>,
    store: ObservationStore,
    cities: Vec<String>,
    delay: Duration,
}

impl Pipeline {
    pub fn new(
        provider: Box<dyn WeatherProvider>,
        store: ObservationStore,
        cities: Vec<String>,
        delay: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            cities,
            delay,
        }
    }

    /// Pipeline over the configured cities and pacing.
    pub fn from_config(
        provider: Box<dyn WeatherProvider>,
        store: ObservationStore,
        config: &Config,
    ) -> Self {
        Self::new(provider, store, config.tracked_cities.clone(), config.request_delay())
    }

    /// Replace the tracked cities for this pipeline.
    pub fn with_cities(mut self, cities: Vec<String>) -> Self {
        self.cities = cities;
        self
    }

    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    pub fn provider(&self) -> &dyn WeatherProvider {
        self.provider.as_ref()
    }

    pub fn store(&self) -> &ObservationStore {
        &self.store
    }

    /// One pass over the tracked cities.
    pub async fn run_once(&self) -> RunSummary {
        tracing::info!(cities = self.cities.len(), "pipeline run started");

        let mut summary = RunSummary::default();

        for (idx, city) in self.cities.iter().enumerate() {
            match self.provider.fetch_current(city).await {
                Ok(observation) => {
                    if let Err(e) = self.store.save(&observation) {
                        tracing::warn!(city = %city, error = %e, "fetched but not saved");
                        summary.unsaved += 1;
                    }
                    tracing::info!(
                        city = %city,
                        temperature = observation.temperature,
                        "fetched"
                    );
                    summary.succeeded += 1;
                }
                Err(_) => {
                    // The provider already logged the cause.
                    tracing::info!(city = %city, "failed");
                    summary.failed += 1;
                }
            }

            if idx + 1 < self.cities.len() && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            unsaved = summary.unsaved,
            "pipeline run finished"
        );
        summary
    }

    /// Repeat [`run_once`](Self::run_once) every `interval` until `cancel`
    /// fires.
    ///
    /// Cancellation is only observed between runs: a run in progress is
    /// always completed. Returns how many runs completed.
    pub async fn run_continuously(&self, interval: Duration, cancel: CancellationToken) -> usize {
        tracing::info!(interval_secs = interval.as_secs(), "starting continuous pipeline");

        let mut runs = 0;
        while !cancel.is_cancelled() {
            self.run_once().await;
            runs += 1;

            tracing::info!(minutes = interval.as_secs() / 60, "sleeping until next run");
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        tracing::info!(runs, "pipeline stopped");
        runs
    }
}
