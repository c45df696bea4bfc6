use std::{num::NonZeroUsize, path::PathBuf, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use weather_core::{
    Config, DEFAULT_HISTORY_LIMIT, ObservationStore, Pipeline, StoreError, WeatherObservation,
    WeatherProvider, provider_from_config,
};

use crate::{display, menu};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Collect and browse weather observations")]
pub struct Cli {
    /// SQLite database file; overrides the configured path.
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Log debug details to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key in the config file.
    Configure,

    /// Fetch current weather for a city, print it and save it.
    Fetch {
        /// City name, sent to the API as typed.
        city: String,
    },

    /// Show stored observations for a city, newest first.
    History {
        /// Exact city name as stored (case-sensitive).
        city: String,

        /// How many records to show (at least one).
        #[arg(short = 'n', long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: NonZeroUsize,
    },

    /// List every city with stored observations.
    Cities,

    /// Run the collection pipeline once over the tracked cities.
    Run {
        /// Track these cities instead of the configured list. Repeatable.
        #[arg(long = "city")]
        cities: Vec<String>,
    },

    /// Run the collection pipeline repeatedly until Ctrl+C.
    Watch {
        /// Minutes between runs.
        #[arg(
            long,
            default_value_t = 60,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        every: u64,

        /// Track these cities instead of the configured list. Repeatable.
        #[arg(long = "city")]
        cities: Vec<String>,
    },

    /// Interactive menu.
    Menu,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;
        if let Some(path) = self.database {
            config.database_path = path;
        }

        match self.command {
            Command::Configure => configure(config)?,
            Command::Fetch { city } => {
                let provider = provider_from_config(&config)?;
                let store = open_store(&config)?;
                let fetched = fetch_and_save(provider.as_ref(), &store, &city).await?;
                println!("{}", display::observation(&fetched.observation));
                fetched.saved.with_context(|| {
                    format!("Fetched weather for {city} but could not save it")
                })?;
            }
            Command::History { city, limit } => {
                let records = open_store(&config)?.history(&city, limit)?;
                println!("{}", display::history(&city, &records));
            }
            Command::Cities => {
                let cities = open_store(&config)?.distinct_cities()?;
                println!("{}", display::cities(&cities));
            }
            Command::Run { cities } => {
                let pipeline = build_pipeline(&config, cities)?;
                let cities = display::city_list(pipeline.cities());
                println!("Running data collection pipeline for {cities}...");
                let summary = pipeline.run_once().await;
                println!("{}", display::summary(&summary));
            }
            Command::Watch { every, cities } => {
                let pipeline = build_pipeline(&config, cities)?;
                watch(&pipeline, every).await;
            }
            Command::Menu => {
                let pipeline = build_pipeline(&config, Vec::new())?;
                menu::run(&pipeline).await?;
            }
        }

        Ok(())
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    config.set_api_key(api_key);
    config.save()?;
    println!("Saved API key to {}", Config::config_file_path()?.display());
    Ok(())
}

fn open_store(config: &Config) -> anyhow::Result<ObservationStore> {
    let store = ObservationStore::new(config.database_path.clone());
    store.initialize().with_context(|| {
        format!("Failed to initialize database: {}", config.database_path.display())
    })?;
    Ok(store)
}

/// Fails fast when no API key is configured.
fn build_pipeline(config: &Config, cities: Vec<String>) -> anyhow::Result<Pipeline> {
    let provider = provider_from_config(config)?;
    let store = open_store(config)?;
    let pipeline = Pipeline::from_config(provider, store, config);

    Ok(if cities.is_empty() { pipeline } else { pipeline.with_cities(cities) })
}

/// A fetched reading and the outcome of storing it.
#[derive(Debug)]
pub(crate) struct Fetched {
    pub observation: WeatherObservation,
    /// Row id of the stored reading.
    pub saved: Result<i64, StoreError>,
}

/// Fails only when the fetch does; a failed save is reported in
/// [`Fetched::saved`] so the reading can still be shown.
pub(crate) async fn fetch_and_save(
    provider: &dyn WeatherProvider,
    store: &ObservationStore,
    city: &str,
) -> anyhow::Result<Fetched> {
    let observation = provider
        .fetch_current(city)
        .await
        .with_context(|| format!("No weather data for {city}"))?;

    let saved = store.save(&observation);
    Ok(Fetched { observation, saved })
}

/// Exit status for a forced stop, as shells report for SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

async fn watch(pipeline: &Pipeline, every_minutes: u64) {
    let cancel = CancellationToken::new();

    tokio::spawn(forward_interrupts(tokio::signal::ctrl_c, cancel.clone(), || {
        std::process::exit(INTERRUPTED_EXIT_CODE)
    }));

    println!(
        "Starting continuous pipeline for {} (every {every_minutes} minutes)",
        display::city_list(pipeline.cities())
    );
    println!("Press Ctrl+C to stop, twice to quit immediately\n");

    let runs = pipeline
        .run_continuously(watch_interval(every_minutes), cancel)
        .await;

    println!("\nPipeline stopped by user after {runs} run(s)");
}

/// Saturates instead of overflowing for absurd `--every` values.
fn watch_interval(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

/// The first interrupt cancels at the next run boundary. A second one calls
/// `force_exit`, since a run in progress may be stuck on a slow request.
async fn forward_interrupts<F, Fut>(
    mut interrupt: F,
    cancel: CancellationToken,
    force_exit: impl FnOnce(),
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = interrupt().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl+C");
        return;
    }
    tracing::info!("stop requested, finishing current run");
    cancel.cancel();

    if interrupt().await.is_ok() {
        tracing::warn!("second interrupt, exiting without waiting for the run");
        force_exit();
    }
}
