//! Append-only SQLite persistence for weather observations.
//!
//! Every operation opens its own connection and closes it on return; no
//! transaction spans two calls. The schema matches databases written by
//! earlier versions of the tool, so an existing `weather.db` opens as is.
//! Those versions stored local wall-clock time without an offset; such rows
//! are read in the local zone and converted to UTC.

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Row, params, types::Type};
use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use crate::{WeatherObservation, error::StoreError};

/// Row cap for `history` when the caller has no preference.
pub const DEFAULT_HISTORY_LIMIT: NonZeroUsize = NonZeroUsize::new(10).unwrap();

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS weather_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        city TEXT NOT NULL,
        temperature REAL NOT NULL,
        feels_like REAL NOT NULL,
        humidity INTEGER NOT NULL,
        description TEXT NOT NULL,
        timestamp TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_weather_city_time ON weather_data(city, timestamp);
"#;

#[derive(Debug, Clone)]
pub struct ObservationStore {
    path: PathBuf,
}

impl ObservationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the database directory and table if they are missing.
    ///
    /// Safe on every start: existing rows are never touched.
    pub fn initialize(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(path = %self.path.display(), "database initialized");
        Ok(())
    }

    /// Persist one observation and return its row id.
    ///
    /// The row is committed before this returns. Invalid input is rejected
    /// without touching the database.
    pub fn save(&self, observation: &WeatherObservation) -> Result<i64, StoreError> {
        let result = self.insert(observation);
        match &result {
            Ok(id) => tracing::info!(city = %observation.city, id, "saved weather data"),
            Err(e) => {
                tracing::warn!(city = %observation.city, error = %e, "failed to save weather data")
            }
        }
        result
    }

    fn insert(&self, observation: &WeatherObservation) -> Result<i64, StoreError> {
        validate(observation)?;

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO weather_data
             (city, temperature, feels_like, humidity, description, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                observation.city,
                observation.temperature,
                observation.feels_like,
                observation.humidity,
                observation.description,
                format_timestamp(&observation.timestamp),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent observations for `city`, newest first.
    ///
    /// The match is exact and case-sensitive. At most `limit` rows come back;
    /// an unknown city yields an empty vec.
    pub fn history(
        &self,
        city: &str,
        limit: NonZeroUsize,
    ) -> Result<Vec<WeatherObservation>, StoreError> {
        let limit = i64::try_from(limit.get()).unwrap_or(i64::MAX);

        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT city, temperature, feels_like, humidity, description, timestamp
             FROM weather_data
             WHERE city = ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT ?2",
        )?;

        let history = stmt
            .query_map(params![city, limit], observation_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(city, records = history.len(), "loaded history");
        Ok(history)
    }

    /// Every city with at least one observation, alphabetically.
    pub fn distinct_cities(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT DISTINCT city FROM weather_data ORDER BY city")?;
        let cities = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(cities)
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM weather_data", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.path)?)
    }
}

fn validate(observation: &WeatherObservation) -> Result<(), StoreError> {
    if observation.city.trim().is_empty() {
        return Err(StoreError::Invalid("city is empty"));
    }
    if observation.description.trim().is_empty() {
        return Err(StoreError::Invalid("description is empty"));
    }
    if !observation.temperature.is_finite() || !observation.feels_like.is_finite() {
        return Err(StoreError::Invalid("temperature is not a finite number"));
    }
    Ok(())
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC 3339 and offset-less ISO-8601 (read as local time).
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(_) => value.parse::<NaiveDateTime>().map(local_to_utc),
    }
}

/// Times skipped by a DST jump have no local reading; those fall back to UTC.
fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    naive
        .and_local_timezone(Local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

fn observation_from_row(row: &Row<'_>) -> rusqlite::Result<WeatherObservation> {
    let timestamp: String = row.get(5)?;
    let timestamp = parse_timestamp(&timestamp).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e))
    })?;

    Ok(WeatherObservation {
        city: row.get(0)?,
        temperature: row.get(1)?,
        feels_like: row.get(2)?,
        humidity: row.get(3)?,
        description: row.get(4)?,
        timestamp,
    })
}
