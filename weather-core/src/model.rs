use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// One fetched-and-timestamped weather reading for a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// City name as reported by the source, not the query text.
    pub city: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: i64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl WeatherObservation {
    /// Current instant at the precision the store persists, so a saved
    /// observation reads back equal.
    pub fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }
}

/// Counts for one pass over the tracked cities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Fetched but not persisted. Included in `succeeded`.
    pub unsaved: usize,
}

impl RunSummary {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}
