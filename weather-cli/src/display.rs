//! Human-readable console output.

use chrono::Local;
use weather_core::{RunSummary, WeatherObservation};

const RULE_WIDTH: usize = 50;

pub fn observation(obs: &WeatherObservation) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!(
        "\n{rule}\n\
         Weather in {}\n\
         {rule}\n\
         Temperature: {}°C\n\
         Feels like:  {}°C\n\
         Humidity:    {}%\n\
         Description: {}\n\
         Time:        {}\n\
         {rule}\n",
        obs.city,
        obs.temperature,
        obs.feels_like,
        obs.humidity,
        obs.description,
        obs.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
    )
}

pub fn history(city: &str, records: &[WeatherObservation]) -> String {
    if records.is_empty() {
        return format!("No history found for {city}");
    }

    let rule = "-".repeat(70);
    let mut out = format!("\nLast {} weather records for {city}:\n{rule}\n", records.len());
    for r in records {
        out.push_str(&format!(
            "{} | Temp: {}°C | Humidity: {}% | {}\n",
            r.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            r.temperature,
            r.humidity,
            r.description,
        ));
    }
    out.push_str(&rule);
    out
}

pub fn cities(cities: &[String]) -> String {
    if cities.is_empty() {
        "No cities tracked yet!".to_string()
    } else {
        format!("Cities tracked: {}", cities.join(", "))
    }
}

/// Tracked cities for a run banner, e.g. `3 cities (London, Paris, Tokyo)`.
pub fn city_list(cities: &[String]) -> String {
    match cities {
        [] => "no cities".to_string(),
        [one] => one.clone(),
        many => format!("{} cities ({})", many.len(), many.join(", ")),
    }
}

pub fn summary(summary: &RunSummary) -> String {
    let rule = "=".repeat(60);
    let mut out = format!(
        "\n{rule}\n\
         Pipeline Summary:\n   \
         Successful: {}\n   \
         Failed:     {}\n",
        summary.succeeded, summary.failed,
    );
    if summary.unsaved > 0 {
        out.push_str(&format!("   Not saved:  {}\n", summary.unsaved));
    }
    out.push_str(&rule);
    out
}
