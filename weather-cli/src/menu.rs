//! Interactive text menu over the core operations.

use std::{fmt, num::NonZeroUsize};

use inquire::{InquireError, Select, Text};
use weather_core::Pipeline;

use crate::{cli::fetch_and_save, display};

const MENU_HISTORY_LIMIT: NonZeroUsize = NonZeroUsize::new(5).unwrap();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    FetchNow,
    History,
    Cities,
    RunPipeline,
    Exit,
}

impl MenuChoice {
    const ALL: [MenuChoice; 5] = [
        MenuChoice::FetchNow,
        MenuChoice::History,
        MenuChoice::Cities,
        MenuChoice::RunPipeline,
        MenuChoice::Exit,
    ];
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MenuChoice::FetchNow => "Get current weather",
            MenuChoice::History => "View weather history",
            MenuChoice::Cities => "View all tracked cities",
            MenuChoice::RunPipeline => "Run data collection pipeline",
            MenuChoice::Exit => "Exit",
        })
    }
}

/// Loop until the user picks Exit or cancels a prompt.
pub async fn run(pipeline: &Pipeline) -> anyhow::Result<()> {
    loop {
        let choice = match Select::new("WEATHER DASHBOARD", MenuChoice::ALL.to_vec()).prompt() {
            Ok(choice) => choice,
            Err(e) if is_cancel(&e) => MenuChoice::Exit,
            Err(e) => return Err(e.into()),
        };

        match choice {
            MenuChoice::FetchNow => {
                let Some(city) = ask_city()? else { continue };
                match fetch_and_save(pipeline.provider(), pipeline.store(), &city).await {
                    Ok(fetched) => {
                        println!("{}", display::observation(&fetched.observation));
                        if let Err(e) = fetched.saved {
                            println!("Not saved: {e}");
                        }
                    }
                    Err(e) => println!("{e:#}"),
                }
            }
            MenuChoice::History => {
                let Some(city) = ask_city()? else { continue };
                match pipeline.store().history(&city, MENU_HISTORY_LIMIT) {
                    Ok(records) => println!("{}", display::history(&city, &records)),
                    Err(e) => println!("Could not load history: {e}"),
                }
            }
            MenuChoice::Cities => match pipeline.store().distinct_cities() {
                Ok(cities) => println!("{}", display::cities(&cities)),
                Err(e) => println!("Could not load cities: {e}"),
            },
            MenuChoice::RunPipeline => {
                let cities = display::city_list(pipeline.cities());
                println!("\nRunning data collection pipeline for {cities}...");
                let summary = pipeline.run_once().await;
                println!("{}", display::summary(&summary));
            }
            MenuChoice::Exit => {
                println!("Goodbye!");
                return Ok(());
            }
        }
    }
}

/// `None` when the prompt was cancelled or left blank.
fn ask_city() -> anyhow::Result<Option<String>> {
    match Text::new("Enter city name:").prompt() {
        Ok(city) if city.trim().is_empty() => Ok(None),
        Ok(city) => Ok(Some(city)),
        Err(e) if is_cancel(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn is_cancel(e: &InquireError) -> bool {
    matches!(
        e,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_lists_choices_in_order() {
        let labels: Vec<String> = MenuChoice::ALL.iter().map(|c| c.to_string()).collect();

        assert_eq!(
            labels,
            [
                "Get current weather",
                "View weather history",
                "View all tracked cities",
                "Run data collection pipeline",
                "Exit",
            ]
        );
    }

    #[test]
    fn cancelled_prompts_are_not_errors() {
        assert!(is_cancel(&InquireError::OperationCanceled));
        assert!(is_cancel(&InquireError::OperationInterrupted));
        assert!(!is_cancel(&InquireError::NotTTY));
    }
}
