//! Prompt-driven flows: the calculation session and settings editor.

use anyhow::Result;
use inquire::{CustomType, InquireError, Select, Text, validator::Validation};
use orutego_core::{CacheConfig, Config, MapsError, Planner, Session, TravelMode, TripRequest};
use std::fmt;

use crate::{cli, render};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Calculate,
    Swap,
    Suggest,
    ShowLast,
    SaveKey,
    Logout,
    Quit,
}

impl Action {
    const ALL: [Action; 7] = [
        Action::Calculate,
        Action::Swap,
        Action::Suggest,
        Action::ShowLast,
        Action::SaveKey,
        Action::Logout,
        Action::Quit,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Calculate => "Calculate",
            Action::Swap => "Swap origin and destination",
            Action::Suggest => "Suggest addresses",
            Action::ShowLast => "Show last result",
            Action::SaveKey => "Save API key",
            Action::Logout => "Log out",
            Action::Quit => "Quit",
        })
    }
}

fn is_cancel(err: &InquireError) -> bool {
    matches!(
        err,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

pub async fn run_session(planner: &Planner, config: &Config, api_key: Option<String>) -> Result<()> {
    let mut session = Session::new();
    if let Some(key) = api_key {
        report(planner.login(&mut session, &key).await);
    }

    let mut request = TripRequest {
        mode: config.default_mode,
        ..TripRequest::default()
    };

    loop {
        let status = if session.has_credential() { "key saved" } else { "no key" };
        let action = match Select::new(&format!("orutego ({status}):"), Action::ALL.to_vec()).prompt() {
            Ok(action) => action,
            Err(e) if is_cancel(&e) => break,
            Err(e) => return Err(e.into()),
        };

        let outcome = match action {
            Action::Calculate => calculate(planner, &mut session, &mut request).await,
            Action::Swap => {
                request.swap();
                println!("Origin: {}\nDestination: {}", request.origin, request.destination);
                Ok(())
            }
            Action::Suggest => suggest(planner, &session).await,
            Action::ShowLast => {
                match session.last_result() {
                    Some(result) => print!("{}", render::summary(result)),
                    None => println!("Nothing calculated yet"),
                }
                Ok(())
            }
            Action::SaveKey => save_key(planner, &mut session).await,
            Action::Logout => {
                session.logout();
                println!("Logged out");
                Ok(())
            }
            Action::Quit => break,
        };

        match outcome {
            Ok(()) => {}
            Err(e) if e.downcast_ref::<InquireError>().is_some_and(is_cancel) => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

/// Print a pipeline failure without ending the session.
fn report<T>(outcome: Result<T, MapsError>) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(e) => {
            eprintln!("{}", e.user_message());
            None
        }
    }
}

async fn calculate(planner: &Planner, session: &mut Session, request: &mut TripRequest) -> Result<()> {
    let origin = Text::new("Origin:")
        .with_initial_value(&request.origin)
        .prompt()?;
    let destination = Text::new("Destination:")
        .with_initial_value(&request.destination)
        .prompt()?;
    request.origin = origin;
    request.destination = destination;

    let modes = TravelMode::all().to_vec();
    let cursor = modes.iter().position(|m| *m == request.mode).unwrap_or(0);
    request.mode = Select::new("Travel mode:", modes)
        .with_starting_cursor(cursor)
        .prompt()?;

    if let Some(result) = report(planner.calculate(session, request).await) {
        print!("{}", render::summary(&result));
    }
    Ok(())
}

async fn suggest(planner: &Planner, session: &Session) -> Result<()> {
    let text = Text::new("Start typing an address:").prompt()?;
    if let Some(found) = report(planner.suggest(session, &text).await) {
        print!("{}", render::suggestions(&found));
    }
    Ok(())
}

async fn save_key(planner: &Planner, session: &mut Session) -> Result<()> {
    let raw = cli::prompt_key()?;
    if report(planner.login(session, &raw).await).is_some() {
        println!("API key is saved and ready");
    }
    Ok(())
}

fn ttl_within_limit(value: &u64) -> Result<Validation, inquire::CustomUserError> {
    Ok(match CacheConfig::check_ttl_secs(*value) {
        Ok(()) => Validation::Valid,
        Err(e) => Validation::Invalid(e.to_string().into()),
    })
}

fn positive(value: &u64) -> Result<Validation, inquire::CustomUserError> {
    if *value > 0 {
        Ok(Validation::Valid)
    } else {
        Ok(Validation::Invalid("must be greater than zero".into()))
    }
}

pub fn configure(mut config: Config) -> Result<()> {
    let modes = TravelMode::all().to_vec();
    let cursor = modes
        .iter()
        .position(|m| *m == config.default_mode)
        .unwrap_or(0);
    config.default_mode = Select::new("Default travel mode:", modes)
        .with_starting_cursor(cursor)
        .prompt()?;

    config.provider.geocode_timeout_secs = CustomType::<u64>::new("Geocode timeout (seconds):")
        .with_default(config.provider.geocode_timeout_secs)
        .with_validator(positive)
        .prompt()?;

    config.provider.route_timeout_secs =
        CustomType::<u64>::new("Distance/directions timeout (seconds):")
            .with_default(config.provider.route_timeout_secs)
            .with_validator(positive)
            .prompt()?;

    config.cache.ttl_secs = CustomType::<u64>::new("Geocode memo lifetime (seconds):")
        .with_default(config.cache.ttl_secs)
        .with_validator(ttl_within_limit)
        .prompt()?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
