use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use orutego_core::{Config, MapsError, Planner, Session, TravelMode, TripRequest};

use crate::{interactive, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "orutego",
    version,
    about = "Distance and travel time between two addresses"
)]
pub struct Cli {
    /// Google Maps Platform API key. Prompted for when absent; never saved.
    #[arg(long, global = true, env = "ORUTEGO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Log provider requests and pipeline steps.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Distance, travel time and routes between two addresses.
    Calculate {
        origin: String,

        destination: String,

        /// driving, walking, bicycling or transit; defaults to the configured mode.
        #[arg(short, long)]
        mode: Option<TravelMode>,

        /// Print the full result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Suggest addresses for partially typed text.
    Suggest { text: String },

    /// Check that the API key is accepted.
    CheckKey,

    /// Edit default travel mode, timeouts and cache settings.
    Configure,

    /// Save a key once, then calculate interactively.
    Session,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;
        tracing::debug!(mode = %config.default_mode, "configuration loaded");

        match self.command {
            Command::Configure => interactive::configure(config)?,
            Command::Calculate {
                origin,
                destination,
                mode,
                json,
            } => {
                let planner = build_planner(&config)?;
                let mut session = open_session(&planner, self.api_key).await?;
                let request =
                    TripRequest::new(origin, destination, mode.unwrap_or(config.default_mode));

                let result = planner
                    .calculate(&mut session, &request)
                    .await
                    .map_err(explain)?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                } else {
                    print!("{}", render::summary(&result));
                }
            }
            Command::Suggest { text } => {
                let planner = build_planner(&config)?;
                let session = open_session(&planner, self.api_key).await?;
                let suggestions = planner.suggest(&session, &text).await.map_err(explain)?;
                print!("{}", render::suggestions(&suggestions));
            }
            Command::CheckKey => {
                let planner = build_planner(&config)?;
                open_session(&planner, self.api_key).await?;
                println!("API key is valid");
            }
            Command::Session => {
                let planner = build_planner(&config)?;
                interactive::run_session(&planner, &config, self.api_key).await?;
            }
        }

        Ok(())
    }
}

fn build_planner(config: &Config) -> anyhow::Result<Planner> {
    Planner::from_config(config).context("Failed to set up map provider")
}

/// Validate the key (from flag, env or prompt) and start a session with it.
pub async fn open_session(planner: &Planner, api_key: Option<String>) -> anyhow::Result<Session> {
    let raw = match api_key {
        Some(key) => key,
        None => prompt_key()?,
    };

    let mut session = Session::new();
    planner.login(&mut session, &raw).await.map_err(explain)?;
    Ok(session)
}

pub fn prompt_key() -> anyhow::Result<String> {
    let key = Password::new("Google Maps API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()?;
    Ok(key)
}

/// Lead with the short user-facing message and keep the detail as the cause.
pub fn explain(err: MapsError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}
