use std::fmt;
use thiserror::Error;

use crate::model::TravelMode;

/// Provider endpoint an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Geocode,
    DistanceMatrix,
    Directions,
    Autocomplete,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Geocode => "geocode",
            Endpoint::DistanceMatrix => "distance matrix",
            Endpoint::Directions => "directions",
            Endpoint::Autocomplete => "place autocomplete",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of [`MapsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    InvalidCredential,
    NotFound,
    NoRoute,
    Provider,
    Transport,
}

#[derive(Debug, Error)]
pub enum MapsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("API key rejected by the {endpoint} endpoint{}", detail(.message))]
    InvalidCredential {
        endpoint: Endpoint,
        message: Option<String>,
    },

    #[error("no match found for '{0}'")]
    NotFound(String),

    #[error("no {mode} route between the given points")]
    NoRoute { mode: TravelMode },

    #[error("{endpoint} request failed with status {status}{}", detail(.message))]
    Provider {
        endpoint: Endpoint,
        status: String,
        message: Option<String>,
    },

    #[error("malformed {endpoint} response: {reason}")]
    MalformedResponse { endpoint: Endpoint, reason: String },

    #[error("failed to reach the {endpoint} endpoint: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl MapsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MapsError::InvalidInput(_) => ErrorKind::InvalidInput,
            MapsError::InvalidCredential { .. } => ErrorKind::InvalidCredential,
            MapsError::NotFound(_) => ErrorKind::NotFound,
            MapsError::NoRoute { .. } => ErrorKind::NoRoute,
            MapsError::Provider { .. } | MapsError::MalformedResponse { .. } => {
                ErrorKind::Provider
            }
            MapsError::Transport { .. } => ErrorKind::Transport,
        }
    }

    /// Valid request, no result. Not worth logging as an error.
    pub fn is_expected(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound | ErrorKind::NoRoute)
    }

    /// Short message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            MapsError::InvalidInput(reason) => reason.clone(),
            MapsError::InvalidCredential { endpoint, .. } => {
                format!("Invalid API key or no permission for the {endpoint} API")
            }
            MapsError::NotFound(what) => format!("Location not found: {what}"),
            MapsError::NoRoute { mode } => {
                format!("Sorry, no {mode} route found between these two locations")
            }
            MapsError::Provider { endpoint, status, .. } => {
                format!("Map service error ({endpoint}: {status}). Please try again")
            }
            MapsError::MalformedResponse { endpoint, .. } => {
                format!("Unexpected response from the {endpoint} service. Please try again")
            }
            MapsError::Transport { source, .. } if source.is_timeout() => {
                "The map service timed out. Please try again".to_string()
            }
            MapsError::Transport { .. } => "Connection error occurred. Please try again".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MapsError>;
