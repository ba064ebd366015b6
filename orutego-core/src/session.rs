//! Per-user session context: the saved API key, the last result and the
//! autocomplete session token.
//!
//! A [`Session`] is created when the user starts, handed to every pipeline
//! call, and reset on [`Session::logout`]. Nothing in it is ever written to
//! disk.

use std::fmt;

use uuid::Uuid;

use crate::{error::MapsError, model::CalculationResult};

/// Provider API key. Opaque, trimmed and never empty.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    pub fn parse(raw: &str) -> Result<Self, MapsError> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(MapsError::InvalidInput("Please enter an API key".to_string()));
        }
        Ok(Self(key.to_owned()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(**redacted**)")
    }
}

#[derive(Debug)]
pub struct Session {
    credential: Option<Credential>,
    last_result: Option<CalculationResult>,
    token: Uuid,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            credential: None,
            last_result: None,
            token: Uuid::new_v4(),
        }
    }

    /// Start a session with a credential that has already been validated.
    pub fn with_credential(credential: Credential) -> Self {
        let mut session = Self::new();
        session.credential = Some(credential);
        session
    }

    pub fn credential(&self) -> Result<&Credential, MapsError> {
        self.credential
            .as_ref()
            .ok_or_else(|| MapsError::InvalidInput("Save an API key first".to_string()))
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    pub(crate) fn set_credential(&mut self, credential: Credential) {
        self.credential = Some(credential);
    }

    pub fn last_result(&self) -> Option<&CalculationResult> {
        self.last_result.as_ref()
    }

    pub(crate) fn record(&mut self, result: CalculationResult) {
        self.last_result = Some(result);
    }

    /// Token grouping autocomplete requests for provider billing.
    pub fn token(&self) -> String {
        self.token.to_string()
    }

    /// Forget the key and the last result, and start a fresh token.
    pub fn logout(&mut self) {
        self.credential = None;
        self.last_result = None;
        self.token = Uuid::new_v4();
        tracing::debug!("session cleared");
    }
}
