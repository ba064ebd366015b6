use crate::{
    Config,
    error::Result,
    model::{Coordinates, DistanceResult, GeoResult, Route, Suggestion, TravelMode},
    provider::google::GoogleMapsProvider,
    session::Credential,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod google;

/// Raw calls against the mapping provider. One implementation exists; the
/// trait lets the pipeline run against an in-memory double in tests.
#[async_trait]
pub trait MapsProvider: Send + Sync + Debug {
    /// First match for `address`.
    async fn geocode(&self, address: &str, credential: &Credential) -> Result<GeoResult>;

    /// Metric distance and duration for a single origin/destination pair.
    async fn distance(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: TravelMode,
        credential: &Credential,
    ) -> Result<DistanceResult>;

    /// Primary route followed by any alternatives, in provider order.
    async fn directions(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: TravelMode,
        credential: &Credential,
    ) -> Result<Vec<Route>>;

    async fn autocomplete(
        &self,
        input: &str,
        session_token: Option<&str>,
        credential: &Credential,
    ) -> Result<Vec<Suggestion>>;
}

/// Construct the provider described by `config`.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn MapsProvider>> {
    config.validate()?;
    let provider = GoogleMapsProvider::new(&config.provider)?;
    Ok(Box::new(provider))
}
