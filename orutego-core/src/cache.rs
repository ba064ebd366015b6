use moka::future::Cache;

use crate::{config::CacheConfig, model::GeoResult, session::Credential};

/// Short-lived geocode memo keyed on credential and address, so results
/// obtained under one key are never served to another.
///
/// Only successful lookups are stored.
#[derive(Debug, Clone)]
pub struct GeocodeCache {
    entries: Cache<(Credential, String), GeoResult>,
}

impl GeocodeCache {
    pub fn new(config: &CacheConfig) -> Self {
        let entries = Cache::builder()
            .time_to_live(config.ttl())
            .max_capacity(config.max_entries)
            .build();

        Self { entries }
    }

    pub async fn get(&self, credential: &Credential, address: &str) -> Option<GeoResult> {
        let hit = self
            .entries
            .get(&(credential.clone(), address.to_owned()))
            .await;
        tracing::debug!(address, hit = hit.is_some(), "geocode cache lookup");
        hit
    }

    pub async fn insert(&self, credential: &Credential, address: &str, result: GeoResult) {
        self.entries
            .insert((credential.clone(), address.to_owned()), result)
            .await;
    }
}
