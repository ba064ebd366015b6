//! The calculation pipeline: geocode both ends, look up distance and routes,
//! and record the result in the caller's session.

use chrono::Utc;

use crate::{
    cache::GeocodeCache,
    config::{CacheConfig, Config},
    error::{MapsError, Result},
    model::{
        CalculationResult, Coordinates, DistanceResult, GeoResult, Route, Suggestion,
        TravelMode, TripRequest,
    },
    provider::{MapsProvider, provider_from_config},
    session::{Credential, Session},
};

/// Address used to probe whether a key is accepted.
const PROBE_ADDRESS: &str = "Google";
/// Suggestions are only requested once the user typed this many characters.
pub const MIN_SUGGEST_CHARS: usize = 3;

#[derive(Debug)]
pub struct Planner {
    provider: Box<dyn MapsProvider>,
    geocode_cache: GeocodeCache,
}

impl Planner {
    pub fn new(provider: Box<dyn MapsProvider>, cache: &CacheConfig) -> Self {
        Self {
            provider,
            geocode_cache: GeocodeCache::new(cache),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = provider_from_config(config)?;
        Ok(Self::new(provider, &config.cache))
    }

    /// Resolve an address to its first provider match, memoized per key.
    pub async fn geocode(&self, address: &str, credential: &Credential) -> Result<GeoResult> {
        let address = address.trim();
        if address.is_empty() {
            return Err(MapsError::InvalidInput("Address must not be empty".to_string()));
        }

        if let Some(hit) = self.geocode_cache.get(credential, address).await {
            return Ok(hit);
        }

        let result = self.provider.geocode(address, credential).await?;
        self.geocode_cache
            .insert(credential, address, result.clone())
            .await;
        Ok(result)
    }

    pub async fn compute_distance(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: TravelMode,
        credential: &Credential,
    ) -> Result<DistanceResult> {
        self.provider
            .distance(origin, destination, mode, credential)
            .await
    }

    pub async fn resolve_routes(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: TravelMode,
        credential: &Credential,
    ) -> Result<Vec<Route>> {
        self.provider
            .directions(origin, destination, mode, credential)
            .await
    }

    /// Check a raw key with a probe geocode. Anything other than a
    /// permission failure counts as accepted.
    pub async fn validate_credential(&self, raw: &str) -> Result<Credential> {
        let credential = Credential::parse(raw)?;

        match self.provider.geocode(PROBE_ADDRESS, &credential).await {
            Ok(_)
            | Err(MapsError::NotFound(_))
            | Err(MapsError::NoRoute { .. })
            | Err(MapsError::Provider { .. })
            | Err(MapsError::MalformedResponse { .. }) => Ok(credential),
            Err(e @ MapsError::InvalidCredential { .. })
            | Err(e @ MapsError::Transport { .. })
            | Err(e @ MapsError::InvalidInput(_)) => Err(e),
        }
    }

    /// Validate `raw` and store it in the session.
    pub async fn login(&self, session: &mut Session, raw: &str) -> Result<()> {
        let credential = self.validate_credential(raw).await?;
        session.set_credential(credential);
        tracing::info!("API key validated and saved for this session");
        Ok(())
    }

    /// Run the whole pipeline. On success the result becomes the session's
    /// last result; on failure the previous one is kept.
    pub async fn calculate(
        &self,
        session: &mut Session,
        request: &TripRequest,
    ) -> Result<CalculationResult> {
        let credential = session.credential()?.clone();
        if request.origin.trim().is_empty() {
            return Err(MapsError::InvalidInput("Enter origin address".to_string()));
        }
        if request.destination.trim().is_empty() {
            return Err(MapsError::InvalidInput("Enter destination address".to_string()));
        }

        match self.run(&credential, request).await {
            Ok(result) => {
                tracing::info!(
                    mode = %request.mode,
                    meters = result.distance.distance_meters,
                    seconds = result.distance.duration_seconds,
                    routes = result.routes.len(),
                    "calculation complete"
                );
                session.record(result.clone());
                Ok(result)
            }
            Err(e) => {
                if e.is_expected() {
                    tracing::info!(error = %e, "calculation found no result");
                } else {
                    tracing::warn!(error = %e, "calculation failed");
                }
                Err(e)
            }
        }
    }

    async fn run(&self, credential: &Credential, request: &TripRequest) -> Result<CalculationResult> {
        let origin = self.geocode(&request.origin, credential).await?;
        let destination = self.geocode(&request.destination, credential).await?;

        let distance = self
            .compute_distance(
                origin.coordinates(),
                destination.coordinates(),
                request.mode,
                credential,
            )
            .await?;

        // The numbers stand on their own; a missing geometry only costs the map.
        let routes = match self
            .resolve_routes(
                origin.coordinates(),
                destination.coordinates(),
                request.mode,
                credential,
            )
            .await
        {
            Ok(routes) => routes,
            Err(e @ MapsError::NoRoute { .. }) | Err(e @ MapsError::NotFound(_)) => {
                tracing::info!(error = %e, "no route geometry, continuing without it");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        Ok(CalculationResult {
            origin,
            destination,
            mode: request.mode,
            distance,
            routes,
            calculated_at: Utc::now(),
        })
    }

    /// Address suggestions for partially typed text.
    ///
    /// Suggestions are non-critical: provider and network failures degrade to
    /// an empty list. A rejected key still surfaces.
    pub async fn suggest(&self, session: &Session, partial: &str) -> Result<Vec<Suggestion>> {
        let input = partial.trim();
        if input.chars().count() < MIN_SUGGEST_CHARS {
            return Ok(Vec::new());
        }

        let credential = session.credential()?;
        let token = session.token();

        match self
            .provider
            .autocomplete(input, Some(&token), credential)
            .await
        {
            Ok(suggestions) => Ok(suggestions),
            Err(e @ MapsError::InvalidCredential { .. }) | Err(e @ MapsError::InvalidInput(_)) => {
                Err(e)
            }
            Err(
                e @ (MapsError::NotFound(_)
                | MapsError::NoRoute { .. }
                | MapsError::Provider { .. }
                | MapsError::MalformedResponse { .. }
                | MapsError::Transport { .. }),
            ) => {
                tracing::debug!(error = %e, "suggestions unavailable");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Endpoint;
    use crate::model::BoundingBox;
    use async_trait::async_trait;
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Debug, Default)]
    struct Calls {
        geocode: AtomicUsize,
        distance: AtomicUsize,
        directions: AtomicUsize,
        autocomplete: AtomicUsize,
        last_token: Mutex<Option<String>>,
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    enum Outcome {
        #[default]
        Ok,
        Empty,
        Denied,
        Failed,
    }

    #[derive(Debug, Default)]
    struct FakeProvider {
        calls: Arc<Calls>,
        /// Addresses the fake cannot geocode.
        unknown: Vec<&'static str>,
        deny_geocode: bool,
        directions: Outcome,
        autocomplete: Outcome,
    }

    fn line(from: (f64, f64), to: (f64, f64), primary: bool) -> Route {
        let a = Coordinates::new(from.0, from.1);
        let b = Coordinates::new(to.0, to.1);
        Route {
            points: vec![a, b],
            bounding_box: BoundingBox { southwest: a, northeast: b },
            is_primary: primary,
        }
    }

    fn provider_error(endpoint: Endpoint) -> MapsError {
        MapsError::Provider {
            endpoint,
            status: "UNKNOWN_ERROR".into(),
            message: None,
        }
    }

    #[async_trait]
    impl MapsProvider for FakeProvider {
        async fn geocode(&self, address: &str, _credential: &Credential) -> Result<GeoResult> {
            self.calls.geocode.fetch_add(1, Ordering::SeqCst);
            if self.deny_geocode {
                return Err(MapsError::InvalidCredential {
                    endpoint: Endpoint::Geocode,
                    message: None,
                });
            }
            if self.unknown.iter().any(|u| *u == address) {
                return Err(MapsError::NotFound(address.to_owned()));
            }
            let n = address.len() as f64;
            Ok(GeoResult {
                latitude: -6.0 - n / 100.0,
                longitude: 106.0 + n / 100.0,
                formatted_address: format!("{address}, Indonesia"),
            })
        }

        async fn distance(
            &self,
            _origin: Coordinates,
            _destination: Coordinates,
            _mode: TravelMode,
            _credential: &Credential,
        ) -> Result<DistanceResult> {
            self.calls.distance.fetch_add(1, Ordering::SeqCst);
            Ok(DistanceResult {
                distance_meters: 2500,
                distance_text: "2.5 km".into(),
                duration_seconds: 5400,
                duration_text: "1 hour 30 mins".into(),
            })
        }

        async fn directions(
            &self,
            origin: Coordinates,
            destination: Coordinates,
            mode: TravelMode,
            _credential: &Credential,
        ) -> Result<Vec<Route>> {
            self.calls.directions.fetch_add(1, Ordering::SeqCst);
            let o = (origin.latitude, origin.longitude);
            let d = (destination.latitude, destination.longitude);
            match self.directions {
                Outcome::Ok => Ok(vec![line(o, d, true), line(d, o, false)]),
                Outcome::Empty => Err(MapsError::NoRoute { mode }),
                Outcome::Denied => Err(MapsError::InvalidCredential {
                    endpoint: Endpoint::Directions,
                    message: None,
                }),
                Outcome::Failed => Err(provider_error(Endpoint::Directions)),
            }
        }

        async fn autocomplete(
            &self,
            input: &str,
            session_token: Option<&str>,
            _credential: &Credential,
        ) -> Result<Vec<Suggestion>> {
            self.calls.autocomplete.fetch_add(1, Ordering::SeqCst);
            *self.calls.last_token.lock().unwrap() = session_token.map(str::to_owned);
            match self.autocomplete {
                Outcome::Ok => Ok(vec![Suggestion {
                    place_id: "place-1".into(),
                    description: format!("{input} Street, Jakarta"),
                    main_text: format!("{input} Street"),
                }]),
                Outcome::Empty => Ok(Vec::new()),
                Outcome::Denied => Err(MapsError::InvalidCredential {
                    endpoint: Endpoint::Autocomplete,
                    message: None,
                }),
                Outcome::Failed => Err(provider_error(Endpoint::Autocomplete)),
            }
        }
    }

    fn planner(fake: FakeProvider) -> (Planner, Arc<Calls>) {
        let calls = fake.calls.clone();
        (Planner::new(Box::new(fake), &CacheConfig::default()), calls)
    }

    fn key(raw: &str) -> Credential {
        Credential::parse(raw).unwrap()
    }

    fn logged_in() -> Session {
        Session::with_credential(key("KEY"))
    }

    #[tokio::test]
    async fn empty_address_is_rejected_without_a_request() {
        let (planner, calls) = planner(FakeProvider::default());

        let err = planner.geocode("   ", &key("KEY")).await.unwrap_err();

        assert!(matches!(err, MapsError::InvalidInput(_)));
        assert_eq!(calls.geocode.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn repeated_geocode_is_served_from_memo() {
        let (planner, calls) = planner(FakeProvider::default());
        let k = key("KEY");

        let first = planner.geocode("Monas", &k).await.unwrap();
        let second = planner.geocode("Monas", &k).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.geocode.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn memo_is_not_shared_across_credentials() {
        let (planner, calls) = planner(FakeProvider::default());

        planner.geocode("Monas", &key("KEY-A")).await.unwrap();
        planner.geocode("Monas", &key("KEY-B")).await.unwrap();

        assert_eq!(calls.geocode.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_lookups_are_not_memoized() {
        let (planner, calls) = planner(FakeProvider {
            unknown: vec!["Atlantis"],
            ..Default::default()
        });
        let k = key("KEY");

        for _ in 0..2 {
            let err = planner.geocode("Atlantis", &k).await.unwrap_err();
            assert!(matches!(err, MapsError::NotFound(_)));
        }
        assert_eq!(calls.geocode.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn calculate_runs_pipeline_and_records_result() {
        let (planner, calls) = planner(FakeProvider::default());
        let mut session = logged_in();
        let request = TripRequest::new("Monas", "Kota Tua", TravelMode::Walking);

        let result = planner.calculate(&mut session, &request).await.unwrap();

        assert_eq!(result.mode, TravelMode::Walking);
        assert_eq!(result.hours_minutes(), "01:30");
        assert_eq!(result.decimal_hours(), "1.50");
        assert_eq!(result.routes.len(), 2);
        assert!(result.routes[0].is_primary);
        assert_eq!(result.routes.iter().filter(|r| r.is_primary).count(), 1);
        assert!(result.payload().ends_with(",2.50,01:30,1.50"));
        assert_eq!(session.last_result(), Some(&result));

        assert_eq!(calls.geocode.load(Ordering::SeqCst), 2);
        assert_eq!(calls.distance.load(Ordering::SeqCst), 1);
        assert_eq!(calls.directions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn calculate_requires_saved_key() {
        let (planner, calls) = planner(FakeProvider::default());
        let mut session = Session::new();

        let err = planner
            .calculate(&mut session, &TripRequest::new("a place", "b place", TravelMode::Driving))
            .await
            .unwrap_err();

        assert!(matches!(err, MapsError::InvalidInput(ref m) if m.contains("API key")));
        assert_eq!(calls.geocode.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn calculate_rejects_blank_destination() {
        let (planner, calls) = planner(FakeProvider::default());
        let mut session = logged_in();

        let err = planner
            .calculate(&mut session, &TripRequest::new("Monas", " ", TravelMode::Driving))
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Enter destination address");
        assert_eq!(calls.geocode.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failure_keeps_previous_result() {
        let (planner, calls) = planner(FakeProvider {
            unknown: vec!["Atlantis"],
            ..Default::default()
        });
        let mut session = logged_in();

        let first = planner
            .calculate(&mut session, &TripRequest::new("Monas", "Kota Tua", TravelMode::Driving))
            .await
            .unwrap();

        let err = planner
            .calculate(&mut session, &TripRequest::new("Atlantis", "Kota Tua", TravelMode::Driving))
            .await
            .unwrap_err();

        assert!(matches!(err, MapsError::NotFound(_)));
        assert_eq!(session.last_result(), Some(&first));
        // fails fast: no distance lookup for the second attempt
        assert_eq!(calls.distance.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_route_geometry_does_not_fail_calculation() {
        let (planner, _) = planner(FakeProvider {
            directions: Outcome::Empty,
            ..Default::default()
        });
        let mut session = logged_in();

        let result = planner
            .calculate(&mut session, &TripRequest::new("Monas", "Kota Tua", TravelMode::Transit))
            .await
            .unwrap();

        assert!(result.routes.is_empty());
        assert!(result.primary_route().is_none());
    }

    #[tokio::test]
    async fn directions_failures_other_than_no_route_are_terminal() {
        for outcome in [Outcome::Denied, Outcome::Failed] {
            let (planner, _) = planner(FakeProvider {
                directions: outcome,
                ..Default::default()
            });
            let mut session = logged_in();

            let err = planner
                .calculate(&mut session, &TripRequest::new("Monas", "Kota Tua", TravelMode::Driving))
                .await
                .unwrap_err();

            assert!(!err.is_expected());
            assert!(session.last_result().is_none());
        }
    }

    #[tokio::test]
    async fn login_stores_validated_key() {
        let (planner, calls) = planner(FakeProvider::default());
        let mut session = Session::new();

        planner.login(&mut session, "  AIzaKEY  ").await.unwrap();

        assert_eq!(session.credential().unwrap().expose(), "AIzaKEY");
        assert_eq!(calls.geocode.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn login_rejects_denied_key() {
        let (planner, _) = planner(FakeProvider {
            deny_geocode: true,
            ..Default::default()
        });
        let mut session = Session::new();

        let err = planner.login(&mut session, "BAD").await.unwrap_err();

        assert!(matches!(err, MapsError::InvalidCredential { .. }));
        assert!(!session.has_credential());
    }

    #[tokio::test]
    async fn probe_without_match_still_accepts_key() {
        let (planner, _) = planner(FakeProvider {
            unknown: vec![PROBE_ADDRESS],
            ..Default::default()
        });

        assert!(planner.validate_credential("KEY").await.is_ok());
    }

    #[tokio::test]
    async fn blank_key_is_rejected_without_probe() {
        let (planner, calls) = planner(FakeProvider::default());

        let err = planner.validate_credential("").await.unwrap_err();

        assert!(matches!(err, MapsError::InvalidInput(_)));
        assert_eq!(calls.geocode.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn short_suggestion_input_skips_request() {
        let (planner, calls) = planner(FakeProvider::default());
        let session = logged_in();

        assert!(planner.suggest(&session, " Jl ").await.unwrap().is_empty());
        assert_eq!(calls.autocomplete.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn suggestions_carry_session_token() {
        let (planner, calls) = planner(FakeProvider::default());
        let session = logged_in();

        let suggestions = planner.suggest(&session, "Thamrin").await.unwrap();

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].main_text, "Thamrin Street");
        assert_eq!(*calls.last_token.lock().unwrap(), Some(session.token()));
    }

    #[tokio::test]
    async fn suggestion_failures_degrade_to_empty() {
        let (planner, _) = planner(FakeProvider {
            autocomplete: Outcome::Failed,
            ..Default::default()
        });

        let suggestions = planner.suggest(&logged_in(), "Thamrin").await.unwrap();
        assert!(suggestions.is_empty());
    }

    #[tokio::test]
    async fn suggestion_credential_failure_surfaces() {
        let (planner, _) = planner(FakeProvider {
            autocomplete: Outcome::Denied,
            ..Default::default()
        });

        let err = planner.suggest(&logged_in(), "Thamrin").await.unwrap_err();
        assert!(matches!(err, MapsError::InvalidCredential { .. }));
    }
}
