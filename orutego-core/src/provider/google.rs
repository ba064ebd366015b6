//! Google Maps Platform web-service client.
//!
//! Every endpoint answers HTTP 200 with a JSON body whose `status` field
//! carries the real outcome, so status mapping happens after decoding.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    config::ProviderConfig,
    error::{Endpoint, MapsError, Result},
    model::{
        BoundingBox, Coordinates, DistanceResult, GeoResult, Route, Suggestion, TravelMode,
    },
    polyline,
    session::Credential,
};

use super::MapsProvider;

#[derive(Debug, Clone)]
pub struct GoogleMapsProvider {
    http: Client,
    base_url: String,
    geocode_timeout: Duration,
    route_timeout: Duration,
}

impl GoogleMapsProvider {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: &ProviderConfig) -> std::result::Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(concat!("orutego/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            geocode_timeout: config.geocode_timeout(),
            route_timeout: config.route_timeout(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        path: &str,
        params: &[(&str, &str)],
        credential: &Credential,
        timeout: Duration,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%endpoint, ?timeout, "sending provider request");

        // without_url(): the query string carries the key
        let transport = |source: reqwest::Error| MapsError::Transport {
            endpoint,
            source: source.without_url(),
        };

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", credential.expose())])
            .timeout(timeout)
            .send()
            .await
            .map_err(&transport)?;

        let status = res.status();
        let body = res.text().await.map_err(&transport)?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(%endpoint, %status, "provider rejected credential");
            return Err(MapsError::InvalidCredential {
                endpoint,
                message: Some(truncate_body(&body)),
            });
        }

        if !status.is_success() {
            tracing::warn!(%endpoint, %status, "provider HTTP error");
            return Err(MapsError::Provider {
                endpoint,
                status: format!("HTTP {}", status.as_u16()),
                message: Some(truncate_body(&body)),
            });
        }

        serde_json::from_str(&body).map_err(|e| MapsError::MalformedResponse {
            endpoint,
            reason: e.to_string(),
        })
    }
}

/// Outcomes of the `status` field that are not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiStatus {
    Ok,
    ZeroResults,
    NotFound,
}

fn check_status(
    endpoint: Endpoint,
    status: &str,
    error_message: Option<String>,
) -> Result<ApiStatus> {
    match status {
        "OK" => Ok(ApiStatus::Ok),
        "ZERO_RESULTS" => Ok(ApiStatus::ZeroResults),
        "NOT_FOUND" => Ok(ApiStatus::NotFound),
        "REQUEST_DENIED" => {
            tracing::warn!(%endpoint, "provider denied request");
            Err(MapsError::InvalidCredential {
                endpoint,
                message: error_message,
            })
        }
        other => {
            tracing::warn!(%endpoint, status = other, "provider returned error status");
            Err(MapsError::Provider {
                endpoint,
                status: other.to_owned(),
                message: error_message,
            })
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct GLatLng {
    lat: f64,
    lng: f64,
}

impl From<GLatLng> for Coordinates {
    fn from(p: GLatLng) -> Self {
        Coordinates::new(p.lat, p.lng)
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    location: GLatLng,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<DmRow>,
}

#[derive(Debug, Deserialize)]
struct DmRow {
    elements: Vec<DmElement>,
}

#[derive(Debug, Deserialize)]
struct DmElement {
    status: String,
    distance: Option<DmTextValue>,
    duration: Option<DmTextValue>,
}

#[derive(Debug, Deserialize)]
struct DmTextValue {
    text: String,
    value: u64,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<DirRoute>,
}

#[derive(Debug, Deserialize)]
struct DirRoute {
    bounds: DirBounds,
    overview_polyline: DirPolyline,
}

#[derive(Debug, Deserialize)]
struct DirBounds {
    northeast: GLatLng,
    southwest: GLatLng,
}

#[derive(Debug, Deserialize)]
struct DirPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    place_id: String,
    description: String,
    structured_formatting: StructuredFormatting,
}

#[derive(Debug, Deserialize)]
struct StructuredFormatting {
    main_text: String,
}

fn build_routes(routes: Vec<DirRoute>) -> Result<Vec<Route>> {
    routes
        .into_iter()
        .enumerate()
        .map(|(i, route)| {
            let points = polyline::decode(&route.overview_polyline.points).map_err(|e| {
                MapsError::MalformedResponse {
                    endpoint: Endpoint::Directions,
                    reason: format!("route {i}: {e}"),
                }
            })?;

            if points.len() < 2 {
                return Err(MapsError::MalformedResponse {
                    endpoint: Endpoint::Directions,
                    reason: format!("route {i} has {} point(s), expected at least 2", points.len()),
                });
            }

            Ok(Route {
                points,
                bounding_box: BoundingBox {
                    southwest: route.bounds.southwest.into(),
                    northeast: route.bounds.northeast.into(),
                },
                is_primary: i == 0,
            })
        })
        .collect()
}

#[async_trait]
impl MapsProvider for GoogleMapsProvider {
    async fn geocode(&self, address: &str, credential: &Credential) -> Result<GeoResult> {
        let parsed: GeocodeResponse = self
            .get_json(
                Endpoint::Geocode,
                "/geocode/json",
                &[("address", address)],
                credential,
                self.geocode_timeout,
            )
            .await?;

        match check_status(Endpoint::Geocode, &parsed.status, parsed.error_message)? {
            ApiStatus::Ok => {}
            ApiStatus::ZeroResults | ApiStatus::NotFound => {
                return Err(MapsError::NotFound(address.to_owned()));
            }
        }

        // the provider's ranking is authoritative
        let first = parsed
            .results
            .into_iter()
            .next()
            .ok_or_else(|| MapsError::NotFound(address.to_owned()))?;

        Ok(GeoResult {
            latitude: first.geometry.location.lat,
            longitude: first.geometry.location.lng,
            formatted_address: first.formatted_address,
        })
    }

    async fn distance(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: TravelMode,
        credential: &Credential,
    ) -> Result<DistanceResult> {
        let origins = origin.to_string();
        let destinations = destination.to_string();

        let parsed: DistanceMatrixResponse = self
            .get_json(
                Endpoint::DistanceMatrix,
                "/distancematrix/json",
                &[
                    ("origins", origins.as_str()),
                    ("destinations", destinations.as_str()),
                    ("mode", mode.as_str()),
                    ("units", "metric"),
                ],
                credential,
                self.route_timeout,
            )
            .await?;

        let not_found = || MapsError::NotFound(format!("{origins} to {destinations}"));
        match check_status(Endpoint::DistanceMatrix, &parsed.status, parsed.error_message)? {
            ApiStatus::Ok => {}
            ApiStatus::ZeroResults => return Err(MapsError::NoRoute { mode }),
            ApiStatus::NotFound => return Err(not_found()),
        }

        let element = parsed
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.elements.into_iter().next())
            .ok_or_else(|| MapsError::MalformedResponse {
                endpoint: Endpoint::DistanceMatrix,
                reason: "response has no rows[0].elements[0]".to_string(),
            })?;

        match check_status(Endpoint::DistanceMatrix, &element.status, None)? {
            ApiStatus::Ok => {}
            ApiStatus::ZeroResults => return Err(MapsError::NoRoute { mode }),
            ApiStatus::NotFound => return Err(not_found()),
        }

        match (element.distance, element.duration) {
            (Some(distance), Some(duration)) => Ok(DistanceResult {
                distance_meters: distance.value,
                distance_text: distance.text,
                duration_seconds: duration.value,
                duration_text: duration.text,
            }),
            _ => Err(MapsError::MalformedResponse {
                endpoint: Endpoint::DistanceMatrix,
                reason: "OK element without distance or duration".to_string(),
            }),
        }
    }

    async fn directions(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: TravelMode,
        credential: &Credential,
    ) -> Result<Vec<Route>> {
        let origin_param = origin.to_string();
        let destination_param = destination.to_string();

        let parsed: DirectionsResponse = self
            .get_json(
                Endpoint::Directions,
                "/directions/json",
                &[
                    ("origin", origin_param.as_str()),
                    ("destination", destination_param.as_str()),
                    ("mode", mode.as_str()),
                    ("alternatives", "true"),
                ],
                credential,
                self.route_timeout,
            )
            .await?;

        match check_status(Endpoint::Directions, &parsed.status, parsed.error_message)? {
            ApiStatus::Ok if !parsed.routes.is_empty() => {}
            ApiStatus::Ok | ApiStatus::ZeroResults => return Err(MapsError::NoRoute { mode }),
            ApiStatus::NotFound => {
                return Err(MapsError::NotFound(format!(
                    "{origin_param} to {destination_param}"
                )));
            }
        }

        let routes = build_routes(parsed.routes)?;
        tracing::debug!(count = routes.len(), %mode, "decoded routes");
        Ok(routes)
    }

    async fn autocomplete(
        &self,
        input: &str,
        session_token: Option<&str>,
        credential: &Credential,
    ) -> Result<Vec<Suggestion>> {
        let mut params = vec![("input", input), ("types", "address")];
        if let Some(token) = session_token {
            params.push(("sessiontoken", token));
        }

        let parsed: AutocompleteResponse = self
            .get_json(
                Endpoint::Autocomplete,
                "/place/autocomplete/json",
                &params,
                credential,
                self.geocode_timeout,
            )
            .await?;

        match check_status(Endpoint::Autocomplete, &parsed.status, parsed.error_message)? {
            ApiStatus::Ok => {}
            ApiStatus::ZeroResults | ApiStatus::NotFound => return Ok(Vec::new()),
        }

        Ok(parsed
            .predictions
            .into_iter()
            .map(|p| Suggestion {
                place_id: p.place_id,
                description: p.description,
                main_text: p.structured_formatting.main_text,
            })
            .collect())
    }
}
