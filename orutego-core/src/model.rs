use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::{error::MapsError, format};

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Renders as `lat,lng`, the form the provider accepts in queries.
impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Bicycling,
    Transit,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Transit => "transit",
        }
    }

    pub const fn all() -> &'static [TravelMode] {
        &[
            TravelMode::Driving,
            TravelMode::Walking,
            TravelMode::Bicycling,
            TravelMode::Transit,
        ]
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = MapsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lower = value.trim().to_lowercase();

        match lower.as_str() {
            "driving" => Ok(TravelMode::Driving),
            "walking" => Ok(TravelMode::Walking),
            "bicycling" | "cycling" => Ok(TravelMode::Bicycling),
            "transit" => Ok(TravelMode::Transit),
            _ => Err(MapsError::InvalidInput(format!(
                "unknown travel mode '{value}'; expected one of: driving, walking, bicycling, transit"
            ))),
        }
    }
}

/// One user-triggered calculation: two free-text addresses and a mode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TripRequest {
    pub origin: String,
    pub destination: String,
    pub mode: TravelMode,
}

impl TripRequest {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>, mode: TravelMode) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            mode,
        }
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.origin, &mut self.destination);
    }
}

/// First match returned by the geocoder for an address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoResult {
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: String,
}

impl GeoResult {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Distance and duration for a single origin/destination pair, in provider units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceResult {
    pub distance_meters: u64,
    pub distance_text: String,
    pub duration_seconds: u64,
    pub duration_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub southwest: Coordinates,
    pub northeast: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub points: Vec<Coordinates>,
    pub bounding_box: BoundingBox,
    pub is_primary: bool,
}

/// Address autocomplete candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub place_id: String,
    pub description: String,
    pub main_text: String,
}

/// Everything one calculation produces. Held by the session until the next
/// successful calculation or logout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub origin: GeoResult,
    pub destination: GeoResult,
    pub mode: TravelMode,
    pub distance: DistanceResult,
    pub routes: Vec<Route>,
    pub calculated_at: DateTime<Utc>,
}

impl CalculationResult {
    pub fn distance_km(&self) -> f64 {
        format::meters_to_km(self.distance.distance_meters)
    }

    pub fn hours_minutes(&self) -> String {
        format::to_hours_minutes(self.distance.duration_seconds)
    }

    pub fn decimal_hours(&self) -> String {
        format::to_decimal_hours(self.distance.duration_seconds)
    }

    pub fn primary_route(&self) -> Option<&Route> {
        self.routes.iter().find(|r| r.is_primary)
    }

    /// The copyable `lat1,lng1,lat2,lng2,km,HH:MM,hours` line.
    pub fn payload(&self) -> String {
        format::compose_payload(
            self.origin.coordinates(),
            self.destination.coordinates(),
            self.distance_km(),
            &self.hours_minutes(),
            &self.decimal_hours(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geo(lat: f64, lng: f64, name: &str) -> GeoResult {
        GeoResult {
            latitude: lat,
            longitude: lng,
            formatted_address: name.to_string(),
        }
    }

    #[test]
    fn travel_mode_as_str_roundtrip() {
        for mode in TravelMode::all() {
            let parsed: TravelMode = mode.as_str().parse().expect("roundtrip should succeed");
            assert_eq!(*mode, parsed);
        }
    }

    #[test]
    fn travel_mode_accepts_cycling_alias_and_case() {
        assert_eq!("Cycling".parse::<TravelMode>().unwrap(), TravelMode::Bicycling);
        assert_eq!(" WALKING ".parse::<TravelMode>().unwrap(), TravelMode::Walking);
    }

    #[test]
    fn unknown_travel_mode_is_invalid_input() {
        let err = "teleport".parse::<TravelMode>().unwrap_err();
        assert!(matches!(err, MapsError::InvalidInput(_)));
        assert!(err.to_string().contains("teleport"));
    }

    #[test]
    fn coordinates_render_as_query_pair() {
        assert_eq!(Coordinates::new(-6.2, 106.816666).to_string(), "-6.2,106.816666");
    }

    #[test]
    fn calculation_result_derives_display_fields() {
        let result = CalculationResult {
            origin: geo(-6.2, 106.8, "Jakarta"),
            destination: geo(-6.9, 107.6, "Bandung"),
            mode: TravelMode::Driving,
            distance: DistanceResult {
                distance_meters: 150_250,
                distance_text: "150 km".into(),
                duration_seconds: 9900,
                duration_text: "2 hours 45 mins".into(),
            },
            routes: vec![],
            calculated_at: Utc::now(),
        };

        assert_eq!(result.hours_minutes(), "02:45");
        assert_eq!(result.decimal_hours(), "2.75");
        assert_eq!(result.payload(), "-6.2,106.8,-6.9,107.6,150.25,02:45,2.75");
        assert!(result.primary_route().is_none());
    }
}
