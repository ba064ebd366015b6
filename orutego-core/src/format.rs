//! Duration formatting and the copyable payload line.
//!
//! Both duration representations are derived from raw seconds independently;
//! decimal hours are never computed from the already-floored `HH:MM` pair.

use crate::model::Coordinates;

const SECONDS_PER_HOUR: u64 = 3600;

/// `HH:MM` with the seconds component dropped. Hours widen past two digits
/// for durations of 100 hours or more.
pub fn to_hours_minutes(seconds: u64) -> String {
    let hours = seconds / SECONDS_PER_HOUR;
    let minutes = (seconds % SECONDS_PER_HOUR) / 60;
    format!("{hours:02}:{minutes:02}")
}

/// `seconds / 3600` with exactly two decimals, ties rounded half-up.
///
/// One hundredth of an hour is 36 seconds, so the rounding happens in integer
/// arithmetic and never depends on binary float representation.
pub fn to_decimal_hours(seconds: u64) -> String {
    let hundredths = seconds / 36 + u64::from(seconds % 36 >= 18);
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

pub fn meters_to_km(meters: u64) -> f64 {
    meters as f64 / 1000.0
}

/// `lat1,lng1,lat2,lng2,distanceKm,HH:MM,decimalHours`
///
/// Coordinates use the shortest decimal that round-trips, never an exponent
/// and never a trailing `.0`.
pub fn compose_payload(
    origin: Coordinates,
    destination: Coordinates,
    distance_km: f64,
    hours_minutes: &str,
    decimal_hours: &str,
) -> String {
    format!(
        "{},{},{},{},{:.2},{},{}",
        origin.latitude,
        origin.longitude,
        destination.latitude,
        destination.longitude,
        distance_km,
        hours_minutes,
        decimal_hours,
    )
}
