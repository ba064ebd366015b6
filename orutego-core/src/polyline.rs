//! Decoder for the provider's encoded polyline format.
//!
//! Each coordinate is stored as a delta from the previous point, scaled by
//! 1e5, zig-zag encoded and split into 5-bit chunks (least significant first).
//! Every chunk is offset by 63 to land in printable ASCII, and all chunks but
//! the last of a value carry the 0x20 continuation bit.

use thiserror::Error;

use crate::model::Coordinates;

const PRECISION: f64 = 1e5;
const CHUNK_OFFSET: u8 = 63;
const CONTINUATION_BIT: u64 = 0x20;
const CHUNK_MASK: u64 = 0x1f;
/// Shift of the last chunk that still fits a 64-bit value.
const MAX_SHIFT: u32 = 60;
/// 90 and 180 degrees in 1e5 units.
const MAX_LATITUDE: u64 = 9_000_000;
const MAX_LONGITUDE: u64 = 18_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    #[error("invalid polyline character {character:?} at byte {position}")]
    InvalidCharacter { character: char, position: usize },

    #[error("polyline ends in the middle of a value at byte {position}")]
    Truncated { position: usize },

    #[error("polyline value starting near byte {position} is too large")]
    Overflow { position: usize },

    #[error("polyline has a latitude without a longitude")]
    UnpairedCoordinate,

    #[error("polyline point {index} lies outside valid latitude/longitude bounds")]
    OutOfRange { index: usize },
}

/// Decode an encoded polyline into an ordered list of points.
pub fn decode(encoded: &str) -> Result<Vec<Coordinates>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut points = Vec::with_capacity(bytes.len() / 4);

    while index < bytes.len() {
        lat = accumulate(lat, bytes, &mut index)?;
        if index >= bytes.len() {
            return Err(PolylineError::UnpairedCoordinate);
        }
        lng = accumulate(lng, bytes, &mut index)?;

        if lat.unsigned_abs() > MAX_LATITUDE || lng.unsigned_abs() > MAX_LONGITUDE {
            return Err(PolylineError::OutOfRange {
                index: points.len(),
            });
        }

        points.push(Coordinates::new(
            lat as f64 / PRECISION,
            lng as f64 / PRECISION,
        ));
    }

    Ok(points)
}

fn accumulate(current: i64, bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let start = *index;
    let delta = next_value(bytes, index)?;
    current
        .checked_add(delta)
        .ok_or(PolylineError::Overflow { position: start })
}

fn next_value(bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let start = *index;
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = *bytes
            .get(*index)
            .ok_or(PolylineError::Truncated { position: *index })?;

        if !(CHUNK_OFFSET..=126).contains(&byte) {
            return Err(PolylineError::InvalidCharacter {
                character: byte as char,
                position: *index,
            });
        }

        let chunk = u64::from(byte - CHUNK_OFFSET);
        let bits = chunk & CHUNK_MASK;
        // only four bits of the last chunk fit in 64
        if shift > MAX_SHIFT || (shift == MAX_SHIFT && bits > 0xf) {
            return Err(PolylineError::Overflow { position: start });
        }

        *index += 1;
        result |= bits << shift;
        shift += 5;

        if chunk & CONTINUATION_BIT == 0 {
            break;
        }
    }

    // zig-zag: low bit carries the sign
    let magnitude = (result >> 1) as i64;
    Ok(if result & 1 != 0 { !magnitude } else { magnitude })
}
