//! Snapshot document format.
//!
//! The snapshot is a JSON object keyed by location id, each value a
//! [`LocationRecord`]. Output is pretty-printed with 2-space indentation.

use std::collections::BTreeMap;

use tracing::warn;

use crate::error::Result;
use crate::location::LocationRecord;

/// The registry's full state, keyed by location id.
pub type LocationMap = BTreeMap<String, LocationRecord>;

/// Encode the full state as a snapshot document.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode(locations: &LocationMap) -> Result<String> {
    Ok(serde_json::to_string_pretty(locations)?)
}

/// Decode a snapshot document.
///
/// A record whose `locationId` disagrees with its key, or whose estimate
/// lies outside `0..=totalParkingLots`, is kept as stored and reported at
/// warn level. The next update clamps it.
///
/// # Errors
///
/// Returns an error if the document is not a valid snapshot.
pub fn decode(document: &str) -> Result<LocationMap> {
    let locations: LocationMap = serde_json::from_str(document)?;

    for (key, record) in &locations {
        if key != &record.location_id {
            warn!(
                "Snapshot key \"{}\" holds record for \"{}\"",
                key, record.location_id
            );
        }
        if !record.estimate_in_bounds() {
            warn!(
                "Snapshot record \"{}\" has {} parked cars for {} lots",
                key, record.estimated_parked_cars, record.total_parking_lots
            );
        }
    }

    Ok(locations)
}
