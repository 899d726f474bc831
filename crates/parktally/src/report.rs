//! Text renderings of registry state, shared by the CLI and the console.

use std::fmt::Write as _;

use crate::error::Result;
use crate::location::{timestamp, LocationRecord};
use crate::registry::{LocationRegistry, RegistryStats};

/// A record as pretty-printed JSON, in the snapshot layout.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn record_json(record: &LocationRecord) -> Result<String> {
    Ok(serde_json::to_string_pretty(record)?)
}

/// Confirmation for a newly registered location.
#[must_use]
pub fn added_line(record: &LocationRecord) -> String {
    format!(
        "Added \"{}\" with {} lots",
        record.location_id, record.total_parking_lots
    )
}

/// Occupancy summary after an update.
#[must_use]
pub fn updated_line(record: &LocationRecord) -> String {
    format!(
        "\"{}\": {}/{} parked, {} available",
        record.location_id,
        record.estimated_parked_cars,
        record.total_parking_lots,
        record.available_lots()
    )
}

/// A record as labelled lines.
#[must_use]
pub fn record_text(record: &LocationRecord) -> String {
    format!(
        "Location:       {}\n\
         Total lots:     {}\n\
         Parked (est.):  {}\n\
         Available:      {}\n\
         Last cars in:   {}\n\
         Last cars out:  {}\n\
         Estimated at:   {}",
        record.location_id,
        record.total_parking_lots,
        record.estimated_parked_cars,
        record.available_lots(),
        record.cars_in_since_last_estimate,
        record.cars_out_since_last_estimate,
        record.date_time_of_estimate,
    )
}

/// Every record as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn records_json(registry: &LocationRegistry) -> Result<String> {
    let records: Vec<&LocationRecord> = registry.locations().collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// The one-line availability summary.
#[must_use]
pub fn available_line(location_id: &str, available_lots: i64) -> String {
    format!("Available at {location_id}: {available_lots} lots")
}

/// One line per record: id, occupancy, availability and last estimate.
#[must_use]
pub fn record_table(registry: &LocationRegistry) -> String {
    if registry.is_empty() {
        return "No locations registered.".to_string();
    }

    let width = registry
        .location_ids()
        .map(str::len)
        .max()
        .unwrap_or(0)
        .max("LOCATION".len());

    let mut table = format!(
        "{:<width$}  {:>8}  {:>8}  {:>9}  {}",
        "LOCATION", "PARKED", "LOTS", "AVAILABLE", "ESTIMATED AT"
    );
    for record in registry.locations() {
        let _ = write!(
            table,
            "\n{:<width$}  {:>8}  {:>8}  {:>9}  {}",
            record.location_id,
            record.estimated_parked_cars,
            record.total_parking_lots,
            record.available_lots(),
            record.date_time_of_estimate,
        );
    }
    table
}

/// Aggregate figures as labelled lines.
#[must_use]
pub fn stats_text(stats: &RegistryStats, storage_location: &str) -> String {
    let latest = stats
        .latest_estimate
        .as_ref()
        .map_or_else(|| "never".to_string(), timestamp::format);

    format!(
        "Locations:        {}\n\
         Total lots:       {}\n\
         Estimated parked: {}\n\
         Available:        {}\n\
         Last estimate:    {}\n\
         Snapshot:         {}",
        stats.locations,
        stats.total_parking_lots,
        stats.estimated_parked_cars,
        stats.available_lots,
        latest,
        storage_location,
    )
}

/// Aggregate figures as a JSON object.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn stats_json(stats: &RegistryStats, storage_location: &str) -> Result<String> {
    let value = serde_json::json!({
        "locations": stats.locations,
        "totalParkingLots": stats.total_parking_lots,
        "estimatedParkedCars": stats.estimated_parked_cars,
        "availableLots": stats.available_lots,
        "latestEstimate": stats.latest_estimate.as_ref().map(timestamp::format),
        "snapshot": storage_location,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}
