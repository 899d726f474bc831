//! The location registry.
//!
//! [`LocationRegistry`] owns every [`LocationRecord`] and writes a full
//! snapshot through its [`SnapshotStore`] after each successful add or
//! update. Storage failures on those paths are logged and absorbed; the
//! in-memory state stays authoritative until the next successful save.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::location::LocationRecord;
use crate::storage::{snapshot, LocationMap, SnapshotStore};

/// In-memory registry of parking locations backed by snapshot storage.
#[derive(Debug)]
pub struct LocationRegistry {
    /// Records keyed by location id.
    locations: LocationMap,
    /// Where snapshots go.
    store: Box<dyn SnapshotStore>,
    /// Stamps estimates.
    clock: Box<dyn Clock>,
}

impl LocationRegistry {
    /// Create an empty registry using the system clock.
    ///
    /// Nothing is read from `store`; see [`LocationRegistry::open`].
    #[must_use]
    pub fn new(store: impl SnapshotStore + 'static) -> Self {
        Self::with_clock(store, SystemClock)
    }

    /// Create an empty registry with an explicit clock.
    #[must_use]
    pub fn with_clock(store: impl SnapshotStore + 'static, clock: impl Clock + 'static) -> Self {
        Self {
            locations: LocationMap::new(),
            store: Box::new(store),
            clock: Box::new(clock),
        }
    }

    /// Create a registry and restore it from `store`.
    ///
    /// Missing or unreadable storage yields an empty registry.
    #[must_use]
    pub fn open(store: impl SnapshotStore + 'static) -> Self {
        Self::open_with_clock(store, SystemClock)
    }

    /// Create a registry with an explicit clock and restore it from `store`.
    #[must_use]
    pub fn open_with_clock(
        store: impl SnapshotStore + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        let mut registry = Self::with_clock(store, clock);
        registry.load_data();
        registry
    }

    /// Register a new location with an empty estimate.
    ///
    /// The capacity is taken as given. A full snapshot is written on success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateLocation`] if the id is already registered.
    /// The registry is left unchanged.
    pub fn add_location(
        &mut self,
        location_id: impl Into<String>,
        total_parking_lots: i64,
    ) -> Result<&LocationRecord> {
        let location_id = location_id.into();
        if self.locations.contains_key(&location_id) {
            return Err(Error::duplicate_location(location_id));
        }

        let record = LocationRecord::new(location_id.clone(), total_parking_lots, self.clock.now());
        self.locations.insert(location_id.clone(), record);
        info!(
            "Added location \"{}\" with {} lots",
            location_id, total_parking_lots
        );

        self.save_data();
        self.get_location(&location_id)
            .ok_or_else(|| Error::internal("added location missing from registry"))
    }

    /// Apply an in/out report to a location.
    ///
    /// The estimate is clamped into `0..=total_parking_lots`; impossible
    /// inputs are absorbed rather than rejected. A full snapshot is written
    /// on success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LocationNotFound`] if the id is not registered. The
    /// registry is left unchanged.
    pub fn update_location(
        &mut self,
        location_id: &str,
        cars_in: i64,
        cars_out: i64,
    ) -> Result<&LocationRecord> {
        let now = self.clock.now();
        let record = self
            .locations
            .get_mut(location_id)
            .ok_or_else(|| Error::location_not_found(location_id))?;

        record.apply_counts(cars_in, cars_out, now);
        debug!(
            "Updated \"{}\": +{} -{} -> {}/{}",
            location_id,
            cars_in,
            cars_out,
            record.estimated_parked_cars,
            record.total_parking_lots
        );

        self.save_data();
        self.get_location(location_id)
            .ok_or_else(|| Error::internal("updated location missing from registry"))
    }

    /// Re-stamp a location without changing its estimate.
    ///
    /// Same as `update_location(location_id, 0, 0)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LocationNotFound`] if the id is not registered.
    pub fn refresh_location(&mut self, location_id: &str) -> Result<&LocationRecord> {
        self.update_location(location_id, 0, 0)
    }

    /// Look up a location.
    #[must_use]
    pub fn get_location(&self, location_id: &str) -> Option<&LocationRecord> {
        self.locations.get(location_id)
    }

    /// Lots not covered by a location's estimate, if it is registered.
    #[must_use]
    pub fn get_available_lots(&self, location_id: &str) -> Option<i64> {
        self.get_location(location_id)
            .map(LocationRecord::available_lots)
    }

    /// Check if a location is registered.
    #[must_use]
    pub fn contains_location(&self, location_id: &str) -> bool {
        self.locations.contains_key(location_id)
    }

    /// All records, ordered by id.
    pub fn locations(&self) -> impl Iterator<Item = &LocationRecord> {
        self.locations.values()
    }

    /// All registered ids, in order.
    pub fn location_ids(&self) -> impl Iterator<Item = &str> {
        self.locations.keys().map(String::as_str)
    }

    /// Number of registered locations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Check if no locations are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Where snapshots are written, for display.
    #[must_use]
    pub fn storage_location(&self) -> String {
        self.store.describe()
    }

    /// Aggregate figures across every location.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            locations: self.locations.len(),
            ..RegistryStats::default()
        };

        for record in self.locations.values() {
            stats.total_parking_lots = stats
                .total_parking_lots
                .saturating_add(record.total_parking_lots);
            stats.estimated_parked_cars = stats
                .estimated_parked_cars
                .saturating_add(record.estimated_parked_cars);
            stats.available_lots = stats.available_lots.saturating_add(record.available_lots());
            stats.latest_estimate = stats
                .latest_estimate
                .max(Some(record.date_time_of_estimate.instant()));
        }

        stats
    }

    /// Write a full snapshot, logging and absorbing any failure.
    pub fn save_data(&self) {
        match self.try_save_data() {
            Ok(()) => info!("Snapshot saved to {}", self.store.describe()),
            Err(e) => error!("Error saving snapshot to {}: {}", self.store.describe(), e),
        }
    }

    /// Write a full snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be encoded or written.
    pub fn try_save_data(&self) -> Result<()> {
        let document = snapshot::encode(&self.locations)?;
        self.store.write_document(&document)
    }

    /// Replace the registry contents with the stored snapshot.
    ///
    /// Missing storage, or storage that cannot be read or parsed, leaves the
    /// registry empty. Failures are logged, never returned.
    pub fn load_data(&mut self) {
        if let Err(e) = self.try_load_data() {
            error!(
                "Error loading snapshot from {}: {}",
                self.store.describe(),
                e
            );
            self.locations = LocationMap::new();
        }
    }

    /// Replace the registry contents with the stored snapshot.
    ///
    /// Returns the number of locations now registered. Missing storage
    /// counts as an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be read or decoded; the
    /// registry contents are then left as they were.
    pub fn try_load_data(&mut self) -> Result<usize> {
        let Some(document) = self.store.read_document()? else {
            debug!("No snapshot at {}, starting empty", self.store.describe());
            self.locations = LocationMap::new();
            return Ok(0);
        };

        self.locations = snapshot::decode(&document)?;
        info!(
            "Loaded {} locations from {}",
            self.locations.len(),
            self.store.describe()
        );
        Ok(self.locations.len())
    }
}

/// Aggregate figures across a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of registered locations.
    pub locations: usize,
    /// Sum of all capacities.
    pub total_parking_lots: i64,
    /// Sum of all estimates.
    pub estimated_parked_cars: i64,
    /// Sum of all available lots.
    pub available_lots: i64,
    /// Most recent estimate timestamp.
    pub latest_estimate: Option<DateTime<Utc>>,
}
