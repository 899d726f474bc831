//! Core location types for parktally.
//!
//! A [`LocationRecord`] holds the occupancy estimate for one parking
//! location along with the inputs of the update that produced it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The occupancy estimate for one parking location.
///
/// Field names are serialized in camelCase, which is the layout of the
/// snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    /// Unique identifier, also the registry key.
    pub location_id: String,

    /// Lot capacity. Fixed at creation; not validated.
    pub total_parking_lots: i64,

    /// Current estimate of occupied lots.
    pub estimated_parked_cars: i64,

    /// When the estimate was last refreshed.
    pub date_time_of_estimate: EstimateTime,

    /// Cars reported in by the most recent update.
    pub cars_in_since_last_estimate: i64,

    /// Cars reported out by the most recent update.
    pub cars_out_since_last_estimate: i64,
}

impl LocationRecord {
    /// Create a record with an empty estimate stamped at `now`.
    #[must_use]
    pub fn new(location_id: impl Into<String>, total_parking_lots: i64, now: DateTime<Utc>) -> Self {
        Self {
            location_id: location_id.into(),
            total_parking_lots,
            estimated_parked_cars: 0,
            date_time_of_estimate: EstimateTime::from(now),
            cars_in_since_last_estimate: 0,
            cars_out_since_last_estimate: 0,
        }
    }

    /// Apply one in/out report.
    ///
    /// The new estimate is clamped into `0..=total_parking_lots`, so
    /// over- and under-counts are absorbed silently. The raw inputs replace
    /// the previous ones rather than accumulating.
    pub fn apply_counts(&mut self, cars_in: i64, cars_out: i64, now: DateTime<Utc>) {
        let delta = cars_in.saturating_sub(cars_out);
        self.estimated_parked_cars = clamp_estimate(
            self.estimated_parked_cars.saturating_add(delta),
            self.total_parking_lots,
        );
        self.cars_in_since_last_estimate = cars_in;
        self.cars_out_since_last_estimate = cars_out;
        self.date_time_of_estimate = EstimateTime::from(now);
    }

    /// Lots not covered by the current estimate.
    #[must_use]
    pub fn available_lots(&self) -> i64 {
        self.total_parking_lots
            .saturating_sub(self.estimated_parked_cars)
    }

    /// Check that the estimate is where clamping would leave it.
    ///
    /// Always true for records produced by [`LocationRecord::apply_counts`];
    /// a hand-edited snapshot can break it.
    #[must_use]
    pub fn estimate_in_bounds(&self) -> bool {
        self.estimated_parked_cars
            == clamp_estimate(self.estimated_parked_cars, self.total_parking_lots)
    }

    /// Check if the estimate says every lot is taken.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.available_lots() <= 0
    }
}

/// Clamp `estimate` to the capacity first, then to zero.
///
/// The lower bound wins when the capacity is negative, so this never
/// panics the way `i64::clamp` would with an inverted range.
#[must_use]
pub fn clamp_estimate(estimate: i64, total_parking_lots: i64) -> i64 {
    estimate.min(total_parking_lots).max(0)
}

/// The instant of an estimate together with its stored text.
///
/// Times stamped by this process are written as ISO-8601 with millisecond
/// precision and a `Z` suffix. Text read back from a snapshot is kept as
/// it was, so untouched records are saved byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimateTime {
    instant: DateTime<Utc>,
    text: String,
}

impl EstimateTime {
    /// Parse RFC 3339 text, keeping the text verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is not a valid RFC 3339 timestamp.
    pub fn parse(text: impl Into<String>) -> Result<Self, chrono::ParseError> {
        let text = text.into();
        let instant = DateTime::parse_from_rfc3339(&text)?.with_timezone(&Utc);
        Ok(Self { instant, text })
    }

    /// The instant in UTC.
    #[must_use]
    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// The text written to the snapshot.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<DateTime<Utc>> for EstimateTime {
    fn from(instant: DateTime<Utc>) -> Self {
        Self {
            instant,
            text: timestamp::format(&instant),
        }
    }
}

impl PartialEq<DateTime<Utc>> for EstimateTime {
    fn eq(&self, other: &DateTime<Utc>) -> bool {
        self.instant == *other
    }
}

impl fmt::Display for EstimateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for EstimateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for EstimateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(text).map_err(serde::de::Error::custom)
    }
}

pub(crate) mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};

    /// ISO-8601 text with millisecond precision and a `Z` suffix.
    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
