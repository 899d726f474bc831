//! `parktally` - Parking occupancy estimates with snapshot persistence
//!
//! This library keeps a registry of parking locations, applies clamped
//! car-in/car-out reports to each location's estimate, and snapshots the
//! whole registry to a JSON document after every change.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod clock;
pub mod config;
pub mod console;
pub mod error;
pub mod location;
pub mod logging;
pub mod registry;
pub mod report;
pub mod storage;
pub mod supervisor;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use location::{EstimateTime, LocationRecord};
pub use logging::init_logging;
pub use registry::{LocationRegistry, RegistryStats};
pub use storage::{JsonFileStore, MemoryStore, SnapshotStore};
