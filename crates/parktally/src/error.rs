//! Error types for parktally.
//!
//! Registry errors (`DuplicateLocation`, `LocationNotFound`) are returned to
//! callers. Storage errors are produced by the snapshot layer and are
//! normally absorbed by the registry's best-effort save and load paths.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for parktally operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Registry Errors ===
    /// A location with this id is already registered.
    #[error("location with id \"{location_id}\" already exists")]
    DuplicateLocation {
        /// The id that was already taken.
        location_id: String,
    },

    /// No location with this id is registered.
    #[error("location with id \"{location_id}\" not found")]
    LocationNotFound {
        /// The id that was looked up.
        location_id: String,
    },

    // === Storage Errors ===
    /// Failed to read the snapshot document.
    #[error("failed to read snapshot at {path}: {source}")]
    StorageRead {
        /// Path to the snapshot file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the snapshot document.
    #[error("failed to write snapshot at {path}: {source}")]
    StorageWrite {
        /// Path to the snapshot file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The snapshot document could not be encoded or decoded.
    #[error("malformed snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system or stream operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for parktally operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a duplicate location error.
    #[must_use]
    pub fn duplicate_location(location_id: impl Into<String>) -> Self {
        Self::DuplicateLocation {
            location_id: location_id.into(),
        }
    }

    /// Create a location not found error.
    #[must_use]
    pub fn location_not_found(location_id: impl Into<String>) -> Self {
        Self::LocationNotFound {
            location_id: location_id.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error reports an already registered location.
    #[must_use]
    pub fn is_duplicate_location(&self) -> bool {
        matches!(self, Self::DuplicateLocation { .. })
    }

    /// Check if this error reports an unknown location.
    #[must_use]
    pub fn is_location_not_found(&self) -> bool {
        matches!(self, Self::LocationNotFound { .. })
    }

    /// Check if this error came from the snapshot storage layer.
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Self::StorageRead { .. }
                | Self::StorageWrite { .. }
                | Self::DirectoryCreate { .. }
                | Self::Snapshot(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_location_display() {
        let err = Error::duplicate_location("Marina Square");
        assert_eq!(
            err.to_string(),
            "location with id \"Marina Square\" already exists"
        );
    }

    #[test]
    fn test_location_not_found_display() {
        let err = Error::location_not_found("Bugis");
        assert_eq!(err.to_string(), "location with id \"Bugis\" not found");
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::duplicate_location("a").is_duplicate_location());
        assert!(!Error::duplicate_location("a").is_location_not_found());
        assert!(Error::location_not_found("a").is_location_not_found());
        assert!(!Error::location_not_found("a").is_storage_error());
    }

    #[test]
    fn test_storage_errors_are_classified() {
        let err = Error::StorageWrite {
            path: PathBuf::from("/tmp/parkingData.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.is_storage_error());

        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.is_storage_error());
        assert!(err.to_string().contains("/root/forbidden"));
    }

    #[test]
    fn test_storage_read_error_display() {
        let err = Error::StorageRead {
            path: PathBuf::from("/data/parkingData.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/data/parkingData.json"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Snapshot(_)));
            assert!(err.is_storage_error());
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
        assert!(!err.is_storage_error());
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "data_path must name a file".to_string(),
        };
        assert!(err.to_string().contains("data_path"));
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }
}
