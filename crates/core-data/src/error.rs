//! Error types for the core data service
//!
//! Store and device-registry failures are translated into `CoreDataError` at
//! the boundary of each operation. A store "not found" becomes the caller's
//! own typed condition; any other store failure passes through unchanged as
//! `CoreDataError::Store`.

use std::fmt;
use thiserror::Error;

/// Kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Event,
    Reading,
    ValueDescriptor,
    Device,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Event => "event",
            Self::Reading => "reading",
            Self::ValueDescriptor => "value descriptor",
            Self::Device => "device",
        };
        f.write_str(name)
    }
}

/// Coarse classification used by the routing layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    BadRequest,
    PayloadTooLarge,
    Unavailable,
    Cancelled,
    Internal,
}

/// Failures reported by a `DataStore` implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record matched the lookup.
    #[error("Item not found")]
    NotFound,

    /// A unique index rejected the write.
    #[error("Item not unique")]
    NotUnique,

    /// The identifier is not in the store's id format.
    #[error("Invalid object id: {0}")]
    InvalidObjectId(String),

    /// Anything else the backend reports.
    #[error("Store backend failure: {0}")]
    Backend(String),
}

/// Failures reported by a `DeviceResolver` implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// The registry has no such device.
    #[error("Device not found: {reference}")]
    NotFound { reference: String },

    /// The registry could not be reached.
    #[error("Device registry unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Core data service errors
#[derive(Debug, Error)]
pub enum CoreDataError {
    /// Entity absent
    #[error("{entity} not found: {key}")]
    NotFound { entity: EntityKind, key: String },

    /// Unique-name violation on add or rename of a value descriptor
    #[error("Value descriptor name is not unique: {name}")]
    DuplicateName { name: String },

    /// Value descriptor still referenced by readings
    #[error("Value descriptor still referenced by existing readings: {name}")]
    InUse { name: String },

    /// Format string does not fit the printf specifier grammar
    #[error("Value descriptor's format string doesn't fit the required pattern: {name}")]
    InvalidFormat { name: String },

    /// Malformed id supplied to a by-id lookup
    #[error("Invalid identifier: {id}")]
    InvalidIdentifier { id: String },

    /// A reading names a value descriptor that does not exist
    #[error("Value descriptor for a reading not found: {name}")]
    ValueDescriptorMissing { name: String },

    /// Device registry unreachable
    #[error("Device registry unavailable: {reason}")]
    UpstreamUnavailable { reason: String },

    /// Query limit above the configured maximum
    #[error("Requested {requested} results, the maximum is {max}")]
    LimitExceeded { requested: usize, max: usize },

    /// Caller context cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// Notification worker stopped
    #[error("Notification pipeline closed")]
    PipelineClosed,

    /// Opaque store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl CoreDataError {
    /// Translate a store error raised while addressing one entity.
    pub fn from_store(err: StoreError, entity: EntityKind, key: &str) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound {
                entity,
                key: key.to_string(),
            },
            StoreError::InvalidObjectId(id) => Self::InvalidIdentifier { id },
            other => Self::Store(other),
        }
    }

    /// Shorthand for `NotFound`.
    pub fn not_found(entity: EntityKind, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } | Self::ValueDescriptorMissing { .. } => ErrorKind::NotFound,
            Self::DuplicateName { .. } | Self::InUse { .. } => ErrorKind::Conflict,
            Self::InvalidFormat { .. } | Self::InvalidIdentifier { .. } => ErrorKind::BadRequest,
            Self::LimitExceeded { .. } => ErrorKind::PayloadTooLarge,
            Self::UpstreamUnavailable { .. } | Self::PipelineClosed => ErrorKind::Unavailable,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Store(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to show a caller. Store failures never leak detail.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<ResolverError> for CoreDataError {
    fn from(err: ResolverError) -> Self {
        match err {
            ResolverError::NotFound { reference } => Self::NotFound {
                entity: EntityKind::Device,
                key: reference,
            },
            ResolverError::Unavailable { reason } => Self::UpstreamUnavailable { reason },
        }
    }
}

/// Result type for core data operations
pub type CoreDataResult<T> = Result<T, CoreDataError>;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_translated() {
        let err = CoreDataError::from_store(StoreError::NotFound, EntityKind::Event, "e-1");
        assert!(matches!(
            err,
            CoreDataError::NotFound {
                entity: EntityKind::Event,
                ..
            }
        ));
        assert_eq!(err.to_string(), "event not found: e-1");
    }

    #[test]
    fn test_invalid_object_id_translated() {
        let err = CoreDataError::from_store(
            StoreError::InvalidObjectId("zz".to_string()),
            EntityKind::Reading,
            "zz",
        );
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_backend_error_passes_through() {
        let err = CoreDataError::from_store(
            StoreError::Backend("socket closed".to_string()),
            EntityKind::Event,
            "e-1",
        );
        assert!(matches!(err, CoreDataError::Store(StoreError::Backend(_))));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.client_message(), "internal server error");
    }

    #[test]
    fn test_resolver_errors_translated() {
        let missing: CoreDataError = ResolverError::NotFound {
            reference: "pump-7".to_string(),
        }
        .into();
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let down: CoreDataError = ResolverError::Unavailable {
            reason: "timeout".to_string(),
        }
        .into();
        assert_eq!(down.kind(), ErrorKind::Unavailable);
        assert!(down.client_message().contains("timeout"));
    }

    #[test]
    fn test_guard_errors_are_conflicts() {
        let err = CoreDataError::InUse {
            name: "temperature".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(
            CoreDataError::LimitExceeded {
                requested: 10,
                max: 5
            }
            .kind(),
            ErrorKind::PayloadTooLarge
        );
    }
}
