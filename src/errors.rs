//! Unified error type for the nightlight backend.
//!
//! Every fallible operation in [`crate::core`] returns [`Result`]. Variants are grouped so
//! callers can tell apart "not found", "conflict", "invalid input", "broken invariant" and
//! "a collaborator failed" without inspecting messages.

use sea_orm::DbErr;
use thiserror::Error;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or is incomplete
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// A storage-layer error
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Filesystem error outside of the blob store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No nightline with this name
    #[error("Nightline '{name}' not found")]
    NightlineNotFound {
        /// Requested nightline name
        name: String,
    },

    /// No status with this name
    #[error("Status '{name}' not found")]
    StatusNotFound {
        /// Requested status name
        name: String,
    },

    /// No configuration row for the (nightline, status) pair
    #[error("No status configuration for nightline '{nightline}' and status '{status}'")]
    ConfigNotFound {
        /// Nightline name
        nightline: String,
        /// Status name
        status: String,
    },

    /// No story slide bound to the (nightline, status) pair
    #[error("No story slide for status '{status}' of nightline '{nightline}'")]
    StorySlideNotFound {
        /// Nightline name
        nightline: String,
        /// Status name
        status: String,
    },

    /// The nightline has no external account configured
    #[error("No Instagram account configured for nightline '{nightline}'")]
    InstagramAccountNotFound {
        /// Nightline name
        nightline: String,
    },

    /// The nightline has no API key
    #[error("No API key found for nightline '{nightline}'")]
    ApiKeyNotFound {
        /// Nightline name
        nightline: String,
    },

    /// A nightline with this name already exists
    #[error("Nightline '{name}' already exists")]
    NightlineAlreadyExists {
        /// Conflicting name
        name: String,
    },

    /// A status with this name already exists
    #[error("Status '{name}' already exists")]
    StatusAlreadyExists {
        /// Conflicting name
        name: String,
    },

    /// The nightline already has an external account
    #[error("Instagram account already exists for nightline '{nightline}'")]
    InstagramAccountAlreadyExists {
        /// Nightline name
        nightline: String,
    },

    /// The status cannot be removed while nightlines point at it
    #[error("Status '{name}' is still in use by: {}", nightlines.join(", "))]
    StatusInUse {
        /// Status name
        name: String,
        /// Names of nightlines currently set to this status
        nightlines: Vec<String>,
    },

    /// Malformed or disallowed input, rejected before touching storage
    #[error("Invalid input: {message}")]
    Validation {
        /// Human-readable reason
        message: String,
    },

    /// Stored data violates an invariant (e.g. a missing configuration row)
    #[error("Data integrity violation: {message}")]
    InvariantViolation {
        /// Description of the anomaly
        message: String,
    },

    /// The blob store failed to read, write or remove a file
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the failure
        message: String,
    },

    /// The external story platform rejected or did not answer a request
    #[error("Story publisher error: {message}")]
    StoryPublisher {
        /// Description of the failure
        message: String,
    },

    /// The story was deleted remotely but clearing the local media id failed
    #[error(
        "Story '{media_id}' of nightline '{nightline}' was deleted remotely but could not be cleared locally"
    )]
    StoryDeletedNotRecorded {
        /// Nightline name
        nightline: String,
        /// Media id that is no longer live
        media_id: String,
    },

    /// Encrypting or decrypting a stored credential failed
    #[error("Crypto error: {message}")]
    Crypto {
        /// Description of the failure
        message: String,
    },
}

impl Error {
    /// Shorthand for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True for every "entity absent" variant.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NightlineNotFound { .. }
                | Self::StatusNotFound { .. }
                | Self::ConfigNotFound { .. }
                | Self::StorySlideNotFound { .. }
                | Self::InstagramAccountNotFound { .. }
                | Self::ApiKeyNotFound { .. }
        )
    }

    /// True for every duplicate-key variant.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::NightlineAlreadyExists { .. }
                | Self::StatusAlreadyExists { .. }
                | Self::InstagramAccountAlreadyExists { .. }
        )
    }

    /// True when a collaborator outside the database failed.
    #[must_use]
    pub const fn is_external(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::StoryPublisher { .. } | Self::StoryDeletedNotRecorded { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
