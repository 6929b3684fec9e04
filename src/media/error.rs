//! Error types for media extraction.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for media extraction.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The attachment carries no bytes to persist.
    #[error("Attachment has no media data")]
    MissingData,

    /// The bytes do not match the checksum announced by the platform.
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Announced hex SHA-256
        expected: String,
        /// Computed hex SHA-256
        actual: String,
    },

    /// Writing the media file failed.
    #[error("Failed to write media file '{}': {source}", path.display())]
    Write {
        /// Target path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
