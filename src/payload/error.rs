//! Error types for payload construction.

use thiserror::Error;

use crate::event::MediaKind;
use crate::media::MediaError;

/// Error type for payload construction.
///
/// Any build error aborts the forward for that event; no partial payload
/// is ever delivered.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Media extraction failed for a binary attachment.
    #[error("Failed to download {kind}: {source}")]
    Media {
        /// Kind of the attachment being extracted
        kind: MediaKind,
        /// Underlying extraction error
        #[source]
        source: MediaError,
    },

    /// A structured content object could not be converted to JSON.
    #[error("Failed to encode {key} content: {source}")]
    Content {
        /// Payload key of the content
        key: &'static str,
        /// Underlying serialization error
        #[source]
        source: serde_json::Error,
    },
}

impl BuildError {
    /// Returns the media kind for extraction failures.
    #[must_use]
    pub const fn media_kind(&self) -> Option<MediaKind> {
        match self {
            Self::Media { kind, .. } => Some(*kind),
            Self::Content { .. } => None,
        }
    }
}
