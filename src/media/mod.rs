//! Media extraction layer.
//!
//! Binary attachments (audio, documents, images, stickers, videos) are not
//! embedded in webhook payloads. Instead a [`MediaExtractor`] persists them
//! under a storage root and the payload carries the resulting path.
//!
//! - [`MediaExtractor`]: the collaborator trait the payload builder calls
//! - [`FileMediaStore`]: filesystem implementation

mod error;
mod store;


use std::path::Path;

use crate::event::{MediaAttachment, MediaKind};

pub use error::MediaError;
pub use store::FileMediaStore;

/// Persists a media attachment and returns where it was stored.
///
/// Implementations own the download/decode details; callers treat the
/// returned string as opaque and only forward it.
pub trait MediaExtractor: Send + Sync {
    /// Extracts `media` of the given `kind` below `storage_root`.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError`] if the media cannot be obtained or persisted.
    fn extract(
        &self,
        storage_root: &Path,
        kind: MediaKind,
        media: &MediaAttachment,
    ) -> impl std::future::Future<Output = Result<String, MediaError>> + Send;
}
