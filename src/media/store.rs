//! Filesystem media store.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::event::{MediaAttachment, MediaKind};

use super::{MediaError, MediaExtractor};

/// Number of hex digits of the content hash used in file names.
const NAME_HASH_LEN: usize = 16;

/// Persists decrypted attachment bytes under the storage root.
///
/// Files are content-addressed: `{root}/{kind}-{sha256 prefix}.{ext}`, so
/// extracting the same media twice yields the same path.
///
/// # Atomic Writes
///
/// Bytes go to a uniquely named temporary file in the target directory,
/// which is then renamed into place. A receiver never observes a
/// half-written file at the announced path, and concurrent extractions of
/// the same media each persist their own complete copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileMediaStore;

impl FileMediaStore {
    /// Creates a new store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the target path for `media` without writing anything.
    #[must_use]
    pub fn target_path(
        storage_root: &Path,
        kind: MediaKind,
        digest: &str,
        media: &MediaAttachment,
    ) -> PathBuf {
        let prefix = &digest[..NAME_HASH_LEN.min(digest.len())];
        storage_root.join(format!("{kind}-{prefix}.{}", extension_for(kind, media)))
    }

    async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), MediaError> {
        let write_err = |source| MediaError::Write {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&dir).await.map_err(write_err)?;

        let target = path.to_path_buf();
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || persist_in(&dir, &target, &data))
            .await
            .map_err(io::Error::other)
            .and_then(|written| written)
            .map_err(write_err)
    }
}

/// Writes `data` to a fresh temporary file inside `dir` and renames it onto
/// `target`.
fn persist_in(dir: &Path, target: &Path, data: &[u8]) -> io::Result<()> {
    let mut temp = tempfile::Builder::new()
        .prefix(".media-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(target).map_err(|err| err.error)?;
    Ok(())
}

impl MediaExtractor for FileMediaStore {
    async fn extract(
        &self,
        storage_root: &Path,
        kind: MediaKind,
        media: &MediaAttachment,
    ) -> Result<String, MediaError> {
        let data = media.data.as_deref().ok_or(MediaError::MissingData)?;
        let digest = hex::encode(Sha256::digest(data));

        if let Some(expected) = media.file_sha256.as_deref() {
            if !expected.eq_ignore_ascii_case(&digest) {
                return Err(MediaError::ChecksumMismatch {
                    expected: expected.to_string(),
                    actual: digest,
                });
            }
        }

        let path = Self::target_path(storage_root, kind, &digest, media);
        Self::write_atomic(&path, data).await?;

        tracing::debug!("Stored {kind} ({} bytes) at {}", data.len(), path.display());
        Ok(path.display().to_string())
    }
}

/// Picks a file extension: the document's own extension if it has one,
/// otherwise one registered for the MIME type, otherwise the kind default.
fn extension_for(kind: MediaKind, media: &MediaAttachment) -> String {
    let from_name = media
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| is_safe_extension(ext));

    if let Some(ext) = from_name {
        return ext.to_ascii_lowercase();
    }

    extension_from_mime(kind, &media.mimetype)
        .unwrap_or_else(|| default_extension(kind))
        .to_string()
}

/// Looks the MIME essence up in the `mime_guess` registry.
///
/// A type usually has several registered extensions (`image/jpeg` lists
/// `jfif`, `jpe`, `jpeg`, `jpg`, ...). The kind default wins when it is one
/// of them, then an extension equal to the subtype, then the first listed.
fn extension_from_mime(kind: MediaKind, mimetype: &str) -> Option<&'static str> {
    // Parameters such as "; codecs=opus" do not affect the extension
    let essence = mimetype
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    let candidates = mime_guess::get_mime_extensions_str(&essence)?;

    let preferred = default_extension(kind);
    if let Some(ext) = candidates.iter().find(|ext| **ext == preferred) {
        return Some(*ext);
    }

    let subtype = essence.split_once('/').map(|(_, sub)| sub);
    candidates
        .iter()
        .find(|ext| Some(**ext) == subtype)
        .or_else(|| candidates.first())
        .copied()
}

const fn default_extension(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Audio => "ogg",
        MediaKind::Image => "jpg",
        MediaKind::Sticker => "webp",
        MediaKind::Video => "mp4",
        MediaKind::Document => "bin",
    }
}

fn is_safe_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric())
}
