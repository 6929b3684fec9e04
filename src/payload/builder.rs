//! Event to payload conversion.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::event::{ContentRef, Event, MessageEvent, ReceiptEvent};
use crate::media::MediaExtractor;

use super::{BuildError, Payload};

/// Converts events into [`Payload`]s.
///
/// The builder performs no network I/O itself. Its only side effect is the
/// call into the [`MediaExtractor`] for binary attachments.
///
/// # Example
///
/// ```
/// use wa_relay::event::ReceiptEvent;
/// use wa_relay::payload::PayloadBuilder;
///
/// let receipt = ReceiptEvent {
///     message_ids: vec!["ABC".into()],
///     sender: "123@s.whatsapp.net".into(),
///     timestamp: chrono::Utc::now(),
///     receipt_type: "read".into(),
/// };
///
/// let payload = PayloadBuilder::<wa_relay::media::FileMediaStore>::build_receipt(&receipt);
/// assert_eq!(payload.get("type").unwrap(), "read");
/// ```
#[derive(Debug, Clone)]
pub struct PayloadBuilder<M> {
    extractor: M,
    identity: String,
    storage_root: PathBuf,
}

impl<M> PayloadBuilder<M> {
    /// Creates a builder.
    ///
    /// `identity` is the relay's own JID, used to compute `from_me`;
    /// `storage_root` is where binary media is extracted to.
    #[must_use]
    pub fn new(
        extractor: M,
        identity: impl Into<String>,
        storage_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            extractor,
            identity: identity.into(),
            storage_root: storage_root.into(),
        }
    }

    /// Returns the media extractor.
    #[must_use]
    pub const fn extractor(&self) -> &M {
        &self.extractor
    }

    /// Returns the configured own identity.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Returns the media storage root.
    #[must_use]
    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Builds the payload for a receipt event.
    ///
    /// Receipts carry no media, so this cannot fail.
    #[must_use]
    pub fn build_receipt(receipt: &ReceiptEvent) -> Payload {
        let mut payload = Payload::new("receipt");

        payload.insert_list("message_ids", &receipt.message_ids);
        payload.insert_non_empty("sender", &receipt.sender);
        payload.insert("type", receipt.receipt_type.payload_name());
        payload.insert("timestamp", format_timestamp(&receipt.timestamp));

        payload
    }
}

impl<M: MediaExtractor> PayloadBuilder<M> {
    /// Builds the payload for any event variant.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the event is a message whose attachment
    /// cannot be extracted.
    pub async fn build(&self, event: &Event) -> Result<Payload, BuildError> {
        match event {
            Event::Message(message) => self.build_message(message).await,
            Event::Receipt(receipt) => Ok(Self::build_receipt(receipt)),
        }
    }

    /// Builds the payload for a message event.
    ///
    /// Only the highest-priority content object is included. Binary media is
    /// replaced by the path returned from the extractor.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Media`] as soon as extraction fails; no payload
    /// is produced in that case.
    pub async fn build_message(&self, message: &MessageEvent) -> Result<Payload, BuildError> {
        let mut payload = Payload::new("message");

        if !message.source.is_empty() {
            payload.insert("from", message.source.as_str());
            payload.insert("from_me", is_from_me(&message.source, &self.identity));
        }
        if !message.info.id.is_empty() {
            payload.insert("message", encode("message", &message.info)?);
        }
        payload.insert_non_empty("pushname", &message.push_name);
        if let Some(reaction) = message.reaction.as_ref().filter(|r| !r.text.is_empty()) {
            payload.insert("reaction", encode("reaction", reaction)?);
        }
        payload.insert_flag("view_once", message.view_once);
        payload.insert_flag("forwarded", message.forwarded);
        payload.insert("timestamp", format_timestamp(&message.timestamp));

        if let Some(content) = message.content.first() {
            let value = self.content_value(content, &message.source).await?;
            payload.insert(content.key(), value);
        }

        Ok(payload)
    }

    async fn content_value(
        &self,
        content: ContentRef<'_>,
        source: &str,
    ) -> Result<Value, BuildError> {
        let key = content.key();
        match content {
            ContentRef::Media(kind, media) => {
                let path = self
                    .extractor
                    .extract(&self.storage_root, kind, media)
                    .await
                    .map_err(|source_err| {
                        tracing::error!("Failed to download {kind} from {source}: {source_err}");
                        BuildError::Media {
                            kind,
                            source: source_err,
                        }
                    })?;
                Ok(Value::String(path))
            }
            ContentRef::Contact(contact) => encode(key, contact),
            ContentRef::List(list) => encode(key, list),
            ContentRef::LiveLocation(live) => encode(key, live),
            ContentRef::Location(location) => encode(key, location),
            ContentRef::Order(order) => encode(key, order),
        }
    }
}

/// Returns true if `source` refers to the same account as `identity`.
///
/// Both are compared by their user part, so device suffixes and servers
/// (`123:4@s.whatsapp.net` vs `123@s.whatsapp.net`) do not matter. An empty
/// identity never matches.
#[must_use]
pub fn is_from_me(source: &str, identity: &str) -> bool {
    let own = user_part(identity);
    !own.is_empty() && user_part(source) == own
}

fn user_part(jid: &str) -> &str {
    let user = jid.split('@').next().unwrap_or_default();
    user.split(':').next().unwrap_or_default().trim()
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn encode<T: Serialize>(key: &'static str, value: &T) -> Result<Value, BuildError> {
    serde_json::to_value(value).map_err(|source| BuildError::Content { key, source })
}
