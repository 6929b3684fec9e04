//! Messaging-platform events consumed by the relay.
//!
//! An [`Event`] is either an incoming [`MessageEvent`] or a delivery/read
//! [`ReceiptEvent`]. The types derive serde so the event source can hand
//! them over as JSON (one object per line, tagged by `kind`).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single event produced by the messaging client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// An incoming (or self-sent) message.
    Message(MessageEvent),
    /// A delivery or read acknowledgment.
    Receipt(ReceiptEvent),
}

impl Event {
    /// Returns the payload `event_type` for this variant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Receipt(_) => "receipt",
        }
    }
}

impl From<MessageEvent> for Event {
    fn from(message: MessageEvent) -> Self {
        Self::Message(message)
    }
}

impl From<ReceiptEvent> for Event {
    fn from(receipt: ReceiptEvent) -> Self {
        Self::Receipt(receipt)
    }
}

/// A message event.
///
/// Every field except `timestamp` may be empty; the payload builder only
/// emits fields that carry a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Source JID (chat or sender), e.g. `123@s.whatsapp.net`.
    #[serde(default)]
    pub source: String,

    /// Sender display name.
    #[serde(default)]
    pub push_name: String,

    /// Time the message was sent.
    pub timestamp: DateTime<Utc>,

    /// Message identity and text.
    #[serde(default)]
    pub info: MessageInfo,

    /// Reaction carried by this message, if it is a reaction.
    #[serde(default)]
    pub reaction: Option<Reaction>,

    /// Whether the message is a "view once" message.
    #[serde(default)]
    pub view_once: bool,

    /// Whether the message was forwarded.
    #[serde(default)]
    pub forwarded: bool,

    /// Media or structured content attached to the message.
    #[serde(default)]
    pub content: MessageContent,
}

impl MessageEvent {
    /// Creates a message event with only a source and timestamp set.
    #[must_use]
    pub fn new(source: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            source: source.into(),
            push_name: String::new(),
            timestamp,
            info: MessageInfo::default(),
            reaction: None,
            view_once: false,
            forwarded: false,
            content: MessageContent::default(),
        }
    }
}

/// Identity and text of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageInfo {
    /// Message ID assigned by the platform.
    pub id: String,
    /// Plain or extended text body.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    /// ID of the message being replied to.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub replied_id: String,
    /// Text of the quoted message.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub quoted_message: String,
}

/// A reaction to another message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reaction {
    /// Reaction body (usually a single emoji). Empty means "reaction removed".
    #[serde(rename = "message")]
    pub text: String,
    /// ID of the message reacted to.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
}

/// Content sub-objects a message may carry.
///
/// The platform delivers at most one in practice; when several are set the
/// payload builder honours the order of [`MessageContent::first`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageContent {
    pub audio: Option<MediaAttachment>,
    pub contact: Option<ContactMessage>,
    pub document: Option<MediaAttachment>,
    pub image: Option<MediaAttachment>,
    pub list: Option<ListMessage>,
    pub live_location: Option<LiveLocationMessage>,
    pub location: Option<LocationMessage>,
    pub order: Option<OrderMessage>,
    pub sticker: Option<MediaAttachment>,
    pub video: Option<MediaAttachment>,
}

/// Borrowed view of the content selected for a payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContentRef<'a> {
    /// Binary media that must be extracted to storage.
    Media(MediaKind, &'a MediaAttachment),
    Contact(&'a ContactMessage),
    List(&'a ListMessage),
    LiveLocation(&'a LiveLocationMessage),
    Location(&'a LocationMessage),
    Order(&'a OrderMessage),
}

impl ContentRef<'_> {
    /// Payload key the content is emitted under.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Media(kind, _) => kind.as_str(),
            Self::Contact(_) => "contact",
            Self::List(_) => "list",
            Self::LiveLocation(_) => "live_location",
            Self::Location(_) => "location",
            Self::Order(_) => "order",
        }
    }
}

impl MessageContent {
    /// Returns the highest-priority content present.
    ///
    /// Priority: audio, contact, document, image, list, live location,
    /// location, order, sticker, video.
    #[must_use]
    pub fn first(&self) -> Option<ContentRef<'_>> {
        media(MediaKind::Audio, self.audio.as_ref())
            .or_else(|| self.contact.as_ref().map(ContentRef::Contact))
            .or_else(|| media(MediaKind::Document, self.document.as_ref()))
            .or_else(|| media(MediaKind::Image, self.image.as_ref()))
            .or_else(|| self.list.as_ref().map(ContentRef::List))
            .or_else(|| self.live_location.as_ref().map(ContentRef::LiveLocation))
            .or_else(|| self.location.as_ref().map(ContentRef::Location))
            .or_else(|| self.order.as_ref().map(ContentRef::Order))
            .or_else(|| media(MediaKind::Sticker, self.sticker.as_ref()))
            .or_else(|| media(MediaKind::Video, self.video.as_ref()))
    }

    /// Returns true if no content is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first().is_none()
    }
}

fn media(kind: MediaKind, attachment: Option<&MediaAttachment>) -> Option<ContentRef<'_>> {
    attachment.map(|m| ContentRef::Media(kind, m))
}

/// Kinds of binary media that are extracted to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Document,
    Image,
    Sticker,
    Video,
}

impl MediaKind {
    /// Lowercase name, also used as the payload key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Image => "image",
            Self::Sticker => "sticker",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A binary media attachment as handed over by the messaging client.
///
/// `data` holds the already-decrypted bytes when the client downloaded
/// them; extractors decide what to do when it is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaAttachment {
    /// MIME type, e.g. `image/jpeg` or `audio/ogg; codecs=opus`.
    pub mimetype: String,
    /// Original file name (documents only).
    pub file_name: Option<String>,
    /// Caption text.
    pub caption: Option<String>,
    /// Hex-encoded SHA-256 of the plaintext, when known.
    pub file_sha256: Option<String>,
    /// Decrypted media bytes.
    pub data: Option<Vec<u8>>,
}

/// A shared contact card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactMessage {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vcard: String,
}

/// A static location pin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocationMessage {
    pub degrees_latitude: f64,
    pub degrees_longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A live location share.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiveLocationMessage {
    pub degrees_latitude: f64,
    pub degrees_longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_in_meters: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_in_mps: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<i64>,
}

/// An interactive list message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListMessage {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub button_text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<ListSection>,
}

/// A titled group of rows in a [`ListMessage`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListSection {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<ListRow>,
}

/// A selectable row in a [`ListSection`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListRow {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub row_id: String,
}

/// A business order message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderMessage {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_jid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount_1000: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_currency_code: Option<String>,
}

/// A delivery/read acknowledgment for one or more messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptEvent {
    /// IDs of the acknowledged messages.
    #[serde(default)]
    pub message_ids: Vec<String>,
    /// JID of the party that sent the receipt.
    #[serde(default)]
    pub sender: String,
    /// Time the receipt was issued.
    pub timestamp: DateTime<Utc>,
    /// Receipt kind as reported by the platform.
    #[serde(default, rename = "type")]
    pub receipt_type: ReceiptType,
}

/// Receipt kinds reported by the platform.
///
/// Wire names follow the platform's own spelling; an empty string means
/// "delivered". Unrecognized names are kept verbatim in [`ReceiptType::Other`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReceiptType {
    #[default]
    Delivered,
    Read,
    ReadSelf,
    Played,
    Sender,
    Retry,
    Other(String),
}

impl ReceiptType {
    /// Platform wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::ReadSelf => "read-self",
            Self::Played => "played",
            Self::Sender => "sender",
            Self::Retry => "retry",
            Self::Other(name) => name,
        }
    }

    /// Value emitted in the payload `type` field.
    ///
    /// Only read and delivered receipts are distinguished; everything else
    /// is reported as `"unknown"`.
    #[must_use]
    pub const fn payload_name(&self) -> &'static str {
        match self {
            Self::Read | Self::ReadSelf => "read",
            Self::Delivered => "delivered",
            _ => "unknown",
        }
    }
}

impl From<&str> for ReceiptType {
    fn from(name: &str) -> Self {
        match name {
            "" | "delivered" => Self::Delivered,
            "read" => Self::Read,
            "read-self" => Self::ReadSelf,
            "played" => Self::Played,
            "sender" => Self::Sender,
            "retry" => Self::Retry,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ReceiptType {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<ReceiptType> for String {
    fn from(receipt_type: ReceiptType) -> Self {
        match receipt_type {
            ReceiptType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ReceiptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
