//! Message types for the LINE bot API
//!
//! Inbound webhook batches, outbound send envelopes and the API acknowledgment.
//! All structs decode leniently: unknown keys are ignored and missing (or
//! `null`) keys fall back to empty values.

use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// Wire Constants
// =============================================================================

/// Channel tag required by the API for outbound messages.
pub const DEFAULT_TO_CHANNEL: i64 = 1383378250;

/// Event type for "send message".
pub const DEFAULT_EVENT_TYPE: &str = "138311608800106203";

/// Recipient type for user recipients.
pub const TO_TYPE_USER: i64 = 1;

/// Maximum serialized size of an outbound request.
pub const MAX_REQUEST_SIZE: usize = 8192;

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

// =============================================================================
// Content Type
// =============================================================================

/// Content type code carried in `contentType`.
///
/// Codes 5, 6 and 9 are reserved by the API. Any code without a variant is kept
/// in `Other`, so decoding never loses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ContentType {
    Text,
    Image,
    Video,
    Audio,
    Location,
    Sticker,
    Contact,
    Other(i64),
}

impl ContentType {
    pub fn code(self) -> i64 {
        match self {
            Self::Text => 1,
            Self::Image => 2,
            Self::Video => 3,
            Self::Audio => 4,
            Self::Location => 7,
            Self::Sticker => 8,
            Self::Contact => 10,
            Self::Other(code) => code,
        }
    }
}

impl Default for ContentType {
    fn default() -> Self {
        Self::Other(0)
    }
}

impl From<i64> for ContentType {
    fn from(code: i64) -> Self {
        match code {
            1 => Self::Text,
            2 => Self::Image,
            3 => Self::Video,
            4 => Self::Audio,
            7 => Self::Location,
            8 => Self::Sticker,
            10 => Self::Contact,
            other => Self::Other(other),
        }
    }
}

impl From<ContentType> for i64 {
    fn from(content_type: ContentType) -> Self {
        content_type.code()
    }
}

// =============================================================================
// Content
// =============================================================================

/// Payload of an event or an outbound message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Content {
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub content_type: ContentType,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub from: String,
    /// Creation time, epoch seconds
    #[serde(skip_serializing_if = "is_zero", deserialize_with = "nullable")]
    pub created_time: i64,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "nullable")]
    pub to: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub to_type: i64,
    #[serde(
        skip_serializing_if = "ContentMetadata::is_empty",
        deserialize_with = "nullable"
    )]
    pub content_metadata: ContentMetadata,
    #[serde(deserialize_with = "nullable")]
    pub text: String,
    #[serde(skip_serializing_if = "Location::is_empty", deserialize_with = "nullable")]
    pub location: Location,
}

impl Content {
    /// Text content addressed to users
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Text,
            to_type: TO_TYPE_USER,
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn is_text(&self) -> bool {
        self.content_type == ContentType::Text
    }
}

/// Metadata attached to sticker and contact content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentMetadata {
    #[serde(
        rename = "STKPKGID",
        skip_serializing_if = "String::is_empty",
        deserialize_with = "nullable"
    )]
    pub sticker_package_id: String,
    #[serde(
        rename = "STKID",
        skip_serializing_if = "String::is_empty",
        deserialize_with = "nullable"
    )]
    pub sticker_id: String,
    #[serde(
        rename = "STKVER",
        skip_serializing_if = "String::is_empty",
        deserialize_with = "nullable"
    )]
    pub sticker_version: String,
    #[serde(
        rename = "STKTXT",
        skip_serializing_if = "String::is_empty",
        deserialize_with = "nullable"
    )]
    pub sticker_text: String,
    /// MID of a shared contact
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub mid: String,
    #[serde(
        rename = "displayName",
        skip_serializing_if = "String::is_empty",
        deserialize_with = "nullable"
    )]
    pub display_name: String,
}

impl ContentMetadata {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Location attached to location content
///
/// Longitude arrives as either `longitude` or `Longitude`; both are accepted,
/// the lowercase key wins when both are present. It is always written as
/// `longitude`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawLocation")]
pub struct Location {
    pub title: String,
    pub address: String,
    pub latitude: i64,
    pub longitude: i64,
}

impl Location {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawLocation {
    #[serde(deserialize_with = "nullable")]
    title: String,
    #[serde(deserialize_with = "nullable")]
    address: String,
    #[serde(deserialize_with = "nullable")]
    latitude: i64,
    longitude: Option<i64>,
    #[serde(rename = "Longitude")]
    longitude_capitalized: Option<i64>,
}

impl From<RawLocation> for Location {
    fn from(raw: RawLocation) -> Self {
        Self {
            title: raw.title,
            address: raw.address,
            latitude: raw.latitude,
            longitude: raw
                .longitude
                .or(raw.longitude_capitalized)
                .unwrap_or_default(),
        }
    }
}

// =============================================================================
// Inbound Webhook Types
// =============================================================================

/// Webhook callback body sent by LINE
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceivedMessage {
    #[serde(rename = "result", deserialize_with = "nullable")]
    pub results: Vec<Event>,
}

impl ReceivedMessage {
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl IntoIterator for ReceivedMessage {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

/// A message or an operation notification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub from: String,
    #[serde(deserialize_with = "nullable")]
    pub from_channel: i64,
    #[serde(deserialize_with = "nullable")]
    pub to: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub to_channel: i64,
    #[serde(deserialize_with = "nullable")]
    pub event_type: String,
    #[serde(deserialize_with = "nullable")]
    pub content: Content,
}

impl Event {
    /// Who to reply to: the content sender, or the event sender when the
    /// content does not name one.
    pub fn sender(&self) -> &str {
        if self.content.from.is_empty() {
            &self.from
        } else {
            &self.content.from
        }
    }
}

// =============================================================================
// Outbound Types
// =============================================================================

/// Body posted to the events endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendingMessage {
    pub to: Vec<String>,
    pub to_channel: i64,
    pub event_type: String,
    pub content: Content,
}

impl SendingMessage {
    /// Text message to the given recipients
    pub fn text(to: Vec<String>, text: impl Into<String>) -> Self {
        Self {
            to,
            to_channel: DEFAULT_TO_CHANNEL,
            event_type: DEFAULT_EVENT_TYPE.to_string(),
            content: Content::text(text),
        }
    }
}

/// Acknowledgment returned by the events endpoint
///
/// Extra keys are ignored so API additions never break decoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Response {
    /// Per-recipient failures, kept opaque
    #[serde(deserialize_with = "nullable")]
    pub failed: Vec<serde_json::Value>,
    #[serde(deserialize_with = "nullable")]
    pub message_id: String,
    #[serde(deserialize_with = "nullable")]
    pub timestamp: f64,
    #[serde(deserialize_with = "nullable")]
    pub version: i64,
}

impl Response {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}
