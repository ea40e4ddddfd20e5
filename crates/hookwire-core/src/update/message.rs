//! Message updates.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ReplyToMessage, UpdateMeta};

/// Wire type of a message.
///
/// Unknown types collapse into [`MessageType::Unsupported`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    Image,
    Video,
    Document,
    Audio,
    Sticker,
    Reaction,
    Location,
    Contacts,
    Interactive,
    Button,
    #[serde(other)]
    Unsupported,
}

impl MessageType {
    /// Maps a wire string to a message type.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "text" => Self::Text,
            "image" => Self::Image,
            "video" => Self::Video,
            "document" => Self::Document,
            "audio" => Self::Audio,
            "sticker" => Self::Sticker,
            "reaction" => Self::Reaction,
            "location" => Self::Location,
            "contacts" => Self::Contacts,
            "interactive" => Self::Interactive,
            "button" => Self::Button,
            _ => Self::Unsupported,
        }
    }

    /// Returns the wire string of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Document => "document",
            Self::Audio => "audio",
            Self::Sticker => "sticker",
            Self::Reaction => "reaction",
            Self::Location => "location",
            Self::Contacts => "contacts",
            Self::Interactive => "interactive",
            Self::Button => "button",
            Self::Unsupported => "unsupported",
        }
    }

    /// Whether messages of this type carry a media attachment.
    pub fn is_media(&self) -> bool {
        matches!(
            self,
            Self::Image | Self::Video | Self::Document | Self::Audio | Self::Sticker
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A media attachment (image, video, document, audio or sticker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    /// Media ID used to fetch the file.
    pub id: String,
    /// SHA-256 of the file.
    #[serde(default)]
    pub sha256: String,
    /// MIME type of the file.
    #[serde(default)]
    pub mime_type: String,
    /// Original file name (documents only).
    #[serde(default)]
    pub filename: Option<String>,
    /// Whether an audio is a voice note.
    #[serde(default)]
    pub voice: Option<bool>,
    /// Whether a sticker is animated.
    #[serde(default)]
    pub animated: Option<bool>,
}

/// A reaction to an earlier message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// The message that was reacted to.
    pub message_id: String,
    /// The emoji, or `None` if the reaction was removed.
    #[serde(default)]
    pub emoji: Option<String>,
}

/// A shared location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A message received from a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Shared update fields.
    pub meta: UpdateMeta,
    /// Wire type of the message.
    pub message_type: MessageType,
    /// The message this one replies to.
    pub reply_to_message: Option<ReplyToMessage>,
    /// Whether the message was forwarded.
    pub forwarded: bool,
    /// Whether the message was forwarded many times.
    pub forwarded_many_times: bool,
    /// Body of a text message.
    pub text: Option<String>,
    /// Caption of an image, video or document.
    pub caption: Option<String>,
    /// Attachment of a media message.
    pub media: Option<Media>,
    /// Reaction details.
    pub reaction: Option<Reaction>,
    /// Location details.
    pub location: Option<Location>,
}

impl Message {
    /// The message ID.
    pub fn id(&self) -> &str {
        &self.meta.id
    }

    /// The sender's user ID.
    pub fn sender(&self) -> &str {
        &self.meta.from_user.wa_id
    }

    /// Whether the message carries a media attachment.
    pub fn has_media(&self) -> bool {
        self.media.is_some()
    }

    /// Whether the message replies to another message.
    pub fn is_reply(&self) -> bool {
        self.reply_to_message.is_some()
    }

    /// The ID a reply should quote: the reacted-to message for reactions.
    pub fn message_id_to_reply(&self) -> &str {
        match &self.reaction {
            Some(r) if self.message_type == MessageType::Reaction => &r.message_id,
            _ => &self.meta.id,
        }
    }
}
