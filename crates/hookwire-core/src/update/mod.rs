//! Update model.
//!
//! Every inbound webhook event is turned into exactly one [`Update`]. The
//! variant doubles as the routing tag ([`UpdateKind`]) so the dispatcher can
//! pick a handler bucket without inspecting the payload.
//!
//! ```text
//! Update
//! ├── Message            text, media, reactions, locations, ...
//! ├── CallbackButton     reply button or quick-reply click
//! ├── CallbackSelection  list row selection
//! ├── MessageStatus      sent / delivered / read / failed
//! └── Raw                the untouched JSON payload
//! ```

mod callback;
mod message;
mod raw;
mod status;
mod webhook;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use callback::{CallbackButton, CallbackSelection};
pub use message::{Location, Media, Message, MessageType, Reaction};
pub use raw::RawUpdate;
pub use status::{MessageStatus, MessageStatusType, StatusError};

// ============================================================================
// Update Kind
// ============================================================================

/// Classification of updates, and the routing tag handlers are registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    /// Incoming user messages.
    Message,
    /// Reply button clicks.
    CallbackButton,
    /// List row selections.
    CallbackSelection,
    /// Delivery status changes of outgoing messages.
    MessageStatus,
    /// The raw payload of every webhook call.
    RawUpdate,
}

impl UpdateKind {
    /// All kinds, in routing order.
    pub const ALL: [UpdateKind; 5] = [
        UpdateKind::Message,
        UpdateKind::CallbackButton,
        UpdateKind::CallbackSelection,
        UpdateKind::MessageStatus,
        UpdateKind::RawUpdate,
    ];

    /// Returns the kind as a static string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::CallbackButton => "callback_button",
            Self::CallbackSelection => "callback_selection",
            Self::MessageStatus => "message_status",
            Self::RawUpdate => "raw_update",
        }
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "message" => Self::Message,
            "callback_button" | "button" => Self::CallbackButton,
            "callback_selection" | "selection" => Self::CallbackSelection,
            "message_status" | "status" => Self::MessageStatus,
            "raw_update" | "raw" => Self::RawUpdate,
            other => return Err(format!("unknown update kind '{other}'")),
        })
    }
}

// ============================================================================
// Shared Types
// ============================================================================

/// The business phone number an update was delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Display form of the phone number.
    pub display_phone_number: String,
    /// Platform ID of the phone number.
    pub phone_number_id: String,
}

/// A platform user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID (phone number with country code).
    pub wa_id: String,
    /// Profile name; absent on status updates.
    pub name: Option<String>,
}

/// The message an update replies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyToMessage {
    /// ID of the replied-to message.
    pub message_id: String,
    /// Sender of the replied-to message.
    pub from_user_id: String,
}

/// Fields every non-raw update carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMeta {
    /// Message ID (for statuses: the ID of the message the status is about).
    pub id: String,
    /// Receiving phone number.
    pub metadata: Metadata,
    /// Sender, or recipient for statuses.
    pub from_user: User,
    /// Unix timestamp in seconds.
    pub timestamp: i64,
}

// ============================================================================
// Update
// ============================================================================

/// An inbound event of one of the five known shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// A user message.
    Message(Message),
    /// A reply button click.
    CallbackButton(CallbackButton),
    /// A list row selection.
    CallbackSelection(CallbackSelection),
    /// A delivery status change.
    MessageStatus(MessageStatus),
    /// An unclassified payload.
    Raw(RawUpdate),
}

impl Update {
    /// Returns the routing tag of this update.
    pub fn kind(&self) -> UpdateKind {
        match self {
            Self::Message(_) => UpdateKind::Message,
            Self::CallbackButton(_) => UpdateKind::CallbackButton,
            Self::CallbackSelection(_) => UpdateKind::CallbackSelection,
            Self::MessageStatus(_) => UpdateKind::MessageStatus,
            Self::Raw(_) => UpdateKind::RawUpdate,
        }
    }

    /// Returns the raw callback string of button and selection updates.
    pub fn callback_data(&self) -> Option<&str> {
        match self {
            Self::CallbackButton(b) => Some(&b.data),
            Self::CallbackSelection(s) => Some(&s.data),
            _ => None,
        }
    }

    /// Returns the shared fields, or `None` for raw updates.
    pub fn meta(&self) -> Option<&UpdateMeta> {
        match self {
            Self::Message(m) => Some(&m.meta),
            Self::CallbackButton(b) => Some(&b.meta),
            Self::CallbackSelection(s) => Some(&s.meta),
            Self::MessageStatus(s) => Some(&s.meta),
            Self::Raw(_) => None,
        }
    }

    /// Returns the user ID this update concerns, if any.
    pub fn sender(&self) -> Option<&str> {
        self.meta().map(|m| m.from_user.wa_id.as_str())
    }

    /// Returns the inner message, if this is a message update.
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Message(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the inner button click, if this is a button update.
    pub fn as_callback_button(&self) -> Option<&CallbackButton> {
        match self {
            Self::CallbackButton(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the inner selection, if this is a selection update.
    pub fn as_callback_selection(&self) -> Option<&CallbackSelection> {
        match self {
            Self::CallbackSelection(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the inner status, if this is a status update.
    pub fn as_message_status(&self) -> Option<&MessageStatus> {
        match self {
            Self::MessageStatus(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the raw payload, if this is a raw update.
    pub fn as_raw(&self) -> Option<&RawUpdate> {
        match self {
            Self::Raw(r) => Some(r),
            _ => None,
        }
    }
}

impl From<Message> for Update {
    fn from(m: Message) -> Self {
        Self::Message(m)
    }
}

impl From<CallbackButton> for Update {
    fn from(b: CallbackButton) -> Self {
        Self::CallbackButton(b)
    }
}

impl From<CallbackSelection> for Update {
    fn from(s: CallbackSelection) -> Self {
        Self::CallbackSelection(s)
    }
}

impl From<MessageStatus> for Update {
    fn from(s: MessageStatus) -> Self {
        Self::MessageStatus(s)
    }
}

impl From<RawUpdate> for Update {
    fn from(r: RawUpdate) -> Self {
        Self::Raw(r)
    }
}
