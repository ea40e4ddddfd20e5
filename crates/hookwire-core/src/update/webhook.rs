//! Webhook payload classification.
//!
//! The wire structs below mirror the JSON body the platform posts. They are
//! private: [`Update::from_webhook`] maps them into the public update types.
//!
//! ```text
//! { "entry": [ { "changes": [ { "field": "messages", "value": {
//!     "metadata": {...}, "contacts": [...], "messages": [...] | "statuses": [...]
//! } } ] } ] }
//! ```

use serde::Deserialize;
use serde_json::Value;

use super::{
    CallbackButton, CallbackSelection, Location, Media, Message, MessageStatus, MessageType,
    Metadata, Reaction, ReplyToMessage, StatusError, Update, UpdateMeta, User,
};
use crate::error::{ParseResult, UpdateParseError};

// ============================================================================
// Wire structs
// ============================================================================

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Deserialize)]
struct Entry {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Deserialize)]
struct Change {
    field: String,
    value: ChangeValue,
}

#[derive(Deserialize)]
struct ChangeValue {
    #[serde(default)]
    metadata: Option<Metadata>,
    #[serde(default)]
    contacts: Vec<WireContact>,
    #[serde(default)]
    messages: Vec<WireMessage>,
    #[serde(default)]
    statuses: Vec<WireStatus>,
}

#[derive(Deserialize)]
struct WireContact {
    wa_id: String,
    #[serde(default)]
    profile: Option<WireProfile>,
}

#[derive(Deserialize)]
struct WireProfile {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Number(i64),
    Text(String),
}

impl WireTimestamp {
    fn seconds(self) -> ParseResult<i64> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Text(s) => s
                .parse()
                .map_err(|_| UpdateParseError::InvalidTimestamp(s)),
        }
    }
}

#[derive(Deserialize)]
struct WireMessage {
    id: String,
    from: String,
    timestamp: WireTimestamp,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    context: Option<WireContext>,
    #[serde(default)]
    text: Option<WireText>,
    #[serde(default)]
    image: Option<WireMedia>,
    #[serde(default)]
    video: Option<WireMedia>,
    #[serde(default)]
    document: Option<WireMedia>,
    #[serde(default)]
    audio: Option<WireMedia>,
    #[serde(default)]
    sticker: Option<WireMedia>,
    #[serde(default)]
    reaction: Option<Reaction>,
    #[serde(default)]
    location: Option<Location>,
    #[serde(default)]
    interactive: Option<WireInteractive>,
    #[serde(default)]
    button: Option<WireQuickReply>,
}

#[derive(Deserialize)]
struct WireContext {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    forwarded: Option<bool>,
    #[serde(default)]
    frequently_forwarded: Option<bool>,
}

#[derive(Deserialize)]
struct WireText {
    body: String,
}

#[derive(Deserialize)]
struct WireMedia {
    id: String,
    #[serde(default)]
    sha256: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    voice: Option<bool>,
    #[serde(default)]
    animated: Option<bool>,
}

#[derive(Deserialize)]
struct WireInteractive {
    #[serde(default)]
    button_reply: Option<WireReply>,
    #[serde(default)]
    list_reply: Option<WireReply>,
}

#[derive(Deserialize)]
struct WireReply {
    id: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct WireQuickReply {
    payload: String,
    text: String,
}

#[derive(Deserialize)]
struct WireStatus {
    id: String,
    status: String,
    timestamp: WireTimestamp,
    recipient_id: String,
    #[serde(default)]
    errors: Vec<WireError>,
}

#[derive(Deserialize)]
struct WireError {
    code: i64,
    title: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_data: Option<WireErrorData>,
}

#[derive(Deserialize)]
struct WireErrorData {
    #[serde(default)]
    details: Option<String>,
}

// ============================================================================
// Classification
// ============================================================================

impl Update {
    /// Classifies a webhook body into a typed update.
    ///
    /// Returns `Ok(None)` for payloads that carry no message or status (for
    /// example account notifications); those only reach raw handlers.
    pub fn from_webhook(payload: &Value) -> ParseResult<Option<Update>> {
        let envelope = Envelope::deserialize(payload)?;
        let Some(change) = envelope
            .entry
            .into_iter()
            .next()
            .and_then(|e| e.changes.into_iter().next())
        else {
            return Ok(None);
        };
        if change.field != "messages" {
            return Ok(None);
        }

        let value = change.value;
        if let Some(message) = value.messages.into_iter().next() {
            let metadata = value.metadata.ok_or(UpdateParseError::Missing("metadata"))?;
            let contact = value.contacts.into_iter().next();
            return classify_message(metadata, contact, message).map(Some);
        }
        if let Some(status) = value.statuses.into_iter().next() {
            let metadata = value.metadata.ok_or(UpdateParseError::Missing("metadata"))?;
            return build_status(metadata, status).map(Some);
        }
        Ok(None)
    }
}

fn classify_message(
    metadata: Metadata,
    contact: Option<WireContact>,
    message: WireMessage,
) -> ParseResult<Update> {
    let from_user = match contact {
        Some(c) => User {
            wa_id: c.wa_id,
            name: c.profile.and_then(|p| p.name),
        },
        None => User {
            wa_id: message.from.clone(),
            name: None,
        },
    };
    let meta = UpdateMeta {
        id: message.id.clone(),
        metadata,
        from_user,
        timestamp: message.timestamp.seconds()?,
    };
    let reply_to_message = message.context.as_ref().and_then(|c| {
        Some(ReplyToMessage {
            message_id: c.id.clone()?,
            from_user_id: c.from.clone()?,
        })
    });
    let message_type = MessageType::from_wire(&message.kind);

    match message_type {
        MessageType::Interactive => {
            if let Some(interactive) = message.interactive {
                if let Some(reply) = interactive.button_reply {
                    return Ok(Update::CallbackButton(CallbackButton {
                        meta,
                        reply_to_message,
                        data: reply.id,
                        title: reply.title,
                    }));
                }
                if let Some(reply) = interactive.list_reply {
                    return Ok(Update::CallbackSelection(CallbackSelection {
                        meta,
                        reply_to_message,
                        data: reply.id,
                        title: reply.title,
                        description: reply.description,
                    }));
                }
            }
            Ok(Update::Message(plain_message(
                meta,
                message_type,
                reply_to_message,
                message.context,
                None,
                None,
                None,
                None,
            )))
        }
        MessageType::Button if message.button.is_some() => {
            let button = message.button.ok_or(UpdateParseError::Missing("button"))?;
            Ok(Update::CallbackButton(CallbackButton {
                meta,
                reply_to_message,
                data: button.payload,
                title: button.text,
            }))
        }
        _ => {
            let media = message
                .image
                .or(message.video)
                .or(message.document)
                .or(message.audio)
                .or(message.sticker);
            let (media, caption) = match media {
                Some(m) => (
                    Some(Media {
                        id: m.id,
                        sha256: m.sha256,
                        mime_type: m.mime_type,
                        filename: m.filename,
                        voice: m.voice,
                        animated: m.animated,
                    }),
                    m.caption,
                ),
                None => (None, None),
            };
            let mut built = plain_message(
                meta,
                message_type,
                reply_to_message,
                message.context,
                message.text.map(|t| t.body),
                media,
                message.reaction,
                message.location,
            );
            built.caption = caption;
            Ok(Update::Message(built))
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn plain_message(
    meta: UpdateMeta,
    message_type: MessageType,
    reply_to_message: Option<ReplyToMessage>,
    context: Option<WireContext>,
    text: Option<String>,
    media: Option<Media>,
    reaction: Option<Reaction>,
    location: Option<Location>,
) -> Message {
    let (forwarded, forwarded_many_times) = context.map_or((false, false), |c| {
        let many = c.frequently_forwarded.unwrap_or(false);
        (c.forwarded.unwrap_or(false) || many, many)
    });
    Message {
        meta,
        message_type,
        reply_to_message,
        forwarded,
        forwarded_many_times,
        text,
        caption: None,
        media,
        reaction,
        location,
    }
}

fn build_status(metadata: Metadata, status: WireStatus) -> ParseResult<Update> {
    let status_type = status.status.parse()?;
    let error = status.errors.into_iter().next().map(|e| StatusError {
        code: e.code,
        title: e.title,
        details: e.error_data.and_then(|d| d.details).or(e.message),
    });
    Ok(Update::MessageStatus(MessageStatus {
        meta: UpdateMeta {
            id: status.id,
            metadata,
            from_user: User {
                wa_id: status.recipient_id,
                name: None,
            },
            timestamp: status.timestamp.seconds()?,
        },
        status: status_type,
        error,
    }))
}
