//! Callback updates: button clicks and list selections.

use super::{ReplyToMessage, UpdateMeta};

/// A click on a reply button or a quick-reply template button.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackButton {
    /// Shared update fields.
    pub meta: UpdateMeta,
    /// The message carrying the button.
    pub reply_to_message: Option<ReplyToMessage>,
    /// Raw callback string attached to the button.
    pub data: String,
    /// Button title as shown to the user.
    pub title: String,
}

impl CallbackButton {
    /// The sender's user ID.
    pub fn sender(&self) -> &str {
        &self.meta.from_user.wa_id
    }

    /// The ID a reply should quote: the message carrying the button.
    pub fn message_id_to_reply(&self) -> &str {
        self.reply_to_message
            .as_ref()
            .map_or(&self.meta.id, |r| &r.message_id)
    }
}

/// A selection of a row in a list message.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackSelection {
    /// Shared update fields.
    pub meta: UpdateMeta,
    /// The message carrying the list.
    pub reply_to_message: Option<ReplyToMessage>,
    /// Raw callback string attached to the row.
    pub data: String,
    /// Row title.
    pub title: String,
    /// Row description.
    pub description: Option<String>,
}

impl CallbackSelection {
    /// The sender's user ID.
    pub fn sender(&self) -> &str {
        &self.meta.from_user.wa_id
    }

    /// The ID a reply should quote: the message carrying the list.
    pub fn message_id_to_reply(&self) -> &str {
        self.reply_to_message
            .as_ref()
            .map_or(&self.meta.id, |r| &r.message_id)
    }
}
