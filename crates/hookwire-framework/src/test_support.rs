//! Update fixtures for unit tests.

use hookwire_core::{
    CallbackButton, CallbackSelection, Message, MessageStatus, MessageStatusType, MessageType,
    Metadata, RawUpdate, Update, UpdateMeta, User,
};

fn meta(id: &str) -> UpdateMeta {
    UpdateMeta {
        id: id.to_string(),
        metadata: Metadata {
            display_phone_number: "15550000000".into(),
            phone_number_id: "100".into(),
        },
        from_user: User {
            wa_id: "16505551234".into(),
            name: Some("Alice".into()),
        },
        timestamp: 1_690_000_000,
    }
}

pub fn message(text: &str) -> Update {
    Update::Message(Message {
        meta: meta("wamid.message"),
        message_type: MessageType::Text,
        reply_to_message: None,
        forwarded: false,
        forwarded_many_times: false,
        text: Some(text.to_string()),
        caption: None,
        media: None,
        reaction: None,
        location: None,
    })
}

pub fn button(data: &str) -> Update {
    Update::CallbackButton(CallbackButton {
        meta: meta("wamid.button"),
        reply_to_message: None,
        data: data.to_string(),
        title: "Button".into(),
    })
}

pub fn selection(data: &str) -> Update {
    Update::CallbackSelection(CallbackSelection {
        meta: meta("wamid.selection"),
        reply_to_message: None,
        data: data.to_string(),
        title: "Row".into(),
        description: None,
    })
}

pub fn status(status: MessageStatusType) -> Update {
    Update::MessageStatus(MessageStatus {
        meta: meta("wamid.status"),
        status,
        error: None,
    })
}

pub fn raw() -> Update {
    Update::Raw(RawUpdate::new(serde_json::json!({ "object": "whatsapp_business_account" })))
}
