//! Message status updates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::UpdateMeta;
use crate::error::UpdateParseError;

/// Delivery state of an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatusType {
    Sent,
    Delivered,
    Read,
    Failed,
}

impl MessageStatusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for MessageStatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatusType {
    type Err = UpdateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "read" => Ok(Self::Read),
            "failed" => Ok(Self::Failed),
            other => Err(UpdateParseError::UnknownStatus(other.to_string())),
        }
    }
}

/// Platform error reported with a failed status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusError {
    /// Numeric error code.
    pub code: i64,
    /// Short error title.
    pub title: String,
    /// Longer explanation, when provided.
    #[serde(default)]
    pub details: Option<String>,
}

/// A status change of a message sent by the business.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageStatus {
    /// Shared update fields; `from_user` is the recipient.
    pub meta: UpdateMeta,
    /// The new status.
    pub status: MessageStatusType,
    /// Error details, present for failed messages.
    pub error: Option<StatusError>,
}

impl MessageStatus {
    /// ID of the message the status refers to.
    pub fn message_id(&self) -> &str {
        &self.meta.id
    }

    /// Whether delivery failed.
    pub fn is_failed(&self) -> bool {
        self.status == MessageStatusType::Failed
    }
}
