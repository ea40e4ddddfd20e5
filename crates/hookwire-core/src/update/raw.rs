//! Raw updates.

use std::ops::Deref;

use serde_json::Value;

/// The untouched webhook payload.
///
/// Raw handlers receive one of these for every webhook call, including
/// payloads no typed update could be built from.
#[derive(Debug, Clone, PartialEq)]
pub struct RawUpdate {
    payload: Value,
}

impl RawUpdate {
    /// Wraps a payload.
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }

    /// Returns the payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Consumes the wrapper and returns the payload.
    pub fn into_payload(self) -> Value {
        self.payload
    }

    /// The `field` of the first change, e.g. `"messages"`.
    pub fn field(&self) -> Option<&str> {
        self.payload
            .pointer("/entry/0/changes/0/field")
            .and_then(Value::as_str)
    }
}

impl Deref for RawUpdate {
    type Target = Value;

    fn deref(&self) -> &Self::Target {
        &self.payload
    }
}

impl From<Value> for RawUpdate {
    fn from(payload: Value) -> Self {
        Self::new(payload)
    }
}
