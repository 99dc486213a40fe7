//! Notification payload.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::NotifyError;

/// Title of the notification sent when new workable shifts are found.
pub const SHIFTS_TITLE: &str = "New workable shifts";

/// Title of the notification sent when a run fails.
pub const FAILURE_TITLE: &str = "shiftwatch: uncaught error";

/// The message delivered to every subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub ok: bool,
    pub title: String,
    pub time: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shifts: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Notification {
    /// A successful notification listing newly found shifts.
    pub fn shifts<T: Serialize>(time: DateTime<FixedOffset>, shifts: &T) -> Result<Self, NotifyError> {
        Ok(Self {
            ok: true,
            title: SHIFTS_TITLE.to_string(),
            time,
            shifts: Some(serde_json::to_value(shifts)?),
            error: None,
        })
    }

    /// A diagnostic notification describing a failed run.
    pub fn failure(time: DateTime<FixedOffset>, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            title: FAILURE_TITLE.to_string(),
            time,
            shifts: None,
            error: Some(error.into()),
        }
    }

    /// Serialized payload as sent over the wire.
    pub fn to_bytes(&self) -> Result<Vec<u8>, NotifyError> {
        Ok(serde_json::to_vec(self)?)
    }
}
