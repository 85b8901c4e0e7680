//! Notification feed entries.
//!
//! Entries are immutable once emitted except for `is_read`.

use crate::model::house::HouseId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type NotificationId = Uuid;

/// Feed category, serialized as `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Bill,
    Grocery,
    Task,
    Event,
    Message,
    Note,
    Member,
    Delete,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bill => "bill",
            Self::Grocery => "grocery",
            Self::Task => "task",
            Self::Event => "event",
            Self::Message => "message",
            Self::Note => "note",
            Self::Member => "member",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// House the triggering command touched. Absent in older snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_id: Option<HouseId>,
    pub title: String,
    pub message: String,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
    #[serde(default)]
    pub is_read: bool,
}
