//! Command set and pure state transitions.
//!
//! # Responsibility
//! - Define the closed set of commands the store accepts.
//! - Validate raw presentation input before any mutation.
//! - Apply a command to a snapshot, producing the next snapshot and its
//!   notification in one step.
//!
//! # Invariants
//! - `reducer::apply` is deterministic: ids and timestamps come only from the
//!   command `Stamp`.
//! - A command either fully applies or leaves the snapshot untouched.

use crate::ids::Stamp;
use crate::model::house::{BillId, GroceryItemId, MemberId, NoteId, TaskId, TaskScope};
use crate::model::notification::NotificationId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod notify;
pub mod reducer;

pub use reducer::{apply, replay, round_to_cents, split_evenly, Transition};

pub type CommandResult<T> = Result<T, CommandError>;

/// Raw input for a calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    pub name: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM`.
    pub start_time: String,
    /// `HH:MM`.
    pub end_time: String,
}

/// Every state transition the store supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandKind {
    CreateHouse {
        house_name: String,
        user_name: String,
        /// Pre-generated against the state the command is built from.
        code: String,
    },
    JoinHouse {
        code: String,
        user_name: String,
    },
    AddGrocery {
        name: String,
    },
    ToggleGrocery {
        item_id: GroceryItemId,
    },
    AddTask {
        title: String,
        assignee: Option<MemberId>,
        scope: TaskScope,
    },
    ToggleTask {
        task_id: TaskId,
    },
    AddBill {
        name: String,
        total: f64,
        member_ids: Vec<MemberId>,
    },
    RemoveBill {
        bill_id: BillId,
    },
    AddNote {
        text: String,
    },
    RemoveNote {
        note_id: NoteId,
    },
    AddEvent(EventInput),
    AddMessage {
        text: String,
    },
    SetActiveMember {
        member_id: MemberId,
    },
    ClearActiveHouse,
    DeleteMember {
        member_id: MemberId,
    },
    MarkNotificationRead {
        notification_id: NotificationId,
    },
    ClearAllNotifications,
    /// Drops chat messages at least `ttl_ms` old relative to the stamp.
    ExpireMessages {
        ttl_ms: i64,
    },
}

impl CommandKind {
    /// Stable name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateHouse { .. } => "create_house",
            Self::JoinHouse { .. } => "join_house",
            Self::AddGrocery { .. } => "add_grocery",
            Self::ToggleGrocery { .. } => "toggle_grocery",
            Self::AddTask { .. } => "add_task",
            Self::ToggleTask { .. } => "toggle_task",
            Self::AddBill { .. } => "add_bill",
            Self::RemoveBill { .. } => "remove_bill",
            Self::AddNote { .. } => "add_note",
            Self::RemoveNote { .. } => "remove_note",
            Self::AddEvent(_) => "add_event",
            Self::AddMessage { .. } => "add_message",
            Self::SetActiveMember { .. } => "set_active_member",
            Self::ClearActiveHouse => "clear_active_house",
            Self::DeleteMember { .. } => "delete_member",
            Self::MarkNotificationRead { .. } => "mark_notification_read",
            Self::ClearAllNotifications => "clear_all_notifications",
            Self::ExpireMessages { .. } => "expire_messages",
        }
    }
}

/// A command plus the stamp captured when it was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub stamp: Stamp,
    pub kind: CommandKind,
}

impl Command {
    pub fn new(stamp: Stamp, kind: CommandKind) -> Self {
        Self { stamp, kind }
    }
}

/// Validation failure; the snapshot is left untouched.
///
/// `Display` output is meant to be shown to the user as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// Required text input was empty after trimming.
    BlankField(&'static str),
    /// Code has the wrong length or uses symbols outside the alphabet.
    InvalidHouseCode(String),
    /// Pre-generated code collides with an existing house.
    HouseCodeTaken(String),
    HouseNotFound(String),
    /// Command needs an acting member but none is selected.
    NoActiveSelection,
    MemberNotFound(MemberId),
    InvalidAmount(f64),
    InvalidDate(String),
    InvalidTime(String),
    InvalidTimeRange { start: String, end: String },
}

impl CommandError {
    /// Short machine-readable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BlankField(_) => "blank_field",
            Self::InvalidHouseCode(_) => "invalid_house_code",
            Self::HouseCodeTaken(_) => "house_code_taken",
            Self::HouseNotFound(_) => "house_not_found",
            Self::NoActiveSelection => "no_active_selection",
            Self::MemberNotFound(_) => "member_not_found",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InvalidDate(_) => "invalid_date",
            Self::InvalidTime(_) => "invalid_time",
            Self::InvalidTimeRange { .. } => "invalid_time_range",
        }
    }
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} cannot be empty"),
            Self::InvalidHouseCode(_) => write!(f, "House code must be 6 characters."),
            Self::HouseCodeTaken(code) => write!(f, "house code {code} is already in use"),
            Self::HouseNotFound(_) => write!(f, "House code not found"),
            Self::NoActiveSelection => write!(f, "join or create a house first"),
            Self::MemberNotFound(id) => write!(f, "housemate not found: {id}"),
            Self::InvalidAmount(value) => {
                write!(f, "bill total must be a positive amount, got {value}")
            }
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`; expected YYYY-MM-DD"),
            Self::InvalidTime(value) => write!(f, "invalid time `{value}`; expected HH:MM"),
            Self::InvalidTimeRange { start, end } => {
                write!(f, "event end ({end}) must not be before start ({start})")
            }
        }
    }
}

impl Error for CommandError {}
