//! House aggregate and its child entities.
//!
//! # Responsibility
//! - Define `House` and every entity it owns.
//! - Keep the wire shape stable (camelCase, epoch-millisecond timestamps).
//!
//! # Invariants
//! - `House.code` is unique across all houses in one state.
//! - Member ids are unique within a house.
//! - Bills and tasks are stored newest-first; groceries, notes, events and
//!   messages oldest-first. Display order depends on this.
//! - Collections missing from older snapshots deserialize as empty.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type HouseId = Uuid;
pub type MemberId = Uuid;
pub type GroceryItemId = Uuid;
pub type TaskId = Uuid;
pub type BillId = Uuid;
pub type NoteId = Uuid;
pub type EventId = Uuid;
pub type MessageId = Uuid;

/// A person belonging to one house.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub name: String,
}

impl Member {
    pub fn new(id: MemberId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroceryItem {
    pub id: GroceryItemId,
    pub name: String,
    pub added_by: MemberId,
    pub checked: bool,
    pub created_at: i64,
}

/// Visibility of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskScope {
    /// Only relevant to the assignee.
    Personal,
    /// Shared chore for the whole house.
    #[default]
    House,
}

impl TaskScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::House => "house",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Always set by current writers; optional only for older snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<MemberId>,
    pub created_by: MemberId,
    pub completed: bool,
    #[serde(default)]
    pub scope: TaskScope,
    pub created_at: i64,
}

/// One member's share of a bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillSplit {
    pub member_id: MemberId,
    /// Rounded to cents.
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: BillId,
    pub name: String,
    pub total: f64,
    #[serde(default)]
    pub splits: Vec<BillSplit>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletinNote {
    pub id: NoteId,
    pub text: String,
    pub author_id: MemberId,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: EventId,
    pub name: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM`, 24h.
    pub start_time: String,
    /// `HH:MM`, 24h.
    pub end_time: String,
    pub created_by: MemberId,
    /// House task created alongside this event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_task_id: Option<TaskId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub member_id: MemberId,
    pub text: String,
    pub timestamp: i64,
}

/// Shared household aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct House {
    pub id: HouseId,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub groceries: Vec<GroceryItem>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub bills: Vec<Bill>,
    #[serde(default)]
    pub notes: Vec<BulletinNote>,
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub created_at: i64,
}

impl House {
    /// Creates a house whose only member is `founder`.
    pub fn new(
        id: HouseId,
        name: impl Into<String>,
        code: impl Into<String>,
        founder: Member,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            code: code.into(),
            members: vec![founder],
            groceries: Vec::new(),
            tasks: Vec::new(),
            bills: Vec::new(),
            notes: Vec::new(),
            events: Vec::new(),
            messages: Vec::new(),
            created_at,
        }
    }

    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.iter().find(|member| member.id == id)
    }

    pub fn has_member(&self, id: MemberId) -> bool {
        self.member(id).is_some()
    }

    /// Finds a member whose name matches `name` ignoring case and surrounding
    /// whitespace.
    pub fn member_by_name(&self, name: &str) -> Option<&Member> {
        let wanted = name.trim().to_lowercase();
        self.members
            .iter()
            .find(|member| member.name.trim().to_lowercase() == wanted)
    }
}
