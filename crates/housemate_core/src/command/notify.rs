//! Notification templates.
//!
//! # Responsibility
//! - Turn a command's effect into one human-readable feed entry.
//! - Truncate summaries so the feed stays compact.
//!
//! # Invariants
//! - `message` never exceeds `SUMMARY_MAX_CHARS` characters plus the ellipsis.
//! - Notification id and timestamp come from the command stamp.

use crate::ids::Stamp;
use crate::model::house::{HouseId, TaskScope};
use crate::model::notification::{Notification, NotificationKind};
use crate::model::state::HouseholdState;

pub const SUMMARY_MAX_CHARS: usize = 50;
const ELLIPSIS: &str = "...";

/// Notification content before it is stamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl NotificationDraft {
    fn new(kind: NotificationKind, title: String, message: impl AsRef<str>) -> Self {
        Self {
            kind,
            title,
            message: summarize(message.as_ref()),
        }
    }

    pub fn into_notification(self, stamp: Stamp, house_id: Option<HouseId>) -> Notification {
        Notification {
            id: stamp.derive("notification"),
            kind: self.kind,
            house_id,
            title: self.title,
            message: self.message,
            timestamp: stamp.at_ms,
            is_read: false,
        }
    }
}

/// Prepends the stamped draft to the feed.
pub(crate) fn emit(
    state: &mut HouseholdState,
    draft: NotificationDraft,
    stamp: Stamp,
    house_id: HouseId,
) {
    state
        .notifications
        .insert(0, draft.into_notification(stamp, Some(house_id)));
}

/// Trims `text` and cuts it to `SUMMARY_MAX_CHARS` characters.
pub fn summarize(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= SUMMARY_MAX_CHARS {
        return trimmed.to_string();
    }
    let mut summary: String = trimmed.chars().take(SUMMARY_MAX_CHARS).collect();
    summary.push_str(ELLIPSIS);
    summary
}

pub fn house_created(user: &str, house: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationKind::Member,
        "New house created".to_string(),
        format!("{user} created {house}"),
    )
}

pub fn member_joined(user: &str, house: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationKind::Member,
        "New house member joined".to_string(),
        format!("{user} joined {house}"),
    )
}

pub fn grocery_added(actor: &str, item: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationKind::Grocery,
        format!("{actor} added a grocery item"),
        item,
    )
}

/// `now_checked` is the state after the toggle.
pub fn grocery_toggled(actor: &str, item: &str, now_checked: bool) -> NotificationDraft {
    let verb = if now_checked { "checked off" } else { "unchecked" };
    NotificationDraft::new(
        NotificationKind::Grocery,
        format!("{actor} {verb} a grocery item"),
        item,
    )
}

/// `assignee` is set only when the task went to someone other than the actor.
pub fn task_added(
    actor: &str,
    title: &str,
    scope: TaskScope,
    assignee: Option<&str>,
) -> NotificationDraft {
    let message = match assignee {
        Some(name) => format!("{title} (assigned to {name})"),
        None => title.to_string(),
    };
    NotificationDraft::new(
        NotificationKind::Task,
        format!("{actor} added a {} task", scope.as_str()),
        message,
    )
}

pub fn task_toggled(actor: &str, title: &str, now_completed: bool) -> NotificationDraft {
    let verb = if now_completed { "completed" } else { "reopened" };
    NotificationDraft::new(
        NotificationKind::Task,
        format!("{actor} {verb} a task"),
        title,
    )
}

pub fn bill_added(actor: &str, name: &str, total: f64) -> NotificationDraft {
    NotificationDraft::new(
        NotificationKind::Bill,
        format!("{actor} added a new bill"),
        format!("{name} - ${total:.2}"),
    )
}

pub fn bill_removed(actor: &str, name: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationKind::Delete,
        format!("{actor} removed a bill"),
        name,
    )
}

pub fn note_added(actor: &str, text: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationKind::Note,
        format!("{actor} posted a note"),
        text,
    )
}

pub fn note_removed(actor: &str, text: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationKind::Delete,
        format!("{actor} removed a note"),
        text,
    )
}

pub fn event_added(actor: &str, name: &str, date: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationKind::Event,
        format!("{actor} added a calendar event"),
        format!("{name} on {date}"),
    )
}

pub fn message_sent(actor: &str, text: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationKind::Message,
        format!("{actor} sent a message"),
        text,
    )
}

pub fn member_removed(actor: &str, member: &str) -> NotificationDraft {
    NotificationDraft::new(
        NotificationKind::Delete,
        format!("{actor} removed a housemate"),
        member,
    )
}
