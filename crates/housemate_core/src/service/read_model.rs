//! Read-only projections over household snapshots.
//!
//! # Responsibility
//! - Derive what presentation surfaces display: dashboard counts, task
//!   partitions, calendar ordering, bill shares, live chat messages.
//! - Resolve weak member references defensively.
//!
//! # Invariants
//! - Projections never mutate state and never fail; unresolved member ids
//!   render as `FORMER_MEMBER_PLACEHOLDER`.

use crate::model::house::{Bill, CalendarEvent, ChatMessage, House, HouseId, MemberId, Task};
use crate::model::notification::Notification;
use crate::model::state::HouseholdState;

pub const FORMER_MEMBER_PLACEHOLDER: &str = "Former housemate";

/// Name of `member_id` in `house`, or the placeholder when they left.
pub fn member_display_name(house: &House, member_id: MemberId) -> &str {
    house
        .member(member_id)
        .map_or(FORMER_MEMBER_PLACEHOLDER, |member| member.name.as_str())
}

/// Dashboard counters for one viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HouseSummary {
    pub member_count: usize,
    pub open_tasks: usize,
    /// Open tasks assigned to the viewer.
    pub my_open_tasks: usize,
    /// Unchecked grocery items.
    pub groceries_to_buy: usize,
    pub bill_count: usize,
}

pub fn house_summary(house: &House, viewer: MemberId) -> HouseSummary {
    let open = || house.tasks.iter().filter(|task| !task.completed);
    HouseSummary {
        member_count: house.members.len(),
        open_tasks: open().count(),
        my_open_tasks: open()
            .filter(|task| task.assigned_to == Some(viewer))
            .count(),
        groceries_to_buy: house.groceries.iter().filter(|item| !item.checked).count(),
        bill_count: house.bills.len(),
    }
}

/// Tasks assigned to `member`, newest first.
pub fn my_tasks(house: &House, member: MemberId) -> Vec<&Task> {
    house
        .tasks
        .iter()
        .filter(|task| task.assigned_to == Some(member))
        .collect()
}

/// Tasks assigned to anyone else (or nobody), newest first.
pub fn house_tasks(house: &House, member: MemberId) -> Vec<&Task> {
    house
        .tasks
        .iter()
        .filter(|task| task.assigned_to != Some(member))
        .collect()
}

/// Events ordered by date, then start time.
pub fn upcoming_events(house: &House) -> Vec<&CalendarEvent> {
    let mut events: Vec<&CalendarEvent> = house.events.iter().collect();
    events.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.start_time.cmp(&b.start_time))
    });
    events
}

/// Events on `date` (`YYYY-MM-DD`), in insertion order.
pub fn events_on<'a>(house: &'a House, date: &str) -> Vec<&'a CalendarEvent> {
    let date = date.trim();
    house
        .events
        .iter()
        .filter(|event| event.date == date)
        .collect()
}

/// Amount `member` owes on `bill`, if they are part of the split.
pub fn bill_share(bill: &Bill, member: MemberId) -> Option<f64> {
    bill.splits
        .iter()
        .find(|split| split.member_id == member)
        .map(|split| split.amount)
}

/// Messages younger than `ttl_ms` at `now_ms`; all messages when `ttl_ms`
/// is `None`.
pub fn visible_messages(house: &House, now_ms: i64, ttl_ms: Option<i64>) -> Vec<&ChatMessage> {
    house
        .messages
        .iter()
        .filter(|message| match ttl_ms {
            Some(ttl) => now_ms.saturating_sub(message.timestamp) < ttl,
            None => true,
        })
        .collect()
}

pub fn unread_notification_count(state: &HouseholdState) -> usize {
    state
        .notifications
        .iter()
        .filter(|notification| !notification.is_read)
        .count()
}

/// Feed entries emitted for one house, newest first.
pub fn house_notifications(state: &HouseholdState, house_id: HouseId) -> Vec<&Notification> {
    state
        .notifications
        .iter()
        .filter(|notification| notification.house_id == Some(house_id))
        .collect()
}
