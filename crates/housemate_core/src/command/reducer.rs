//! Pure `(state, command) -> state'` transition function.
//!
//! # Responsibility
//! - Enforce every cross-entity rule: unique join codes, member dedup on
//!   join, bill splitting, cascading member deletion, event/task coupling.
//! - Emit exactly one notification per content mutation, in the same
//!   transition as the mutation.
//!
//! # Invariants
//! - Input snapshots are never mutated; changes go into a cloned successor.
//! - All validation runs before the successor is built.
//! - Missing target ids (toggle/remove) yield `Transition::Unchanged`.

use crate::command::notify::{self, NotificationDraft};
use crate::command::{Command, CommandError, CommandKind, CommandResult, EventInput};
use crate::ids::{is_valid_house_code, normalize_house_code, Stamp, HOUSE_CODE_LEN};
use crate::model::house::{
    Bill, BillId, BillSplit, BulletinNote, CalendarEvent, ChatMessage, GroceryItem,
    GroceryItemId, House, Member, MemberId, NoteId, Task, TaskId, TaskScope,
};
use crate::model::notification::NotificationId;
use crate::model::state::HouseholdState;
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").expect("valid date regex")
});
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("valid time regex"));

/// Result of applying one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// New snapshot, including any notification the command emitted.
    Changed(HouseholdState),
    /// Command was valid but had nothing to do.
    Unchanged,
}

impl Transition {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }
}

/// Applies `command` to `state`.
///
/// # Errors
/// Returns a `CommandError` for blank input, malformed or unknown codes,
/// missing active selection, unknown member references and malformed
/// amounts/dates. `state` is untouched in every case.
pub fn apply(state: &HouseholdState, command: &Command) -> CommandResult<Transition> {
    let stamp = command.stamp;
    match &command.kind {
        CommandKind::CreateHouse {
            house_name,
            user_name,
            code,
        } => create_house(state, stamp, house_name, user_name, code),
        CommandKind::JoinHouse { code, user_name } => join_house(state, stamp, code, user_name),
        CommandKind::AddGrocery { name } => add_grocery(state, stamp, name),
        CommandKind::ToggleGrocery { item_id } => toggle_grocery(state, stamp, *item_id),
        CommandKind::AddTask {
            title,
            assignee,
            scope,
        } => add_task(state, stamp, title, *assignee, *scope),
        CommandKind::ToggleTask { task_id } => toggle_task(state, stamp, *task_id),
        CommandKind::AddBill {
            name,
            total,
            member_ids,
        } => add_bill(state, stamp, name, *total, member_ids),
        CommandKind::RemoveBill { bill_id } => remove_bill(state, stamp, *bill_id),
        CommandKind::AddNote { text } => add_note(state, stamp, text),
        CommandKind::RemoveNote { note_id } => remove_note(state, stamp, *note_id),
        CommandKind::AddEvent(input) => add_event(state, stamp, input),
        CommandKind::AddMessage { text } => add_message(state, stamp, text),
        CommandKind::SetActiveMember { member_id } => set_active_member(state, *member_id),
        CommandKind::ClearActiveHouse => clear_active_house(state),
        CommandKind::DeleteMember { member_id } => delete_member(state, stamp, *member_id),
        CommandKind::MarkNotificationRead { notification_id } => {
            mark_notification_read(state, *notification_id)
        }
        CommandKind::ClearAllNotifications => clear_all_notifications(state),
        CommandKind::ExpireMessages { ttl_ms } => expire_messages(state, stamp, *ttl_ms),
    }
}

/// Folds `commands` over `initial`; rejected commands leave the state as is.
pub fn replay<'a, I>(initial: &HouseholdState, commands: I) -> HouseholdState
where
    I: IntoIterator<Item = &'a Command>,
{
    commands
        .into_iter()
        .fold(initial.clone(), |state, command| match apply(&state, command) {
            Ok(Transition::Changed(next)) => next,
            Ok(Transition::Unchanged) | Err(_) => state,
        })
}

/// Equal split of `total` across `member_ids`, each share rounded to cents.
///
/// The sum may differ from `total` by up to `member_ids.len() * 0.005`.
pub fn split_evenly(total: f64, member_ids: &[MemberId]) -> Vec<BillSplit> {
    let share = round_to_cents(total / member_ids.len().max(1) as f64);
    member_ids
        .iter()
        .map(|member_id| BillSplit {
            member_id: *member_id,
            amount: share,
        })
        .collect()
}

pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Acting member resolved from the active selection.
struct Actor {
    house_index: usize,
    member: Member,
}

fn actor(state: &HouseholdState) -> CommandResult<Actor> {
    let house_id = state
        .active_house_id
        .ok_or(CommandError::NoActiveSelection)?;
    let member_id = state
        .active_member_id
        .ok_or(CommandError::NoActiveSelection)?;
    let house_index = state
        .house_index(house_id)
        .ok_or(CommandError::NoActiveSelection)?;
    let member = state.houses[house_index]
        .member(member_id)
        .cloned()
        .ok_or(CommandError::NoActiveSelection)?;
    Ok(Actor {
        house_index,
        member,
    })
}

fn required(value: &str, field: &'static str) -> CommandResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CommandError::BlankField(field));
    }
    Ok(trimmed.to_string())
}

/// Clones `state`, lets `mutate` edit the actor's house and prepends the
/// notification it returns.
fn commit_in_house<F>(
    state: &HouseholdState,
    stamp: Stamp,
    house_index: usize,
    mutate: F,
) -> Transition
where
    F: FnOnce(&mut House) -> NotificationDraft,
{
    let mut next = state.clone();
    let house = &mut next.houses[house_index];
    let house_id = house.id;
    let draft = mutate(house);
    notify::emit(&mut next, draft, stamp, house_id);
    Transition::Changed(next)
}

fn create_house(
    state: &HouseholdState,
    stamp: Stamp,
    house_name: &str,
    user_name: &str,
    code: &str,
) -> CommandResult<Transition> {
    let house_name = required(house_name, "house name")?;
    let user_name = required(user_name, "your name")?;
    let code = normalize_house_code(code);
    if !is_valid_house_code(&code) {
        return Err(CommandError::InvalidHouseCode(code));
    }
    if state.house_codes().contains(&code) {
        return Err(CommandError::HouseCodeTaken(code));
    }

    let founder = Member::new(stamp.derive("member"), user_name.as_str());
    let founder_id = founder.id;
    let house = House::new(stamp.id, house_name.as_str(), code, founder, stamp.at_ms);
    let house_id = house.id;

    let mut next = state.clone();
    next.houses.push(house);
    next.active_house_id = Some(house_id);
    next.active_member_id = Some(founder_id);
    notify::emit(
        &mut next,
        notify::house_created(&user_name, &house_name),
        stamp,
        house_id,
    );
    Ok(Transition::Changed(next))
}

fn join_house(
    state: &HouseholdState,
    stamp: Stamp,
    code: &str,
    user_name: &str,
) -> CommandResult<Transition> {
    let code = normalize_house_code(code);
    if code.chars().count() != HOUSE_CODE_LEN {
        return Err(CommandError::InvalidHouseCode(code));
    }
    let user_name = required(user_name, "your name")?;
    let house_index = state
        .houses
        .iter()
        .position(|house| normalize_house_code(&house.code) == code)
        .ok_or(CommandError::HouseNotFound(code))?;
    let house = &state.houses[house_index];
    let house_id = house.id;

    if let Some(existing) = house.member_by_name(&user_name) {
        if state.active_house_id == Some(house_id) && state.active_member_id == Some(existing.id)
        {
            return Ok(Transition::Unchanged);
        }
        let mut next = state.clone();
        next.active_house_id = Some(house_id);
        next.active_member_id = Some(existing.id);
        return Ok(Transition::Changed(next));
    }

    let house_name = house.name.clone();
    let member = Member::new(stamp.id, user_name.as_str());
    let member_id = member.id;

    let mut next = state.clone();
    next.houses[house_index].members.push(member);
    next.active_house_id = Some(house_id);
    next.active_member_id = Some(member_id);
    notify::emit(
        &mut next,
        notify::member_joined(&user_name, &house_name),
        stamp,
        house_id,
    );
    Ok(Transition::Changed(next))
}

fn add_grocery(state: &HouseholdState, stamp: Stamp, name: &str) -> CommandResult<Transition> {
    let actor = actor(state)?;
    let name = required(name, "item name")?;
    Ok(commit_in_house(state, stamp, actor.house_index, |house| {
        house.groceries.push(GroceryItem {
            id: stamp.id,
            name: name.clone(),
            added_by: actor.member.id,
            checked: false,
            created_at: stamp.at_ms,
        });
        notify::grocery_added(&actor.member.name, &name)
    }))
}

fn toggle_grocery(
    state: &HouseholdState,
    stamp: Stamp,
    item_id: GroceryItemId,
) -> CommandResult<Transition> {
    let actor = actor(state)?;
    let Some(position) = state.houses[actor.house_index]
        .groceries
        .iter()
        .position(|item| item.id == item_id)
    else {
        return Ok(Transition::Unchanged);
    };

    Ok(commit_in_house(state, stamp, actor.house_index, |house| {
        let item = &mut house.groceries[position];
        item.checked = !item.checked;
        notify::grocery_toggled(&actor.member.name, &item.name, item.checked)
    }))
}

fn add_task(
    state: &HouseholdState,
    stamp: Stamp,
    title: &str,
    assignee: Option<MemberId>,
    scope: TaskScope,
) -> CommandResult<Transition> {
    let actor = actor(state)?;
    let title = required(title, "task title")?;
    let house = &state.houses[actor.house_index];
    let assignee_id = assignee.unwrap_or(actor.member.id);
    let assignee_name = house
        .member(assignee_id)
        .map(|member| member.name.clone())
        .ok_or(CommandError::MemberNotFound(assignee_id))?;
    let other_assignee = (assignee_id != actor.member.id).then_some(assignee_name);

    Ok(commit_in_house(state, stamp, actor.house_index, |house| {
        house.tasks.insert(
            0,
            Task {
                id: stamp.id,
                title: title.clone(),
                assigned_to: Some(assignee_id),
                created_by: actor.member.id,
                completed: false,
                scope,
                created_at: stamp.at_ms,
            },
        );
        notify::task_added(&actor.member.name, &title, scope, other_assignee.as_deref())
    }))
}

fn toggle_task(state: &HouseholdState, stamp: Stamp, task_id: TaskId) -> CommandResult<Transition> {
    let actor = actor(state)?;
    let Some(position) = state.houses[actor.house_index]
        .tasks
        .iter()
        .position(|task| task.id == task_id)
    else {
        return Ok(Transition::Unchanged);
    };

    Ok(commit_in_house(state, stamp, actor.house_index, |house| {
        let task = &mut house.tasks[position];
        task.completed = !task.completed;
        notify::task_toggled(&actor.member.name, &task.title, task.completed)
    }))
}

fn add_bill(
    state: &HouseholdState,
    stamp: Stamp,
    name: &str,
    total: f64,
    member_ids: &[MemberId],
) -> CommandResult<Transition> {
    let actor = actor(state)?;
    let name = required(name, "bill name")?;
    // Cent rounding scales by 100; that product must stay finite too.
    if !total.is_finite() || total <= 0.0 || !(total * 100.0).is_finite() {
        return Err(CommandError::InvalidAmount(total));
    }

    let house = &state.houses[actor.house_index];
    let mut targets: Vec<MemberId> = Vec::with_capacity(member_ids.len());
    for member_id in member_ids {
        if !house.has_member(*member_id) {
            return Err(CommandError::MemberNotFound(*member_id));
        }
        if !targets.contains(member_id) {
            targets.push(*member_id);
        }
    }
    if targets.is_empty() {
        targets = house.members.iter().map(|member| member.id).collect();
    }
    let splits = split_evenly(total, &targets);

    Ok(commit_in_house(state, stamp, actor.house_index, |house| {
        house.bills.insert(
            0,
            Bill {
                id: stamp.id,
                name: name.clone(),
                total,
                splits,
                created_at: stamp.at_ms,
            },
        );
        notify::bill_added(&actor.member.name, &name, total)
    }))
}

fn remove_bill(state: &HouseholdState, stamp: Stamp, bill_id: BillId) -> CommandResult<Transition> {
    let actor = actor(state)?;
    let Some(position) = state.houses[actor.house_index]
        .bills
        .iter()
        .position(|bill| bill.id == bill_id)
    else {
        return Ok(Transition::Unchanged);
    };

    Ok(commit_in_house(state, stamp, actor.house_index, |house| {
        let bill = house.bills.remove(position);
        notify::bill_removed(&actor.member.name, &bill.name)
    }))
}

fn add_note(state: &HouseholdState, stamp: Stamp, text: &str) -> CommandResult<Transition> {
    let actor = actor(state)?;
    let text = required(text, "note")?;
    Ok(commit_in_house(state, stamp, actor.house_index, |house| {
        house.notes.push(BulletinNote {
            id: stamp.id,
            text: text.clone(),
            author_id: actor.member.id,
            created_at: stamp.at_ms,
        });
        notify::note_added(&actor.member.name, &text)
    }))
}

fn remove_note(state: &HouseholdState, stamp: Stamp, note_id: NoteId) -> CommandResult<Transition> {
    let actor = actor(state)?;
    let Some(position) = state.houses[actor.house_index]
        .notes
        .iter()
        .position(|note| note.id == note_id)
    else {
        return Ok(Transition::Unchanged);
    };

    Ok(commit_in_house(state, stamp, actor.house_index, |house| {
        let note = house.notes.remove(position);
        notify::note_removed(&actor.member.name, &note.text)
    }))
}

// Event -> task coupling lives only here. Reconsider if calendar and task
// lists ever need to evolve independently.
fn add_event(
    state: &HouseholdState,
    stamp: Stamp,
    input: &EventInput,
) -> CommandResult<Transition> {
    let actor = actor(state)?;
    let name = required(&input.name, "event name")?;
    let date = input.date.trim().to_string();
    if !DATE_RE.is_match(&date) {
        return Err(CommandError::InvalidDate(date));
    }
    let start_time = input.start_time.trim().to_string();
    if !TIME_RE.is_match(&start_time) {
        return Err(CommandError::InvalidTime(start_time));
    }
    let end_time = input.end_time.trim().to_string();
    if !TIME_RE.is_match(&end_time) {
        return Err(CommandError::InvalidTime(end_time));
    }
    // Zero-padded HH:MM compares correctly as text.
    if end_time < start_time {
        return Err(CommandError::InvalidTimeRange {
            start: start_time,
            end: end_time,
        });
    }

    let task_id = stamp.derive("task");
    Ok(commit_in_house(state, stamp, actor.house_index, |house| {
        house.events.push(CalendarEvent {
            id: stamp.id,
            name: name.clone(),
            date: date.clone(),
            start_time,
            end_time,
            created_by: actor.member.id,
            linked_task_id: Some(task_id),
        });
        house.tasks.insert(
            0,
            Task {
                id: task_id,
                title: name.clone(),
                assigned_to: Some(actor.member.id),
                created_by: actor.member.id,
                completed: false,
                scope: TaskScope::House,
                created_at: stamp.at_ms,
            },
        );
        notify::event_added(&actor.member.name, &name, &date)
    }))
}

/// Runs the `AddMessage` checks without applying anything.
pub(crate) fn validate_message(state: &HouseholdState, text: &str) -> CommandResult<()> {
    actor(state)?;
    required(text, "message")?;
    Ok(())
}

fn add_message(state: &HouseholdState, stamp: Stamp, text: &str) -> CommandResult<Transition> {
    let actor = actor(state)?;
    let text = required(text, "message")?;
    Ok(commit_in_house(state, stamp, actor.house_index, |house| {
        house.messages.push(ChatMessage {
            id: stamp.id,
            member_id: actor.member.id,
            text: text.clone(),
            timestamp: stamp.at_ms,
        });
        notify::message_sent(&actor.member.name, &text)
    }))
}

fn set_active_member(state: &HouseholdState, member_id: MemberId) -> CommandResult<Transition> {
    let house = state
        .active_house()
        .ok_or(CommandError::NoActiveSelection)?;
    if !house.has_member(member_id) {
        return Err(CommandError::MemberNotFound(member_id));
    }
    if state.active_member_id == Some(member_id) {
        return Ok(Transition::Unchanged);
    }
    let mut next = state.clone();
    next.active_member_id = Some(member_id);
    Ok(Transition::Changed(next))
}

fn clear_active_house(state: &HouseholdState) -> CommandResult<Transition> {
    if state.active_house_id.is_none() && state.active_member_id.is_none() {
        return Ok(Transition::Unchanged);
    }
    let mut next = state.clone();
    next.clear_selection();
    Ok(Transition::Changed(next))
}

/// Removes a member and the tasks assigned to them.
///
/// Notes, bills and messages keep their author ids; readers resolve them
/// with a placeholder.
fn delete_member(
    state: &HouseholdState,
    stamp: Stamp,
    member_id: MemberId,
) -> CommandResult<Transition> {
    let actor = actor(state)?;
    let Some(removed) = state.houses[actor.house_index].member(member_id).cloned() else {
        return Ok(Transition::Unchanged);
    };

    let mut next = state.clone();
    let house = &mut next.houses[actor.house_index];
    let house_id = house.id;
    house.members.retain(|member| member.id != member_id);
    house
        .tasks
        .retain(|task| task.assigned_to != Some(member_id));
    if next.active_member_id == Some(member_id) {
        next.clear_selection();
    }
    notify::emit(
        &mut next,
        notify::member_removed(&actor.member.name, &removed.name),
        stamp,
        house_id,
    );
    Ok(Transition::Changed(next))
}

fn mark_notification_read(
    state: &HouseholdState,
    notification_id: NotificationId,
) -> CommandResult<Transition> {
    let Some(position) = state
        .notifications
        .iter()
        .position(|notification| notification.id == notification_id && !notification.is_read)
    else {
        return Ok(Transition::Unchanged);
    };
    let mut next = state.clone();
    next.notifications[position].is_read = true;
    Ok(Transition::Changed(next))
}

fn clear_all_notifications(state: &HouseholdState) -> CommandResult<Transition> {
    if state.notifications.is_empty() {
        return Ok(Transition::Unchanged);
    }
    let mut next = state.clone();
    next.notifications.clear();
    Ok(Transition::Changed(next))
}

fn expire_messages(state: &HouseholdState, stamp: Stamp, ttl_ms: i64) -> CommandResult<Transition> {
    if ttl_ms <= 0 {
        return Ok(Transition::Unchanged);
    }
    let is_live = |message: &ChatMessage| stamp.at_ms.saturating_sub(message.timestamp) < ttl_ms;
    let any_expired = state
        .houses
        .iter()
        .any(|house| !house.messages.iter().all(is_live));
    if !any_expired {
        return Ok(Transition::Unchanged);
    }

    let mut next = state.clone();
    for house in &mut next.houses {
        house.messages.retain(is_live);
    }
    Ok(Transition::Changed(next))
}
