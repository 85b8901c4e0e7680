use housemate_core::{
    house_tasks, is_valid_house_code, my_tasks, upcoming_events, visible_messages, CommandError,
    EventInput, HouseSummary, HouseholdStore, MemorySnapshotRepository, NotificationKind,
    SeededStampSource, StoreConfig, TaskScope, DEFAULT_MESSAGE_TTL_MS,
};
use std::sync::Arc;

const T0: i64 = 1_700_000_000_000;
const DAY_MS: i64 = DEFAULT_MESSAGE_TTL_MS;

type TestStore = HouseholdStore<MemorySnapshotRepository, SeededStampSource>;

fn store_at(seed: u64, start_ms: i64) -> TestStore {
    HouseholdStore::open(
        MemorySnapshotRepository::new(),
        SeededStampSource::new(seed, start_ms),
        StoreConfig::default(),
    )
    .unwrap()
}

fn reopen_at(store: &TestStore, seed: u64, start_ms: i64) -> TestStore {
    HouseholdStore::open(
        store.repository().clone(),
        SeededStampSource::new(seed, start_ms),
        StoreConfig::default(),
    )
    .unwrap()
}

#[test]
fn maple_street_walkthrough() {
    let mut store = store_at(42, T0);

    let code = store.create_house("Maple Street", "Mila").unwrap();
    assert!(is_valid_house_code(&code));
    assert_eq!(store.active_member().map(|m| m.name.as_str()), Some("Mila"));

    store.join_house(&code.to_lowercase(), "Roy").unwrap();
    store.join_house(&code, "Ella").unwrap();
    store.add_bill("Rent", 100.0, &[]).unwrap();
    store
        .add_event(EventInput {
            name: "Meeting".to_string(),
            date: "2024-01-05".to_string(),
            start_time: "10:00".to_string(),
            end_time: "11:00".to_string(),
        })
        .unwrap();
    store.add_grocery("oat milk").unwrap();

    let house = store.active_house().unwrap();
    assert_eq!(house.members.len(), 3);
    assert_eq!(house.bills[0].splits.len(), 3);
    assert_eq!(house.tasks.len(), 1);
    assert_eq!(house.tasks[0].title, "Meeting");
    assert_eq!(upcoming_events(house)[0].name, "Meeting");

    assert_eq!(
        store.summary(),
        Some(HouseSummary {
            member_count: 3,
            open_tasks: 1,
            my_open_tasks: 1,
            groceries_to_buy: 1,
            bill_count: 1,
        })
    );
    // create, two joins, bill, event, grocery
    assert_eq!(store.notifications().len(), 6);
    assert_eq!(store.unread_notification_count(), 6);
    assert_eq!(store.notifications()[0].kind, NotificationKind::Grocery);
}

#[test]
fn rejected_command_keeps_published_snapshot() {
    let mut store = store_at(1, T0);
    store.create_house("Maple Street", "Mila").unwrap();
    let before = store.snapshot();

    let err = store.join_house("NOPE22", "Roy").unwrap_err();
    assert_eq!(err.to_string(), "House code not found");
    assert!(Arc::ptr_eq(&before, &store.snapshot()));

    let err = store.add_bill("Rent", -1.0, &[]).unwrap_err();
    assert_eq!(err, CommandError::InvalidAmount(-1.0));
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
}

#[test]
fn held_snapshot_is_not_affected_by_later_commands() {
    let mut store = store_at(1, T0);
    store.create_house("Maple Street", "Mila").unwrap();
    let held = store.snapshot();

    store.add_grocery("coffee").unwrap();
    assert!(held.houses[0].groceries.is_empty());
    assert_eq!(store.state().houses[0].groceries.len(), 1);
}

#[test]
fn rejoining_by_name_switches_back_to_existing_member() {
    let mut store = store_at(9, T0);
    let code = store.create_house("Maple Street", "Mila").unwrap();
    store.join_house(&code, "Roy").unwrap();
    let feed_len = store.notifications().len();

    store.join_house(&code, " mila").unwrap();
    let house = store.active_house().unwrap();
    assert_eq!(house.members.len(), 2);
    assert_eq!(store.active_member().map(|m| m.name.as_str()), Some("Mila"));
    assert_eq!(store.notifications().len(), feed_len);
}

#[test]
fn task_views_split_by_assignee() {
    let mut store = store_at(2, T0);
    let code = store.create_house("Maple Street", "Mila").unwrap();
    let mila = store.active_member().unwrap().id;
    store.join_house(&code, "Roy").unwrap();
    let roy = store.active_member().unwrap().id;

    store.add_task("Fix sink", None, None).unwrap();
    store
        .add_task("Buy plants", Some(mila), Some(TaskScope::Personal))
        .unwrap();

    let house = store.active_house().unwrap();
    let mine: Vec<&str> = my_tasks(house, roy)
        .into_iter()
        .map(|t| t.title.as_str())
        .collect();
    let others: Vec<&str> = house_tasks(house, roy)
        .into_iter()
        .map(|t| t.title.as_str())
        .collect();
    assert_eq!(mine, ["Fix sink"]);
    assert_eq!(others, ["Buy plants"]);
    assert_eq!(house.tasks[1].scope, TaskScope::House);
}

#[test]
fn notifications_can_be_read_and_cleared() {
    let mut store = store_at(4, T0);
    store.create_house("Maple Street", "Mila").unwrap();
    store.add_note("Recycling goes out Tuesday").unwrap();
    let newest = store.notifications()[0].id;

    store.mark_notification_read(newest).unwrap();
    assert_eq!(store.unread_notification_count(), 1);

    store.clear_all_notifications().unwrap();
    assert!(store.notifications().is_empty());
    assert_eq!(store.state().houses[0].notes.len(), 1);
}

#[test]
fn clearing_active_house_requires_rejoin() {
    let mut store = store_at(6, T0);
    let code = store.create_house("Maple Street", "Mila").unwrap();

    store.clear_active_house().unwrap();
    assert!(store.active_house().is_none());
    assert!(store.summary().is_none());
    assert_eq!(
        store.add_grocery("eggs").unwrap_err(),
        CommandError::NoActiveSelection
    );

    store.join_house(&code, "Mila").unwrap();
    assert_eq!(store.state().houses[0].members.len(), 1);
    store.add_grocery("eggs").unwrap();
}

#[test]
fn deleting_a_housemate_through_the_store() {
    let mut store = store_at(8, T0);
    let code = store.create_house("Maple Street", "Mila").unwrap();
    let mila = store.active_member().unwrap().id;
    store.join_house(&code, "Roy").unwrap();
    let roy = store.active_member().unwrap().id;
    store.add_task("Roy's laundry", None, None).unwrap();
    store.set_active_member(mila).unwrap();

    store.delete_member(roy).unwrap();
    let house = store.active_house().unwrap();
    assert_eq!(house.members.len(), 1);
    assert!(house.tasks.is_empty());
    assert_eq!(store.notifications()[0].kind, NotificationKind::Delete);
}

#[test]
fn messages_expire_on_open() {
    let mut store = store_at(11, T0);
    store.create_house("Maple Street", "Mila").unwrap();
    store.add_message("anyone home?").unwrap();
    assert_eq!(store.state().houses[0].messages.len(), 1);

    let reopened = reopen_at(&store, 12, T0 + 2 * DAY_MS);
    assert!(reopened.state().houses[0].messages.is_empty());
}

#[test]
fn sending_a_message_purges_expired_ones_first() {
    let mut store = store_at(13, T0);
    store.create_house("Maple Street", "Mila").unwrap();
    store.add_message("old news").unwrap();

    // Still fresh when reopened; the next stamps cross the TTL.
    let mut store = reopen_at(&store, 14, T0 + DAY_MS + 2_500);
    assert_eq!(store.state().houses[0].messages.len(), 1);

    store.add_message("fresh").unwrap();
    let house = store.active_house().unwrap();
    let texts: Vec<&str> = house.messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, ["fresh"]);

    let now = house.messages[0].timestamp;
    assert_eq!(visible_messages(house, now, Some(DAY_MS)).len(), 1);
    assert!(visible_messages(house, now + DAY_MS, Some(DAY_MS)).is_empty());
    assert_eq!(visible_messages(house, now + DAY_MS, None).len(), 1);
}

#[test]
fn disabled_ttl_keeps_messages() {
    let config = StoreConfig {
        message_ttl_ms: None,
        ..StoreConfig::default()
    };
    let mut store = HouseholdStore::open(
        MemorySnapshotRepository::new(),
        SeededStampSource::new(15, T0),
        config.clone(),
    )
    .unwrap();
    store.create_house("Maple Street", "Mila").unwrap();
    store.add_message("keep me").unwrap();

    let reopened = HouseholdStore::open(
        store.repository().clone(),
        SeededStampSource::new(16, T0 + 30 * DAY_MS),
        config,
    )
    .unwrap();
    assert_eq!(reopened.state().houses[0].messages.len(), 1);
}

#[test]
fn invalid_config_is_rejected_on_open() {
    let config = StoreConfig {
        snapshot_key: "  ".to_string(),
        ..StoreConfig::default()
    };
    let result = HouseholdStore::open(
        MemorySnapshotRepository::new(),
        SeededStampSource::new(1, T0),
        config,
    );
    assert!(result.is_err());
}

#[test]
fn in_memory_store_starts_empty() {
    let mut store = HouseholdStore::in_memory();
    assert!(store.state().houses.is_empty());
    let code = store.create_house("Maple Street", "Mila").unwrap();
    assert_eq!(store.state().houses[0].code, code);
}

#[test]
fn rejected_message_leaves_expired_messages_in_place() {
    let mut store = store_at(17, T0);
    store.create_house("Maple Street", "Mila").unwrap();
    store.add_message("old news").unwrap();

    let mut store = reopen_at(&store, 18, T0 + DAY_MS + 2_500);
    let err = store.add_message("   ").unwrap_err();
    assert_eq!(err, CommandError::BlankField("message"));
    assert_eq!(store.state().houses[0].messages.len(), 1);

    let reloaded = reopen_at(&store, 19, T0 + DAY_MS + 2_500);
    assert_eq!(reloaded.state().houses[0].messages.len(), 1);
}
