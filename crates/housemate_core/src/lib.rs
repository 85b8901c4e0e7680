//! Shared-household domain store.
//!
//! Owns every household entity (houses, members, groceries, tasks, bills,
//! notes, events, chat messages) plus the derived notification feed, and is
//! the single source of truth presentation layers read and write through
//! `HouseholdStore`.

pub mod command;
pub mod config;
pub mod db;
pub mod ids;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use command::notify::{summarize, NotificationDraft, SUMMARY_MAX_CHARS};
pub use command::{
    apply, replay, round_to_cents, split_evenly, Command, CommandError, CommandKind,
    CommandResult, EventInput, Transition,
};
pub use config::{ConfigError, StoreConfig, DEFAULT_MESSAGE_TTL_MS, DEFAULT_SNAPSHOT_KEY};
pub use ids::{
    is_valid_house_code, new_house_code, new_house_code_with, new_id, normalize_house_code,
    SeededStampSource, Stamp, StampSource, SystemStampSource, HOUSE_CODE_ALPHABET,
    HOUSE_CODE_LEN,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::house::{
    Bill, BillId, BillSplit, BulletinNote, CalendarEvent, ChatMessage, EventId, GroceryItem,
    GroceryItemId, House, HouseId, Member, MemberId, MessageId, NoteId, Task, TaskId, TaskScope,
};
pub use model::notification::{Notification, NotificationId, NotificationKind};
pub use model::state::HouseholdState;
pub use repo::snapshot_repo::{
    decode_state, encode_state, load_state, save_state, MemorySnapshotRepository,
    SnapshotRepository, SqliteSnapshotRepository, StorageError, StorageResult,
};
pub use service::household_store::{HouseholdStore, StoreError};
pub use service::read_model::{
    bill_share, events_on, house_notifications, house_summary, house_tasks,
    member_display_name, my_tasks, unread_notification_count, upcoming_events,
    visible_messages, HouseSummary, FORMER_MEMBER_PLACEHOLDER,
};
