//! Household store façade.
//!
//! # Responsibility
//! - Own the current snapshot, the snapshot repository and the stamp source.
//! - Turn presentation input into stamped commands, apply them through the
//!   reducer and persist every changed snapshot synchronously.
//!
//! # Invariants
//! - Commands apply strictly one at a time (`&mut self`).
//! - Published snapshots are shared via `Arc` and never mutated afterwards.
//! - Save failures never fail a command; they are logged and kept in
//!   `last_storage_error` until the next successful save.

use crate::command::reducer::validate_message;
use crate::command::{apply, Command, CommandKind, CommandResult, EventInput, Transition};
use crate::config::{ConfigError, StoreConfig};
use crate::ids::{StampSource, SystemStampSource};
use crate::model::house::{BillId, GroceryItemId, House, Member, MemberId, NoteId, TaskId, TaskScope};
use crate::model::notification::{Notification, NotificationId};
use crate::model::state::HouseholdState;
use crate::repo::snapshot_repo::{
    load_state, save_state, MemorySnapshotRepository, SnapshotRepository,
    SqliteSnapshotRepository, StorageError,
};
use crate::service::read_model::{self, HouseSummary};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

/// Failure while opening a store.
#[derive(Debug)]
pub enum StoreError {
    Config(ConfigError),
    Storage(StorageError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid store config: {err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<ConfigError> for StoreError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Single-writer household state container.
pub struct HouseholdStore<R: SnapshotRepository, S: StampSource = SystemStampSource> {
    repo: R,
    stamps: S,
    config: StoreConfig,
    state: Arc<HouseholdState>,
    last_storage_error: Option<StorageError>,
}

impl HouseholdStore<SqliteSnapshotRepository> {
    /// Opens a SQLite-backed store at `config.db_path` (in-memory when unset).
    pub fn open_sqlite(config: StoreConfig) -> Result<Self, StoreError> {
        let config = config.normalized()?;
        let repo = match &config.db_path {
            Some(path) => SqliteSnapshotRepository::open(path)?,
            None => SqliteSnapshotRepository::open_in_memory()?,
        };
        Self::open(repo, SystemStampSource, config)
    }
}

impl HouseholdStore<MemorySnapshotRepository> {
    /// Empty volatile store with default config.
    pub fn in_memory() -> Self {
        Self {
            repo: MemorySnapshotRepository::new(),
            stamps: SystemStampSource,
            config: StoreConfig::default(),
            state: Arc::new(HouseholdState::default()),
            last_storage_error: None,
        }
    }
}

impl<R: SnapshotRepository, S: StampSource> HouseholdStore<R, S> {
    /// Loads the stored snapshot (defaulting when absent or corrupt) and
    /// drops expired chat messages.
    pub fn open(repo: R, stamps: S, config: StoreConfig) -> Result<Self, StoreError> {
        let config = config.normalized()?;
        let state = load_state(&repo, &config.snapshot_key);
        let mut store = Self {
            repo,
            stamps,
            config,
            state: Arc::new(state),
            last_storage_error: None,
        };
        if let Err(err) = store.expire_messages() {
            warn!(
                "event=store_open module=store status=error error_code={}",
                err.code()
            );
        }
        info!(
            "event=store_open module=store status=ok houses={} notifications={}",
            store.state.houses.len(),
            store.state.notifications.len()
        );
        Ok(store)
    }

    /// Current snapshot. Holding it never blocks later commands.
    pub fn snapshot(&self) -> Arc<HouseholdState> {
        Arc::clone(&self.state)
    }

    pub fn state(&self) -> &HouseholdState {
        &self.state
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Last save failure, cleared by the next successful save.
    pub fn last_storage_error(&self) -> Option<&StorageError> {
        self.last_storage_error.as_ref()
    }

    pub fn active_house(&self) -> Option<&House> {
        self.state.active_house()
    }

    pub fn active_member(&self) -> Option<&Member> {
        self.state.active_member()
    }

    /// Feed, newest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.state.notifications
    }

    pub fn unread_notification_count(&self) -> usize {
        read_model::unread_notification_count(&self.state)
    }

    /// Dashboard counters for the active member.
    pub fn summary(&self) -> Option<HouseSummary> {
        let house = self.state.active_house()?;
        let member = self.state.active_member()?;
        Some(read_model::house_summary(house, member.id))
    }

    /// Applies a pre-built command (e.g. when replaying a log).
    pub fn execute(&mut self, command: Command) -> CommandResult<Arc<HouseholdState>> {
        let started_at = Instant::now();
        let name = command.kind.name();

        match apply(&self.state, &command) {
            Ok(Transition::Changed(next)) => {
                self.state = Arc::new(next);
                self.persist(command.stamp.at_ms);
                info!(
                    "event=command_apply module=store status=ok command={name} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
            }
            Ok(Transition::Unchanged) => {
                debug!(
                    "event=command_apply module=store status=skipped command={name} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
            }
            Err(err) => {
                info!(
                    "event=command_apply module=store status=error command={name} error_code={}",
                    err.code()
                );
                return Err(err);
            }
        }

        Ok(self.snapshot())
    }

    /// Stamps `kind` and applies it.
    pub fn dispatch(&mut self, kind: CommandKind) -> CommandResult<Arc<HouseholdState>> {
        let command = Command::new(self.stamps.next_stamp(), kind);
        self.execute(command)
    }

    /// Creates a house with a fresh join code and returns that code.
    pub fn create_house(&mut self, house_name: &str, user_name: &str) -> CommandResult<String> {
        let code = self.stamps.house_code(&self.state.house_codes());
        self.dispatch(CommandKind::CreateHouse {
            house_name: house_name.to_string(),
            user_name: user_name.to_string(),
            code: code.clone(),
        })?;
        Ok(code)
    }

    pub fn join_house(&mut self, code: &str, user_name: &str) -> CommandResult<Arc<HouseholdState>> {
        self.dispatch(CommandKind::JoinHouse {
            code: code.to_string(),
            user_name: user_name.to_string(),
        })
    }

    pub fn add_grocery(&mut self, name: &str) -> CommandResult<Arc<HouseholdState>> {
        self.dispatch(CommandKind::AddGrocery {
            name: name.to_string(),
        })
    }

    pub fn toggle_grocery(&mut self, item_id: GroceryItemId) -> CommandResult<Arc<HouseholdState>> {
        self.dispatch(CommandKind::ToggleGrocery { item_id })
    }

    /// `assignee` defaults to the acting member, `scope` to `House`.
    pub fn add_task(
        &mut self,
        title: &str,
        assignee: Option<MemberId>,
        scope: Option<TaskScope>,
    ) -> CommandResult<Arc<HouseholdState>> {
        self.dispatch(CommandKind::AddTask {
            title: title.to_string(),
            assignee,
            scope: scope.unwrap_or_default(),
        })
    }

    pub fn toggle_task(&mut self, task_id: TaskId) -> CommandResult<Arc<HouseholdState>> {
        self.dispatch(CommandKind::ToggleTask { task_id })
    }

    /// Splits across `member_ids`, or every member when empty.
    pub fn add_bill(
        &mut self,
        name: &str,
        total: f64,
        member_ids: &[MemberId],
    ) -> CommandResult<Arc<HouseholdState>> {
        self.dispatch(CommandKind::AddBill {
            name: name.to_string(),
            total,
            member_ids: member_ids.to_vec(),
        })
    }

    pub fn remove_bill(&mut self, bill_id: BillId) -> CommandResult<Arc<HouseholdState>> {
        self.dispatch(CommandKind::RemoveBill { bill_id })
    }

    pub fn add_note(&mut self, text: &str) -> CommandResult<Arc<HouseholdState>> {
        self.dispatch(CommandKind::AddNote {
            text: text.to_string(),
        })
    }

    pub fn remove_note(&mut self, note_id: NoteId) -> CommandResult<Arc<HouseholdState>> {
        self.dispatch(CommandKind::RemoveNote { note_id })
    }

    /// Adds the event and its linked house task.
    pub fn add_event(&mut self, input: EventInput) -> CommandResult<Arc<HouseholdState>> {
        self.dispatch(CommandKind::AddEvent(input))
    }

    /// Purges expired messages, then appends. Input is validated before the
    /// purge so a rejected message changes nothing.
    pub fn add_message(&mut self, text: &str) -> CommandResult<Arc<HouseholdState>> {
        validate_message(&self.state, text)?;
        self.expire_messages()?;
        self.dispatch(CommandKind::AddMessage {
            text: text.to_string(),
        })
    }

    pub fn set_active_member(&mut self, member_id: MemberId) -> CommandResult<Arc<HouseholdState>> {
        self.dispatch(CommandKind::SetActiveMember { member_id })
    }

    pub fn clear_active_house(&mut self) -> CommandResult<Arc<HouseholdState>> {
        self.dispatch(CommandKind::ClearActiveHouse)
    }

    pub fn delete_member(&mut self, member_id: MemberId) -> CommandResult<Arc<HouseholdState>> {
        self.dispatch(CommandKind::DeleteMember { member_id })
    }

    pub fn mark_notification_read(
        &mut self,
        notification_id: NotificationId,
    ) -> CommandResult<Arc<HouseholdState>> {
        self.dispatch(CommandKind::MarkNotificationRead { notification_id })
    }

    pub fn clear_all_notifications(&mut self) -> CommandResult<Arc<HouseholdState>> {
        self.dispatch(CommandKind::ClearAllNotifications)
    }

    /// Drops chat messages older than the configured TTL; no-op when expiry
    /// is disabled.
    pub fn expire_messages(&mut self) -> CommandResult<Arc<HouseholdState>> {
        match self.config.message_ttl_ms {
            Some(ttl_ms) => self.dispatch(CommandKind::ExpireMessages { ttl_ms }),
            None => Ok(self.snapshot()),
        }
    }

    fn persist(&mut self, saved_at_ms: i64) {
        match save_state(
            &mut self.repo,
            &self.config.snapshot_key,
            &self.state,
            saved_at_ms,
        ) {
            Ok(()) => self.last_storage_error = None,
            Err(err) => self.last_storage_error = Some(err),
        }
    }
}
