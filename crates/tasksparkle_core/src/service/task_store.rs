//! Task store: the single owner of task and category state.
//!
//! # Responsibility
//! - Expose the caller-facing task/category/preference operations.
//! - Run the completion/rollover transition for recurring tasks.
//! - Publish a collection version after every committed mutation and serve
//!   live queries from consistent snapshots.
//!
//! # Invariants
//! - Validation happens before any write; rejected input leaves no trace.
//! - Writers commit and publish while holding the connection lock, and
//!   readers read the version and the rows under the same lock, so no
//!   result is ever built from a torn read.
//! - Operations never retry; failures are returned to the caller as-is.

use crate::config::StoreConfig;
use crate::db::migrations::apply_migrations;
use crate::db::{open_db, open_db_in_memory};
use crate::live::feed::{ChangeFeed, Collection};
use crate::live::query::{LiveQuery, MemoCache, Versioned};
use crate::model::category::{Category, CategoryId, NewCategory};
use crate::model::task::{NewTask, Task, TaskId, TaskPatch};
use crate::query::pipeline::{build_task_view, CategoryFilter, TaskView};
use crate::recurrence::next_due_date;
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::preference_repo::{
    PreferenceRepository, SqlitePreferenceRepository, ACTIVE_CATEGORY_FILTER_KEY,
    SCRATCH_PAD_TEXT_KEY,
};
use crate::repo::task_repo::{Entity, SqliteTaskRepository, TaskListQuery, TaskRepository};
use crate::service::error::{StoreError, StoreResult};
use chrono::{Local, NaiveDate};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Live subscription to the sorted task list and its metrics.
pub type TaskWatch = LiveQuery<NaiveDate, TaskView>;
/// Live subscription to all categories.
pub type CategoryWatch = LiveQuery<(), Vec<Category>>;

/// Result of `TaskStore::toggle_task_completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Task marked pending again.
    Reopened(TaskId),
    /// Non-recurring (or undated) task marked completed.
    Completed(TaskId),
    /// Recurring task closed and its next occurrence created.
    RolledOver { completed: TaskId, successor: TaskId },
}

struct StoreInner {
    conn: Mutex<Connection>,
    feed: ChangeFeed,
    views: MemoCache<(CategoryFilter, NaiveDate), TaskView>,
}

impl StoreInner {
    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned"))
    }

    fn read_task_view(
        &self,
        filter: CategoryFilter,
        today: NaiveDate,
    ) -> StoreResult<Versioned<TaskView>> {
        let (version, raw) = {
            let conn = self.lock()?;
            let version = self.feed.version(Collection::Tasks);
            if let Some(view) = self.views.get(&(filter, today), version) {
                return Ok(Versioned {
                    version,
                    value: view,
                });
            }
            let query = TaskListQuery {
                category_id: filter.category_id(),
                ..TaskListQuery::default()
            };
            let raw = SqliteTaskRepository::new(&conn).list_tasks(&query)?;
            (version, raw)
        };

        let view = build_task_view(raw, filter, today);
        self.views.insert((filter, today), version, view.clone());
        debug!(
            "event=task_view_build module=store status=ok version={} rows={}",
            version,
            view.tasks.len()
        );
        Ok(Versioned {
            version,
            value: view,
        })
    }

    fn read_categories(&self) -> StoreResult<Versioned<Vec<Category>>> {
        let conn = self.lock()?;
        let version = self.feed.version(Collection::Categories);
        let categories = SqliteCategoryRepository::new(&conn).list_categories()?;
        Ok(Versioned {
            version,
            value: categories,
        })
    }
}

/// Explicit store object; construct once and share by reference.
pub struct TaskStore {
    inner: Arc<StoreInner>,
}

impl TaskStore {
    /// Opens (or creates) the configured database file.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let path = config.resolved_db_path();
        let conn = open_db(&path)?;
        Self::from_connection(conn, config.seed_default_categories)
    }

    /// Opens a throwaway in-memory store with default categories.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(open_db_in_memory()?, true)
    }

    /// Wraps an existing connection, applying pending migrations first.
    ///
    /// # Side effects
    /// - Seeds default categories when `seed_default_categories` is set and
    ///   the categories table is empty.
    pub fn from_connection(
        mut conn: Connection,
        seed_default_categories: bool,
    ) -> StoreResult<Self> {
        apply_migrations(&mut conn)?;

        if seed_default_categories {
            let inserted = SqliteCategoryRepository::new(&conn)
                .populate_if_empty(&NewCategory::defaults())?;
            if inserted > 0 {
                info!("event=category_seed module=store status=ok inserted={inserted}");
            }
        }

        Ok(Self {
            inner: Arc::new(StoreInner {
                conn: Mutex::new(conn),
                feed: ChangeFeed::new(),
                views: MemoCache::default(),
            }),
        })
    }

    fn write<T>(
        &self,
        event: &'static str,
        collection: Collection,
        op: impl FnOnce(&Connection) -> StoreResult<(T, bool)>,
    ) -> StoreResult<T> {
        let started_at = Instant::now();
        let conn = self.inner.lock()?;
        match op(&*conn) {
            Ok((value, changed)) => {
                let version = if changed {
                    self.inner.feed.publish(collection)
                } else {
                    self.inner.feed.version(collection)
                };
                debug!(
                    "event={} module=store status=ok collection={} changed={} version={} duration_ms={}",
                    event,
                    collection.as_str(),
                    changed,
                    version,
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                error!(
                    "event={} module=store status=error collection={} duration_ms={} error_code={} error={}",
                    event,
                    collection.as_str(),
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Creates a task with defaults for unset fields and `is_completed=false`.
    pub fn add_task(&self, task: NewTask) -> StoreResult<TaskId> {
        task.validate()?;
        let id = self.write("task_add", Collection::Tasks, |conn| {
            let id = SqliteTaskRepository::new(conn).create_task(&task)?;
            Ok((id, true))
        })?;
        info!("event=task_add module=store status=ok task_id={id}");
        Ok(id)
    }

    /// Merges `patch` into an existing task and returns the stored result.
    ///
    /// # Errors
    /// - `NotFound` when `id` does not exist.
    /// - `ValidationFailure` when the merged task breaks an invariant.
    pub fn update_task(&self, id: TaskId, patch: &TaskPatch) -> StoreResult<Task> {
        self.write("task_update", Collection::Tasks, |conn| {
            let repo = SqliteTaskRepository::new(conn);
            let mut task = repo.get_task(id)?.ok_or(StoreError::NotFound {
                entity: Entity::Task,
                id,
            })?;
            if patch.is_empty() {
                return Ok((task, false));
            }
            task.apply_patch(patch);
            task.validate()?;
            repo.update_task(&task)?;
            Ok((task, true))
        })
    }

    /// Removes a task; deleting a missing id is not an error.
    pub fn delete_task(&self, id: TaskId) -> StoreResult<()> {
        self.write("task_delete", Collection::Tasks, |conn| {
            let removed = SqliteTaskRepository::new(conn).delete_task(id)?;
            Ok(((), removed))
        })
    }

    /// Deletes every completed task and returns how many were removed.
    pub fn clear_completed(&self) -> StoreResult<usize> {
        let removed = self.write("task_clear_completed", Collection::Tasks, |conn| {
            let removed = SqliteTaskRepository::new(conn).delete_completed()?;
            Ok((removed, removed > 0))
        })?;
        info!("event=task_clear_completed module=store status=ok removed={removed}");
        Ok(removed)
    }

    /// Flips completion; completing a dated recurring task rolls it over.
    ///
    /// `current_status` is the completion state the caller is looking at:
    /// `true` reopens the task, `false` completes it.
    ///
    /// # Errors
    /// - `NotFound` when `id` does not exist.
    /// - `PartialRollover` when closing the original fails after its successor
    ///   was inserted; both writes are rolled back.
    pub fn toggle_task_completed(
        &self,
        id: TaskId,
        current_status: bool,
    ) -> StoreResult<ToggleOutcome> {
        let outcome = self.write("task_toggle", Collection::Tasks, |conn| {
            let repo = SqliteTaskRepository::new(conn);
            if current_status {
                let changed = repo.set_completed(id, false)?;
                return Ok((ToggleOutcome::Reopened(id), changed));
            }

            let task = repo.get_task(id)?.ok_or(StoreError::NotFound {
                entity: Entity::Task,
                id,
            })?;
            match task.due_date {
                Some(due) if task.recurring.is_recurring() => {
                    let next = next_due_date(due, task.recurring)?;
                    let successor = repo.roll_over(&task, &task.successor(next))?;
                    Ok((
                        ToggleOutcome::RolledOver {
                            completed: id,
                            successor,
                        },
                        true,
                    ))
                }
                _ => {
                    let changed = repo.set_completed(id, true)?;
                    Ok((ToggleOutcome::Completed(id), changed))
                }
            }
        })?;

        if let ToggleOutcome::RolledOver {
            completed,
            successor,
        } = outcome
        {
            info!(
                "event=task_rollover module=store status=ok task_id={completed} successor_id={successor}"
            );
        }
        Ok(outcome)
    }

    pub fn get_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        let conn = self.inner.lock()?;
        Ok(SqliteTaskRepository::new(&conn).get_task(id)?)
    }

    /// Raw rows matching `filter`, ordered by id.
    pub fn list_tasks(&self, filter: CategoryFilter) -> StoreResult<Vec<Task>> {
        let conn = self.inner.lock()?;
        let query = TaskListQuery {
            category_id: filter.category_id(),
            ..TaskListQuery::default()
        };
        Ok(SqliteTaskRepository::new(&conn).list_tasks(&query)?)
    }

    /// Sorted view with metrics for the current local day.
    pub fn task_view(&self, filter: CategoryFilter) -> StoreResult<TaskView> {
        self.task_view_on(filter, local_today())
    }

    /// Sorted view with metrics for an explicit day.
    pub fn task_view_on(&self, filter: CategoryFilter, today: NaiveDate) -> StoreResult<TaskView> {
        Ok(self.inner.read_task_view(filter, today)?.value)
    }

    pub fn list_categories(&self) -> StoreResult<Vec<Category>> {
        Ok(self.inner.read_categories()?.value)
    }

    pub fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        let conn = self.inner.lock()?;
        Ok(SqliteCategoryRepository::new(&conn).get_category(id)?)
    }

    /// Looks up the task's category; a dangling reference yields `None`.
    pub fn resolve_category(&self, task: &Task) -> StoreResult<Option<Category>> {
        self.get_category(task.category_id)
    }

    pub fn add_category(&self, category: NewCategory) -> StoreResult<CategoryId> {
        category.validate()?;
        let id = self.write("category_add", Collection::Categories, |conn| {
            let id = SqliteCategoryRepository::new(conn).create_category(&category)?;
            Ok((id, true))
        })?;
        info!("event=category_add module=store status=ok category_id={id}");
        Ok(id)
    }

    /// Persists the active list filter; `None` means all categories.
    pub fn set_category_filter(&self, category_id: Option<CategoryId>) -> StoreResult<()> {
        let conn = self.inner.lock()?;
        let repo = SqlitePreferenceRepository::new(&conn);
        match category_id {
            Some(id) => repo.set_preference(ACTIVE_CATEGORY_FILTER_KEY, &id.to_string())?,
            None => {
                repo.clear_preference(ACTIVE_CATEGORY_FILTER_KEY)?;
            }
        }
        Ok(())
    }

    /// Reads the persisted filter. An unreadable value counts as "all".
    pub fn active_category_filter(&self) -> StoreResult<Option<CategoryId>> {
        let conn = self.inner.lock()?;
        let raw = SqlitePreferenceRepository::new(&conn).get_preference(ACTIVE_CATEGORY_FILTER_KEY)?;
        Ok(raw.and_then(|value| match value.trim().parse::<CategoryId>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!("event=pref_read module=store status=error key={ACTIVE_CATEGORY_FILTER_KEY} error_code=invalid_value");
                None
            }
        }))
    }

    pub fn scratch_note(&self) -> StoreResult<String> {
        let conn = self.inner.lock()?;
        let value = SqlitePreferenceRepository::new(&conn).get_preference(SCRATCH_PAD_TEXT_KEY)?;
        Ok(value.unwrap_or_default())
    }

    pub fn set_scratch_note(&self, text: &str) -> StoreResult<()> {
        let conn = self.inner.lock()?;
        SqlitePreferenceRepository::new(&conn).set_preference(SCRATCH_PAD_TEXT_KEY, text)?;
        Ok(())
    }

    /// Subscribes to the sorted task view for `filter`.
    ///
    /// The watcher does not keep the store alive; after the store is
    /// dropped, `changed` returns `None`.
    pub fn watch_tasks(&self, filter: CategoryFilter) -> TaskWatch {
        let weak = Arc::downgrade(&self.inner);
        LiveQuery::new(
            self.inner.feed.subscribe(Collection::Tasks),
            move |today: &NaiveDate| {
                let inner = weak
                    .upgrade()
                    .ok_or(StoreError::Unavailable("task store dropped"))?;
                inner.read_task_view(filter, *today)
            },
            local_today,
        )
    }

    /// Subscribes to the category list.
    pub fn watch_categories(&self) -> CategoryWatch {
        let weak = Arc::downgrade(&self.inner);
        LiveQuery::new(
            self.inner.feed.subscribe(Collection::Categories),
            move |_: &()| {
                let inner = weak
                    .upgrade()
                    .ok_or(StoreError::Unavailable("task store dropped"))?;
                inner.read_categories()
            },
            || (),
        )
    }

    /// Current version of a collection.
    pub fn version(&self, collection: Collection) -> u64 {
        self.inner.feed.version(collection)
    }

    /// Number of live watchers on a collection.
    pub fn subscriber_count(&self, collection: Collection) -> usize {
        self.inner.feed.subscriber_count(collection)
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}
