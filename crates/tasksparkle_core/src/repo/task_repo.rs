//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and bulk APIs over the `tasks` table.
//! - Own the two-write rollover unit used when a recurring task completes.
//!
//! # Invariants
//! - Write paths validate before any SQL mutation.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Rollover writes commit together or not at all.

use crate::db::DbError;
use crate::model::category::CategoryId;
use crate::model::task::{NewTask, Priority, Recurrence, Task, TaskId, ValidationError};
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Text layout of `tasks.due_date`.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    notes,
    priority,
    category_id,
    due_date,
    is_completed,
    recurring
FROM tasks";

pub type RepoResult<T> = Result<T, RepoError>;

/// Which collection a missing id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Task,
    Category,
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Task => write!(f, "task"),
            Self::Category => write!(f, "category"),
        }
    }
}

/// Repository error for task/category persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound(Entity, i64),
    InvalidData(String),
    /// Closing the original failed after the successor insert; the
    /// surrounding transaction was rolled back, including that insert.
    RolloverInterrupted {
        task_id: TaskId,
        cause: Box<RepoError>,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(entity, id) => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::RolloverInterrupted { task_id, cause } => write!(
                f,
                "rollover of task {task_id} interrupted and rolled back: {cause}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::RolloverInterrupted { cause, .. } => Some(cause.as_ref()),
            Self::NotFound(..) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Raw listing options. Results are ordered by `id ASC`; display ordering
/// belongs to the query pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    pub category_id: Option<CategoryId>,
    pub is_completed: Option<bool>,
}

/// Repository interface for task persistence.
pub trait TaskRepository {
    fn create_task(&self, task: &NewTask) -> RepoResult<TaskId>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Replaces every mutable column of an existing row.
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    /// Returns whether the flag actually flipped.
    fn set_completed(&self, id: TaskId, is_completed: bool) -> RepoResult<bool>;
    /// Returns whether a row was removed.
    fn delete_task(&self, id: TaskId) -> RepoResult<bool>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    /// Deletes every completed row and returns the count.
    fn delete_completed(&self) -> RepoResult<usize>;
    /// Inserts `successor` and closes `original` (completed, non-recurring).
    fn roll_over(&self, original: &Task, successor: &NewTask) -> RepoResult<TaskId>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &NewTask) -> RepoResult<TaskId> {
        insert_task(self.conn, task)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                notes = ?2,
                priority = ?3,
                category_id = ?4,
                due_date = ?5,
                is_completed = ?6,
                recurring = ?7
             WHERE id = ?8;",
            params![
                task.title.trim(),
                task.notes.as_str(),
                task.priority.as_str(),
                task.category_id,
                task.due_date.map(format_due_date),
                bool_to_int(task.is_completed),
                task.recurring.as_str(),
                task.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(Entity::Task, task.id));
        }
        Ok(())
    }

    fn set_completed(&self, id: TaskId, is_completed: bool) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE tasks SET is_completed = ?1 WHERE id = ?2 AND is_completed <> ?1;",
            params![bool_to_int(is_completed), id],
        )?;
        if changed > 0 {
            return Ok(true);
        }
        if !task_exists(self.conn, id)? {
            return Err(RepoError::NotFound(Entity::Task, id));
        }
        Ok(false)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<bool> {
        let changed = self.conn.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(category_id) = query.category_id {
            sql.push_str(" AND category_id = ?");
            bind_values.push(Value::Integer(category_id));
        }
        if let Some(is_completed) = query.is_completed {
            sql.push_str(" AND is_completed = ?");
            bind_values.push(Value::Integer(bool_to_int(is_completed)));
        }
        sql.push_str(" ORDER BY id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn delete_completed(&self) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM tasks WHERE is_completed = 1;", [])?;
        Ok(removed)
    }

    fn roll_over(&self, original: &Task, successor: &NewTask) -> RepoResult<TaskId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let successor_id = insert_task(&tx, successor)?;

        if let Err(cause) = close_original(&tx, original.id) {
            // Dropping `tx` rolls the successor insert back, so its id is
            // never handed out.
            return Err(RepoError::RolloverInterrupted {
                task_id: original.id,
                cause: Box::new(cause),
            });
        }

        tx.commit()?;
        Ok(successor_id)
    }
}

fn insert_task(conn: &Connection, task: &NewTask) -> RepoResult<TaskId> {
    task.validate()?;

    conn.execute(
        "INSERT INTO tasks (
            title,
            notes,
            priority,
            category_id,
            due_date,
            is_completed,
            recurring
        ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6);",
        params![
            task.title.trim(),
            task.resolved_notes(),
            task.resolved_priority().as_str(),
            task.category_id,
            task.due_date.map(format_due_date),
            task.resolved_recurring().as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn task_exists(conn: &Connection, id: TaskId) -> RepoResult<bool> {
    let found = conn
        .query_row("SELECT 1 FROM tasks WHERE id = ?1;", [id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

fn close_original(conn: &Connection, id: TaskId) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE tasks SET is_completed = 1, recurring = 'none' WHERE id = ?1;",
        [id],
    )?;
    if changed == 0 {
        return Err(RepoError::NotFound(Entity::Task, id));
    }
    Ok(())
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id: TaskId = row.get("id")?;

    let priority_text: String = row.get("priority")?;
    let priority = Priority::parse(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_text}` in tasks.priority (id={id})"
        ))
    })?;

    let recurring_text: String = row.get("recurring")?;
    let recurring = Recurrence::parse(&recurring_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid recurrence `{recurring_text}` in tasks.recurring (id={id})"
        ))
    })?;

    let due_date = match row.get::<_, Option<String>>("due_date")? {
        Some(value) => Some(parse_due_date(&value).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid due date `{value}` in tasks.due_date (id={id})"
            ))
        })?),
        None => None,
    };

    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_completed value `{other}` in tasks.is_completed (id={id})"
            )));
        }
    };

    let task = Task {
        id,
        title: row.get("title")?,
        notes: row.get("notes")?,
        priority,
        category_id: row.get("category_id")?,
        due_date,
        is_completed,
        recurring,
    };
    task.validate()?;
    Ok(task)
}

/// Formats a due date the way it is persisted.
pub fn format_due_date(value: NaiveDateTime) -> String {
    value.format(DUE_DATE_FORMAT).to_string()
}

/// Parses a persisted due date; a bare `YYYY-MM-DD` means midnight.
pub fn parse_due_date(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    NaiveDateTime::parse_from_str(trimmed, DUE_DATE_FORMAT)
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::{
        format_due_date, parse_due_date, Entity, RepoError, SqliteTaskRepository, TaskRepository,
    };
    use crate::db::open_db_in_memory;
    use crate::model::task::{NewTask, TaskPatch};
    use chrono::NaiveDate;

    #[test]
    fn due_date_text_is_stable() {
        let value = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(format_due_date(value), "2024-05-01T09:30:00");
        assert_eq!(parse_due_date("2024-05-01T09:30:00"), Some(value));
    }

    #[test]
    fn bare_date_parses_as_midnight() {
        let parsed = parse_due_date("2024-05-01").expect("date-only should parse");
        assert_eq!(parsed.format("%H:%M:%S").to_string(), "00:00:00");
        assert!(parse_due_date("May 1st").is_none());
    }

    #[test]
    fn set_completed_reports_whether_the_flag_flipped() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteTaskRepository::new(&conn);
        let id = repo.create_task(&NewTask::new("stretch", 1)).unwrap();

        assert!(!repo.set_completed(id, false).unwrap());
        assert!(repo.set_completed(id, true).unwrap());
        assert!(!repo.set_completed(id, true).unwrap());
        assert!(matches!(
            repo.set_completed(id + 100, true),
            Err(RepoError::NotFound(Entity::Task, _))
        ));
    }

    #[test]
    fn titles_are_stored_trimmed() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteTaskRepository::new(&conn);
        let id = repo.create_task(&NewTask::new("  call bank \n", 1)).unwrap();
        let mut task = repo.get_task(id).unwrap().unwrap();
        assert_eq!(task.title, "call bank");

        task.apply_patch(&TaskPatch {
            title: Some(" call bank again ".to_string()),
            ..TaskPatch::default()
        });
        assert_eq!(task.title, "call bank again");
        repo.update_task(&task).unwrap();
        assert_eq!(repo.get_task(id).unwrap().unwrap().title, "call bank again");
    }
}
