//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record and its enumerations.
//! - Resolve creation defaults and merge partial updates.
//!
//! # Invariants
//! - `title` is non-blank after trim and is stored trimmed, like category
//!   names.
//! - `recurring != Recurrence::None` requires `due_date`.
//! - `due_date` is a local wall-clock reading without timezone.

use crate::model::category::CategoryId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned task identifier.
pub type TaskId = i64;

/// Task urgency level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Ordering weight, higher is more urgent.
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Storage token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Parses either the storage token or the display label.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == normalized)
    }
}

/// Recurrence frequency of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    HalfYearly,
    Yearly,
}

impl Recurrence {
    pub const ALL: [Recurrence; 7] = [
        Recurrence::None,
        Recurrence::Daily,
        Recurrence::Weekly,
        Recurrence::Monthly,
        Recurrence::Quarterly,
        Recurrence::HalfYearly,
        Recurrence::Yearly,
    ];

    pub fn is_recurring(self) -> bool {
        self != Self::None
    }

    /// Storage token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::HalfYearly => "half_yearly",
            Self::Yearly => "yearly",
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Quarterly => "Quarterly",
            Self::HalfYearly => "Half-Yearly",
            Self::Yearly => "Yearly",
        }
    }

    /// Parses the storage token or the display label, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|recurrence| recurrence.as_str() == normalized)
    }
}

/// Write-boundary validation failures for tasks and categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyTitle,
    RecurringWithoutDueDate(Recurrence),
    EmptyCategoryName,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title must not be blank"),
            Self::RecurringWithoutDueDate(recurrence) => write!(
                f,
                "recurring task ({}) requires a due date",
                recurrence.label()
            ),
            Self::EmptyCategoryName => write!(f, "category name must not be blank"),
        }
    }
}

impl Error for ValidationError {}

/// Persisted task row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub notes: String,
    pub priority: Priority,
    /// Not enforced by storage; may point at a missing category.
    pub category_id: CategoryId,
    pub due_date: Option<NaiveDateTime>,
    pub is_completed: bool,
    pub recurring: Recurrence,
}

impl Task {
    /// Checks title and recurrence invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.title, self.recurring, self.due_date)
    }

    /// Merges every field present in `patch` into this task.
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(notes) = &patch.notes {
            self.notes = notes.clone();
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(category_id) = patch.category_id {
            self.category_id = category_id;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(is_completed) = patch.is_completed {
            self.is_completed = is_completed;
        }
        if let Some(recurring) = patch.recurring {
            self.recurring = recurring;
        }
    }

    /// Builds the next occurrence of this task with a new due date.
    ///
    /// The clone keeps title, notes, priority, category and frequency.
    pub fn successor(&self, next_due: NaiveDateTime) -> NewTask {
        NewTask {
            title: self.title.clone(),
            notes: Some(self.notes.clone()),
            priority: Some(self.priority),
            category_id: self.category_id,
            due_date: Some(next_due),
            recurring: Some(self.recurring),
        }
    }
}

/// Input for task creation. `id` and `is_completed` are never caller-provided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub notes: Option<String>,
    pub priority: Option<Priority>,
    pub category_id: CategoryId,
    pub due_date: Option<NaiveDateTime>,
    pub recurring: Option<Recurrence>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, category_id: CategoryId) -> Self {
        Self {
            title: title.into(),
            notes: None,
            priority: None,
            category_id,
            due_date: None,
            recurring: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDateTime) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_recurring(mut self, recurring: Recurrence) -> Self {
        self.recurring = Some(recurring);
        self
    }

    pub fn resolved_notes(&self) -> &str {
        self.notes.as_deref().unwrap_or("")
    }

    pub fn resolved_priority(&self) -> Priority {
        self.priority.unwrap_or_default()
    }

    pub fn resolved_recurring(&self) -> Recurrence {
        self.recurring.unwrap_or_default()
    }

    /// Checks invariants against resolved defaults.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.title, self.resolved_recurring(), self.due_date)
    }
}

/// Partial update. `None` leaves a field untouched.
///
/// `due_date: Some(None)` clears the deadline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub priority: Option<Priority>,
    pub category_id: Option<CategoryId>,
    pub due_date: Option<Option<NaiveDateTime>>,
    pub is_completed: Option<bool>,
    pub recurring: Option<Recurrence>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn completion(is_completed: bool) -> Self {
        Self {
            is_completed: Some(is_completed),
            ..Self::default()
        }
    }
}

fn validate_fields(
    title: &str,
    recurring: Recurrence,
    due_date: Option<NaiveDateTime>,
) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if recurring.is_recurring() && due_date.is_none() {
        return Err(ValidationError::RecurringWithoutDueDate(recurring));
    }
    Ok(())
}
