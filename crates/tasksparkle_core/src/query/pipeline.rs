//! Deterministic task ordering, category filtering and header metrics.
//!
//! # Invariants
//! - Ordering is total: incomplete first, then dated before undated with
//!   earlier dates first, then higher priority, then ascending id.
//! - Metrics are computed over the filtered set.
//! - `progress` is `0.0` for an empty set, never NaN.

use crate::model::category::CategoryId;
use crate::model::task::Task;
use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Optional category restriction applied before sorting and metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(CategoryId),
}

impl CategoryFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Only(category_id) => task.category_id == category_id,
        }
    }

    pub fn category_id(self) -> Option<CategoryId> {
        match self {
            Self::All => None,
            Self::Only(category_id) => Some(category_id),
        }
    }
}

impl From<Option<CategoryId>> for CategoryFilter {
    fn from(value: Option<CategoryId>) -> Self {
        value.map_or(Self::All, Self::Only)
    }
}

/// Aggregates shown above the task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskMetrics {
    pub total: usize,
    pub completed: usize,
    pub pending_today: usize,
    /// Percentage in `[0, 100]`.
    pub progress: f64,
}

/// Sorted, filtered tasks plus their metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    pub filter: CategoryFilter,
    pub tasks: Vec<Task>,
    pub metrics: TaskMetrics,
}

/// Keeps tasks matching `filter`, preserving input order.
pub fn filter_tasks(tasks: Vec<Task>, filter: CategoryFilter) -> Vec<Task> {
    tasks
        .into_iter()
        .filter(|task| filter.matches(task))
        .collect()
}

/// Display comparator; first differing key wins.
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    a.is_completed
        .cmp(&b.is_completed)
        .then_with(|| compare_due_dates(a.due_date, b.due_date))
        .then_with(|| b.priority.rank().cmp(&a.priority.rank()))
        .then_with(|| a.id.cmp(&b.id))
}

fn compare_due_dates(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(compare_tasks);
}

/// Computes metrics; `today` is the caller's local calendar day.
pub fn compute_metrics(tasks: &[Task], today: NaiveDate) -> TaskMetrics {
    let total = tasks.len();
    if total == 0 {
        return TaskMetrics::default();
    }

    let completed = tasks.iter().filter(|task| task.is_completed).count();
    let (day_start, day_end) = day_bounds(today);
    let pending_today = tasks
        .iter()
        .filter(|task| !task.is_completed)
        .filter_map(|task| task.due_date)
        .filter(|due| *due >= day_start && day_end.map_or(true, |end| *due < end))
        .count();

    TaskMetrics {
        total,
        completed,
        pending_today,
        progress: completed as f64 / total as f64 * 100.0,
    }
}

/// `[start of day, start of next day)`; the end is `None` only at the
/// calendar maximum.
fn day_bounds(day: NaiveDate) -> (NaiveDateTime, Option<NaiveDateTime>) {
    let start = day.and_time(chrono::NaiveTime::MIN);
    let end = day
        .checked_add_days(Days::new(1))
        .map(|next| next.and_time(chrono::NaiveTime::MIN));
    (start, end)
}

/// Runs filter, sort and metrics in one pass over a raw snapshot.
pub fn build_task_view(tasks: Vec<Task>, filter: CategoryFilter, today: NaiveDate) -> TaskView {
    let mut tasks = filter_tasks(tasks, filter);
    sort_tasks(&mut tasks);
    let metrics = compute_metrics(&tasks, today);
    TaskView {
        filter,
        tasks,
        metrics,
    }
}
