//! In-memory filtering and ordering of task lists.
//!
//! The list endpoint loads every task visible to the caller and narrows it here,
//! so the same rules apply regardless of storage.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::{Category, Task};

/// Completion-state filter.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StatusFilter {
    #[default]
    All,
    Done,
    NotDone,
}

/// Deadline ordering. Tasks without a deadline always come last.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    #[default]
    None,
    Soonest,
    Latest,
}

/// Query parameters accepted by `GET /api/tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    #[serde(default)]
    pub status: StatusFilter,
    /// Case-insensitive substring of the title
    #[serde(default)]
    pub search: Option<String>,
    /// Exact category id
    #[serde(default)]
    pub category: Option<String>,
    /// Deadline window end
    #[serde(default)]
    pub due_by: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sort: SortOrder,
}

impl TaskQuery {
    /// Whether a single task passes every filter.
    pub fn matches(&self, task: &Task, now: DateTime<Utc>) -> bool {
        let matches_status = match self.status {
            StatusFilter::All => true,
            StatusFilter::Done => task.done,
            StatusFilter::NotDone => !task.done,
        };

        let matches_category = self
            .category
            .as_deref()
            .map_or(true, |category| task.category == category);

        let matches_search = self
            .search
            .as_deref()
            .map_or(true, |needle| contains_ignore_case(&task.title, needle));

        let matches_deadline = match (self.due_by, task.deadline) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(due_by), Some(deadline)) => within_window(deadline, due_by, now),
        };

        matches_status && matches_category && matches_search && matches_deadline
    }

    /// Filter and order a task list.
    pub fn apply(&self, tasks: Vec<Task>, now: DateTime<Utc>) -> Vec<Task> {
        let mut filtered: Vec<Task> = tasks
            .into_iter()
            .filter(|task| self.matches(task, now))
            .collect();

        sort_tasks(&mut filtered, self.sort);
        filtered
    }
}

/// Query parameters accepted by `GET /api/categories`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryQuery {
    #[serde(default)]
    pub search: Option<String>,
}

impl CategoryQuery {
    pub fn apply(&self, categories: Vec<Category>) -> Vec<Category> {
        match self.search.as_deref() {
            None => categories,
            Some(needle) => categories
                .into_iter()
                .filter(|category| contains_ignore_case(&category.name, needle))
                .collect(),
        }
    }
}

/// Stable sort by deadline; `SortOrder::None` keeps the input order.
pub fn sort_tasks(tasks: &mut [Task], order: SortOrder) {
    if order == SortOrder::None {
        return;
    }
    tasks.sort_by(|a, b| compare_deadlines(a.deadline, b.deadline, order));
}

fn compare_deadlines(
    a: Option<DateTime<Utc>>,
    b: Option<DateTime<Utc>>,
    order: SortOrder,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match order {
            SortOrder::Latest => b.cmp(&a),
            SortOrder::Soonest | SortOrder::None => a.cmp(&b),
        },
    }
}

/// A deadline is in the window when it equals the window end, or lies
/// strictly between now and the window end.
fn within_window(deadline: DateTime<Utc>, due_by: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    deadline == due_by || (deadline < due_by && deadline > now)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
