//! Task model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::deserialize_some;

/// A to-do item inside a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub done: bool,
    /// Owning category id
    pub category: String,
    pub created_by: String,
    /// Emails or uids of users the task is shared with
    #[serde(default)]
    pub collaborators: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

/// Request body for creating a task.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    /// Existing category id
    #[serde(default)]
    pub category: Option<String>,
    /// Creates a new category for the task when `category` is absent
    #[serde(default)]
    pub new_category_name: Option<String>,
    #[serde(default)]
    pub collaborators: Vec<String>,
}

/// Request body for updating a task. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// `null` clears the deadline
    #[serde(default, deserialize_with = "deserialize_some")]
    pub deadline: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub category: Option<String>,
    /// Merged into the existing collaborator list
    #[serde(default)]
    pub collaborators: Option<Vec<String>>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Request body for sharing a task with one more user.
#[derive(Debug, Clone, Deserialize)]
pub struct AddCollaboratorRequest {
    pub collaborator: String,
}
