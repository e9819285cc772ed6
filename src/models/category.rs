//! Category model.

use serde::{Deserialize, Serialize};

/// A user-owned grouping of tasks and files.
///
/// `tasks` and `files` are derived from the task and file rows that point at
/// this category, so they always agree with what exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub created_by: String,
    /// Ids of tasks in this category
    pub tasks: Vec<String>,
    /// Download URLs of files in this category
    pub files: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

/// Request body for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

/// Request body for renaming a category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: String,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}
