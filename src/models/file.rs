//! Stored file model.

use serde::{Deserialize, Serialize};

/// Metadata for an uploaded blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub id: String,
    /// Original file name
    pub name: String,
    /// Logical storage key, `"{displayName}'s Files/{name}"`
    pub path: String,
    /// Download URL
    pub url: String,
    pub category: String,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub size: i64,
    pub created_at: String,
}

/// Request body for moving a file to another category.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveFileRequest {
    pub category: String,
}
