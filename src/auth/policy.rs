//! Ownership and sharing rules.
//!
//! Categories and files are private to their owner. Tasks are visible to their
//! owner and collaborators, but only the owner may change them. Resources the
//! caller cannot see are reported as missing rather than forbidden.

use crate::errors::AppError;
use crate::models::{Task, User};

/// Trim a collaborator identity; emails are compared case-insensitively and
/// stored lowercased.
pub fn normalize_identity(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains('@') {
        trimmed.to_lowercase()
    } else {
        trimmed.to_string()
    }
}

/// Union `added` into `existing`, keeping first-seen order.
pub fn merge_collaborators(existing: &[String], added: &[String]) -> Result<Vec<String>, AppError> {
    let mut merged: Vec<String> = existing.to_vec();
    for raw in added {
        let identity = normalize_identity(raw);
        if identity.is_empty() {
            return Err(AppError::Validation(
                "Collaborator must not be empty".to_string(),
            ));
        }
        if !merged.contains(&identity) {
            merged.push(identity);
        }
    }
    Ok(merged)
}

pub fn is_owner(owner_uid: &str, user: &User) -> bool {
    owner_uid == user.uid
}

pub fn is_collaborator(task: &Task, user: &User) -> bool {
    let email = user.email.to_lowercase();
    task.collaborators
        .iter()
        .any(|c| *c == user.uid || *c == email)
}

pub fn can_view_task(task: &Task, user: &User) -> bool {
    is_owner(&task.created_by, user) || is_collaborator(task, user)
}

/// Owner or collaborator; anyone else sees `NOT_FOUND`.
pub fn ensure_can_view_task(task: &Task, user: &User) -> Result<(), AppError> {
    if can_view_task(task, user) {
        Ok(())
    } else {
        Err(task_not_found(&task.id))
    }
}

/// Owner only. Collaborators get `FORBIDDEN`, everyone else `NOT_FOUND`.
pub fn ensure_task_owner(task: &Task, user: &User) -> Result<(), AppError> {
    ensure_can_view_task(task, user)?;
    if is_owner(&task.created_by, user) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the task owner can change this task".to_string(),
        ))
    }
}

/// Owner-only resources (categories, files).
pub fn ensure_owner(owner_uid: &str, user: &User, kind: &str, id: &str) -> Result<(), AppError> {
    if is_owner(owner_uid, user) {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("{} {} not found", kind, id)))
    }
}

pub fn task_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Task {} not found", id))
}
