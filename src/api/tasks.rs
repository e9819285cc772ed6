//! Task API endpoints.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};

use super::{require, success, ApiResult};
use crate::auth::policy;
use crate::errors::AppError;
use crate::filter::TaskQuery;
use crate::models::{AddCollaboratorRequest, CreateTaskRequest, Task, UpdateTaskRequest, User};
use crate::AppState;

/// GET /api/tasks - List tasks visible to the caller.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<TaskQuery>,
) -> ApiResult<Vec<Task>> {
    let tasks = state.repo.list_visible_tasks(&user).await?;
    success(query.apply(tasks, Utc::now()))
}

/// GET /api/tasks/:id - Get a single task.
pub async fn get_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> ApiResult<Task> {
    let task = state
        .repo
        .get_task(&id)
        .await?
        .ok_or_else(|| policy::task_not_found(&id))?;
    policy::ensure_can_view_task(&task, &user)?;
    success(task)
}

/// POST /api/tasks - Create a task.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateTaskRequest>,
) -> ApiResult<Task> {
    require(&request.title, "Title")?;

    let has_category = request
        .category
        .as_deref()
        .is_some_and(|c| !c.trim().is_empty());
    let has_new_category = request
        .new_category_name
        .as_deref()
        .is_some_and(|n| !n.trim().is_empty());
    if !has_category && !has_new_category {
        return Err(AppError::Validation(
            "Either category or newCategoryName is required".to_string(),
        ));
    }

    if let Some(deadline) = request.deadline {
        ensure_not_past(deadline, Utc::now())?;
    }

    let task = state.repo.create_task(&user, &request).await?;
    reindex(&state, &task).await;
    success(task)
}

/// PUT /api/tasks/:id - Update a task.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTaskRequest>,
) -> ApiResult<Task> {
    if let Some(title) = &request.title {
        require(title, "Title")?;
    }

    let task = state.repo.update_task(&id, &user, &request).await?;
    reindex(&state, &task).await;
    success(task)
}

/// POST /api/tasks/:id/toggle - Flip the done flag.
pub async fn toggle_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> ApiResult<Task> {
    success(state.repo.toggle_task(&id, &user).await?)
}

/// POST /api/tasks/:id/collaborators - Share a task with another user.
pub async fn add_collaborator(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    Json(request): Json<AddCollaboratorRequest>,
) -> ApiResult<Task> {
    require(&request.collaborator, "Collaborator")?;

    let update = UpdateTaskRequest {
        collaborators: Some(vec![request.collaborator]),
        ..Default::default()
    };
    let task = state.repo.update_task(&id, &user, &update).await?;
    reindex(&state, &task).await;
    success(task)
}

/// DELETE /api/tasks/:id - Delete a task.
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_task(&id, &user).await?;

    if let Err(e) = state.search.remove_tasks(&[id.clone()]).await {
        tracing::warn!("Failed to remove task {} from index: {}", id, e);
    }

    success(())
}

async fn reindex(state: &AppState, task: &Task) {
    if let Err(e) = state.search.index_task(task).await {
        tracing::warn!("Failed to index task {}: {}", task.id, e);
    }
}

/// New deadlines may be today or later, compared by UTC calendar day.
fn ensure_not_past(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), AppError> {
    if deadline.date_naive() < now.date_naive() {
        return Err(AppError::Validation(
            "Deadline cannot be in the past".to_string(),
        ));
    }
    Ok(())
}
