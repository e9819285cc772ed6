//! Category API endpoints.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use super::{require, success, ApiResult};
use crate::filter::CategoryQuery;
use crate::models::{Category, CreateCategoryRequest, UpdateCategoryRequest, User};
use crate::AppState;

/// Query parameters for category deletion.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteCategoryParams {
    #[serde(default)]
    pub cascade: bool,
}

/// GET /api/categories - List the caller's categories.
pub async fn list_categories(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<Vec<Category>> {
    let categories = state.repo.list_categories(&user.uid).await?;
    success(query.apply(categories))
}

/// GET /api/categories/:id - Get a single category.
pub async fn get_category(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> ApiResult<Category> {
    success(state.repo.get_owned_category(&id, &user).await?)
}

/// POST /api/categories - Create a category.
pub async fn create_category(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateCategoryRequest>,
) -> ApiResult<Category> {
    require(&request.name, "Name")?;
    success(state.repo.create_category(&user.uid, &request.name).await?)
}

/// PUT /api/categories/:id - Rename a category.
pub async fn update_category(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    Json(request): Json<UpdateCategoryRequest>,
) -> ApiResult<Category> {
    require(&request.name, "Name")?;
    success(state.repo.update_category(&id, &user, &request).await?)
}

/// DELETE /api/categories/:id - Delete a category.
///
/// With `?cascade=true` the category's tasks and files go too.
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    Query(params): Query<DeleteCategoryParams>,
) -> ApiResult<()> {
    let removal = state
        .repo
        .delete_category(&id, &user, params.cascade)
        .await?;

    if let Err(e) = state.search.remove_tasks(&removal.task_ids).await {
        tracing::warn!("Failed to remove tasks of category {} from index: {}", id, e);
    }

    for file in &removal.files {
        if let Err(e) = state.blobs.delete(&file.created_by, &file.id).await {
            tracing::warn!("Failed to remove blob for file {}: {}", file.id, e);
        }
    }

    if !removal.task_ids.is_empty() || !removal.files.is_empty() {
        tracing::info!(
            "Deleted category {} with {} task(s) and {} file(s)",
            id,
            removal.task_ids.len(),
            removal.files.len()
        );
    }

    success(())
}
