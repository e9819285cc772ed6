//! Search API endpoints.

use axum::{
    extract::{Query, State},
    Extension,
};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::auth::policy;
use crate::errors::AppError;
use crate::models::{Task, User};
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string.
    pub q: String,
    /// Maximum number of results (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

/// Search result with tasks and metadata.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    /// Number of indexed matches across all pages.
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Single search result item.
#[derive(Debug, Serialize)]
pub struct SearchResultItem {
    pub task: Task,
    pub score: f32,
}

/// Maximum number of search results allowed.
const MAX_SEARCH_LIMIT: usize = 100;

/// Deepest page start a client may request.
const MAX_SEARCH_OFFSET: usize = 10_000;

/// GET /api/search - Full-text search over visible tasks.
pub async fn search_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchResponse> {
    if params.offset > MAX_SEARCH_OFFSET {
        return Err(AppError::Validation(format!(
            "Offset must not exceed {}",
            MAX_SEARCH_OFFSET
        )));
    }
    let limit = params.limit.clamp(1, MAX_SEARCH_LIMIT);

    let page = state.search.search(&user, &params.q, limit, params.offset)?;

    // The index can lag behind the database; the stored row is authoritative
    let mut results = Vec::with_capacity(page.hits.len());
    for hit in page.hits {
        if let Some(task) = state.repo.get_task(&hit.task_id).await? {
            if policy::can_view_task(&task, &user) {
                results.push(SearchResultItem {
                    task,
                    score: hit.score,
                });
            }
        }
    }

    success(SearchResponse {
        results,
        total: page.total,
        limit,
        offset: params.offset,
    })
}
