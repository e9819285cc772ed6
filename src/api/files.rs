//! File API endpoints.

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::header,
    response::Response,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::{require, success, ApiResult};
use crate::db::{duplicate_file, timestamp};
use crate::errors::AppError;
use crate::models::{MoveFileRequest, StoredFile, User};
use crate::storage::{sanitize_file_name, storage_key};
use crate::AppState;

/// Query parameters for the file listing.
#[derive(Debug, Default, Deserialize)]
pub struct FileListParams {
    #[serde(default)]
    pub category: Option<String>,
}

/// A fully read upload form.
struct UploadForm {
    file_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
    category: String,
}

/// GET /api/files - List the caller's files, newest first.
pub async fn list_files(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(params): Query<FileListParams>,
) -> ApiResult<Vec<StoredFile>> {
    let category = params.category.as_deref().filter(|c| !c.is_empty());
    success(state.repo.list_files(&user.uid, category).await?)
}

/// GET /api/files/:id - File metadata.
pub async fn get_file(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> ApiResult<StoredFile> {
    success(state.repo.get_owned_file(&id, &user).await?)
}

/// POST /api/files - Upload a file into a category.
///
/// Expects a `file` part and a `category` text part. Nothing is written
/// unless both are present and the category belongs to the caller.
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    multipart: Multipart,
) -> ApiResult<StoredFile> {
    let form = read_upload_form(multipart).await?;

    state.repo.get_owned_category(&form.category, &user).await?;

    let path = storage_key(&user.display_name, &form.file_name);
    if state.repo.file_path_taken(&user.uid, &path).await? {
        return Err(duplicate_file(&path));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let file = StoredFile {
        url: format!("{}/api/files/{}/content", state.config.public_url, id),
        id,
        name: form.file_name,
        path,
        category: form.category,
        created_by: user.uid.clone(),
        content_type: form.content_type,
        size: form.bytes.len() as i64,
        created_at: timestamp(Utc::now()),
    };

    state.blobs.put(&user.uid, &file.id, &form.bytes).await?;

    if let Err(e) = state.repo.create_file(&user, &file).await {
        // Compensate so the failed upload leaves no blob behind
        if let Err(cleanup) = state.blobs.delete(&user.uid, &file.id).await {
            tracing::warn!("Failed to remove blob for rejected upload {}: {}", file.id, cleanup);
        }
        return Err(e);
    }

    tracing::info!("Stored file {} ({} bytes) for {}", file.id, file.size, user.uid);
    success(file)
}

/// GET /api/files/:id/content - Download the stored bytes.
pub async fn download_file(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let file = state.repo.get_owned_file(&id, &user).await?;
    let bytes = state.blobs.get(&file.created_by, &file.id).await?;

    let content_type = file
        .content_type
        .as_deref()
        .unwrap_or("application/octet-stream");

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", header_safe(&file.name)),
        )
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(format!("Failed to build download response: {}", e)))
}

/// PUT /api/files/:id - Move a file to another category.
pub async fn move_file(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    Json(request): Json<MoveFileRequest>,
) -> ApiResult<StoredFile> {
    require(&request.category, "Category")?;
    success(state.repo.move_file(&id, &user, request.category.trim()).await?)
}

/// DELETE /api/files/:id - Delete a file and its bytes.
pub async fn delete_file(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let file = state.repo.delete_file(&id, &user).await?;

    if let Err(e) = state.blobs.delete(&file.created_by, &file.id).await {
        tracing::warn!("Failed to remove blob for file {}: {}", file.id, e);
    }

    success(())
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;
    let mut category: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let raw_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?.to_vec();
                file = Some((raw_name, content_type, bytes));
            }
            "category" => {
                category = Some(field.text().await?.trim().to_string());
            }
            _ => {}
        }
    }

    let (raw_name, content_type, bytes) =
        file.ok_or_else(|| AppError::Validation("A file is required".to_string()))?;
    let category = category
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("Category is required".to_string()))?;

    Ok(UploadForm {
        file_name: sanitize_file_name(&raw_name)?,
        content_type,
        bytes,
        category,
    })
}

/// Quoted-string safe rendition of a file name for Content-Disposition.
fn header_safe(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect()
}
