//! Database repository for CRUD operations.
//!
//! Uses prepared statements, version-checked updates and transactions for
//! writes that touch more than one row. Ownership rules from
//! [`crate::auth::policy`] are checked here so they hold inside the same
//! transaction as the write.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::auth::policy;
use crate::errors::AppError;
use crate::models::{
    Category, CreateTaskRequest, RegisterRequest, StoredFile, Task, UpdateCategoryRequest,
    UpdateTaskRequest, User,
};

/// Category columns plus the derived task-id and file-url arrays.
const CATEGORY_SELECT: &str = r#"SELECT c.id, c.name, c.created_by, c.created_at, c.updated_at, c.version,
        (SELECT json_group_array(t.id) FROM tasks t WHERE t.category_id = c.id) AS task_ids,
        (SELECT json_group_array(f.url) FROM files f WHERE f.category_id = c.id) AS file_urls
    FROM categories c"#;

const TASK_COLUMNS: &str = "id, title, description, deadline, done, category_id, created_by, \
     collaborators, created_at, updated_at, version";

const FILE_COLUMNS: &str =
    "id, name, storage_path, url, category_id, created_by, content_type, size_bytes, created_at";

const USER_COLUMNS: &str = "u.id, u.email, u.display_name, u.photo_url, u.created_at";

/// Rows removed by a cascading category delete.
#[derive(Debug, Default)]
pub struct CategoryRemoval {
    pub task_ids: Vec<String>,
    pub files: Vec<StoredFile>,
}

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== USER & SESSION OPERATIONS ====================

    /// Create an account. Emails are unique, compared lowercased.
    pub async fn create_user(
        &self,
        request: &RegisterRequest,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let uid = uuid::Uuid::new_v4().to_string();
        let now = timestamp(Utc::now());
        let email = request.email.trim().to_lowercase();
        let display_name = request.display_name.trim().to_string();

        let result = sqlx::query(
            "INSERT INTO users (id, email, display_name, photo_url, password_hash, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&uid)
        .bind(&email)
        .bind(&display_name)
        .bind(&request.photo_url)
        .bind(password_hash)
        .bind(&now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(AppError::InUse(format!(
                    "An account for {} already exists",
                    email
                )));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(User {
            uid,
            display_name,
            email,
            photo_url: request.photo_url.clone(),
            created_at: now,
        })
    }

    /// Look up a user and their password hash by email.
    pub async fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>, AppError> {
        let sql = format!(
            "SELECT {}, u.password_hash FROM users u WHERE u.email = ?",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| (user_from_row(&row), row.get("password_hash"))))
    }

    /// Issue a new session token for a user.
    pub async fn create_session(
        &self,
        user_id: &str,
        ttl_hours: i64,
    ) -> Result<(String, String), AppError> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        let expires_at = timestamp(now + Duration::hours(ttl_hours));

        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&token)
        .bind(user_id)
        .bind(timestamp(now))
        .bind(&expires_at)
        .execute(&self.pool)
        .await?;

        Ok((token, expires_at))
    }

    /// Resolve an unexpired session token to its user.
    pub async fn user_for_session(&self, token: &str) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT {} FROM sessions s JOIN users u ON u.id = s.user_id WHERE s.token = ? AND s.expires_at > ?",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(token)
            .bind(timestamp(Utc::now()))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Revoke a session token.
    pub async fn delete_session(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ==================== CATEGORY OPERATIONS ====================

    /// List the categories owned by a user.
    pub async fn list_categories(&self, owner_uid: &str) -> Result<Vec<Category>, AppError> {
        let sql = format!(
            "{} WHERE c.created_by = ? ORDER BY c.name COLLATE NOCASE, c.id",
            CATEGORY_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(owner_uid)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(category_from_row).collect())
    }

    /// Get a category by ID.
    pub async fn get_category(&self, id: &str) -> Result<Option<Category>, AppError> {
        let sql = format!("{} WHERE c.id = ?", CATEGORY_SELECT);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(category_from_row))
    }

    /// Get a category the user owns, or `NOT_FOUND`.
    pub async fn get_owned_category(&self, id: &str, user: &User) -> Result<Category, AppError> {
        let category = self
            .get_category(id)
            .await?
            .ok_or_else(|| category_not_found(id))?;
        policy::ensure_owner(&category.created_by, user, "Category", id)?;
        Ok(category)
    }

    /// Create a new, empty category.
    pub async fn create_category(&self, owner_uid: &str, name: &str) -> Result<Category, AppError> {
        let mut tx = self.pool.begin().await?;
        let category = insert_category(&mut tx, owner_uid, name).await?;
        tx.commit().await?;
        Ok(category)
    }

    /// Rename a category with optimistic concurrency control.
    pub async fn update_category(
        &self,
        id: &str,
        user: &User,
        request: &UpdateCategoryRequest,
    ) -> Result<Category, AppError> {
        let existing = self.get_owned_category(id, user).await?;

        // Check version for optimistic concurrency
        if let Some(expected) = request.expected_version {
            if existing.version != expected {
                return Err(AppError::Conflict {
                    message: format!(
                        "Version mismatch: expected {}, current {}",
                        expected, existing.version
                    ),
                    current_version: existing.version,
                });
            }
        }

        let now = timestamp(Utc::now());
        let new_version = existing.version + 1;
        let name = request.name.trim().to_string();

        let result = sqlx::query(
            "UPDATE categories SET name = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(&name)
        .bind(&now)
        .bind(new_version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Race condition - version changed between read and write
            let current = self.get_category(id).await?;
            return Err(AppError::Conflict {
                message: "Concurrent modification detected".to_string(),
                current_version: current.map(|c| c.version).unwrap_or(0),
            });
        }

        Ok(Category {
            name,
            updated_at: now,
            version: new_version,
            ..existing
        })
    }

    /// Delete a category.
    ///
    /// Without `cascade` a category that still holds tasks or files is left
    /// alone and `CONFLICT` is returned. With `cascade` its tasks and file rows
    /// go in the same transaction; the caller removes blobs and index entries.
    pub async fn delete_category(
        &self,
        id: &str,
        user: &User,
        cascade: bool,
    ) -> Result<CategoryRemoval, AppError> {
        let mut tx = self.pool.begin().await?;
        ensure_owned_category_tx(&mut tx, id, user).await?;

        let task_ids: Vec<String> =
            sqlx::query("SELECT id FROM tasks WHERE category_id = ? ORDER BY created_at, id")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?
                .iter()
                .map(|row| row.get("id"))
                .collect();

        let sql = format!(
            "SELECT {} FROM files WHERE category_id = ? ORDER BY created_at, id",
            FILE_COLUMNS
        );
        let files: Vec<StoredFile> = sqlx::query(&sql)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(file_from_row)
            .collect();

        if !cascade && (!task_ids.is_empty() || !files.is_empty()) {
            return Err(AppError::InUse(format!(
                "Category {} still has {} task(s) and {} file(s)",
                id,
                task_ids.len(),
                files.len()
            )));
        }

        sqlx::query("DELETE FROM tasks WHERE category_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM files WHERE category_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(CategoryRemoval { task_ids, files })
    }

    // ==================== TASK OPERATIONS ====================

    /// List tasks the user owns or collaborates on, oldest first.
    pub async fn list_visible_tasks(&self, user: &User) -> Result<Vec<Task>, AppError> {
        let sql = format!(
            r#"SELECT {} FROM tasks
               WHERE created_by = ?
                  OR EXISTS (SELECT 1 FROM json_each(tasks.collaborators)
                             WHERE json_each.value IN (?, ?))
               ORDER BY created_at, id"#,
            TASK_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(&user.uid)
            .bind(&user.uid)
            .bind(user.email.to_lowercase())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(task_from_row).collect())
    }

    /// List every task, for rebuilding the search index.
    pub async fn list_all_tasks(&self) -> Result<Vec<Task>, AppError> {
        let sql = format!("SELECT {} FROM tasks ORDER BY created_at, id", TASK_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(task_from_row).collect())
    }

    /// Get a task by ID.
    pub async fn get_task(&self, id: &str) -> Result<Option<Task>, AppError> {
        let sql = format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(task_from_row))
    }

    /// Create a task, optionally together with a new category.
    pub async fn create_task(
        &self,
        user: &User,
        request: &CreateTaskRequest,
    ) -> Result<Task, AppError> {
        let collaborators = policy::merge_collaborators(&[], &request.collaborators)?;
        let collaborators_json = serde_json::to_string(&collaborators)?;

        let mut tx = self.pool.begin().await?;

        let existing_category = request
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let new_category_name = request
            .new_category_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let category_id = match (existing_category, new_category_name) {
            (Some(category_id), _) => {
                ensure_owned_category_tx(&mut tx, category_id, user).await?;
                category_id.to_string()
            }
            (None, Some(name)) => insert_category(&mut tx, &user.uid, name).await?.id,
            (None, None) => {
                return Err(AppError::Validation("Category is required".to_string()));
            }
        };

        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp(Utc::now());
        let description = non_blank(request.description.as_deref());

        sqlx::query(
            r#"INSERT INTO tasks (
                id, title, description, deadline, done, category_id, created_by,
                collaborators, created_at, updated_at, version
            ) VALUES (?, ?, ?, ?, 0, ?, ?, ?, ?, ?, 1)"#,
        )
        .bind(&id)
        .bind(request.title.trim())
        .bind(&description)
        .bind(request.deadline.map(timestamp))
        .bind(&category_id)
        .bind(&user.uid)
        .bind(&collaborators_json)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Task {
            id,
            title: request.title.trim().to_string(),
            description,
            deadline: request.deadline,
            done: false,
            category: category_id,
            created_by: user.uid.clone(),
            collaborators,
            created_at: now.clone(),
            updated_at: now,
            version: 1,
        })
    }

    /// Update a task with optimistic concurrency control.
    ///
    /// Moving a task is a single row update, so the old category stops listing
    /// it at the same moment the new one starts.
    pub async fn update_task(
        &self,
        id: &str,
        user: &User,
        request: &UpdateTaskRequest,
    ) -> Result<Task, AppError> {
        let existing = self
            .get_task(id)
            .await?
            .ok_or_else(|| policy::task_not_found(id))?;
        policy::ensure_task_owner(&existing, user)?;

        // Check version for optimistic concurrency
        if let Some(expected) = request.expected_version {
            if existing.version != expected {
                return Err(AppError::Conflict {
                    message: format!(
                        "Version mismatch: expected {}, current {}",
                        expected, existing.version
                    ),
                    current_version: existing.version,
                });
            }
        }

        let now = timestamp(Utc::now());
        let new_version = existing.version + 1;

        let title = request
            .title
            .as_deref()
            .map(|t| t.trim().to_string())
            .unwrap_or_else(|| existing.title.clone());
        let description = match request.description.as_deref() {
            Some(d) => non_blank(Some(d)),
            None => existing.description.clone(),
        };
        let deadline = request.deadline.unwrap_or(existing.deadline);
        let collaborators = match &request.collaborators {
            Some(added) => policy::merge_collaborators(&existing.collaborators, added)?,
            None => existing.collaborators.clone(),
        };
        let collaborators_json = serde_json::to_string(&collaborators)?;

        let mut tx = self.pool.begin().await?;

        let category = match request.category.as_deref().map(str::trim) {
            Some(category_id) if category_id != existing.category => {
                ensure_owned_category_tx(&mut tx, category_id, user).await?;
                category_id.to_string()
            }
            _ => existing.category.clone(),
        };

        let result = sqlx::query(
            r#"UPDATE tasks SET
                title = ?, description = ?, deadline = ?, category_id = ?,
                collaborators = ?, updated_at = ?, version = ?
            WHERE id = ? AND version = ?"#,
        )
        .bind(&title)
        .bind(&description)
        .bind(deadline.map(timestamp))
        .bind(&category)
        .bind(&collaborators_json)
        .bind(&now)
        .bind(new_version)
        .bind(id)
        .bind(existing.version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Race condition - version changed between read and write
            tx.rollback().await?;
            return Err(self.task_conflict(id).await?);
        }

        tx.commit().await?;

        Ok(Task {
            title,
            description,
            deadline,
            category,
            collaborators,
            updated_at: now,
            version: new_version,
            ..existing
        })
    }

    /// Flip a task's done flag.
    pub async fn toggle_task(&self, id: &str, user: &User) -> Result<Task, AppError> {
        let existing = self
            .get_task(id)
            .await?
            .ok_or_else(|| policy::task_not_found(id))?;
        policy::ensure_task_owner(&existing, user)?;

        let now = timestamp(Utc::now());
        let done = !existing.done;
        let new_version = existing.version + 1;

        let result = sqlx::query(
            "UPDATE tasks SET done = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(done as i32)
        .bind(&now)
        .bind(new_version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.task_conflict(id).await?);
        }

        Ok(Task {
            done,
            updated_at: now,
            version: new_version,
            ..existing
        })
    }

    /// Conflict error carrying the version the task has now.
    async fn task_conflict(&self, id: &str) -> Result<AppError, AppError> {
        let current = self.get_task(id).await?;
        Ok(AppError::Conflict {
            message: "Concurrent modification detected".to_string(),
            current_version: current.map(|t| t.version).unwrap_or(0),
        })
    }

    /// Delete a task.
    pub async fn delete_task(&self, id: &str, user: &User) -> Result<(), AppError> {
        let existing = self
            .get_task(id)
            .await?
            .ok_or_else(|| policy::task_not_found(id))?;
        policy::ensure_task_owner(&existing, user)?;

        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(policy::task_not_found(id));
        }

        Ok(())
    }

    // ==================== FILE OPERATIONS ====================

    /// List a user's files, newest first, optionally for one category.
    pub async fn list_files(
        &self,
        owner_uid: &str,
        category: Option<&str>,
    ) -> Result<Vec<StoredFile>, AppError> {
        let sql = format!(
            "SELECT {} FROM files WHERE created_by = ? AND (? IS NULL OR category_id = ?) ORDER BY created_at DESC, id",
            FILE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(owner_uid)
            .bind(category)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(file_from_row).collect())
    }

    /// Get file metadata by ID.
    pub async fn get_file(&self, id: &str) -> Result<Option<StoredFile>, AppError> {
        let sql = format!("SELECT {} FROM files WHERE id = ?", FILE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(file_from_row))
    }

    /// Get a file the user owns, or `NOT_FOUND`.
    pub async fn get_owned_file(&self, id: &str, user: &User) -> Result<StoredFile, AppError> {
        let file = self
            .get_file(id)
            .await?
            .ok_or_else(|| file_not_found(id))?;
        policy::ensure_owner(&file.created_by, user, "File", id)?;
        Ok(file)
    }

    /// Whether the user already stored a file under this logical path.
    pub async fn file_path_taken(&self, owner_uid: &str, path: &str) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT 1 AS taken FROM files WHERE created_by = ? AND storage_path = ?")
            .bind(owner_uid)
            .bind(path)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Record an uploaded file. The blob must already be written.
    pub async fn create_file(&self, user: &User, file: &StoredFile) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        ensure_owned_category_tx(&mut tx, &file.category, user).await?;

        let result = sqlx::query(&format!(
            "INSERT INTO files ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            FILE_COLUMNS
        ))
        .bind(&file.id)
        .bind(&file.name)
        .bind(&file.path)
        .bind(&file.url)
        .bind(&file.category)
        .bind(&file.created_by)
        .bind(&file.content_type)
        .bind(file.size)
        .bind(&file.created_at)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(duplicate_file(&file.path));
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;
        Ok(())
    }

    /// Move a file to another category owned by the same user.
    pub async fn move_file(
        &self,
        id: &str,
        user: &User,
        category_id: &str,
    ) -> Result<StoredFile, AppError> {
        let existing = self.get_owned_file(id, user).await?;

        let mut tx = self.pool.begin().await?;
        ensure_owned_category_tx(&mut tx, category_id, user).await?;

        sqlx::query("UPDATE files SET category_id = ? WHERE id = ?")
            .bind(category_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(StoredFile {
            category: category_id.to_string(),
            ..existing
        })
    }

    /// Delete a file row and return it so the caller can remove the blob.
    pub async fn delete_file(&self, id: &str, user: &User) -> Result<StoredFile, AppError> {
        let existing = self.get_owned_file(id, user).await?;

        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(file_not_found(id));
        }

        Ok(existing)
    }
}

// Transaction helpers

async fn insert_category(
    tx: &mut Transaction<'_, Sqlite>,
    owner_uid: &str,
    name: &str,
) -> Result<Category, AppError> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = timestamp(Utc::now());
    let name = name.trim().to_string();

    sqlx::query(
        "INSERT INTO categories (id, name, created_by, created_at, updated_at, version) VALUES (?, ?, ?, ?, ?, 1)",
    )
    .bind(&id)
    .bind(&name)
    .bind(owner_uid)
    .bind(&now)
    .bind(&now)
    .execute(&mut **tx)
    .await?;

    Ok(Category {
        id,
        name,
        created_by: owner_uid.to_string(),
        tasks: Vec::new(),
        files: Vec::new(),
        created_at: now.clone(),
        updated_at: now,
        version: 1,
    })
}

async fn ensure_owned_category_tx(
    tx: &mut Transaction<'_, Sqlite>,
    id: &str,
    user: &User,
) -> Result<(), AppError> {
    let row = sqlx::query("SELECT created_by FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| category_not_found(id))?;

    let owner: String = row.get("created_by");
    policy::ensure_owner(&owner, user, "Category", id)
}

fn category_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Category {} not found", id))
}

fn file_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("File {} not found", id))
}

pub fn duplicate_file(path: &str) -> AppError {
    AppError::InUse(format!("A file named {:?} already exists", path))
}

/// Fixed-width RFC 3339 so stored timestamps order correctly as text.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// Helper functions for row conversion

fn user_from_row(row: &SqliteRow) -> User {
    User {
        uid: row.get("id"),
        display_name: row.get("display_name"),
        email: row.get("email"),
        photo_url: row.get("photo_url"),
        created_at: row.get("created_at"),
    }
}

fn category_from_row(row: &SqliteRow) -> Category {
    let task_ids: Option<String> = row.get("task_ids");
    let file_urls: Option<String> = row.get("file_urls");
    Category {
        id: row.get("id"),
        name: row.get("name"),
        created_by: row.get("created_by"),
        tasks: task_ids.map(|s| parse_json_array(&s)).unwrap_or_default(),
        files: file_urls.map(|s| parse_json_array(&s)).unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}

fn task_from_row(row: &SqliteRow) -> Task {
    let done: i32 = row.get("done");
    let deadline: Option<String> = row.get("deadline");
    let collaborators: String = row.get("collaborators");
    Task {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        deadline: deadline.as_deref().and_then(parse_timestamp),
        done: done != 0,
        category: row.get("category_id"),
        created_by: row.get("created_by"),
        collaborators: parse_json_array(&collaborators),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}

fn file_from_row(row: &SqliteRow) -> StoredFile {
    StoredFile {
        id: row.get("id"),
        name: row.get("name"),
        path: row.get("storage_path"),
        url: row.get("url"),
        category: row.get("category_id"),
        created_by: row.get("created_by"),
        content_type: row.get("content_type"),
        size: row.get("size_bytes"),
        created_at: row.get("created_at"),
    }
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}
