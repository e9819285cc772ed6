//! Integration tests for the SaveSpace backend.

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::search::SearchIndex;
use crate::storage::BlobStore;
use crate::{create_router, AppState};

const API_KEY: &str = "test-api-key";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    storage_path: PathBuf,
    _temp_dir: TempDir,
}

/// A signed-in test user.
struct Session {
    token: String,
    uid: String,
    email: String,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_api_key(Some(API_KEY.to_string())).await
    }

    async fn with_api_key(api_key: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let index_path = temp_dir.path().join("index");
        let storage_path = temp_dir.path().join("storage");

        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));
        let blobs = Arc::new(
            BlobStore::open(&storage_path)
                .await
                .expect("Failed to init storage"),
        );
        let search = Arc::new(SearchIndex::open(&index_path).expect("Failed to init search"));

        // Bind first so download URLs can use the real port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        let config = Config {
            api_key: api_key.clone(),
            db_path,
            index_path,
            storage_path: storage_path.clone(),
            bind_addr: addr,
            public_url: base_url.clone(),
            log_level: "warn".to_string(),
            session_ttl_hours: 1,
            max_upload_bytes: 1024 * 1024,
        };

        let state = AppState {
            repo,
            blobs,
            search,
            config: Arc::new(config),
        };

        let app = create_router(state);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut client_builder = Client::builder();
        if let Some(key) = api_key {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            storage_path,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn register(&self, name: &str) -> Session {
        let email = format!("{}@example.com", name.to_lowercase());
        let (status, body) = send(self.client.post(self.url("/api/auth/register")).json(&json!({
            "email": email,
            "password": "secret-password",
            "displayName": name
        })))
        .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");

        Session {
            token: body["data"]["token"].as_str().unwrap().to_string(),
            uid: body["data"]["user"]["uid"].as_str().unwrap().to_string(),
            email,
        }
    }

    async fn get(&self, session: &Session, path: &str) -> (StatusCode, Value) {
        send(
            self.client
                .get(self.url(path))
                .bearer_auth(&session.token),
        )
        .await
    }

    async fn post(&self, session: &Session, path: &str, body: Value) -> (StatusCode, Value) {
        send(
            self.client
                .post(self.url(path))
                .bearer_auth(&session.token)
                .json(&body),
        )
        .await
    }

    async fn put(&self, session: &Session, path: &str, body: Value) -> (StatusCode, Value) {
        send(
            self.client
                .put(self.url(path))
                .bearer_auth(&session.token)
                .json(&body),
        )
        .await
    }

    async fn delete(&self, session: &Session, path: &str) -> (StatusCode, Value) {
        send(
            self.client
                .delete(self.url(path))
                .bearer_auth(&session.token),
        )
        .await
    }

    async fn create_category(&self, session: &Session, name: &str) -> String {
        let (status, body) = self
            .post(session, "/api/categories", json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::OK, "create category failed: {body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn create_task(&self, session: &Session, body: Value) -> Value {
        let (status, body) = self.post(session, "/api/tasks", body).await;
        assert_eq!(status, StatusCode::OK, "create task failed: {body}");
        body["data"].clone()
    }

    async fn upload(
        &self,
        session: &Session,
        category: Option<&str>,
        name: &str,
        bytes: &[u8],
    ) -> (StatusCode, Value) {
        let mut form = Form::new().part(
            "file",
            Part::bytes(bytes.to_vec())
                .file_name(name.to_string())
                .mime_str("text/plain")
                .unwrap(),
        );
        if let Some(category) = category {
            form = form.text("category", category.to_string());
        }
        send(
            self.client
                .post(self.url("/api/files"))
                .bearer_auth(&session.token)
                .multipart(form),
        )
        .await
    }

    fn stored_blob_count(&self) -> usize {
        walk_files(&self.storage_path)
    }
}

async fn send(request: RequestBuilder) -> (StatusCode, Value) {
    let resp = request.send().await.unwrap();
    let status = resp.status();
    let body = resp.json().await.unwrap_or(Value::Null);
    (status, body)
}

fn walk_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| {
                    let path = entry.path();
                    if path.is_dir() {
                        walk_files(&path)
                    } else {
                        1
                    }
                })
                .sum()
        })
        .unwrap_or(0)
}

fn ids(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

fn strings(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item.as_str().unwrap().to_string())
        .collect()
}

// ==================== API KEY & SESSIONS ====================

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_api_key_missing_or_wrong() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "email": "a@example.com", "password": "whatever" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let resp = Client::new()
        .get(fixture.url("/api/auth/me"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_api_key_disabled_when_unset() {
    let fixture = TestFixture::with_api_key(None).await;
    let alice = fixture.register("Alice").await;

    let (status, _) = fixture.get(&alice, "/api/auth/me").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_session_required() {
    let fixture = TestFixture::new().await;

    let (status, body) = send(fixture.client.get(fixture.url("/api/categories"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = send(
        fixture
            .client
            .get(fixture.url("/api/categories"))
            .bearer_auth("not-a-session"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_logout() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("Alice").await;

    let (status, body) = fixture.get(&alice, "/api/auth/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["uid"], alice.uid.as_str());
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert_eq!(body["data"]["displayName"], "Alice");
    assert!(body["data"].get("passwordHash").is_none());

    // Same email, different case
    let (status, body) = send(fixture.client.post(fixture.url("/api/auth/register")).json(&json!({
        "email": "ALICE@example.com",
        "password": "another-password",
        "displayName": "Impostor"
    })))
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, _) = send(fixture.client.post(fixture.url("/api/auth/login")).json(&json!({
        "email": "alice@example.com",
        "password": "wrong-password"
    })))
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(fixture.client.post(fixture.url("/api/auth/login")).json(&json!({
        "email": "Alice@Example.com",
        "password": "secret-password"
    })))
    .await;
    assert_eq!(status, StatusCode::OK);
    let second = Session {
        token: body["data"]["token"].as_str().unwrap().to_string(),
        uid: alice.uid.clone(),
        email: alice.email.clone(),
    };
    assert_ne!(second.token, alice.token);

    let (status, _) = fixture.post(&alice, "/api/auth/logout", json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = fixture.get(&alice, "/api/auth/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Other sessions survive
    let (status, _) = fixture.get(&second, "/api/auth/me").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_validation() {
    let fixture = TestFixture::new().await;

    let (status, body) = send(fixture.client.post(fixture.url("/api/auth/register")).json(&json!({
        "email": "bob@example.com",
        "password": "123",
        "displayName": "Bob"
    })))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = send(fixture.client.post(fixture.url("/api/auth/register")).json(&json!({
        "email": "not-an-email",
        "password": "secret-password",
        "displayName": "Bob"
    })))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ==================== CATEGORIES ====================

#[tokio::test]
async fn test_category_crud() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("Alice").await;

    let id = fixture.create_category(&alice, "Groceries").await;

    let (status, body) = fixture.get(&alice, &format!("/api/categories/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Groceries");
    assert_eq!(body["data"]["createdBy"], alice.uid.as_str());
    assert_eq!(body["data"]["tasks"], json!([]));
    assert_eq!(body["data"]["files"], json!([]));
    assert_eq!(body["data"]["version"], 1);

    let (status, body) = fixture
        .put(
            &alice,
            &format!("/api/categories/{}", id),
            json!({ "name": "Food", "expectedVersion": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Food");
    assert_eq!(body["data"]["version"], 2);

    // Stale version
    let (status, body) = fixture
        .put(
            &alice,
            &format!("/api/categories/{}", id),
            json!({ "name": "Snacks", "expectedVersion": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "VERSION_MISMATCH");
    assert_eq!(body["error"]["details"]["currentVersion"], 2);

    let (status, body) = fixture
        .get(&alice, "/api/categories?search=FOO")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["data"]), vec![id.clone()]);

    let (status, _) = fixture.delete(&alice, &format!("/api/categories/{}", id)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = fixture.get(&alice, &format!("/api/categories/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_name_required() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("Alice").await;

    let (status, body) = fixture
        .post(&alice, "/api/categories", json!({ "name": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_categories_are_private() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("Alice").await;
    let bob = fixture.register("Bob").await;

    let id = fixture.create_category(&alice, "Private").await;

    let (_, body) = fixture.get(&bob, "/api/categories").await;
    assert_eq!(body["data"], json!([]));

    let path = format!("/api/categories/{}", id);
    let (status, _) = fixture.get(&bob, &path).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = fixture.put(&bob, &path, json!({ "name": "Mine now" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = fixture.delete(&bob, &path).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = fixture.get(&alice, &path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Private");
}

// ==================== TASKS ====================

#[tokio::test]
async fn test_task_lifecycle_updates_category() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("Alice").await;

    let home = fixture.create_category(&alice, "Home").await;
    let work = fixture.create_category(&alice, "Work").await;

    let task = fixture
        .create_task(
            &alice,
            json!({
                "title": "Fix sink",
                "description": "Kitchen",
                "deadline": "2099-05-01T12:00:00Z",
                "category": home
            }),
        )
        .await;
    let task_id = task["id"].as_str().unwrap().to_string();
    assert_eq!(task["done"], false);
    assert_eq!(task["category"], home.as_str());
    assert_eq!(task["createdBy"], alice.uid.as_str());

    let (_, body) = fixture.get(&alice, &format!("/api/categories/{}", home)).await;
    assert_eq!(strings(&body["data"]["tasks"]), vec![task_id.clone()]);

    // Move to another category
    let (status, body) = fixture
        .put(
            &alice,
            &format!("/api/tasks/{}", task_id),
            json!({ "category": work, "title": "Fix office sink" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["category"], work.as_str());
    assert_eq!(body["data"]["title"], "Fix office sink");
    assert_eq!(body["data"]["description"], "Kitchen");

    let (_, body) = fixture.get(&alice, &format!("/api/categories/{}", home)).await;
    assert_eq!(body["data"]["tasks"], json!([]));
    let (_, body) = fixture.get(&alice, &format!("/api/categories/{}", work)).await;
    assert_eq!(strings(&body["data"]["tasks"]), vec![task_id.clone()]);

    // Clear the deadline
    let (_, body) = fixture
        .put(&alice, &format!("/api/tasks/{}", task_id), json!({ "deadline": null }))
        .await;
    assert_eq!(body["data"]["deadline"], Value::Null);

    // Toggle done twice
    let (_, body) = fixture
        .post(&alice, &format!("/api/tasks/{}/toggle", task_id), json!({}))
        .await;
    assert_eq!(body["data"]["done"], true);
    let (_, body) = fixture
        .post(&alice, &format!("/api/tasks/{}/toggle", task_id), json!({}))
        .await;
    assert_eq!(body["data"]["done"], false);

    let (status, _) = fixture.delete(&alice, &format!("/api/tasks/{}", task_id)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = fixture.get(&alice, &format!("/api/tasks/{}", task_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = fixture.get(&alice, &format!("/api/categories/{}", work)).await;
    assert_eq!(body["data"]["tasks"], json!([]));
}

#[tokio::test]
async fn test_create_task_with_new_category() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("Alice").await;

    let task = fixture
        .create_task(
            &alice,
            json!({ "title": "Renew passport", "newCategoryName": "Errands" }),
        )
        .await;

    let (_, body) = fixture.get(&alice, "/api/categories").await;
    let categories = body["data"].as_array().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0]["name"], "Errands");
    assert_eq!(categories[0]["id"], task["category"]);
    assert_eq!(categories[0]["tasks"], json!([task["id"]]));
}

#[tokio::test]
async fn test_create_task_validation() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("Alice").await;
    let category = fixture.create_category(&alice, "Home").await;

    let (status, body) = fixture
        .post(&alice, "/api/tasks", json!({ "title": "", "category": category }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = fixture
        .post(&alice, "/api/tasks", json!({ "title": "Orphan" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = fixture
        .post(
            &alice,
            "/api/tasks",
            json!({ "title": "Too late", "category": category, "deadline": "2000-01-01T00:00:00Z" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = fixture.get(&alice, "/api/tasks").await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_task_cannot_use_foreign_category() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("Alice").await;
    let bob = fixture.register("Bob").await;

    let alices = fixture.create_category(&alice, "Alice only").await;
    let bobs = fixture.create_category(&bob, "Bob only").await;

    let (status, _) = fixture
        .post(&bob, "/api/tasks", json!({ "title": "Sneaky", "category": alices }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let task = fixture
        .create_task(&bob, json!({ "title": "Legit", "category": bobs }))
        .await;
    let (status, _) = fixture
        .put(
            &bob,
            &format!("/api/tasks/{}", task["id"].as_str().unwrap()),
            json!({ "category": alices }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = fixture.get(&alice, &format!("/api/categories/{}", alices)).await;
    assert_eq!(body["data"]["tasks"], json!([]));
}

#[tokio::test]
async fn test_task_version_conflict() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("Alice").await;
    let category = fixture.create_category(&alice, "Home").await;

    let task = fixture
        .create_task(&alice, json!({ "title": "Paint fence", "category": category }))
        .await;
    let path = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let (status, body) = fixture
        .put(&alice, &path, json!({ "title": "Paint gate", "expectedVersion": 1 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["version"], 2);

    let (status, body) = fixture
        .put(&alice, &path, json!({ "title": "Paint shed", "expectedVersion": 1 }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "VERSION_MISMATCH");
    assert_eq!(body["error"]["details"]["currentVersion"], 2);
}

#[tokio::test]
async fn test_collaborators_can_view_but_not_modify() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("Alice").await;
    let bob = fixture.register("Bob").await;
    let carol = fixture.register("Carol").await;

    let category = fixture.create_category(&alice, "Trip").await;
    let task = fixture
        .create_task(
            &alice,
            json!({
                "title": "Book hotel",
                "category": category,
                "collaborators": ["BOB@example.com"]
            }),
        )
        .await;
    let task_id = task["id"].as_str().unwrap().to_string();
    assert_eq!(task["collaborators"], json!(["bob@example.com"]));

    let (_, body) = fixture.get(&bob, "/api/tasks").await;
    assert_eq!(ids(&body["data"]), vec![task_id.clone()]);

    let path = format!("/api/tasks/{}", task_id);
    let (status, _) = fixture.get(&bob, &path).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = fixture.put(&bob, &path, json!({ "title": "Hijacked" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, _) = fixture
        .post(&bob, &format!("{}/toggle", path), json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = fixture.delete(&bob, &path).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Strangers see nothing
    let (status, _) = fixture.get(&carol, &path).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = fixture.put(&carol, &path, json!({ "title": "Nope" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = fixture.get(&carol, "/api/tasks").await;
    assert_eq!(body["data"], json!([]));

    // Share with Carol by uid, merged with the existing list
    let (status, body) = fixture
        .post(
            &alice,
            &format!("{}/collaborators", path),
            json!({ "collaborator": carol.uid }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["collaborators"],
        json!(["bob@example.com", carol.uid])
    );

    let (status, _) = fixture.get(&carol, &path).await;
    assert_eq!(status, StatusCode::OK);

    // Re-adding is a no-op
    let (_, body) = fixture
        .put(&alice, &path, json!({ "collaborators": [bob.email.to_uppercase()] }))
        .await;
    assert_eq!(
        body["data"]["collaborators"],
        json!(["bob@example.com", carol.uid])
    );
}

#[tokio::test]
async fn test_task_list_filters_and_sorting() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("Alice").await;
    let home = fixture.create_category(&alice, "Home").await;
    let work = fixture.create_category(&alice, "Work").await;

    let milk = fixture
        .create_task(
            &alice,
            json!({ "title": "Buy milk", "category": home, "deadline": "2099-01-01T00:00:00Z" }),
        )
        .await;
    let report = fixture
        .create_task(
            &alice,
            json!({ "title": "Write report", "category": work, "deadline": "2099-02-01T00:00:00Z" }),
        )
        .await;
    let shake = fixture
        .create_task(&alice, json!({ "title": "Milkshake", "category": home }))
        .await;

    let id = |task: &Value| task["id"].as_str().unwrap().to_string();

    fixture
        .post(&alice, &format!("/api/tasks/{}/toggle", id(&shake)), json!({}))
        .await;

    let (_, body) = fixture.get(&alice, "/api/tasks").await;
    assert_eq!(ids(&body["data"]), vec![id(&milk), id(&report), id(&shake)]);

    let (_, body) = fixture.get(&alice, "/api/tasks?search=MILK").await;
    assert_eq!(ids(&body["data"]), vec![id(&milk), id(&shake)]);

    let (_, body) = fixture.get(&alice, "/api/tasks?status=done").await;
    assert_eq!(ids(&body["data"]), vec![id(&shake)]);

    let (_, body) = fixture.get(&alice, "/api/tasks?status=notDone").await;
    assert_eq!(ids(&body["data"]), vec![id(&milk), id(&report)]);

    let (_, body) = fixture
        .get(&alice, &format!("/api/tasks?category={}", work))
        .await;
    assert_eq!(ids(&body["data"]), vec![id(&report)]);

    let (_, body) = fixture.get(&alice, "/api/tasks?sort=latest").await;
    assert_eq!(ids(&body["data"]), vec![id(&report), id(&milk), id(&shake)]);

    let (_, body) = fixture.get(&alice, "/api/tasks?sort=soonest").await;
    assert_eq!(ids(&body["data"]), vec![id(&milk), id(&report), id(&shake)]);

    let (status, body) = send(
        fixture
            .client
            .get(fixture.url("/api/tasks"))
            .bearer_auth(&alice.token)
            .query(&[("dueBy", "2099-01-15T00:00:00Z")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["data"]), vec![id(&milk)]);
}

// ==================== FILES ====================

#[tokio::test]
async fn test_upload_requires_category() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("Alice").await;

    let (status, body) = fixture.upload(&alice, None, "notes.txt", b"hello").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (_, body) = fixture.get(&alice, "/api/files").await;
    assert_eq!(body["data"], json!([]));
    assert_eq!(fixture.stored_blob_count(), 0);
}

#[tokio::test]
async fn test_upload_into_foreign_category_stores_nothing() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("Alice").await;
    let bob = fixture.register("Bob").await;
    let alices = fixture.create_category(&alice, "Docs").await;

    let (status, _) = fixture.upload(&bob, Some(alices.as_str()), "x.txt", b"x").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(fixture.stored_blob_count(), 0);
}

#[tokio::test]
async fn test_oversized_upload_is_payload_too_large() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("Alice").await;
    let docs = fixture.create_category(&alice, "Docs").await;

    let bytes = vec![b'x'; 1024 * 1024 + 4096];
    let (status, body) = fixture
        .upload(&alice, Some(docs.as_str()), "big.txt", &bytes)
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");

    let (_, body) = fixture.get(&alice, "/api/files").await;
    assert_eq!(body["data"], json!([]));
    assert_eq!(fixture.stored_blob_count(), 0);
}

#[tokio::test]
async fn test_file_upload_download_move_delete() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("Alice").await;
    let docs = fixture.create_category(&alice, "Docs").await;
    let archive = fixture.create_category(&alice, "Archive").await;

    let (status, body) = fixture
        .upload(&alice, Some(docs.as_str()), "../notes.txt", b"hello world")
        .await;
    assert_eq!(status, StatusCode::OK, "upload failed: {body}");
    let file = body["data"].clone();
    let file_id = file["id"].as_str().unwrap().to_string();
    let file_url = file["url"].as_str().unwrap().to_string();
    assert_eq!(file["name"], "notes.txt");
    assert_eq!(file["path"], "Alice's Files/notes.txt");
    assert_eq!(file["size"], 11);
    assert_eq!(
        file_url,
        fixture.url(&format!("/api/files/{}/content", file_id))
    );
    assert_eq!(fixture.stored_blob_count(), 1);

    let (_, body) = fixture.get(&alice, &format!("/api/categories/{}", docs)).await;
    assert_eq!(strings(&body["data"]["files"]), vec![file_url.clone()]);

    // Download through the recorded URL
    let resp = fixture
        .client
        .get(&file_url)
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["content-type"].to_str().unwrap(),
        "text/plain"
    );
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"hello world");

    // Duplicate name for the same user
    let (status, body) = fixture.upload(&alice, Some(archive.as_str()), "notes.txt", b"again").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert_eq!(fixture.stored_blob_count(), 1);

    // Move
    let (status, body) = fixture
        .put(
            &alice,
            &format!("/api/files/{}", file_id),
            json!({ "category": archive }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["category"], archive.as_str());

    let (_, body) = fixture.get(&alice, &format!("/api/categories/{}", docs)).await;
    assert_eq!(body["data"]["files"], json!([]));
    let (_, body) = fixture
        .get(&alice, &format!("/api/files?category={}", archive))
        .await;
    assert_eq!(ids(&body["data"]), vec![file_id.clone()]);

    // Delete
    let (status, _) = fixture.delete(&alice, &format!("/api/files/{}", file_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fixture.stored_blob_count(), 0);

    let (status, _) = fixture
        .get(&alice, &format!("/api/files/{}", file_id))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = fixture.get(&alice, &format!("/api/categories/{}", archive)).await;
    assert_eq!(body["data"]["files"], json!([]));
}

#[tokio::test]
async fn test_files_are_private() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("Alice").await;
    let bob = fixture.register("Bob").await;
    let docs = fixture.create_category(&alice, "Docs").await;

    let (_, body) = fixture.upload(&alice, Some(docs.as_str()), "secret.txt", b"shh").await;
    let file_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = fixture
        .get(&bob, &format!("/api/files/{}/content", file_id))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = fixture.delete(&bob, &format!("/api/files/{}", file_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = fixture.get(&bob, "/api/files").await;
    assert_eq!(body["data"], json!([]));
    assert_eq!(fixture.stored_blob_count(), 1);
}

// ==================== CATEGORY DELETION ====================

#[tokio::test]
async fn test_delete_category_with_contents() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("Alice").await;
    let category = fixture.create_category(&alice, "Old stuff").await;

    let task = fixture
        .create_task(&alice, json!({ "title": "Sort boxes", "category": category }))
        .await;
    let (_, body) = fixture
        .upload(&alice, Some(category.as_str()), "inventory.txt", b"boxes")
        .await;
    let file_id = body["data"]["id"].as_str().unwrap().to_string();

    let path = format!("/api/categories/{}", category);
    let (status, body) = fixture.delete(&alice, &path).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    // Nothing was removed
    let (status, _) = fixture.get(&alice, &path).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = fixture
        .delete(&alice, &format!("{}?cascade=true", path))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = fixture.get(&alice, &path).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = fixture
        .get(&alice, &format!("/api/tasks/{}", task["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = fixture.get(&alice, &format!("/api/files/{}", file_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(fixture.stored_blob_count(), 0);

    let (_, body) = fixture.get(&alice, "/api/search?q=boxes").await;
    assert_eq!(body["data"]["total"], 0);
}

// ==================== SEARCH ====================

#[tokio::test]
async fn test_search_is_scoped_to_visible_tasks() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("Alice").await;
    let bob = fixture.register("Bob").await;
    let carol = fixture.register("Carol").await;

    let category = fixture.create_category(&alice, "Work").await;
    let shared = fixture
        .create_task(
            &alice,
            json!({
                "title": "Quarterly report",
                "description": "Numbers for the board",
                "category": category,
                "collaborators": [bob.email]
            }),
        )
        .await;
    fixture
        .create_task(&alice, json!({ "title": "Private report", "category": category }))
        .await;

    let (status, body) = fixture.get(&alice, "/api/search?q=report").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);

    let (_, body) = fixture.get(&bob, "/api/search?q=report").await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["results"][0]["task"]["id"], shared["id"]);

    let (_, body) = fixture.get(&bob, "/api/search?q=board").await;
    assert_eq!(body["data"]["total"], 1);

    let (_, body) = fixture.get(&carol, "/api/search?q=report").await;
    assert_eq!(body["data"]["total"], 0);

    // Index follows edits
    fixture
        .put(
            &alice,
            &format!("/api/tasks/{}", shared["id"].as_str().unwrap()),
            json!({ "title": "Annual summary" }),
        )
        .await;
    let (_, body) = fixture.get(&bob, "/api/search?q=summary").await;
    assert_eq!(body["data"]["total"], 1);
    let (_, body) = fixture.get(&bob, "/api/search?q=quarterly").await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn test_search_paging_bounds() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("Alice").await;
    let category = fixture.create_category(&alice, "Work").await;
    for title in ["Weekly report", "Monthly report", "Yearly report"] {
        fixture
            .create_task(&alice, json!({ "title": title, "category": category }))
            .await;
    }

    let (status, body) = fixture
        .get(&alice, "/api/search?q=report&offset=1099511627776")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Health check still answers, so the process survived
    let (status, _) = fixture.get(&alice, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = fixture.get(&alice, "/api/search?q=report&limit=0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["limit"], 1);
    assert_eq!(body["data"]["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["total"], 3);

    let (status, body) = fixture
        .get(&alice, "/api/search?q=report&limit=2&offset=2")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["total"], 3);

    let (status, body) = fixture.get(&alice, "/api/search?q=report&offset=10000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["results"], json!([]));
}
