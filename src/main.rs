//! SaveSpace Backend
//!
//! REST backend for organizing tasks and files into categories, with SQLite
//! persistence, filesystem blob storage and Tantivy full-text search.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod filter;
mod models;
mod search;
mod storage;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use search::SearchIndex;
use storage::BlobStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub blobs: Arc<BlobStore>,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting SaveSpace Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Storage path: {:?}", config.storage_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_key.is_none() {
        tracing::warn!("No API key configured (SAVESPACE_API_KEY). Client key check is disabled!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let blobs = Arc::new(BlobStore::open(&config.storage_path).await?);

    // Initialize search index and rebuild it from the database
    let search = Arc::new(SearchIndex::open(&config.index_path)?);
    tracing::info!("Building search index...");
    let tasks = repo.list_all_tasks().await?;
    search.rebuild(&tasks).await?;

    let state = AppState {
        repo,
        blobs,
        search,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_key = state.config.api_key.clone();
    let max_upload_bytes = state.config.max_upload_bytes;

    // Routes that establish a session
    let account_routes = Router::new()
        .route("/auth/register", post(api::register))
        .route("/auth/login", post(api::login));

    // Routes that require a signed-in user
    let session_routes = Router::new()
        .route("/auth/logout", post(api::logout))
        .route("/auth/me", get(api::me))
        // Categories
        .route(
            "/categories",
            get(api::list_categories).post(api::create_category),
        )
        .route(
            "/categories/{id}",
            get(api::get_category)
                .put(api::update_category)
                .delete(api::delete_category),
        )
        // Tasks
        .route("/tasks", get(api::list_tasks).post(api::create_task))
        .route(
            "/tasks/{id}",
            get(api::get_task)
                .put(api::update_task)
                .delete(api::delete_task),
        )
        .route("/tasks/{id}/toggle", post(api::toggle_task))
        .route("/tasks/{id}/collaborators", post(api::add_collaborator))
        // Files
        .route(
            "/files",
            get(api::list_files)
                .post(api::upload_file)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/files/{id}",
            get(api::get_file)
                .put(api::move_file)
                .delete(api::delete_file),
        )
        .route("/files/{id}/content", get(api::download_file))
        // Search
        .route("/search", get(api::search_tasks))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::session_auth_layer,
        ));

    let api_routes = account_routes
        .merge(session_routes)
        // Apply API key middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::api_key_layer(api_key.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
