//! Linkwise Server — HTTP API for the bookmark manager frontend.
//!
//! Thin axum layer over the linkwise_lib client SDKs and the category tree
//! engine. Rows live in the hosted backend; every data route resolves the
//! caller's bearer token to a user and queries with that user's token, so
//! the backend scopes rows to their owner.
//!
//! Usage:
//!   LINKWISE_URL=https://proj.example.co LINKWISE_ANON_KEY=... linkwise-server
//!
//! Or with args:
//!   linkwise-server --url https://proj.example.co --key ANON_KEY --bind 0.0.0.0:3840

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
    Router,
};
use linkwise_lib::auth::{AppUser, AuthClient, AuthError, Session, UserUpdate};
use linkwise_lib::category_tree::{
    build_tree, can_reparent, descendants_of, max_depth, orphaned_parent_refs, path_of,
    CategoryNode,
};
use linkwise_lib::search::{aggregate_tags, filter_bookmarks, BookmarkQuery, TagCount};
use linkwise_lib::settings::{self, Settings};
use linkwise_lib::stats::{dashboard, direct_counts, rollup_counts, DashboardStats};
use linkwise_lib::store::{
    Bookmark, BookmarkFilter, BookmarkPatch, Category, CategoryPatch, NewBookmark, NewCategory,
    StoreClient, StoreError, Tag,
};
use linkwise_lib::utils::{favicon_url, is_valid_bookmark_url, safe_truncate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

// ============================================================================
// AppState
// ============================================================================

#[derive(Clone)]
struct AppState {
    store: Arc<StoreClient>,
    auth: Arc<AuthClient>,
    start_time: Instant,
}

// ============================================================================
// Error type
// ============================================================================

struct AppError(StatusCode, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({"error": self.1}))).into_response()
    }
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError(StatusCode::INTERNAL_SERVER_ERROR, s)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError(StatusCode::BAD_GATEWAY, e.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Api { status: 401, .. } | AuthError::Api { status: 403, .. } => {
                AppError(StatusCode::UNAUTHORIZED, "Invalid or expired session".to_string())
            }
            other => AppError(StatusCode::BAD_GATEWAY, other.to_string()),
        }
    }
}

fn not_found(msg: impl Into<String>) -> AppError {
    AppError(StatusCode::NOT_FOUND, msg.into())
}

fn bad_request(msg: impl Into<String>) -> AppError {
    AppError(StatusCode::BAD_REQUEST, msg.into())
}

fn unauthorized(msg: impl Into<String>) -> AppError {
    AppError(StatusCode::UNAUTHORIZED, msg.into())
}

fn invalid_move(msg: impl Into<String>) -> AppError {
    AppError(StatusCode::UNPROCESSABLE_ENTITY, msg.into())
}

// ============================================================================
// Request / Response types
// ============================================================================

#[derive(Deserialize)]
struct SignInRequest {
    email: String,
}

#[derive(Deserialize)]
struct CallbackQuery {
    code: String,
}

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

#[derive(Deserialize)]
struct BookmarksQuery {
    q: Option<String>,
    filter: Option<String>,
    tag: Option<String>,
    category: Option<String>,
}

#[derive(Serialize)]
struct BookmarksResponse {
    bookmarks: Vec<Bookmark>,
    total: usize,
}

#[derive(Deserialize)]
struct CreateBookmarkRequest {
    title: String,
    url: String,
    description: Option<String>,
    tags: Option<Vec<String>>,
    category_id: Option<String>,
    is_favorite: Option<bool>,
}

#[derive(Deserialize)]
struct UpdateBookmarkRequest {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
    tags: Option<Vec<String>>,
    is_favorite: Option<bool>,
    // Missing = untouched, null = clear the category
    #[serde(default, with = "double_option")]
    category_id: Option<Option<String>>,
}

#[derive(Deserialize)]
struct CreateCategoryRequest {
    name: String,
    parent_id: Option<String>,
    color: Option<String>,
    icon: Option<String>,
}

#[derive(Deserialize)]
struct UpdateCategoryRequest {
    name: Option<String>,
    color: Option<String>,
    icon: Option<String>,
    sort_order: Option<i32>,
    // Missing = untouched, null = move to root
    #[serde(default, with = "double_option")]
    parent_id: Option<Option<String>>,
}

/// Serde helper: absent field -> None, explicit null -> Some(None).
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[derive(Serialize)]
struct CategoryTreeResponse {
    tree: Vec<CategoryNode>,
    /// Rolled-up bookmark counts (node + all descendants) per category id
    totals: HashMap<String, usize>,
    max_depth: usize,
    /// Categories whose parent_id didn't resolve; demoted to roots above
    orphaned: Vec<String>,
}

#[derive(Serialize)]
struct CategoryPathResponse {
    id: String,
    path: Vec<String>,
}

#[derive(Serialize)]
struct DeleteCategoryResponse {
    deleted: Vec<String>,
}

#[derive(Serialize)]
struct SearchResponse {
    bookmarks: Vec<Bookmark>,
    categories: Vec<Category>,
    tags: Vec<Tag>,
}

#[derive(Serialize)]
struct StatsResponse {
    #[serde(flatten)]
    dashboard: DashboardStats,
    tags: Vec<TagCount>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_secs: u64,
}

// ============================================================================
// Helpers
// ============================================================================

/// Pull the bearer token out of the Authorization header and resolve it to
/// an account. Data handlers call this first; the token is reused for the
/// store so the backend sees the same identity.
async fn require_user(state: &AppState, headers: &HeaderMap) -> Result<(AppUser, String), AppError> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
        .ok_or_else(|| unauthorized("Missing bearer token"))?;

    let user = state.auth.get_user(&token).await?;
    Ok((user, token))
}

/// Fetch the user's categories and warn once per request about rows whose
/// parent no longer exists. The builder demotes them to roots, so nothing
/// disappears, but the condition usually means an interrupted delete.
async fn fetch_categories(state: &AppState, token: &str, user_id: &str) -> Result<Vec<Category>, AppError> {
    let categories = state.store.list_categories(token, user_id).await?;
    let orphaned = orphaned_parent_refs(&categories);
    if !orphaned.is_empty() {
        eprintln!("[Tree] {} categories with unresolved parents for {}: {}",
            orphaned.len(), user_id, orphaned.join(", "));
    }
    Ok(categories)
}

// ============================================================================
// Auth handlers
// ============================================================================

// POST /auth/signin
async fn signin_handler(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<StatusCode, AppError> {
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(bad_request("Enter a valid email address"));
    }
    state.auth.sign_in_with_otp(req.email.trim()).await?;
    println!("[POST /auth/signin] Magic link requested");
    Ok(StatusCode::ACCEPTED)
}

// GET /auth/callback?code=...
async fn callback_handler(
    State(state): State<AppState>,
    Query(params): Query<CallbackQuery>,
) -> Result<Json<Session>, AppError> {
    let session = state.auth.exchange_code(&params.code).await?;
    println!("[GET /auth/callback] Session established for {}", session.user.email);
    Ok(Json(session))
}

// GET /auth/user
async fn get_user_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AppUser>, AppError> {
    let (user, _) = require_user(&state, &headers).await?;
    Ok(Json(user))
}

// PATCH /auth/user
async fn update_user_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<UserUpdate>,
) -> Result<Json<AppUser>, AppError> {
    let (_, token) = require_user(&state, &headers).await?;
    if update.email.is_none() && update.password.is_none() {
        return Err(bad_request("Nothing to update"));
    }
    let user = state.auth.update_user(&token, &update).await?;
    println!("[PATCH /auth/user] Profile updated for {}", user.email);
    Ok(Json(user))
}

// POST /auth/signout
async fn signout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let (user, token) = require_user(&state, &headers).await?;
    state.auth.sign_out(&token).await?;
    println!("[POST /auth/signout] {} signed out", user.email);
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Bookmark handlers
// ============================================================================

// GET /bookmarks?q=&filter=&tag=&category=
async fn list_bookmarks_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<BookmarksQuery>,
) -> Result<Json<BookmarksResponse>, AppError> {
    let (user, token) = require_user(&state, &headers).await?;

    let filter = match params.filter.as_deref() {
        None => None,
        Some(raw) => Some(
            BookmarkFilter::from_str(raw)
                .ok_or_else(|| bad_request(format!("Unknown filter '{}'", raw)))?,
        ),
    };

    let all = state.store.list_bookmarks(&token, &user.id).await?;
    let query = BookmarkQuery {
        filter,
        query: params.q,
        tag: params.tag,
        category_id: params.category,
    };
    let bookmarks = filter_bookmarks(&all, &query, chrono::Utc::now());

    println!("[GET /bookmarks] {} of {} rows for {}", bookmarks.len(), all.len(), &user.id[..8]);
    let total = bookmarks.len();
    Ok(Json(BookmarksResponse { bookmarks, total }))
}

// POST /bookmarks
async fn create_bookmark_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateBookmarkRequest>,
) -> Result<(StatusCode, Json<Bookmark>), AppError> {
    let (user, token) = require_user(&state, &headers).await?;

    let title = req.title.trim();
    let url = req.url.trim();
    if title.is_empty() || url.is_empty() {
        return Err(bad_request("Both title and URL are required"));
    }
    if !is_valid_bookmark_url(url) {
        return Err(bad_request("Enter a valid URL"));
    }

    let new = NewBookmark {
        user_id: user.id.clone(),
        title: title.to_string(),
        url: url.to_string(),
        description: req.description.unwrap_or_default(),
        tags: req.tags.unwrap_or_default(),
        is_favorite: req.is_favorite.unwrap_or(false),
        favicon_url: favicon_url(url),
        category_id: req.category_id,
    };
    let bookmark = state.store.insert_bookmark(&token, &new).await?;

    println!("[POST /bookmarks] Created '{}' (id: {})",
        safe_truncate(&bookmark.title, 60), &bookmark.id[..8]);
    Ok((StatusCode::CREATED, Json(bookmark)))
}

// PATCH /bookmarks/{id}
async fn update_bookmark_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateBookmarkRequest>,
) -> Result<Json<Bookmark>, AppError> {
    let (user, token) = require_user(&state, &headers).await?;

    let all = state.store.list_bookmarks(&token, &user.id).await?;
    if !all.iter().any(|b| b.id == id) {
        return Err(not_found(format!("Bookmark '{}' not found", id)));
    }

    if let Some(url) = req.url.as_deref() {
        if !is_valid_bookmark_url(url) {
            return Err(bad_request("Enter a valid URL"));
        }
    }

    let patch = BookmarkPatch {
        title: req.title,
        url: req.url,
        description: req.description,
        tags: req.tags,
        is_favorite: req.is_favorite,
        category_id: req.category_id,
    };
    let bookmark = state.store.update_bookmark(&token, &id, &patch).await?;

    println!("[PATCH /bookmarks/{}] Updated", &id[..8]);
    Ok(Json(bookmark))
}

// DELETE /bookmarks/{id}
async fn delete_bookmark_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let (user, token) = require_user(&state, &headers).await?;

    let all = state.store.list_bookmarks(&token, &user.id).await?;
    if !all.iter().any(|b| b.id == id) {
        return Err(not_found(format!("Bookmark '{}' not found", id)));
    }

    state.store.delete_bookmark(&token, &id).await?;
    println!("[DELETE /bookmarks/{}] Deleted", &id[..8]);
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Category handlers
// ============================================================================

// GET /categories
async fn list_categories_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Category>>, AppError> {
    let (user, token) = require_user(&state, &headers).await?;
    let categories = fetch_categories(&state, &token, &user.id).await?;
    Ok(Json(categories))
}

// GET /categories/tree
async fn category_tree_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CategoryTreeResponse>, AppError> {
    let (user, token) = require_user(&state, &headers).await?;

    let categories = state.store.list_categories(&token, &user.id).await?;
    let bookmarks = state.store.list_bookmarks(&token, &user.id).await?;

    let orphaned = orphaned_parent_refs(&categories);
    if !orphaned.is_empty() {
        eprintln!("[Tree] {} categories with unresolved parents for {}: {}",
            orphaned.len(), &user.id[..8], orphaned.join(", "));
    }

    let tree = build_tree(&categories);
    let totals = rollup_counts(&tree, &direct_counts(&bookmarks));
    let depth = max_depth(&tree);

    println!("[GET /categories/tree] {} categories, depth {} for {}",
        categories.len(), depth, &user.id[..8]);
    Ok(Json(CategoryTreeResponse { tree, totals, max_depth: depth, orphaned }))
}

// GET /categories/{id}/path
async fn category_path_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<CategoryPathResponse>, AppError> {
    let (user, token) = require_user(&state, &headers).await?;

    let categories = fetch_categories(&state, &token, &user.id).await?;
    let tree = build_tree(&categories);
    let path = path_of(&tree, &id)
        .ok_or_else(|| not_found(format!("Category '{}' not found", id)))?;

    Ok(Json(CategoryPathResponse { id, path }))
}

// POST /categories
async fn create_category_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let (user, token) = require_user(&state, &headers).await?;

    let name = req.name.trim();
    if name.is_empty() {
        return Err(bad_request("Enter a category name"));
    }

    if let Some(parent_id) = req.parent_id.as_deref() {
        let categories = fetch_categories(&state, &token, &user.id).await?;
        if !categories.iter().any(|c| c.id == parent_id) {
            return Err(not_found(format!("Parent category '{}' not found", parent_id)));
        }
    }

    let sort_order = state
        .store
        .next_sort_order(&token, &user.id, req.parent_id.as_deref())
        .await?;

    let new = NewCategory {
        user_id: user.id.clone(),
        parent_id: req.parent_id,
        name: name.to_string(),
        color: req.color.unwrap_or_else(|| "#3b82f6".to_string()),
        icon: req.icon.unwrap_or_else(|| "folder".to_string()),
        sort_order,
    };
    let category = state.store.insert_category(&token, &new).await?;

    println!("[POST /categories] Created '{}' (id: {}, sort: {})",
        safe_truncate(&category.name, 60), &category.id[..8], sort_order);
    Ok((StatusCode::CREATED, Json(category)))
}

// PATCH /categories/{id}
async fn update_category_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>, AppError> {
    let (user, token) = require_user(&state, &headers).await?;

    if let Some(name) = req.name.as_deref() {
        if name.trim().is_empty() {
            return Err(bad_request("Enter a category name"));
        }
    }

    // Fresh rows: the reparent check must run against what the store holds
    // right now, not against whatever tree the client rendered from.
    let categories = fetch_categories(&state, &token, &user.id).await?;
    if !categories.iter().any(|c| c.id == id) {
        return Err(not_found(format!("Category '{}' not found", id)));
    }

    if let Some(new_parent) = &req.parent_id {
        if let Some(parent_id) = new_parent.as_deref() {
            if !categories.iter().any(|c| c.id == parent_id) {
                return Err(not_found(format!("Parent category '{}' not found", parent_id)));
            }
        }
        let tree = build_tree(&categories);
        if !can_reparent(&tree, &id, new_parent.as_deref()) {
            return Err(invalid_move(format!(
                "Cannot move '{}' under '{}': the target is the category itself or one of its descendants",
                id,
                new_parent.as_deref().unwrap_or("root"),
            )));
        }
    }

    let patch = CategoryPatch {
        name: req.name.map(|n| n.trim().to_string()),
        color: req.color,
        icon: req.icon,
        sort_order: req.sort_order,
        parent_id: req.parent_id,
    };
    let category = state.store.update_category(&token, &id, &patch).await?;

    println!("[PATCH /categories/{}] Updated '{}'",
        &id[..8], safe_truncate(&category.name, 60));
    Ok(Json(category))
}

// DELETE /categories/{id}
async fn delete_category_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DeleteCategoryResponse>, AppError> {
    let (user, token) = require_user(&state, &headers).await?;

    let categories = fetch_categories(&state, &token, &user.id).await?;
    let tree = build_tree(&categories);

    // The whole subtree goes: the target plus every collected descendant,
    // deleted in one id-set request.
    let descendants = descendants_of(&tree, &id)
        .ok_or_else(|| not_found(format!("Category '{}' not found", id)))?;

    let mut ids = vec![id.clone()];
    ids.extend(descendants.into_iter().map(|c| c.id));
    state.store.delete_categories(&token, &ids).await?;

    println!("[DELETE /categories/{}] Deleted {} categories (cascade)", &id[..8], ids.len());
    Ok(Json(DeleteCategoryResponse { deleted: ids }))
}

// ============================================================================
// Tags, search, stats
// ============================================================================

// GET /tags
async fn tags_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<TagCount>>, AppError> {
    let (user, token) = require_user(&state, &headers).await?;
    let bookmarks = state.store.list_bookmarks(&token, &user.id).await?;
    Ok(Json(aggregate_tags(&bookmarks)))
}

const COMMAND_MENU_LIMIT: usize = 5;

// GET /search?q=... — command menu: a few hits from each collection
async fn search_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let (user, token) = require_user(&state, &headers).await?;
    let q = params.q.unwrap_or_default().trim().to_lowercase();

    let all_bookmarks = state.store.list_bookmarks(&token, &user.id).await?;
    let all_categories = state.store.list_categories(&token, &user.id).await?;
    let all_tags = state.store.list_tags(&token, &user.id).await?;

    let query = BookmarkQuery {
        query: if q.is_empty() { None } else { Some(q.clone()) },
        ..Default::default()
    };
    let bookmarks: Vec<Bookmark> = filter_bookmarks(&all_bookmarks, &query, chrono::Utc::now())
        .into_iter()
        .take(COMMAND_MENU_LIMIT)
        .collect();
    let categories: Vec<Category> = all_categories
        .into_iter()
        .filter(|c| q.is_empty() || c.name.to_lowercase().contains(&q))
        .take(COMMAND_MENU_LIMIT)
        .collect();
    let tags: Vec<Tag> = all_tags
        .into_iter()
        .filter(|t| q.is_empty() || t.name.to_lowercase().contains(&q))
        .take(COMMAND_MENU_LIMIT)
        .collect();

    Ok(Json(SearchResponse { bookmarks, categories, tags }))
}

// GET /stats
async fn stats_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatsResponse>, AppError> {
    let (user, token) = require_user(&state, &headers).await?;

    let bookmarks = state.store.list_bookmarks(&token, &user.id).await?;
    let categories = state.store.list_categories(&token, &user.id).await?;

    Ok(Json(StatsResponse {
        dashboard: dashboard(&bookmarks, &categories),
        tags: aggregate_tags(&bookmarks),
    }))
}

// ============================================================================
// Settings, health
// ============================================================================

// GET /settings
async fn get_settings_handler() -> Json<Settings> {
    Json(settings::get())
}

// PUT /settings
async fn put_settings_handler(
    Json(new_settings): Json<Settings>,
) -> Result<Json<Settings>, AppError> {
    settings::replace(new_settings.clone())?;
    println!("[PUT /settings] Settings saved");
    Ok(Json(new_settings))
}

// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    // Parse simple args (no clap to keep binary small)
    let args: Vec<String> = std::env::args().collect();
    let mut url_arg: Option<&str> = None;
    let mut key_arg: Option<&str> = None;
    let mut bind_arg: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--url" if i + 1 < args.len() => {
                url_arg = Some(&args[i + 1]);
                i += 2;
            }
            "--key" if i + 1 < args.len() => {
                key_arg = Some(&args[i + 1]);
                i += 2;
            }
            "--bind" if i + 1 < args.len() => {
                bind_arg = Some(&args[i + 1]);
                i += 2;
            }
            "--help" | "-h" => {
                println!("linkwise-server — Bookmark manager HTTP API");
                println!();
                println!("Usage: linkwise-server [--url BACKEND_URL] [--key ANON_KEY] [--bind ADDR:PORT]");
                println!();
                println!("Environment variables:");
                println!("  LINKWISE_URL       Backend project URL");
                println!("  LINKWISE_ANON_KEY  Backend anon (publishable) key");
                println!("  LINKWISE_BIND      Bind address (default: 0.0.0.0:3840)");
                std::process::exit(0);
            }
            _ => { i += 1; }
        }
    }

    let base_url = url_arg
        .map(|s| s.to_string())
        .or_else(|| std::env::var("LINKWISE_URL").ok())
        .filter(|s| !s.is_empty());
    let anon_key = key_arg
        .map(|s| s.to_string())
        .or_else(|| std::env::var("LINKWISE_ANON_KEY").ok())
        .filter(|s| !s.is_empty());

    let (base_url, anon_key) = match (base_url, anon_key) {
        (Some(url), Some(key)) => (url, key),
        _ => {
            eprintln!("[Server] Backend URL and anon key are required (LINKWISE_URL / LINKWISE_ANON_KEY)");
            std::process::exit(1);
        }
    };

    let bind_addr = bind_arg
        .map(|s| s.to_string())
        .or_else(|| std::env::var("LINKWISE_BIND").ok())
        .unwrap_or_else(|| "0.0.0.0:3840".to_string());

    println!("[Server] Backend: {}", base_url);
    println!("[Server] Binding to: {}", bind_addr);

    // Initialize settings
    let app_data_dir = dirs::data_dir()
        .map(|p| p.join("com.linkwise.app"))
        .unwrap_or_else(|| PathBuf::from("."));
    settings::init(app_data_dir);

    let state = AppState {
        store: Arc::new(StoreClient::new(&base_url, &anon_key)),
        auth: Arc::new(AuthClient::new(&base_url, &anon_key)),
        start_time: Instant::now(),
    };

    let app = Router::new()
        .route("/auth/signin", post(signin_handler))
        .route("/auth/callback", get(callback_handler))
        .route("/auth/signout", post(signout_handler))
        .route("/auth/user", get(get_user_handler).patch(update_user_handler))
        .route("/bookmarks", get(list_bookmarks_handler).post(create_bookmark_handler))
        .route("/bookmarks/{id}", patch(update_bookmark_handler).delete(delete_bookmark_handler))
        .route("/categories", get(list_categories_handler).post(create_category_handler))
        .route("/categories/tree", get(category_tree_handler))
        .route("/categories/{id}", patch(update_category_handler).delete(delete_category_handler))
        .route("/categories/{id}/path", get(category_path_handler))
        .route("/tags", get(tags_handler))
        .route("/search", get(search_handler))
        .route("/stats", get(stats_handler))
        .route("/settings", get(get_settings_handler).put(put_settings_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .with_state(state);

    // Bind and serve
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("[Server] Failed to bind to {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };

    println!("[Server] Listening on {}", bind_addr);
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("[Server] Server error: {}", e);
        std::process::exit(1);
    }
}
