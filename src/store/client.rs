//! Client SDK for the hosted database
//!
//! The backend exposes its tables over a PostgREST-style REST interface:
//! filters and ordering ride in the query string (`user_id=eq.<id>`,
//! `order=sort_order.asc`), writes are POST/PATCH/DELETE against the table
//! URL, and `Prefer: return=representation` makes writes echo the stored
//! rows back. Every call carries the project's anon key plus the caller's
//! access token; row visibility is enforced server-side per user.
//!
//! This module is the only place that talks to the database. It does no
//! tree-building and no filtering beyond what the query string expresses;
//! the engine modules work on the rows it returns.

use super::models::{
    Bookmark, BookmarkPatch, Category, CategoryPatch, NewBookmark, NewCategory, Tag,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("store error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("failed to decode store response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("store returned no row for a write that should echo one")]
    EmptyWrite,
}

pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl StoreClient {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    // ==================== Bookmarks ====================

    /// All bookmarks for one user, newest first.
    pub async fn list_bookmarks(&self, token: &str, user_id: &str) -> Result<Vec<Bookmark>, StoreError> {
        let url = self.table_url("bookmarks", &[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("order", "created_at.desc".to_string()),
        ]);
        self.get_rows(token, &url).await
    }

    pub async fn insert_bookmark(&self, token: &str, new: &NewBookmark) -> Result<Bookmark, StoreError> {
        let url = self.table_url("bookmarks", &[]);
        self.insert_row(token, &url, new).await
    }

    pub async fn update_bookmark(&self, token: &str, id: &str, patch: &BookmarkPatch) -> Result<Bookmark, StoreError> {
        let url = self.table_url("bookmarks", &[("id", format!("eq.{}", id))]);
        self.patch_row(token, &url, patch).await
    }

    pub async fn delete_bookmark(&self, token: &str, id: &str) -> Result<(), StoreError> {
        let url = self.table_url("bookmarks", &[("id", format!("eq.{}", id))]);
        self.delete(token, &url).await
    }

    // ==================== Categories ====================

    /// All categories for one user in sibling display order. The tree
    /// builder re-sorts anyway; the order here just keeps payloads stable.
    pub async fn list_categories(&self, token: &str, user_id: &str) -> Result<Vec<Category>, StoreError> {
        let url = self.table_url("categories", &[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("order", "sort_order.asc".to_string()),
        ]);
        self.get_rows(token, &url).await
    }

    pub async fn insert_category(&self, token: &str, new: &NewCategory) -> Result<Category, StoreError> {
        let url = self.table_url("categories", &[]);
        self.insert_row(token, &url, new).await
    }

    pub async fn update_category(&self, token: &str, id: &str, patch: &CategoryPatch) -> Result<Category, StoreError> {
        let url = self.table_url("categories", &[("id", format!("eq.{}", id))]);
        self.patch_row(token, &url, patch).await
    }

    /// Delete a set of categories in one request. Cascade deletion passes a
    /// category id together with its collected descendants here.
    pub async fn delete_categories(&self, token: &str, ids: &[String]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let url = self.table_url("categories", &[("id", format!("in.({})", ids.join(",")))]);
        self.delete(token, &url).await
    }

    /// Next sort_order for a new sibling: current max + 1, or 1 for the
    /// first child. parent_id None means the root level.
    pub async fn next_sort_order(&self, token: &str, user_id: &str, parent_id: Option<&str>) -> Result<i32, StoreError> {
        let parent_filter = match parent_id {
            Some(parent) => format!("eq.{}", parent),
            None => "is.null".to_string(),
        };
        let url = self.table_url("categories", &[
            ("select", "sort_order".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("parent_id", parent_filter),
            ("order", "sort_order.desc".to_string()),
            ("limit", "1".to_string()),
        ]);

        #[derive(serde::Deserialize)]
        struct SortOrderRow {
            sort_order: Option<i32>,
        }

        let rows: Vec<SortOrderRow> = self.get_rows(token, &url).await?;
        let max = rows.first().and_then(|r| r.sort_order).unwrap_or(0);
        Ok(max + 1)
    }

    // ==================== Tags ====================

    /// Named tags for the command menu, alphabetical.
    pub async fn list_tags(&self, token: &str, user_id: &str) -> Result<Vec<Tag>, StoreError> {
        let url = self.table_url("tags", &[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("order", "name.asc".to_string()),
        ]);
        self.get_rows(token, &url).await
    }

    // ==================== Request plumbing ====================

    fn table_url(&self, table: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}/rest/v1/{}", self.base_url, table);
        if !params.is_empty() {
            let query: Vec<String> = params
                .iter()
                .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
                .collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }

    fn authed(&self, request: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", token))
    }

    async fn get_rows<T: DeserializeOwned>(&self, token: &str, url: &str) -> Result<Vec<T>, StoreError> {
        let response = self.authed(self.http.get(url), token).send().await?;
        let body = check_status(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn insert_row<T: DeserializeOwned, P: Serialize>(&self, token: &str, url: &str, payload: &P) -> Result<T, StoreError> {
        let response = self
            .authed(self.http.post(url), token)
            .header("Prefer", "return=representation")
            .json(payload)
            .send()
            .await?;
        let body = check_status(response).await?;
        let mut rows: Vec<T> = serde_json::from_str(&body)?;
        if rows.is_empty() {
            return Err(StoreError::EmptyWrite);
        }
        Ok(rows.remove(0))
    }

    async fn patch_row<T: DeserializeOwned, P: Serialize>(&self, token: &str, url: &str, payload: &P) -> Result<T, StoreError> {
        let response = self
            .authed(self.http.patch(url), token)
            .header("Prefer", "return=representation")
            .json(payload)
            .send()
            .await?;
        let body = check_status(response).await?;
        let mut rows: Vec<T> = serde_json::from_str(&body)?;
        if rows.is_empty() {
            return Err(StoreError::EmptyWrite);
        }
        Ok(rows.remove(0))
    }

    async fn delete(&self, token: &str, url: &str) -> Result<(), StoreError> {
        let response = self.authed(self.http.delete(url), token).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<String, StoreError> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(StoreError::Api { status: status.as_u16(), message: body });
    }
    Ok(body)
}
