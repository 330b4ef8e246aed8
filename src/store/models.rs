use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Grid,
    List,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Grid => "grid",
            ViewMode::List => "list",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "grid" => Some(ViewMode::Grid),
            "list" => Some(ViewMode::List),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkFilter {
    All,
    Favorites,
    Recent,
}

impl BookmarkFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookmarkFilter::All => "all",
            BookmarkFilter::Favorites => "favorites",
            BookmarkFilter::Recent => "recent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "all" => Some(BookmarkFilter::All),
            "favorites" => Some(BookmarkFilter::Favorites),
            "recent" => Some(BookmarkFilter::Recent),
            _ => None,
        }
    }
}

// Row shapes match the hosted backend's tables. Field names stay snake_case
// on the wire, so no serde renames here.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub favicon_url: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub tags: Vec<String>,  // Inline tag strings, not joined rows
    pub category_id: Option<String>,
    pub created_at: String,  // RFC 3339, assigned by the store
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub user_id: String,
    pub parent_id: Option<String>,  // Same-owner reference; None for roots
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

impl Category {
    /// Effective sibling ordering key. Missing sort_order sorts as 0.
    pub fn sort_key(&self) -> i32 {
        self.sort_order.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

// ==================== Insert / update payloads ====================

#[derive(Debug, Clone, Serialize)]
pub struct NewBookmark {
    pub user_id: String,
    pub title: String,
    pub url: String,
    pub description: String,
    pub tags: Vec<String>,
    pub is_favorite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

/// Partial update; only present fields reach the store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BookmarkPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCategory {
    pub user_id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Option<String>>,
}
