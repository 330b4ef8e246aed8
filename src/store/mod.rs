mod client;
mod models;

pub use client::{StoreClient, StoreError};
pub use models::{
    Bookmark, BookmarkFilter, BookmarkPatch, Category, CategoryPatch, NewBookmark, NewCategory,
    Tag, ViewMode,
};
