//! Bookmark browsing: filter chips, text search, tag aggregation
//!
//! The store hands back the user's full bookmark list ordered by recency;
//! everything here narrows that list in memory. The "now" used for the
//! recency window is always passed in by the caller.

use crate::store::{Bookmark, BookmarkFilter};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// "Recent" filter chip window.
const RECENT_WINDOW_DAYS: i64 = 7;

/// Everything the bookmark list page can narrow by at once.
#[derive(Debug, Clone, Default)]
pub struct BookmarkQuery {
    pub filter: Option<BookmarkFilter>,
    pub query: Option<String>,
    pub tag: Option<String>,
    pub category_id: Option<String>,
}

/// Apply filter chip, text query, and tag/category narrowing, preserving the
/// input's ordering. The text query matches case-insensitively against
/// title, url, and any tag.
pub fn filter_bookmarks(
    bookmarks: &[Bookmark],
    query: &BookmarkQuery,
    now: DateTime<Utc>,
) -> Vec<Bookmark> {
    let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
    bookmarks
        .iter()
        .filter(|b| match query.filter.unwrap_or(BookmarkFilter::All) {
            BookmarkFilter::All => true,
            BookmarkFilter::Favorites => b.is_favorite,
            BookmarkFilter::Recent => created_after(b, cutoff),
        })
        .filter(|b| match query.query.as_deref() {
            Some(q) if !q.trim().is_empty() => matches_query(b, q),
            _ => true,
        })
        .filter(|b| match query.tag.as_deref() {
            Some(tag) => b.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)),
            None => true,
        })
        .filter(|b| match query.category_id.as_deref() {
            Some(category_id) => b.category_id.as_deref() == Some(category_id),
            None => true,
        })
        .cloned()
        .collect()
}

fn created_after(bookmark: &Bookmark, cutoff: DateTime<Utc>) -> bool {
    match DateTime::parse_from_rfc3339(&bookmark.created_at) {
        Ok(created) => created.with_timezone(&Utc) > cutoff,
        // Unparseable timestamp: the row can't prove it's recent
        Err(_) => false,
    }
}

fn matches_query(bookmark: &Bookmark, query: &str) -> bool {
    let q = query.to_lowercase();
    bookmark.title.to_lowercase().contains(&q)
        || bookmark.url.to_lowercase().contains(&q)
        || bookmark.tags.iter().any(|t| t.to_lowercase().contains(&q))
}

/// One entry per distinct tag across the user's bookmarks.
#[derive(Debug, Clone, Serialize)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}

/// Unique tags with usage counts, most-used first; ties break by name so the
/// tags page renders stably.
pub fn aggregate_tags(bookmarks: &[Bookmark]) -> Vec<TagCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for bookmark in bookmarks {
        for tag in &bookmark.tags {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    let mut tags: Vec<TagCount> = counts
        .into_iter()
        .map(|(name, count)| TagCount { name: name.to_string(), count })
        .collect();
    tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bookmark(id: &str, title: &str, url: &str, tags: &[&str], favorite: bool, created: &str) -> Bookmark {
        Bookmark {
            id: id.to_string(),
            user_id: "u1".to_string(),
            title: title.to_string(),
            url: url.to_string(),
            description: None,
            favicon_url: None,
            is_favorite: favorite,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category_id: None,
            created_at: created.to_string(),
            updated_at: created.to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_favorites_filter() {
        let bookmarks = vec![
            bookmark("b1", "Rust", "https://rust-lang.org", &[], true, "2026-07-01T00:00:00Z"),
            bookmark("b2", "Go", "https://go.dev", &[], false, "2026-07-01T00:00:00Z"),
        ];
        let query = BookmarkQuery { filter: Some(BookmarkFilter::Favorites), ..Default::default() };
        let out = filter_bookmarks(&bookmarks, &query, now());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "b1");
    }

    #[test]
    fn test_recent_filter_uses_seven_day_window() {
        let bookmarks = vec![
            bookmark("old", "Old", "https://a.example", &[], false, "2026-07-20T00:00:00Z"),
            bookmark("new", "New", "https://b.example", &[], false, "2026-07-30T00:00:00Z"),
            bookmark("bad", "Bad", "https://c.example", &[], false, "not a date"),
        ];
        let query = BookmarkQuery { filter: Some(BookmarkFilter::Recent), ..Default::default() };
        let out = filter_bookmarks(&bookmarks, &query, now());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "new");
    }

    #[test]
    fn test_text_query_matches_title_url_and_tags() {
        let bookmarks = vec![
            bookmark("b1", "The Book", "https://doc.rust-lang.org/book", &[], false, "2026-07-01T00:00:00Z"),
            bookmark("b2", "HN", "https://news.ycombinator.com", &["reading"], false, "2026-07-01T00:00:00Z"),
            bookmark("b3", "Unrelated", "https://example.com", &[], false, "2026-07-01T00:00:00Z"),
        ];
        let by = |q: &str| {
            let query = BookmarkQuery { query: Some(q.to_string()), ..Default::default() };
            filter_bookmarks(&bookmarks, &query, now())
        };
        assert_eq!(by("book").len(), 1);     // title
        assert_eq!(by("YCOMBINATOR").len(), 1); // url, case-insensitive
        assert_eq!(by("read").len(), 1);     // tag substring
        assert_eq!(by("   ").len(), 3);      // blank query is no query
    }

    #[test]
    fn test_tag_and_category_narrowing() {
        let mut tagged = bookmark("b1", "A", "https://a.example", &["Dev"], false, "2026-07-01T00:00:00Z");
        tagged.category_id = Some("work".to_string());
        let other = bookmark("b2", "B", "https://b.example", &[], false, "2026-07-01T00:00:00Z");

        let bookmarks = vec![tagged, other];
        let query = BookmarkQuery { tag: Some("dev".to_string()), ..Default::default() };
        assert_eq!(filter_bookmarks(&bookmarks, &query, now()).len(), 1);

        let query = BookmarkQuery { category_id: Some("work".to_string()), ..Default::default() };
        assert_eq!(filter_bookmarks(&bookmarks, &query, now()).len(), 1);

        let query = BookmarkQuery { category_id: Some("home".to_string()), ..Default::default() };
        assert!(filter_bookmarks(&bookmarks, &query, now()).is_empty());
    }

    #[test]
    fn test_aggregate_tags_orders_by_count_then_name() {
        let bookmarks = vec![
            bookmark("b1", "A", "https://a.example", &["rust", "dev"], false, "2026-07-01T00:00:00Z"),
            bookmark("b2", "B", "https://b.example", &["rust"], false, "2026-07-01T00:00:00Z"),
            bookmark("b3", "C", "https://c.example", &["art"], false, "2026-07-01T00:00:00Z"),
        ];
        let tags = aggregate_tags(&bookmarks);
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["rust", "art", "dev"]);
        assert_eq!(tags[0].count, 2);
    }
}
