//! Bookmark count aggregation
//!
//! Per-category counts roll up through the category tree (a category's badge
//! includes everything filed under its subtree), and the dashboard cards get
//! their headline numbers here. Pure functions over already-fetched rows.

use crate::category_tree::CategoryNode;
use crate::store::{Bookmark, Category};
use serde::Serialize;
use std::collections::HashMap;

/// Dashboard headline numbers.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_bookmarks: usize,
    pub favorites: usize,
    pub recent: usize,
    pub categories: usize,
}

/// How many recent bookmarks the dashboard shows.
const RECENT_CARD_LIMIT: usize = 5;

pub fn dashboard(bookmarks: &[Bookmark], categories: &[Category]) -> DashboardStats {
    DashboardStats {
        total_bookmarks: bookmarks.len(),
        favorites: bookmarks.iter().filter(|b| b.is_favorite).count(),
        recent: bookmarks.len().min(RECENT_CARD_LIMIT),
        categories: categories.len(),
    }
}

/// Direct (non-rolled-up) bookmark count per category id. Bookmarks without
/// a category don't contribute anywhere.
pub fn direct_counts(bookmarks: &[Bookmark]) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for bookmark in bookmarks {
        if let Some(category_id) = &bookmark.category_id {
            *counts.entry(category_id.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Total count per node: own direct count plus the totals of all children,
/// computed in one post-order pass. Every node in the forest gets an entry,
/// zero included.
pub fn rollup_counts(
    roots: &[CategoryNode],
    direct: &HashMap<String, usize>,
) -> HashMap<String, usize> {
    let mut totals = HashMap::new();
    for node in roots {
        rollup_node(node, direct, &mut totals);
    }
    totals
}

fn rollup_node(
    node: &CategoryNode,
    direct: &HashMap<String, usize>,
    totals: &mut HashMap<String, usize>,
) -> usize {
    let mut total = direct.get(&node.category.id).copied().unwrap_or(0);
    for child in &node.children {
        total += rollup_node(child, direct, totals);
    }
    totals.insert(node.category.id.clone(), total);
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category_tree::build_tree;

    fn cat(id: &str, parent: Option<&str>, sort: i32) -> Category {
        Category {
            id: id.to_string(),
            user_id: "u1".to_string(),
            parent_id: parent.map(|p| p.to_string()),
            name: id.to_string(),
            color: None,
            icon: None,
            sort_order: Some(sort),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn bookmark(id: &str, category: Option<&str>, favorite: bool) -> Bookmark {
        Bookmark {
            id: id.to_string(),
            user_id: "u1".to_string(),
            title: id.to_string(),
            url: format!("https://example.com/{}", id),
            description: None,
            favicon_url: None,
            is_favorite: favorite,
            tags: vec![],
            category_id: category.map(|c| c.to_string()),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_direct_counts_skip_uncategorized() {
        let bookmarks = vec![
            bookmark("b1", Some("dev"), false),
            bookmark("b2", Some("dev"), false),
            bookmark("b3", None, false),
        ];
        let counts = direct_counts(&bookmarks);
        assert_eq!(counts.get("dev"), Some(&2));
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn test_rollup_three_levels() {
        // root -> mid -> leaf, plus a second child of root
        let tree = build_tree(&[
            cat("root", None, 1),
            cat("mid", Some("root"), 1),
            cat("leaf", Some("mid"), 1),
            cat("side", Some("root"), 2),
        ]);
        let direct = HashMap::from([
            ("root".to_string(), 1),
            ("mid".to_string(), 2),
            ("leaf".to_string(), 4),
            ("side".to_string(), 8),
        ]);
        let totals = rollup_counts(&tree, &direct);
        assert_eq!(totals["leaf"], 4);
        assert_eq!(totals["mid"], 6);
        assert_eq!(totals["side"], 8);
        assert_eq!(totals["root"], 15);
    }

    #[test]
    fn test_rollup_zero_everywhere_is_normal() {
        let tree = build_tree(&[cat("a", None, 1), cat("b", Some("a"), 1)]);
        let totals = rollup_counts(&tree, &HashMap::new());
        assert_eq!(totals["a"], 0);
        assert_eq!(totals["b"], 0);
        assert_eq!(totals.len(), 2);
    }

    #[test]
    fn test_dashboard_numbers() {
        let bookmarks = vec![
            bookmark("b1", None, true),
            bookmark("b2", None, false),
            bookmark("b3", None, true),
        ];
        let categories = vec![cat("a", None, 1)];
        let stats = dashboard(&bookmarks, &categories);
        assert_eq!(stats.total_bookmarks, 3);
        assert_eq!(stats.favorites, 2);
        assert_eq!(stats.recent, 3);
        assert_eq!(stats.categories, 1);
    }
}
