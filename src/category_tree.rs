//! Category tree engine
//!
//! Categories are stored flat (id + parent_id rows); this module rebuilds the
//! nested tree every time the app needs it. Nothing here touches the store or
//! any ambient state: callers pass in the rows they already fetched and own
//! the returned tree outright.
//!
//! - build_tree: flat rows -> ordered forest with level + breadcrumb path
//! - path_of / descendants_of / max_depth: queries over a built forest
//! - can_reparent: cycle check before a parent_id write

use crate::store::Category;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A category plus its derived position in the tree. Rebuilt from scratch on
/// every query cycle, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
    /// 0 for roots, parent.level + 1 below.
    pub level: u32,
    /// Ancestor names, root-to-self inclusive. Always level + 1 entries.
    pub path: Vec<String>,
}

/// Build the nested forest from flat rows belonging to one owner.
///
/// Two passes over the input: first wrap every row, then attach each row to
/// its parent where the parent is present in the same input. A row whose
/// parent_id points outside the input set is demoted to a root rather than
/// dropped; use [`orphaned_parent_refs`] to detect that condition. Sibling
/// lists (and the root list) come back sorted ascending by sort_order,
/// stable on ties. Input order otherwise doesn't matter.
pub fn build_tree(categories: &[Category]) -> Vec<CategoryNode> {
    // Pass 1: index every row by id
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(categories.len());
    for (i, category) in categories.iter().enumerate() {
        index.insert(category.id.as_str(), i);
    }

    // Pass 2: record child links, collect roots. Unresolved parents demote.
    let mut child_indices: Vec<Vec<usize>> = vec![Vec::new(); categories.len()];
    let mut root_indices: Vec<usize> = Vec::new();
    for (i, category) in categories.iter().enumerate() {
        match category.parent_id.as_deref().and_then(|p| index.get(p)) {
            Some(&parent) => child_indices[parent].push(i),
            None => root_indices.push(i),
        }
    }

    sort_siblings(&mut root_indices, categories);
    for siblings in &mut child_indices {
        sort_siblings(siblings, categories);
    }

    root_indices
        .iter()
        .map(|&i| assemble(i, 0, &[], categories, &child_indices))
        .collect()
}

/// Stable ascending sort by effective sort_order; ties keep input order.
fn sort_siblings(siblings: &mut [usize], categories: &[Category]) {
    siblings.sort_by_key(|&i| categories[i].sort_key());
}

fn assemble(
    i: usize,
    level: u32,
    parent_path: &[String],
    categories: &[Category],
    child_indices: &[Vec<usize>],
) -> CategoryNode {
    let category = categories[i].clone();
    let mut path = Vec::with_capacity(parent_path.len() + 1);
    path.extend_from_slice(parent_path);
    path.push(category.name.clone());

    let children = child_indices[i]
        .iter()
        .map(|&c| assemble(c, level + 1, &path, categories, child_indices))
        .collect();

    CategoryNode { category, children, level, path }
}

/// Ids of rows whose declared parent is absent from the input set.
///
/// build_tree demotes these to roots; callers that want to treat the
/// condition as malformed input check here and decide (drop, repair, or
/// surface to the user).
pub fn orphaned_parent_refs(categories: &[Category]) -> Vec<String> {
    let ids: HashSet<&str> = categories.iter().map(|c| c.id.as_str()).collect();
    categories
        .iter()
        .filter(|c| matches!(c.parent_id.as_deref(), Some(p) if !ids.contains(p)))
        .map(|c| c.id.clone())
        .collect()
}

/// Breadcrumb path for a node: ancestor names root-to-self.
///
/// Depth-first over the forest in display order. None if no node with the
/// given id exists anywhere in the forest.
pub fn path_of(roots: &[CategoryNode], target_id: &str) -> Option<Vec<String>> {
    find_node(roots, target_id).map(|node| node.path.clone())
}

/// Every category below the target, flattened in pre-order: parent before
/// its own children, siblings in display order. For root A with children
/// [B, C] and B's child D, the result is [B, D, C].
///
/// Some(empty) means the node was found and has no descendants; None means
/// the node itself is absent. The two cases are deliberately distinct:
/// callers cascade-delete from this list and must not confuse "nothing
/// below" with "no such category".
pub fn descendants_of(roots: &[CategoryNode], target_id: &str) -> Option<Vec<Category>> {
    let node = find_node(roots, target_id)?;
    let mut out = Vec::new();
    collect_subtree(&node.children, &mut out);
    Some(out)
}

fn find_node<'a>(roots: &'a [CategoryNode], target_id: &str) -> Option<&'a CategoryNode> {
    for node in roots {
        if node.category.id == target_id {
            return Some(node);
        }
        if let Some(found) = find_node(&node.children, target_id) {
            return Some(found);
        }
    }
    None
}

fn collect_subtree(nodes: &[CategoryNode], out: &mut Vec<Category>) {
    for node in nodes {
        out.push(node.category.clone());
        collect_subtree(&node.children, out);
    }
}

/// Whether moving a category under a new parent keeps the tree acyclic.
///
/// Moving to root (None) is always legal. Otherwise the candidate parent
/// must be neither the category itself nor any of its own descendants.
/// Pure predicate against the given snapshot; the guarantee holds only as
/// long as the snapshot matches the store, so mutation flows re-validate
/// against fresh rows before writing.
pub fn can_reparent(
    roots: &[CategoryNode],
    category_id: &str,
    new_parent_id: Option<&str>,
) -> bool {
    let Some(new_parent) = new_parent_id else {
        return true;
    };
    if new_parent == category_id {
        return false;
    }
    match descendants_of(roots, category_id) {
        Some(descendants) => !descendants.iter().any(|c| c.id == new_parent),
        None => true,
    }
}

/// Number of levels in the tallest branch. 0 for an empty forest, 1 for a
/// single childless root.
pub fn max_depth(roots: &[CategoryNode]) -> usize {
    roots
        .iter()
        .map(|node| 1 + max_depth(&node.children))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(id: &str, parent: Option<&str>, name: &str, sort: i32) -> Category {
        Category {
            id: id.to_string(),
            user_id: "u1".to_string(),
            parent_id: parent.map(|p| p.to_string()),
            name: name.to_string(),
            color: None,
            icon: None,
            sort_order: Some(sort),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    /// A (sort 1) with children B (1) and C (2); D (1) under B.
    fn sample() -> Vec<Category> {
        vec![
            cat("A", None, "A", 1),
            cat("B", Some("A"), "B", 1),
            cat("C", Some("A"), "C", 2),
            cat("D", Some("B"), "D", 1),
        ]
    }

    #[test]
    fn test_build_tree_nests_and_orders() {
        let tree = build_tree(&sample());
        assert_eq!(tree.len(), 1);

        let a = &tree[0];
        assert_eq!(a.category.id, "A");
        assert_eq!(a.level, 0);
        assert_eq!(a.path, vec!["A"]);

        let names: Vec<&str> = a.children.iter().map(|c| c.category.id.as_str()).collect();
        assert_eq!(names, vec!["B", "C"]);

        let d = &a.children[0].children[0];
        assert_eq!(d.category.id, "D");
        assert_eq!(d.level, 2);
        assert_eq!(d.path, vec!["A", "B", "D"]);
    }

    #[test]
    fn test_build_tree_input_order_does_not_matter() {
        // Deepest row first: levels must still count ancestors correctly
        let mut rows = sample();
        rows.reverse();
        let tree = build_tree(&rows);
        assert_eq!(tree.len(), 1);
        let d = &tree[0].children[0].children[0];
        assert_eq!(d.category.id, "D");
        assert_eq!(d.level, 2);
        assert_eq!(d.path.len(), d.level as usize + 1);
    }

    #[test]
    fn test_level_matches_path_length_everywhere() {
        fn check(nodes: &[CategoryNode], expected_level: u32) {
            for node in nodes {
                assert_eq!(node.level, expected_level);
                assert_eq!(node.path.len(), node.level as usize + 1);
                check(&node.children, expected_level + 1);
            }
        }
        check(&build_tree(&sample()), 0);
    }

    #[test]
    fn test_sibling_ties_keep_input_order() {
        let rows = vec![
            cat("r", None, "r", 0),
            cat("x", Some("r"), "x", 5),
            cat("y", Some("r"), "y", 5),
            cat("z", Some("r"), "z", 1),
        ];
        let tree = build_tree(&rows);
        let order: Vec<&str> = tree[0].children.iter().map(|c| c.category.id.as_str()).collect();
        assert_eq!(order, vec!["z", "x", "y"]);
    }

    #[test]
    fn test_missing_sort_order_sorts_as_zero() {
        let mut unsorted = cat("b", None, "b", 0);
        unsorted.sort_order = None;
        let tree = build_tree(&[cat("a", None, "a", 3), unsorted]);
        let order: Vec<&str> = tree.iter().map(|n| n.category.id.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn test_empty_input_builds_empty_forest() {
        assert!(build_tree(&[]).is_empty());
        assert_eq!(max_depth(&[]), 0);
    }

    #[test]
    fn test_orphaned_parent_demotes_to_root_and_is_reported() {
        let rows = vec![
            cat("a", None, "a", 1),
            cat("lost", Some("gone"), "lost", 1),
        ];
        let tree = build_tree(&rows);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.iter().filter(|n| n.level == 0).count(), 2);
        assert_eq!(orphaned_parent_refs(&rows), vec!["lost"]);
        assert!(orphaned_parent_refs(&sample()).is_empty());
    }

    #[test]
    fn test_path_of() {
        let tree = build_tree(&sample());
        assert_eq!(path_of(&tree, "D"), Some(vec!["A".into(), "B".into(), "D".into()]));
        assert_eq!(path_of(&tree, "A"), Some(vec!["A".into()]));
        assert_eq!(path_of(&tree, "nope"), None);
    }

    #[test]
    fn test_descendants_preorder() {
        let tree = build_tree(&sample());
        let ids: Vec<String> = descendants_of(&tree, "A")
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        // B before its sibling C, and B's child D before C
        assert_eq!(ids, vec!["B", "D", "C"]);
    }

    #[test]
    fn test_descendants_distinguishes_empty_from_missing() {
        let tree = build_tree(&sample());
        assert_eq!(descendants_of(&tree, "D").unwrap().len(), 0);
        assert!(descendants_of(&tree, "nope").is_none());
    }

    #[test]
    fn test_descendants_each_exactly_once() {
        let tree = build_tree(&sample());
        let mut ids: Vec<String> = descendants_of(&tree, "A")
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids, vec!["B", "C", "D"]);
    }

    #[test]
    fn test_can_reparent() {
        let tree = build_tree(&sample());
        // Into a descendant or itself: cycle
        assert!(!can_reparent(&tree, "A", Some("D")));
        assert!(!can_reparent(&tree, "A", Some("A")));
        assert!(!can_reparent(&tree, "B", Some("D")));
        // Root move always fine
        assert!(can_reparent(&tree, "A", None));
        // Sibling is not a descendant
        assert!(can_reparent(&tree, "B", Some("C")));
        assert!(can_reparent(&tree, "D", Some("C")));
    }

    #[test]
    fn test_max_depth() {
        assert_eq!(max_depth(&build_tree(&[cat("only", None, "only", 1)])), 1);
        assert_eq!(max_depth(&build_tree(&sample())), 3);
    }
}
