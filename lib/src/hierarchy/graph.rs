use crate::models::collection::{CollectionId, CollectionNode};
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;

/// Immutable id -> node map of every known collection
///
/// Iteration follows the order in which ids were first seen (roots first,
/// then children), which is also the order collections get processed in.
#[derive(Debug, Default, Clone)]
pub struct CollectionGraph {
    nodes: HashMap<CollectionId, CollectionNode>,
    order: Vec<CollectionId>,
    duplicates: Vec<CollectionId>,
    skipped: usize,
}

impl CollectionGraph {
    /// Build the graph from the root and child collection listings
    ///
    /// Roots never get a parent, whatever their payload says. A duplicate id
    /// overwrites the earlier node (last write wins) and is reported.
    pub fn build(roots: &[Value], children: &[Value]) -> Self {
        let mut graph = Self::default();

        for raw in roots {
            graph.insert_raw(raw, true);
        }
        for raw in children {
            graph.insert_raw(raw, false);
        }

        debug!(
            "Collection graph built: {} nodes ({} roots listed, {} children listed)",
            graph.len(),
            roots.len(),
            children.len()
        );
        for orphan in graph.orphans() {
            warn!(
                "Collection {} ({:?}) references missing parent {}; treating it as a root",
                orphan.id,
                orphan.title,
                orphan.parent_id.as_ref().map(|p| p.to_string()).unwrap_or_default()
            );
        }

        graph
    }

    /// Build from already-normalized nodes, same overwrite rules as [`build`](Self::build)
    pub fn from_nodes<I: IntoIterator<Item = CollectionNode>>(nodes: I) -> Self {
        let mut graph = Self::default();
        for node in nodes {
            graph.insert(node);
        }
        graph
    }

    fn insert_raw(&mut self, raw: &Value, as_root: bool) {
        match CollectionNode::from_raw(raw, as_root) {
            Some(node) => self.insert(node),
            None => {
                warn!("Skipping collection without a usable id: {}", raw);
                self.skipped += 1;
            }
        }
    }

    fn insert(&mut self, node: CollectionNode) {
        let id = node.id.clone();
        if let Some(previous) = self.nodes.insert(id.clone(), node) {
            warn!(
                "Duplicate collection id {} ({:?}); the later entry overwrites it",
                id, previous.title
            );
            self.duplicates.push(id);
        } else {
            self.order.push(id);
        }
    }

    pub fn get(&self, id: &CollectionId) -> Option<&CollectionNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &CollectionId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids in processing order
    pub fn ids(&self) -> impl Iterator<Item = &CollectionId> {
        self.order.iter()
    }

    /// Nodes in processing order
    pub fn nodes(&self) -> impl Iterator<Item = &CollectionNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Parent of `id` if that parent is itself part of the graph
    pub fn parent_of(&self, id: &CollectionId) -> Option<&CollectionId> {
        self.nodes
            .get(id)
            .and_then(|node| node.parent_id.as_ref())
            .filter(|parent| self.nodes.contains_key(*parent))
    }

    /// Nodes without a parent, or whose parent is unknown
    pub fn roots(&self) -> impl Iterator<Item = &CollectionNode> {
        self.nodes()
            .filter(|node| self.parent_of(&node.id).is_none())
    }

    /// Nodes pointing at a parent id the graph does not contain
    pub fn orphans(&self) -> impl Iterator<Item = &CollectionNode> {
        self.nodes().filter(|node| {
            node.parent_id
                .as_ref()
                .is_some_and(|parent| !self.nodes.contains_key(parent))
        })
    }

    /// Ids that were listed more than once (one entry per overwrite)
    pub fn duplicates(&self) -> &[CollectionId] {
        &self.duplicates
    }

    /// Raw objects dropped because they carried no id
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(graph: &CollectionGraph) -> Vec<String> {
        graph.ids().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_build_roots_and_children() {
        let roots = vec![json!({"_id": 1, "title": "A"})];
        let children = vec![
            json!({"_id": 2, "title": "B", "parent": {"$id": 1}}),
            json!({"_id": 3, "title": "C", "parent": {"$id": 2}}),
        ];
        let graph = CollectionGraph::build(&roots, &children);

        assert_eq!(graph.len(), 3);
        assert_eq!(ids(&graph), vec!["1", "2", "3"]);
        assert_eq!(
            graph.parent_of(&CollectionId::from(3)),
            Some(&CollectionId::from(2))
        );
        assert_eq!(graph.roots().count(), 1);
        for (id, node) in graph.ids().zip(graph.nodes()) {
            assert_eq!(id, &node.id);
        }
    }

    #[test]
    fn test_roots_drop_parent_reference() {
        let roots = vec![json!({"_id": 1, "title": "A", "parent": {"$id": 99}})];
        let graph = CollectionGraph::build(&roots, &[]);
        assert_eq!(graph.get(&CollectionId::from(1)).unwrap().parent_id, None);
        assert_eq!(graph.orphans().count(), 0);
    }

    #[test]
    fn test_duplicate_id_last_write_wins() {
        let roots = vec![json!({"_id": 1, "title": "First"})];
        let children = vec![
            json!({"_id": 2, "title": "B", "parent": 1}),
            json!({"_id": 1, "title": "Second", "parent": 2}),
        ];
        let graph = CollectionGraph::build(&roots, &children);

        let node = graph.get(&CollectionId::from(1)).unwrap();
        assert_eq!(node.title, "Second");
        assert_eq!(node.parent_id, Some(CollectionId::from(2)));
        assert_eq!(graph.duplicates(), &[CollectionId::from(1)]);
        // First-seen position is kept
        assert_eq!(ids(&graph), vec!["1", "2"]);
    }

    #[test]
    fn test_orphan_is_reported_and_treated_as_root() {
        let children = vec![json!({"_id": 5, "title": "Lost", "parent": {"$id": 404}})];
        let graph = CollectionGraph::build(&[], &children);

        let orphans: Vec<_> = graph.orphans().map(|n| n.id.clone()).collect();
        assert_eq!(orphans, vec![CollectionId::from(5)]);
        assert_eq!(graph.parent_of(&CollectionId::from(5)), None);
        assert_eq!(graph.roots().count(), 1);
    }

    #[test]
    fn test_entries_without_id_are_skipped() {
        let roots = vec![json!({"title": "no id"}), json!({"_id": 1, "title": "A"})];
        let graph = CollectionGraph::build(&roots, &[]);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.skipped(), 1);
    }
}
