//! Collection hierarchy resolution
//!
//! Turns the flat root/child collection listings into [`ResolvedCollection`]s:
//! every collection gets its hierarchy path, root and group-prefixed full path.

pub mod graph;
pub mod groups;
pub mod resolver;

pub use graph::CollectionGraph;
pub use groups::{compose_full_path, Group, GroupIndex};
pub use resolver::{PathResolver, Resolution};

use crate::error::ExportError;
use crate::models::resolved::ResolvedCollection;
use log::{error, info};

/// Outcome of resolving a whole graph
#[derive(Debug, Default)]
pub struct ResolvedSet {
    pub collections: Vec<ResolvedCollection>,
    /// Collections on or below a parent cycle, left out of `collections`
    pub cycles: Vec<ExportError>,
}

/// Resolve every collection of the graph, in graph order
///
/// Collections that cannot be resolved because of a parent cycle are logged
/// and reported in [`ResolvedSet::cycles`]; the rest of the tree still
/// resolves.
pub fn resolve_all(graph: &CollectionGraph, groups: &GroupIndex) -> ResolvedSet {
    let mut resolver = PathResolver::new(graph);
    let mut set = ResolvedSet::default();

    for node in graph.nodes() {
        match resolver.resolve(&node.id) {
            Ok(resolution) => {
                let full_path = compose_full_path(&resolution.path, &resolution.root_id, groups);
                set.collections.push(ResolvedCollection {
                    id: node.id.clone(),
                    title: node.title.clone(),
                    parent_id: node.parent_id.clone(),
                    path: resolution.path.clone(),
                    root_title: resolution.root_title.clone(),
                    root_id: resolution.root_id.clone(),
                    group: groups.group_of(&resolution.root_id).to_string(),
                    full_path,
                });
            }
            Err(e) => {
                error!("Cannot resolve collection {} ({:?}): {}", node.id, node.title, e);
                set.cycles.push(e);
            }
        }
    }

    info!(
        "Resolved {} collections ({} unresolvable)",
        set.collections.len(),
        set.cycles.len()
    );
    set
}
