use super::graph::CollectionGraph;
use crate::error::{ExportError, Result};
use crate::models::collection::CollectionId;
use crate::models::resolved::PATH_SEPARATOR;
use std::collections::{HashMap, HashSet};

/// Hierarchy facts for one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub path: String,
    pub root_title: String,
    pub root_id: CollectionId,
}

/// Memoized path/root lookups over a [`CollectionGraph`]
///
/// Walks parent chains iteratively, so deep trees cannot blow the stack and
/// parent cycles surface as [`ExportError::GraphCycle`]. Successful lookups
/// are cached for the resolver's lifetime; failed ones are not, so each
/// query reports the chain as seen from the id it was asked about.
pub struct PathResolver<'g> {
    graph: &'g CollectionGraph,
    cache: HashMap<CollectionId, Resolution>,
}

impl<'g> PathResolver<'g> {
    pub fn new(graph: &'g CollectionGraph) -> Self {
        Self {
            graph,
            cache: HashMap::with_capacity(graph.len()),
        }
    }

    /// `" / "`-joined titles from the top ancestor down to `id`
    pub fn path_of(&mut self, id: &CollectionId) -> Result<String> {
        self.resolve(id).map(|r| r.path.clone())
    }

    pub fn root_title_of(&mut self, id: &CollectionId) -> Result<String> {
        self.resolve(id).map(|r| r.root_title.clone())
    }

    pub fn root_id_of(&mut self, id: &CollectionId) -> Result<CollectionId> {
        self.resolve(id).map(|r| r.root_id.clone())
    }

    /// Number of cached resolutions
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Resolve path, root title and root id of `id` in one walk
    pub fn resolve(&mut self, id: &CollectionId) -> Result<&Resolution> {
        if !self.cache.contains_key(id) {
            self.walk(id)?;
        }
        self.cache
            .get(id)
            .ok_or_else(|| ExportError::UnknownCollection(id.clone()))
    }

    /// Climb from `id` until a cached node or a root, then fill the cache
    /// on the way back down.
    fn walk(&mut self, id: &CollectionId) -> Result<()> {
        let graph = self.graph;
        let mut chain: Vec<&CollectionId> = Vec::new();
        let mut visited: HashSet<&CollectionId> = HashSet::new();
        let mut current = graph
            .get(id)
            .map(|node| &node.id)
            .ok_or_else(|| ExportError::UnknownCollection(id.clone()))?;
        let mut base: Option<Resolution> = None;

        loop {
            if let Some(hit) = self.cache.get(current) {
                base = Some(hit.clone());
                break;
            }
            if !visited.insert(current) {
                let mut ids: Vec<CollectionId> = chain.iter().map(|c| (*c).clone()).collect();
                ids.push(current.clone());
                return Err(ExportError::GraphCycle {
                    id: id.clone(),
                    chain: ids,
                });
            }
            chain.push(current);
            match graph.parent_of(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }

        // With no cached ancestor the last node in the chain is the root
        for node_id in chain.into_iter().rev() {
            let title = graph
                .get(node_id)
                .map(|node| node.title.as_str())
                .unwrap_or_default();
            let resolution = match &base {
                Some(parent) => Resolution {
                    path: format!("{}{}{}", parent.path, PATH_SEPARATOR, title),
                    root_title: parent.root_title.clone(),
                    root_id: parent.root_id.clone(),
                },
                None => Resolution {
                    path: title.to_string(),
                    root_title: title.to_string(),
                    root_id: node_id.clone(),
                },
            };
            self.cache.insert(node_id.clone(), resolution.clone());
            base = Some(resolution);
        }

        Ok(())
    }
}
