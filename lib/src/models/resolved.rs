use super::collection::CollectionId;

/// Separator between titles in hierarchy and full paths
pub const PATH_SEPARATOR: &str = " / ";

/// A collection with its place in the hierarchy worked out
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCollection {
    pub id: CollectionId,
    pub title: String,
    pub parent_id: Option<CollectionId>,
    /// Titles from the top ancestor down to this collection
    pub path: String,
    pub root_title: String,
    pub root_id: CollectionId,
    /// Group label of the root collection, empty when ungrouped
    pub group: String,
    pub full_path: String,
}

