use super::resolved::ResolvedCollection;

/// Columns injected into every bookmark, always written last
pub const METADATA_COLUMNS: [&str; 5] = [
    "collection_id",
    "collection_title",
    "full_path",
    "root_collection",
    "group",
];

/// Field holding the bookmark's own id, and its fallback
const ID_FIELDS: [&str; 2] = ["id", "_id"];

/// One bookmark row from a collection export
///
/// The columns are whatever the service put in its export, kept in their
/// original order; metadata columns are appended by [`BookmarkRecord::tag`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookmarkRecord {
    fields: Vec<(String, String)>,
}

impl BookmarkRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (key, value) in pairs {
            record.set(key, value);
        }
        record
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == column)
            .map(|(_, value)| value.as_str())
    }

    /// Set a column, replacing the value in place if it already exists
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(key, _)| *key == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn remove(&mut self, column: &str) -> Option<String> {
        let idx = self.fields.iter().position(|(key, _)| key == column)?;
        Some(self.fields.remove(idx).1)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The bookmark's own identifier (`id`, falling back to `_id`)
    ///
    /// Blank values count as absent.
    pub fn bookmark_id(&self) -> Option<&str> {
        ID_FIELDS
            .iter()
            .filter_map(|field| self.get(field))
            .map(str::trim)
            .find(|value| !value.is_empty())
    }

    /// Attach the owning collection's metadata as the last five columns
    ///
    /// Upstream columns sharing a metadata name are dropped first so the
    /// injected values always win and always sit at the end.
    pub fn tag(&mut self, collection: &ResolvedCollection) {
        for column in METADATA_COLUMNS {
            self.remove(column);
        }
        self.fields
            .push(("collection_id".into(), collection.id.to_string()));
        self.fields
            .push(("collection_title".into(), collection.title.clone()));
        self.fields
            .push(("full_path".into(), collection.full_path.clone()));
        self.fields
            .push(("root_collection".into(), collection.root_title.clone()));
        self.fields.push(("group".into(), collection.group.clone()));
    }
}
