use crate::models::collection::CollectionId;
use crate::models::resolved::PATH_SEPARATOR;
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;

/// A flat label applied to root collections
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub title: String,
    pub member_root_ids: Vec<CollectionId>,
}

impl Group {
    pub fn new(title: impl Into<String>, members: impl IntoIterator<Item = CollectionId>) -> Self {
        Self {
            title: title.into(),
            member_root_ids: members.into_iter().collect(),
        }
    }

    /// Parse one entry of the `/user` groups array
    pub fn from_raw(raw: &Value) -> Self {
        let title = raw
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let member_root_ids = raw
            .get("collections")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(CollectionId::from_json).collect())
            .unwrap_or_default();
        Self {
            title,
            member_root_ids,
        }
    }
    /// Groups of the `/user` response (`user.groups`, or a top-level `groups`)
    pub fn from_user_payload(payload: &Value) -> Vec<Group> {
        payload
            .get("user")
            .and_then(|user| user.get("groups"))
            .or_else(|| payload.get("groups"))
            .and_then(Value::as_array)
            .map(|groups| groups.iter().map(Group::from_raw).collect())
            .unwrap_or_default()
    }
}

/// Root collection id -> group title
#[derive(Debug, Default, Clone)]
pub struct GroupIndex {
    by_root: HashMap<CollectionId, String>,
    reassigned: usize,
}

impl GroupIndex {
    /// Index groups by member root id; a root listed in several groups ends
    /// up in the last one.
    pub fn from_groups<'a, I: IntoIterator<Item = &'a Group>>(groups: I) -> Self {
        let mut index = Self::default();
        for group in groups {
            for root_id in &group.member_root_ids {
                if let Some(previous) = index.by_root.insert(root_id.clone(), group.title.clone()) {
                    if previous != group.title {
                        warn!(
                            "Collection {} is listed in groups {:?} and {:?}; using {:?}",
                            root_id, previous, group.title, group.title
                        );
                        index.reassigned += 1;
                    }
                }
            }
        }
        debug!("Group index built: {} grouped roots", index.by_root.len());
        index
    }

    /// Group label of a root collection, empty when ungrouped
    pub fn group_of(&self, root_id: &CollectionId) -> &str {
        self.by_root.get(root_id).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.by_root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_root.is_empty()
    }

    /// How many memberships overwrote an earlier one
    pub fn reassigned(&self) -> usize {
        self.reassigned
    }
}

/// Prefix a hierarchy path with the group of its root, if any
pub fn compose_full_path(path: &str, root_id: &CollectionId, groups: &GroupIndex) -> String {
    let group = groups.group_of(root_id);
    if group.is_empty() {
        path.to_string()
    } else {
        format!("{}{}{}", group, PATH_SEPARATOR, path)
    }
}
