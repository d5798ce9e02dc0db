use serde_json::Value;
use std::fmt;

/// Opaque collection identifier
///
/// Raindrop hands ids out as JSON numbers, but parent references and group
/// member lists are not always consistent about it, so numbers and strings
/// are both normalized to their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionId(String);

impl CollectionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalize a scalar JSON value into an id
    ///
    /// Integers, integral floats and non-empty strings are accepted; anything
    /// else (null, bool, arrays, objects, blank strings) is not an id.
    pub fn from_json(value: &Value) -> Option<Self> {
        const I64_MIN_F64: f64 = -9_223_372_036_854_775_808.0;
        const I64_END_F64: f64 = 9_223_372_036_854_775_808.0;

        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self(i.to_string()))
                } else if let Some(u) = n.as_u64() {
                    Some(Self(u.to_string()))
                } else {
                    // `as` saturates, so out-of-range floats would collide
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && (I64_MIN_F64..I64_END_F64).contains(f))
                        .map(|f| Self(format!("{}", f as i64)))
                }
            }
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else {
                    Some(Self(s.to_string()))
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CollectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<i64> for CollectionId {
    fn from(i: i64) -> Self {
        Self(i.to_string())
    }
}

/// A single node of the collection tree
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionNode {
    pub id: CollectionId,
    pub title: String,
    pub parent_id: Option<CollectionId>,
}

/// Field names a wrapped parent reference may carry its id under
const PARENT_ID_KEYS: [&str; 3] = ["$id", "id", "_id"];

/// Normalize a parent reference to a scalar id
///
/// Accepts a bare id (`12`, `"12"`) or a wrapped object exposing the id under
/// `$id`, `id` or `_id`. Anything that does not boil down to a scalar is
/// treated as "no parent".
pub fn parent_ref(value: &Value) -> Option<CollectionId> {
    match value {
        Value::Object(map) => PARENT_ID_KEYS
            .iter()
            .find_map(|key| map.get(*key))
            .and_then(CollectionId::from_json),
        other => CollectionId::from_json(other),
    }
}

/// Id of a raw collection object (`_id`, falling back to `id`)
pub fn collection_id(raw: &Value) -> Option<CollectionId> {
    raw.get("_id")
        .or_else(|| raw.get("id"))
        .and_then(CollectionId::from_json)
}

/// Title of a raw collection object; missing titles become empty strings
pub fn collection_title(raw: &Value) -> String {
    raw.get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Parent reference of a raw collection object (`parent`, then `parentId`)
pub fn collection_parent(raw: &Value) -> Option<CollectionId> {
    raw.get("parent")
        .or_else(|| raw.get("parentId"))
        .and_then(parent_ref)
}

impl CollectionNode {
    /// Build a node from a raw API object, or `None` when it carries no id
    pub fn from_raw(raw: &Value, as_root: bool) -> Option<Self> {
        let id = collection_id(raw)?;
        let parent_id = if as_root {
            None
        } else {
            collection_parent(raw)
        };
        Some(Self {
            id,
            title: collection_title(raw),
            parent_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(12), Some("12"))]
    #[case(json!("12"), Some("12"))]
    #[case(json!(" 7 "), Some("7"))]
    #[case(json!({"$id": 3}), Some("3"))]
    #[case(json!({"id": 4}), Some("4"))]
    #[case(json!({"_id": "5"}), Some("5"))]
    #[case(json!({"$id": 1, "id": 2}), Some("1"))]
    #[case(json!(null), None)]
    #[case(json!(""), None)]
    #[case(json!(true), None)]
    #[case(json!([1, 2]), None)]
    #[case(json!({"$id": {"nested": 1}}), None)]
    #[case(json!({"$ref": "collections"}), None)]
    #[case(json!(2.5), None)]
    fn test_parent_ref(#[case] input: Value, #[case] expected: Option<&str>) {
        assert_eq!(parent_ref(&input), expected.map(CollectionId::from));
    }

    #[test]
    fn test_number_and_string_ids_are_equal() {
        assert_eq!(
            CollectionId::from_json(&json!(42)),
            CollectionId::from_json(&json!("42"))
        );
    }

    #[rstest]
    #[case(json!(12.0), Some("12"))]
    #[case(json!(-3.0), Some("-3"))]
    #[case(json!(1e19), None)]
    #[case(json!(-1e19), None)]
    #[case(json!(1e300), None)]
    fn test_float_ids(#[case] input: Value, #[case] expected: Option<&str>) {
        assert_eq!(CollectionId::from_json(&input), expected.map(CollectionId::from));
    }

    #[test]
    fn test_huge_float_ids_do_not_collide() {
        assert_eq!(CollectionId::from_json(&json!(1e19)), None);
        assert_eq!(CollectionId::from_json(&json!(2e19)), None);
    }

    #[test]
    fn test_from_raw_child() {
        let raw = json!({"_id": 2, "title": "B", "parent": {"$id": 1}});
        let node = CollectionNode::from_raw(&raw, false).unwrap();
        assert_eq!(node.id, CollectionId::from(2));
        assert_eq!(node.title, "B");
        assert_eq!(node.parent_id, Some(CollectionId::from(1)));
    }

    #[test]
    fn test_from_raw_root_ignores_parent() {
        let raw = json!({"_id": 2, "title": "B", "parent": {"$id": 1}});
        let node = CollectionNode::from_raw(&raw, true).unwrap();
        assert_eq!(node.parent_id, None);
    }

    #[test]
    fn test_from_raw_accepts_alternate_field_names() {
        let raw = json!({"id": "9", "parentId": 3});
        let node = CollectionNode::from_raw(&raw, false).unwrap();
        assert_eq!(node.id, CollectionId::from(9));
        assert_eq!(node.title, "");
        assert_eq!(node.parent_id, Some(CollectionId::from(3)));
    }

    #[test]
    fn test_from_raw_without_id() {
        assert!(CollectionNode::from_raw(&json!({"title": "x"}), false).is_none());
    }
}
