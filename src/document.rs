//! The in-memory script document
//!
//! A document is a JSON object mapping collection names to arrays of
//! resources, plus a `meta` block holding the schema version.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key of the metadata block
pub const META: &str = "meta";

/// A whole script: collections of named resources plus `meta`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    content: Map<String, Value>,
}

impl Document {
    /// Create an empty document (no meta block)
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value; anything other than an object yields `None`
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(content) => Some(Self { content }),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.content)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.content
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.content
    }

    /// Raw access to any top-level entry, collection or not
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.content.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.content.get_mut(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.content.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.content.remove(key)
    }

    /// Collection names in document order, excluding `meta`
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.content
            .keys()
            .map(String::as_str)
            .filter(|name| *name != META)
    }

    /// Resources of a collection; empty if absent or not an array
    pub fn collection(&self, name: &str) -> &[Value] {
        match self.content.get(name) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    pub fn collection_mut(&mut self, name: &str) -> Option<&mut Vec<Value>> {
        match self.content.get_mut(name) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        }
    }

    /// Find a resource by its `name` within a collection
    pub fn resource(&self, collection: &str, name: &str) -> Option<&Value> {
        self.collection(collection)
            .iter()
            .find(|resource| resource_name(resource) == Some(name))
    }

    /// Whether a collection contains a resource with this name
    pub fn has_resource(&self, collection: &str, name: &str) -> bool {
        self.resource(collection, name).is_some()
    }

    /// Append a resource, creating the collection if needed
    pub fn push_resource(&mut self, collection: &str, resource: Value) {
        let entry = self
            .content
            .entry(collection.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        match entry {
            Value::Array(items) => items.push(resource),
            other => *other = Value::Array(vec![resource]),
        }
    }

    /// The `meta.version` field, if present and a non-negative integer
    pub fn version(&self) -> Option<u64> {
        self.content
            .get(META)
            .and_then(|meta| meta.get("version"))
            .and_then(Value::as_u64)
    }

    /// Set `meta.version`, creating or replacing the meta block as needed
    pub fn set_version(&mut self, version: u64) {
        let meta = self
            .content
            .entry(META.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !meta.is_object() {
            *meta = Value::Object(Map::new());
        }
        if let Value::Object(meta) = meta {
            meta.insert("version".to_string(), Value::from(version));
        }
    }
}

impl From<Map<String, Value>> for Document {
    fn from(content: Map<String, Value>) -> Self {
        Self { content }
    }
}

/// The `name` of a resource, if it has a string one
pub fn resource_name(resource: &Value) -> Option<&str> {
    resource.get("name").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collections_skip_meta() {
        let doc = Document::from_value(json!({
            "meta": { "version": 3 },
            "scenes": [{ "name": "s1" }],
            "roles": []
        }))
        .unwrap();

        let names: Vec<&str> = doc.collection_names().collect();
        assert_eq!(names, vec!["scenes", "roles"]);
        assert_eq!(doc.version(), Some(3));
        assert!(doc.has_resource("scenes", "s1"));
        assert!(!doc.has_resource("roles", "s1"));
        assert!(doc.collection("missing").is_empty());
    }

    #[test]
    fn test_set_version_creates_meta() {
        let mut doc = Document::new();
        assert_eq!(doc.version(), None);
        doc.set_version(7);
        assert_eq!(doc.version(), Some(7));
        assert_eq!(doc.get(META), Some(&json!({ "version": 7 })));
    }

    #[test]
    fn test_push_resource() {
        let mut doc = Document::new();
        doc.push_resource("cues", json!({ "name": "c1" }));
        doc.push_resource("cues", json!({ "name": "c2" }));
        assert_eq!(doc.collection("cues").len(), 2);
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(Document::from_value(json!([1, 2])).is_none());
    }
}
