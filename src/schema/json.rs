//! Lenient accessors over schema nodes.
//!
//! Schema hints are optional and loosely typed; every accessor returns `None`
//! (or an empty list) when the key is absent or has the wrong type.

use serde_json::{Map, Value};

pub(crate) type Object = Map<String, Value>;

pub(crate) fn object<'a>(node: &'a Object, key: &str) -> Option<&'a Object> {
    node.get(key).and_then(Value::as_object)
}

pub(crate) fn string<'a>(node: &'a Object, key: &str) -> Option<&'a str> {
    node.get(key).and_then(Value::as_str)
}

/// Like [`string`], but blank strings count as absent
pub(crate) fn non_blank<'a>(node: &'a Object, key: &str) -> Option<&'a str> {
    string(node, key).filter(|s| !s.trim().is_empty())
}

pub(crate) fn flag(node: &Object, key: &str) -> Option<bool> {
    node.get(key).and_then(Value::as_bool)
}

/// Walk a chain of nested objects
pub(crate) fn object_path<'a>(root: &'a Object, keys: &[&str]) -> Option<&'a Object> {
    keys.iter().try_fold(root, |current, key| object(current, key))
}

/// String elements of an array; non-string, non-null elements are rendered as JSON
pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .collect()
}

pub(crate) fn string_array(values: &[String]) -> Value {
    Value::Array(values.iter().cloned().map(Value::String).collect())
}
