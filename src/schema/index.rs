//! Schema Property Indexing
//!
//! Flattens every schema document into a map of property nodes keyed by
//! [`PropertyKey`]. A property is any object node directly under a
//! `properties` object, at any depth: nested definitions can appear under
//! arbitrary keys, so every child key and array element is visited.

use std::collections::BTreeMap;

use serde_json::Value;

use super::json::Object;
use super::{PropertyKey, SchemaDocuments};
use crate::pointer;

/// Flat index of property nodes borrowed from the schema documents
#[derive(Debug, Default)]
pub struct PropertyIndex<'a> {
    nodes: BTreeMap<PropertyKey, &'a Object>,
}

impl<'a> PropertyIndex<'a> {
    /// Index every property node of every schema
    pub fn build(schemas: &'a SchemaDocuments) -> Self {
        let mut nodes = BTreeMap::new();
        for (schema_file, document) in schemas {
            index_recursive(schema_file, "", document, &mut nodes);
        }
        Self { nodes }
    }

    pub fn get(&self, key: &PropertyKey) -> Option<&'a Object> {
        self.nodes.get(key).copied()
    }

    pub fn contains(&self, key: &PropertyKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Properties in key order
    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &'a Object)> + '_ {
        self.nodes.iter().map(|(key, node)| (key, *node))
    }

    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> + '_ {
        self.nodes.keys()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn sorted_keys(object: &Object) -> Vec<&String> {
    let mut keys: Vec<&String> = object.keys().collect();
    keys.sort();
    keys
}

fn index_recursive<'a>(
    schema_file: &str,
    pointer: &str,
    value: &'a Value,
    nodes: &mut BTreeMap<PropertyKey, &'a Object>,
) {
    match value {
        Value::Object(object) => {
            if let Some(properties) = object.get("properties").and_then(Value::as_object) {
                for name in sorted_keys(properties) {
                    if let Some(property) = properties[name.as_str()].as_object() {
                        nodes.insert(
                            PropertyKey::child_property(schema_file, pointer, name),
                            property,
                        );
                    }
                }
            }

            for key in sorted_keys(object) {
                let child_pointer = pointer::append(pointer, key);
                index_recursive(schema_file, &child_pointer, &object[key.as_str()], nodes);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let child_pointer = pointer::append(pointer, &i.to_string());
                index_recursive(schema_file, &child_pointer, item, nodes);
            }
        }
        _ => {}
    }
}
