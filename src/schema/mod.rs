//! Schema documents and property addressing
//!
//! Schema documents are plain `serde_json::Value` trees keyed by schema file
//! name. Properties inside them are addressed by [`PropertyKey`]: the schema
//! file plus a JSON Pointer to the property node.

pub mod annotate;
pub mod index;
pub(crate) mod json;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::pointer;

pub use annotate::{annotate, ANNOTATION_KEY};
pub use index::PropertyIndex;

/// All schema documents of one export, keyed by schema file name
pub type SchemaDocuments = BTreeMap<String, serde_json::Value>;

/// Identity of a property node: schema file + JSON Pointer
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyKey {
    /// Schema file the property lives in (e.g. "common.json")
    pub schema_file: String,
    /// Escaped JSON Pointer from the document root to the property node
    pub pointer: String,
}

impl PropertyKey {
    pub fn new(schema_file: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self {
            schema_file: schema_file.into(),
            pointer: pointer.into(),
        }
    }

    /// Key of the property `name` declared under `properties` of the node at `parent`
    pub fn child_property(schema_file: &str, parent: &str, name: &str) -> Self {
        let properties = pointer::append(parent, "properties");
        Self::new(schema_file, pointer::append(&properties, name))
    }

    /// Unescaped name of the property (last pointer segment)
    pub fn property_name(&self) -> String {
        let last = self.pointer.rsplit('/').next().unwrap_or_default();
        pointer::unescape(last)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.schema_file, self.pointer)
    }
}

/// Error returned when a `file#pointer` string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePropertyKeyError(String);

impl fmt::Display for ParsePropertyKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a property key: {}", self.0)
    }
}

impl std::error::Error for ParsePropertyKeyError {}

impl FromStr for PropertyKey {
    type Err = ParsePropertyKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('#') {
            Some((file, pointer)) if !file.is_empty() && pointer.starts_with('/') => {
                Ok(Self::new(file, pointer))
            }
            _ => Err(ParsePropertyKeyError(s.to_string())),
        }
    }
}
