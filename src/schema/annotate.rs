//! Mirrors semantic records back into the schema documents.
//!
//! This is a pure transform: the input documents are left untouched and an
//! annotated copy is returned.

use std::collections::BTreeMap;

use serde_json::Value;

use super::{PropertyKey, SchemaDocuments};
use crate::classify::SemanticRecord;
use crate::pointer;

/// Key under which a property node carries its semantic record
pub const ANNOTATION_KEY: &str = "hytaleDevtools";

/// Return a copy of `schemas` with every record written into its property node
pub fn annotate(
    schemas: &SchemaDocuments,
    semantics: &BTreeMap<PropertyKey, SemanticRecord>,
) -> SchemaDocuments {
    let mut annotated = schemas.clone();
    for (key, record) in semantics {
        let Some(document) = annotated.get_mut(&key.schema_file) else {
            continue;
        };
        let Some(Value::Object(node)) = pointer::resolve_mut(document, &key.pointer) else {
            continue;
        };
        node.insert(ANNOTATION_KEY.to_string(), record.to_value());
    }
    annotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{SemanticKind, ValueShape};
    use serde_json::json;

    #[test]
    fn test_annotate_is_pure() {
        let mut schemas = SchemaDocuments::new();
        schemas.insert(
            "A.json".to_string(),
            json!({ "properties": { "Color": { "type": "string" } } }),
        );

        let mut record = SemanticRecord::new(SemanticKind::Color, ValueShape::String);
        record.insert("colorMode", json!("color"));
        let mut semantics = BTreeMap::new();
        semantics.insert(PropertyKey::new("A.json", "/properties/Color"), record);
        semantics.insert(
            PropertyKey::new("Missing.json", "/properties/X"),
            SemanticRecord::new(SemanticKind::Color, ValueShape::String),
        );

        let annotated = annotate(&schemas, &semantics);

        assert!(schemas["A.json"]["properties"]["Color"].get(ANNOTATION_KEY).is_none());
        assert_eq!(
            annotated["A.json"]["properties"]["Color"][ANNOTATION_KEY],
            json!({ "semanticKind": "color", "valueShape": "string", "colorMode": "color" })
        );
        assert_eq!(annotated.len(), 1);
    }
}
