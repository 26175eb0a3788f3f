//! Semantic Classification
//!
//! Maps each indexed schema property to at most one [`SemanticRecord`]. Rules
//! live in an explicit ordered table ([`rules::RULES`]); the first rule that
//! matches a property decides its record, and a property no rule matches gets
//! none.
//!
//! The rule order is:
//! 1. symbol definitions (import family exports)
//! 2. symbol imports
//! 3. shared-constant bundle consumers and the bundle's definition property
//! 4. hidden registry references
//! 5. discriminators declared by `hytaleSchemaTypeField`
//! 6. generic shape-driven hints

pub mod hints;
pub mod rules;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::graph::EnumCatalog;
use crate::pointer;
use crate::schema::json::{self, Object};
use crate::schema::{PropertyIndex, PropertyKey, SchemaDocuments};

use hints::TypeField;
use rules::{Rule, RULES};

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SemanticKind {
    SymbolDefinition,
    SymbolReference,
    LiteralChoice,
    AssetPath,
    InlineOrReference,
    Color,
}

impl SemanticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SemanticKind::SymbolDefinition => "symbolDefinition",
            SemanticKind::SymbolReference => "symbolReference",
            SemanticKind::LiteralChoice => "literalChoice",
            SemanticKind::AssetPath => "assetPath",
            SemanticKind::InlineOrReference => "inlineOrReference",
            SemanticKind::Color => "color",
        }
    }
}

impl fmt::Display for SemanticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueShape {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
    StringOrObject,
    ObjectKey,
}

impl ValueShape {
    /// Shape of a JSON Schema primitive type name
    pub fn from_json_type(json_type: &str) -> Option<Self> {
        match json_type {
            "string" => Some(ValueShape::String),
            "number" => Some(ValueShape::Number),
            "integer" => Some(ValueShape::Integer),
            "boolean" => Some(ValueShape::Boolean),
            "object" => Some(ValueShape::Object),
            "array" => Some(ValueShape::Array),
            "null" => Some(ValueShape::Null),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueShape::String => "string",
            ValueShape::Number => "number",
            ValueShape::Integer => "integer",
            ValueShape::Boolean => "boolean",
            ValueShape::Object => "object",
            ValueShape::Array => "array",
            ValueShape::Null => "null",
            ValueShape::StringOrObject => "stringOrObject",
            ValueShape::ObjectKey => "objectKey",
        }
    }
}

/// Inferred semantics of one schema property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticRecord {
    #[serde(rename = "semanticKind")]
    pub kind: SemanticKind,
    #[serde(rename = "valueShape")]
    pub value_shape: ValueShape,
    /// Kind-specific detail
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SemanticRecord {
    pub fn new(kind: SemanticKind, value_shape: ValueShape) -> Self {
        Self {
            kind,
            value_shape,
            extra: Map::new(),
        }
    }

    pub fn insert(&mut self, key: &str, value: Value) -> &mut Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// The annotation object written into the schema
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("semanticKind".into(), Value::String(self.kind.as_str().into()));
        object.insert("valueShape".into(), Value::String(self.value_shape.as_str().into()));
        for (key, value) in &self.extra {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }
}

// ============================================================================
// Classifier
// ============================================================================

/// Type of the shared-constant bundle
pub const BUNDLE_TYPE: &str = "DecimalConstants";

/// One property under classification
pub struct Property<'p> {
    pub key: &'p PropertyKey,
    /// `file#pointer` form of the key, as matched by the pattern rules
    pub rendered: String,
    pub node: &'p Object,
}

/// Ordered rule engine over an indexed schema set
pub struct Classifier<'a> {
    index: &'a PropertyIndex<'a>,
    enums: &'a EnumCatalog,
    discriminators: BTreeMap<PropertyKey, TypeField>,
    bundle_definitions: BTreeSet<PropertyKey>,
    export_as: Regex,
    imported_name: Regex,
}

impl<'a> Classifier<'a> {
    pub fn new(
        schemas: &'a SchemaDocuments,
        index: &'a PropertyIndex<'a>,
        enums: &'a EnumCatalog,
    ) -> Self {
        let mut discriminators = BTreeMap::new();
        for (schema_file, document) in schemas {
            collect_discriminators(schema_file, "", document, &mut discriminators);
        }

        Self {
            index,
            enums,
            discriminators,
            bundle_definitions: bundle_definition_keys(schemas).into_iter().collect(),
            export_as: Regex::new(r"^common\.json#/definitions/(.+)Asset/properties/ExportAs$")
                .expect("export pattern is valid"),
            imported_name: Regex::new(r"^common\.json#/definitions/Imported(.+)Asset/properties/Name$")
                .expect("import pattern is valid"),
        }
    }

    pub fn enums(&self) -> &EnumCatalog {
        self.enums
    }

    pub(crate) fn export_as_pattern(&self) -> &Regex {
        &self.export_as
    }

    pub(crate) fn imported_name_pattern(&self) -> &Regex {
        &self.imported_name
    }

    pub(crate) fn discriminator(&self, key: &PropertyKey) -> Option<&TypeField> {
        self.discriminators.get(key)
    }

    pub(crate) fn is_bundle_definition(&self, key: &PropertyKey) -> bool {
        self.bundle_definitions.contains(key)
    }

    /// Classify a single property; the first matching rule wins
    pub fn classify(&self, key: &PropertyKey, node: &Object) -> Option<SemanticRecord> {
        let property = Property {
            key,
            rendered: key.to_string(),
            node,
        };
        RULES.iter().find_map(|rule: &Rule| {
            let record = (rule.apply)(self, &property)?;
            trace!("{} classified by {}", property.rendered, rule.name);
            Some(record)
        })
    }

    /// Classify every indexed property
    pub fn classify_all(&self) -> BTreeMap<PropertyKey, SemanticRecord> {
        let semantics: BTreeMap<PropertyKey, SemanticRecord> = self
            .index
            .iter()
            .filter_map(|(key, node)| Some((key.clone(), self.classify(key, node)?)))
            .collect();
        debug!(
            "Classified {} of {} properties",
            semantics.len(),
            self.index.len()
        );
        semantics
    }
}

/// Find every `hytaleSchemaTypeField` hint and key it by the property it names
fn collect_discriminators(
    schema_file: &str,
    pointer: &str,
    value: &Value,
    out: &mut BTreeMap<PropertyKey, TypeField>,
) {
    match value {
        Value::Object(object) => {
            if let Some(type_field) = hints::type_field(object) {
                let key = PropertyKey::child_property(schema_file, pointer, &type_field.property);
                out.entry(key).or_insert(type_field);
            }
            let mut keys: Vec<&String> = object.keys().collect();
            keys.sort();
            for key in keys {
                collect_discriminators(schema_file, &pointer::append(pointer, key), &object[key.as_str()], out);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_discriminators(schema_file, &pointer::append(pointer, &i.to_string()), item, out);
            }
        }
        _ => {}
    }
}

/// Name property of the bundle entry definition, found through the entries' `$ref`
fn bundle_definition_keys(schemas: &SchemaDocuments) -> Option<PropertyKey> {
    let common = schemas.get("common.json")?.as_object()?;
    let items = json::object_path(
        common,
        &["definitions", "DecimalConstantsFrameworkAsset", "properties", "Entries", "items"],
    )?;
    let reference = json::non_blank(items, "$ref")?;

    let (file, pointer) = reference.split_once('#').unwrap_or((reference, ""));
    let file = if file.trim().is_empty() { "common.json" } else { file };
    if !pointer.starts_with('/') {
        return None;
    }
    Some(PropertyKey::new(file, format!("{pointer}/properties/Name")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_serialization() {
        let mut record = SemanticRecord::new(SemanticKind::InlineOrReference, ValueShape::StringOrObject);
        record.insert("acceptsAssetKey", json!(true));
        assert_eq!(
            record.to_value(),
            json!({ "semanticKind": "inlineOrReference", "valueShape": "stringOrObject", "acceptsAssetKey": true })
        );
        assert_eq!(serde_json::to_value(&record).unwrap(), record.to_value());

        let parsed: SemanticRecord = serde_json::from_value(record.to_value()).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_bundle_definition_from_ref() {
        let mut schemas = SchemaDocuments::new();
        schemas.insert(
            "common.json".into(),
            json!({ "definitions": { "DecimalConstantsFrameworkAsset": { "properties": {
                "Entries": { "items": { "$ref": "#/definitions/DecimalConstantEntry" } }
            } } } }),
        );
        assert_eq!(
            bundle_definition_keys(&schemas),
            Some(PropertyKey::new("common.json", "/definitions/DecimalConstantEntry/properties/Name"))
        );

        schemas.insert(
            "common.json".into(),
            json!({ "definitions": { "DecimalConstantsFrameworkAsset": { "properties": {
                "Entries": { "items": { "$ref": "Other.json#definitions/X" } }
            } } } }),
        );
        assert_eq!(bundle_definition_keys(&schemas), None);
    }

    #[test]
    fn test_discriminators_keyed_by_sibling_property() {
        let mut found = BTreeMap::new();
        let doc = json!({ "definitions": { "Shape": {
            "hytaleSchemaTypeField": { "property": "Type", "values": ["Box", "Sphere"], "defaultValue": "Box" },
            "properties": { "Type": { "type": "string" } }
        } } });
        collect_discriminators("Shapes.json", "", &doc, &mut found);

        let key = PropertyKey::new("Shapes.json", "/definitions/Shape/properties/Type");
        let field = &found[&key];
        assert_eq!(field.values, vec!["Box", "Sphere"]);
        assert_eq!(field.default_value.as_deref(), Some("Box"));
    }
}
