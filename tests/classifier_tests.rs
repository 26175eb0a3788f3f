//! Classifier Tests
//!
//! Runs the full rule table over fixture schemas and checks the record each
//! property ends up with.

use std::collections::BTreeMap;

use registry_snapshot::graph::{EnumCatalog, EnumDescriptor, EnumStyle};
use registry_snapshot::schema::annotate;
use registry_snapshot::{Classifier, PropertyIndex, PropertyKey, SchemaDocuments, SemanticKind, SemanticRecord};
use serde_json::{json, Value};

fn fixture_schemas() -> SchemaDocuments {
    let mut schemas = SchemaDocuments::new();
    schemas.insert(
        "common.json".to_string(),
        serde_json::from_str(include_str!("fixtures/common.json")).unwrap(),
    );
    schemas.insert(
        "Item.json".to_string(),
        serde_json::from_str(include_str!("fixtures/Item.json")).unwrap(),
    );
    schemas
}

fn classify(schemas: &SchemaDocuments, enums: &EnumCatalog) -> BTreeMap<PropertyKey, SemanticRecord> {
    let properties = PropertyIndex::build(schemas);
    Classifier::new(schemas, &properties, enums).classify_all()
}

fn record<'a>(semantics: &'a BTreeMap<PropertyKey, SemanticRecord>, key: &str) -> &'a SemanticRecord {
    let key: PropertyKey = key.parse().unwrap();
    semantics
        .get(&key)
        .unwrap_or_else(|| panic!("no record for {}", key))
}

fn source(record: &SemanticRecord) -> &Value {
    record.get("source").expect("record has a source")
}

// =============================================================================
// Fixed-location rules
// =============================================================================

#[test]
fn test_hidden_registry_beats_literal_enum() {
    let semantics = classify(&fixture_schemas(), &EnumCatalog::default());
    let solid = record(&semantics, "common.json#/definitions/MaterialAsset/properties/Solid");

    assert_eq!(solid.kind, SemanticKind::SymbolReference);
    assert_eq!(source(solid), &json!({ "kind": "registryDomain", "domain": "BlockType" }));
    assert!(solid.get("values").is_none());
}

#[test]
fn test_import_family_symbols() {
    let semantics = classify(&fixture_schemas(), &EnumCatalog::default());

    let export = record(&semantics, "common.json#/definitions/DensityAsset/properties/ExportAs");
    assert_eq!(export.kind, SemanticKind::SymbolDefinition);
    assert_eq!(
        export.get("namespace"),
        Some(&json!({ "kind": "importFamily", "family": "Density" }))
    );

    let import = record(&semantics, "common.json#/definitions/ImportedDensityAsset/properties/Name");
    assert_eq!(import.kind, SemanticKind::SymbolReference);
    assert_eq!(
        source(import),
        &json!({ "kind": "importFamily", "family": "Density", "importForm": "typeImportedName" })
    );
}

#[test]
fn test_bundle_definition_and_consumer() {
    let semantics = classify(&fixture_schemas(), &EnumCatalog::default());

    let definition = record(&semantics, "common.json#/definitions/DecimalConstantEntry/properties/Name");
    assert_eq!(definition.kind, SemanticKind::SymbolDefinition);
    assert_eq!(definition.get("valueField"), Some(&json!("Value")));

    let consumer = record(
        &semantics,
        "common.json#/definitions/BaseHeightDensityAsset/properties/BaseHeightName",
    );
    assert_eq!(
        source(consumer),
        &json!({ "kind": "referenceBundle", "bundleType": "DecimalConstants" })
    );
}

#[test]
fn test_discriminator() {
    let semantics = classify(&fixture_schemas(), &EnumCatalog::default());
    let discriminator = record(&semantics, "common.json#/definitions/DensityAsset/properties/Type");

    assert_eq!(discriminator.kind, SemanticKind::LiteralChoice);
    assert_eq!(discriminator.get("role"), Some(&json!("discriminator")));
    assert_eq!(discriminator.get("values"), Some(&json!(["Constant", "Sum"])));
    assert_eq!(discriminator.get("defaultValue"), Some(&json!("Constant")));
}

// =============================================================================
// Hint-driven rules
// =============================================================================

#[test]
fn test_hint_driven_properties() {
    let semantics = classify(&fixture_schemas(), &EnumCatalog::default());

    let quality = record(&semantics, "Item.json#/properties/Quality");
    assert_eq!(source(quality), &json!({ "kind": "registryDomain", "domain": "ItemQuality" }));

    let icon = record(&semantics, "Item.json#/properties/Icon");
    assert_eq!(icon.kind, SemanticKind::AssetPath);
    assert_eq!(icon.get("requiredExtension"), Some(&json!("png")));
    assert_eq!(icon.get("isUIAsset"), Some(&json!(true)));

    let translation = record(&semantics, "Item.json#/properties/TranslationKey");
    assert_eq!(source(translation)["kind"], "localization");

    let category = record(&semantics, "Item.json#/properties/Category");
    assert_eq!(
        source(category),
        &json!({ "kind": "uiDataSet", "dataSet": "ItemCategories", "component": "Dropdown" })
    );

    let tint = record(&semantics, "Item.json#/properties/Tint");
    assert_eq!(tint.kind, SemanticKind::Color);
    assert_eq!(tint.get("supportsAlpha"), Some(&json!(true)));

    let stats = record(&semantics, "Item.json#/properties/Stats");
    assert_eq!(stats.value_shape.as_str(), "objectKey");
    assert_eq!(stats.get("excludeExistingObjectKeys"), Some(&json!(true)));

    assert!(!semantics.contains_key(&"Item.json#/properties/Notes".parse::<PropertyKey>().unwrap()));
}

#[test]
fn test_enum_without_descriptor_keeps_literals() {
    let semantics = classify(&fixture_schemas(), &EnumCatalog::default());
    let mode = record(&semantics, "Item.json#/properties/Mode");

    assert_eq!(mode.kind, SemanticKind::LiteralChoice);
    assert_eq!(mode.get("values"), Some(&json!(["a", "b"])));
    assert_eq!(mode.get("acceptedValues"), Some(&json!(["a", "b"])));
    assert!(mode.get("normalizeToCanonical").is_none());
}

#[test]
fn test_enum_canonicalization() {
    let strings = |values: &[&str]| values.iter().map(|v| v.to_string()).collect::<Vec<_>>();
    let descriptor = EnumDescriptor {
        enum_type: "com.example.Mode".to_string(),
        enum_simple_name: "Mode".to_string(),
        style: EnumStyle::Legacy,
        constant_names: strings(&["a", "b"]),
        serialized_values: strings(&["a", "b"]),
        canonical_values: strings(&["A", "B"]),
        accepted_values: strings(&["a", "b", "A", "B"]),
        decode_case_insensitive: true,
    };
    let enums = EnumCatalog::from_descriptors([descriptor]);

    let semantics = classify(&fixture_schemas(), &enums);
    let mode = record(&semantics, "Item.json#/properties/Mode");

    assert_eq!(mode.kind, SemanticKind::LiteralChoice);
    assert_eq!(mode.get("values"), Some(&json!(["A", "B"])));
    assert_eq!(mode.get("acceptedValues"), Some(&json!(["a", "b", "A", "B"])));
    assert_eq!(mode.get("normalizeToCanonical"), Some(&json!(true)));
}

// =============================================================================
// Annotation
// =============================================================================

#[test]
fn test_annotations_land_on_property_nodes() {
    let schemas = fixture_schemas();
    let semantics = classify(&schemas, &EnumCatalog::default());
    let annotated = annotate(&schemas, &semantics);

    let solid = &annotated["common.json"]["definitions"]["MaterialAsset"]["properties"]["Solid"];
    assert_eq!(solid["hytaleDevtools"]["semanticKind"], "symbolReference");
    assert_eq!(solid["hytaleDevtools"]["valueShape"], "string");

    let notes = &annotated["Item.json"]["properties"]["Notes"];
    assert!(notes.get("hytaleDevtools").is_none());
}

#[test]
fn test_classification_is_deterministic() {
    let schemas = fixture_schemas();
    let first = classify(&schemas, &EnumCatalog::default());
    let second = classify(&schemas, &EnumCatalog::default());
    assert_eq!(first, second);
}
