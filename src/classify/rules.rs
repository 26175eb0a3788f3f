//! Classification rule table.
//!
//! [`RULES`] is evaluated top to bottom for each property and stops at the
//! first rule that returns a record. Fixed-location rules come first so they
//! take precedence over the generic hint-driven ones.

use serde_json::{json, Value};

use super::hints;
use super::{Classifier, Property, SemanticKind, SemanticRecord, ValueShape, BUNDLE_TYPE};
use crate::schema::json::string_array;

/// A named matcher; returns a record when the rule applies
pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&Classifier<'_>, &Property<'_>) -> Option<SemanticRecord>,
}

pub const RULES: &[Rule] = &[
    Rule { name: "symbolDefinition", apply: symbol_definition },
    Rule { name: "symbolImport", apply: symbol_import },
    Rule { name: "bundleConsumer", apply: bundle_consumer },
    Rule { name: "bundleDefinition", apply: bundle_definition },
    Rule { name: "hiddenRegistry", apply: hidden_registry },
    Rule { name: "discriminator", apply: discriminator },
    Rule { name: "inlineOrReference", apply: inline_or_reference },
    Rule { name: "enumMapKeys", apply: enum_map_keys },
    Rule { name: "mapKeyDomain", apply: map_key_domain },
    Rule { name: "registryReference", apply: registry_reference },
    Rule { name: "literalEnum", apply: literal_enum },
    Rule { name: "commonAsset", apply: common_asset },
    Rule { name: "localizationKey", apply: localization_key },
    Rule { name: "cosmeticDomain", apply: cosmetic_domain },
    Rule { name: "parentDomain", apply: parent_domain },
    Rule { name: "uiDataSet", apply: ui_data_set },
    Rule { name: "color", apply: color },
];

// ============================================================================
// Fixed tables
// ============================================================================

/// Properties that reference the shared-constant bundle by entry name
pub const BUNDLE_CONSUMERS: &[&str] = &[
    "common.json#/definitions/BaseHeightDensityAsset/properties/BaseHeightName",
    "common.json#/definitions/SimpleHorizontalMaterialProviderAsset/properties/TopBaseHeight",
    "common.json#/definitions/SimpleHorizontalMaterialProviderAsset/properties/BottomBaseHeight",
    "common.json#/definitions/BaseHeightPositionProviderAsset/properties/BedName",
    "common.json#/definitions/ColumnLinearScannerAsset/properties/BaseHeightName",
    "common.json#/definitions/ColumnRandomScannerAsset/properties/BaseHeightName",
];

/// Asset references the generated schemas do not mark with `hytaleAssetRef`
pub const HIDDEN_REGISTRY: &[(&str, &str)] = &[
    ("common.json#/definitions/MaterialAsset/properties/Solid", "BlockType"),
    ("common.json#/definitions/MaterialAsset/properties/Fluid", "Fluid"),
    ("common.json#/definitions/ConstantEnvironmentProviderAsset/properties/Environment", "Environment"),
    ("common.json#/definitions/ConnectedBlockPatternRule/properties/BlockTypes", "BlockType"),
    ("common.json#/definitions/ConnectedBlockPatternRule/properties/BlockTypeLists", "BlockTypeListAsset"),
    ("common.json#/definitions/DurabilityLossBlockTypes/properties/BlockTypes", "BlockType"),
    ("common.json#/definitions/DurabilityLossBlockTypes/properties/BlockSets", "BlockSet"),
    ("common.json#/definitions/DefaultFluidTicker/properties/SupportedBy", "Fluid"),
    ("common.json#/definitions/FireFluidTicker/properties/SupportedBy", "Fluid"),
    ("common.json#/definitions/FiniteFluidTicker/properties/SupportedBy", "Fluid"),
    ("common.json#/definitions/FluidCollisionConfig/properties/BlockToPlace", "BlockType"),
    ("common.json#/definitions/FlammabilityConfig/properties/ResultingBlock", "BlockType"),
];

const BLOCK_MASK_EXPORT: &str = "BlockMaskAsset.json#/properties/ExportAs";
const BLOCK_MASK_IMPORT: &str = "BlockMaskAsset.json#/properties/Import";

// ============================================================================
// Record builders
// ============================================================================

fn record(kind: SemanticKind, property: &Property<'_>, fallback: ValueShape) -> SemanticRecord {
    SemanticRecord::new(kind, hints::value_shape(property.node, fallback))
}

/// `symbolReference` on the property value, drawn from `source`
fn value_reference(property: &Property<'_>, source: Value) -> SemanticRecord {
    let mut semantic = record(SemanticKind::SymbolReference, property, ValueShape::String);
    semantic.insert("target", json!("value"));
    semantic.insert("source", source);
    semantic
}

/// `symbolReference` on the keys of an object, drawn from `source`
fn object_key_reference(source: Value) -> SemanticRecord {
    let mut semantic = SemanticRecord::new(SemanticKind::SymbolReference, ValueShape::ObjectKey);
    semantic.insert("target", json!("objectKey"));
    semantic.insert("source", source);
    semantic.insert("excludeExistingObjectKeys", json!(true));
    semantic
}

fn registry_source(domain: &str) -> Value {
    json!({ "kind": "registryDomain", "domain": domain })
}

// ============================================================================
// 1-5: fixed locations
// ============================================================================

fn symbol_definition(classifier: &Classifier<'_>, property: &Property<'_>) -> Option<SemanticRecord> {
    let family = if property.rendered == BLOCK_MASK_EXPORT {
        "BlockMask".to_string()
    } else {
        let captures = classifier.export_as_pattern().captures(&property.rendered)?;
        captures.get(1)?.as_str().to_string()
    };
    if family.trim().is_empty() {
        return None;
    }

    let mut semantic = record(SemanticKind::SymbolDefinition, property, ValueShape::String);
    semantic.insert("namespace", json!({ "kind": "importFamily", "family": family }));
    Some(semantic)
}

fn symbol_import(classifier: &Classifier<'_>, property: &Property<'_>) -> Option<SemanticRecord> {
    let (family, form) = if property.rendered == BLOCK_MASK_IMPORT {
        ("BlockMask".to_string(), "directImportField")
    } else {
        let captures = classifier.imported_name_pattern().captures(&property.rendered)?;
        (captures.get(1)?.as_str().to_string(), "typeImportedName")
    };

    Some(value_reference(
        property,
        json!({ "kind": "importFamily", "family": family, "importForm": form }),
    ))
}

fn bundle_consumer(_: &Classifier<'_>, property: &Property<'_>) -> Option<SemanticRecord> {
    if !BUNDLE_CONSUMERS.contains(&property.rendered.as_str()) {
        return None;
    }
    Some(value_reference(
        property,
        json!({ "kind": "referenceBundle", "bundleType": BUNDLE_TYPE }),
    ))
}

fn bundle_definition(classifier: &Classifier<'_>, property: &Property<'_>) -> Option<SemanticRecord> {
    if !classifier.is_bundle_definition(property.key) {
        return None;
    }
    let mut semantic = record(SemanticKind::SymbolDefinition, property, ValueShape::String);
    semantic.insert(
        "namespace",
        json!({ "kind": "referenceBundle", "bundleType": BUNDLE_TYPE }),
    );
    semantic.insert("valueField", json!("Value"));
    Some(semantic)
}

fn hidden_registry(_: &Classifier<'_>, property: &Property<'_>) -> Option<SemanticRecord> {
    let (_, domain) = HIDDEN_REGISTRY
        .iter()
        .find(|(key, _)| *key == property.rendered)?;
    Some(value_reference(property, registry_source(domain)))
}

fn discriminator(classifier: &Classifier<'_>, property: &Property<'_>) -> Option<SemanticRecord> {
    let type_field = classifier.discriminator(property.key)?;
    let mut semantic = record(SemanticKind::LiteralChoice, property, ValueShape::String);
    semantic.insert("values", string_array(&type_field.values));
    semantic.insert("role", json!("discriminator"));
    if let Some(default_value) = &type_field.default_value {
        semantic.insert("defaultValue", json!(default_value));
    }
    if let Some(parent_key) = &type_field.parent_property_key {
        semantic.insert("parentPropertyKey", json!(parent_key));
    }
    Some(semantic)
}

// ============================================================================
// 6: shape-driven hints
// ============================================================================

fn inline_or_reference(_: &Classifier<'_>, property: &Property<'_>) -> Option<SemanticRecord> {
    let asset_type = hints::contained_asset_type(property.node)?;
    let mut semantic = SemanticRecord::new(SemanticKind::InlineOrReference, ValueShape::StringOrObject);
    semantic.insert("referenceSource", registry_source(asset_type));
    semantic.insert("acceptsInlineValue", json!(true));
    semantic.insert("acceptsAssetKey", json!(true));
    Some(semantic)
}

fn enum_map_keys(_: &Classifier<'_>, property: &Property<'_>) -> Option<SemanticRecord> {
    let keys = hints::enum_map_keys(property.node);
    if keys.is_empty() {
        return None;
    }
    Some(object_key_reference(
        json!({ "kind": "literalSet", "allowedValues": string_array(&keys) }),
    ))
}

fn map_key_domain(_: &Classifier<'_>, property: &Property<'_>) -> Option<SemanticRecord> {
    let domain = hints::map_key_domain(property.node)?;
    Some(object_key_reference(registry_source(domain)))
}

fn registry_reference(_: &Classifier<'_>, property: &Property<'_>) -> Option<SemanticRecord> {
    let domain = hints::registry_domain(property.node)?;
    Some(value_reference(property, registry_source(domain)))
}

fn literal_enum(classifier: &Classifier<'_>, property: &Property<'_>) -> Option<SemanticRecord> {
    let literals = hints::enum_values(property.node);
    if literals.is_empty() {
        return None;
    }

    let descriptor = classifier.enums().lookup(&literals);
    let (canonical, accepted) = match descriptor {
        Some(d) => (&d.canonical_values, &d.accepted_values),
        None => (&literals, &literals),
    };

    let mut semantic = record(SemanticKind::LiteralChoice, property, ValueShape::String);
    semantic.insert("values", string_array(canonical));
    semantic.insert("acceptedValues", string_array(accepted));
    semantic.insert("role", json!("enum"));
    if descriptor.is_some() {
        semantic.insert("normalizeToCanonical", json!(accepted != canonical));
    }
    Some(semantic)
}

fn common_asset(_: &Classifier<'_>, property: &Property<'_>) -> Option<SemanticRecord> {
    let hint = hints::common_asset(property.node)?;
    let mut semantic = record(SemanticKind::AssetPath, property, ValueShape::String);
    semantic.insert("requiredRoots", string_array(&hint.required_roots));
    if let Some(extension) = hint.required_extension {
        semantic.insert("requiredExtension", json!(extension));
    }
    if let Some(is_ui_asset) = hint.is_ui_asset {
        semantic.insert("isUIAsset", json!(is_ui_asset));
    }
    Some(semantic)
}

fn localization_key(_: &Classifier<'_>, property: &Property<'_>) -> Option<SemanticRecord> {
    if !hints::is_localization_key(property.node) {
        return None;
    }
    Some(value_reference(
        property,
        json!({ "kind": "localization", "localeStrategy": "activeThenEnUs" }),
    ))
}

fn cosmetic_domain(_: &Classifier<'_>, property: &Property<'_>) -> Option<SemanticRecord> {
    let domain = hints::cosmetic_domain(property.node)?;
    Some(value_reference(
        property,
        json!({ "kind": "cosmeticDomain", "domain": domain }),
    ))
}

fn parent_domain(_: &Classifier<'_>, property: &Property<'_>) -> Option<SemanticRecord> {
    let parent = hints::parent_domain(property.node)?;
    let mut source = json!({ "kind": "parentDomain", "domain": parent.domain });
    if let Some(map_key) = parent.map_key {
        source["mapKey"] = json!(map_key);
    }
    if let Some(map_key_value) = parent.map_key_value {
        source["mapKeyValue"] = json!(map_key_value);
    }
    source["excludeSelf"] = json!(true);
    Some(value_reference(property, source))
}

fn ui_data_set(_: &Classifier<'_>, property: &Property<'_>) -> Option<SemanticRecord> {
    let hint = hints::ui_data_set(property.node)?;
    Some(value_reference(
        property,
        json!({ "kind": "uiDataSet", "dataSet": hint.data_set, "component": hint.component }),
    ))
}

fn color(_: &Classifier<'_>, property: &Property<'_>) -> Option<SemanticRecord> {
    let mode = hints::color_mode(property.node)?;
    let mut semantic = record(SemanticKind::Color, property, ValueShape::String);
    semantic.insert("colorMode", json!(mode));
    semantic.insert("supportsAlpha", json!(mode == "colorAlpha"));
    Some(semantic)
}
