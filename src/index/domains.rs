//! Value domains read straight from the live registry: registered asset
//! keys, the shared-constant bundle, cosmetic domains and editor data sets.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::classify::hints;
use crate::graph::{field, items, text, NodeHandle};
use crate::registry::{KeyKind, RegistrySnapshot};
use crate::schema::{PropertyIndex, SchemaDocuments};

use super::{RecordGroups, ValueRecord};

/// Store holding world structure assets
pub const WORLD_STRUCTURE_TYPE: &str = "WorldStructureAsset";

// ============================================================================
// Registry-style lookup
// ============================================================================

/// Letters and digits only, lowercased
pub fn normalize_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalized names a store answers to: type name, family and its plurals
fn store_aliases(type_name: &str) -> Vec<String> {
    let family = type_name.strip_suffix("Asset").unwrap_or(type_name);
    let mut aliases = vec![type_name.to_string(), family.to_string(), format!("{family}s")];
    if family.len() > 1 {
        if let Some(stem) = family.strip_suffix('y') {
            aliases.push(format!("{stem}ies"));
        }
    }
    aliases.iter().map(|alias| normalize_token(alias)).collect()
}

/// Keys of every string-keyed store whose name matches the domain
pub fn registry_style_values(registry: &RegistrySnapshot, domain: &str) -> Vec<ValueRecord> {
    let wanted = normalize_token(domain);
    if wanted.is_empty() {
        return Vec::new();
    }

    registry
        .stores()
        .iter()
        .filter(|store| store.key_kind() == KeyKind::String)
        .filter(|store| store_aliases(store.type_name()).contains(&wanted))
        .flat_map(|store| store.entries())
        .map(|entry| ValueRecord::new(entry.key.clone(), entry.source_display()))
        .collect()
}

// ============================================================================
// Registered assets and the constant bundle
// ============================================================================

/// Every asset key, grouped by the store's type simple name
pub fn registered_assets(registry: &RegistrySnapshot) -> RecordGroups {
    let mut groups = RecordGroups::new();
    for store in registry.stores() {
        if store.is_empty() {
            continue;
        }
        let records = groups.entry(store.type_name().to_string()).or_default();
        records.extend(
            store
                .entries()
                .iter()
                .map(|entry| ValueRecord::new(entry.key.clone(), entry.source_display())),
        );
    }
    groups
}

fn type_contains(node: &NodeHandle, fragment: &str) -> bool {
    node.type_info()
        .is_some_and(|type_info| type_info.simple_name().contains(fragment))
}

fn named(node: &NodeHandle) -> Option<String> {
    field(node.as_ref(), "name")
        .and_then(|name| text(name.as_ref()))
        .filter(|name| !name.is_empty())
}

/// Shared decimal constants declared by every world structure
pub fn bundle_entries(registry: &RegistrySnapshot) -> Vec<ValueRecord> {
    let Some(store) = registry.store(WORLD_STRUCTURE_TYPE) else {
        return Vec::new();
    };

    let mut records = Vec::new();
    for entry in store.entries() {
        let source = entry.source_display();
        let world = entry.value.as_ref();

        let frameworks = field(world, "frameworkAssets").map(|f| items(f.as_ref())).unwrap_or_default();
        for framework in frameworks
            .iter()
            .filter(|f| type_contains(f, "DecimalConstantsFrameworkAsset"))
        {
            let constants = field(framework.as_ref(), "entryAssets")
                .map(|e| items(e.as_ref()))
                .unwrap_or_default();
            records.extend(
                constants
                    .iter()
                    .filter_map(named)
                    .map(|name| ValueRecord::new(name, source.clone())),
            );
        }

        let legacy = field(world, "contentFieldAssets").map(|f| items(f.as_ref())).unwrap_or_default();
        records.extend(
            legacy
                .iter()
                .filter(|f| type_contains(f, "BaseHeightContentFieldAsset"))
                .filter_map(named)
                .map(|name| ValueRecord::new(name, source.clone())),
        );
    }
    records
}

// ============================================================================
// Cosmetics and editor data sets
// ============================================================================

/// Registry-style values for every cosmetic domain named by a property hint
pub fn cosmetics(registry: &RegistrySnapshot, properties: &PropertyIndex<'_>) -> RecordGroups {
    let domains: BTreeSet<&str> = properties
        .iter()
        .filter_map(|(_, node)| hints::cosmetic_domain(node))
        .collect();

    let mut groups = RecordGroups::new();
    for domain in domains {
        let records = registry_style_values(registry, domain);
        if !records.is_empty() {
            groups.insert(domain.to_string(), records);
        }
    }
    groups
}

/// How a data set's values are read off each asset
struct DataSetSource {
    field: &'static str,
    collection: Option<&'static str>,
}

fn data_set_source(data_set: &str) -> Option<DataSetSource> {
    let (field, collection) = match data_set {
        "BlockGroups" => ("group", None),
        "ItemCategories" => ("category", Some("categories")),
        "GradientSets" => ("gradientSet", None),
        "GradientIds" => ("gradientId", None),
        _ => return None,
    };
    Some(DataSetSource { field, collection })
}

fn field_values(registry: &RegistrySnapshot, source: &DataSetSource) -> Vec<ValueRecord> {
    let mut records = Vec::new();
    for entry in registry.stores().iter().flat_map(|store| store.entries()) {
        let provenance = entry.source_display();
        let asset = entry.value.as_ref();

        let mut values: Vec<String> = field(asset, source.field)
            .and_then(|value| text(value.as_ref()))
            .into_iter()
            .collect();
        if let Some(collection) = source.collection.and_then(|name| field(asset, name)) {
            values.extend(items(collection.as_ref()).iter().filter_map(|item| text(item.as_ref())));
        }

        records.extend(
            values
                .into_iter()
                .filter(|value| !value.trim().is_empty())
                .map(|value| ValueRecord::new(value, provenance.clone())),
        );
    }
    records
}

fn collect_data_sets(value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::Object(node) => {
            if let Some(hint) = hints::ui_data_set(node) {
                names.insert(hint.data_set);
            }
            for child in node.values() {
                collect_data_sets(child, names);
            }
        }
        Value::Array(children) => {
            for child in children {
                collect_data_sets(child, names);
            }
        }
        _ => {}
    }
}

/// Values of every editor data set referenced anywhere in the schemas
pub fn ui_data_sets(
    registry: &RegistrySnapshot,
    schemas: &SchemaDocuments,
    properties: &PropertyIndex<'_>,
) -> RecordGroups {
    let mut names = BTreeSet::new();
    for document in schemas.values() {
        collect_data_sets(document, &mut names);
    }
    names.extend(
        properties
            .iter()
            .filter_map(|(_, node)| hints::ui_data_set(node))
            .map(|hint| hint.data_set),
    );

    let mut groups = RecordGroups::new();
    for name in names {
        let mut records = data_set_source(&name)
            .map(|source| field_values(registry, &source))
            .unwrap_or_default();
        if records.is_empty() {
            records = registry_style_values(registry, &name);
        }
        if !records.is_empty() {
            groups.insert(name, records);
        }
    }
    groups
}
