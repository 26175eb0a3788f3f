//! Exported symbols of the world generator's import families.
//!
//! Generator assets can export a node under a name (`exportName`) for other
//! assets to import. Exports hide anywhere inside an asset's value graph, so
//! every asset is walked; only generator records are descended into.

use std::sync::Arc;

use crate::graph::walker::{self, Visit};
use crate::graph::{field, text, TypeInfo};
use crate::registry::RegistrySnapshot;

use super::{RecordGroups, ValueRecord};

/// Namespace of every world generator asset type
pub const GENERATOR_NAMESPACE: &str = "com.hypixel.hytale.builtin.hytalegenerator.assets.";

/// (family, base type) pairs, checked in order
pub const EXPORT_FAMILIES: &[(&str, &str)] = &[
    ("BlockMask", "com.hypixel.hytale.builtin.hytalegenerator.assets.blockmask.BlockMaskAsset"),
    ("Density", "com.hypixel.hytale.builtin.hytalegenerator.assets.density.DensityAsset"),
    (
        "MaterialProvider",
        "com.hypixel.hytale.builtin.hytalegenerator.assets.materialproviders.MaterialProviderAsset",
    ),
    (
        "PositionProvider",
        "com.hypixel.hytale.builtin.hytalegenerator.assets.positionproviders.PositionProviderAsset",
    ),
    ("Assignments", "com.hypixel.hytale.builtin.hytalegenerator.assets.propassignments.AssignmentsAsset"),
    ("Prop", "com.hypixel.hytale.builtin.hytalegenerator.assets.props.PropAsset"),
    (
        "Directionality",
        "com.hypixel.hytale.builtin.hytalegenerator.assets.props.prefabprop.directionality.DirectionalityAsset",
    ),
    ("Pattern", "com.hypixel.hytale.builtin.hytalegenerator.assets.patterns.PatternAsset"),
    ("Scanner", "com.hypixel.hytale.builtin.hytalegenerator.assets.scanners.ScannerAsset"),
    ("Curve", "com.hypixel.hytale.builtin.hytalegenerator.assets.curves.CurveAsset"),
    (
        "ReturnType",
        "com.hypixel.hytale.builtin.hytalegenerator.assets.density.positions.returntypes.ReturnTypeAsset",
    ),
    (
        "VectorProvider",
        "com.hypixel.hytale.builtin.hytalegenerator.assets.vectorproviders.VectorProviderAsset",
    ),
    (
        "EnvironmentProvider",
        "com.hypixel.hytale.builtin.hytalegenerator.assets.environmentproviders.EnvironmentProviderAsset",
    ),
    (
        "TintProvider",
        "com.hypixel.hytale.builtin.hytalegenerator.assets.tintproviders.TintProviderAsset",
    ),
    (
        "PointGenerator",
        "com.hypixel.hytale.builtin.hytalegenerator.assets.pointgenerators.PointGeneratorAsset",
    ),
];

/// Import family of a record type, if any
pub fn family_for(type_info: &TypeInfo) -> Option<&'static str> {
    EXPORT_FAMILIES
        .iter()
        .find(|(_, base)| type_info.is_or_extends(base))
        .map(|(family, _)| *family)
}

/// Exported names per family, across every asset of every store
pub fn collect_exports(registry: &RegistrySnapshot) -> RecordGroups {
    let mut groups = RecordGroups::new();

    for store in registry.stores() {
        for entry in store.entries() {
            let source = entry.source_display();
            walker::walk(&entry.value, |node| {
                let Some(type_info) = node.type_info() else {
                    return Visit::Descend;
                };
                if let Some(family) = family_for(type_info) {
                    let export_name = field(node.as_ref(), "exportName").and_then(|n| text(n.as_ref()));
                    if let Some(name) = export_name.filter(|name| !name.is_empty()) {
                        groups
                            .entry(family.to_string())
                            .or_default()
                            .push(ValueRecord::new(name, source.clone()));
                    }
                }
                if type_info.in_namespace(GENERATOR_NAMESPACE) {
                    Visit::Descend
                } else {
                    Visit::SkipFields
                }
            });
        }
    }

    groups
}

/// Convenience for building generator type hierarchies in hosts and tests
pub fn generator_type(relative_name: &str, parent: Option<&Arc<TypeInfo>>) -> Arc<TypeInfo> {
    let name = format!("{GENERATOR_NAMESPACE}{relative_name}");
    match parent {
        Some(parent) => TypeInfo::with_parent(name, parent),
        None => TypeInfo::new(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{LiveNode, NodeHandle};
    use crate::registry::{AssetStore, KeyKind};
    use std::path::PathBuf;

    #[test]
    fn test_family_for_subtypes() {
        let density = generator_type("density.DensityAsset", None);
        let constant = generator_type("density.ConstantDensityAsset", Some(&density));
        assert_eq!(family_for(&constant), Some("Density"));
        assert_eq!(family_for(&TypeInfo::new("other.Thing")), None);
    }

    #[test]
    fn test_exports_found_in_nested_and_cyclic_graphs() {
        let density = generator_type("density.DensityAsset", None);
        let sum = generator_type("density.SumDensityAsset", Some(&density));
        let foreign = TypeInfo::new("com.example.Foreign");

        let hidden = LiveNode::record(&density, [("exportName", LiveNode::string("Hidden"))]);
        let foreign_node: NodeHandle =
            LiveNode::record(&foreign, [("inner", hidden as NodeHandle)]);

        let leaf = LiveNode::record(&density, [("exportName", LiveNode::string("Leaf"))]);
        let root = LiveNode::record(
            &sum,
            [
                ("exportName", LiveNode::string("Root")),
                ("inputs", LiveNode::sequence(vec![leaf.clone() as NodeHandle, foreign_node])),
            ],
        );
        // cycle back to the root
        leaf.as_record().unwrap().set("parent", root.clone()).unwrap();

        let store = AssetStore::new(sum.clone(), KeyKind::String).with_asset(
            "Terrain",
            root,
            Some(PathBuf::from("/pack/Server/Density/Terrain.json")),
        );
        let registry = RegistrySnapshot::new(vec![store]);

        let groups = collect_exports(&registry);
        let names: Vec<&str> = groups["Density"].iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Root", "Leaf"]);
        assert_eq!(
            groups["Density"][0].source_file.as_deref(),
            Some("/pack/Server/Density/Terrain.json")
        );
    }
}
