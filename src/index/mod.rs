//! Reference Indexes
//!
//! Lists the concrete values currently loaded for each semantic domain, so
//! editors can autocomplete and validate `symbolReference` properties. Every
//! (index kind, key) group becomes one [`IndexShard`], written to its own
//! file under `indexes/`.
//!
//! Collection is best-effort: values that cannot be read from a live graph,
//! and files or directories that cannot be listed or read, simply contribute
//! nothing.

pub mod domains;
pub mod families;
pub mod files;
pub mod localization;

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::registry::RegistrySnapshot;
use crate::schema::{PropertyIndex, SchemaDocuments};

/// Directory under the output root that holds every shard
pub const INDEXES_DIRECTORY: &str = "indexes";

// ============================================================================
// Shards
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKind {
    ExportsByFamily,
    RegisteredAssets,
    ReferenceBundle,
    LocalizationKeys,
    CosmeticsByType,
    UiDataSets,
    CommonAssetsByRoot,
}

impl IndexKind {
    pub const ALL: [IndexKind; 7] = [
        IndexKind::ExportsByFamily,
        IndexKind::RegisteredAssets,
        IndexKind::ReferenceBundle,
        IndexKind::LocalizationKeys,
        IndexKind::CosmeticsByType,
        IndexKind::UiDataSets,
        IndexKind::CommonAssetsByRoot,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IndexKind::ExportsByFamily => "exportsByFamily",
            IndexKind::RegisteredAssets => "registeredAssets",
            IndexKind::ReferenceBundle => "referenceBundle",
            IndexKind::LocalizationKeys => "localizationKeys",
            IndexKind::CosmeticsByType => "cosmeticsByType",
            IndexKind::UiDataSets => "uiDataSets",
            IndexKind::CommonAssetsByRoot => "commonAssetsByRoot",
        }
    }

    /// Directory under `indexes/` holding this kind's shards
    pub fn directory(self) -> &'static str {
        match self {
            IndexKind::ExportsByFamily => "exportFamilies",
            IndexKind::RegisteredAssets => "registeredAssets",
            IndexKind::ReferenceBundle => "referenceBundle",
            IndexKind::LocalizationKeys => "localization",
            IndexKind::CosmeticsByType => "cosmeticDomain",
            IndexKind::UiDataSets => "uiDataSet",
            IndexKind::CommonAssetsByRoot => "assetPaths",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One independently written index artifact
#[derive(Debug, Clone, PartialEq)]
pub struct IndexShard {
    pub kind: IndexKind,
    pub key: String,
    /// Path relative to the output root, `/`-separated
    pub relative_path: String,
    pub values: Value,
}

impl IndexShard {
    /// Shard whose file name is derived from its key
    pub fn new(kind: IndexKind, key: impl Into<String>, values: Value) -> Self {
        let key = key.into();
        let relative_path = format!(
            "{}/{}/{}.json",
            INDEXES_DIRECTORY,
            kind.directory(),
            sanitize_key(&key)
        );
        Self {
            kind,
            key,
            relative_path,
            values,
        }
    }
}

/// Keep letters, digits, `.`, `-` and `_`; replace everything else with `_`
pub fn sanitize_key(key: &str) -> String {
    let sanitized: String = key
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.trim().is_empty() {
        "index".to_string()
    } else {
        sanitized
    }
}

// ============================================================================
// Value records
// ============================================================================

/// A discovered value with its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRecord {
    pub name: String,
    pub source_file: Option<String>,
    pub translation: Option<String>,
}

impl ValueRecord {
    pub fn new(name: impl Into<String>, source_file: Option<String>) -> Self {
        Self {
            name: name.into(),
            source_file,
            translation: None,
        }
    }

    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self
    }

    fn sort_key(&self) -> (&str, &str) {
        (&self.name, self.source_file.as_deref().unwrap_or(""))
    }
}

/// Records grouped by shard key
pub type RecordGroups = BTreeMap<String, Vec<ValueRecord>>;

/// Sort by (name, provenance) and keep the first record of each non-blank name
pub fn dedup_records(mut records: Vec<ValueRecord>) -> Vec<ValueRecord> {
    records.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    let mut seen = HashSet::new();
    records.retain(|record| !record.name.trim().is_empty() && seen.insert(record.name.clone()));
    records
}

/// Payload layouts of the record-backed index kinds
#[derive(Debug, Clone, Copy)]
enum Payload {
    /// `{name: {sourcedFromFile}}`
    Provenance,
    /// `{key: translation}`
    Translation,
    /// `[name, ...]`
    Names,
}

fn payload(layout: Payload, records: Vec<ValueRecord>) -> Value {
    let records = dedup_records(records);
    match layout {
        Payload::Provenance => {
            let mut values = Map::new();
            for record in records {
                values.insert(record.name, json!({ "sourcedFromFile": record.source_file }));
            }
            Value::Object(values)
        }
        Payload::Translation => {
            let mut values = Map::new();
            for record in records {
                values.insert(record.name, json!(record.translation));
            }
            Value::Object(values)
        }
        Payload::Names => Value::Array(records.into_iter().map(|r| Value::String(r.name)).collect()),
    }
}

/// Give every shard a distinct path; later collisions get `-2`, `-3`, ...
fn disambiguate_paths(shards: &mut [IndexShard]) {
    let mut taken = HashSet::new();
    for shard in shards.iter_mut() {
        if taken.insert(shard.relative_path.clone()) {
            continue;
        }
        let stem = shard
            .relative_path
            .strip_suffix(".json")
            .unwrap_or(&shard.relative_path)
            .to_string();
        let mut suffix = 2;
        let unique = loop {
            let candidate = format!("{stem}-{suffix}.json");
            if taken.insert(candidate.clone()) {
                break candidate;
            }
            suffix += 1;
        };
        debug!(
            "Shard {} key '{}' collides with another key at {}; writing {}",
            shard.kind, shard.key, shard.relative_path, unique
        );
        shard.relative_path = unique;
    }
}

fn push_groups(shards: &mut Vec<IndexShard>, kind: IndexKind, layout: Payload, groups: RecordGroups) {
    for (key, records) in groups {
        shards.push(IndexShard::new(kind, key, payload(layout, records)));
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builds every index shard from the registry and the schema set
pub struct IndexBuilder<'a> {
    registry: &'a RegistrySnapshot,
    schemas: &'a SchemaDocuments,
    properties: &'a PropertyIndex<'a>,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(
        registry: &'a RegistrySnapshot,
        schemas: &'a SchemaDocuments,
        properties: &'a PropertyIndex<'a>,
    ) -> Self {
        Self {
            registry,
            schemas,
            properties,
        }
    }

    /// All shards, grouped by kind and ordered by key within each kind
    pub fn build(&self) -> Vec<IndexShard> {
        let pack_roots = files::pack_roots(self.registry);
        let mut shards = Vec::new();

        push_groups(
            &mut shards,
            IndexKind::ExportsByFamily,
            Payload::Provenance,
            families::collect_exports(self.registry),
        );
        push_groups(
            &mut shards,
            IndexKind::RegisteredAssets,
            Payload::Provenance,
            domains::registered_assets(self.registry),
        );

        let bundle = domains::bundle_entries(self.registry);
        if !bundle.is_empty() {
            shards.push(IndexShard::new(
                IndexKind::ReferenceBundle,
                crate::classify::BUNDLE_TYPE,
                payload(Payload::Names, bundle),
            ));
        }

        push_groups(
            &mut shards,
            IndexKind::LocalizationKeys,
            Payload::Translation,
            localization::collect_keys(&pack_roots, self.registry.language_roots()),
        );
        push_groups(
            &mut shards,
            IndexKind::CosmeticsByType,
            Payload::Names,
            domains::cosmetics(self.registry, self.properties),
        );
        push_groups(
            &mut shards,
            IndexKind::UiDataSets,
            Payload::Names,
            domains::ui_data_sets(self.registry, self.schemas, self.properties),
        );

        shards.push(IndexShard {
            kind: IndexKind::CommonAssetsByRoot,
            key: "all".to_string(),
            relative_path: format!(
                "{}/{}/common.json",
                INDEXES_DIRECTORY,
                IndexKind::CommonAssetsByRoot.directory()
            ),
            values: files::common_assets(&pack_roots),
        });

        disambiguate_paths(&mut shards);
        debug!("Built {} index shards", shards.len());
        shards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_key() {
        assert_eq!(format!("{}.json", sanitize_key("Weird Key/Name!")), "Weird_Key_Name_.json");
        assert_eq!(sanitize_key("en-US"), "en-US");
        assert_eq!(sanitize_key("Block.Type_2"), "Block.Type_2");
        assert_eq!(sanitize_key(""), "index");
    }

    #[test]
    fn test_shard_path() {
        let shard = IndexShard::new(IndexKind::LocalizationKeys, "en-US", json!({}));
        assert_eq!(shard.relative_path, "indexes/localization/en-US.json");
        let shard = IndexShard::new(IndexKind::CosmeticsByType, "Face Parts", json!([]));
        assert_eq!(shard.relative_path, "indexes/cosmeticDomain/Face_Parts.json");
    }

    #[test]
    fn test_colliding_keys_get_distinct_paths() {
        let mut shards = vec![
            IndexShard::new(IndexKind::LocalizationKeys, "en US", json!({})),
            IndexShard::new(IndexKind::LocalizationKeys, "en_US", json!({})),
            IndexShard::new(IndexKind::LocalizationKeys, "en_US-2", json!({})),
            IndexShard::new(IndexKind::LocalizationKeys, "en/US", json!({})),
        ];
        disambiguate_paths(&mut shards);

        let paths: Vec<&str> = shards.iter().map(|s| s.relative_path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "indexes/localization/en_US.json",
                "indexes/localization/en_US-2.json",
                "indexes/localization/en_US-2-2.json",
                "indexes/localization/en_US-3.json",
            ]
        );
        assert_eq!(shards[1].key, "en_US");
    }

    #[test]
    fn test_build_keeps_locale_shards_apart() {
        let dir = tempfile::tempdir().unwrap();
        let languages = dir.path().join("Languages");
        for locale in ["en US", "en_US"] {
            std::fs::create_dir_all(languages.join(locale)).unwrap();
            std::fs::write(languages.join(locale).join("ui.lang"), format!("title={locale}\n")).unwrap();
        }
        let registry = RegistrySnapshot::default().with_language_roots(vec![languages]);
        let schemas = SchemaDocuments::new();
        let properties = PropertyIndex::build(&schemas);

        let shards = IndexBuilder::new(&registry, &schemas, &properties).build();
        let mut paths: Vec<&str> = shards.iter().map(|s| s.relative_path.as_str()).collect();
        let total = paths.len();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), total);

        let locales: Vec<(&str, &Value)> = shards
            .iter()
            .filter(|s| s.kind == IndexKind::LocalizationKeys)
            .map(|s| (s.key.as_str(), &s.values))
            .collect();
        assert_eq!(
            locales,
            vec![
                ("en US", &json!({ "ui.title": "en US" })),
                ("en_US", &json!({ "ui.title": "en_US" })),
            ]
        );
    }

    #[test]
    fn test_dedup_keeps_first_by_provenance() {
        let records = vec![
            ValueRecord::new("Stone", Some("b.json".into())),
            ValueRecord::new("Dirt", None),
            ValueRecord::new("Stone", Some("a.json".into())),
            ValueRecord::new("  ", Some("c.json".into())),
            ValueRecord::new("Stone", None),
        ];
        let deduped = dedup_records(records);
        assert_eq!(
            deduped,
            vec![ValueRecord::new("Dirt", None), ValueRecord::new("Stone", None)]
        );
    }

    #[test]
    fn test_payload_layouts() {
        let records = || {
            vec![
                ValueRecord::new("b", Some("/x/b.json".into())),
                ValueRecord::new("a", None).with_translation("Alpha"),
            ]
        };
        assert_eq!(
            payload(Payload::Provenance, records()),
            json!({ "a": { "sourcedFromFile": null }, "b": { "sourcedFromFile": "/x/b.json" } })
        );
        assert_eq!(
            payload(Payload::Translation, records()),
            json!({ "a": "Alpha", "b": null })
        );
        assert_eq!(payload(Payload::Names, records()), json!(["a", "b"]));
    }

    #[test]
    fn test_index_kind_names() {
        for kind in IndexKind::ALL {
            assert_eq!(IndexKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(IndexKind::from_name("nope"), None);
    }
}
