//! Live Asset Registry
//!
//! A point-in-time view of every loaded asset store, handed to the pipeline
//! as an explicit argument. Stores expose their asset type, codec, key kind
//! and loaded assets; each asset is a live value graph plus the file it was
//! loaded from, when known.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::graph::{CodecRef, NodeHandle, TypeInfo};

/// How a store keys its assets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Plain string identifiers
    String,
    /// Any other key type, rendered through its textual form
    Other,
}

/// One loaded asset
#[derive(Debug, Clone)]
pub struct AssetEntry {
    pub key: String,
    pub value: NodeHandle,
    pub source_file: Option<PathBuf>,
}

impl AssetEntry {
    /// Source file as written into index provenance
    pub fn source_display(&self) -> Option<String> {
        self.source_file
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned())
    }
}

/// All loaded assets of one type
#[derive(Debug, Clone)]
pub struct AssetStore {
    asset_type: Arc<TypeInfo>,
    codec: Option<CodecRef>,
    key_kind: KeyKind,
    entries: Vec<AssetEntry>,
}

impl AssetStore {
    pub fn new(asset_type: Arc<TypeInfo>, key_kind: KeyKind) -> Self {
        Self {
            asset_type,
            codec: None,
            key_kind,
            entries: Vec::new(),
        }
    }

    pub fn with_codec(mut self, codec: CodecRef) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Add an asset; builder style
    pub fn with_asset(
        mut self,
        key: impl Into<String>,
        value: NodeHandle,
        source_file: Option<PathBuf>,
    ) -> Self {
        self.insert(key, value, source_file);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: NodeHandle, source_file: Option<PathBuf>) {
        self.entries.push(AssetEntry {
            key: key.into(),
            value,
            source_file,
        });
    }

    pub fn asset_type(&self) -> &TypeInfo {
        &self.asset_type
    }

    /// Simple name of the asset type (e.g. "BlockType")
    pub fn type_name(&self) -> &str {
        self.asset_type.simple_name()
    }

    pub fn codec(&self) -> Option<&CodecRef> {
        self.codec.as_ref()
    }

    pub fn key_kind(&self) -> KeyKind {
        self.key_kind
    }

    pub fn entries(&self) -> &[AssetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Every store of the registry, sorted by asset type simple name
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    stores: Vec<AssetStore>,
    language_roots: Vec<PathBuf>,
}

impl RegistrySnapshot {
    pub fn new(mut stores: Vec<AssetStore>) -> Self {
        stores.sort_by(|a, b| a.type_name().cmp(b.type_name()));
        Self {
            stores,
            language_roots: Vec::new(),
        }
    }

    /// Extra directories holding `.lang` files, contributed outside the stores
    pub fn with_language_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.language_roots = roots;
        self
    }

    pub fn stores(&self) -> &[AssetStore] {
        &self.stores
    }

    /// Store whose asset type has the given simple name
    pub fn store(&self, type_name: &str) -> Option<&AssetStore> {
        self.stores.iter().find(|store| store.type_name() == type_name)
    }

    pub fn language_roots(&self) -> &[PathBuf] {
        &self.language_roots
    }

    /// Every known asset source file
    pub fn source_files(&self) -> impl Iterator<Item = &Path> {
        self.stores
            .iter()
            .flat_map(|store| store.entries.iter())
            .filter_map(|entry| entry.source_file.as_deref())
    }

    pub fn asset_count(&self) -> usize {
        self.stores.iter().map(AssetStore::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::LiveNode;

    #[test]
    fn test_stores_sorted_by_simple_name() {
        let zeta = AssetStore::new(TypeInfo::new("a.b.Zeta"), KeyKind::String);
        let alpha = AssetStore::new(TypeInfo::new("z.y.Alpha"), KeyKind::String)
            .with_asset("one", LiveNode::null(), Some(PathBuf::from("/pack/Server/Alpha/one.json")))
            .with_asset("two", LiveNode::null(), None);

        let registry = RegistrySnapshot::new(vec![zeta, alpha]);
        let names: Vec<&str> = registry.stores().iter().map(AssetStore::type_name).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
        assert_eq!(registry.asset_count(), 2);
        assert_eq!(registry.source_files().count(), 1);
        assert!(registry.store("Zeta").unwrap().is_empty());
    }
}
