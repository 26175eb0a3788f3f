//! On-disk asset packs: pack roots and the common asset listing.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::normalize;
use crate::registry::RegistrySnapshot;

/// Directory of a pack holding server-side assets
pub const SERVER_DIRECTORY: &str = "Server";

/// Directory of a pack holding client-visible common assets
pub const COMMON_DIRECTORY: &str = "Common";

/// Parent of the nearest `Server` ancestor of an asset file
pub fn pack_root_of(file: &Path) -> Option<PathBuf> {
    let file = normalize(file);
    file.ancestors()
        .find(|dir| dir.file_name().is_some_and(|name| name == SERVER_DIRECTORY))
        .and_then(Path::parent)
        .map(Path::to_path_buf)
}

/// Every pack root referenced by an asset source file
pub fn pack_roots(registry: &RegistrySnapshot) -> BTreeSet<PathBuf> {
    registry.source_files().filter_map(pack_root_of).collect()
}

/// Extension used to group a file: lowercase, or `no_extension`
pub fn file_type(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < file_name.len() => file_name[dot + 1..].to_lowercase(),
        _ => "no_extension".to_string(),
    }
}

/// `{parent directory: {file type: [file name, ...]}}` for every file under `<pack>/Common/`
pub fn common_assets(pack_roots: &BTreeSet<PathBuf>) -> Value {
    let mut by_parent: BTreeMap<String, BTreeMap<String, BTreeSet<String>>> = BTreeMap::new();

    for pack_root in pack_roots {
        if !pack_root.is_dir() {
            continue;
        }
        let walker = WalkDir::new(pack_root).follow_links(true).into_iter();
        for entry in walker.filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable pack entry: {}", e);
                None
            }
        }) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(pack_root) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            let Some(inside) = relative.strip_prefix("Common/") else {
                continue;
            };
            if inside.trim().is_empty() {
                continue;
            }

            let (parent, file_name) = match inside.rfind('/') {
                Some(slash) if slash > 0 => (&inside[..slash], &inside[slash + 1..]),
                Some(slash) => (".", &inside[slash + 1..]),
                None => (".", inside),
            };
            if file_name.trim().is_empty() {
                continue;
            }

            by_parent
                .entry(parent.to_string())
                .or_default()
                .entry(file_type(file_name))
                .or_default()
                .insert(file_name.to_string());
        }
    }

    let mut values = Map::new();
    for (parent, by_type) in by_parent {
        let mut types = Map::new();
        for (file_type, names) in by_type {
            types.insert(
                file_type,
                Value::Array(names.into_iter().map(Value::String).collect()),
            );
        }
        values.insert(parent, Value::Object(types));
    }
    Value::Object(values)
}
