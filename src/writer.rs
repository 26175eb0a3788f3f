//! Snapshot Writer
//!
//! Lays a [`Snapshot`] out under an output root:
//!
//! ```text
//! <root>/
//! ├── schema_mappings.json        {version, generatedAt, schemaMappings}
//! ├── schemas/
//! │   └── <schema file>           annotated schema documents
//! └── indexes/
//!     └── <category>/<key>.json   {version, generatedAt, indexKind, key, values}
//! ```
//!
//! The version recorded in `schema_mappings.json` decides whether a run can
//! be skipped entirely, so that file is written only after everything else
//! has landed.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::OutputFormat;
use crate::error::{IoResultExt, Result, SnapshotError};
use crate::export::Snapshot;
use crate::index::INDEXES_DIRECTORY;
use crate::version::{self, SnapshotVersion, VERSION_FIELD};

/// Metadata file carrying the version stamp and schema mappings
pub const METADATA_FILE: &str = "schema_mappings.json";

/// Directory holding the annotated schemas
pub const SCHEMAS_DIRECTORY: &str = "schemas";

/// Artifacts from older snapshot layouts, written as both `.json` and `.bson`
pub const LEGACY_ARTIFACT_PAIRS: &[&str] = &[
    "stores_info",
    "codecs_info",
    "asset_key_domains",
    "material_solid_values",
    "material_fluid_values",
    "schemas",
    "asset_types_info",
    "property_semantics",
    "index_manifest",
];

/// Individual legacy artifacts
pub const LEGACY_ARTIFACT_FILES: &[&str] = &[
    "schemas.bson",
    "schemaMappings.bson",
    "schemaMappings.json",
    "autocomplete_semantics_v1.json",
    "autocomplete_semantics_v1.bson",
    "reference_indexes_v1.json",
    "reference_indexes_v1.bson",
];

/// Files touched by one write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub schema_files: usize,
    pub shard_files: usize,
    /// Legacy artifacts that existed and were deleted
    pub removed_legacy: Vec<String>,
}

/// Writes snapshots under one output root
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    root: PathBuf,
    format: OutputFormat,
}

impl SnapshotWriter {
    pub fn new(root: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            root: root.into(),
            format,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    /// Version of the snapshot already on disk, if readable
    pub fn recorded_version(&self) -> Option<SnapshotVersion> {
        version::read_recorded(&self.metadata_path())
    }

    /// Whether the snapshot on disk was produced by `current`
    pub fn is_current(&self, current: &SnapshotVersion) -> bool {
        self.recorded_version().as_ref() == Some(current)
    }

    /// Write schemas and shards, remove legacy artifacts, then stamp the version
    pub fn write(&self, snapshot: &Snapshot, version: &SnapshotVersion) -> Result<WriteSummary> {
        fs::create_dir_all(&self.root).at_path(&self.root)?;
        let generated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        let mut summary = WriteSummary {
            schema_files: self.write_schemas(snapshot)?,
            shard_files: self.write_indexes(snapshot, version, &generated_at)?,
            ..WriteSummary::default()
        };
        summary.removed_legacy = self.remove_legacy_artifacts()?;

        // The version stamp goes last: a run that fails before this point
        // leaves the previous stamp (or none) behind and is retried.
        let metadata = json!({
            VERSION_FIELD: version.as_str(),
            "generatedAt": generated_at,
            "schemaMappings": snapshot.schema_mappings,
        });
        self.write_json(&self.metadata_path(), &metadata)?;

        info!(
            "Wrote {} schemas and {} index shards to {}",
            summary.schema_files,
            summary.shard_files,
            self.root.display()
        );
        Ok(summary)
    }

    fn write_schemas(&self, snapshot: &Snapshot) -> Result<usize> {
        let directory = self.root.join(SCHEMAS_DIRECTORY);
        reset_directory(&directory)?;

        for (file_name, document) in &snapshot.schemas {
            self.write_json(&directory.join(file_name), document)?;
        }
        Ok(snapshot.schemas.len())
    }

    fn write_indexes(
        &self,
        snapshot: &Snapshot,
        version: &SnapshotVersion,
        generated_at: &str,
    ) -> Result<usize> {
        reset_directory(&self.root.join(INDEXES_DIRECTORY))?;

        for shard in &snapshot.shards {
            let document = json!({
                VERSION_FIELD: version.as_str(),
                "generatedAt": generated_at,
                "indexKind": shard.kind.as_str(),
                "key": shard.key,
                "values": shard.values,
            });
            self.write_json(&self.root.join(&shard.relative_path), &document)?;
        }
        Ok(snapshot.shards.len())
    }

    fn remove_legacy_artifacts(&self) -> Result<Vec<String>> {
        let names = LEGACY_ARTIFACT_PAIRS
            .iter()
            .flat_map(|base| [format!("{base}.json"), format!("{base}.bson")])
            .chain(LEGACY_ARTIFACT_FILES.iter().map(|name| name.to_string()));

        let mut removed = Vec::new();
        for name in names {
            let path = self.root.join(&name);
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Removed legacy artifact {}", path.display());
                    removed.push(name);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(SnapshotError::io(path, e)),
            }
        }
        Ok(removed)
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).at_path(parent)?;
        }
        let content = match self.format {
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
            OutputFormat::Compact => serde_json::to_string(value)?,
        };
        fs::write(path, content).at_path(path)
    }
}

/// Remove a directory with everything in it and create it empty
fn reset_directory(directory: &Path) -> Result<()> {
    match fs::remove_dir_all(directory) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(SnapshotError::io(directory, e)),
    }
    fs::create_dir_all(directory).at_path(directory)
}

/// Parse a written JSON artifact back
pub fn read_artifact(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path).at_path(path)?;
    Ok(serde_json::from_str(&raw)?)
}
