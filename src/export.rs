//! Export Pipeline
//!
//! Wires the stages together:
//!
//! 1. resolve the output directory and version stamp, and skip when the
//!    snapshot on disk already carries the current version
//! 2. generate base schemas through the [`Host`]
//! 3. index properties, walk codecs for enum descriptors, classify
//! 4. annotate schemas and build reference indexes
//! 5. write everything
//!
//! [`build_snapshot`] is the pure core of steps 3 and 4.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::path::{Component, Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::classify::{Classifier, SemanticRecord};
use crate::config::SnapshotConfig;
use crate::error::{Result, SnapshotError};
use crate::graph::CodecGraphCollector;
use crate::host::{Host, SchemaContext};
use crate::index::{IndexBuilder, IndexShard};
use crate::registry::RegistrySnapshot;
use crate::schema::annotate::annotate;
use crate::schema::{PropertyIndex, PropertyKey, SchemaDocuments};
use crate::version::{SnapshotVersion, VersionChange};
use crate::writer::{SnapshotWriter, WriteSummary};

/// Everything one export writes
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Editor config produced during schema generation
    pub schema_mappings: Value,
    /// Schemas with semantic annotations applied
    pub schemas: SchemaDocuments,
    pub semantics: BTreeMap<PropertyKey, SemanticRecord>,
    pub shards: Vec<IndexShard>,
}

/// Result of a completed export run
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    /// The output already carried the current version; nothing was written
    Skipped {
        root: PathBuf,
        version: SnapshotVersion,
    },
    Exported {
        root: PathBuf,
        version: SnapshotVersion,
        summary: WriteSummary,
    },
}

impl ExportOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, ExportOutcome::Skipped { .. })
    }
}

/// Classify, annotate and index a schema set against a registry snapshot
pub fn build_snapshot(
    schemas: &SchemaDocuments,
    schema_mappings: Value,
    registry: &RegistrySnapshot,
) -> Snapshot {
    let properties = PropertyIndex::build(schemas);
    debug!("Indexed {} schema properties", properties.len());

    let mut collector = CodecGraphCollector::new();
    for store in registry.stores() {
        if let Some(codec) = store.codec() {
            collector.collect(codec);
        }
    }
    debug!("Walked {} codecs", collector.codec_count());
    let enums = collector.into_catalog();

    let semantics = Classifier::new(schemas, &properties, &enums).classify_all();
    let shards = IndexBuilder::new(registry, schemas, &properties).build();

    Snapshot {
        schema_mappings,
        schemas: annotate(schemas, &semantics),
        semantics,
        shards,
    }
}

/// Schema documents must be JSON objects with plain relative file names
fn validate_schemas(schemas: &SchemaDocuments) -> Result<()> {
    for (file, document) in schemas {
        let relative = Path::new(file)
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if file.trim().is_empty() || !relative {
            return Err(SnapshotError::InvalidSchema {
                file: file.clone(),
                reason: "file name must be a relative path".to_string(),
            });
        }
        if !document.is_object() {
            return Err(SnapshotError::InvalidSchema {
                file: file.clone(),
                reason: "document is not a JSON object".to_string(),
            });
        }
    }
    Ok(())
}

/// Run one export against the host
pub fn export_snapshot<H: Host + ?Sized>(host: &H, config: &SnapshotConfig) -> Result<ExportOutcome> {
    let root = config.output_dir(&host.data_directory());
    let version = SnapshotVersion::resolve(host.server_version().as_deref());
    let writer = SnapshotWriter::new(&root, config.export.output_format);

    if let Some(recorded) = writer.recorded_version() {
        match version.change_from(&recorded) {
            VersionChange::Same => {
                info!(
                    "Same-version snapshot already found at {} (version={}); skipping export",
                    root.display(),
                    version
                );
                return Ok(ExportOutcome::Skipped { root, version });
            }
            VersionChange::Downgrade => {
                warn!("Replacing snapshot from newer version {} with {}", recorded, version)
            }
            VersionChange::Upgrade | VersionChange::Changed => {
                info!("Replacing snapshot from version {} with {}", recorded, version)
            }
        }
    }

    let mut context = SchemaContext::new();
    let mut editor_config = Map::new();
    let schemas = host
        .generate_schemas(&mut context, &mut editor_config)
        .map_err(SnapshotError::SchemaGeneration)?;
    validate_schemas(&schemas)?;
    debug!(
        "Generated {} schemas ({} shared definitions)",
        schemas.len(),
        context.definitions().len()
    );

    let registry = host.registry();
    let snapshot = build_snapshot(&schemas, Value::Object(editor_config), &registry);
    let summary = writer.write(&snapshot, &version)?;

    info!("Exported snapshot artifacts to {}", root.display());
    Ok(ExportOutcome::Exported {
        root,
        version,
        summary,
    })
}

/// `error: cause: cause` rendering of an error and its sources
pub fn error_chain(err: &dyn StdError) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

/// Startup entry point: load configuration, export, and log any failure
///
/// Returns `None` when the export failed.
pub fn export_on_boot<H: Host + ?Sized>(host: &H) -> Option<ExportOutcome> {
    let config = match SnapshotConfig::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load snapshot configuration, using defaults: {}", e);
            SnapshotConfig::default()
        }
    };

    match export_snapshot(host, &config) {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            error!("Failed to export asset registry snapshot: {}", error_chain(&e));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use serde_json::json;

    #[test]
    fn test_validate_schemas() {
        let mut schemas = SchemaDocuments::new();
        schemas.insert("Item.json".to_string(), json!({}));
        assert!(validate_schemas(&schemas).is_ok());

        schemas.insert("../escape.json".to_string(), json!({}));
        assert!(matches!(
            validate_schemas(&schemas),
            Err(SnapshotError::InvalidSchema { file, .. }) if file == "../escape.json"
        ));

        let mut schemas = SchemaDocuments::new();
        schemas.insert("Block.json".to_string(), json!([1, 2]));
        assert!(validate_schemas(&schemas).is_err());
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let cause: BoxError = "generator exploded".into();
        let err = SnapshotError::SchemaGeneration(cause);
        assert_eq!(
            error_chain(&err),
            "Schema generation failed: generator exploded"
        );

        let err = SnapshotError::io(
            "/out/schemas",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(error_chain(&err), "IO error at /out/schemas: denied");
    }

    #[test]
    fn test_build_snapshot_without_registry() {
        let mut schemas = SchemaDocuments::new();
        schemas.insert(
            "Item.json".to_string(),
            json!({
                "properties": {
                    "Quality": { "type": "string", "enum": ["Common", "Rare"] }
                }
            }),
        );
        let snapshot = build_snapshot(&schemas, json!({}), &RegistrySnapshot::default());

        assert_eq!(snapshot.semantics.len(), 1);
        assert_eq!(
            snapshot.schemas["Item.json"]["properties"]["Quality"]["hytaleDevtools"]["semanticKind"],
            "literalChoice"
        );
        // untouched input
        assert!(schemas["Item.json"]["properties"]["Quality"].get("hytaleDevtools").is_none());
        // only the always-present common asset listing
        assert_eq!(snapshot.shards.len(), 1);
    }
}
