//! Registry Snapshot
//!
//! Turns a live asset registry into a versioned, on-disk snapshot for editor
//! tooling: the generated schema of every asset type, enriched with inferred
//! semantic metadata, plus reference indexes listing the concrete values
//! currently loaded for each semantic domain.
//!
//! ## Pipeline
//!
//! - **Schema indexing**: every property node of every schema, keyed by
//!   (schema file, JSON Pointer)
//! - **Semantic classification**: an ordered rule table maps each property
//!   to at most one semantic record
//! - **Live-value extraction**: asset values and codecs are walked as
//!   arbitrary, possibly cyclic graphs
//! - **Artifact writing**: skipped entirely when the snapshot on disk
//!   already carries the current version
//!
//! ## Layout
//!
//! ```text
//! <output>/
//! ├── schema_mappings.json
//! ├── schemas/
//! │   ├── BlockType.json
//! │   └── Item.json
//! └── indexes/
//!     ├── exportFamilies/Density.json
//!     ├── localization/en-US.json
//!     └── assetPaths/common.json
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod graph;
pub mod host;
pub mod index;
pub mod pointer;
pub mod registry;
pub mod schema;
pub mod version;
pub mod writer;

pub use classify::{Classifier, SemanticKind, SemanticRecord, ValueShape};
pub use config::{OutputFormat, SnapshotConfig};
pub use error::{Result, SnapshotError};
pub use export::{build_snapshot, export_on_boot, export_snapshot, ExportOutcome, Snapshot};
pub use graph::{Introspect, LiveNode, NodeHandle, TypeInfo};
pub use host::{Host, SchemaContext};
pub use index::{IndexBuilder, IndexKind, IndexShard};
pub use registry::{AssetStore, KeyKind, RegistrySnapshot};
pub use schema::{PropertyIndex, PropertyKey, SchemaDocuments};
pub use version::SnapshotVersion;
pub use writer::SnapshotWriter;
