//! Host Integration
//!
//! The exporter does not know how asset types are defined, loaded or turned
//! into base schemas. The embedding process provides all of that through
//! [`Host`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::error::BoxError;
use crate::registry::RegistrySnapshot;
use crate::schema::SchemaDocuments;

/// Scratch state shared across one schema generation pass
///
/// Hosts park shared definitions here while generating per-type schemas.
/// It is discarded after the pass.
#[derive(Debug, Default)]
pub struct SchemaContext {
    definitions: BTreeMap<String, Value>,
}

impl SchemaContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shared definition; returns `false` if the name was taken
    pub fn define(&mut self, name: impl Into<String>, definition: Value) -> bool {
        let name = name.into();
        if self.definitions.contains_key(&name) {
            return false;
        }
        self.definitions.insert(name, definition);
        true
    }

    pub fn definition(&self, name: &str) -> Option<&Value> {
        self.definitions.get(name)
    }

    pub fn definitions(&self) -> &BTreeMap<String, Value> {
        &self.definitions
    }
}

/// Everything the exporter consumes from the running process
pub trait Host {
    /// Base schema documents for every known asset type, keyed by file name
    ///
    /// `editor_config` is filled with the file-to-schema mappings that end up
    /// in `schema_mappings.json`.
    fn generate_schemas(
        &self,
        context: &mut SchemaContext,
        editor_config: &mut Map<String, Value>,
    ) -> Result<SchemaDocuments, BoxError>;

    /// Point-in-time view of the live asset registry
    fn registry(&self) -> RegistrySnapshot;

    /// Best-effort server version; `None` when it cannot be determined
    fn server_version(&self) -> Option<String>;

    /// Default output directory
    fn data_directory(&self) -> PathBuf;
}
