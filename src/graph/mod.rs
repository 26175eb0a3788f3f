//! Live Value Graphs
//!
//! Asset values and codecs are arbitrary object graphs: records with named
//! fields, sequences, keyed mappings and scalars, possibly cyclic and sharing
//! large substructures. Nothing here assumes a fixed schema. Every node is
//! reached through the [`Introspect`] capability trait and held as a cloned
//! [`NodeHandle`], so traversal never deep-copies values.
//!
//! This module is shared between:
//! - the reference index builder (live asset values)
//! - the codec walker (encode/decode descriptors)

pub mod codec;
pub mod walker;

pub use codec::{
    BuilderCodec, Codec, CodecError, CodecGraphCollector, CodecMapCodec, CodecRef, DeferredCodec,
    EnumCatalog, EnumCodec, EnumDescriptor, EnumStyle, WrapperCodec,
};
pub use walker::{GraphWalker, NodeIdentity, Visit};

use std::any::Any;
use std::fmt;
use std::sync::{Arc, RwLock};

use thiserror::Error;

/// Shared handle to any introspectable node
pub type NodeHandle = Arc<dyn Introspect>;

// ============================================================================
// Capability trait
// ============================================================================

/// Failure to read the structure of a single node
#[derive(Debug, Error)]
pub enum IntrospectError {
    #[error("field table of {0} is poisoned")]
    Poisoned(String),

    #[error("{0} is not bound yet")]
    Unbound(String),
}

/// Scalar leaf values
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Textual form of the scalar; `None` for null
    pub fn as_text(&self) -> Option<String> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(b) => Some(b.to_string()),
            Scalar::Int(i) => Some(i.to_string()),
            Scalar::Float(f) => Some(f.to_string()),
            Scalar::Str(s) => Some(s.clone()),
        }
    }
}

/// Structural view of a node, as far as the walker cares
pub enum Shape<'a> {
    Scalar(&'a Scalar),
    Sequence(&'a [NodeHandle]),
    Mapping(&'a [(NodeHandle, NodeHandle)]),
    /// Typed record; children come from [`Introspect::fields`]
    Record,
    /// Cannot be looked into
    Opaque,
}

/// Reflection-free introspection of a graph node
pub trait Introspect: Send + Sync {
    fn shape(&self) -> Shape<'_>;

    /// Runtime type of a record node
    fn type_info(&self) -> Option<&TypeInfo> {
        None
    }

    /// Named fields of a record node, in declaration order
    fn fields(&self) -> Result<Vec<(String, NodeHandle)>, IntrospectError> {
        Ok(Vec::new())
    }

    fn as_any(&self) -> &dyn Any;
}

impl fmt::Debug for dyn Introspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.type_info() {
            Some(type_info) => write!(f, "Node({type_info})"),
            None => f.write_str("Node"),
        }
    }
}

/// Look up one named field of a record; failures read as absent
pub fn field(node: &dyn Introspect, name: &str) -> Option<NodeHandle> {
    node.fields()
        .ok()?
        .into_iter()
        .find_map(|(field_name, value)| (field_name == name).then_some(value))
}

/// Text of a scalar node
pub fn text(node: &dyn Introspect) -> Option<String> {
    match node.shape() {
        Shape::Scalar(scalar) => scalar.as_text(),
        _ => None,
    }
}

/// Items of a sequence node; anything else yields nothing
pub fn items(node: &dyn Introspect) -> Vec<NodeHandle> {
    match node.shape() {
        Shape::Sequence(items) => items.to_vec(),
        _ => Vec::new(),
    }
}

// ============================================================================
// Type information
// ============================================================================

/// Fully-qualified runtime type with its superclass chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    name: String,
    parent: Option<Arc<TypeInfo>>,
}

impl TypeInfo {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: None,
        })
    }

    pub fn with_parent(name: impl Into<String>, parent: &Arc<TypeInfo>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: Some(Arc::clone(parent)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&TypeInfo> {
        self.parent.as_deref()
    }

    /// Name without package or enclosing type
    pub fn simple_name(&self) -> &str {
        self.name
            .rsplit(|c| c == '.' || c == '$')
            .next()
            .unwrap_or(&self.name)
    }

    /// This type followed by its ancestors
    pub fn ancestors(&self) -> impl Iterator<Item = &TypeInfo> {
        std::iter::successors(Some(self), |t| t.parent())
    }

    pub fn is_or_extends(&self, name: &str) -> bool {
        self.ancestors().any(|t| t.name == name)
    }

    pub fn in_namespace(&self, prefix: &str) -> bool {
        self.name.starts_with(prefix)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ============================================================================
// Provided node model
// ============================================================================

/// Record node with a mutable field table, so cyclic graphs can be tied
pub struct Record {
    type_info: Arc<TypeInfo>,
    fields: RwLock<Vec<(String, NodeHandle)>>,
}

impl Record {
    pub fn type_info(&self) -> &Arc<TypeInfo> {
        &self.type_info
    }

    /// Set a field, replacing an existing one of the same name
    pub fn set(&self, name: &str, value: NodeHandle) -> Result<(), IntrospectError> {
        let mut fields = self
            .fields
            .write()
            .map_err(|_| IntrospectError::Poisoned(self.type_info.name.clone()))?;
        match fields.iter_mut().find(|(field_name, _)| field_name == name) {
            Some(slot) => slot.1 = value,
            None => fields.push((name.to_string(), value)),
        }
        Ok(())
    }
}

/// General purpose node used by hosts to expose their live values
pub enum LiveNode {
    Scalar(Scalar),
    Sequence(Vec<NodeHandle>),
    Mapping(Vec<(NodeHandle, NodeHandle)>),
    Record(Record),
    Opaque(String),
}

impl LiveNode {
    pub fn null() -> NodeHandle {
        Arc::new(LiveNode::Scalar(Scalar::Null))
    }

    pub fn string(value: impl Into<String>) -> NodeHandle {
        Arc::new(LiveNode::Scalar(Scalar::Str(value.into())))
    }

    pub fn int(value: i64) -> NodeHandle {
        Arc::new(LiveNode::Scalar(Scalar::Int(value)))
    }

    pub fn float(value: f64) -> NodeHandle {
        Arc::new(LiveNode::Scalar(Scalar::Float(value)))
    }

    pub fn bool(value: bool) -> NodeHandle {
        Arc::new(LiveNode::Scalar(Scalar::Bool(value)))
    }

    pub fn sequence(items: Vec<NodeHandle>) -> NodeHandle {
        Arc::new(LiveNode::Sequence(items))
    }

    pub fn mapping(entries: Vec<(NodeHandle, NodeHandle)>) -> NodeHandle {
        Arc::new(LiveNode::Mapping(entries))
    }

    pub fn opaque(description: impl Into<String>) -> NodeHandle {
        Arc::new(LiveNode::Opaque(description.into()))
    }

    /// Build a record; the concrete `Arc` is returned so fields can be set later
    pub fn record<I, S>(type_info: &Arc<TypeInfo>, fields: I) -> Arc<LiveNode>
    where
        I: IntoIterator<Item = (S, NodeHandle)>,
        S: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();
        Arc::new(LiveNode::Record(Record {
            type_info: Arc::clone(type_info),
            fields: RwLock::new(fields),
        }))
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            LiveNode::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl Introspect for LiveNode {
    fn shape(&self) -> Shape<'_> {
        match self {
            LiveNode::Scalar(scalar) => Shape::Scalar(scalar),
            LiveNode::Sequence(items) => Shape::Sequence(items),
            LiveNode::Mapping(entries) => Shape::Mapping(entries),
            LiveNode::Record(_) => Shape::Record,
            LiveNode::Opaque(_) => Shape::Opaque,
        }
    }

    fn type_info(&self) -> Option<&TypeInfo> {
        self.as_record().map(|record| record.type_info.as_ref())
    }

    fn fields(&self) -> Result<Vec<(String, NodeHandle)>, IntrospectError> {
        let Some(record) = self.as_record() else {
            return Ok(Vec::new());
        };
        let fields = record
            .fields
            .read()
            .map_err(|_| IntrospectError::Poisoned(record.type_info.name.clone()))?;
        Ok(fields.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for LiveNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiveNode::Scalar(scalar) => write!(f, "{scalar:?}"),
            LiveNode::Sequence(items) => write!(f, "Sequence(len={})", items.len()),
            LiveNode::Mapping(entries) => write!(f, "Mapping(len={})", entries.len()),
            LiveNode::Record(record) => write!(f, "Record({})", record.type_info),
            LiveNode::Opaque(description) => write!(f, "Opaque({description})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_info_hierarchy() {
        let base = TypeInfo::new("com.example.assets.density.DensityAsset");
        let child = TypeInfo::with_parent("com.example.assets.density.ConstantDensityAsset", &base);

        assert_eq!(child.simple_name(), "ConstantDensityAsset");
        assert!(child.is_or_extends("com.example.assets.density.DensityAsset"));
        assert!(!base.is_or_extends(child.name()));
        assert!(child.in_namespace("com.example.assets."));
        assert_eq!(TypeInfo::new("Outer$Inner").simple_name(), "Inner");
    }

    #[test]
    fn test_record_field_access() {
        let ty = TypeInfo::new("demo.Node");
        let node = LiveNode::record(&ty, [("name", LiveNode::string("alpha"))]);
        node.as_record().unwrap().set("count", LiveNode::int(3)).unwrap();
        node.as_record().unwrap().set("name", LiveNode::string("beta")).unwrap();

        let name = field(node.as_ref(), "name").unwrap();
        assert_eq!(text(name.as_ref()).as_deref(), Some("beta"));
        let count = field(node.as_ref(), "count").unwrap();
        assert_eq!(text(count.as_ref()).as_deref(), Some("3"));
        assert!(field(node.as_ref(), "missing").is_none());
        assert_eq!(node.type_info().unwrap().simple_name(), "Node");
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(Scalar::Null.as_text(), None);
        assert_eq!(Scalar::Bool(true).as_text().as_deref(), Some("true"));
        assert_eq!(Scalar::Str("x".into()).as_text().as_deref(), Some("x"));
    }
}
