//! Codec Graphs
//!
//! A codec is the encode/decode descriptor of one value type. Codecs nest:
//! builder codecs layer over a parent and own one codec per (field, version),
//! codec maps dispatch on a discriminator id, wrappers (arrays, maps, keyed
//! codecs) hold child codecs, and deferred codecs are bound after
//! construction so recursive types can refer to themselves.
//!
//! [`CodecGraphCollector`] walks these graphs with the generic
//! [`GraphWalker`] and extracts one [`EnumDescriptor`] per enum type. The
//! descriptors end up in an [`EnumCatalog`] that the classifier consults to
//! canonicalize literal enum values.

use std::any::Any;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::walker::{GraphWalker, NodeIdentity, Visit};
use super::{Introspect, IntrospectError, NodeHandle, Shape};

/// Shared codec handle
pub type CodecRef = Arc<Codec>;

/// Separator used to join canonical values into one catalog signature
pub const SIGNATURE_SEPARATOR: char = '\u{1F}';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("{enum_type} has no constant {constant}")]
    UnknownConstant { enum_type: String, constant: String },

    #[error("{enum_type} has no key for constant {constant}")]
    MissingKey { enum_type: String, constant: String },
}

// ============================================================================
// Codec model
// ============================================================================

pub enum Codec {
    /// Leaf codec for strings, numbers and the like
    Primitive(String),
    Enum(EnumCodec),
    Builder(BuilderCodec),
    CodecMap(CodecMapCodec),
    Wrapper(WrapperCodec),
    Deferred(DeferredCodec),
}

impl Codec {
    pub fn primitive(type_name: impl Into<String>) -> CodecRef {
        Arc::new(Codec::Primitive(type_name.into()))
    }

    pub fn type_name(&self) -> &str {
        match self {
            Codec::Primitive(name) => name,
            Codec::Enum(codec) => &codec.enum_type,
            Codec::Builder(codec) => &codec.type_name,
            Codec::CodecMap(codec) => &codec.type_name,
            Codec::Wrapper(codec) => &codec.type_name,
            Codec::Deferred(codec) => &codec.type_name,
        }
    }

    /// Child codecs, in walk order
    fn children(&self) -> Result<Vec<(String, CodecRef)>, IntrospectError> {
        match self {
            Codec::Primitive(_) | Codec::Enum(_) => Ok(Vec::new()),
            Codec::Builder(builder) => {
                let mut children = Vec::new();
                if let Some(parent) = &builder.parent {
                    children.push(("parent".to_string(), Arc::clone(parent)));
                }
                for (name, versions) in &builder.fields {
                    let mut versions: Vec<&BuilderField> = versions.iter().collect();
                    versions.sort_by_key(|field| field.min_version);
                    for field in versions {
                        children.push((name.clone(), Arc::clone(&field.codec)));
                    }
                }
                Ok(children)
            }
            Codec::CodecMap(map) => {
                let mut children: Vec<(String, CodecRef)> = map
                    .variants
                    .iter()
                    .map(|(id, codec)| (id.clone(), Arc::clone(codec)))
                    .collect();
                if let Some(default) = &map.default {
                    children.push(("default".to_string(), Arc::clone(default)));
                }
                Ok(children)
            }
            Codec::Wrapper(wrapper) => Ok(wrapper
                .children
                .iter()
                .enumerate()
                .map(|(i, codec)| (i.to_string(), Arc::clone(codec)))
                .collect()),
            Codec::Deferred(deferred) => match deferred.target.get() {
                Some(target) => Ok(vec![("target".to_string(), Arc::clone(target))]),
                None => Err(IntrospectError::Unbound(deferred.type_name.clone())),
            },
        }
    }
}

impl Introspect for Codec {
    fn shape(&self) -> Shape<'_> {
        Shape::Record
    }

    fn fields(&self) -> Result<Vec<(String, NodeHandle)>, IntrospectError> {
        Ok(self
            .children()?
            .into_iter()
            .map(|(name, codec)| (name, codec as NodeHandle))
            .collect())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Codec::Primitive(_) => "Primitive",
            Codec::Enum(_) => "Enum",
            Codec::Builder(_) => "Builder",
            Codec::CodecMap(_) => "CodecMap",
            Codec::Wrapper(_) => "Wrapper",
            Codec::Deferred(_) => "Deferred",
        };
        write!(f, "{}({})", kind, self.type_name())
    }
}

/// One versioned field of a builder codec
pub struct BuilderField {
    pub min_version: i32,
    pub codec: CodecRef,
}

/// Layered record codec
pub struct BuilderCodec {
    type_name: String,
    parent: Option<CodecRef>,
    fields: BTreeMap<String, Vec<BuilderField>>,
}

impl BuilderCodec {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            parent: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn parent(mut self, parent: CodecRef) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn field(mut self, name: impl Into<String>, min_version: i32, codec: CodecRef) -> Self {
        self.fields
            .entry(name.into())
            .or_default()
            .push(BuilderField { min_version, codec });
        self
    }

    pub fn build(self) -> CodecRef {
        Arc::new(Codec::Builder(self))
    }
}

/// Tagged union codec keyed by discriminator id
pub struct CodecMapCodec {
    type_name: String,
    variants: BTreeMap<String, CodecRef>,
    default: Option<CodecRef>,
}

impl CodecMapCodec {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            variants: BTreeMap::new(),
            default: None,
        }
    }

    pub fn variant(mut self, id: impl Into<String>, codec: CodecRef) -> Self {
        self.variants.insert(id.into(), codec);
        self
    }

    pub fn default_variant(mut self, codec: CodecRef) -> Self {
        self.default = Some(codec);
        self
    }

    pub fn build(self) -> CodecRef {
        Arc::new(Codec::CodecMap(self))
    }
}

/// Array, map and keyed codecs: anything that just holds child codecs
pub struct WrapperCodec {
    type_name: String,
    children: Vec<CodecRef>,
}

impl WrapperCodec {
    pub fn new(type_name: impl Into<String>, children: Vec<CodecRef>) -> CodecRef {
        Arc::new(Codec::Wrapper(Self {
            type_name: type_name.into(),
            children,
        }))
    }
}

/// Late-bound codec used to tie recursive codecs together
pub struct DeferredCodec {
    type_name: String,
    target: OnceLock<CodecRef>,
}

impl DeferredCodec {
    pub fn new(type_name: impl Into<String>) -> CodecRef {
        Arc::new(Codec::Deferred(Self {
            type_name: type_name.into(),
            target: OnceLock::new(),
        }))
    }

    /// Bind the target; returns false if `codec` is not deferred or already bound
    pub fn bind(codec: &CodecRef, target: CodecRef) -> bool {
        match codec.as_ref() {
            Codec::Deferred(deferred) => deferred.target.set(target).is_ok(),
            _ => false,
        }
    }
}

// ============================================================================
// Enums
// ============================================================================

/// How an enum codec spells its constants on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnumStyle {
    /// PascalCase keys
    CamelCase,
    /// Raw constant names, decoded case-insensitively
    Legacy,
}

impl fmt::Display for EnumStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumStyle::CamelCase => f.write_str("CAMEL_CASE"),
            EnumStyle::Legacy => f.write_str("LEGACY"),
        }
    }
}

pub struct EnumCodec {
    enum_type: String,
    style: EnumStyle,
    constants: Vec<String>,
    keys: Vec<String>,
}

impl EnumCodec {
    /// Enum codec whose keys are the PascalCase forms of the constant names
    pub fn new<I, S>(enum_type: impl Into<String>, style: EnumStyle, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let constants: Vec<String> = constants.into_iter().map(Into::into).collect();
        let keys = constants.iter().map(|c| to_pascal_case(c)).collect();
        Self {
            enum_type: enum_type.into(),
            style,
            constants,
            keys,
        }
    }

    /// Override the schema keys; a shorter list leaves trailing constants keyless
    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> CodecRef {
        Arc::new(Codec::Enum(self))
    }

    pub fn encode(&self, constant: &str) -> Result<Value, CodecError> {
        let index = self
            .constants
            .iter()
            .position(|c| c == constant)
            .ok_or_else(|| CodecError::UnknownConstant {
                enum_type: self.enum_type.clone(),
                constant: constant.to_string(),
            })?;

        match self.style {
            EnumStyle::Legacy => Ok(Value::String(constant.to_string())),
            EnumStyle::CamelCase => self
                .keys
                .get(index)
                .map(|key| Value::String(key.clone()))
                .ok_or_else(|| CodecError::MissingKey {
                    enum_type: self.enum_type.clone(),
                    constant: constant.to_string(),
                }),
        }
    }

    /// Build the descriptor, encoding every constant on the way
    pub fn describe(&self) -> EnumDescriptor {
        let mut serialized_values = Vec::new();
        let mut canonical_values = Vec::new();
        let mut accepted = Accepted::default();

        for (i, constant) in self.constants.iter().enumerate() {
            if self.style == EnumStyle::Legacy {
                accepted.push(constant);
            }

            match self.encode(constant) {
                Ok(Value::String(encoded)) => {
                    accepted.push(&encoded);
                    serialized_values.push(encoded);
                }
                Ok(_) => {}
                Err(e) => debug!("Enum constant not encodable: {}", e),
            }

            if let Some(key) = self.keys.get(i) {
                accepted.push(key);
                canonical_values.push(key.clone());
            }
        }

        EnumDescriptor {
            enum_simple_name: simple_name(&self.enum_type).to_string(),
            enum_type: self.enum_type.clone(),
            style: self.style,
            constant_names: self.constants.clone(),
            serialized_values,
            canonical_values,
            accepted_values: accepted.values,
            decode_case_insensitive: self.style == EnumStyle::Legacy,
        }
    }
}

#[derive(Default)]
struct Accepted {
    seen: HashSet<String>,
    values: Vec<String>,
}

impl Accepted {
    fn push(&mut self, value: &str) {
        if self.seen.insert(value.to_string()) {
            self.values.push(value.to_string());
        }
    }
}

fn simple_name(type_name: &str) -> &str {
    type_name
        .rsplit(|c| c == '.' || c == '$')
        .next()
        .unwrap_or(type_name)
}

/// Convert a constant name to PascalCase (`STONE_BRICK` -> `StoneBrick`)
pub fn to_pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = true;
    let is_all_caps = s
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-');

    for c in s.chars() {
        if c == '_' || c == '-' || c == ' ' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else if is_all_caps {
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Everything known about one enum type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumDescriptor {
    pub enum_type: String,
    pub enum_simple_name: String,
    pub style: EnumStyle,
    pub constant_names: Vec<String>,
    /// Wire form of each constant that encoded to a string
    pub serialized_values: Vec<String>,
    /// Schema keys, in constant order
    pub canonical_values: Vec<String>,
    /// Every literal the decoder accepts, first spelling first
    pub accepted_values: Vec<String>,
    pub decode_case_insensitive: bool,
}

// ============================================================================
// Catalog
// ============================================================================

/// Signature of an ordered value list, or `None` if it cannot be keyed
pub fn signature(values: &[String]) -> Option<String> {
    if values.is_empty() || values.iter().any(|v| v.contains(SIGNATURE_SEPARATOR)) {
        return None;
    }
    let mut joined = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            joined.push(SIGNATURE_SEPARATOR);
        }
        joined.push_str(value);
    }
    Some(joined)
}

/// Value lists a descriptor is keyed by, in registration priority
fn signature_sources(descriptor: &EnumDescriptor) -> [&[String]; 3] {
    [
        &descriptor.canonical_values,
        &descriptor.serialized_values,
        &descriptor.constant_names,
    ]
}

/// Enum descriptors keyed by value signature
#[derive(Debug, Default, Clone)]
pub struct EnumCatalog {
    descriptors: Vec<EnumDescriptor>,
    by_signature: HashMap<String, usize>,
}

impl EnumCatalog {
    /// Build a catalog from descriptors in declaring-type order.
    ///
    /// Every descriptor is keyed by its canonical values. Serialized values
    /// and then constant names are registered as secondary signatures, so a
    /// schema that spells the enum in wire or constant form still finds it.
    /// On any collision the earlier registration wins.
    pub fn from_descriptors<I>(descriptors: I) -> Self
    where
        I: IntoIterator<Item = EnumDescriptor>,
    {
        let descriptors: Vec<EnumDescriptor> = descriptors
            .into_iter()
            .filter(|d| signature(&d.canonical_values).is_some())
            .collect();

        let mut by_signature = HashMap::new();
        for pass in 0..3 {
            for (i, descriptor) in descriptors.iter().enumerate() {
                let Some(key) = signature(signature_sources(descriptor)[pass]) else {
                    continue;
                };
                match by_signature.entry(key) {
                    Entry::Vacant(slot) => {
                        slot.insert(i);
                    }
                    Entry::Occupied(slot) if pass == 0 && *slot.get() != i => {
                        debug!(
                            "Enum signature collision: {} shadowed by {}",
                            descriptor.enum_type,
                            descriptors[*slot.get()].enum_type
                        );
                    }
                    Entry::Occupied(_) => {}
                }
            }
        }

        Self {
            descriptors,
            by_signature,
        }
    }

    pub fn lookup(&self, values: &[String]) -> Option<&EnumDescriptor> {
        let key = signature(values)?;
        self.by_signature
            .get(&key)
            .map(|&i| &self.descriptors[i])
    }

    pub fn descriptors(&self) -> &[EnumDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

// ============================================================================
// Collector
// ============================================================================

/// Walks codec graphs, assigning ids and gathering enum descriptors
#[derive(Default)]
pub struct CodecGraphCollector {
    walker: GraphWalker,
    ids: HashMap<NodeIdentity, String>,
    enums: BTreeMap<String, EnumDescriptor>,
}

impl CodecGraphCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk one root codec; returns its id
    pub fn collect(&mut self, codec: &CodecRef) -> String {
        let root: NodeHandle = Arc::clone(codec) as NodeHandle;
        let Self { walker, ids, enums } = self;

        walker.walk(&root, |node| {
            let id = format!("c{}", ids.len() + 1);
            ids.entry(NodeIdentity::of(node)).or_insert(id);
            if let Some(Codec::Enum(enum_codec)) = node.as_any().downcast_ref::<Codec>() {
                enums
                    .entry(enum_codec.enum_type.clone())
                    .or_insert_with(|| enum_codec.describe());
            }
            Visit::Descend
        });

        self.id_of(codec).unwrap_or_default().to_string()
    }

    pub fn id_of(&self, codec: &CodecRef) -> Option<&str> {
        self.ids.get(&NodeIdentity::of(codec)).map(String::as_str)
    }

    pub fn codec_count(&self) -> usize {
        self.ids.len()
    }

    /// Descriptors in declaring-type order
    pub fn enum_descriptors(&self) -> impl Iterator<Item = &EnumDescriptor> {
        self.enums.values()
    }

    pub fn into_catalog(self) -> EnumCatalog {
        EnumCatalog::from_descriptors(self.enums.into_values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_enum_encode_styles() {
        let camel = EnumCodec::new("demo.Rotation", EnumStyle::CamelCase, ["NONE", "CLOCKWISE_90"]);
        assert_eq!(camel.encode("CLOCKWISE_90").unwrap(), Value::String("Clockwise90".into()));
        assert!(matches!(
            camel.encode("SIDEWAYS"),
            Err(CodecError::UnknownConstant { .. })
        ));

        let legacy = EnumCodec::new("demo.Rotation", EnumStyle::Legacy, ["NONE"]);
        assert_eq!(legacy.encode("NONE").unwrap(), Value::String("NONE".into()));
    }

    #[test]
    fn test_describe_orders_accepted_literals() {
        let legacy = EnumCodec::new("demo.Mode", EnumStyle::Legacy, ["FAST", "SLOW"]);
        let descriptor = legacy.describe();
        assert_eq!(descriptor.enum_simple_name, "Mode");
        assert_eq!(descriptor.canonical_values, strings(&["Fast", "Slow"]));
        assert_eq!(descriptor.serialized_values, strings(&["FAST", "SLOW"]));
        assert_eq!(descriptor.accepted_values, strings(&["FAST", "Fast", "SLOW", "Slow"]));
        assert!(descriptor.decode_case_insensitive);

        let camel = EnumCodec::new("demo.Mode", EnumStyle::CamelCase, ["FAST", "SLOW"]);
        let descriptor = camel.describe();
        assert_eq!(descriptor.accepted_values, strings(&["Fast", "Slow"]));
        assert!(!descriptor.decode_case_insensitive);
    }

    #[test]
    fn test_missing_keys_are_skipped() {
        let codec = EnumCodec::new("demo.Partial", EnumStyle::CamelCase, ["A", "B"]).with_keys(["A"]);
        let descriptor = codec.describe();
        assert_eq!(descriptor.canonical_values, strings(&["A"]));
        assert_eq!(descriptor.serialized_values, strings(&["A"]));
    }

    #[test]
    fn test_collector_handles_recursive_codecs() {
        let mode = EnumCodec::new("demo.Mode", EnumStyle::CamelCase, ["ON", "OFF"]).build();
        let deferred = DeferredCodec::new("demo.Node");
        let node = BuilderCodec::new("demo.Node")
            .field("Mode", 1, mode.clone())
            .field("Children", 1, WrapperCodec::new("array", vec![deferred.clone()]))
            .build();
        assert!(DeferredCodec::bind(&deferred, node.clone()));
        assert!(!DeferredCodec::bind(&deferred, node.clone()));

        let mut collector = CodecGraphCollector::new();
        assert_eq!(collector.collect(&node), "c1");
        // node, array wrapper, deferred, mode
        assert_eq!(collector.codec_count(), 4);
        assert_eq!(collector.collect(&node), "c1");
        assert_eq!(collector.codec_count(), 4);

        let catalog = collector.into_catalog();
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.lookup(&strings(&["On", "Off"])).unwrap().enum_type,
            "demo.Mode"
        );
    }

    #[test]
    fn test_unbound_deferred_is_skipped() {
        let deferred = DeferredCodec::new("demo.Late");
        let map = CodecMapCodec::new("demo.Union")
            .variant("Late", deferred)
            .default_variant(Codec::primitive("string"))
            .build();

        let mut collector = CodecGraphCollector::new();
        collector.collect(&map);
        assert_eq!(collector.codec_count(), 3);
    }

    #[test]
    fn test_builder_children_follow_field_and_version_order() {
        let v2 = Codec::primitive("v2");
        let v1 = Codec::primitive("v1");
        let parent = Codec::primitive("parent");
        let builder = BuilderCodec::new("demo.Layered")
            .parent(parent.clone())
            .field("Zeta", 1, Codec::primitive("zeta"))
            .field("Alpha", 2, v2.clone())
            .field("Alpha", 1, v1.clone())
            .build();

        let mut collector = CodecGraphCollector::new();
        collector.collect(&builder);
        assert_eq!(collector.id_of(&parent), Some("c2"));
        assert_eq!(collector.id_of(&v1), Some("c3"));
        assert_eq!(collector.id_of(&v2), Some("c4"));
    }

    #[test]
    fn test_catalog_first_signature_wins() {
        let first = EnumCodec::new("demo.A", EnumStyle::CamelCase, ["X", "Y"]).describe();
        let second = EnumCodec::new("demo.B", EnumStyle::CamelCase, ["X", "Y"]).describe();
        let catalog = EnumCatalog::from_descriptors([first, second]);

        let found = catalog.lookup(&strings(&["X", "Y"])).unwrap();
        assert_eq!(found.enum_type, "demo.A");
        assert!(catalog.lookup(&strings(&["Y", "X"])).is_none());
    }

    #[test]
    fn test_signature_rejects_separator() {
        assert_eq!(signature(&strings(&["a", "b"])).unwrap(), "a\u{1F}b");
        assert!(signature(&strings(&["a\u{1F}b"])).is_none());
        assert!(signature(&[]).is_none());
    }
}
