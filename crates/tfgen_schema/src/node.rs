//! Schema node definitions.
//!
//! A [`SchemaNode`] describes the shape of one configuration value. Nodes are
//! built once (usually by deserializing provider schema documents) and are
//! read-only afterwards, so they can be shared freely between threads.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Node name that marks a block-shaped property.
pub const BLOCK_SCHEMA_NAME: &str = "BlockSchema";

/// Node name that marks a top-level resource or data-source body.
pub const RESOURCE_SCHEMA_NAME: &str = "ResourceSchema";

/// Syntax hint deciding between attribute and block syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMarker {
    #[default]
    None,
    /// Rendered as `key { ... }` inside an object body.
    Block,
    /// Rendered as the braced body of a `resource` or `data` stanza.
    Resource,
}

impl RenderMarker {
    /// Resolve the marker from a node's display name.
    pub fn from_name(name: &str) -> Self {
        match name {
            BLOCK_SCHEMA_NAME => RenderMarker::Block,
            RESOURCE_SCHEMA_NAME => RenderMarker::Resource,
            _ => RenderMarker::None,
        }
    }

    /// Whether object bodies with this marker are wrapped in braces.
    pub fn is_braced(&self) -> bool {
        matches!(self, RenderMarker::Block | RenderMarker::Resource)
    }
}

/// Scalar value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Boolean,
    Number,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Number => "number",
        }
    }
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fields of a record schema.
///
/// Records are composed from a required field set, an optional field set, or
/// both. When a name appears in both sets the optional declaration wins but
/// keeps the position of the required one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordFields {
    fields: IndexMap<String, SchemaNode>,
    required: IndexSet<String>,
}

impl RecordFields {
    /// Record whose fields are all required.
    pub fn required(fields: IndexMap<String, SchemaNode>) -> Self {
        Self::composed(fields, IndexMap::new())
    }

    /// Record whose fields are all optional.
    pub fn optional(fields: IndexMap<String, SchemaNode>) -> Self {
        Self::composed(IndexMap::new(), fields)
    }

    /// Record composed of required and optional fields.
    pub fn composed(
        required: IndexMap<String, SchemaNode>,
        optional: IndexMap<String, SchemaNode>,
    ) -> Self {
        let mut required_names: IndexSet<String> = required.keys().cloned().collect();
        let mut fields = required;
        for (name, schema) in optional {
            required_names.shift_remove(&name);
            fields.insert(name, schema);
        }
        Self {
            fields,
            required: required_names,
        }
    }

    /// Look up a field schema by name.
    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.fields.get(name)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }

    /// Iterate over fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.fields.iter().map(|(name, schema)| (name.as_str(), schema))
    }
}

/// The structural part of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaShape {
    Scalar(ScalarKind),
    List(Box<SchemaNode>),
    /// Map with arbitrary string keys; every value shares the given schema.
    Dictionary(Box<SchemaNode>),
    Record(RecordFields),
    /// Provider-specific value resolved at render time.
    Union(Vec<SchemaNode>),
}

/// Immutable description of a configuration value's shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "crate::document::NodeDocument")]
pub struct SchemaNode {
    shape: SchemaShape,
    marker: RenderMarker,
    name: Option<String>,
}

impl SchemaNode {
    pub fn new(shape: SchemaShape) -> Self {
        Self {
            shape,
            marker: RenderMarker::None,
            name: None,
        }
    }

    pub fn string() -> Self {
        Self::new(SchemaShape::Scalar(ScalarKind::String))
    }

    pub fn boolean() -> Self {
        Self::new(SchemaShape::Scalar(ScalarKind::Boolean))
    }

    pub fn number() -> Self {
        Self::new(SchemaShape::Scalar(ScalarKind::Number))
    }

    pub fn list(element: SchemaNode) -> Self {
        Self::new(SchemaShape::List(Box::new(element)))
    }

    pub fn dictionary(value: SchemaNode) -> Self {
        Self::new(SchemaShape::Dictionary(Box::new(value)))
    }

    pub fn record(fields: RecordFields) -> Self {
        Self::new(SchemaShape::Record(fields))
    }

    /// Record with only required fields, in the given order.
    pub fn record_of<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, SchemaNode)>,
        K: Into<String>,
    {
        let fields = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::record(RecordFields::required(fields))
    }

    pub fn union(alternatives: Vec<SchemaNode>) -> Self {
        Self::new(SchemaShape::Union(alternatives))
    }

    pub fn with_marker(mut self, marker: RenderMarker) -> Self {
        self.marker = marker;
        self
    }

    /// Mark the node as a block-shaped property.
    pub fn block(self) -> Self {
        self.with_marker(RenderMarker::Block)
    }

    /// Mark the node as a resource or data-source body.
    pub fn resource(self) -> Self {
        self.with_marker(RenderMarker::Resource)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn shape(&self) -> &SchemaShape {
        &self.shape
    }

    pub fn marker(&self) -> RenderMarker {
        self.marker
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_block(&self) -> bool {
        self.marker == RenderMarker::Block
    }

    /// Short name of the node kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match &self.shape {
            SchemaShape::Scalar(kind) => kind.as_str(),
            SchemaShape::List(_) => "list",
            SchemaShape::Dictionary(_) => "dictionary",
            SchemaShape::Record(_) => "record",
            SchemaShape::Union(_) => "union",
        }
    }

    /// Name for diagnostics: the declared name, or the kind name.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.kind_name())
    }

    /// The block schema this node expands to inside an object body.
    ///
    /// Returns the node itself when it is block-marked, the element schema
    /// when it is a list of block-marked elements, and `None` otherwise.
    pub fn block_schema(&self) -> Option<(&SchemaNode, bool)> {
        if self.is_block() {
            return Some((self, false));
        }
        match &self.shape {
            SchemaShape::List(element) if element.is_block() => Some((element, true)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> IndexMap<String, SchemaNode> {
        names
            .iter()
            .map(|n| (n.to_string(), SchemaNode::string()))
            .collect()
    }

    #[test]
    fn test_record_composition_keeps_required_order() {
        let mut optional = fields(&["tags"]);
        optional.insert("name".to_string(), SchemaNode::number());

        let record = RecordFields::composed(fields(&["name", "location"]), optional);

        let names: Vec<_> = record.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["name", "location", "tags"]);
        assert_eq!(record.get("name"), Some(&SchemaNode::number()));
        assert!(!record.is_required("name"));
        assert!(record.is_required("location"));
        assert!(!record.is_required("tags"));
    }

    #[test]
    fn test_block_schema_detection() {
        let rule = SchemaNode::record_of([("port", SchemaNode::number())]).block();

        let single = rule.clone();
        let (schema, repeated) = single.block_schema().unwrap();
        assert_eq!(schema, &rule);
        assert!(!repeated);

        let list = SchemaNode::list(rule.clone());
        let (schema, repeated) = list.block_schema().unwrap();
        assert_eq!(schema, &rule);
        assert!(repeated);

        assert!(SchemaNode::list(SchemaNode::string()).block_schema().is_none());
    }

    #[test]
    fn test_marker_from_name() {
        assert_eq!(RenderMarker::from_name(BLOCK_SCHEMA_NAME), RenderMarker::Block);
        assert_eq!(RenderMarker::from_name(RESOURCE_SCHEMA_NAME), RenderMarker::Resource);
        assert_eq!(RenderMarker::from_name("tags"), RenderMarker::None);
        assert!(RenderMarker::Resource.is_braced());
        assert!(!RenderMarker::None.is_braced());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(SchemaNode::boolean().display_name(), "boolean");
        assert_eq!(SchemaNode::boolean().named("enabled").display_name(), "enabled");
    }
}
