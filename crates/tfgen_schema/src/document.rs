//! Serialized form of provider schema documents.
//!
//! Documents are YAML or JSON:
//!
//! ```yaml
//! provider: azurerm
//! resources:
//!   azurerm_resource_group:
//!     kind: record
//!     required:
//!       name: { kind: string }
//!       location: { kind: string }
//!     optional:
//!       tags: { kind: dictionary, value: { kind: string } }
//! ```

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::SchemaError;
use crate::node::{RecordFields, RenderMarker, ScalarKind, SchemaNode, SchemaShape};

/// One provider's resource and data-source schemas.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderDocument {
    pub provider: String,
    #[serde(default)]
    pub resources: IndexMap<String, SchemaNode>,
    #[serde(default)]
    pub data_sources: IndexMap<String, SchemaNode>,
}

/// Wire form of a [`SchemaNode`].
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct NodeDocument {
    #[serde(flatten)]
    kind: KindDocument,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    marker: Option<RenderMarker>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum KindDocument {
    String,
    Boolean,
    Number,
    List {
        element: Box<SchemaNode>,
    },
    Dictionary {
        value: Box<SchemaNode>,
    },
    Record {
        #[serde(default)]
        required: IndexMap<String, SchemaNode>,
        #[serde(default)]
        optional: IndexMap<String, SchemaNode>,
    },
    Union {
        alternatives: Vec<SchemaNode>,
    },
}

impl TryFrom<NodeDocument> for SchemaNode {
    type Error = SchemaError;

    fn try_from(doc: NodeDocument) -> Result<Self, Self::Error> {
        let shape = match doc.kind {
            KindDocument::String => SchemaShape::Scalar(ScalarKind::String),
            KindDocument::Boolean => SchemaShape::Scalar(ScalarKind::Boolean),
            KindDocument::Number => SchemaShape::Scalar(ScalarKind::Number),
            KindDocument::List { element } => SchemaShape::List(element),
            KindDocument::Dictionary { value } => SchemaShape::Dictionary(value),
            KindDocument::Record { required, optional } => {
                SchemaShape::Record(RecordFields::composed(required, optional))
            }
            KindDocument::Union { alternatives } => {
                if alternatives.is_empty() {
                    return Err(SchemaError::InvalidNode(format!(
                        "union {} has no alternatives",
                        doc.name.as_deref().unwrap_or("<unnamed>")
                    )));
                }
                SchemaShape::Union(alternatives)
            }
        };

        // An explicit marker wins over the marker implied by the name.
        let marker = doc
            .marker
            .or_else(|| doc.name.as_deref().map(RenderMarker::from_name))
            .unwrap_or_default();

        let mut node = SchemaNode::new(shape).with_marker(marker);
        if let Some(name) = doc.name {
            node = node.named(name);
        }
        Ok(node)
    }
}
