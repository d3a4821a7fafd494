//! # tfgen_schema
//!
//! Schema model for tfgen.
//!
//! Providers describe the shape of their resources and data sources as trees
//! of [`SchemaNode`]s. All providers' schemas are collected into one immutable
//! [`SchemaRegistry`], built once per process and passed by reference to the
//! code generator.
//!
//! ## Example
//!
//! ```rust
//! use tfgen_schema::{EntityKind, RenderMarker, SchemaNode, SchemaRegistry};
//!
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .register(
//!         EntityKind::Resource,
//!         "acme",
//!         "acme_widget",
//!         SchemaNode::record_of([("name", SchemaNode::string())]),
//!     )
//!     .unwrap();
//!
//! let widget = registry.resource("acme_widget").unwrap();
//! assert_eq!(widget.marker(), RenderMarker::Resource);
//! ```

pub mod document;
pub mod error;
pub mod node;
pub mod registry;

pub use document::ProviderDocument;
pub use error::{SchemaError, SchemaResult};
pub use node::{
    RecordFields, RenderMarker, ScalarKind, SchemaNode, SchemaShape, BLOCK_SCHEMA_NAME,
    RESOURCE_SCHEMA_NAME,
};
pub use registry::{EntityKind, RegisteredType, SchemaRegistry};
