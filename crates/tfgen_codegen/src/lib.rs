//! # tfgen_codegen
//!
//! Schema-driven Terraform code generation.
//!
//! Configuration values are rendered against their provider schemas into
//! `resource` and `data` stanzas. Modules are compiled independently, then
//! aggregated in the order they were supplied into four artifacts:
//! `resources.tf`, `data_sources.tf` and their JSON manifests.
//!
//! ## Features
//!
//! - Recursive rendering of strings, numbers, booleans, lists, maps, records
//!   and nested blocks with aligned attribute keys
//! - Provider-specific union resolution through [`ProviderResolver`]
//! - Parallel module compilation with deterministic output order
//! - Write-if-changed artifact persistence
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use tfgen_codegen::{ModuleCompiler, ModuleConfig, Renderer, ResolverChain};
//! use tfgen_schema::{EntityKind, SchemaNode, SchemaRegistry};
//!
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .register(
//!         EntityKind::Resource,
//!         "acme",
//!         "widget",
//!         SchemaNode::record_of([("name", SchemaNode::string())]),
//!     )
//!     .unwrap();
//!
//! let compiler = ModuleCompiler::new(&registry, Renderer::new(Arc::new(ResolverChain::default())));
//! let module = ModuleConfig::new()
//!     .with_prefix("env1_")
//!     .with_resource("widget", "a", json!({"name": "foo"}));
//!
//! let output = compiler.compile(&module).unwrap();
//! assert_eq!(output.resources_text, "resource \"widget\" \"env1_a\" {\n  name = \"foo\"\n}\n");
//! ```

pub mod aggregate;
pub mod artifacts;
pub mod config;
pub mod error;
pub mod module;
pub mod render;
pub mod resolver;

pub use aggregate::{AggregateOutput, Aggregator, CollisionPolicy, Manifest};
pub use artifacts::{Artifact, ArtifactStatus, ArtifactWriter, WriteReport};
pub use config::{ModuleLoader, ProjectConfig, DEFAULT_CONFIG_FILE};
pub use error::{CodegenError, CodegenResult};
pub use module::{join_stanzas, CodeGenOutput, DeclarationMap, ModuleCompiler, ModuleConfig};
pub use render::{
    escape_interpolation, format_number, AttributeObjectSyntax, FieldPath, RenderOptions,
    Rendered, Renderer, MAX_RESOLUTION_DEPTH,
};
pub use resolver::{ProviderResolver, Resolution, ResolverChain, StructuralResolver, EXPRESSION_KEY};
