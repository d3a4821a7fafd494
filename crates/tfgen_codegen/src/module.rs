//! Module compilation: one module configuration into resource and data-source text.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use tfgen_schema::{EntityKind, SchemaRegistry};

use crate::error::{CodegenError, CodegenResult};
use crate::render::{FieldPath, Renderer};

/// Declarations of one kind: type name to instance name to configuration value.
pub type DeclarationMap = IndexMap<String, IndexMap<String, Value>>;

/// One self-contained unit of configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleConfig {
    /// Name used in diagnostics. Loaders default it to the source path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Prepended to every resource and data-source name of the module.
    pub prefix: String,
    pub resources: DeclarationMap,
    #[serde(alias = "dataSources")]
    pub data_sources: DeclarationMap,
}

impl ModuleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Declare a resource instance.
    pub fn with_resource(
        mut self,
        type_name: impl Into<String>,
        name: impl Into<String>,
        value: Value,
    ) -> Self {
        self.resources
            .entry(type_name.into())
            .or_default()
            .insert(name.into(), value);
        self
    }

    /// Declare a data-source instance.
    pub fn with_data_source(
        mut self,
        type_name: impl Into<String>,
        name: impl Into<String>,
        value: Value,
    ) -> Self {
        self.data_sources
            .entry(type_name.into())
            .or_default()
            .insert(name.into(), value);
        self
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    /// Address of an instance inside this module.
    pub fn address(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    pub fn declarations(&self, kind: EntityKind) -> &DeclarationMap {
        match kind {
            EntityKind::Resource => &self.resources,
            EntityKind::DataSource => &self.data_sources,
        }
    }

    /// Number of declared instances of one kind.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.declarations(kind).values().map(|i| i.len()).sum()
    }
}

/// Generated text of one module.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodeGenOutput {
    pub resources_text: String,
    pub data_sources_text: String,
}

/// Compiles modules against a schema registry.
#[derive(Clone)]
pub struct ModuleCompiler<'a> {
    registry: &'a SchemaRegistry,
    renderer: Renderer,
}

impl<'a> ModuleCompiler<'a> {
    pub fn new(registry: &'a SchemaRegistry, renderer: Renderer) -> Self {
        Self { registry, renderer }
    }

    pub fn registry(&self) -> &'a SchemaRegistry {
        self.registry
    }

    /// Compile a module.
    ///
    /// Companion data sources produced while rendering follow the module's
    /// declared data sources.
    pub fn compile(&self, module: &ModuleConfig) -> CodegenResult<CodeGenOutput> {
        debug!("Compiling module {}", module.label());

        let mut companions = Vec::new();
        let resources = self.compile_kind(module, EntityKind::Resource, &mut companions)?;
        let mut data_sources = self.compile_kind(module, EntityKind::DataSource, &mut companions)?;
        data_sources.extend(companions);

        let output = CodeGenOutput {
            resources_text: join_stanzas(&resources),
            data_sources_text: join_stanzas(&data_sources),
        };
        debug!(
            "Compiled module {}: {} resource stanzas, {} data source stanzas",
            module.label(),
            resources.len(),
            data_sources.len()
        );
        Ok(output)
    }

    fn compile_kind(
        &self,
        module: &ModuleConfig,
        kind: EntityKind,
        companions: &mut Vec<String>,
    ) -> CodegenResult<Vec<String>> {
        let mut stanzas = Vec::new();
        for (type_name, instances) in module.declarations(kind) {
            let schema = self.registry.get(kind, type_name).ok_or_else(|| {
                CodegenError::UndeclaredResourceType {
                    kind: kind.label(),
                    type_name: type_name.clone(),
                    module: module.label().to_string(),
                }
            })?;

            for (name, value) in instances {
                let address = module.address(name);
                let path = FieldPath::root(format!("{}.{}", type_name, address));
                let rendered = self.renderer.render_at(type_name, schema, value, &path)?;
                stanzas.push(format!(
                    "{} \"{}\" \"{}\" {}",
                    kind.keyword(),
                    type_name,
                    address,
                    rendered.text
                ));
                companions.extend(rendered.companions);
            }
        }
        Ok(stanzas)
    }
}

/// Join stanzas with a blank line between them, dropping empty ones.
///
/// Non-empty output ends with a newline.
pub fn join_stanzas<S: AsRef<str>>(stanzas: &[S]) -> String {
    let parts: Vec<&str> = stanzas
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        return String::new();
    }
    let mut text = parts.join("\n\n");
    text.push('\n');
    text
}
