//! Schema registry: every provider's resource and data-source schemas.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::document::ProviderDocument;
use crate::error::{SchemaError, SchemaResult};
use crate::node::{RenderMarker, SchemaNode, SchemaShape};

/// Whether a declaration is a managed resource or a read-only data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Resource,
    DataSource,
}

impl EntityKind {
    /// Keyword opening a stanza of this kind.
    pub fn keyword(&self) -> &'static str {
        match self {
            EntityKind::Resource => "resource",
            EntityKind::DataSource => "data",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Resource => "resource",
            EntityKind::DataSource => "data source",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A registered resource or data-source type.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredType {
    pub provider: String,
    pub schema: SchemaNode,
}

/// Immutable lookup table from type names to record schemas.
///
/// Built once at startup and then shared by reference with the module
/// compiler and render engine.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    resources: IndexMap<String, RegisteredType>,
    data_sources: IndexMap<String, RegisteredType>,
}

impl SchemaRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type.
    ///
    /// The schema must be a record. A record without a marker is treated as
    /// a resource body so that it renders with braces.
    pub fn register(
        &mut self,
        kind: EntityKind,
        provider: impl Into<String>,
        type_name: impl Into<String>,
        schema: SchemaNode,
    ) -> SchemaResult<()> {
        let provider = provider.into();
        let type_name = type_name.into();

        if !matches!(schema.shape(), SchemaShape::Record(_)) {
            return Err(SchemaError::NotARecord {
                kind: kind.label(),
                type_name,
                found: schema.kind_name(),
            });
        }

        let schema = if schema.marker() == RenderMarker::None {
            schema.resource()
        } else {
            schema
        };

        let table = self.table_mut(kind);
        if let Some(existing) = table.get(&type_name) {
            return Err(SchemaError::DuplicateType {
                kind: kind.label(),
                type_name,
                first: existing.provider.clone(),
                second: provider,
            });
        }

        debug!("Registering {} type {} from {}", kind, type_name, provider);
        table.insert(type_name, RegisteredType { provider, schema });
        Ok(())
    }

    /// Register every type declared by a provider document.
    pub fn register_provider(&mut self, document: ProviderDocument) -> SchemaResult<()> {
        let ProviderDocument {
            provider,
            resources,
            data_sources,
        } = document;

        for (type_name, schema) in resources {
            self.register(EntityKind::Resource, provider.as_str(), type_name, schema)?;
        }
        for (type_name, schema) in data_sources {
            self.register(EntityKind::DataSource, provider.as_str(), type_name, schema)?;
        }
        Ok(())
    }

    /// Load a registry from a schema document or a directory of documents.
    ///
    /// Directories are walked recursively in sorted path order; files with a
    /// `.yaml`, `.yml` or `.json` extension are loaded.
    pub fn load(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SchemaError::NotFound(path.to_path_buf()));
        }

        let mut registry = Self::new();
        for file in Self::document_files(path)? {
            let document = Self::read_document(&file)?;
            debug!("Loaded provider {} from {:?}", document.provider, file);
            registry.register_provider(document)?;
        }

        info!(
            "Schema registry loaded: {} resource types, {} data source types",
            registry.resources.len(),
            registry.data_sources.len()
        );
        Ok(registry)
    }

    /// Parse a single YAML (or JSON) provider document.
    pub fn from_yaml_str(content: &str) -> SchemaResult<Self> {
        let document: ProviderDocument = serde_yaml::from_str(content)?;
        let mut registry = Self::new();
        registry.register_provider(document)?;
        Ok(registry)
    }

    fn document_files(path: &Path) -> SchemaResult<Vec<PathBuf>> {
        if path.is_file() {
            return Ok(vec![path.to_path_buf()]);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            let is_document = entry
                .path()
                .extension()
                .map_or(false, |ext| ext == "yaml" || ext == "yml" || ext == "json");
            if entry.file_type().is_file() && is_document {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn read_document(path: &Path) -> SchemaResult<ProviderDocument> {
        let content = fs::read_to_string(path)?;
        let parsed = if path.extension().map_or(false, |ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| SchemaError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    fn table(&self, kind: EntityKind) -> &IndexMap<String, RegisteredType> {
        match kind {
            EntityKind::Resource => &self.resources,
            EntityKind::DataSource => &self.data_sources,
        }
    }

    fn table_mut(&mut self, kind: EntityKind) -> &mut IndexMap<String, RegisteredType> {
        match kind {
            EntityKind::Resource => &mut self.resources,
            EntityKind::DataSource => &mut self.data_sources,
        }
    }

    /// Get the record schema of a type.
    pub fn get(&self, kind: EntityKind, type_name: &str) -> Option<&SchemaNode> {
        self.table(kind).get(type_name).map(|t| &t.schema)
    }

    pub fn resource(&self, type_name: &str) -> Option<&SchemaNode> {
        self.get(EntityKind::Resource, type_name)
    }

    pub fn data_source(&self, type_name: &str) -> Option<&SchemaNode> {
        self.get(EntityKind::DataSource, type_name)
    }

    pub fn contains(&self, kind: EntityKind, type_name: &str) -> bool {
        self.table(kind).contains_key(type_name)
    }

    /// Provider that declared a type.
    pub fn provider_of(&self, kind: EntityKind, type_name: &str) -> Option<&str> {
        self.table(kind).get(type_name).map(|t| t.provider.as_str())
    }

    /// Registered types of one kind, in registration order.
    pub fn types(&self, kind: EntityKind) -> impl Iterator<Item = (&str, &RegisteredType)> {
        self.table(kind).iter().map(|(name, t)| (name.as_str(), t))
    }

    /// Names of all providers, in registration order.
    pub fn providers(&self) -> Vec<&str> {
        let mut providers: Vec<&str> = Vec::new();
        for t in self.resources.values().chain(self.data_sources.values()) {
            if !providers.contains(&t.provider.as_str()) {
                providers.push(&t.provider);
            }
        }
        providers
    }

    pub fn len(&self) -> usize {
        self.resources.len() + self.data_sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.data_sources.is_empty()
    }
}
