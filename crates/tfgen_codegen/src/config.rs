//! Project configuration and module document loading.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::aggregate::{Aggregator, CollisionPolicy};
use crate::error::{CodegenError, CodegenResult};
use crate::module::ModuleConfig;
use crate::render::{AttributeObjectSyntax, RenderOptions};

/// Default project file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tfgen.yaml";

/// Project configuration (`tfgen.yaml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Provider schema document or directory of documents.
    pub schemas: PathBuf,
    /// Module document or directory of documents.
    pub modules: PathBuf,
    /// Artifact directory.
    pub output: PathBuf,
    pub collision_policy: CollisionPolicy,
    pub attribute_objects: AttributeObjectSyntax,
    pub parallel: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            schemas: PathBuf::from("schemas"),
            modules: PathBuf::from("modules"),
            output: PathBuf::from("tf_out"),
            collision_policy: CollisionPolicy::default(),
            attribute_objects: AttributeObjectSyntax::default(),
            parallel: true,
        }
    }
}

impl ProjectConfig {
    /// Load a project file. Relative paths are taken from the file's directory.
    pub fn load(path: impl AsRef<Path>) -> CodegenResult<Self> {
        let path = path.as_ref();
        debug!("Reading project configuration from {:?}", path);

        let content = fs::read_to_string(path).map_err(|e| {
            CodegenError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| CodegenError::Config(format!("{}: {}", path.display(), e)))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.relative_to(base))
    }

    /// Resolve relative paths against `base`.
    pub fn relative_to(mut self, base: &Path) -> Self {
        for p in [&mut self.schemas, &mut self.modules, &mut self.output] {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
        self
    }

    pub fn with_schemas(mut self, path: impl Into<PathBuf>) -> Self {
        self.schemas = path.into();
        self
    }

    pub fn with_modules(mut self, path: impl Into<PathBuf>) -> Self {
        self.modules = path.into();
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = path.into();
        self
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            attribute_objects: self.attribute_objects,
        }
    }

    pub fn aggregator(&self) -> Aggregator {
        Aggregator::new()
            .with_collision_policy(self.collision_policy)
            .with_parallel(self.parallel)
    }
}

/// Reads module documents.
///
/// A document holds one module or a list of modules, as YAML or JSON.
pub struct ModuleLoader;

impl ModuleLoader {
    /// Load every module below `path`, in sorted path order and then in
    /// document order.
    pub fn load(path: impl AsRef<Path>) -> CodegenResult<Vec<ModuleConfig>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CodegenError::InvalidModule {
                path: path.to_path_buf(),
                message: "path does not exist".to_string(),
            });
        }

        let files: Vec<PathBuf> = if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            let mut files = Vec::new();
            for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
                let entry = entry.map_err(|e| CodegenError::InvalidModule {
                    path: e.path().unwrap_or(path).to_path_buf(),
                    message: e.to_string(),
                })?;
                let is_document = entry
                    .path()
                    .extension()
                    .map_or(false, |ext| ext == "yaml" || ext == "yml" || ext == "json");
                if entry.file_type().is_file() && is_document {
                    files.push(entry.into_path());
                }
            }
            files
        };

        let mut modules = Vec::new();
        for file in files {
            let loaded = Self::read_file(&file)?;
            debug!("Loaded {} modules from {:?}", loaded.len(), file);
            modules.extend(loaded);
        }

        info!("Loaded {} modules from {:?}", modules.len(), path);
        Ok(modules)
    }

    /// Read a single module document.
    pub fn read_file(path: &Path) -> CodegenResult<Vec<ModuleConfig>> {
        let content = fs::read_to_string(path)?;
        let invalid = |message: String| CodegenError::InvalidModule {
            path: path.to_path_buf(),
            message,
        };

        let documents: Vec<ModuleConfig> = if path.extension().map_or(false, |ext| ext == "json") {
            match serde_json::from_str::<serde_json::Value>(&content).map_err(|e| invalid(e.to_string()))? {
                serde_json::Value::Array(items) => items
                    .into_iter()
                    .map(serde_json::from_value)
                    .collect::<Result<_, _>>()
                    .map_err(|e| invalid(e.to_string()))?,
                single => vec![serde_json::from_value(single).map_err(|e| invalid(e.to_string()))?],
            }
        } else {
            match serde_yaml::from_str::<serde_yaml::Value>(&content).map_err(|e| invalid(e.to_string()))? {
                serde_yaml::Value::Sequence(items) => items
                    .into_iter()
                    .map(serde_yaml::from_value)
                    .collect::<Result<_, _>>()
                    .map_err(|e| invalid(e.to_string()))?,
                single => vec![serde_yaml::from_value(single).map_err(|e| invalid(e.to_string()))?],
            }
        };

        let listed = documents.len() > 1;
        Ok(documents
            .into_iter()
            .enumerate()
            .map(|(i, mut module)| {
                if module.name.is_none() {
                    module.name = Some(if listed {
                        format!("{}#{}", path.display(), i)
                    } else {
                        path.display().to_string()
                    });
                }
                module
            })
            .collect())
    }
}
