//! Aggregation of module outputs into project-wide text and manifests.

use std::collections::HashMap;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use tfgen_schema::EntityKind;

use crate::error::{CodegenError, CodegenResult};
use crate::module::{join_stanzas, CodeGenOutput, ModuleCompiler, ModuleConfig};

/// Resource type to prefixed name to raw configuration value.
pub type Manifest = IndexMap<String, IndexMap<String, Value>>;

/// What to do when two modules declare the same prefixed name for a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// The later module's value replaces the earlier one in the manifest.
    /// Both stanzas stay in the text output.
    #[default]
    LastWins,
    /// Fail the run.
    Reject,
}

/// Output of a whole project.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateOutput {
    pub resources_text: String,
    pub data_sources_text: String,
    pub resources_manifest: Manifest,
    pub data_sources_manifest: Manifest,
}

impl AggregateOutput {
    pub fn manifest(&self, kind: EntityKind) -> &Manifest {
        match kind {
            EntityKind::Resource => &self.resources_manifest,
            EntityKind::DataSource => &self.data_sources_manifest,
        }
    }
}

/// Compiles every module and reduces the results in module order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregator {
    collision_policy: CollisionPolicy,
    parallel: bool,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self {
            collision_policy: CollisionPolicy::default(),
            parallel: true,
        }
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Compile modules on the rayon pool. Enabled by default.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn collision_policy(&self) -> CollisionPolicy {
        self.collision_policy
    }

    /// Compile every module. Results are in module order.
    pub fn compile_all(
        &self,
        compiler: &ModuleCompiler<'_>,
        modules: &[ModuleConfig],
    ) -> CodegenResult<Vec<CodeGenOutput>> {
        if self.parallel {
            modules.par_iter().map(|m| compiler.compile(m)).collect()
        } else {
            modules.iter().map(|m| compiler.compile(m)).collect()
        }
    }

    /// Compile and aggregate a project.
    pub fn aggregate(
        &self,
        compiler: &ModuleCompiler<'_>,
        modules: &[ModuleConfig],
    ) -> CodegenResult<AggregateOutput> {
        let resources_manifest = self.build_manifest(compiler, modules, EntityKind::Resource)?;
        let data_sources_manifest = self.build_manifest(compiler, modules, EntityKind::DataSource)?;

        let outputs = self.compile_all(compiler, modules)?;
        let resources: Vec<&str> = outputs.iter().map(|o| o.resources_text.as_str()).collect();
        let data_sources: Vec<&str> = outputs
            .iter()
            .map(|o| o.data_sources_text.as_str())
            .collect();

        let output = AggregateOutput {
            resources_text: join_stanzas(&resources),
            data_sources_text: join_stanzas(&data_sources),
            resources_manifest,
            data_sources_manifest,
        };

        info!(
            "Aggregated {} modules: {} resources, {} data sources",
            modules.len(),
            manifest_len(&output.resources_manifest),
            manifest_len(&output.data_sources_manifest)
        );
        Ok(output)
    }

    fn build_manifest(
        &self,
        compiler: &ModuleCompiler<'_>,
        modules: &[ModuleConfig],
        kind: EntityKind,
    ) -> CodegenResult<Manifest> {
        let registry = compiler.registry();
        let mut manifest = Manifest::new();
        let mut owners: HashMap<(String, String), &str> = HashMap::new();

        for module in modules {
            for (type_name, instances) in module.declarations(kind) {
                if !registry.contains(kind, type_name) {
                    debug!("Leaving undeclared {} type {} out of the manifest", kind, type_name);
                    continue;
                }

                let entries = manifest.entry(type_name.clone()).or_default();
                for (name, value) in instances {
                    let address = module.address(name);
                    let owner = (type_name.clone(), address.clone());
                    if let Some(first) = owners.insert(owner, module.label()) {
                        match self.collision_policy {
                            CollisionPolicy::Reject => {
                                return Err(CodegenError::NameCollision {
                                    kind: kind.label(),
                                    type_name: type_name.clone(),
                                    name: address,
                                    first: first.to_string(),
                                    second: module.label().to_string(),
                                });
                            }
                            CollisionPolicy::LastWins => warn!(
                                "{} {}.{} declared by both {} and {}, keeping the latter in the manifest",
                                kind,
                                type_name,
                                address,
                                first,
                                module.label()
                            ),
                        }
                    }
                    entries.insert(address, value.clone());
                }
            }
        }
        Ok(manifest)
    }
}

fn manifest_len(manifest: &Manifest) -> usize {
    manifest.values().map(|m| m.len()).sum()
}
