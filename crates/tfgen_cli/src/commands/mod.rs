//! CLI command definitions.
//!
//! Each subcommand loads the project configuration, then applies its flags
//! on top of it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use tfgen_codegen::{
    AggregateOutput, AttributeObjectSyntax, CollisionPolicy, ModuleCompiler, ModuleLoader,
    ProjectConfig, Renderer, ResolverChain, DEFAULT_CONFIG_FILE,
};
use tfgen_schema::SchemaRegistry;

pub mod check;
pub mod generate;
pub mod schema;

/// tfgen - Terraform generation from typed configuration
#[derive(Parser)]
#[command(name = "tfgen")]
#[command(version, about = "tfgen - Terraform generation from typed configuration")]
#[command(long_about = r#"
tfgen renders typed infrastructure configuration into Terraform files using
provider schemas.

COMMANDS:
  generate  → Render all modules and write the artifacts
  check     → Render all modules and compare with the artifacts on disk
  schema    → List registered resource and data source types

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or project configuration
  3 - Render failure
  4 - Schema error
  5 - Artifacts out of date
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render all modules and write the artifacts
    Generate(generate::GenerateArgs),

    /// Fail if the artifacts on disk are out of date
    Check(check::CheckArgs),

    /// List registered resource and data source types
    Schema(schema::SchemaArgs),
}

/// Project location and overrides shared by all commands.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Project file (defaults to ./tfgen.yaml when present)
    #[arg(short, long, env = "TFGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Provider schema document or directory
    #[arg(long)]
    pub schemas: Option<PathBuf>,

    /// Module document or directory
    #[arg(long)]
    pub modules: Option<PathBuf>,

    /// Artifact directory
    #[arg(short, long, env = "TFGEN_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Fail when two modules declare the same name for a type
    #[arg(long)]
    pub reject_collisions: bool,

    /// Render unmarked records and maps as `{ ... }` object literals
    #[arg(long)]
    pub braced_objects: bool,

    /// Compile modules one at a time
    #[arg(long)]
    pub sequential: bool,
}

impl ProjectArgs {
    /// Resolve the project configuration.
    pub fn load(&self) -> Result<ProjectConfig> {
        let config = match &self.config {
            Some(path) => ProjectConfig::load(path)
                .with_context(|| format!("Failed to load project file {}", path.display()))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                ProjectConfig::load(DEFAULT_CONFIG_FILE)
                    .with_context(|| format!("Failed to load project file {}", DEFAULT_CONFIG_FILE))?
            }
            None => {
                debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                ProjectConfig::default()
            }
        };
        Ok(self.apply(config))
    }

    fn apply(&self, mut config: ProjectConfig) -> ProjectConfig {
        if let Some(schemas) = &self.schemas {
            config = config.with_schemas(schemas);
        }
        if let Some(modules) = &self.modules {
            config = config.with_modules(modules);
        }
        if let Some(output) = &self.output {
            config = config.with_output(output);
        }
        if self.reject_collisions {
            config = config.with_collision_policy(CollisionPolicy::Reject);
        }
        if self.braced_objects {
            config.attribute_objects = AttributeObjectSyntax::Braced;
        }
        if self.sequential {
            config.parallel = false;
        }
        config
    }
}

/// Load schemas and modules, then compile and aggregate the project.
pub fn build_project(config: &ProjectConfig) -> Result<AggregateOutput> {
    let registry = SchemaRegistry::load(&config.schemas)
        .with_context(|| format!("Failed to load schemas from {}", config.schemas.display()))?;
    let modules = ModuleLoader::load(&config.modules)
        .with_context(|| format!("Failed to load modules from {}", config.modules.display()))?;

    let renderer =
        Renderer::new(Arc::new(ResolverChain::default())).with_options(config.render_options());
    let compiler = ModuleCompiler::new(&registry, renderer);

    config
        .aggregator()
        .aggregate(&compiler, &modules)
        .context("Failed to compile modules")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "tfgen",
            "--verbose",
            "generate",
            "--modules",
            "envs/dev",
            "--reject-collisions",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.project.modules, Some(PathBuf::from("envs/dev")));
                assert!(args.project.reject_collisions);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_flags_override_project_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&file, "output: from_file\nparallel: true\n").unwrap();

        let args = ProjectArgs {
            config: Some(file),
            output: Some(PathBuf::from("/tmp/override")),
            braced_objects: true,
            sequential: true,
            ..Default::default()
        };
        let config = args.load().unwrap();
        assert_eq!(config.output, PathBuf::from("/tmp/override"));
        assert_eq!(config.schemas, dir.path().join("schemas"));
        assert_eq!(config.attribute_objects, AttributeObjectSyntax::Braced);
        assert!(!config.parallel);
    }

    #[test]
    fn test_missing_project_file_is_error() {
        let dir = tempdir().unwrap();
        let args = ProjectArgs {
            config: Some(dir.path().join("missing.yaml")),
            ..Default::default()
        };
        assert!(args.load().is_err());
    }
}
