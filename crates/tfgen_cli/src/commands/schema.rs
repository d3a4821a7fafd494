//! Schema command - List registered resource and data source types.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;
use tracing::info;

use tfgen_schema::{EntityKind, SchemaRegistry};

use super::ProjectArgs;

#[derive(Args)]
pub struct SchemaArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Only list types of this provider
    #[arg(long)]
    pub provider: Option<String>,

    /// Print the listing as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: SchemaArgs) -> Result<()> {
    let config = args.project.load()?;
    let schemas: PathBuf = config.schemas;
    info!("Loading schemas from {}", schemas.display());

    let registry = SchemaRegistry::load(&schemas)
        .with_context(|| format!("Failed to load schemas from {}", schemas.display()))?;

    if registry.is_empty() {
        println!("⚠️  No schemas found in {}", schemas.display());
        return Ok(());
    }

    let providers: Vec<&str> = registry
        .providers()
        .into_iter()
        .filter(|p| args.provider.as_deref().map_or(true, |wanted| wanted == *p))
        .collect();

    if let Some(wanted) = &args.provider {
        if providers.is_empty() {
            anyhow::bail!("Provider {} not found in {}", wanted, schemas.display());
        }
    }

    if args.json {
        let listing: serde_json::Map<String, serde_json::Value> = providers
            .iter()
            .map(|provider| {
                (
                    provider.to_string(),
                    json!({
                        "resources": types_of(&registry, EntityKind::Resource, provider),
                        "data_sources": types_of(&registry, EntityKind::DataSource, provider),
                    }),
                )
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    for provider in &providers {
        println!("🔌 {}", provider);
        for kind in [EntityKind::Resource, EntityKind::DataSource] {
            let types = types_of(&registry, kind, provider);
            if types.is_empty() {
                continue;
            }
            println!("   {} ({}):", kind, types.len());
            for type_name in types {
                println!("      - {}", type_name);
            }
        }
    }

    Ok(())
}

fn types_of<'r>(registry: &'r SchemaRegistry, kind: EntityKind, provider: &str) -> Vec<&'r str> {
    registry
        .types(kind)
        .filter(|(_, registered)| registered.provider == provider)
        .map(|(name, _)| name)
        .collect()
}
