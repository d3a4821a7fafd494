//! Generate command - Render all modules and write the artifacts.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use tfgen_codegen::ArtifactWriter;

use super::{build_project, ProjectArgs};

#[derive(Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

pub async fn execute(args: GenerateArgs) -> Result<()> {
    let config = args.project.load()?;
    info!("Generating Terraform from {}", config.modules.display());

    let output = build_project(&config)?;

    let writer = ArtifactWriter::new(&config.output);
    let report = writer
        .write(&output)
        .await
        .with_context(|| format!("Failed to write artifacts to {}", config.output.display()))?;

    println!("📦 Artifacts in {}", report.output_dir.display());
    for (file_name, status) in &report.entries {
        println!("   {:<10} {}", status.to_string(), file_name);
    }

    if report.is_up_to_date() {
        println!("\n✅ Everything up to date");
    } else {
        println!("\n✅ {} artifact(s) written", report.changed().len());
    }

    Ok(())
}
