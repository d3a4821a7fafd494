//! Check command - Compare rendered output with the artifacts on disk.

use anyhow::{Context, Result};
use clap::Args;
use thiserror::Error;
use tracing::info;

use tfgen_codegen::{ArtifactStatus, ArtifactWriter};

use super::{build_project, ProjectArgs};

/// Artifacts differ from what the current configuration renders.
#[derive(Error, Debug)]
#[error("Artifacts out of date: {}", .files.join(", "))]
pub struct OutOfDate {
    pub files: Vec<&'static str>,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

pub async fn execute(args: CheckArgs) -> Result<()> {
    let config = args.project.load()?;
    info!("Checking artifacts in {}", config.output.display());

    let output = build_project(&config)?;

    let report = ArtifactWriter::new(&config.output)
        .check(&output)
        .await
        .with_context(|| format!("Failed to read artifacts in {}", config.output.display()))?;

    if report.is_up_to_date() {
        println!("✅ Artifacts are up to date");
        return Ok(());
    }

    println!("❌ Artifacts are out of date:");
    for (file_name, status) in report.entries.iter().filter(|(_, s)| s.is_changed()) {
        let action = match status {
            ArtifactStatus::Created => "missing",
            _ => "differs",
        };
        println!("   - {} ({})", file_name, action);
    }
    println!("\nRun `tfgen generate` to update them.");

    Err(OutOfDate {
        files: report.changed(),
    }
    .into())
}
