//! tfgen CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or project configuration
//! - 3: Render failure
//! - 4: Schema error
//! - 5: Artifacts out of date (`check`)

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tfgen_codegen::CodegenError;
use tfgen_schema::SchemaError;

mod commands;

use commands::check::OutOfDate;
use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const RENDER_FAILURE: u8 = 3;
    pub const SCHEMA_ERROR: u8 = 4;
    pub const OUT_OF_DATE: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = match cli.command {
        Commands::Generate(args) => commands::generate::execute(args).await,
        Commands::Check(args) => commands::check::execute(args).await,
        Commands::Schema(args) => commands::schema::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

fn init_logging(cli: &Cli) {
    let default_directives = if cli.quiet {
        "error"
    } else if cli.verbose {
        "tfgen=debug,warn"
    } else {
        "tfgen=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(filter);
    let log_result = if cli.log_json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

/// Map an error to its exit code by the first typed error in its chain.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if cause.downcast_ref::<OutOfDate>().is_some() {
            return ExitCodes::OUT_OF_DATE;
        }
        if cause.downcast_ref::<SchemaError>().is_some() {
            return ExitCodes::SCHEMA_ERROR;
        }
        if let Some(err) = cause.downcast_ref::<CodegenError>() {
            return match err {
                CodegenError::Schema(_) => ExitCodes::SCHEMA_ERROR,
                CodegenError::InvalidModule { .. } | CodegenError::Config(_) => {
                    ExitCodes::INVALID_ARGS
                }
                CodegenError::Io(_) | CodegenError::Json(_) => {
                    ExitCodes::GENERAL_ERROR
                }
                _ => ExitCodes::RENDER_FAILURE,
            };
        }
    }
    ExitCodes::GENERAL_ERROR
}
