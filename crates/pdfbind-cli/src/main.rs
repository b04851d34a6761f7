//! pdfbind - Combine text and image files into a single PDF document.
//!
//! Command-line front end for the `pdfbind` library.

mod cli;
mod output;

use clap::Parser;
use std::io;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::output::{OutputFormatter, display_document};
use pdfbind::Converter;
use pdfbind::error::{ConvertError, Result};
use pdfbind::storage::FsStorage;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    let json = cli.json;
    if let Err(err) = run(cli).await {
        if json {
            println!(
                "{}",
                serde_json::json!({ "error": err.to_string(), "exitCode": err.exit_code() })
            );
        } else {
            eprintln!("Error: {err}");
        }
        process::exit(err.exit_code());
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the verbosity flags.
fn init_tracing(cli: &Cli) {
    let filter = if cli.verbose {
        "pdfbind=debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Main application logic.
async fn run(cli: Cli) -> Result<()> {
    cli.validate()?;

    let submissions = cli.get_all_submissions().await?;
    let config = cli.to_config()?;
    let formatter = OutputFormatter::new(cli.quiet || cli.json, cli.verbose && !cli.json);

    if formatter.should_print() {
        formatter.section(&format!("{} v{}", pdfbind::NAME, pdfbind::VERSION));
        formatter.blank_line();
    }

    let storage = FsStorage::new(&config.output_dir);
    storage
        .ensure_output_dir()
        .await
        .map_err(|e| ConvertError::FailedToCreateOutput {
            path: config.output_dir.clone(),
            source: e,
        })?;

    formatter.info(&format!("Converting {} file(s)...", submissions.len()));
    for (index, submission) in submissions.iter().enumerate() {
        formatter.debug(&format!(
            "{}. {} ({})",
            index + 1,
            submission.original_name,
            submission.path.display()
        ));
    }

    let converter = Converter::new(config, Arc::new(storage))?;
    let document = converter.convert(submissions).await?;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "message": "PDF converted with multiple files",
                "document": document,
            })
        );
    } else {
        display_document(&formatter, &document);
    }

    Ok(())
}
