use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod error;
mod scan;

use error::Result;
use scan::{FileOutcome, SchemaReport};

#[derive(Debug, Parser)]
#[command(
    name = "record-builder-gen",
    version,
    about = "Plan and expand RecordBuilder builders for every deriving struct in a source tree"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the synthesized member plan of every schema
    Plan {
        /// Source files or directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Print structured JSON instead of text output
        #[arg(long)]
        json: bool,
    },
    /// Write the expanded builders of each source file to `<file_stem>_builders.rs`
    Expand {
        /// Source files or directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Directory receiving the expanded files
        #[arg(long)]
        out_dir: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    match run() {
        Ok(0) => ExitCode::SUCCESS,
        Ok(skipped) => {
            warn!(skipped, "finished with skipped schemas or files");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Uses the given directives, falling back to `info` when they are unset or invalid.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Returns the number of schemas and files that were reported and skipped.
fn run() -> Result<usize> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Plan { paths, json } => {
            let (outcomes, mut skipped) = scan_paths(&paths)?;
            skipped += report_skipped(&outcomes);
            let reports: Vec<&SchemaReport> =
                outcomes.iter().flat_map(|outcome| &outcome.schemas).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                print_plans(&reports);
            }
            Ok(skipped)
        }
        Commands::Expand { paths, out_dir } => {
            let (outcomes, mut skipped) = scan_paths(&paths)?;
            skipped += report_skipped(&outcomes);
            fs::create_dir_all(&out_dir)?;

            let outcomes: Vec<&FileOutcome> = outcomes.iter().collect();
            for (outcome, output) in scan::plan_outputs(&outcomes, &out_dir) {
                let written = output.and_then(|output| scan::write_expansion(outcome, &output));
                if let Err(e) = written {
                    warn!(source = %outcome.path.display(), "{e}");
                    skipped += 1;
                }
            }
            Ok(skipped)
        }
    }
}

/// Scans all sources; files that cannot be read or parsed are logged and counted.
fn scan_paths(paths: &[PathBuf]) -> Result<(Vec<FileOutcome>, usize)> {
    let files = scan::collect_sources(paths)?;
    info!(files = files.len(), "scanning sources");

    let mut outcomes = Vec::with_capacity(files.len());
    let mut failed = 0;
    for (path, result) in scan::scan_all(&files) {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                warn!(file = %path.display(), "skipping file: {e}");
                failed += 1;
            }
        }
    }
    Ok((outcomes, failed))
}

fn report_skipped(outcomes: &[FileOutcome]) -> usize {
    let mut count = 0;
    for skipped in outcomes.iter().flat_map(|outcome| &outcome.skipped) {
        warn!(
            record = %skipped.record,
            "{}:{}:{}: skipping schema: {}",
            skipped.file, skipped.line, skipped.column, skipped.message
        );
        count += 1;
    }
    count
}

fn print_plans(reports: &[&SchemaReport]) {
    for report in reports {
        println!(
            "{} -> {} [{}] ({})",
            report.record, report.builder, report.representation, report.file
        );
        for field in &report.fields {
            let nullable = if field.nullable { ", nullable" } else { "" };
            println!(
                "  #{} {}: {} ({}{})",
                field.ordinal, field.name, field.declared, field.kind, nullable
            );
        }
        for member in &report.members {
            if member.flags.is_empty() {
                println!("    {:<18} {}", member.kind, member.name);
            } else {
                println!(
                    "    {:<18} {} [{}]",
                    member.kind,
                    member.name,
                    member.flags.join(" | ")
                );
            }
        }
        println!();
    }
}
