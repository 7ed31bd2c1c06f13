use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};

use schema_compare::compare::Summary;
use schema_compare::model::MetadataSnapshot;
use schema_compare::options::{self, DeploymentOptions, OptionsFile};
use schema_compare::script::{warnings, Severity};
use schema_compare::{io, logging, DiffStatus};

#[derive(Parser)]
#[command(author, version, about = "Compare database schema snapshots and generate deployment scripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Options file (TOML) with [comparison] and [deployment] sections
    #[arg(short, long)]
    options: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two snapshots and print the difference report
    Compare {
        /// Source (desired-state) snapshot file or scripts folder
        source: PathBuf,
        /// Target (current-state) snapshot file or scripts folder
        target: PathBuf,
        /// Also list identical objects
        #[arg(long)]
        show_identical: bool,
    },
    /// Compare two snapshots and write deployment plus rollback scripts
    Script {
        source: PathBuf,
        target: PathBuf,
        /// Deployment script output path
        #[arg(short, long, default_value = "deploy.sql")]
        out: PathBuf,
        /// Rollback script output path
        #[arg(short, long, default_value = "rollback.sql")]
        rollback_out: PathBuf,
        /// Database named in the script header and USE statement
        #[arg(short, long)]
        database: Option<String>,
    },
    /// Import a folder of .sql scripts into a snapshot file
    Snapshot {
        /// Folder containing CREATE scripts
        scripts: PathBuf,
        /// Snapshot output path
        #[arg(short, long, default_value = "snapshot.json")]
        out: PathBuf,
    },
}

/// A snapshot argument may be a JSON file or a scripts folder.
fn load_side(path: &Path) -> Result<MetadataSnapshot> {
    let snapshot = if path.is_dir() {
        io::load_scripts_folder(path)
            .with_context(|| format!("failed to import scripts folder {}", path.display()))?
    } else {
        io::load_snapshot(path)
            .with_context(|| format!("failed to load snapshot {}", path.display()))?
    };
    Ok(snapshot)
}

fn load_options(path: Option<&Path>) -> Result<OptionsFile> {
    match path {
        Some(path) => options::load_from_file(path)
            .with_context(|| format!("failed to load options file {}", path.display())),
        None => Ok(OptionsFile::default()),
    }
}

fn print_report(
    result: &schema_compare::ComparisonResult,
    summary: &Summary,
    show_identical: bool,
) {
    println!("{}", summary);
    println!();
    for entry in result.visible_entries() {
        if entry.status == DiffStatus::Identical && !show_identical {
            continue;
        }
        println!("{:<20} {}", entry.status.to_string(), entry.key);
        for diff in &entry.field_diffs {
            println!(
                "    {}: {} -> {}",
                diff.field_path,
                diff.source_value.as_deref().unwrap_or("<absent>"),
                diff.target_value.as_deref().unwrap_or("<absent>")
            );
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level, cli.log_json)?;

    let opts = load_options(cli.options.as_deref())?;

    match cli.command {
        Commands::Compare {
            source,
            target,
            show_identical,
        } => {
            let source = load_side(&source)?;
            let target = load_side(&target)?;
            let result = schema_compare::compare(&source, &target, &opts.comparison)?;
            let summary = result.summarize();
            print_report(&result, &summary, show_identical);
        }
        Commands::Script {
            source,
            target,
            out,
            rollback_out,
            database,
        } => {
            let source = load_side(&source)?;
            let target = load_side(&target)?;
            let result = schema_compare::compare(&source, &target, &opts.comparison)?;

            let deployment = DeploymentOptions {
                target_database: database.or(opts.deployment.target_database.clone()),
                header_timestamp: Some(Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
                ..opts.deployment.clone()
            };
            let output =
                match schema_compare::generate_scripts(&result, &result.changed_keys(), &deployment)
                {
                    Ok(output) => output,
                    Err(schema_compare::Error::DependencyCycle { cycles }) => {
                        for warning in warnings::cycle_warnings(&cycles) {
                            eprintln!("[FATAL] {}: {}", warning.object, warning.message);
                        }
                        anyhow::bail!("dependency cycles prevent script generation");
                    }
                    Err(err) => return Err(err.into()),
                };

            for warning in &output.warnings {
                let stream = match warning.severity {
                    Severity::Info => "NOTE",
                    Severity::Caution => "CAUTION",
                    Severity::Destructive => "DESTRUCTIVE",
                    Severity::Fatal => "FATAL",
                };
                eprintln!("[{}] {}: {}", stream, warning.object, warning.message);
            }

            fs::write(&out, &output.script)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("wrote {} ({} operations)", out.display(), output.operations.len());
            if deployment.include_rollback {
                fs::write(&rollback_out, &output.rollback_script)
                    .with_context(|| format!("failed to write {}", rollback_out.display()))?;
                println!("wrote {}", rollback_out.display());
            }
        }
        Commands::Snapshot { scripts, out } => {
            let snapshot = io::load_scripts_folder(&scripts)
                .with_context(|| format!("failed to import {}", scripts.display()))?;
            io::save_snapshot(&snapshot, &out)?;
            println!(
                "wrote {} ({} objects, fingerprint {})",
                out.display(),
                snapshot.len(),
                snapshot.fingerprint()
            );
        }
    }

    Ok(())
}
