//! casefile command-line entry point.
//!
//! Usage:
//!     casefile run
//!     casefile archive RS3-24-0001
//!     casefile unarchive-folders 5

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use casefile::archive::{ArchiveEngine, ArchiveReport, ArchiveScope};
use casefile::config::{load_config, Config};
use casefile::pipeline::{LogProgress, Pipeline};
use casefile::secrets::expand_home;
use casefile::store::FsObjectStore;

#[derive(Parser, Debug)]
#[command(name = "casefile", version, about = "Case-folder document pipeline")]
struct Args {
    /// Path to the JSON config file
    #[arg(short, long, env = "CASEFILE_CONFIG")]
    config: Option<PathBuf>,

    /// Debug-level logging (ignored when RUST_LOG is set)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process every folder in the bucket
    Run,
    /// Move a folder's files into a timestamped archive subfolder
    Archive {
        folder: String,
        /// Only move files directly under the folder
        #[arg(long)]
        root_only: bool,
    },
    /// Move the first archive of a folder (listing order) back into its root
    Unarchive { folder: String },
    /// Unarchive the first COUNT folders of the bucket
    UnarchiveFolders { count: usize },
    /// Archive the root files of every folder in the bucket
    ArchiveAll,
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("casefile")
        .join("config.json")
}

fn archive_engine(config: &Config) -> ArchiveEngine {
    let store = Arc::new(FsObjectStore::new(expand_home(&config.store.root)));
    ArchiveEngine::new(store, config.bucket.clone())
}

fn print_report(report: &ArchiveReport) {
    for (from, to) in &report.moved {
        println!("{} -> {}", from, to);
    }
    for key in &report.skipped {
        println!("skipped {}", key);
    }
    for failure in &report.failures {
        eprintln!("failed {}: {}", failure.key, failure.reason);
    }
}

fn exit_code(report: &ArchiveReport) -> ExitCode {
    if report.failures.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn execute(args: Args) -> anyhow::Result<ExitCode> {
    let config_path = args.config.unwrap_or_else(default_config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    match args.command {
        Command::Run => {
            let pipeline = Pipeline::from_config(&config).context("building pipeline")?;
            match pipeline.run(&LogProgress).await {
                Ok(run) => {
                    println!("{}", run.summary());
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Archive { folder, root_only } => {
            let scope = if root_only {
                ArchiveScope::RootFiles
            } else {
                ArchiveScope::WithSubfolders
            };
            let report = archive_engine(&config)
                .archive(&folder, scope)
                .with_context(|| format!("archiving {}", folder))?;
            print_report(&report);
            Ok(exit_code(&report))
        }
        Command::Unarchive { folder } => {
            let report = archive_engine(&config)
                .unarchive(&folder)
                .with_context(|| format!("unarchiving {}", folder))?;
            print_report(&report);
            Ok(exit_code(&report))
        }
        Command::UnarchiveFolders { count } => {
            let report = archive_engine(&config)
                .unarchive_folders(count)
                .context("unarchiving folders")?;
            print_report(&report);
            Ok(exit_code(&report))
        }
        Command::ArchiveAll => {
            let report = archive_engine(&config)
                .archive_all()
                .context("archiving all folders")?;
            print_report(&report);
            Ok(exit_code(&report))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    casefile::logging::init(args.verbose);

    match execute(args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
