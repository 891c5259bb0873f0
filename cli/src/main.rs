//! CLI for the Code Propagator.
//!
//! This tool copies generated code from a generation repository into the
//! downstream repositories that declare copy rules for it, opening one pull
//! request per source commit.

use clap::{Parser, Subcommand};
use code_propagator::{
    copy_local, RefreshOutcome, RepoName, RunSummary, Runner, RunnerConfig, RunnerError, Settings,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Code Propagator - Copy generated code into downstream repositories via pull requests.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the settings file.
    #[arg(long, global = true, default_value = "propagator.toml")]
    settings: PathBuf,

    /// GitHub token used for API calls and pushes.
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan source history and open pull requests for pending commits.
    Scan {
        /// Print the pending work without changing anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Re-read copy rules and lock files into the store.
    Refresh {
        /// Repository in "owner/name" form.
        #[arg(long, required_unless_present = "all", conflicts_with = "all")]
        repo: Option<RepoName>,

        /// Refresh every repository the token was granted.
        #[arg(long)]
        all: bool,

        /// App installation to record for the repository.
        #[arg(long)]
        installation_id: Option<u64>,
    },

    /// Open pull requests pinning a new post-processor digest.
    UpdateLock {
        /// Post-processor image.
        #[arg(long)]
        image: String,

        /// Newly published digest.
        #[arg(long)]
        digest: String,
    },

    /// Apply a copy-rule file between two local directories.
    CopyDirs {
        /// Source checkout.
        #[arg(long)]
        source: PathBuf,

        /// Destination checkout.
        #[arg(long)]
        dest: PathBuf,

        /// Checkout holding the copy-rule file (defaults to the destination).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = Args::parse();

    match run(args).await {
        Ok(Some(summary)) => {
            print_summary(&summary);

            if summary.has_failures() {
                ExitCode::from(1)
            } else {
                ExitCode::from(0)
            }
        }
        Ok(None) => ExitCode::from(0),
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Sets up the global tracing subscriber with:
/// - Compact log formatting (single-line output)
/// - Log level filtering via `RUST_LOG` env var (defaults to "info")
fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Main execution logic.
///
/// Returns a summary for commands that process several items.
async fn run(args: Args) -> Result<Option<RunSummary>, RunnerError> {
    if let Command::CopyDirs {
        source,
        dest,
        config,
    } = &args.command
    {
        let report = copy_local(source, dest, config.as_ref().unwrap_or(dest))?;
        println!(
            "Copied {} file(s) into {} directory(ies), removed {} path(s)",
            report.files,
            report.directories,
            report.removed.len()
        );
        return Ok(None);
    }

    let settings = Settings::load(&args.settings)?;
    let token = args.token.ok_or(RunnerError::MissingToken)?;

    match args.command {
        Command::Scan { dry_run } => {
            let runner = Runner::new(RunnerConfig::new(settings, token, dry_run))?;
            Ok(Some(runner.scan().await?))
        }
        Command::Refresh {
            repo,
            all,
            installation_id,
        } => {
            let runner = Runner::new(RunnerConfig::new(settings, token, false))?;
            match repo {
                Some(repo) if !all => {
                    let outcome = runner.refresh(&repo, installation_id).await?;
                    print_refresh_outcome(&repo, &outcome);
                    Ok(None)
                }
                _ => Ok(Some(runner.refresh_all(installation_id).await?)),
            }
        }
        Command::UpdateLock { image, digest } => {
            let runner = Runner::new(RunnerConfig::new(settings, token, false))?;
            Ok(Some(runner.update_lock(&image, &digest).await?))
        }
        Command::CopyDirs { .. } => Ok(None),
    }
}

fn print_refresh_outcome(repo: &RepoName, outcome: &RefreshOutcome) {
    match outcome {
        RefreshOutcome::Recorded { commit_hash } => {
            println!("{repo}: recorded configuration at {commit_hash}");
        }
        RefreshOutcome::Unchanged => println!("{repo}: configuration unchanged"),
        RefreshOutcome::Conflict => println!("{repo}: configuration changed concurrently"),
        RefreshOutcome::Defect { issue } => {
            println!("{repo}: configuration defect ({issue:?})");
        }
    }
}

/// Prints the final run summary.
fn print_summary(summary: &RunSummary) {
    println!("\nSummary:");
    println!(
        "  Mode: {}",
        if summary.dry_run { "Dry Run" } else { "Live" }
    );
    if summary.commits_scanned > 0 {
        println!("  Commits scanned: {}", summary.commits_scanned);
        println!("  Stopped early: {}", summary.stopped_early);
    }
    println!("  Items queued: {}", summary.queued);

    if !summary.dry_run {
        println!("  Pull requests opened: {}", summary.propagated);
        if summary.refreshed > 0 {
            println!("  Configurations recorded: {}", summary.refreshed);
        }
        println!("  Skipped: {}", summary.skipped);
        println!("  Collisions: {}", summary.collisions);
        println!("  Failed: {}", summary.failed);
    }
}
