use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process;

use circleci_weigh_in::cmd::{self, RunArgs};
use circleci_weigh_in::error::{ErrorFormatter, WeighInError};

/// Asset size weigh-in for CircleCI pull request builds
///
/// circleci-weigh-in measures the assets listed in a bundler manifest,
/// compares them with the latest build of the pull request's base branch and
/// posts the result as a GitHub commit status.
#[derive(Parser)]
#[command(name = "circleci-weigh-in", author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Weigh the current build against its base branch build
    Run(Box<RunArgs>),

    /// Compare two asset size reports on disk
    Compare {
        /// Base report
        base: PathBuf,

        /// Current report
        current: PathBuf,

        /// Failure thresholds as a JSON array
        #[arg(long, value_name = "JSON", default_value = "[]")]
        failure_thresholds: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    // RUST_LOG overrides the default level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => cmd::cmd_run(*args).await,
        Commands::Compare {
            base,
            current,
            failure_thresholds,
            json,
        } => compare(&base, &current, &failure_thresholds, json),
        Commands::Completions { shell } => {
            cmd::cmd_completions(shell, &mut Cli::command());
            Ok(0)
        }
    };

    match result {
        Ok(0) => {}
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("{}", ErrorFormatter::format(&e));
            process::exit(ErrorFormatter::exit_code(&e));
        }
    }
}

fn compare(base: &Path, current: &Path, failure_thresholds: &str, json: bool) -> anyhow::Result<i32> {
    let thresholds: Value = serde_json::from_str(failure_thresholds).map_err(|e| {
        WeighInError::InvalidFailureThresholdOption {
            message: format!("--failure-thresholds is not valid JSON: {}", e),
        }
    })?;
    cmd::cmd_compare(base, current, &thresholds, json)
}
