//! sdkpin: vendor a pinned SDK snapshot and keep its compatibility patch in sync.
//!
//! # Usage
//!
//! ```text
//! sdkpin [consume]                 validate tag, replace destination, apply patch
//! sdkpin clean                     remove the materialized destination
//! sdkpin capture [--dry-run]       refresh mirror, regenerate patch from it
//! sdkpin status [--json]           report version, tag, destination, mirror, patch
//! ```
//!
//! Global flags: `--root <DIR>` (vendoring root, default: current directory),
//! `-v` / `-q` to raise or lower log verbosity.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

use commands::{capture::CaptureArgs, status::StatusArgs};
use sdkpin_sync::{
    error::{EXIT_CONFIG, EXIT_USAGE},
    SyncError,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "sdkpin",
    version,
    about = "Vendor a pinned SDK snapshot and keep its compatibility patch in sync",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Vendoring root holding module_build_info and sdkpin.yaml.
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Log debug detail, including every git/patch invocation.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the upstream tag, materialize the snapshot and apply the patch (default).
    Consume,

    /// Remove the materialized destination. Safe to repeat.
    Clean,

    /// Refresh the mirror and regenerate the patch against the pinned tag.
    Capture(CaptureArgs),

    /// Report the state of everything sdkpin manages.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // --help and --version come through here too.
            return if err.use_stderr() {
                exit_code(EXIT_USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_tracing(cli.verbose, cli.quiet);

    let root = cli.root;
    let result = match cli.command.unwrap_or(Commands::Consume) {
        Commands::Consume => commands::consume::run(root),
        Commands::Clean => commands::clean::run(root),
        Commands::Capture(args) => args.run(root),
        Commands::Status(args) => args.run(root),
    };

    match result {
        Ok(code) => exit_code(code),
        Err(err) => {
            let (stage, code) = match err.downcast_ref::<SyncError>() {
                Some(sync) => (sync.stage().to_string(), sync.exit_code()),
                // Anything outside the state machine (unreadable cwd, bad root) is
                // a configuration problem.
                None => ("config".to_string(), EXIT_CONFIG),
            };
            eprintln!("{} {err:#}", format!("error[{stage}]:").red().bold());
            exit_code(code)
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(u8::MAX))
}

fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
