//! Bindu CLI - drive the fingerprint capture bridge from a terminal.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage error
  66  Input missing (scanner SDK or users file not found)
  67  Unknown user
  69  Watch error (scanner output folder unavailable)
  74  I/O error (cannot create folder or store image)
  75  Timed out waiting for the scanner image";

#[derive(Parser)]
#[command(name = "bindu")]
#[command(author, version, about = "Fingerprint capture bridge", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a working folder (no-op if it already exists)
    Provision {
        /// Folder to create, relative to --base
        #[arg(value_name = "FOLDER")]
        folder: String,

        /// Directory the folder is created under
        #[arg(long, default_value = ".")]
        base: PathBuf,
    },

    /// Start the scanner SDK executable
    Launch {
        /// Path to the SDK executable
        #[arg(value_name = "SDK_PATH")]
        sdk_path: PathBuf,

        /// Wait for the SDK to exit and report its exit code
        #[arg(long)]
        wait: bool,
    },

    /// Wait for the scanner image and store it for a user
    Capture {
        /// User the image belongs to
        #[arg(short, long, value_name = "ID")]
        user: String,

        /// Fixed path the scanner writes its image to
        #[arg(long, default_value = "Fingerprint.bmp")]
        source: PathBuf,

        /// Uploads directory; images land in <UPLOADS>/fingerprints
        #[arg(long, default_value = "uploads")]
        uploads: PathBuf,

        /// JSON array of user records; without it the user is accepted as given
        #[arg(long, value_name = "FILE")]
        users: Option<PathBuf>,

        /// Seconds to wait for the image
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,

        /// Ignore an image already present at --source
        #[arg(long)]
        fresh: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    utils::init_tracing(cli.verbose);

    let quiet = cli.quiet;
    let exit = match run(cli).await {
        Ok(()) => ExitCode::success(),
        Err(err) => ExitCode::from_anyhow(&err),
    };

    if let Some(message) = &exit.message {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }
    if exit.code != exit_codes::SUCCESS && !quiet {
        eprintln!("{}", format!("exit code {}", exit.code).dimmed());
    }
    std::process::exit(exit.code);
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Provision { folder, base } => {
            commands::provision::execute(&folder, base, cli.quiet).await
        }
        Commands::Launch { sdk_path, wait } => {
            commands::launch::execute(sdk_path, wait, cli.quiet).await
        }
        Commands::Capture {
            user,
            source,
            uploads,
            users,
            timeout_secs,
            fresh,
        } => {
            let args = commands::capture::CaptureArgs {
                user,
                source,
                uploads,
                users,
                timeout_secs,
                fresh,
            };
            commands::capture::execute(args, cli.quiet).await
        }
    }
}
