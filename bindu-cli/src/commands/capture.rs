//! Capture command implementation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bindu_core::{CaptureService, CaptureSettings, WatchTimings};
use colored::Colorize;
use tracing::info;

use crate::utils::load_user_store;

pub struct CaptureArgs {
    pub user: String,
    pub source: PathBuf,
    pub uploads: PathBuf,
    pub users: Option<PathBuf>,
    pub timeout_secs: u64,
    pub fresh: bool,
}

/// Execute the capture command.
pub async fn execute(args: CaptureArgs, quiet: bool) -> Result<()> {
    let store = load_user_store(args.users.as_deref(), &args.user)?;

    let timings = WatchTimings {
        deadline: Duration::from_secs(args.timeout_secs),
        include_existing: !args.fresh,
        ..WatchTimings::default()
    };
    let settings = CaptureSettings::new(&args.source, &args.uploads).with_timings(timings);
    let service = CaptureService::new(settings, Arc::new(store));

    if !quiet {
        eprintln!(
            "{} {} {}",
            "Waiting for scanner image at".dimmed(),
            args.source.display(),
            format!("(up to {}s)", args.timeout_secs).dimmed()
        );
    }

    let receipt = service
        .capture(&args.user)
        .await
        .with_context(|| format!("Capture failed for user {}", args.user))?;

    info!(
        analysis_id = %receipt.analysis_id,
        stored_at = %receipt.stored_at.display(),
        "Capture complete"
    );

    if !quiet {
        println!();
        println!("{}", "Fingerprint image saved".green().bold());
        println!("   {} {}", "User:".dimmed(), receipt.profile_id);
        println!("   {} {}", "Analysis id:".dimmed(), receipt.analysis_id);
        println!("   {} {}", "File:".dimmed(), receipt.stored_at.display());
        println!("   {} {}", "Public path:".dimmed(), receipt.file_path);
        if receipt.data_uri.is_none() {
            println!("   {} {}", "Preview:".dimmed(), "unavailable".yellow());
        }
    }
    Ok(())
}
