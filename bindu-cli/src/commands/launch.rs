//! Launch command implementation.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bindu_core::{LaunchStatus, ScannerLauncher, SdkOutput};
use colored::Colorize;
use tracing::{debug, info};

use crate::utils::format_timestamp;

const STATUS_POLL: Duration = Duration::from_millis(250);

/// Execute the launch command.
pub async fn execute(sdk_path: PathBuf, wait: bool, quiet: bool) -> Result<()> {
    // Without --wait this process exits right away; nobody would drain the pipes
    let output = if wait {
        SdkOutput::Logged
    } else {
        SdkOutput::Detached
    };

    let launcher = ScannerLauncher::new();
    let id = launcher
        .launch_with(&sdk_path, output)
        .await
        .with_context(|| format!("Failed to launch scanner SDK: {}", sdk_path.display()))?;

    if !quiet {
        println!(
            "{} {}",
            "Scanner SDK launched:".green().bold(),
            sdk_path.display()
        );
        println!("   {} {}", "Launch id:".dimmed(), id);
    }

    if !wait {
        return Ok(());
    }

    let record = loop {
        match launcher.status(&id) {
            Some(record) if record.status.is_finished() => break record,
            Some(_) => tokio::time::sleep(STATUS_POLL).await,
            None => bail!("Launch {id} is no longer tracked"),
        }
    };
    debug!(launch_id = %id, status = record.status.as_str(), "Launch finished");

    if !quiet {
        if let Some(finished) = record.finished_at {
            println!("   {} {}", "Finished at:".dimmed(), format_timestamp(finished));
        }
    }

    match record.status {
        LaunchStatus::Exited { code: Some(0) } => {
            info!(launch_id = %id, "Scanner SDK exited cleanly");
            if !quiet {
                println!("   {} {}", "Exit code:".dimmed(), "0".green());
            }
            Ok(())
        }
        LaunchStatus::Exited { code: Some(code) } => {
            bail!("Scanner SDK exited with code {code}")
        }
        LaunchStatus::Exited { code: None } => bail!("Scanner SDK was terminated by a signal"),
        LaunchStatus::Failed { error } => bail!("Error waiting for scanner SDK: {error}"),
        LaunchStatus::Running => bail!("Scanner SDK is still running"),
    }
}
