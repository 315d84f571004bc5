//! Provision command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bindu_core::FolderProvisioner;
use colored::Colorize;
use tracing::info;

/// Execute the provision command.
pub async fn execute(folder: &str, base: PathBuf, quiet: bool) -> Result<()> {
    let provisioner = FolderProvisioner::new(base);
    let path = provisioner
        .provision(folder)
        .await
        .with_context(|| format!("Failed to create folder: {folder}"))?;

    info!(path = %path.display(), "Folder ready");

    if !quiet {
        println!("{} {}", "Folder ready:".green().bold(), path.display());
    }
    Ok(())
}
