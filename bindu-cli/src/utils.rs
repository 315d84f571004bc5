//! Common utility functions shared across CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use bindu_core::{MemoryUserStore, UserRecord};
use chrono::{DateTime, Utc};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        "bindu_cli=debug,bindu_core=debug"
    } else {
        "bindu_cli=warn,bindu_core=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

/// Build the user store for a local capture.
///
/// With a users file the user must exist in it. Without one, `user_id` is
/// registered on the fly so the image can still be captured and stored.
pub fn load_user_store(users_file: Option<&Path>, user_id: &str) -> Result<MemoryUserStore> {
    match users_file {
        Some(path) => {
            let store = MemoryUserStore::from_json_file(path)
                .with_context(|| format!("Failed to read users file: {}", path.display()))?;
            debug!(users = store.len(), path = %path.display(), "Loaded users");
            Ok(store)
        }
        None => {
            let store = MemoryUserStore::new();
            store.insert(UserRecord {
                id: user_id.to_string(),
                name: String::new(),
                email: String::new(),
                fingerprint_image: None,
            });
            Ok(store)
        }
    }
}

/// Format a UTC timestamp for terminal output.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
