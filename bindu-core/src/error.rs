use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures of a single capture attempt.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Timed out after {}s waiting for fingerprint image", .0.as_secs())]
    TimedOut(Duration),

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("Failed to prepare destination directory: {0}")]
    Destination(#[source] io::Error),

    #[error("Failed to copy fingerprint image: {0}")]
    Copy(#[source] io::Error),

    #[error("Failed to update user record: {0}")]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("SDK executable not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Cannot access SDK executable {}: {source}", .path.display())]
    Inaccessible {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to start SDK process: {0}")]
    Spawn(#[source] io::Error),
}

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Invalid folder path: {0}")]
    InvalidPath(String),

    #[error("Failed to create folder: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("User store backend error: {0}")]
    Backend(String),

    #[error("Failed to load users from {}: {reason}", .path.display())]
    Seed { path: PathBuf, reason: String },
}

pub type Result<T, E = CaptureError> = std::result::Result<T, E>;
