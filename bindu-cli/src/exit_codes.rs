//! Exit codes following sysexits.h conventions.
//!
//! Scripts that drive a capture station branch on these: a timeout (75) is
//! worth retrying, a missing SDK (66) is not.

use bindu_core::{CaptureError, LaunchError, ProvisionError, StoreError};

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid folder path).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Cannot open input (SDK executable or users file missing).
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Addressee unknown (user id not in the store).
/// Maps to EX_NOUSER from sysexits.h.
pub const UNKNOWN_USER: i32 = 67;

/// Service unavailable (filesystem watch could not be set up).
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const WATCH_ERROR: i32 = 69;

/// I/O error (cannot create folder, spawn SDK or store image).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Temporary failure (no scanner image before the deadline).
/// Maps to EX_TEMPFAIL from sysexits.h.
pub const TIMED_OUT: i32 = 75;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let code = err
            .chain()
            .find_map(classify)
            .unwrap_or(GENERAL_ERROR);

        Self {
            code,
            message: Some(format!("{err:#}")),
        }
    }
}

fn classify(cause: &(dyn std::error::Error + 'static)) -> Option<i32> {
    if let Some(err) = cause.downcast_ref::<CaptureError>() {
        return Some(match err {
            CaptureError::UserNotFound(_) => UNKNOWN_USER,
            CaptureError::TimedOut(_) => TIMED_OUT,
            CaptureError::Watch(_) => WATCH_ERROR,
            CaptureError::Destination(_) | CaptureError::Copy(_) => IO_ERROR,
            CaptureError::Store(_) => GENERAL_ERROR,
        });
    }
    if let Some(err) = cause.downcast_ref::<LaunchError>() {
        return Some(match err {
            LaunchError::NotFound(_) => INPUT_ERROR,
            LaunchError::Inaccessible { .. } | LaunchError::Spawn(_) => IO_ERROR,
        });
    }
    if let Some(err) = cause.downcast_ref::<ProvisionError>() {
        return Some(match err {
            ProvisionError::InvalidPath(_) => USAGE_ERROR,
            ProvisionError::Io(_) => IO_ERROR,
        });
    }
    if let Some(StoreError::Seed { .. }) = cause.downcast_ref::<StoreError>() {
        return Some(INPUT_ERROR);
    }
    None
}
