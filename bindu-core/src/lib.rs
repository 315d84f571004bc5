//! Bindu Core - fingerprint capture bridge
//!
//! Connects a vendor fingerprint scanner, which drops its image at a fixed
//! path, to Bindu's user records:
//!
//! - [`FolderProvisioner`] creates working folders under the data directory
//! - [`ScannerLauncher`] starts the scanner SDK and tracks the process outcome
//! - [`CaptureService`] waits for the scanner image (write-stability window,
//!   hard deadline), copies it into uploads and updates the user
//!
//! Users are reached through the [`UserStore`] trait; [`MemoryUserStore`] is
//! provided for development and tests.

pub mod capture;
pub mod error;
pub mod launcher;
pub mod provision;
pub mod user;

pub use capture::{
    watch_for_stable_file, AnalysisId, CaptureReceipt, CaptureRequest, CaptureService,
    CaptureSettings, WatchOutcome, WatchTimings, WatchTracker, CAPTURE_DEADLINE,
    FINGERPRINT_SUBDIR, POLL_INTERVAL, PUBLIC_UPLOADS_PREFIX, STABILITY_THRESHOLD,
};
pub use error::{CaptureError, LaunchError, ProvisionError, Result, StoreError};
pub use launcher::{LaunchRecord, LaunchStatus, ScannerLauncher, SdkOutput};
pub use provision::FolderProvisioner;
pub use user::{MemoryUserStore, UserRecord, UserStore};
