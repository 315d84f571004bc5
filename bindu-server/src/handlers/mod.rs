//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod capture;
pub mod health;
pub mod scanner;

pub use crate::state::AppState;
pub use capture::{watch_fingerprint_handler, WatchFingerprintRequest, WatchFingerprintResponse};
pub use health::{health, ping, ready, HealthResponse, ReadyResponse};
pub use scanner::{
    create_temp_folder_handler, launch_sdk_handler, launch_status_handler, CreateFolderRequest,
    CreateFolderResponse, LaunchRequest, LaunchResponse, LaunchStatusResponse,
};
