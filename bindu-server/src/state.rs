//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use bindu_core::{
    CaptureService, CaptureSettings, FolderProvisioner, MemoryUserStore, ScannerLauncher,
    StoreError, UserStore,
};

use crate::config::Config;

/// Application state containing shared resources.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Creates working folders under the data directory
    pub provisioner: FolderProvisioner,
    /// Starts the scanner SDK and tracks launched processes
    pub launcher: ScannerLauncher,
    /// Runs capture watches and ingests scanner images
    pub capture: CaptureService,
}

impl AppState {
    /// Build state around an existing user store
    pub fn new(config: &Config, users: Arc<dyn UserStore>) -> Self {
        Self::with_capture_settings(config, config.capture_settings(), users)
    }

    /// Build state with explicit capture settings (used by tests to shorten timings)
    pub fn with_capture_settings(
        config: &Config,
        settings: CaptureSettings,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            provisioner: FolderProvisioner::new(&config.data_dir),
            launcher: ScannerLauncher::new(),
            capture: CaptureService::new(settings, users),
        }
    }

    /// State backed by the in-memory user store, seeded from `users_file` if set
    pub fn in_memory(config: &Config) -> Result<Self, StoreError> {
        let store = match &config.users_file {
            Some(path) => {
                let store = MemoryUserStore::from_json_file(path)?;
                tracing::info!(users = store.len(), path = %path.display(), "Seeded in-memory user store");
                store
            }
            None => MemoryUserStore::new(),
        };
        Ok(Self::new(config, Arc::new(store)))
    }
}
