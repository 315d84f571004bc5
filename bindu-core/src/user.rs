//! User records as seen by the capture bridge.
//!
//! The bridge does not own users. It looks one up by id before watching and
//! overwrites a single field once the capture has been copied into storage.

use std::path::Path;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// The subset of a user document the capture flow reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    /// Public path of the most recent captured fingerprint image
    #[serde(default)]
    pub fingerprint_image: Option<String>,
}

/// Data access for user records.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Overwrite the user's `fingerprintImage`.
    ///
    /// Returns `false` if the user no longer exists.
    async fn set_fingerprint_image(&self, id: &str, public_path: &str)
        -> Result<bool, StoreError>;
}

/// In-memory user store for development and tests.
#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<String, UserRecord>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON array of user documents.
    pub fn from_json_file(path: &Path) -> Result<Self, StoreError> {
        let seed_error = |reason: String| StoreError::Seed {
            path: path.to_path_buf(),
            reason,
        };

        let raw = std::fs::read(path).map_err(|e| seed_error(e.to_string()))?;
        let users: Vec<UserRecord> =
            serde_json::from_slice(&raw).map_err(|e| seed_error(e.to_string()))?;

        let store = Self::new();
        for user in users {
            store.insert(user);
        }
        Ok(store)
    }

    pub fn insert(&self, user: UserRecord) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn get(&self, id: &str) -> Option<UserRecord> {
        self.users.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl std::fmt::Debug for MemoryUserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryUserStore")
            .field("users", &self.users.len())
            .finish()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.get(id))
    }

    async fn set_fingerprint_image(
        &self,
        id: &str,
        public_path: &str,
    ) -> Result<bool, StoreError> {
        match self.users.get_mut(id) {
            Some(mut user) => {
                user.fingerprint_image = Some(public_path.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
