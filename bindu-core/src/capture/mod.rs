//! Fingerprint capture: wait for the scanner's output, ingest it, attach it to
//! a user.
//!
//! One [`CaptureService::capture`] call is one capture attempt. It moves
//! through `Watching` into exactly one of three terminal states:
//!
//! - **Succeeded**: the image was copied to
//!   `<uploads>/fingerprints/fingerprint-<userId>-<analysisId>.<ext>` and the
//!   user's `fingerprintImage` now points at it
//! - **TimedOut**: nothing settled before the deadline
//! - **WatchError**: the OS watch failed
//!
//! ```no_run
//! use std::sync::Arc;
//! use bindu_core::{CaptureService, CaptureSettings, MemoryUserStore};
//!
//! # async fn example() -> Result<(), bindu_core::CaptureError> {
//! let settings = CaptureSettings::new("./Fingerprint.bmp", "./uploads");
//! let service = CaptureService::new(settings, Arc::new(MemoryUserStore::new()));
//! let receipt = service.capture("65f1c0ffee").await?;
//! println!("stored at {}", receipt.file_path);
//! # Ok(())
//! # }
//! ```

pub mod ingest;
pub mod watch;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{CaptureError, Result};
use crate::user::UserStore;

pub use watch::{
    watch_for_stable_file, WatchOutcome, WatchTimings, WatchTracker, CAPTURE_DEADLINE,
    POLL_INTERVAL, STABILITY_THRESHOLD,
};

/// Subdirectory of the uploads directory that holds captured fingerprints
pub const FINGERPRINT_SUBDIR: &str = "fingerprints";

/// Public URL prefix the uploads directory is served under
pub const PUBLIC_UPLOADS_PREFIX: &str = "/uploads";

const DEFAULT_EXTENSION: &str = "bmp";

/// Where captures come from and where they go.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// Fixed path the scanner SDK writes its image to
    pub source_path: PathBuf,
    /// Root of the statically served uploads directory
    pub uploads_dir: PathBuf,
    pub timings: WatchTimings,
}

impl CaptureSettings {
    pub fn new(source_path: impl Into<PathBuf>, uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            uploads_dir: uploads_dir.into(),
            timings: WatchTimings::default(),
        }
    }

    pub fn with_timings(mut self, timings: WatchTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn fingerprints_dir(&self) -> PathBuf {
        self.uploads_dir.join(FINGERPRINT_SUBDIR)
    }
}

/// Correlates a capture with the detection record created from it later.
///
/// Formatted as `<unix-millis>-<random suffix below 10^8>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AnalysisId(String);

impl AnalysisId {
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        let suffix = rand::rng().random_range(0..100_000_000u32);
        Self(format!("{millis}-{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// State of one capture attempt.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub user_id: String,
    pub analysis_id: AnalysisId,
    pub source_path: PathBuf,
    pub dest_path: PathBuf,
    pub file_name: String,
    pub started_at: DateTime<Utc>,
    pub deadline: Duration,
}

impl CaptureRequest {
    pub fn new(user_id: &str, settings: &CaptureSettings) -> Self {
        let analysis_id = AnalysisId::generate();
        let extension = settings
            .source_path
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
        let file_name = format!(
            "fingerprint-{}-{}.{}",
            sanitize_component(user_id),
            analysis_id,
            extension
        );

        Self {
            user_id: user_id.to_string(),
            dest_path: settings.fingerprints_dir().join(&file_name),
            source_path: settings.source_path.clone(),
            file_name,
            analysis_id,
            started_at: Utc::now(),
            deadline: settings.timings.deadline,
        }
    }

    /// Path the stored image is served under, e.g. `/uploads/fingerprints/x.bmp`
    pub fn public_path(&self) -> String {
        format!(
            "{}/{}/{}",
            PUBLIC_UPLOADS_PREFIX, FINGERPRINT_SUBDIR, self.file_name
        )
    }
}

/// Keep only characters that are safe in a file name.
fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Result of a successful capture.
#[derive(Debug, Clone)]
pub struct CaptureReceipt {
    pub analysis_id: AnalysisId,
    pub profile_id: String,
    pub file_name: String,
    /// Public path stored on the user record
    pub file_path: String,
    /// Location on disk
    pub stored_at: PathBuf,
    /// `data:` URI of the stored image, absent if it could not be re-read
    pub data_uri: Option<String>,
}

/// Runs captures against a user store.
#[derive(Clone)]
pub struct CaptureService {
    settings: Arc<CaptureSettings>,
    users: Arc<dyn UserStore>,
    tracker: WatchTracker,
}

impl CaptureService {
    pub fn new(settings: CaptureSettings, users: Arc<dyn UserStore>) -> Self {
        Self {
            settings: Arc::new(settings),
            users,
            tracker: WatchTracker::new(),
        }
    }

    /// Number of captures currently holding an OS watch.
    pub fn active_watches(&self) -> usize {
        self.tracker.active()
    }

    /// Wait for the scanner image, store it and attach it to `user_id`.
    pub async fn capture(&self, user_id: &str) -> Result<CaptureReceipt> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| CaptureError::UserNotFound(user_id.to_string()))?;

        let request = CaptureRequest::new(&user.id, &self.settings);
        tokio::fs::create_dir_all(self.settings.fingerprints_dir())
            .await
            .map_err(CaptureError::Destination)?;

        let overlapping = self.tracker.active();
        if overlapping > 0 {
            warn!(
                user_id = %request.user_id,
                overlapping,
                source = %request.source_path.display(),
                "Capture started while another capture is watching the same source"
            );
        }

        info!(
            user_id = %request.user_id,
            analysis_id = %request.analysis_id,
            source = %request.source_path.display(),
            deadline_secs = request.deadline.as_secs(),
            "Waiting for fingerprint image"
        );

        let source =
            match watch_for_stable_file(&request.source_path, &self.settings.timings, &self.tracker)
                .await
            {
                WatchOutcome::Stable(path) => path,
                WatchOutcome::TimedOut => {
                    warn!(analysis_id = %request.analysis_id, "Timeout waiting for fingerprint image");
                    return Err(CaptureError::TimedOut(request.deadline));
                }
                WatchOutcome::Failed(cause) => return Err(CaptureError::Watch(cause)),
            };

        self.ingest(&request, &source).await
    }

    async fn ingest(&self, request: &CaptureRequest, source: &Path) -> Result<CaptureReceipt> {
        let bytes = ingest::copy_capture(source, &request.dest_path)
            .await
            .map_err(CaptureError::Copy)?;

        let public_path = request.public_path();
        if !self
            .users
            .set_fingerprint_image(&request.user_id, &public_path)
            .await?
        {
            return Err(CaptureError::UserNotFound(request.user_id.clone()));
        }

        let data_uri = ingest::inline_data_uri(&request.dest_path).await;

        info!(
            user_id = %request.user_id,
            analysis_id = %request.analysis_id,
            file = %request.file_name,
            bytes,
            elapsed_ms = (Utc::now() - request.started_at).num_milliseconds(),
            "Fingerprint image saved"
        );

        Ok(CaptureReceipt {
            analysis_id: request.analysis_id.clone(),
            profile_id: request.user_id.clone(),
            file_name: request.file_name.clone(),
            file_path: public_path,
            stored_at: request.dest_path.clone(),
            data_uri,
        })
    }
}

impl fmt::Debug for CaptureService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureService")
            .field("settings", &self.settings)
            .field("active_watches", &self.tracker.active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::user::{MemoryUserStore, UserRecord};
    use async_trait::async_trait;
    use tempfile::TempDir;

    const USER_ID: &str = "65f1c0ffee";

    fn fast_timings() -> WatchTimings {
        WatchTimings {
            stability_threshold: Duration::from_millis(150),
            poll_interval: Duration::from_millis(20),
            deadline: Duration::from_secs(5),
            include_existing: true,
        }
    }

    fn store_with_user() -> Arc<MemoryUserStore> {
        let store = MemoryUserStore::new();
        store.insert(UserRecord {
            id: USER_ID.to_string(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            fingerprint_image: None,
        });
        Arc::new(store)
    }

    fn service_in(temp: &TempDir, store: Arc<dyn UserStore>, timings: WatchTimings) -> CaptureService {
        let settings = CaptureSettings::new(
            temp.path().join("Fingerprint.bmp"),
            temp.path().join("uploads"),
        )
        .with_timings(timings);
        CaptureService::new(settings, store)
    }

    #[test]
    fn test_analysis_id_format() {
        let id = AnalysisId::generate();
        let (millis, suffix) = id.as_str().split_once('-').unwrap();
        assert!(millis.parse::<i64>().unwrap() > 0);
        assert!(suffix.parse::<u32>().unwrap() < 100_000_000);
    }

    #[test]
    fn test_request_paths() {
        let settings = CaptureSettings::new("/srv/bindu/Fingerprint.BMP", "/srv/bindu/uploads");
        let request = CaptureRequest::new("abc123", &settings);

        assert!(request.file_name.starts_with("fingerprint-abc123-"));
        assert!(request.file_name.ends_with(".bmp"));
        assert_eq!(
            request.dest_path,
            PathBuf::from("/srv/bindu/uploads/fingerprints").join(&request.file_name)
        );
        assert_eq!(
            request.public_path(),
            format!("/uploads/fingerprints/{}", request.file_name)
        );
        assert_eq!(request.deadline, CAPTURE_DEADLINE);
    }

    #[test]
    fn test_request_defaults_extension_and_sanitizes_user() {
        let settings = CaptureSettings::new("/srv/bindu/scan", "/srv/bindu/uploads");
        let request = CaptureRequest::new("../evil/id", &settings);

        assert!(request.file_name.starts_with("fingerprint-___evil_id-"));
        assert!(request.file_name.ends_with(".bmp"));
        assert_eq!(
            request.dest_path.parent().unwrap(),
            Path::new("/srv/bindu/uploads/fingerprints")
        );
    }

    #[tokio::test]
    async fn test_capture_unknown_user() {
        let temp = TempDir::new().unwrap();
        let service = service_in(&temp, store_with_user(), fast_timings());

        let result = service.capture("nobody").await;
        assert!(matches!(result, Err(CaptureError::UserNotFound(_))));
        assert_eq!(service.active_watches(), 0);
    }

    #[tokio::test]
    async fn test_capture_stores_image_and_updates_user() {
        let temp = TempDir::new().unwrap();
        let store = store_with_user();
        let service = service_in(&temp, store.clone(), fast_timings());
        std::fs::write(temp.path().join("Fingerprint.bmp"), b"BM scanner output").unwrap();

        let receipt = service.capture(USER_ID).await.unwrap();

        assert_eq!(receipt.profile_id, USER_ID);
        assert_eq!(
            std::fs::read(&receipt.stored_at).unwrap(),
            b"BM scanner output"
        );
        assert!(temp.path().join("Fingerprint.bmp").exists());
        assert_eq!(
            store.get(USER_ID).unwrap().fingerprint_image,
            Some(receipt.file_path.clone())
        );
        assert!(receipt
            .data_uri
            .as_deref()
            .unwrap()
            .starts_with("data:image/bmp;base64,"));
        assert_eq!(service.active_watches(), 0);
    }

    #[tokio::test]
    async fn test_sequential_captures_do_not_collide() {
        let temp = TempDir::new().unwrap();
        let service = service_in(&temp, store_with_user(), fast_timings());
        std::fs::write(temp.path().join("Fingerprint.bmp"), b"BM first").unwrap();

        let first = service.capture(USER_ID).await.unwrap();
        let second = service.capture(USER_ID).await.unwrap();

        assert_ne!(first.file_name, second.file_name);
        assert!(first.stored_at.exists());
        assert!(second.stored_at.exists());
    }

    #[tokio::test]
    async fn test_capture_timeout() {
        let temp = TempDir::new().unwrap();
        let timings = WatchTimings {
            deadline: Duration::from_millis(250),
            ..fast_timings()
        };
        let service = service_in(&temp, store_with_user(), timings);

        let result = service.capture(USER_ID).await;

        assert!(matches!(result, Err(CaptureError::TimedOut(_))));
        assert_eq!(service.active_watches(), 0);
    }

    #[tokio::test]
    async fn test_overlapping_captures_share_one_scan() {
        let temp = TempDir::new().unwrap();
        let service = service_in(&temp, store_with_user(), fast_timings());
        let source = temp.path().join("Fingerprint.bmp");

        let scanner = async {
            let waited = std::time::Instant::now();
            while service.active_watches() < 2 {
                assert!(
                    waited.elapsed() < Duration::from_secs(3),
                    "both captures should be watching"
                );
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            let peak = service.active_watches();
            tokio::fs::write(&source, b"BM single scan").await.unwrap();
            peak
        };

        let (first, second, peak) =
            tokio::join!(service.capture(USER_ID), service.capture(USER_ID), scanner);

        assert_eq!(peak, 2);
        let first = first.unwrap();
        let second = second.unwrap();
        assert_ne!(first.file_name, second.file_name);
        for receipt in [&first, &second] {
            assert_eq!(std::fs::read(&receipt.stored_at).unwrap(), b"BM single scan");
        }
        assert_eq!(service.active_watches(), 0);
    }

    /// Store that deletes the stored image while recording it, so the
    /// read-back for the inline preview fails.
    struct VanishingStore {
        inner: Arc<MemoryUserStore>,
        fingerprints_dir: PathBuf,
    }

    #[async_trait]
    impl UserStore for VanishingStore {
        async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
            self.inner.find_by_id(id).await
        }

        async fn set_fingerprint_image(
            &self,
            id: &str,
            public_path: &str,
        ) -> Result<bool, StoreError> {
            let file_name = public_path.rsplit('/').next().unwrap_or_default();
            let _ = std::fs::remove_file(self.fingerprints_dir.join(file_name));
            self.inner.set_fingerprint_image(id, public_path).await
        }
    }

    #[tokio::test]
    async fn test_capture_without_inline_preview() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(VanishingStore {
            inner: store_with_user(),
            fingerprints_dir: temp.path().join("uploads").join(FINGERPRINT_SUBDIR),
        });
        let service = service_in(&temp, store, fast_timings());
        std::fs::write(temp.path().join("Fingerprint.bmp"), b"BM").unwrap();

        let receipt = service.capture(USER_ID).await.unwrap();

        assert!(receipt.data_uri.is_none());
        assert!(receipt.file_path.ends_with(&receipt.file_name));
    }
}
