//! Scanner SDK launcher.
//!
//! Starting the vendor executable and the executable finishing are two
//! separate events. [`ScannerLauncher::launch`] returns as soon as the process
//! is running; a background task waits for it, logs its output and records the
//! final [`LaunchStatus`] in a registry that callers can poll by launch id.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::LaunchError;

/// Finished launches older than this are dropped from the registry.
const FINISHED_RETENTION_MINUTES: i64 = 60;

/// Lifecycle of a launched scanner process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchStatus {
    Running,
    Exited { code: Option<i32> },
    Failed { error: String },
}

impl LaunchStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Exited { .. } => "exited",
            Self::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LaunchRecord {
    pub id: Uuid,
    pub sdk_path: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: LaunchStatus,
}

/// Where a launched SDK's stdout and stderr go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SdkOutput {
    /// Piped and logged line by line; the launcher must outlive the process
    #[default]
    Logged,
    /// Discarded, so the process survives the launcher's process exiting
    Detached,
}

/// Spawns scanner executables and tracks their outcome.
#[derive(Clone, Default)]
pub struct ScannerLauncher {
    launches: Arc<DashMap<Uuid, LaunchRecord>>,
}

impl ScannerLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `sdk_path` with its output logged.
    ///
    /// Returns once the process has been spawned. The process is not awaited
    /// and its output never affects the caller.
    pub async fn launch(&self, sdk_path: &Path) -> Result<Uuid, LaunchError> {
        self.launch_with(sdk_path, SdkOutput::Logged).await
    }

    /// Start `sdk_path`, routing its output as `output` says.
    pub async fn launch_with(
        &self,
        sdk_path: &Path,
        output: SdkOutput,
    ) -> Result<Uuid, LaunchError> {
        match tokio::fs::try_exists(sdk_path).await {
            Ok(true) => {}
            Ok(false) => return Err(LaunchError::NotFound(sdk_path.to_path_buf())),
            Err(source) => {
                return Err(LaunchError::Inaccessible {
                    path: sdk_path.to_path_buf(),
                    source,
                })
            }
        }

        self.cleanup_finished();

        let stdio = || match output {
            SdkOutput::Logged => Stdio::piped(),
            SdkOutput::Detached => Stdio::null(),
        };
        let mut child = Command::new(sdk_path)
            .stdin(Stdio::null())
            .stdout(stdio())
            .stderr(stdio())
            .spawn()
            .map_err(LaunchError::Spawn)?;

        let id = Uuid::new_v4();
        self.launches.insert(
            id,
            LaunchRecord {
                id,
                sdk_path: sdk_path.to_path_buf(),
                started_at: Utc::now(),
                finished_at: None,
                status: LaunchStatus::Running,
            },
        );
        info!(
            launch_id = %id,
            pid = ?child.id(),
            path = %sdk_path.display(),
            output = ?output,
            "Scanner SDK launched"
        );

        let stdout = child
            .stdout
            .take()
            .map(|out| tokio::spawn(log_output(id, out, OutputStream::Stdout)));
        let stderr = child
            .stderr
            .take()
            .map(|err| tokio::spawn(log_output(id, err, OutputStream::Stderr)));

        let launches = Arc::clone(&self.launches);
        tokio::spawn(async move {
            let status = match child.wait().await {
                Ok(exit) => LaunchStatus::Exited { code: exit.code() },
                Err(e) => LaunchStatus::Failed {
                    error: e.to_string(),
                },
            };

            for task in [stdout, stderr].into_iter().flatten() {
                let _ = task.await;
            }

            match &status {
                LaunchStatus::Exited { code: Some(0) } => {
                    info!(launch_id = %id, "Scanner SDK exited")
                }
                LaunchStatus::Exited { code } => {
                    warn!(launch_id = %id, code = ?code, "Scanner SDK exited abnormally")
                }
                LaunchStatus::Failed { error } => {
                    warn!(launch_id = %id, error = %error, "Error waiting for scanner SDK")
                }
                LaunchStatus::Running => {}
            }

            if let Some(mut record) = launches.get_mut(&id) {
                record.status = status;
                record.finished_at = Some(Utc::now());
            }
        });

        Ok(id)
    }

    /// Snapshot of a launch, if it is still tracked.
    pub fn status(&self, id: &Uuid) -> Option<LaunchRecord> {
        self.launches.get(id).map(|entry| entry.value().clone())
    }

    /// Number of launches whose process has not finished yet.
    pub fn running(&self) -> usize {
        self.launches
            .iter()
            .filter(|entry| !entry.status.is_finished())
            .count()
    }

    /// Drop finished launches past the retention window.
    pub fn cleanup_finished(&self) {
        let cutoff = Utc::now() - ChronoDuration::minutes(FINISHED_RETENTION_MINUTES);
        self.launches.retain(|_, record| match record.finished_at {
            Some(finished) => finished > cutoff,
            None => true,
        });
    }
}

impl std::fmt::Debug for ScannerLauncher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerLauncher")
            .field("launches", &self.launches.len())
            .finish()
    }
}

#[derive(Clone, Copy)]
enum OutputStream {
    Stdout,
    Stderr,
}

async fn log_output<R>(id: Uuid, reader: R, stream: OutputStream)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match stream {
            OutputStream::Stdout => info!(launch_id = %id, "SDK stdout: {}", line),
            OutputStream::Stderr => warn!(launch_id = %id, "SDK stderr: {}", line),
        }
    }
}
