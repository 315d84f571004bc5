//! Single-shot watch for the scanner's output file.
//!
//! [`watch_for_stable_file`] registers an OS watch on the output file's
//! directory, waits for the file to appear, then waits for it to stop changing.
//! The whole wait runs under a hard deadline. The watch handle lives inside the
//! returned future, so every exit path (stable file, deadline, watch failure or
//! the caller dropping the future) tears it down.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// Quiet period before a detected file is treated as fully written
pub const STABILITY_THRESHOLD: Duration = Duration::from_millis(2000);

/// How often the file is re-checked during the quiet period
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Hard limit on the whole wait
pub const CAPTURE_DEADLINE: Duration = Duration::from_millis(30_000);

/// Timing of a capture watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchTimings {
    pub stability_threshold: Duration,
    pub poll_interval: Duration,
    pub deadline: Duration,
    /// Treat a file that already exists when the watch starts as detected
    pub include_existing: bool,
}

impl Default for WatchTimings {
    fn default() -> Self {
        Self {
            stability_threshold: STABILITY_THRESHOLD,
            poll_interval: POLL_INTERVAL,
            deadline: CAPTURE_DEADLINE,
            include_existing: true,
        }
    }
}

/// Terminal state of a watch. Exactly one is produced per watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The file exists and has not changed for the stability threshold
    Stable(PathBuf),
    /// The deadline elapsed first
    TimedOut,
    /// The watch backend or a stat call failed
    Failed(String),
}

/// Counts OS watches that are currently registered.
#[derive(Debug, Clone, Default)]
pub struct WatchTracker {
    active: Arc<AtomicUsize>,
}

impl WatchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    fn enter(&self) -> WatchGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        WatchGuard {
            active: Arc::clone(&self.active),
        }
    }
}

struct WatchGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Wait for `source` to appear and settle, bounded by `timings.deadline`.
pub async fn watch_for_stable_file(
    source: &Path,
    timings: &WatchTimings,
    tracker: &WatchTracker,
) -> WatchOutcome {
    match tokio::time::timeout(timings.deadline, wait_for_stable(source, timings, tracker)).await
    {
        Ok(Ok(path)) => WatchOutcome::Stable(path),
        Ok(Err(cause)) => WatchOutcome::Failed(cause),
        Err(_) => WatchOutcome::TimedOut,
    }
}

async fn wait_for_stable(
    source: &Path,
    timings: &WatchTimings,
    tracker: &WatchTracker,
) -> Result<PathBuf, String> {
    let file_name = source
        .file_name()
        .ok_or_else(|| format!("'{}' does not name a file", source.display()))?;
    let dir = watch_dir(source);

    let (tx, mut rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })
    .map_err(|e| e.to_string())?;
    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(|e| format!("{} ({})", e, dir.display()))?;
    let _guard = tracker.enter();
    debug!(path = %source.display(), "Watch registered");

    // Registered before the existence check so a file created in between is
    // still reported by the watcher.
    let mut detected = timings.include_existing
        && tokio::fs::try_exists(source)
            .await
            .map_err(|e| format!("{} ({})", e, source.display()))?;

    loop {
        while !detected {
            match rx.recv().await {
                Some(Ok(event)) => {
                    trace!(kind = ?event.kind, paths = ?event.paths, "Watch event");
                    if matches!(event.kind, EventKind::Remove(_)) {
                        ensure_dir_present(dir).await?;
                    }
                    detected = concerns(&event, file_name);
                }
                Some(Err(e)) => return Err(e.to_string()),
                None => return Err("watch channel closed".to_string()),
            }
        }

        match await_write_finish(source, timings)
            .await
            .map_err(|e| e.to_string())?
        {
            Settled::Stable => return Ok(source.to_path_buf()),
            Settled::Vanished => {
                debug!(path = %source.display(), "File removed before it settled");
                detected = false;
            }
        }
    }
}

/// The OS drops a watch whose directory is deleted, so no further events come.
async fn ensure_dir_present(dir: &Path) -> Result<(), String> {
    match tokio::fs::try_exists(dir).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(format!("watched directory removed ({})", dir.display())),
        Err(e) => Err(format!("{} ({})", e, dir.display())),
    }
}

fn watch_dir(source: &Path) -> &Path {
    match source.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn concerns(event: &Event, file_name: &OsStr) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any
    ) && event
        .paths
        .iter()
        .any(|path| path.file_name() == Some(file_name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    len: u64,
    modified: Option<SystemTime>,
}

async fn stamp(path: &Path) -> io::Result<FileStamp> {
    let meta = tokio::fs::metadata(path).await?;
    Ok(FileStamp {
        len: meta.len(),
        modified: meta.modified().ok(),
    })
}

enum Settled {
    Stable,
    Vanished,
}

/// Poll until size and mtime are unchanged for the stability threshold.
async fn await_write_finish(path: &Path, timings: &WatchTimings) -> io::Result<Settled> {
    let mut last = match stamp(path).await {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Settled::Vanished),
        Err(e) => return Err(e),
    };
    let mut last_change = Instant::now();

    let mut ticker = tokio::time::interval(timings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let current = match stamp(path).await {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Settled::Vanished),
            Err(e) => return Err(e),
        };

        if current != last {
            last = current;
            last_change = Instant::now();
        } else if last_change.elapsed() >= timings.stability_threshold {
            return Ok(Settled::Stable);
        }
    }
}
