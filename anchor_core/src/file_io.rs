//! # File I/O Module
//!
//! Handles interchange file operations with safety features:
//! - **Atomic saves**: Write to .tmp, sync, rename to prevent corruption
//! - **File locking**: Prevent concurrent edits on shared drives
//!
//! ## File Format
//!
//! A section is stored as the CSV produced by [`crate::interchange`].
//! Lock files sit next to it with a `.lock` suffix (`anchors.csv.lock`) and
//! hold metadata about who holds the lock.
//!
//! ## Example
//!
//! ```rust,no_run
//! use anchor_core::file_io::{load_dataset, save_dataset, FileLock};
//! use anchor_core::project::{Anchor, Dataset, ProjectGlobals};
//! use std::path::Path;
//!
//! let mut dataset = Dataset::new(ProjectGlobals::default());
//! dataset.add_anchor(Anchor::new(0.0, 8.0, -25.0, 10.0, 10.0));
//! let path = Path::new("anchors.csv");
//!
//! // Acquire lock before saving
//! let lock = FileLock::acquire(path, "engineer@company.com").unwrap();
//!
//! // Save with atomic write
//! save_dataset(&dataset, path).unwrap();
//!
//! // Lock is released when dropped
//! drop(lock);
//!
//! let outcome = load_dataset(path).unwrap();
//! assert_eq!(outcome.dataset.anchors.len(), 1);
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{CalcError, CalcResult};
use crate::interchange::{export_dataset, import_csv, ImportOutcome};
use crate::project::Dataset;

/// Lock file metadata stored in .lock files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    /// Machine name where lock was acquired
    pub machine: String,
    /// Process ID that holds the lock
    pub pid: u32,
    /// When the lock was acquired
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }
}

/// Get the hostname of the current machine
fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::env::var("HOST").ok())
    }
}

/// File lock guard that releases the lock when dropped.
///
/// Uses both:
/// 1. OS-level file locking (via fs2) for process safety
/// 2. .lock file with metadata for user visibility
pub struct FileLock {
    /// Path to the locked data file
    data_path: PathBuf,
    /// Path to the lock file
    lock_path: PathBuf,
    /// Keeps the OS lock alive
    _lock_file: File,
    /// Lock metadata
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on an interchange file.
    ///
    /// # Returns
    ///
    /// * `Ok(FileLock)` - Lock acquired successfully
    /// * `Err(CalcError::FileLocked)` - Another process holds the lock
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use anchor_core::file_io::FileLock;
    /// use std::path::Path;
    ///
    /// let lock = FileLock::acquire(Path::new("anchors.csv"), "user@email.com")?;
    /// // ... do work ...
    /// drop(lock); // releases lock
    /// # Ok::<(), anchor_core::errors::CalcError>(())
    /// ```
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> CalcResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if lock_path.exists() {
            if let Ok(existing) = read_lock_info(&lock_path) {
                if !is_lock_stale(&existing) {
                    return Err(CalcError::file_locked(
                        path.display().to_string(),
                        format!("{} ({})", existing.user_id, existing.machine),
                        existing.locked_at.to_rfc3339(),
                    ));
                }
                warn!(
                    path = %path.display(),
                    holder = %existing.user_id,
                    "taking over stale lock"
                );
            }
        }

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| CalcError::file_error("create lock", lock_path.display().to_string(), e.to_string()))?;

        // Non-blocking exclusive OS lock
        lock_file.try_lock_exclusive().map_err(|_| {
            CalcError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        let lock_json = serde_json::to_string_pretty(&info)?;
        lock_file
            .write_all(lock_json.as_bytes())
            .map_err(|e| CalcError::file_error("write lock", lock_path.display().to_string(), e.to_string()))?;
        lock_file
            .sync_all()
            .map_err(|e| CalcError::file_error("sync lock", lock_path.display().to_string(), e.to_string()))?;

        debug!(path = %path.display(), user = %info.user_id, "lock acquired");

        Ok(FileLock {
            data_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Check if a file is locked without acquiring the lock.
    ///
    /// Returns `Some(LockInfo)` if locked, `None` if available.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = lock_path_for(path);
        if lock_path.exists() {
            if let Ok(info) = read_lock_info(&lock_path) {
                if !is_lock_stale(&info) {
                    return Some(info);
                }
            }
        }
        None
    }

    /// Get the path to the locked data file
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
        // OS lock goes with _lock_file
    }
}

/// Append a suffix to the full file name: `anchors.csv` -> `anchors.csv.lock`
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut sibling = path.to_path_buf();
    let extension = sibling
        .extension()
        .map(|e| format!("{}.{}", e.to_string_lossy(), suffix))
        .unwrap_or_else(|| suffix.to_string());
    sibling.set_extension(extension);
    sibling
}

/// Get the lock file path for a data file
fn lock_path_for(data_path: &Path) -> PathBuf {
    sibling_path(data_path, "lock")
}

/// Read lock info from a lock file
fn read_lock_info(lock_path: &Path) -> CalcResult<LockInfo> {
    let mut file = File::open(lock_path)
        .map_err(|e| CalcError::file_error("read lock", lock_path.display().to_string(), e.to_string()))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| CalcError::file_error("read lock", lock_path.display().to_string(), e.to_string()))?;

    Ok(serde_json::from_str(&contents)?)
}

/// Check if a lock is stale (the process that created it is no longer running)
fn is_lock_stale(info: &LockInfo) -> bool {
    if let Some(our_machine) = hostname() {
        if info.machine == our_machine {
            #[cfg(windows)]
            {
                use std::process::Command;
                let output = Command::new("tasklist")
                    .args(["/FI", &format!("PID eq {}", info.pid), "/NH"])
                    .output();
                if let Ok(output) = output {
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    if stdout.contains("No tasks") || !stdout.contains(&info.pid.to_string()) {
                        return true;
                    }
                }
            }
            #[cfg(unix)]
            {
                if fs::metadata(format!("/proc/{}", info.pid)).is_err() {
                    return true;
                }
            }
        }
    }

    // Older than a day
    let age = Utc::now() - info.locked_at;
    age.num_hours() > 24
}

/// Write bytes to a file with atomic write semantics.
///
/// The save process:
/// 1. Write to a temporary file (`<name>.tmp`)
/// 2. Sync to disk (fsync)
/// 3. Rename over the target (atomic on most filesystems)
pub fn write_atomic(path: &Path, bytes: &[u8]) -> CalcResult<()> {
    let tmp_path = sibling_path(path, "tmp");

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(bytes).map_err(|e| {
        CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    Ok(())
}

/// Save a dataset as an interchange CSV, atomically.
///
/// # Example
///
/// ```rust,no_run
/// use anchor_core::file_io::save_dataset;
/// use anchor_core::project::Dataset;
/// use std::path::Path;
///
/// save_dataset(&Dataset::default(), Path::new("anchors.csv"))?;
/// # Ok::<(), anchor_core::errors::CalcError>(())
/// ```
pub fn save_dataset(dataset: &Dataset, path: &Path) -> CalcResult<()> {
    let bytes = export_dataset(dataset)?;
    write_atomic(path, &bytes)?;
    info!(
        path = %path.display(),
        anchors = dataset.anchor_count(),
        bytes = bytes.len(),
        "dataset saved"
    );
    Ok(())
}

/// Load a dataset from an interchange CSV.
///
/// # Returns
///
/// * `Ok(ImportOutcome)` - Imported dataset with skipped rows and payload diagnostics
/// * `Err(CalcError::FileError)` - I/O error
/// * `Err(CalcError::SerializationError)` - File is not readable as CSV
pub fn load_dataset(path: &Path) -> CalcResult<ImportOutcome> {
    let bytes = fs::read(path).map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;

    let outcome = import_csv(&bytes)?;
    info!(
        path = %path.display(),
        anchors = outcome.dataset.anchor_count(),
        skipped = outcome.skipped.len(),
        "dataset loaded"
    );
    Ok(outcome)
}

/// Load a dataset, returning whether it's read-only due to a lock.
///
/// # Returns
///
/// * `Ok((outcome, None))` - Loaded successfully, no lock
/// * `Ok((outcome, Some(LockInfo)))` - Loaded, but another user has the lock
/// * `Err(_)` - Failed to load
pub fn load_dataset_with_lock_check(path: &Path) -> CalcResult<(ImportOutcome, Option<LockInfo>)> {
    let outcome = load_dataset(path)?;
    let lock_info = FileLock::check(path);
    Ok((outcome, lock_info))
}

/// Write any serializable result as pretty JSON, atomically.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(path, json.as_bytes())?;
    info!(path = %path.display(), "report saved");
    Ok(())
}
