//! # Project Files
//!
//! Saving and loading [`ShaftProject`]s:
//! - **Atomic saves**: write `.csd.tmp`, fsync, rename over the target
//! - **Advisory locking**: OS lock via `fs2` plus a `.csd.lock` JSON file
//!   naming the holder
//! - **Version check**: files from a newer schema are refused
//!
//! ## Example
//!
//! ```rust,no_run
//! use shaft_core::file_io::{load_project, save_project, FileLock};
//! use shaft_core::project::ShaftProject;
//! use std::path::Path;
//!
//! let project = ShaftProject::new("Designer", "CD-001");
//! let path = Path::new("input_shaft.csd");
//!
//! let lock = FileLock::acquire(path, "designer@example.com")?;
//! save_project(&project, path)?;
//! drop(lock);
//!
//! let reloaded = load_project(path)?;
//! assert_eq!(reloaded.meta.job_id, "CD-001");
//! # Ok::<(), shaft_core::errors::CalcError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{CalcError, CalcResult};
use crate::project::{ShaftProject, SCHEMA_VERSION};

/// File extension of project files
pub const PROJECT_EXTENSION: &str = "csd";

/// Locks older than this are taken over
const STALE_LOCK_HOURS: i64 = 24;

/// Holder details written to the `.lock` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    pub machine: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// Holder that died on this machine, or a lock past its age limit.
    fn is_stale(&self) -> bool {
        let same_machine = hostname().is_some_and(|h| h == self.machine);
        if same_machine && !process_alive(self.pid) {
            return true;
        }
        Utc::now() - self.locked_at > Duration::hours(STALE_LOCK_HOURS)
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME").ok().or_else(|| std::env::var("HOST").ok())
    }
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{}", pid)).exists()
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// Exclusive lock on a project file, released on drop.
pub struct FileLock {
    project_path: PathBuf,
    lock_path: PathBuf,
    /// Keeps the OS-level lock alive
    _handle: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire the lock, taking over stale ones.
    ///
    /// Fails with [`CalcError::FileLocked`] while another live holder exists.
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> CalcResult<Self> {
        if let Some(holder) = FileLock::check(path) {
            return Err(CalcError::file_locked(
                path.display().to_string(),
                format!("{} ({})", holder.user_id, holder.machine),
                holder.locked_at.to_rfc3339(),
            ));
        }

        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);
        let lock_err = |op: &str, e: std::io::Error| CalcError::file_error(op, lock_path.display().to_string(), e.to_string());

        let mut handle = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| lock_err("create lock", e))?;

        handle.try_lock_exclusive().map_err(|_| {
            CalcError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        handle
            .write_all(to_json(&info)?.as_bytes())
            .map_err(|e| lock_err("write lock", e))?;
        handle.sync_all().map_err(|e| lock_err("sync lock", e))?;

        debug!(path = %path.display(), user = %info.user_id, "Project lock acquired");
        Ok(FileLock {
            project_path: path.to_path_buf(),
            lock_path,
            _handle: handle,
            info,
        })
    }

    /// Live lock holder of a project file, if any.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let contents = fs::read_to_string(lock_path_for(path)).ok()?;
        let info: LockInfo = serde_json::from_str(&contents).ok()?;
        (!info.is_stale()).then_some(info)
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// `project.csd` -> `project.csd.lock`
fn lock_path_for(project_path: &Path) -> PathBuf {
    sibling_with_suffix(project_path, "lock")
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let extension = match path.extension() {
        Some(ext) => format!("{}.{}", ext.to_string_lossy(), suffix),
        None => suffix.to_string(),
    };
    path.with_extension(extension)
}

fn to_json<T: Serialize>(value: &T) -> CalcResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| CalcError::SerializationError { reason: e.to_string() })
}

/// Save a project atomically.
///
/// The JSON goes to a `.tmp` sibling first, is synced to disk and then
/// renamed over `path`, so an interrupted save never leaves a torn file.
pub fn save_project(project: &ShaftProject, path: &Path) -> CalcResult<()> {
    let json = to_json(project)?;
    let tmp_path = sibling_with_suffix(path, "tmp");
    let tmp_err = |op: &str, e: std::io::Error| CalcError::file_error(op, tmp_path.display().to_string(), e.to_string());

    let mut tmp_file = File::create(&tmp_path).map_err(|e| tmp_err("create temp file", e))?;
    tmp_file
        .write_all(json.as_bytes())
        .map_err(|e| tmp_err("write temp file", e))?;
    tmp_file.sync_all().map_err(|e| tmp_err("sync temp file", e))?;
    drop(tmp_file);

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(CalcError::file_error("rename to final", path.display().to_string(), e.to_string()));
    }

    info!(path = %path.display(), job = %project.meta.job_id, "Project saved");
    Ok(())
}

/// Load a project and check its schema version.
pub fn load_project(path: &Path) -> CalcResult<ShaftProject> {
    let contents =
        fs::read_to_string(path).map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;

    let project: ShaftProject = serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
        reason: format!("Invalid project file {}: {}", path.display(), e),
    })?;
    validate_version(&project.meta.version)?;

    debug!(path = %path.display(), version = %project.meta.version, "Project loaded");
    Ok(project)
}

/// Load a project and report a foreign lock holder, if any.
///
/// A locked project is still returned so it can be opened read-only.
pub fn load_project_with_lock_check(path: &Path) -> CalcResult<(ShaftProject, Option<LockInfo>)> {
    let project = load_project(path)?;
    let holder = FileLock::check(path);
    if let Some(info) = &holder {
        warn!(path = %path.display(), holder = %info.user_id, "Project is locked by another user");
    }
    Ok((project, holder))
}

/// Major versions must match; within 0.x a newer minor is refused.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };
    let file = parse(file_version);
    let current = parse(SCHEMA_VERSION);

    let compatible = match (file.as_slice(), current.as_slice()) {
        ([file_major, rest @ ..], [current_major, current_rest @ ..]) if file_major == current_major => {
            match (rest.first(), current_rest.first()) {
                (Some(file_minor), Some(current_minor)) if *current_major == 0 => file_minor <= current_minor,
                _ => true,
            }
        }
        _ => false,
    };

    if compatible {
        Ok(())
    } else {
        Err(CalcError::VersionMismatch {
            file_version: file_version.to_string(),
            expected_version: SCHEMA_VERSION.to_string(),
        })
    }
}
