//! Cross-process run lock.
//!
//! The lock is a file holding the owner's PID. It is published with a hard link from a
//! fully written temp file, so the lock path never exists without its PID and two
//! processes can never both create it. A marker whose PID is no longer running is
//! reclaimed. A marker that does not parse is treated as held until it is older than
//! [`UNREADABLE_GRACE`], then reclaimed.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

/// How long an unparsable marker is assumed to belong to a live owner.
pub const UNREADABLE_GRACE: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum LockError {
    #[error("failed to create lock directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to create lock file {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read lock file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to remove stale lock file {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("lock file {path} kept reappearing")]
    Contended { path: PathBuf },
}

#[derive(Debug)]
pub enum LockOutcome {
    Acquired(LockGuard),
    /// Another process holds the lock. `pid` is `None` while its marker is unreadable.
    AlreadyRunning { pid: Option<u32> },
}

/// Owns the lock file; removes it on drop if it still carries this process's PID.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    pid: u32,
}

impl LockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        match read_pid(&self.path) {
            Ok(Some(pid)) if pid == self.pid => {}
            Ok(_) => {
                warn!(path = %self.path.display(), "lock no longer ours, leaving it");
                return;
            }
            Err(err) if err.kind() == ErrorKind::NotFound => return,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read lock on release");
                return;
            }
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "lock released"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!(path = %self.path.display(), error = %err, "failed to release lock"),
        }
    }
}

enum Marker {
    Live(u32),
    Unreadable,
    Stale,
    Gone,
}

pub struct PipelineLock;

impl PipelineLock {
    pub fn acquire(path: &Path) -> Result<LockOutcome, LockError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| LockError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let pid = std::process::id();
        for _ in 0..2 {
            if publish(path, pid)? {
                info!(path = %path.display(), pid, "lock acquired");
                return Ok(LockOutcome::Acquired(LockGuard {
                    path: path.to_path_buf(),
                    pid,
                }));
            }

            match inspect(path)? {
                Marker::Live(owner) => {
                    warn!(pid = owner, "pipeline already running");
                    return Ok(LockOutcome::AlreadyRunning { pid: Some(owner) });
                }
                Marker::Unreadable => {
                    warn!(path = %path.display(), "lock marker unreadable but recent, assuming held");
                    return Ok(LockOutcome::AlreadyRunning { pid: None });
                }
                Marker::Gone => {}
                Marker::Stale => {
                    if let Some(owner) = reclaim(path, pid)? {
                        return Ok(LockOutcome::AlreadyRunning { pid: Some(owner) });
                    }
                }
            }
        }

        Err(LockError::Contended {
            path: path.to_path_buf(),
        })
    }
}

fn side_path(path: &Path, pid: u32, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "lock".to_string());
    path.with_file_name(format!(".{name}.{pid}.{suffix}"))
}

/// Writes the PID to a private temp file and links it onto `path`. Returns `false`
/// when the lock path already exists.
fn publish(path: &Path, pid: u32) -> Result<bool, LockError> {
    let create_err = |source| LockError::Create {
        path: path.to_path_buf(),
        source,
    };
    let tmp = side_path(path, pid, "tmp");
    let written = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp)
        .and_then(|mut file| {
            file.write_all(pid.to_string().as_bytes())?;
            file.sync_all()
        });
    if let Err(source) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(create_err(source));
    }

    let linked = std::fs::hard_link(&tmp, path);
    let _ = std::fs::remove_file(&tmp);
    match linked {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(source) => Err(create_err(source)),
    }
}

fn read_pid(path: &Path) -> std::io::Result<Option<u32>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents.trim().parse::<u32>().ok())
}

fn inspect(path: &Path) -> Result<Marker, LockError> {
    let read_err = |source| LockError::Read {
        path: path.to_path_buf(),
        source,
    };
    match read_pid(path) {
        Ok(Some(owner)) if pid_alive(owner) => Ok(Marker::Live(owner)),
        Ok(Some(owner)) => {
            warn!(pid = owner, "found stale lock from dead process");
            Ok(Marker::Stale)
        }
        Ok(None) => {
            let age = std::fs::metadata(path)
                .and_then(|m| m.modified())
                .map_err(read_err)?
                .elapsed()
                .unwrap_or_default();
            if age < UNREADABLE_GRACE {
                Ok(Marker::Unreadable)
            } else {
                warn!(path = %path.display(), age_secs = age.as_secs(), "found abandoned unreadable lock");
                Ok(Marker::Stale)
            }
        }
        // Released between our publish attempt and the read.
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Marker::Gone),
        Err(source) => Err(read_err(source)),
    }
}

/// Moves a stale marker aside and deletes it. If what was moved turns out to be a live
/// owner's fresh marker, it is linked back and that owner is returned.
fn reclaim(path: &Path, pid: u32) -> Result<Option<u32>, LockError> {
    let staged = side_path(path, pid, "stale");
    match std::fs::rename(path, &staged) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(LockError::Remove {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    let owner = read_pid(&staged)
        .ok()
        .flatten()
        .filter(|&owner| pid_alive(owner));
    if let Some(owner) = owner {
        warn!(pid = owner, "lock was taken over while reclaiming, restoring it");
        let _ = std::fs::hard_link(&staged, path);
    }
    std::fs::remove_file(&staged).map_err(|source| LockError::Remove {
        path: staged.clone(),
        source,
    })?;
    Ok(owner)
}

/// Whether a process with `pid` exists.
#[cfg(unix)]
pub fn pid_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }
    // SAFETY: signal 0 performs the existence and permission checks only.
    let rc = unsafe { libc::kill(pid, 0) };
    rc == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

/// Whether a process with `pid` exists. Without a portable liveness check only the current
/// process is known to be alive.
#[cfg(not(unix))]
pub fn pid_alive(pid: u32) -> bool {
    pid == std::process::id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn age(path: &Path, by: Duration) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - by).unwrap();
    }

    fn leftovers(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".tmp") || n.ends_with(".stale"))
            .collect()
    }

    #[test]
    fn guard_removes_file_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("pipeline.lock");
        let LockOutcome::Acquired(guard) = PipelineLock::acquire(&path).unwrap() else {
            panic!("expected to acquire");
        };
        let stored = std::fs::read_to_string(&path).unwrap();
        assert_eq!(stored, std::process::id().to_string());
        assert!(leftovers(path.parent().unwrap()).is_empty());
        drop(guard);
        assert!(!path.exists());
    }

    #[test]
    fn live_owner_blocks_second_acquire() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipeline.lock");
        let _guard = PipelineLock::acquire(&path).unwrap();
        match PipelineLock::acquire(&path).unwrap() {
            LockOutcome::AlreadyRunning { pid } => assert_eq!(pid, Some(std::process::id())),
            LockOutcome::Acquired(_) => panic!("lock acquired twice"),
        }
    }

    #[test]
    fn marker_without_pid_yet_is_held() {
        // Another owner created the file but has not written its PID.
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipeline.lock");
        OpenOptions::new().write(true).create_new(true).open(&path).unwrap();

        match PipelineLock::acquire(&path).unwrap() {
            LockOutcome::AlreadyRunning { pid } => assert_eq!(pid, None),
            LockOutcome::Acquired(_) => panic!("took a lock that is still being written"),
        }
        assert!(path.exists());
    }

    #[test]
    fn abandoned_unreadable_marker_is_reclaimed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipeline.lock");
        std::fs::write(&path, "not a pid").unwrap();
        age(&path, UNREADABLE_GRACE * 4);

        let LockOutcome::Acquired(_guard) = PipelineLock::acquire(&path).unwrap() else {
            panic!("expected to reclaim");
        };
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            std::process::id().to_string()
        );
        assert!(leftovers(dir.path()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn dead_owner_is_reclaimed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipeline.lock");
        std::fs::write(&path, i32::MAX.to_string()).unwrap();
        assert!(matches!(
            PipelineLock::acquire(&path).unwrap(),
            LockOutcome::Acquired(_)
        ));
    }

    #[test]
    fn guard_leaves_a_foreign_marker_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipeline.lock");
        let LockOutcome::Acquired(guard) = PipelineLock::acquire(&path).unwrap() else {
            panic!("expected to acquire");
        };
        std::fs::write(&path, "1").unwrap();
        drop(guard);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1");
    }

    #[cfg(unix)]
    #[test]
    fn dead_pid_is_not_alive() {
        assert!(!pid_alive(i32::MAX as u32));
        assert!(pid_alive(std::process::id()));
    }
}
