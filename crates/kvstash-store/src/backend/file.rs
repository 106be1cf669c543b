//! Filesystem backend
//!
//! Maps each key to a file under a configured root directory, one root
//! per instance. The on-disk layout mirrors the key paths:
//!
//! ```text
//! <root_path>/<environment-or-empty>/<key-path-segments>
//! ```
//!
//! Reads and writes take an exclusive cross-process `flock` on the key
//! file with a bounded wait, so concurrent writers never interleave
//! partial writes and a reader never observes one. Locks are per
//! key-file; multi-key operations have no atomicity guarantee.

use crate::plugin::{BackendFactory, KvBackend, RawListing};
use kvstash_common::{BackendConfig, Error, Result};
use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use serde::Deserialize;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default storage root when the config names none
const DEFAULT_ROOT_PATH: &str = "/var/lib/kvstash/file";

/// Default bound on waiting for a key-file lock
const DEFAULT_LOCK_TIMEOUT_SECONDS: u64 = 5;

/// How long to sleep between non-blocking lock attempts
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Mode of the storage root: owner and group only
const ROOT_DIR_MODE: u32 = 0o750;

#[derive(Debug, Deserialize)]
struct FileSettings {
    #[serde(default = "FileSettings::default_root_path")]
    root_path: PathBuf,
    #[serde(default = "FileSettings::default_lock_timeout_seconds")]
    lock_timeout_seconds: u64,
}

impl FileSettings {
    fn default_root_path() -> PathBuf {
        PathBuf::from(DEFAULT_ROOT_PATH)
    }

    fn default_lock_timeout_seconds() -> u64 {
        DEFAULT_LOCK_TIMEOUT_SECONDS
    }
}

/// Factory for [`FileBackend`] instances
pub struct FileFactory;

impl BackendFactory for FileFactory {
    fn backend_type(&self) -> &'static str {
        "file"
    }

    fn construct(&self, name: &str, config: &BackendConfig) -> Result<Arc<dyn KvBackend>> {
        Ok(Arc::new(FileBackend::new(name, config)?))
    }
}

/// Filesystem realization of the backend plugin contract
#[derive(Debug)]
pub struct FileBackend {
    name: String,
    root: PathBuf,
    lock_timeout: Duration,
}

impl FileBackend {
    /// Build an instance, creating its root directory if missing.
    ///
    /// The root is created with owner+group-only permission. Failure
    /// to create or protect it fails construction.
    pub fn new(name: &str, config: &BackendConfig) -> Result<Self> {
        let settings: FileSettings = serde_json::from_value(config.settings_value())
            .map_err(|e| Error::construction(name, format!("invalid settings: {}", e)))?;

        fs::create_dir_all(&settings.root_path).map_err(|e| {
            Error::construction(
                name,
                format!("cannot create {}: {}", settings.root_path.display(), e),
            )
        })?;
        fs::set_permissions(&settings.root_path, fs::Permissions::from_mode(ROOT_DIR_MODE))
            .map_err(|e| {
                Error::construction(
                    name,
                    format!(
                        "cannot set permissions on {}: {}",
                        settings.root_path.display(),
                        e
                    ),
                )
            })?;

        debug!(instance = name, root = %settings.root_path.display(), "file backend constructed");
        Ok(Self {
            name: name.to_string(),
            root: settings.root_path,
            lock_timeout: Duration::from_secs(settings.lock_timeout_seconds),
        })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Take an exclusive advisory lock with a bounded wait.
    ///
    /// Polls the non-blocking lock until the timeout elapses; a lock
    /// held elsewhere past the deadline is a distinct timeout error,
    /// not an indefinite block.
    fn lock_exclusive(&self, mut file: File, path: &Path) -> Result<Flock<File>> {
        let deadline = Instant::now() + self.lock_timeout;
        loop {
            match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
                Ok(lock) => return Ok(lock),
                Err((unlocked, Errno::EAGAIN)) => {
                    if Instant::now() >= deadline {
                        return Err(Error::LockTimeout {
                            path: path.display().to_string(),
                            waited_ms: self.lock_timeout.as_millis() as u64,
                        });
                    }
                    file = unlocked;
                    thread::sleep(LOCK_RETRY_INTERVAL);
                }
                Err((_, errno)) => {
                    return Err(Error::operation(format!(
                        "cannot lock {}: {}",
                        path.display(),
                        errno
                    )));
                }
            }
        }
    }

    /// Locked read of one key file, shared by `get` and `list`
    fn read_locked(&self, key: &str) -> Result<String> {
        let path = self.key_path(key);
        let file = File::open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::KeyNotFound(key.to_string())
            } else {
                Error::Io(e)
            }
        })?;

        let mut locked = self.lock_exclusive(file, &path)?;
        let mut contents = String::new();
        locked.read_to_string(&mut contents).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                Error::MalformedEntry {
                    key: key.to_string(),
                    detail: "file contents are not valid UTF-8".to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        Ok(contents)
    }
}

impl KvBackend for FileBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            // an absent key does not need deleting
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::operation(format!("delete of {} failed: {}", key, e))),
        }
    }

    fn deletetree(&self, dir: &str) -> Result<()> {
        let path = self.key_path(dir);
        match fs::remove_dir_all(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                // a concurrent deleter may have won the race
                if path.exists() {
                    Err(Error::operation(format!(
                        "folder delete of {} failed: {}",
                        dir, e
                    )))
                } else {
                    Ok(())
                }
            }
        }
    }

    fn exists(&self, key: &str) -> Result<bool> {
        // an inaccessible path reports absent, never errors
        Ok(fs::metadata(self.key_path(key)).is_ok())
    }

    fn get(&self, key: &str) -> Result<String> {
        self.read_locked(key)
    }

    fn list(&self, dir: &str) -> Result<RawListing> {
        let path = self.key_path(dir);
        let entries = fs::read_dir(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FolderNotFound(dir.to_string())
            } else {
                Error::Io(e)
            }
        })?;

        let mut listing = RawListing::default();
        for entry in entries {
            // best-effort: an unreadable individual entry is skipped
            let Ok(entry) = entry else { continue };
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let Ok(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                listing.folders.push(name);
            } else {
                match self.read_locked(&format!("{}/{}", dir, name)) {
                    Ok(contents) => {
                        listing.keys.insert(name, contents);
                    }
                    Err(e) => {
                        debug!(instance = %self.name, entry = %name, error = %e,
                            "skipping unreadable entry in listing");
                    }
                }
            }
        }
        listing.folders.sort_unstable();
        Ok(listing)
    }

    fn put(&self, key: &str, serialized: &str) -> Result<()> {
        let path = self.key_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::operation(format!("cannot create folder for {}: {}", key, e)))?;
        }

        // open without truncation: the file must not be emptied before
        // the lock is held, or a concurrent reader sees a partial write
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let mut locked = self.lock_exclusive(file, &path)?;
        locked.write_all(serialized.as_bytes())?;
        locked.set_len(serialized.len() as u64)?;
        Ok(())
    }
}
