//! One-time preparation of local resources.
//!
//! Same observe-before-mutate approach as node writes, applied to a local
//! artifact: a small fingerprint file is kept beside the prepared resource,
//! and preparation runs only when the desired fingerprint differs from the
//! recorded one.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::Error;

/// Result of comparing the recorded fingerprint with the desired one.
#[derive(Clone, Debug, PartialEq)]
pub struct LockState<T> {
    /// Fingerprint found on disk, if any.
    pub locked: Option<T>,
    /// Fingerprint the caller wants.
    pub current: T,
    pub up_to_date: bool,
}

/// Fingerprint file guarding an expensive preparation step.
///
/// # Example
///
/// ```rust,ignore
/// let lock = PrepareLock::new(dir.join("lock/create.json"), ToolLock { url });
/// let prepared = lock.prepare_once(|| download(&url, &jar))?;
/// ```
#[derive(Clone, Debug)]
pub struct PrepareLock<T> {
    file: PathBuf,
    desired: T,
}

impl<T> PrepareLock<T>
where
    T: Serialize + DeserializeOwned + PartialEq + Clone,
{
    pub fn new(file: impl Into<PathBuf>, desired: T) -> Self {
        Self {
            file: file.into(),
            desired,
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Compare the recorded fingerprint with the desired one.
    ///
    /// A missing file means "not prepared yet", not an error.
    pub fn state(&self) -> Result<LockState<T>, Error> {
        let locked = if self.file.exists() {
            let content = fs::read_to_string(&self.file).map_err(|source| Error::Io {
                path: self.file.clone(),
                source,
            })?;
            Some(serde_json::from_str::<T>(&content)?)
        } else {
            None
        };
        let up_to_date = locked.as_ref() == Some(&self.desired);
        Ok(LockState {
            locked,
            current: self.desired.clone(),
            up_to_date,
        })
    }

    /// Record the desired fingerprint.
    pub fn lock(&self) -> Result<(), Error> {
        if let Some(dir) = self.file.parent() {
            fs::create_dir_all(dir).map_err(|source| Error::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(&self.desired)?;
        fs::write(&self.file, content).map_err(|source| Error::Io {
            path: self.file.clone(),
            source,
        })
    }

    /// Run `prepare` unless the recorded fingerprint already matches.
    ///
    /// The fingerprint is written only after `prepare` succeeds, so a failed
    /// attempt is retried next time. Returns whether `prepare` ran.
    pub fn prepare_once<F>(&self, prepare: F) -> Result<bool, Error>
    where
        F: FnOnce() -> Result<(), Error>,
    {
        if self.state()?.up_to_date {
            debug!(lock = %self.file.display(), "resource is up-to-date");
            return Ok(false);
        }
        info!(lock = %self.file.display(), "preparing resource");
        prepare()?;
        self.lock()?;
        info!(lock = %self.file.display(), "prepared resource");
        Ok(true)
    }
}
