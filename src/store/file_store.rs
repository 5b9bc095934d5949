use crate::domain::{PendingVerifications, SubscriberList};
use crate::store::{Store, StoreDocument, StoreError};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const SUBSCRIBERS_FILENAME: &str = "registered_emails.txt";
const PENDING_FILENAME: &str = "verification_codes.json";
const LOCK_FILENAME: &str = ".lock";

/// Flat-file store: a newline-delimited subscriber list and a JSON document of pending
/// verifications, both inside `data_dir`.
///
/// Mutual exclusion comes from an OS advisory lock (`flock`) on `data_dir/.lock`. Each operation
/// opens its own handle on the lock file, which makes the lock exclusive between threads of the
/// web server as well as between the server and a running broadcast job. Files are replaced
/// through a rename so a reader never observes a half-written document.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

/// Held for the duration of an operation, the lock is released when the handle is closed.
struct LockGuard {
    file: File,
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to release the store lock"
            );
        }
    }
}

impl FileStore {
    /// Creates `data_dir` if needed. Missing data files are treated as empty.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(|source| StoreError::Write {
            path: data_dir.clone(),
            source,
        })?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn subscribers_path(&self) -> PathBuf {
        self.data_dir.join(SUBSCRIBERS_FILENAME)
    }

    pub fn pending_path(&self) -> PathBuf {
        self.data_dir.join(PENDING_FILENAME)
    }

    fn lock(&self, exclusive: bool) -> Result<LockGuard, StoreError> {
        let path = self.data_dir.join(LOCK_FILENAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|source| StoreError::Lock {
                path: path.clone(),
                source,
            })?;
        let locked = if exclusive {
            file.lock_exclusive()
        } else {
            FileExt::lock_shared(&file)
        };
        locked.map_err(|source| StoreError::Lock {
            path: path.clone(),
            source,
        })?;
        Ok(LockGuard { file, path })
    }

    fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                path: path.to_owned(),
                source,
            }),
        }
    }

    fn read_document(&self) -> Result<StoreDocument, StoreError> {
        let subscribers = Self::read_optional(&self.subscribers_path())?
            .map(|contents| SubscriberList::parse(&contents))
            .unwrap_or_default();

        let pending_path = self.pending_path();
        let pending = match Self::read_optional(&pending_path)? {
            Some(contents) if !contents.trim().is_empty() => serde_json::from_str(&contents)
                .map_err(|source| StoreError::Corrupted {
                    path: pending_path.clone(),
                    source,
                })?,
            _ => PendingVerifications::default(),
        };

        Ok(StoreDocument {
            subscribers,
            pending,
        })
    }

    /// Puts the subscriber list back after the pending document could not be written, so a
    /// failed update leaves both files as they were.
    fn restore_subscribers(&self, subscribers: &SubscriberList) {
        let path = self.subscribers_path();
        if let Err(e) =
            Self::write_atomically(&path, subscribers.to_file_contents().as_bytes())
        {
            tracing::error!(
                error.cause_chain = ?e,
                path = %path.display(),
                "Failed to roll back the subscriber list"
            );
        }
    }

    /// Writes to a sibling temporary file, syncs it, then renames it over `path`.
    fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
        let tmp_path = path.with_extension("tmp");
        let write = || -> io::Result<()> {
            let mut file = File::create(&tmp_path)?;
            file.write_all(contents)?;
            file.sync_all()?;
            fs::rename(&tmp_path, path)
        };
        write().map_err(|source| StoreError::Write {
            path: path.to_owned(),
            source,
        })
    }
}

impl Store for FileStore {
    #[tracing::instrument(name = "Load the store", skip(self))]
    fn load(&self) -> Result<StoreDocument, StoreError> {
        let _guard = self.lock(false)?;
        self.read_document()
    }

    #[tracing::instrument(name = "Update the store", skip(self, mutation))]
    fn update(&self, mutation: &mut dyn FnMut(&mut StoreDocument)) -> Result<(), StoreError> {
        let _guard = self.lock(true)?;
        let current = self.read_document()?;
        let mut next = current.clone();
        mutation(&mut next);

        let subscribers_changed = next.subscribers != current.subscribers;
        let pending = if next.pending != current.pending {
            Some(serde_json::to_vec_pretty(&next.pending).map_err(StoreError::Serialize)?)
        } else {
            None
        };

        if subscribers_changed {
            Self::write_atomically(
                &self.subscribers_path(),
                next.subscribers.to_file_contents().as_bytes(),
            )?;
        }
        if let Some(json) = pending {
            if let Err(e) = Self::write_atomically(&self.pending_path(), &json) {
                if subscribers_changed {
                    self.restore_subscribers(&current.subscribers);
                }
                return Err(e);
            }
        }
        Ok(())
    }
}
