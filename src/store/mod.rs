//! Durable state shared by the web front end and the broadcast job.
//!
//! Both the subscriber list and the pending verifications live behind a single [`Store`]. Every
//! operation loads the whole document, mutates it and writes it back while holding exclusive
//! access, so two requests never interleave their read-modify-write cycles.

mod file_store;
mod memory_store;

pub use file_store::FileStore;
pub use memory_store::InMemoryStore;

use crate::domain::{PendingVerifications, SubscriberList};
use std::path::PathBuf;

/// Everything the store persists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreDocument {
    pub subscribers: SubscriberList,
    pub pending: PendingVerifications,
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Failed to acquire the store lock at {path}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a valid pending verification document")]
    Corrupted {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize the pending verification document")]
    Serialize(#[source] serde_json::Error),
    #[error("The in-memory store lock was poisoned")]
    Poisoned,
    #[error("The store did not apply the requested mutation")]
    MutationNotApplied,
}

/// A transactional key-value store holding a [`StoreDocument`].
pub trait Store: Send + Sync {
    /// A consistent snapshot of the current contents.
    fn load(&self) -> Result<StoreDocument, StoreError>;

    /// Runs `mutation` exactly once against the current contents while holding exclusive access,
    /// then persists whatever it changed. Nothing is written if the document is left untouched.
    fn update(&self, mutation: &mut dyn FnMut(&mut StoreDocument)) -> Result<(), StoreError>;
}

impl<'a> dyn Store + 'a {
    /// [`Store::update`] for closures that compute a result alongside the mutation.
    ///
    /// The result is only handed back once the changes have been persisted: if the write fails the
    /// caller gets a `StoreError` and must not report success.
    pub fn transact<T>(
        &self,
        mutation: impl FnOnce(&mut StoreDocument) -> T,
    ) -> Result<T, StoreError> {
        let mut mutation = Some(mutation);
        let mut output = None;
        self.update(&mut |document| {
            if let Some(mutation) = mutation.take() {
                output = Some(mutation(document));
            }
        })?;
        output.ok_or(StoreError::MutationNotApplied)
    }
}
