use crate::store::{Store, StoreDocument, StoreError};
use std::sync::Mutex;

/// A [`Store`] kept in process memory, guarded by a mutex. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    document: Mutex<StoreDocument>,
    writes: Mutex<usize>,
}

impl InMemoryStore {
    pub fn new(document: StoreDocument) -> Self {
        Self {
            document: Mutex::new(document),
            writes: Mutex::new(0),
        }
    }

    /// How many updates actually changed the document.
    pub fn writes(&self) -> usize {
        self.writes.lock().map(|w| *w).unwrap_or_default()
    }
}

impl Store for InMemoryStore {
    fn load(&self) -> Result<StoreDocument, StoreError> {
        let document = self.document.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(document.clone())
    }

    fn update(&self, mutation: &mut dyn FnMut(&mut StoreDocument)) -> Result<(), StoreError> {
        let mut document = self.document.lock().map_err(|_| StoreError::Poisoned)?;
        let mut next = document.clone();
        mutation(&mut next);
        if next != *document {
            *document = next;
            *self.writes.lock().map_err(|_| StoreError::Poisoned)? += 1;
        }
        Ok(())
    }
}
