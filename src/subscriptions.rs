use crate::domain::SubscriberEmail;
use crate::store::{Store, StoreError};
use std::sync::Arc;

/// The confirmed subscribers. Each call is a full read-modify-write of the store.
#[derive(Clone)]
pub struct SubscriptionStore {
    store: Arc<dyn Store>,
}

impl SubscriptionStore {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Returns `false` if the address was already subscribed.
    #[tracing::instrument(name = "Add a subscriber", skip(self))]
    pub fn add(&self, email: &SubscriberEmail) -> Result<bool, StoreError> {
        self.store
            .transact(|document| document.subscribers.insert(email))
    }

    /// Returns `false` if the address was not subscribed.
    #[tracing::instrument(name = "Remove a subscriber", skip(self))]
    pub fn remove(&self, email: &SubscriberEmail) -> Result<bool, StoreError> {
        self.store
            .transact(|document| document.subscribers.remove(email))
    }

    pub fn contains(&self, email: &SubscriberEmail) -> Result<bool, StoreError> {
        Ok(self.store.load()?.subscribers.contains(email))
    }

    /// Subscribers with a valid, non-empty address.
    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.store.load()?.subscribers.valid_count())
    }

    /// Subscribers in insertion order.
    ///
    /// We are returning a `Vec` of `Result`s in the happy case. This allows the caller to bubble up
    /// errors due to I/O failures using the `?` operator, while the compiler forces them to handle
    /// the subtler case of an entry that is not a valid address (the list can be edited by hand).
    #[tracing::instrument(name = "List subscribers", skip(self))]
    pub fn list(&self) -> Result<Vec<Result<SubscriberEmail, anyhow::Error>>, StoreError> {
        let document = self.store.load()?;
        let subscribers = document
            .subscribers
            .entries()
            .map(|entry| SubscriberEmail::parse(entry.to_string()).map_err(|e| anyhow::anyhow!(e)))
            .collect();
        Ok(subscribers)
    }
}
