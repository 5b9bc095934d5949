use crate::store::{Store, StoreError};
use chrono::{DateTime, Utc};

/// Deletes every pending verification older than the code lifetime and returns how many went.
///
/// Runs before each issuance and at the start of each broadcast. When nothing expired the store
/// is left untouched and no write happens.
#[tracing::instrument(name = "Sweep expired verification codes", skip(store))]
pub fn sweep(store: &dyn Store, now: DateTime<Utc>) -> Result<usize, StoreError> {
    let removed = store.transact(|document| document.pending.remove_expired(now))?;
    if removed > 0 {
        tracing::info!(removed, "Purged expired verification codes");
    }
    Ok(removed)
}
