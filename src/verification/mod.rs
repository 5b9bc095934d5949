//! Verification-code issuance and confirmation, shared by the subscribe and unsubscribe flows.
//!
//! A flow for an email address goes through at most one pending verification at a time:
//!
//! ```text
//! NoPending --issue--> Pending --verify--> Confirmed | Expired | Exhausted   (record deleted)
//!                         |  \--wrong code--> Pending (attempts + 1)
//!                         \----wrong intent--> Pending (untouched)
//! ```
//!
//! Time is always supplied by the caller, windows are evaluated lazily against it.

mod error;
mod issuer;
mod sweeper;
mod verifier;

pub use error::VerificationError;
pub use issuer::IssuedCode;
pub use sweeper::sweep;
pub use verifier::Confirmed;

use crate::domain::SubscriberEmail;
use crate::notifier::Notifier;
use crate::store::Store;
use std::sync::Arc;
use tera::Tera;

pub struct VerificationService {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    templates: Arc<Tera>,
}

impl VerificationService {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>, templates: Arc<Tera>) -> Self {
        Self {
            store,
            notifier,
            templates,
        }
    }
}

fn parse_email(email: &str) -> Result<SubscriberEmail, VerificationError> {
    SubscriberEmail::parse(email.to_string()).map_err(VerificationError::InvalidEmail)
}
