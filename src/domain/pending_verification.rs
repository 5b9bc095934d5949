use crate::domain::{Intent, SubscriberEmail, VerificationCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A code older than this can no longer be confirmed.
pub const CODE_TTL_SECONDS: i64 = 15 * 60;
/// Minimum delay between two issuances of the same intent for the same address.
pub const RESEND_COOLDOWN_SECONDS: i64 = 60;

/// The single outstanding code of an email address. The address itself is the key of the
/// enclosing [`PendingVerifications`] document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingVerification {
    pub code: VerificationCode,
    pub intent: Intent,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,
    #[serde(default)]
    pub attempts: u32,
}

impl PendingVerification {
    pub fn new(code: VerificationCode, intent: Intent, issued_at: DateTime<Utc>) -> Self {
        Self {
            code,
            intent,
            issued_at,
            attempts: 0,
        }
    }

    /// Whole seconds since issuance. A record stamped in the future counts as just issued.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.issued_at).num_seconds().max(0)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.elapsed_seconds(now) > CODE_TTL_SECONDS
    }

    /// Seconds left before another code may be issued, `None` once the cooldown is over.
    pub fn cooldown_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        let elapsed = self.elapsed_seconds(now);
        (elapsed < RESEND_COOLDOWN_SECONDS).then(|| RESEND_COOLDOWN_SECONDS - elapsed)
    }

    pub fn attempts_left(&self) -> u32 {
        self.intent.max_attempts().saturating_sub(self.attempts)
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.intent.max_attempts()
    }
}

/// Pending verifications keyed by email address. At most one record per address: inserting
/// overwrites.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingVerifications(BTreeMap<String, PendingVerification>);

impl PendingVerifications {
    pub fn get(&self, email: &SubscriberEmail) -> Option<&PendingVerification> {
        self.0.get(email.as_ref())
    }

    pub fn get_mut(&mut self, email: &SubscriberEmail) -> Option<&mut PendingVerification> {
        self.0.get_mut(email.as_ref())
    }

    pub fn insert(&mut self, email: &SubscriberEmail, record: PendingVerification) {
        self.0.insert(email.as_ref().to_owned(), record);
    }

    pub fn remove(&mut self, email: &SubscriberEmail) -> Option<PendingVerification> {
        self.0.remove(email.as_ref())
    }

    /// Drops every expired record and returns how many were removed.
    pub fn remove_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.0.len();
        self.0.retain(|_, record| !record.is_expired(now));
        before - self.0.len()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
