use crate::domain::{Intent, SubscriberEmail};
use crate::verification::{parse_email, VerificationError, VerificationService};
use chrono::{DateTime, Utc};

/// A successful confirmation: the subscriber list now reflects `intent`.
#[derive(Debug, PartialEq, Eq)]
pub struct Confirmed {
    pub email: SubscriberEmail,
    pub intent: Intent,
}

impl VerificationService {
    /// Checks `submitted_code` against the pending `intent` flow of `email`.
    ///
    /// Rules are evaluated in order: missing record, intent mismatch (record kept), expiry
    /// (record deleted), exhausted attempt budget (record deleted), matching code (record deleted,
    /// subscriber list updated), otherwise the attempt counter goes up. Every change is persisted
    /// before the outcome is returned.
    #[tracing::instrument(
        name = "Verify a submitted code",
        skip(self, email, submitted_code, intent),
        fields(subscriber_email = %email, intent = %intent)
    )]
    pub fn verify(
        &self,
        email: &str,
        submitted_code: &str,
        intent: Intent,
        now: DateTime<Utc>,
    ) -> Result<Confirmed, VerificationError> {
        let email = parse_email(email)?;

        self.store.transact(|document| {
            let pending = match document.pending.get_mut(&email) {
                Some(pending) => pending,
                None => return Err(VerificationError::NoCodeFound),
            };

            if pending.intent != intent {
                return Err(VerificationError::IntentMismatch);
            }
            if pending.is_expired(now) {
                document.pending.remove(&email);
                return Err(VerificationError::Expired);
            }
            if pending.is_exhausted() {
                document.pending.remove(&email);
                return Err(VerificationError::AttemptsExhausted);
            }
            if !pending.code.matches(submitted_code) {
                pending.attempts += 1;
                return Err(VerificationError::CodeMismatch {
                    attempts_remaining: pending.attempts_left(),
                });
            }

            document.pending.remove(&email);
            match intent {
                Intent::Subscribe => document.subscribers.insert(&email),
                Intent::Unsubscribe => document.subscribers.remove(&email),
            };
            Ok(())
        })??;

        tracing::info!("Verification code confirmed");
        Ok(Confirmed { email, intent })
    }
}
