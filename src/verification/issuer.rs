use crate::domain::{Intent, PendingVerification, SubscriberEmail, VerificationCode};
use crate::templates::verification_email;
use crate::verification::{parse_email, VerificationError, VerificationService};
use anyhow::Context;
use chrono::{DateTime, Utc};

/// A code that has been persisted and handed to the notifier.
///
/// The code itself is only meant for the delivery path: HTTP handlers must never echo it back.
#[derive(Debug)]
pub struct IssuedCode {
    pub email: SubscriberEmail,
    pub intent: Intent,
    pub code: VerificationCode,
}

impl VerificationService {
    /// Starts (or restarts) the `intent` flow for `email`.
    ///
    /// Expired records are swept, the subscription precondition is checked, and the per-intent
    /// resend cooldown is enforced in the same transaction that stores the new code. The new record
    /// replaces whatever was pending for the address.
    #[tracing::instrument(
        name = "Issue a verification code",
        skip(self, email, intent),
        fields(subscriber_email = %email, intent = %intent)
    )]
    pub fn issue(
        &self,
        email: &str,
        intent: Intent,
        now: DateTime<Utc>,
    ) -> Result<IssuedCode, VerificationError> {
        let email = parse_email(email)?;

        let code = self.store.transact(|document| {
            let removed = document.pending.remove_expired(now);
            if removed > 0 {
                tracing::info!(removed, "Purged expired verification codes");
            }

            let subscribed = document.subscribers.contains(&email);
            match intent {
                Intent::Subscribe if subscribed => return Err(VerificationError::AlreadySubscribed),
                Intent::Unsubscribe if !subscribed => return Err(VerificationError::NotSubscribed),
                _ => {}
            }

            if let Some(pending) = document.pending.get(&email) {
                if pending.intent == intent {
                    if let Some(wait_seconds) = pending.cooldown_remaining(now) {
                        return Err(VerificationError::RateLimited { wait_seconds });
                    }
                }
            }

            let code = VerificationCode::generate();
            document
                .pending
                .insert(&email, PendingVerification::new(code.clone(), intent, now));
            Ok(code)
        })??;

        let message = verification_email(&self.templates, &email, &code, intent)
            .context("Failed to render the verification email.")?;
        self.notifier
            .send(&message)
            .context("Failed to deliver the verification code.")?;

        tracing::info!("Verification code issued");
        Ok(IssuedCode {
            email,
            intent,
            code,
        })
    }

    /// Forgets the pending `intent` flow of `email`, if any, without issuing a new code.
    ///
    /// A pending record of the other intent is left alone: the unsubscribe page cannot cancel a
    /// subscription in progress and vice versa.
    #[tracing::instrument(
        name = "Discard a pending verification",
        skip(self, email, intent),
        fields(subscriber_email = %email, intent = %intent)
    )]
    pub fn discard(&self, email: &str, intent: Intent) -> Result<bool, VerificationError> {
        let email = parse_email(email)?;
        let discarded = self.store.transact(|document| {
            let same_intent = document
                .pending
                .get(&email)
                .map_or(false, |pending| pending.intent == intent);
            if same_intent {
                document.pending.remove(&email);
            }
            same_intent
        })?;
        Ok(discarded)
    }
}
