//! The periodic digest job: one email per subscriber with the latest public GitHub events.
use crate::configuration::Settings;
use crate::digest::Digest;
use crate::github_client::{FetchError, GitHubClient};
use crate::notifier::{LogNotifier, Notifier};
use crate::store::{FileStore, Store, StoreError};
use crate::subscriptions::SubscriptionStore;
use crate::telemetry::spawn_blocking_with_tracing;
use crate::templates::build_templates;
use crate::utils::error_chain_fmt;
use crate::verification::sweep;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tera::Tera;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub failed: usize,
    /// Subscriber entries that are not valid addresses.
    pub skipped: usize,
}

#[derive(thiserror::Error)]
pub enum BroadcastError {
    #[error("No subscribers to send the digest to")]
    NoSubscribers,
    #[error("Failed to fetch GitHub updates")]
    Fetch(#[from] FetchError),
    #[error("Failed to access the subscription store")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl std::fmt::Debug for BroadcastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

pub struct Broadcaster {
    store: Arc<dyn Store>,
    subscriptions: SubscriptionStore,
    github: GitHubClient,
    notifier: Arc<dyn Notifier>,
    templates: Arc<Tera>,
    base_url: String,
    delay: Duration,
}

impl Broadcaster {
    pub fn new(
        store: Arc<dyn Store>,
        github: GitHubClient,
        notifier: Arc<dyn Notifier>,
        templates: Arc<Tera>,
        base_url: String,
        delay: Duration,
    ) -> Self {
        Self {
            subscriptions: SubscriptionStore::new(store.clone()),
            store,
            github,
            notifier,
            templates,
            base_url,
            delay,
        }
    }

    /// Wires the job against the same data directory and log file as the web front end.
    pub fn from_settings(configuration: &Settings) -> Result<Self, anyhow::Error> {
        let store = FileStore::open(&configuration.storage.data_dir)
            .context("Failed to open the data directory")?;
        let sender = configuration
            .notifier
            .sender()
            .map_err(anyhow::Error::msg)
            .context("Invalid sender email address")?;
        let notifier = LogNotifier::new(sender, &configuration.notifier.log_file);
        let github = configuration
            .github
            .client()
            .context("Failed to build the GitHub client")?;
        let templates = build_templates().context("Failed to compile the email templates")?;

        Ok(Self::new(
            Arc::new(store),
            github,
            Arc::new(notifier),
            Arc::new(templates),
            configuration.application.base_url.clone(),
            configuration.notifier.delay(),
        ))
    }

    /// Sweeps expired codes, then mails the current timeline to every valid subscriber.
    ///
    /// Nothing is fetched when nobody is subscribed. Nothing is sent when the fetch fails or the
    /// timeline is empty. A digest that fails to render or deliver is logged and counted, and the
    /// remaining subscribers still get theirs.
    #[tracing::instrument(
        name = "Broadcast the GitHub timeline digest",
        skip(self, now),
        fields(run_id = %uuid::Uuid::new_v4())
    )]
    pub async fn run(&self, now: DateTime<Utc>) -> Result<BroadcastReport, BroadcastError> {
        let store = self.store.clone();
        spawn_blocking_with_tracing(move || sweep(store.as_ref(), now))
            .await
            .context("Failed to spawn the sweep task")??;

        let subscriptions = self.subscriptions.clone();
        let entries = spawn_blocking_with_tracing(move || subscriptions.list())
            .await
            .context("Failed to spawn the subscriber listing task")??;

        let mut report = BroadcastReport::default();
        let mut recipients = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry {
                Ok(email) => recipients.push(email),
                Err(error) => {
                    report.skipped += 1;
                    tracing::warn!(
                        error.cause_chain = ?error,
                        "Skipping a subscriber. Their stored address is invalid"
                    );
                }
            }
        }
        if recipients.is_empty() {
            return Err(BroadcastError::NoSubscribers);
        }

        let events = self.github.fetch_events().await?;
        let digest = Digest::new(&events, now);
        tracing::info!(
            events = digest.len(),
            recipients = recipients.len(),
            "Sending the digest"
        );

        for (index, recipient) in recipients.iter().enumerate() {
            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let message = match digest.email_for(&self.templates, recipient, &self.base_url) {
                Ok(message) => message,
                Err(error) => {
                    report.failed += 1;
                    tracing::error!(
                        error.cause_chain = ?error,
                        error.message = %error,
                        recipient = %recipient,
                        "Failed to render the digest"
                    );
                    continue;
                }
            };
            let notifier = self.notifier.clone();
            let outcome = spawn_blocking_with_tracing(move || notifier.send(&message))
                .await
                .context("Failed to spawn the delivery task")?;
            match outcome {
                Ok(()) => report.sent += 1,
                Err(error) => {
                    report.failed += 1;
                    tracing::error!(
                        error.cause_chain = ?error,
                        error.message = %error,
                        "Failed to deliver the digest"
                    );
                }
            }
        }

        tracing::info!(
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            "Digest broadcast finished"
        );
        Ok(report)
    }
}
