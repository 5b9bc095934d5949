use crate::domain::SubscriberEmail;
use crate::github_client::TimelineEvent;
use crate::notifier::EmailMessage;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tera::{Context, Tera};

/// Events beyond this are left out of the digest.
const MAX_EVENTS: usize = 10;
const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Serialize)]
struct DigestRow {
    emoji: &'static str,
    kind: String,
    actor: String,
    repo: String,
    time: String,
    background: &'static str,
}

/// A rendered-once digest, personalised per recipient with [`Digest::email_for`].
#[derive(Debug, Clone)]
pub struct Digest {
    subject: String,
    rows: Vec<DigestRow>,
}

fn emoji_for(kind: &str) -> &'static str {
    match kind {
        "PushEvent" => "📝",
        "CreateEvent" => "🆕",
        "WatchEvent" => "⭐",
        "IssuesEvent" => "🐛",
        "PullRequestEvent" => "🔄",
        "ForkEvent" => "🍴",
        "ReleaseEvent" => "🎉",
        "DeleteEvent" => "🗑️",
        _ => "📌",
    }
}

impl Digest {
    pub fn new(events: &[TimelineEvent], now: DateTime<Utc>) -> Self {
        let rows = events
            .iter()
            .take(MAX_EVENTS)
            .enumerate()
            .map(|(index, event)| {
                let kind = event.kind.clone().unwrap_or_else(|| UNKNOWN.into());
                DigestRow {
                    emoji: emoji_for(&kind),
                    kind,
                    actor: event.actor_login.clone().unwrap_or_else(|| UNKNOWN.into()),
                    repo: event.repo_name.clone().unwrap_or_else(|| UNKNOWN.into()),
                    time: event
                        .created_at
                        .map(|t| t.format("%b %-d, %H:%M").to_string())
                        .unwrap_or_else(|| UNKNOWN.into()),
                    background: if index % 2 == 0 { "#f8f9fa" } else { "#ffffff" },
                }
            })
            .collect();

        Self {
            subject: format!("GitHub Timeline Updates - {}", now.format("%b %-d, %H:%M")),
            rows,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The digest addressed to `recipient`, with a link to the unsubscribe page prefilled with
    /// their address.
    pub fn email_for(
        &self,
        templates: &Tera,
        recipient: &SubscriberEmail,
        base_url: &str,
    ) -> Result<EmailMessage, tera::Error> {
        let unsubscribe_link = format!(
            "{}/unsubscribe?email={}",
            base_url.trim_end_matches('/'),
            urlencoding::encode(recipient.as_ref())
        );

        let mut context = Context::new();
        context.insert("rows", &self.rows);
        context.insert("has_events", &!self.rows.is_empty());
        context.insert("recipient", recipient.as_ref());
        context.insert("unsubscribe_link", &unsubscribe_link);

        Ok(EmailMessage {
            recipient: recipient.clone(),
            subject: self.subject.clone(),
            html_body: templates.render("digest_email.html", &context)?,
            text_body: templates.render("digest_email.txt", &context)?,
        })
    }
}
