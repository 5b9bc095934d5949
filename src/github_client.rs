use chrono::{DateTime, Utc};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

/// One entry of the GitHub public timeline, reduced to what the digest shows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawEvent")]
pub struct TimelineEvent {
    pub kind: Option<String>,
    pub actor_login: Option<String>,
    pub repo_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

// The API payload nests the fields we care about. Anything missing or malformed is kept as `None`
// rather than failing the whole batch.
#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: Option<String>,
    actor: Option<RawActor>,
    repo: Option<RawRepo>,
    created_at: Option<String>,
}

#[derive(Deserialize)]
struct RawActor {
    login: Option<String>,
}

#[derive(Deserialize)]
struct RawRepo {
    name: Option<String>,
}

impl From<RawEvent> for TimelineEvent {
    fn from(raw: RawEvent) -> Self {
        Self {
            kind: raw.kind,
            actor_login: raw.actor.and_then(|a| a.login),
            repo_name: raw.repo.and_then(|r| r.name),
            created_at: raw
                .created_at
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|t| t.with_timezone(&Utc)),
        }
    }
}

/// Network errors, timeouts, non-200 answers, undecodable payloads and empty timelines all end up
/// here: the broadcast job treats them the same way.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Failed to reach the GitHub API")]
    Request(#[source] reqwest::Error),
    #[error("The GitHub API answered with status {0}")]
    UnexpectedStatus(StatusCode),
    #[error("The GitHub API returned a malformed events payload")]
    MalformedPayload(#[source] reqwest::Error),
    #[error("The GitHub API returned no events")]
    EmptyTimeline,
}

pub struct GitHubClient {
    http_client: Client,
    base_url: String,
    authorization_token: Option<Secret<String>>,
}

impl GitHubClient {
    pub fn new(
        base_url: String,
        user_agent: &str,
        authorization_token: Option<Secret<String>>,
        timeout: std::time::Duration,
    ) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        let http_client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            authorization_token,
        })
    }

    #[tracing::instrument(name = "Fetch the GitHub public timeline", skip(self))]
    pub async fn fetch_events(&self) -> Result<Vec<TimelineEvent>, FetchError> {
        let url = format!("{}/events", self.base_url.trim_end_matches('/'));
        let mut request = self.http_client.get(&url);
        if let Some(token) = &self.authorization_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(FetchError::Request)?;
        if response.status() != StatusCode::OK {
            return Err(FetchError::UnexpectedStatus(response.status()));
        }
        let events: Vec<TimelineEvent> = response
            .json()
            .await
            .map_err(FetchError::MalformedPayload)?;
        if events.is_empty() {
            return Err(FetchError::EmptyTimeline);
        }

        tracing::info!(events = events.len(), "Fetched GitHub events");
        Ok(events)
    }
}
