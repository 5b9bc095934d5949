use crate::helpers::spawn_app;
use chrono::Utc;
use timeline_digest::broadcast::BroadcastError;
use timeline_digest::github_client::FetchError;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, ResponseTemplate};

fn timeline() -> serde_json::Value {
    serde_json::json!([
        {
            "type": "PushEvent",
            "actor": {"login": "octocat"},
            "repo": {"name": "octocat/hello-world"},
            "created_at": "2024-05-01T10:15:00Z"
        },
        {
            "type": "ReleaseEvent",
            "actor": {"login": "hubot"},
            "repo": {"name": "github/hub"},
            "created_at": "2024-05-01T10:16:00Z"
        }
    ])
}

#[tokio::test]
async fn every_subscriber_receives_the_digest() {
    // Arrange
    let app = spawn_app().await;
    app.subscribe("a@example.com").await;
    app.subscribe("b@example.com").await;
    Mock::given(path("/events"))
        .and(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(timeline()))
        .expect(1)
        .mount(&app.github_server)
        .await;

    // Act
    let report = app.broadcaster().run(Utc::now()).await.unwrap();

    // Assert
    assert_eq!(report.sent, 2);
    assert_eq!(report.failed, 0);
    let sent = app.sent_emails();
    assert_eq!(sent.matches("Subject: GitHub Timeline Updates - ").count(), 2);
    assert!(sent.contains("PushEvent by octocat on octocat/hello-world"));
}

#[tokio::test]
async fn the_digest_links_to_a_prefilled_unsubscribe_page() {
    let app = spawn_app().await;
    app.subscribe("ursula@example.com").await;
    Mock::given(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(timeline()))
        .mount(&app.github_server)
        .await;

    app.broadcaster().run(Utc::now()).await.unwrap();

    let sent = app.sent_emails();
    let links: Vec<_> = linkify::LinkFinder::new()
        .links(&sent)
        .filter(|l| *l.kind() == linkify::LinkKind::Url)
        .map(|l| l.as_str().to_owned())
        .filter(|l| l.contains("/unsubscribe"))
        .collect();
    assert_eq!(links.len(), 1);
    let link = reqwest::Url::parse(&links[0]).unwrap();
    // Let's make sure we don't call random APIs on the web
    assert_eq!(link.host_str().unwrap(), "127.0.0.1");

    let response = reqwest::get(link).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert!(response
        .text()
        .await
        .unwrap()
        .contains(r#"value="ursula@example.com""#));
}

#[tokio::test]
async fn a_failed_fetch_aborts_the_broadcast() {
    let app = spawn_app().await;
    app.subscribe("a@example.com").await;
    let before = app.sent_emails();
    Mock::given(path("/events"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.github_server)
        .await;

    let outcome = app.broadcaster().run(Utc::now()).await;

    assert!(matches!(outcome, Err(BroadcastError::Fetch(_))));
    assert_eq!(app.sent_emails(), before);
}

#[tokio::test]
async fn nothing_is_fetched_without_subscribers() {
    let app = spawn_app().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        // We assert that no request is fired at GitHub!
        .expect(0)
        .mount(&app.github_server)
        .await;

    let outcome = app.broadcaster().run(Utc::now()).await;

    assert!(matches!(outcome, Err(BroadcastError::NoSubscribers)));
}

#[tokio::test]
async fn an_empty_timeline_aborts_the_broadcast() {
    let app = spawn_app().await;
    app.subscribe("a@example.com").await;
    let before = app.sent_emails();
    Mock::given(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&app.github_server)
        .await;

    let outcome = app.broadcaster().run(Utc::now()).await;

    assert!(matches!(
        outcome,
        Err(BroadcastError::Fetch(FetchError::EmptyTimeline))
    ));
    assert_eq!(app.sent_emails(), before);
}
