use crate::helpers::{extract_csrf_token, spawn_app};
use serde_json::json;

const EMAIL: &str = "ursula_le_guin@gmail.com";

fn wrong_code(code: &str) -> &'static str {
    if code == "000000" {
        "000001"
    } else {
        "000000"
    }
}

#[tokio::test]
async fn the_subscribe_page_shows_the_subscriber_count() {
    let app = spawn_app().await;
    app.subscribe("a@example.com").await;
    app.subscribe("b@example.com").await;

    let html = app.get_subscribe_html().await;

    assert!(html.contains("2 readers receive the GitHub timeline digest."));
    assert!(html.contains(r#"value="send_code""#));
}

#[tokio::test]
async fn send_code_stores_and_delivers_a_code_without_echoing_it() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .post_subscribe(&json!({"action": "send_code", "email": EMAIL}))
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let html = response.text().await.unwrap();
    assert!(html.contains("Code sent to ursula_le_guin@gmail.com"));
    assert!(html.contains(r#"name="verification_code""#));

    let code = app.pending_code(EMAIL).unwrap();
    assert!(!html.contains(&code));
    let sent = app.sent_emails();
    assert!(sent.contains(&format!("To: {EMAIL}")));
    assert!(sent.contains(&format!("VERIFICATION CODE: {code}")));
}

#[tokio::test]
async fn the_right_code_subscribes_the_address() {
    let app = spawn_app().await;
    app.post_subscribe(&json!({"action": "send_code", "email": EMAIL}))
        .await;
    let code = app.pending_code(EMAIL).unwrap();

    let response = app
        .post_subscribe(&json!({
            "action": "verify_code",
            "email": EMAIL,
            "verification_code": code
        }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    assert!(response
        .text()
        .await
        .unwrap()
        .contains("Email verified and subscribed!"));
    assert_eq!(app.subscribers(), vec![EMAIL.to_string()]);
    assert_eq!(app.pending_code(EMAIL), None);
}

#[tokio::test]
async fn send_code_returns_a_400_for_invalid_emails() {
    let app = spawn_app().await;
    let test_cases = vec![
        ("", "empty email"),
        ("definitely-not-an-email", "invalid email"),
        ("@gmail.com", "missing local part"),
    ];

    for (email, description) in test_cases {
        let response = app
            .post_subscribe(&json!({"action": "send_code", "email": email}))
            .await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload was {}.",
            description
        );
    }
    assert!(app.sent_emails().is_empty());
}

#[tokio::test]
async fn a_missing_or_unknown_action_is_rejected() {
    let app = spawn_app().await;
    let test_cases = vec![
        (json!({"email": EMAIL}), "missing action"),
        (json!({"action": "subscribe", "email": EMAIL}), "unknown action"),
    ];

    for (body, description) in test_cases {
        let response = app.post_subscribe(&body).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload had a {}.",
            description
        );
    }
}

#[tokio::test]
async fn a_second_request_within_a_minute_is_rate_limited() {
    let app = spawn_app().await;
    let body = json!({"action": "send_code", "email": EMAIL});
    app.post_subscribe(&body).await;
    let first_code = app.pending_code(EMAIL);

    let response = app.post_subscribe(&body).await;

    assert_eq!(response.status().as_u16(), 429);
    let html = response.text().await.unwrap();
    assert!(html.contains("before requesting a new code."));
    assert!(html.contains(r#"class="message message-warning""#));
    assert_eq!(app.pending_code(EMAIL), first_code);
}

#[tokio::test]
async fn wrong_codes_count_down_then_lock_the_flow() {
    let app = spawn_app().await;
    app.post_subscribe(&json!({"action": "send_code", "email": EMAIL}))
        .await;
    let code = app.pending_code(EMAIL).unwrap();
    let wrong = json!({
        "action": "verify_code",
        "email": EMAIL,
        "verification_code": wrong_code(&code)
    });

    for remaining in [2, 1, 0] {
        let response = app.post_subscribe(&wrong).await;
        assert_eq!(response.status().as_u16(), 400);
        let html = response.text().await.unwrap();
        assert!(html.contains(&format!("Incorrect code. {remaining} attempts left.")));
        // The reader can try again without re-typing the address.
        assert!(html.contains(r#"name="verification_code""#));
    }

    let response = app
        .post_subscribe(&json!({
            "action": "verify_code",
            "email": EMAIL,
            "verification_code": code
        }))
        .await;
    assert_eq!(response.status().as_u16(), 429);
    assert!(app.subscribers().is_empty());
    assert_eq!(app.pending_code(EMAIL), None);
}

#[tokio::test]
async fn verifying_without_a_pending_code_fails() {
    let app = spawn_app().await;

    let response = app
        .post_subscribe(&json!({
            "action": "verify_code",
            "email": EMAIL,
            "verification_code": "123456"
        }))
        .await;

    assert_eq!(response.status().as_u16(), 400);
    assert!(response
        .text()
        .await
        .unwrap()
        .contains("No verification code found."));
}

#[tokio::test]
async fn an_empty_code_is_rejected_without_spending_an_attempt() {
    let app = spawn_app().await;
    app.post_subscribe(&json!({"action": "send_code", "email": EMAIL}))
        .await;
    let before = app.pending_attempts(EMAIL);

    let response = app
        .post_subscribe(&json!({
            "action": "verify_code",
            "email": EMAIL,
            "verification_code": "  "
        }))
        .await;

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(app.pending_attempts(EMAIL), before);
}

#[tokio::test]
async fn subscribing_twice_is_a_conflict() {
    let app = spawn_app().await;
    app.subscribe(EMAIL).await;

    let response = app
        .post_subscribe(&json!({"action": "send_code", "email": EMAIL}))
        .await;

    assert_eq!(response.status().as_u16(), 409);
    assert!(response
        .text()
        .await
        .unwrap()
        .contains("already subscribed"));
}

#[tokio::test]
async fn request_new_code_discards_the_pending_code() {
    let app = spawn_app().await;
    app.post_subscribe(&json!({"action": "send_code", "email": EMAIL}))
        .await;

    let response = app
        .post_subscribe(&json!({"action": "request_new_code", "email": EMAIL}))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let html = response.text().await.unwrap();
    assert!(html.contains(r#"value="send_code""#));
    assert_eq!(app.pending_code(EMAIL), None);

    // With the pending code gone, the cooldown no longer applies.
    let response = app
        .post_subscribe(&json!({"action": "send_code", "email": EMAIL}))
        .await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn a_post_without_the_form_token_is_forbidden() {
    let app = spawn_app().await;
    // The browser holds a valid cookie, but the forged form carries no token.
    app.get_subscribe_html().await;

    let response = app
        .post_subscribe_raw(&json!({"action": "send_code", "email": EMAIL}))
        .await;

    assert_eq!(response.status().as_u16(), 403);
    let html = response.text().await.unwrap();
    assert!(html.contains("This form has expired."));
    assert_eq!(app.pending_code(EMAIL), None);
    assert!(app.sent_emails().is_empty());
}

#[tokio::test]
async fn a_post_with_a_forged_form_token_is_forbidden() {
    let app = spawn_app().await;
    app.subscribe(EMAIL).await;
    let before = app.subscribers();

    let response = app
        .post_unsubscribe_raw(&json!({
            "action": "send_code",
            "email": EMAIL,
            "csrf_token": "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
        }))
        .await;

    assert_eq!(response.status().as_u16(), 403);
    assert_eq!(app.pending_code(EMAIL), None);
    assert_eq!(app.subscribers(), before);
}

#[tokio::test]
async fn a_cross_site_post_without_any_cookie_is_forbidden() {
    let app = spawn_app().await;
    let token = extract_csrf_token(&app.get_subscribe_html().await);

    // A fresh client has never been served the page, so it holds no cookie.
    let response = reqwest::Client::new()
        .post(&format!("{}/", &app.address))
        .form(&json!({"action": "send_code", "email": EMAIL, "csrf_token": token}))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 403);
    assert_eq!(app.pending_code(EMAIL), None);
}

#[tokio::test]
async fn the_form_token_survives_across_pages() {
    let app = spawn_app().await;

    let landing = extract_csrf_token(&app.get_subscribe_html().await);
    let unsubscribe = app.csrf_token("/unsubscribe").await;

    assert_eq!(landing, unsubscribe);
}
