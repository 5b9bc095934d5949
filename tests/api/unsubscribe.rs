use crate::helpers::spawn_app;
use serde_json::json;

const EMAIL: &str = "ursula_le_guin@gmail.com";

#[tokio::test]
async fn the_unsubscribe_page_is_prefilled_from_the_query_string() {
    let app = spawn_app().await;

    let response = app
        .get_unsubscribe("?email=ursula_le_guin%40gmail.com")
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let html = response.text().await.unwrap();
    assert!(html.contains(r#"value="ursula_le_guin@gmail.com""#));
    assert!(html.contains(r#"action="/unsubscribe""#));
}

#[tokio::test]
async fn the_unsubscribe_page_works_without_a_query_string() {
    let app = spawn_app().await;

    let response = app.get_unsubscribe("").await;

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn unsubscribing_an_unknown_address_is_a_conflict() {
    let app = spawn_app().await;

    let response = app
        .post_unsubscribe(&json!({"action": "send_code", "email": EMAIL}))
        .await;

    assert_eq!(response.status().as_u16(), 409);
    assert!(response.text().await.unwrap().contains("not subscribed"));
    assert!(app.sent_emails().is_empty());
}

#[tokio::test]
async fn the_right_unsubscribe_code_removes_the_subscriber() {
    // Arrange
    let app = spawn_app().await;
    app.subscribe(EMAIL).await;
    app.subscribe("other@example.com").await;

    // Act - Part 1 - Ask for a code
    let response = app
        .post_unsubscribe(&json!({"action": "send_code", "email": EMAIL}))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let code = app.pending_code(EMAIL).unwrap();
    assert!(app
        .sent_emails()
        .contains(&format!("UNSUBSCRIBE CODE: {code}")));

    // Act - Part 2 - Confirm
    let response = app
        .post_unsubscribe(&json!({
            "action": "verify_code",
            "email": EMAIL,
            "verification_code": code
        }))
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    assert!(response
        .text()
        .await
        .unwrap()
        .contains("unsubscribed successfully."));
    assert_eq!(app.subscribers(), vec!["other@example.com".to_string()]);
}

#[tokio::test]
async fn unsubscribe_flows_tolerate_five_wrong_codes() {
    let app = spawn_app().await;
    app.subscribe(EMAIL).await;
    app.post_unsubscribe(&json!({"action": "send_code", "email": EMAIL}))
        .await;
    let code = app.pending_code(EMAIL).unwrap();
    let wrong = if code == "000000" { "000001" } else { "000000" };

    for remaining in [4, 3, 2, 1, 0] {
        let response = app
            .post_unsubscribe(&json!({
                "action": "verify_code",
                "email": EMAIL,
                "verification_code": wrong
            }))
            .await;
        assert_eq!(response.status().as_u16(), 400);
        assert!(response
            .text()
            .await
            .unwrap()
            .contains(&format!("{remaining} attempts left.")));
    }
    assert_eq!(app.subscribers(), vec![EMAIL.to_string()]);
}

#[tokio::test]
async fn a_subscribe_code_cannot_confirm_an_unsubscription() {
    let app = spawn_app().await;
    app.post_subscribe(&json!({"action": "send_code", "email": EMAIL}))
        .await;
    let code = app.pending_code(EMAIL).unwrap();

    let response = app
        .post_unsubscribe(&json!({
            "action": "verify_code",
            "email": EMAIL,
            "verification_code": code
        }))
        .await;

    assert_eq!(response.status().as_u16(), 409);
    // The subscription in progress is untouched and can still be completed.
    assert_eq!(app.pending_code(EMAIL), Some(code.clone()));
    assert_eq!(app.pending_attempts(EMAIL), Some(0));

    let response = app
        .post_unsubscribe(&json!({"action": "request_new_code", "email": EMAIL}))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(app.pending_code(EMAIL), Some(code));
}
