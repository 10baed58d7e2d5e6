//! Integration tests for the review API client and the chat messenger
//! against local fake servers.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod support;

use std::time::Duration;

use axum::http::StatusCode;
use hwbot_orchestrator::{
    notify, HomeworkApi, HwbotError, Messenger, ReviewApiClient, TelegramMessenger,
};
use support::{config_for, find_available_port, FakeChatApi, FakeReviewApi, Reply};

// ============================================================================
// Review API
// ============================================================================

#[tokio::test]
async fn test_fetch_sends_oauth_header_and_from_date() {
    let review = FakeReviewApi::start(vec![Reply::homework("hw1", "reviewing")]).await;
    let chat = FakeChatApi::start(StatusCode::OK).await;
    let client = ReviewApiClient::from_config(&config_for(&review, &chat)).unwrap();

    let body = client.fetch_homeworks(1_234_567).await.unwrap();

    assert_eq!(body["homeworks"][0]["homework_name"], "hw1");
    let seen = review.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].authorization.as_deref(), Some("OAuth review-token"));
    assert_eq!(seen[0].from_date.as_deref(), Some("1234567"));
}

#[tokio::test]
async fn test_fetch_non_ok_status_is_unexpected_status() {
    let review = FakeReviewApi::start(vec![Reply::raw(
        StatusCode::INTERNAL_SERVER_ERROR,
        "boom",
    )])
    .await;
    let chat = FakeChatApi::start(StatusCode::OK).await;
    let client = ReviewApiClient::from_config(&config_for(&review, &chat)).unwrap();

    let result = client.fetch_homeworks(0).await;

    assert!(matches!(
        result,
        Err(HwbotError::UnexpectedStatus { status: 500 })
    ));
}

#[tokio::test]
async fn test_fetch_created_status_is_still_unexpected() {
    let review = FakeReviewApi::start(vec![Reply::raw(StatusCode::CREATED, "{}")]).await;
    let chat = FakeChatApi::start(StatusCode::OK).await;
    let client = ReviewApiClient::from_config(&config_for(&review, &chat)).unwrap();

    let result = client.fetch_homeworks(0).await;

    assert!(matches!(
        result,
        Err(HwbotError::UnexpectedStatus { status: 201 })
    ));
}

#[tokio::test]
async fn test_fetch_malformed_body_is_invalid_json() {
    let review =
        FakeReviewApi::start(vec![Reply::raw(StatusCode::OK, "<html>not json</html>")]).await;
    let chat = FakeChatApi::start(StatusCode::OK).await;
    let client = ReviewApiClient::from_config(&config_for(&review, &chat)).unwrap();

    let result = client.fetch_homeworks(0).await;

    assert!(matches!(result, Err(HwbotError::InvalidJson(_))));
}

#[tokio::test]
async fn test_fetch_unreachable_endpoint_is_connection_failure() {
    let port = find_available_port();
    let client = ReviewApiClient::new(
        reqwest::Client::new(),
        format!("http://127.0.0.1:{port}/api/user_api/homework_statuses/"),
        "token",
    );

    let result = client.fetch_homeworks(0).await;

    assert!(matches!(result, Err(HwbotError::ConnectionFailure(_))));
}

#[tokio::test]
async fn test_fetch_timeout_is_connection_failure() {
    let review = FakeReviewApi::start(vec![
        Reply::homework("hw1", "approved").delayed(Duration::from_secs(2))
    ])
    .await;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let client = ReviewApiClient::new(client, review.endpoint.clone(), "token");

    let result = client.fetch_homeworks(0).await;

    assert!(matches!(result, Err(HwbotError::ConnectionFailure(_))));
}

// ============================================================================
// Chat API
// ============================================================================

#[tokio::test]
async fn test_send_message_posts_chat_id_and_text() {
    let review = FakeReviewApi::start(Vec::new()).await;
    let chat = FakeChatApi::start(StatusCode::OK).await;
    let messenger = TelegramMessenger::from_config(&config_for(&review, &chat)).unwrap();

    messenger
        .send_message("4242", "The review status changed")
        .await
        .unwrap();

    let sent = chat.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].bot_segment, "bot123:abc");
    assert_eq!(sent[0].chat_id, "4242");
    assert_eq!(sent[0].text, "The review status changed");
}

#[tokio::test]
async fn test_send_message_error_status_is_notification_failure() {
    let review = FakeReviewApi::start(Vec::new()).await;
    let chat = FakeChatApi::start(StatusCode::INTERNAL_SERVER_ERROR).await;
    let messenger = TelegramMessenger::from_config(&config_for(&review, &chat)).unwrap();

    let result = messenger.send_message("4242", "hello").await;

    assert!(matches!(result, Err(HwbotError::NotificationFailed(_))));
    assert_eq!(chat.sent().len(), 1);
}

#[tokio::test]
async fn test_notify_reports_failure_without_error() {
    let review = FakeReviewApi::start(Vec::new()).await;
    let chat = FakeChatApi::start(StatusCode::BAD_REQUEST).await;
    let messenger = TelegramMessenger::from_config(&config_for(&review, &chat)).unwrap();

    assert!(!notify(&messenger, "4242", "hello").await);
}

#[tokio::test]
async fn test_notify_unreachable_chat_api_returns_false() {
    let port = find_available_port();
    let messenger = TelegramMessenger::new(
        reqwest::Client::new(),
        format!("http://127.0.0.1:{port}"),
        "123:abc",
    );

    assert!(!notify(&messenger, "4242", "hello").await);
}

#[tokio::test]
async fn test_notify_success_returns_true() {
    let review = FakeReviewApi::start(Vec::new()).await;
    let chat = FakeChatApi::start(StatusCode::OK).await;
    let messenger = TelegramMessenger::from_config(&config_for(&review, &chat)).unwrap();

    assert!(notify(&messenger, "4242", "hello").await);
    assert_eq!(chat.sent()[0].text, "hello");
}
