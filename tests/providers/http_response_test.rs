//! HTTP response sanitization and truncation tests.

use redpersona::providers::{check_http_response, ProviderError};

use crate::http_support::serve;

async fn checked(status_line: &'static str, body: String) -> Result<String, ProviderError> {
    let server = serve(vec![(status_line, body)]).await;
    let response = match reqwest::get(format!("{}/", server.base_url)).await {
        Ok(response) => response,
        Err(err) => panic!("request should complete: {err}"),
    };
    check_http_response(response).await
}

#[tokio::test]
async fn check_http_response_passes_success_body_through() {
    let body = checked("200 OK", "{\"ok\":true}".to_owned())
        .await
        .expect("success status should pass");
    assert_eq!(body, "{\"ok\":true}");
}

#[tokio::test]
async fn check_http_response_redacts_token_like_values() {
    let raw_token = "gsk_abcdefghijklmnopqrstuvwxyz1234";
    let err = checked("401 Unauthorized", format!("invalid api key {raw_token}"))
        .await
        .expect_err("response should fail on non-success status");

    match err {
        ProviderError::HttpStatus { status, body } => {
            assert_eq!(status, 401);
            assert!(!body.contains(raw_token));
            assert!(body.contains("[REDACTED]"));
        }
        other => panic!("expected http status error, got: {other}"),
    }
}

#[tokio::test]
async fn check_http_response_truncates_long_error_body() {
    let err = checked("500 Internal Server Error", "x".repeat(5_000))
        .await
        .expect_err("response should fail on non-success status");

    match err {
        ProviderError::HttpStatus { body, .. } => {
            assert!(body.ends_with("...[truncated]"));
        }
        other => panic!("expected http status error, got: {other}"),
    }
}

#[tokio::test]
async fn payload_too_large_keeps_status() {
    let err = checked("413 Payload Too Large", "Request Entity Too Large".to_owned())
        .await
        .expect_err("413 should fail");
    assert_eq!(err.status(), Some(413));
    assert!(err.to_string().contains("413"));
}
