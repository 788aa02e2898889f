//! Reddit client tests against a local canned server.

use std::time::Duration;

use redpersona::config::RedditConfig;
use redpersona::reddit::{ActivitySource, RedditClient, RedditError};
use redpersona::types::UserActivity;

use crate::http_support::{serve, serve_silent};

fn config() -> RedditConfig {
    RedditConfig {
        client_id: Some("app-id".to_owned()),
        client_secret: Some("app-secret".to_owned()),
        user_agent: "redpersona-tests/0.1".to_owned(),
        ..RedditConfig::default()
    }
}

fn client(base_url: &str) -> RedditClient {
    RedditClient::new(&config())
        .expect("credentials are set")
        .with_base_urls(format!("{base_url}/api/v1/access_token"), base_url.to_owned())
}

fn token_body() -> String {
    r#"{"access_token": "tok-123", "token_type": "bearer", "expires_in": 86400}"#.to_owned()
}

fn posts_body(after: Option<&str>) -> String {
    let after = after.map_or("null".to_owned(), |a| format!("\"{a}\""));
    format!(
        r#"{{"kind": "Listing", "data": {{"after": {after}, "children": [
            {{"kind": "t3", "data": {{"title": "Homelab tour", "selftext": "Rack is done", "permalink": "/r/homelab/comments/1/tour/"}}}}
        ]}}}}"#
    )
}

fn comments_body() -> String {
    r#"{"kind": "Listing", "data": {"after": null, "children": [
        {"kind": "t1", "data": {"body": "Use ZFS.", "permalink": "/r/homelab/comments/1/tour/c1/"}},
        {"kind": "t1", "data": {"body": "Nice cable work", "permalink": "/r/homelab/comments/1/tour/c2/"}}
    ]}}"#
        .to_owned()
}

#[tokio::test]
async fn fetches_posts_then_comments() {
    let server = serve(vec![
        ("200 OK", token_body()),
        ("200 OK", posts_body(None)),
        ("200 OK", comments_body()),
    ])
    .await;

    let activity = client(&server.base_url).fetch("spez", 30).await;

    assert_eq!(activity.posts.len(), 1);
    assert_eq!(activity.posts[0].title, "Homelab tour");
    assert_eq!(
        activity.posts[0].url,
        "https://www.reddit.com/r/homelab/comments/1/tour/"
    );
    assert_eq!(activity.comments.len(), 2);
    assert_eq!(activity.comments[0].text, "Use ZFS.");

    let requests = server.requests();
    assert_eq!(requests.len(), 3);
    let token_request = requests[0].to_lowercase();
    assert!(token_request.starts_with("post /api/v1/access_token"));
    assert!(token_request.contains("authorization: basic"));
    assert!(token_request.contains("user-agent: redpersona-tests/0.1"));
    assert!(requests[0].contains("grant_type=client_credentials"));

    assert!(requests[1].starts_with("GET /user/spez/submitted?sort=new&limit=30&raw_json=1"));
    assert!(requests[1].to_lowercase().contains("authorization: bearer tok-123"));
    assert!(requests[2].starts_with("GET /user/spez/comments?sort=new&limit=30&raw_json=1"));
}

#[tokio::test]
async fn follows_after_cursor_until_limit() {
    let server = serve(vec![
        ("200 OK", token_body()),
        ("200 OK", posts_body(Some("t3_next"))),
        ("200 OK", posts_body(Some("t3_more"))),
        ("200 OK", comments_body()),
    ])
    .await;

    let activity = client(&server.base_url).fetch("spez", 2).await;

    assert_eq!(activity.posts.len(), 2);
    assert_eq!(activity.comments.len(), 2);
    let requests = server.requests();
    assert_eq!(requests.len(), 4);
    assert!(requests[2].contains("limit=1"));
    assert!(requests[2].contains("after=t3_next"));
}

#[tokio::test]
async fn comment_failure_keeps_fetched_posts() {
    let server = serve(vec![
        ("200 OK", token_body()),
        ("200 OK", posts_body(None)),
        ("500 Internal Server Error", "{\"error\": 500}".to_owned()),
    ])
    .await;

    let activity = client(&server.base_url).fetch("spez", 30).await;

    assert_eq!(activity.posts.len(), 1);
    assert!(activity.comments.is_empty());
}

#[tokio::test]
async fn fetch_into_reports_status_errors() {
    let server = serve(vec![(
        "401 Unauthorized",
        "{\"message\": \"Unauthorized\", \"error\": 401}".to_owned(),
    )])
    .await;

    let mut activity = UserActivity::default();
    let err = client(&server.base_url)
        .fetch_into("spez", 30, &mut activity)
        .await
        .expect_err("token request should fail");

    assert!(matches!(err, RedditError::HttpStatus { status: 401, .. }));
    assert!(activity.is_empty());
}

#[tokio::test]
async fn token_failure_yields_empty_activity() {
    let server = serve(vec![("403 Forbidden", "{}".to_owned())]).await;
    let activity = client(&server.base_url).fetch("spez", 30).await;
    assert!(activity.is_empty());
}

#[tokio::test]
async fn stalled_server_times_out_with_empty_activity() {
    let server = serve_silent().await;
    let config = RedditConfig {
        request_timeout_secs: 1,
        ..config()
    };
    let client = RedditClient::new(&config)
        .expect("credentials are set")
        .with_base_urls(
            format!("{}/api/v1/access_token", server.base_url),
            server.base_url.clone(),
        );

    let activity = tokio::time::timeout(Duration::from_secs(10), client.fetch("spez", 30))
        .await
        .expect("fetch should give up on its own");

    assert!(activity.is_empty());
}
