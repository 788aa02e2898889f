//! Reddit activity fetching.
//!
//! [`RedditClient`] uses app-only OAuth (`client_credentials`) and reads the
//! user's `submitted` and `comments` listings, newest first. Fetching is
//! best effort: [`ActivitySource::fetch`] logs failures and returns whatever
//! was collected before the failure.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::RedditConfig;
use crate::types::{Comment, Post, UserActivity};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";
const PERMALINK_BASE: &str = "https://www.reddit.com";

/// Reddit refuses listing pages larger than this.
const MAX_PAGE_SIZE: usize = 100;

/// Errors from the Reddit API.
#[derive(Debug, thiserror::Error)]
pub enum RedditError {
    /// Client id or secret not configured.
    #[error("missing Reddit credentials: set REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET")]
    MissingCredentials,
    /// HTTP transport failure.
    #[error("reddit request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Non-success status.
    #[error("reddit returned {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
    /// Body did not match the listing schema.
    #[error("reddit response parse error: {0}")]
    Parse(String),
}

/// Anything that can supply a user's posts and comments.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Fetch up to `limit` posts and up to `limit` comments for `username`.
    ///
    /// Never fails; an empty result means nothing could be collected.
    async fn fetch(&self, username: &str, limit: u32) -> UserActivity;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    data: ThingData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThingData {
    title: String,
    selftext: String,
    body: String,
    permalink: String,
}

fn parse_listing(body: &str) -> Result<ListingData, RedditError> {
    let listing: Listing =
        serde_json::from_str(body).map_err(|e| RedditError::Parse(e.to_string()))?;
    Ok(listing.data)
}

fn permalink_url(permalink: &str) -> String {
    format!("{PERMALINK_BASE}{permalink}")
}

/// Parse a `submitted` listing page into posts and the `after` cursor.
///
/// # Errors
///
/// Returns `RedditError::Parse` if the body is not a listing.
#[doc(hidden)]
pub fn parse_posts(body: &str) -> Result<(Vec<Post>, Option<String>), RedditError> {
    let data = parse_listing(body)?;
    let posts = data
        .children
        .into_iter()
        .map(|thing| Post {
            title: thing.data.title,
            text: thing.data.selftext,
            url: permalink_url(&thing.data.permalink),
        })
        .collect();
    Ok((posts, data.after))
}

/// Parse a `comments` listing page into comments and the `after` cursor.
///
/// # Errors
///
/// Returns `RedditError::Parse` if the body is not a listing.
#[doc(hidden)]
pub fn parse_comments(body: &str) -> Result<(Vec<Comment>, Option<String>), RedditError> {
    let data = parse_listing(body)?;
    let comments = data
        .children
        .into_iter()
        .map(|thing| Comment {
            text: thing.data.body,
            url: permalink_url(&thing.data.permalink),
        })
        .collect();
    Ok((comments, data.after))
}

async fn check_response(response: reqwest::Response) -> Result<String, RedditError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(RedditError::HttpStatus {
            status: status.as_u16(),
            body: body.chars().take(256).collect(),
        });
    }
    Ok(body)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Reddit API client using app-only OAuth.
#[derive(Clone)]
pub struct RedditClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    api_base: String,
}

impl std::fmt::Debug for RedditClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &"__REDACTED__")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl RedditClient {
    /// Create a client from config.
    ///
    /// # Errors
    ///
    /// Returns `RedditError::MissingCredentials` when id or secret is unset,
    /// or `RedditError::Request` if the HTTP client cannot be built.
    pub fn new(config: &RedditConfig) -> Result<Self, RedditError> {
        let (Some(client_id), Some(client_secret)) =
            (config.client_id.clone(), config.client_secret.clone())
        else {
            return Err(RedditError::MissingCredentials);
        };
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            client_id,
            client_secret,
            token_url: TOKEN_URL.to_owned(),
            api_base: API_BASE.to_owned(),
        })
    }

    /// Point the client at different token and API hosts.
    pub fn with_base_urls(mut self, token_url: String, api_base: String) -> Self {
        self.token_url = token_url;
        self.api_base = api_base;
        self
    }


    async fn access_token(&self) -> Result<String, RedditError> {
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let body = check_response(response).await?;
        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| RedditError::Parse(e.to_string()))?;
        Ok(token.access_token)
    }

    async fn listing_page(
        &self,
        token: &str,
        username: &str,
        kind: &str,
        remaining: usize,
        after: Option<&str>,
    ) -> Result<String, RedditError> {
        let url = format!("{}/user/{username}/{kind}", self.api_base);
        let limit = remaining.min(MAX_PAGE_SIZE);
        let mut query = vec![
            ("sort", "new".to_owned()),
            ("limit", limit.to_string()),
            ("raw_json", "1".to_owned()),
        ];
        if let Some(after) = after {
            query.push(("after", after.to_owned()));
        }
        debug!(username, kind, limit, after, "fetching listing page");
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&query)
            .send()
            .await?;
        check_response(response).await
    }

    /// Fetch into `activity`, posts first, stopping at the first error.
    ///
    /// Items collected before an error stay in `activity`.
    ///
    /// # Errors
    ///
    /// Returns the first token, transport, status or parse error.
    pub async fn fetch_into(
        &self,
        username: &str,
        limit: u32,
        activity: &mut UserActivity,
    ) -> Result<(), RedditError> {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let token = self.access_token().await?;

        let mut after: Option<String> = None;
        loop {
            let remaining = limit.saturating_sub(activity.posts.len());
            if remaining == 0 {
                break;
            }
            let body = self
                .listing_page(&token, username, "submitted", remaining, after.as_deref())
                .await?;
            let (page, next) = parse_posts(&body)?;
            let done = page.is_empty() || next.is_none();
            activity.posts.extend(page.into_iter().take(remaining));
            if done {
                break;
            }
            after = next;
        }

        let mut after: Option<String> = None;
        loop {
            let remaining = limit.saturating_sub(activity.comments.len());
            if remaining == 0 {
                break;
            }
            let body = self
                .listing_page(&token, username, "comments", remaining, after.as_deref())
                .await?;
            let (page, next) = parse_comments(&body)?;
            let done = page.is_empty() || next.is_none();
            activity.comments.extend(page.into_iter().take(remaining));
            if done {
                break;
            }
            after = next;
        }

        Ok(())
    }
}

#[async_trait]
impl ActivitySource for RedditClient {
    async fn fetch(&self, username: &str, limit: u32) -> UserActivity {
        let mut activity = UserActivity::default();
        if let Err(e) = self.fetch_into(username, limit, &mut activity).await {
            warn!(
                username,
                error = %e,
                posts = activity.posts.len(),
                comments = activity.comments.len(),
                "error fetching reddit activity, keeping partial result"
            );
        }
        info!(
            username,
            posts = activity.posts.len(),
            comments = activity.comments.len(),
            "fetched reddit activity"
        );
        activity
    }
}
