//! Chat completion provider abstraction.
//!
//! Defines the [`ChatProvider`] trait used by the persona pipeline and the
//! error type every provider reports. A provider issues exactly one request
//! per call and never retries; retry decisions belong to
//! [`crate::persona::retry::RetryPolicy`].
//!
//! One provider is implemented:
//! - [`openai::OpenAiCompatibleClient`]: OpenAI-style `/chat/completions` API
//!   (Groq by default)

use async_trait::async_trait;
use regex::Regex;

pub mod openai;

/// Longest error body kept on [`ProviderError::HttpStatus`].
///
/// Rate-limit messages carry their retry hint near the end of a fairly long
/// sentence, so this is generous.
const MAX_ERROR_BODY_CHARS: usize = 2_000;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by chat completion providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP transport failure.
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Success response did not match the expected schema.
    #[error("provider response parse error: {0}")]
    Parse(String),
    /// Upstream provider responded with an error status.
    #[error("provider returned {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, whitespace-collapsed and redacted.
        body: String,
    },
}

impl ProviderError {
    /// HTTP status code, when the failure came from a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Request(err) => err.status().map(|s| s.as_u16()),
            Self::Parse(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

/// Check HTTP response status and return body text or a structured error.
///
/// # Errors
///
/// Returns `ProviderError::Request` on transport failure, `ProviderError::HttpStatus` on non-2xx.
pub async fn check_http_response(response: reqwest::Response) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ProviderError::HttpStatus {
            status: status.as_u16(),
            body: sanitize_http_error_body(&body),
        });
    }
    Ok(body)
}

fn sanitize_http_error_body(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut sanitized = collapsed;
    for pattern in [
        r"gsk_[A-Za-z0-9]{20,}",
        r"sk-[A-Za-z0-9_\-]{20,}",
        r"Bearer [A-Za-z0-9._\-]{16,}",
    ] {
        if let Ok(regex) = Regex::new(pattern) {
            sanitized = regex.replace_all(&sanitized, "[REDACTED]").into_owned();
        }
    }

    if sanitized.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = sanitized
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    sanitized
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A single-shot text generation endpoint.
///
/// Implementations must be `Send + Sync` so a synthesizer can hold one
/// behind an `Arc` across await points.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send `prompt` as the user turn and return the generated text.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport, status, or parse failure.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;

    /// The model identifier this provider is configured for.
    fn model_id(&self) -> &str;
}
