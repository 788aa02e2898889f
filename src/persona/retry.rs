//! Bounded retry around a single chat completion call.
//!
//! [`RetryPolicy::run`] never fails: every call resolves to a
//! [`Completion`], either generated text or a [`ChunkFailure`] describing
//! why the prompt was given up on. Rate limits are retried after the wait
//! the provider suggests; oversized payloads are never retried.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::providers::{ChatProvider, ProviderError};

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// What a provider failure means for the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The prompt is too large to ever succeed.
    PayloadTooLarge,
    /// The provider asked us to back off.
    RateLimited {
        /// Wait suggested by the provider, when it gave one.
        retry_after: Option<Duration>,
    },
    /// Anything else. Not retried.
    Other,
}

/// Maps provider errors to an [`ErrorClass`].
///
/// Rate-limit hints are usually buried in human-readable messages, so the
/// parsing strategy lives behind this trait instead of in the retry loop.
pub trait ErrorClassifier: Send + Sync {
    /// Classify one failed attempt.
    fn classify(&self, err: &ProviderError) -> ErrorClass;
}

/// Default classifier: 413 and 429 status codes, with the retry hint read
/// from `try again in <n>s` in the error text.
#[derive(Debug, Clone)]
pub struct HttpStatusClassifier {
    retry_hint: Option<Regex>,
}

impl HttpStatusClassifier {
    /// Create the classifier.
    pub fn new() -> Self {
        Self {
            retry_hint: Regex::new(r"try again in (?:(\d+)m)?([\d.]+)(ms|s)").ok(),
        }
    }

    /// Parse the suggested wait out of an error message.
    ///
    /// Understands `7.5s`, `1m30.5s` and `450ms`.
    pub fn parse_retry_after(&self, message: &str) -> Option<Duration> {
        let caps = self.retry_hint.as_ref()?.captures(message)?;
        let minutes: f64 = match caps.get(1) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0.0,
        };
        let value: f64 = caps.get(2)?.as_str().parse().ok()?;
        let seconds = match caps.get(3).map(|u| u.as_str()) {
            Some("ms") => value / 1_000.0,
            _ => value,
        };
        Duration::try_from_secs_f64(minutes * 60.0 + seconds).ok()
    }
}

impl Default for HttpStatusClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorClassifier for HttpStatusClassifier {
    fn classify(&self, err: &ProviderError) -> ErrorClass {
        match err.status() {
            Some(413) => ErrorClass::PayloadTooLarge,
            Some(429) => ErrorClass::RateLimited {
                retry_after: self.parse_retry_after(&err.to_string()),
            },
            _ => ErrorClass::Other,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Why a prompt was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rejected as too large; not retried.
    PayloadTooLarge,
    /// Still rate limited after the last attempt.
    RateLimited,
    /// Any other error.
    Other,
}

/// A prompt that did not produce text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    /// Failure category.
    pub kind: FailureKind,
    /// Error message of the last attempt.
    pub detail: String,
}

impl fmt::Display for ChunkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::PayloadTooLarge => {
                write!(f, "Chunk failed due to prompt too large: {}", self.detail)
            }
            FailureKind::RateLimited | FailureKind::Other => {
                write!(f, "Chunk failed: {}", self.detail)
            }
        }
    }
}

/// Result of running one prompt through the retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Text generated by the model.
    Generated(String),
    /// The prompt was given up on.
    Failed(ChunkFailure),
}

impl Completion {
    /// Whether this is a failure placeholder.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Flatten to text: generated output, or the failure placeholder.
    pub fn into_text(self) -> String {
        match self {
            Self::Generated(text) => text,
            Self::Failed(failure) => failure.to_string(),
        }
    }
}

/// A [`Completion`] plus what it took to get there.
#[derive(Debug, Clone)]
pub struct RetryOutcome {
    /// Final result.
    pub completion: Completion,
    /// Provider calls made, including the first.
    pub attempts: u32,
    /// Every rate-limit wait that was slept, in order.
    pub waits: Vec<Duration>,
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Longest single rate-limit wait unless configured otherwise.
const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(120);

/// Retry-on-rate-limit, fail-fast-on-too-large wrapper for provider calls.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    default_wait: Duration,
    wait_padding: Duration,
    max_wait: Duration,
    classifier: Arc<dyn ErrorClassifier>,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("default_wait", &self.default_wait)
            .field("wait_padding", &self.wait_padding)
            .field("max_wait", &self.max_wait)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Create a policy with the default [`HttpStatusClassifier`] and a
    /// 120 s cap on any single wait.
    ///
    /// A `max_attempts` of zero is treated as one.
    pub fn new(max_attempts: u32, default_wait: Duration, wait_padding: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            default_wait,
            wait_padding,
            max_wait: DEFAULT_MAX_WAIT,
            classifier: Arc::new(HttpStatusClassifier::new()),
        }
    }

    /// Build a policy from config. Negative or non-finite waits fall back to
    /// the defaults.
    pub fn from_config(config: &RetryConfig) -> Self {
        let defaults = RetryConfig::default();
        let secs = |value: f64, fallback: f64| {
            Duration::try_from_secs_f64(value)
                .or_else(|_| Duration::try_from_secs_f64(fallback))
                .unwrap_or_default()
        };
        Self::new(
            config.max_attempts,
            secs(config.default_wait_secs, defaults.default_wait_secs),
            secs(config.wait_padding_secs, defaults.wait_padding_secs),
        )
        .with_max_wait(secs(config.max_wait_secs, defaults.max_wait_secs))
    }

    /// Cap every rate-limit wait, padding included, at `max_wait`.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Swap the error classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Attempts per prompt, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `prompt` through `provider` until it succeeds or is given up on.
    pub async fn run(&self, provider: &dyn ChatProvider, prompt: &str) -> RetryOutcome {
        let mut waits = Vec::new();
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            let err = match provider.complete(prompt).await {
                Ok(text) => {
                    debug!(attempt, chars = text.chars().count(), "completion succeeded");
                    return RetryOutcome {
                        completion: Completion::Generated(text),
                        attempts: attempt,
                        waits,
                    };
                }
                Err(err) => err,
            };

            let kind = match self.classifier.classify(&err) {
                ErrorClass::PayloadTooLarge => {
                    warn!(attempt, error = %err, "request too large, skipping prompt");
                    FailureKind::PayloadTooLarge
                }
                ErrorClass::RateLimited { retry_after } if attempt < self.max_attempts => {
                    let wait = retry_after
                        .unwrap_or(self.default_wait)
                        .saturating_add(self.wait_padding)
                        .min(self.max_wait);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        wait_secs = wait.as_secs_f64(),
                        "rate limited, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                    waits.push(wait);
                    continue;
                }
                ErrorClass::RateLimited { .. } => FailureKind::RateLimited,
                ErrorClass::Other => FailureKind::Other,
            };

            if kind != FailureKind::PayloadTooLarge {
                warn!(attempt, error = %err, "final failure");
            }
            return RetryOutcome {
                completion: Completion::Failed(ChunkFailure {
                    kind,
                    detail: err.to_string(),
                }),
                attempts: attempt,
                waits,
            };
        }
    }
}
