//! Chunked persona synthesis.
//!
//! Selects the records worth analysing, summarises them one chunk at a time
//! and merges the partial summaries in a final consolidation call. Chunks
//! run strictly in index order, one at a time, so rate-limit waits apply to
//! the whole run. A failed chunk never aborts the run: its placeholder text
//! flows into consolidation like any other partial summary.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::SynthesisConfig;
use crate::providers::ChatProvider;
use crate::types::{Comment, Post};

use super::chunk::{build_chunks, render_prompt, truncate_chars};
use super::prompts::consolidation_header;
use super::retry::{Completion, RetryPolicy};

/// Separator placed between partial summaries.
const PARTIAL_SEPARATOR: &str = "\n\n";

/// Errors that stop a synthesis run before any provider call.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    /// Nothing with text to analyse.
    #[error("no posts or comments with text found for u/{username}")]
    EmptyInput {
        /// The user that was asked for.
        username: String,
    },
}

/// The final report and how the run went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    /// Reddit username the persona describes.
    pub username: String,
    /// Consolidated report, or the consolidation placeholder if that call failed.
    pub text: String,
    /// Chunk-level calls made (one per chunk).
    pub chunks_processed: usize,
    /// Chunks that ended in a failure placeholder.
    pub chunks_failed: usize,
    /// Whether the consolidation call itself failed.
    pub consolidation_failed: bool,
}

/// Keep items with non-blank text, capping posts and comments independently
/// at `half_budget` each.
///
/// Unused budget in one category is not handed to the other.
pub fn select_items(
    posts: &[Post],
    comments: &[Comment],
    half_budget: usize,
) -> (Vec<Post>, Vec<Comment>) {
    let posts = posts
        .iter()
        .filter(|p| p.has_text())
        .take(half_budget)
        .cloned()
        .collect();
    let comments = comments
        .iter()
        .filter(|c| c.has_text())
        .take(half_budget)
        .cloned()
        .collect();
    (posts, comments)
}

/// Join partial summaries, cut the result to `max_partial_chars` and put
/// the consolidation instructions in front.
pub fn consolidation_prompt(
    username: &str,
    partials: &[Completion],
    max_partial_chars: usize,
) -> String {
    let joined = partials
        .iter()
        .cloned()
        .map(Completion::into_text)
        .collect::<Vec<_>>()
        .join(PARTIAL_SEPARATOR);
    let partial_text = truncate_chars(&joined, max_partial_chars);
    format!("{}{partial_text}", consolidation_header(username))
}

/// Drives chunk summarisation and consolidation against one provider.
pub struct PersonaSynthesizer {
    provider: Arc<dyn ChatProvider>,
    settings: SynthesisConfig,
    retry: RetryPolicy,
}

impl PersonaSynthesizer {
    /// Create a synthesizer.
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        settings: SynthesisConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            settings,
            retry,
        }
    }

    /// Build a persona for `username` from their posts and comments.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::EmptyInput`] when no post or comment has
    /// text. No provider call is made in that case. Provider failures are
    /// never returned; they end up as placeholder text in the report.
    pub async fn synthesize(
        &self,
        posts: &[Post],
        comments: &[Comment],
        username: &str,
    ) -> Result<Persona, SynthesisError> {
        let (posts, comments) = select_items(posts, comments, self.settings.half_budget());
        if posts.is_empty() && comments.is_empty() {
            return Err(SynthesisError::EmptyInput {
                username: username.to_owned(),
            });
        }

        let post_chunks = build_chunks(&posts, self.settings.chunk_size);
        let comment_chunks = build_chunks(&comments, self.settings.chunk_size);
        let total = post_chunks.len().max(comment_chunks.len());
        info!(
            username,
            model = self.provider.model_id(),
            posts = posts.len(),
            comments = comments.len(),
            chunks = total,
            "splitting activity into chunks"
        );

        let mut partials = Vec::with_capacity(total);
        for (i, chunk) in (0..total).zip(1_usize..) {
            info!(chunk, total, "processing chunk");
            let post_chunk = post_chunks.get(i).map(Vec::as_slice).unwrap_or_default();
            let comment_chunk = comment_chunks.get(i).map(Vec::as_slice).unwrap_or_default();

            let prompt = render_prompt(
                post_chunk,
                comment_chunk,
                username,
                self.settings.max_prompt_chars,
                self.settings.truncation,
            );
            let outcome = self.retry.run(self.provider.as_ref(), &prompt).await;
            if outcome.completion.is_failure() {
                warn!(chunk, attempts = outcome.attempts, "chunk failed");
            }
            partials.push(outcome.completion);
        }

        let chunks_failed = partials.iter().filter(|c| c.is_failure()).count();
        info!(chunks_failed, "consolidating partial insights into final persona");

        let prompt = consolidation_prompt(username, &partials, self.settings.max_partial_chars);
        let outcome = self.retry.run(self.provider.as_ref(), &prompt).await;
        let consolidation_failed = outcome.completion.is_failure();
        if consolidation_failed {
            warn!(attempts = outcome.attempts, "consolidation failed");
        }

        Ok(Persona {
            username: username.to_owned(),
            text: outcome.completion.into_text(),
            chunks_processed: partials.len(),
            chunks_failed,
            consolidation_failed,
        })
    }
}
