//! Chunking of source records and per-chunk prompt rendering.
//!
//! Prompts are capped in characters (Unicode scalar values), never bytes,
//! so a cut can never land inside a multi-byte code point.

use serde::Deserialize;

use crate::types::{Comment, Post};

use super::prompts::chunk_header;

/// How a rendered prompt longer than its cap is shortened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationStrategy {
    /// Cut the rendered text at the cap, even mid-record.
    #[default]
    Suffix,
    /// Drop trailing records that do not fit whole. Falls back to a suffix
    /// cut when the header alone is over the cap.
    WholeRecords,
}

/// Split `items` into contiguous groups of at most `chunk_size`, in order.
///
/// The last group may be shorter. A `chunk_size` of zero is treated as one.
pub fn build_chunks<T: Clone>(items: &[T], chunk_size: usize) -> Vec<Vec<T>> {
    items.chunks(chunk_size.max(1)).map(<[T]>::to_vec).collect()
}

/// Return the longest prefix of `text` with at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Render one chunk of posts and comments into an analysis prompt.
///
/// Records are listed posts first, then comments, numbered by their
/// position in the chunk. Items with blank text are skipped. The result is
/// never longer than `max_chars` characters.
pub fn render_prompt(
    posts: &[Post],
    comments: &[Comment],
    username: &str,
    max_chars: usize,
    strategy: TruncationStrategy,
) -> String {
    let header = chunk_header(username);
    let records = render_records(posts, comments);

    match strategy {
        TruncationStrategy::Suffix => {
            let full = compose(&header, &records.concat());
            truncate_chars(&full, max_chars).to_owned()
        }
        TruncationStrategy::WholeRecords => {
            let mut content = String::new();
            for record in &records {
                let candidate = format!("{content}{record}");
                if compose(&header, &candidate).chars().count() > max_chars {
                    break;
                }
                content = candidate;
            }
            let rendered = compose(&header, &content);
            truncate_chars(&rendered, max_chars).to_owned()
        }
    }
}

fn compose(header: &str, content: &str) -> String {
    format!("{}\n\n{}", header.trim(), content.trim())
}

fn render_records(posts: &[Post], comments: &[Comment]) -> Vec<String> {
    let posts = (1_usize..)
        .zip(posts)
        .filter(|(_, p)| p.has_text())
        .map(|(n, p)| {
            format!(
                "\nPOST {n}:\nTitle: {}\nText: {}\nURL: {}\n",
                p.title, p.text, p.url
            )
        });
    let comments = (1_usize..)
        .zip(comments)
        .filter(|(_, c)| c.has_text())
        .map(|(n, c)| format!("\nCOMMENT {n}:\nText: {}\nURL: {}\n", c.text, c.url));
    posts.chain(comments).collect()
}
