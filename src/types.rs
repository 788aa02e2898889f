//! Source records fetched for a Reddit user.
//!
//! Records are created once by an [`crate::reddit::ActivitySource`] and are
//! read-only from then on.

use serde::{Deserialize, Serialize};

/// A submission written by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Submission title.
    pub title: String,
    /// Self-text body. Empty for link posts.
    pub text: String,
    /// Permalink.
    pub url: String,
}

impl Post {
    /// Whether the body has any non-whitespace content.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// A comment written by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment body.
    pub text: String,
    /// Permalink.
    pub url: String,
}

impl Comment {
    /// Whether the body has any non-whitespace content.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Everything fetched for one user, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserActivity {
    /// Submissions.
    pub posts: Vec<Post>,
    /// Comments.
    pub comments: Vec<Comment>,
}

impl UserActivity {
    /// True when neither posts nor comments were found.
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.comments.is_empty()
    }
}
