//! Redpersona: LLM-written persona reports for Reddit users.
//!
//! Fetches a user's public posts and comments, summarises them chunk by
//! chunk through a chat completions API, and consolidates the partial
//! summaries into one nine-section persona report.
//!
//! See `DESIGN.md` for the module map.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod logging;
pub mod providers;
pub mod types;

pub mod persona;
pub mod profile_url;
pub mod reddit;
pub mod report;
