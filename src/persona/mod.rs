//! Persona synthesis pipeline.
//!
//! - [`chunk`]: splits records into chunks and renders chunk prompts
//! - [`retry`]: bounded retry around one provider call
//! - [`synthesizer`]: runs every chunk, then consolidates

pub mod chunk;
pub mod prompts;
pub mod retry;
pub mod synthesizer;

pub use synthesizer::{Persona, PersonaSynthesizer, SynthesisError};
