//! Writing finished personas to disk.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::persona::Persona;

/// Errors writing a persona report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The output directory or file could not be written.
    #[error("failed to write persona to {path}: {source}")]
    Write {
        /// Target path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// File name used for a user's report: `<username>_persona.txt`.
pub fn report_file_name(username: &str) -> String {
    format!("{username}_persona.txt")
}

/// Write the persona text to `<dir>/<username>_persona.txt` as UTF-8,
/// creating `dir` if needed. Returns the written path.
///
/// # Errors
///
/// Returns [`ReportError::Write`] if the directory or file cannot be written.
pub fn save_persona(dir: &Path, persona: &Persona) -> Result<PathBuf, ReportError> {
    let path = dir.join(report_file_name(&persona.username));
    let wrap = |source| ReportError::Write {
        path: path.clone(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(wrap)?;
    std::fs::write(&path, persona.text.as_bytes()).map_err(wrap)?;
    info!(path = %path.display(), "persona saved");
    Ok(path)
}
