use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::tracker::RoomTracker;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to encode results json: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write results file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Writes the tracker's flattened per-level result listing as pretty JSON,
/// for operator diagnostics. Write-only: nothing in the core ever reads it
/// back. Returns the path actually written, after file-name sanitization.
pub fn export_results(
    tracker: &RoomTracker,
    directory: &Path,
    file_name: &str,
) -> Result<PathBuf, ExportError> {
    let path = directory.join(sanitize_file_name(file_name));
    let overview = tracker.results_overview();
    let json = serde_json::to_string_pretty(&overview)?;
    write_text_atomic(&path, &json).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Strips path separators and other characters that are invalid in file
/// names on common platforms, and enforces a `.json` extension.
fn sanitize_file_name(file_name: &str) -> String {
    let mut sanitized: String = file_name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') && !c.is_control())
        .collect();
    if sanitized.is_empty() {
        sanitized = "results".to_string();
    }
    if !sanitized.to_ascii_lowercase().ends_with(".json") {
        sanitized.push_str(".json");
    }
    sanitized
}

fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, text)?;
    match fs::remove_file(path) {
        Ok(_) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            let _ = fs::remove_file(&tmp_path);
            return Err(error);
        }
    }
    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("results.tmp");
    let tmp_name = format!("{file_name}.tmp");
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}
