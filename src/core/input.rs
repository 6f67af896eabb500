// src/core/input.rs

use std::io;
use std::path::Path;
use tracing::debug;

/// Reads a wordlist style file: one entry per line, surrounding whitespace
/// trimmed, blank lines and `#` comments skipped.
pub async fn load_lines(path: &Path) -> io::Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path).await?;
    let lines = parse_lines(&content);
    debug!(path = %path.display(), entries = lines.len(), "Loaded list.");
    Ok(lines)
}

pub fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}
