//! Parsing of line-oriented redirect declarations.
//!
//! Each line is `source destination [status]`, whitespace separated. Blank
//! lines and lines starting with `#` are ignored. The status field is accepted
//! but unused: every redirect is served as a 301.

use tracing::warn;

use crate::kvs::{Dataset, Entry};

/// A declaration line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
  /// One-based line number.
  pub line: usize,
  pub content: String,
}

/// Result of parsing a declarations file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedRedirects {
  pub entries: Dataset,
  pub skipped: Vec<SkippedLine>,
}

/// Parse redirect declarations.
///
/// Malformed lines are logged and skipped rather than failing the parse.
/// A source declared twice keeps its last destination.
pub fn parse_declarations(content: &str) -> ParsedRedirects {
  let mut parsed = ParsedRedirects::default();

  for (idx, raw) in content.lines().enumerate() {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
      continue;
    }

    let mut fields = line.split_whitespace();
    match (fields.next(), fields.next()) {
      (Some(source), Some(destination)) => {
        parsed.entries.insert(Entry::new(source, destination));
      }
      _ => {
        warn!(line = idx + 1, content = %line, "skipping invalid redirect declaration");
        parsed.skipped.push(SkippedLine {
          line: idx + 1,
          content: line.to_string(),
        });
      }
    }
  }

  parsed
}
