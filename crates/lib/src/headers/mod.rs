//! Header dataset construction.
//!
//! Header declarations map a path pattern to a set of response headers:
//!
//! ```json
//! {
//!   "/": { "X-Frame-Options": "DENY" },
//!   "/blog/": { "Cache-Control": "max-age=3600" },
//!   "*.xml": { "Content-Type": "application/xml" }
//! }
//! ```
//!
//! Each pattern becomes one entry whose value is the newline-joined
//! `Name: value` lines. Patterns and header names are emitted in sorted order
//! so the same declarations always produce the same store contents.

use std::collections::BTreeMap;

use crate::kvs::{Dataset, Entry};

/// Path pattern to header name to header value.
pub type HeaderDeclarations = BTreeMap<String, BTreeMap<String, String>>;

/// Build header entries from declarations.
pub fn collect_headers(declarations: &HeaderDeclarations) -> Dataset {
  declarations
    .iter()
    .map(|(path, headers)| Entry::new(path.clone(), header_lines(headers)))
    .collect()
}

fn header_lines(headers: &BTreeMap<String, String>) -> String {
  headers
    .iter()
    .map(|(name, value)| format!("{}: {}", name, value))
    .collect::<Vec<_>>()
    .join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(json: &str) -> HeaderDeclarations {
    serde_json::from_str(json).unwrap()
  }

  #[test]
  fn one_entry_per_path() {
    let decl = parse(
      r#"{
        "/": { "X-Frame-Options": "DENY", "X-Content-Type-Options": "nosniff" },
        "/blog/my-post/": { "Cache-Control": "max-age=3600" }
      }"#,
    );
    let data = collect_headers(&decl);

    assert_eq!(data.len(), 2);
    assert_eq!(
      data.get("/"),
      Some("X-Content-Type-Options: nosniff\nX-Frame-Options: DENY")
    );
    assert_eq!(data.get("/blog/my-post/"), Some("Cache-Control: max-age=3600"));
  }

  #[test]
  fn empty_declarations() {
    assert!(collect_headers(&HeaderDeclarations::new()).is_empty());
  }

  #[test]
  fn path_with_no_headers_has_empty_value() {
    let data = collect_headers(&parse(r#"{ "/empty/": {} }"#));
    assert_eq!(data.get("/empty/"), Some(""));
  }

  #[test]
  fn output_is_sorted_by_path() {
    let data = collect_headers(&parse(r#"{ "/z": {"A": "1"}, "*.xml": {"B": "2"}, "/a": {"C": "3"} }"#));
    let keys: Vec<_> = data.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["*.xml", "/a", "/z"]);
  }
}
