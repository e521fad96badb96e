//! Function source bodies and the generated preamble.

use crate::consts::{APP_NAME, FUNCTION_RUNTIME};

use super::client::FunctionConfig;

const VIEWER_REQUEST_JS: &[u8] = include_bytes!("viewer-request.js");
const VIEWER_RESPONSE_JS: &[u8] = include_bytes!("viewer-response.js");

/// Which of the two edge functions a payload is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
  /// Redirect lookup, runs before the cache.
  ViewerRequest,
  /// Header injection, runs on the way out.
  ViewerResponse,
}

impl FunctionKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      FunctionKind::ViewerRequest => "viewer-request",
      FunctionKind::ViewerResponse => "viewer-response",
    }
  }
}

/// Source bodies of the two edge functions.
///
/// Bodies are opaque bytes; only [`build_function_code`] touches them, by
/// prepending a preamble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSources {
  request: Vec<u8>,
  response: Vec<u8>,
}

impl FunctionSources {
  pub fn new(request: impl Into<Vec<u8>>, response: impl Into<Vec<u8>>) -> Self {
    Self {
      request: request.into(),
      response: response.into(),
    }
  }

  /// The bodies shipped with this crate.
  pub fn bundled() -> Self {
    Self::new(VIEWER_REQUEST_JS, VIEWER_RESPONSE_JS)
  }

  pub fn body(&self, kind: FunctionKind) -> &[u8] {
    match kind {
      FunctionKind::ViewerRequest => &self.request,
      FunctionKind::ViewerResponse => &self.response,
    }
  }
}

/// Prepend the generated preamble to a function body.
///
/// The preamble declares the store id as `kvsId`; response functions also get
/// `debugHeaders`.
pub fn build_function_code(kind: FunctionKind, body: &[u8], store_id: &str, debug_headers: bool) -> Vec<u8> {
  let mut preamble = format!("var kvsId = '{}';\n", escape_js_string(store_id));
  if kind == FunctionKind::ViewerResponse {
    preamble.push_str(&format!("var debugHeaders = {};\n", debug_headers));
  }

  let mut code = Vec::with_capacity(preamble.len() + body.len());
  code.extend_from_slice(preamble.as_bytes());
  code.extend_from_slice(body);
  code
}

/// Configuration for a managed function associated with one store.
pub fn function_config(name: &str, store_id: &str) -> FunctionConfig {
  FunctionConfig {
    comment: format!("Managed by {}: {}", APP_NAME, name),
    runtime: FUNCTION_RUNTIME.to_string(),
    key_value_store_ids: vec![store_id.to_string()],
  }
}

fn escape_js_string(value: &str) -> String {
  value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
  use super::*;

  const STORE: &str = "arn:aws:cloudfront::123:key-value-store/abc";

  #[test]
  fn bundled_request_body_looks_up_redirects() {
    let body = String::from_utf8_lossy(FunctionSources::bundled().body(FunctionKind::ViewerRequest)).into_owned();
    assert!(body.contains("async function handler"));
    assert!(body.contains("store.get"));
    assert!(body.contains("index.html"));
  }

  #[test]
  fn bundled_response_body_supports_debug_headers() {
    let body = String::from_utf8_lossy(FunctionSources::bundled().body(FunctionKind::ViewerResponse)).into_owned();
    assert!(body.contains("async function handler"));
    assert!(body.contains("{/path}"));
    for header in ["x-hedgerules-patterns", "x-hedgerules-matched", "x-hedgerules-error"] {
      assert!(body.contains(header), "missing {}", header);
    }
    assert!(body.contains("debugHeaders"));
  }

  #[test]
  fn request_preamble_declares_store_only() {
    let code = build_function_code(FunctionKind::ViewerRequest, b"function handler() {}", STORE, true);
    let code = String::from_utf8(code).unwrap();
    assert!(code.starts_with(&format!("var kvsId = '{}';\n", STORE)));
    assert!(!code.contains("debugHeaders"));
    assert!(code.ends_with("function handler() {}"));
  }

  #[test]
  fn response_preamble_declares_debug_toggle() {
    let off = String::from_utf8(build_function_code(FunctionKind::ViewerResponse, b"x", STORE, false)).unwrap();
    assert!(off.contains("var debugHeaders = false;\n"));

    let on = String::from_utf8(build_function_code(FunctionKind::ViewerResponse, b"x", STORE, true)).unwrap();
    assert!(on.contains("var debugHeaders = true;\n"));
    assert!(on.contains(&format!("var kvsId = '{}';", STORE)));
  }

  #[test]
  fn store_id_quotes_are_escaped() {
    let code = build_function_code(FunctionKind::ViewerRequest, b"", "it's", false);
    assert_eq!(code, b"var kvsId = 'it\\'s';\n".to_vec());
  }

  #[test]
  fn config_associates_one_store() {
    let config = function_config("site-request", STORE);
    assert_eq!(config.comment, "Managed by hedgerules: site-request");
    assert_eq!(config.runtime, "cloudfront-js-2.0");
    assert_eq!(config.key_value_store_ids, vec![STORE.to_string()]);
  }
}
