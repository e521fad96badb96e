//! Crate-wide constants.

pub const APP_NAME: &str = "hedgerules";

/// Maximum size of a single key in bytes.
pub const MAX_KEY_BYTES: usize = 512;

/// Maximum combined size of a key and its value in bytes.
pub const MAX_ENTRY_BYTES: usize = 1024;

/// Maximum combined size of every key and value in one store (5 MiB).
pub const MAX_TOTAL_BYTES: usize = 5_242_880;

/// Key reported on validation errors that concern the whole dataset.
pub const TOTAL_KEY: &str = "(total)";

/// Maximum number of puts plus deletes accepted by one conditional write.
pub const MAX_KEYS_PER_BATCH: usize = 50;

/// Explicit redirect declarations, relative to the site output directory.
pub const REDIRECTS_FILENAME: &str = "_hedge_redirects.txt";

/// Per-path header declarations, relative to the site output directory.
pub const HEADERS_FILENAME: &str = "_hedge_headers.json";

pub const DEFAULT_CONFIG_FILENAME: &str = "hedgerules.toml";

/// Runtime identifier attached to every deployed edge function.
pub const FUNCTION_RUNTIME: &str = "cloudfront-js-2.0";

/// Length of the hex prefix used for generated identifiers and version tokens.
pub const TOKEN_PREFIX_LEN: usize = 16;
