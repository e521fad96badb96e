//! hedgerules-lib: edge redirect and header deployment
//!
//! Turns a static-site output directory into the contents of two edge
//! key-value stores and keeps them, plus the two edge functions that read
//! them, in sync with the remote:
//! - `site`, `redirects`, `headers`: read and build the desired datasets
//! - `kvs`: validate datasets, diff them against a store, apply in batches
//! - `function`: assemble function payloads, create or update, publish
//! - `deploy`: the end-to-end pipeline
//! - `provider`: local and in-memory implementations of the remote APIs

pub mod config;
pub mod consts;
pub mod deploy;
pub mod function;
pub mod headers;
pub mod kvs;
pub mod platform;
pub mod provider;
pub mod reconcile;
pub mod redirects;
pub mod site;
pub mod util;
