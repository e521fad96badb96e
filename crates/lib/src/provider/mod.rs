//! Concrete implementations of the store and function clients.
//!
//! - [`LocalEdge`] keeps state in a directory and is what the CLI deploys to.
//! - [`MemoryEdge`] keeps state in memory and records calls for tests.

pub mod local;
pub mod memory;

pub use local::LocalEdge;
pub use memory::MemoryEdge;
