//! # autodoc-core
//!
//! Core types and error types shared across the autodoc crates:
//! - [`Identifier`], the column name that keys a documentation block
//! - `docs` block scanning, rendering, and the deterministic repair pass
//! - Report types returned as JSON by the `autodoc` binary
//! - Cross-cutting error types

pub mod blocks;
pub mod errors;
pub mod identifier;
pub mod responses;

pub use blocks::DocBlock;
pub use errors::CoreError;
pub use identifier::Identifier;
