//! Input/output helpers.
//!
//! - payload validation + normalization, JSON/CSV loading (`ingest`)
//! - whole-document JSON read/write (`store`)

pub mod ingest;
pub mod store;

pub use ingest::*;
pub use store::*;
