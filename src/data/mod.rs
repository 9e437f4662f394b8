//! External data sources.

pub mod worldbank;

pub use worldbank::*;
