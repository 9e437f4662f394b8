//! Reporting: result assembly (records out of forecasts) and terminal output.

pub mod assemble;
pub mod format;

pub use assemble::*;
pub use format::*;
