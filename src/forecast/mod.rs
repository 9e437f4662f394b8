//! Forecasting: the model interface, the built-in BATS-style model, and the
//! adapter the pipeline talks to.

pub mod adapter;
pub mod bats;
pub mod fitter;
pub mod grid;
pub mod model;
pub mod selection;

pub use adapter::*;
pub use bats::*;
pub use model::*;
