//! Mathematical utilities: least squares, Box-Cox, normal quantiles.

pub mod boxcox;
pub mod normal;
pub mod ols;

pub use boxcox::*;
pub use normal::*;
pub use ols::*;
