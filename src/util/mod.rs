//! Utility types shared by every layer of the crate.
//!
//! - [`Dtype`] - Storage datatypes recognised by schema attributes
//! - [`Dimensions`] - Shape of n-dimensional series data
//! - [`Error`] / [`Result`] - Error taxonomy
//! - [`init_logging`] - Optional `tracing` subscriber setup

mod dtype;
mod error;
mod dimensions;
mod logging;

pub use dtype::*;
pub use error::*;
pub use dimensions::*;
pub use logging::init_logging;
