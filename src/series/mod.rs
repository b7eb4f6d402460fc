//! Typed series container.
//!
//! A [`SeriesInstance`] is a named, described, n-dimensional time series with
//! rate or timestamp timing, a unit, type-specific attributes and reference
//! slots. It is created by [`SeriesBuilder::build`], which validates it against
//! a [`SchemaRegistry`](crate::schema::SchemaRegistry).

mod builder;
mod instance;

pub use builder::SeriesBuilder;
pub use instance::SeriesInstance;
