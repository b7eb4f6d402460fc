//! Core layer - the in-memory building blocks of a series.
//!
//! This module provides:
//! - [`ObjectPath`] - Stable hierarchical paths used on storage
//! - [`DataArray`] - Shared, row-sliceable n-dimensional sample buffers
//! - [`Timing`] - Rate or timestamp based sample timing
//! - [`AttrValue`] / [`Attributes`] - Typed type-specific attributes

mod path;
mod data;
mod timing;
mod attributes;

pub use path::ObjectPath;
pub use data::{DataArray, DataDigest};
pub use timing::Timing;
pub use attributes::{AttrValue, Attributes};
