//! Schema registry - versioned type definitions and instance validation.
//!
//! Type definitions are keyed by `(namespace, name, version)`. Once a key is
//! registered its content never changes; schema evolution registers a new
//! version. Each definition may extend one parent, and the merged attribute
//! set (ancestors first, child overrides narrowing only) is computed once at
//! registration time.
//!
//! ## Example
//!
//! ```ignore
//! use ndx_fscv::schema::SchemaRegistry;
//!
//! let registry = SchemaRegistry::with_builtin()?;
//! for spec in registry.resolve_attributes(&ndx_fscv::fscv::response_key())? {
//!     println!("{} required={}", spec.name, spec.required);
//! }
//! ```

mod types;
mod registry;
mod shared;
mod loader;
mod builtin;

pub use types::{AttributeKind, AttributeSpec, TypeDefinition, TypeKey};
pub use registry::SchemaRegistry;
pub use shared::SharedRegistry;
pub use loader::{NamespaceSpec, load_namespace};
pub use builtin::{core_namespace, fscv_namespace, CORE_NAMESPACE, CORE_VERSION, TIME_SERIES, DYNAMIC_TABLE};
