//! Cross-container references.
//!
//! A series refers to other objects (its excitation waveform, the raw series
//! it was derived from, rows of the electrode table) through named reference
//! slots. In memory a slot holds a live [`ObjectId`]; on storage it holds the
//! target's [`ObjectPath`](crate::core::ObjectPath). The [`ReferenceResolver`]
//! converts between the two.

mod region;
mod reference;
mod resolver;

pub use region::{ElectrodeRegion, ElectrodeRow, ElectrodeTable, ElectrodeTableRows, ObjectId};
pub use reference::{CrossReference, LiveTarget, RefState, StoredRef, TargetKind};
pub use resolver::{ReferenceResolver, ResolverMode, ScopeEntry};
