//! Cross-reference slots and their state machine.

use serde::{Deserialize, Serialize};

use super::{ElectrodeRegion, ObjectId};
use crate::core::ObjectPath;
use crate::util::ReferenceError;

/// What a reference slot may point at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
    /// A whole object, addressed by path.
    Series,
    /// Selected rows of an electrode table.
    Region,
}

impl TargetKind {
    /// Name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Series => "series",
            Self::Region => "electrode region",
        }
    }
}

/// What a bound reference points at in the current session.
#[derive(Clone, Debug, PartialEq)]
pub enum LiveTarget {
    /// Another series.
    Series(ObjectId),
    /// Rows of an electrode table.
    Region(ElectrodeRegion),
}

impl LiveTarget {
    /// Identity of the referenced object (the table for regions).
    pub fn object_id(&self) -> ObjectId {
        match self {
            Self::Series(id) => *id,
            Self::Region(region) => region.table,
        }
    }

    /// Kind of slot this target fits.
    pub fn kind(&self) -> TargetKind {
        match self {
            Self::Series(_) => TargetKind::Series,
            Self::Region(_) => TargetKind::Region,
        }
    }
}

/// Storage form of a reference: paths instead of identities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoredRef {
    /// Whole object at `path`.
    Object {
        path: ObjectPath,
    },
    /// Rows of the table at `table`.
    Region {
        table: ObjectPath,
        rows: Vec<usize>,
        #[serde(default)]
        description: String,
    },
}

impl StoredRef {
    /// Path of the referenced object (the table for regions).
    pub fn path(&self) -> &ObjectPath {
        match self {
            Self::Object { path } => path,
            Self::Region { table, .. } => table,
        }
    }

    /// Kind of slot this stored form belongs to.
    pub fn kind(&self) -> TargetKind {
        match self {
            Self::Object { .. } => TargetKind::Series,
            Self::Region { .. } => TargetKind::Region,
        }
    }
}

/// State of one reference slot.
#[derive(Clone, Debug, PartialEq)]
pub enum RefState {
    /// Never bound.
    Unbound,
    /// Points at a live object of this session.
    Bound(LiveTarget),
    /// Holds the stored path, waiting to be re-linked.
    Serialized(StoredRef),
}

impl RefState {
    fn name(&self) -> &'static str {
        match self {
            Self::Unbound => "Unbound",
            Self::Bound(_) => "Bound",
            Self::Serialized(_) => "Serialized",
        }
    }
}

/// A named reference slot of a series.
///
/// Allowed transitions: `Unbound -> Bound`, `Bound -> Serialized` and
/// `Serialized -> Bound`.
#[derive(Clone, Debug, PartialEq)]
pub struct CrossReference {
    field: String,
    required: bool,
    kind: TargetKind,
    state: RefState,
}

impl CrossReference {
    /// Unbound slot for `field`.
    pub fn new(field: &str, required: bool, kind: TargetKind) -> Self {
        Self {
            field: field.to_string(),
            required,
            kind,
            state: RefState::Unbound,
        }
    }

    /// Name of the reference field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Check if the schema requires this reference.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Kind of target this slot accepts.
    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Current state of the slot.
    pub fn state(&self) -> &RefState {
        &self.state
    }

    /// Check if the slot was never bound.
    pub fn is_unbound(&self) -> bool {
        matches!(self.state, RefState::Unbound)
    }

    /// Live target, if bound.
    pub fn target(&self) -> Option<&LiveTarget> {
        match &self.state {
            RefState::Bound(target) => Some(target),
            _ => None,
        }
    }

    /// Stored form, if serialized.
    pub fn stored(&self) -> Option<&StoredRef> {
        match &self.state {
            RefState::Serialized(stored) => Some(stored),
            _ => None,
        }
    }

    /// Check that [`bind`](Self::bind) would accept `target` without binding it.
    pub fn check_bind(&self, target: &LiveTarget) -> Result<(), ReferenceError> {
        if let RefState::Bound(_) = self.state {
            return Err(self.illegal("Bound"));
        }
        self.check_kind(target.kind())
    }

    /// Attach a live target (from `Unbound` or `Serialized`).
    pub fn bind(&mut self, target: LiveTarget) -> Result<(), ReferenceError> {
        self.check_bind(&target)?;
        self.state = RefState::Bound(target);
        Ok(())
    }

    /// Replace the live target with its stored form (from `Bound` only).
    pub fn serialize(&mut self, stored: StoredRef) -> Result<(), ReferenceError> {
        match self.state {
            RefState::Bound(_) => {
                self.check_kind(stored.kind())?;
                self.state = RefState::Serialized(stored);
                Ok(())
            }
            _ => Err(self.illegal("Serialized")),
        }
    }

    /// Put the slot into its stored state after reading, whatever its state.
    pub(crate) fn restore(&mut self, stored: StoredRef) -> Result<(), ReferenceError> {
        self.check_kind(stored.kind())?;
        self.state = RefState::Serialized(stored);
        Ok(())
    }

    fn check_kind(&self, actual: TargetKind) -> Result<(), ReferenceError> {
        if actual != self.kind {
            return Err(ReferenceError::TargetKindMismatch {
                field: self.field.clone(),
                expected: self.kind.name(),
                actual: actual.name(),
            });
        }
        Ok(())
    }

    fn illegal(&self, to: &'static str) -> ReferenceError {
        ReferenceError::IllegalTransition {
            field: self.field.clone(),
            from: self.state.name(),
            to,
        }
    }
}
