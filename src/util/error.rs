//! Error types for the FSCV container model.
//!
//! Each component reports its own family ([`SchemaError`], [`ValidationError`],
//! [`ReferenceError`], [`BoundsError`]); all of them convert into the crate-wide
//! [`Error`] so callers can use `?` across layers.

use super::Dtype;
use thiserror::Error;

/// Failures while registering or resolving type definitions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Same (namespace, name, version) registered with different content
    #[error("Type {key} is already registered with different content")]
    DuplicateType { key: String },

    /// Parent links loop back onto themselves
    #[error("Cyclic inheritance: {}", chain.join(" -> "))]
    CyclicInheritance { chain: Vec<String> },

    /// Parent type name is not registered
    #[error("Type {type_name} extends unknown parent {parent}")]
    UnknownParent { type_name: String, parent: String },

    /// Type looked up by name or key is not registered
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// Child attribute widens or changes the datatype of an ancestor attribute
    #[error("Type {type_name} widens attribute '{attribute}' from {parent} to {child}")]
    WideningOverride {
        type_name: String,
        attribute: String,
        parent: Dtype,
        child: Dtype,
    },

    /// Child attribute changes kind, drops a fixed value or loosens a constraint
    #[error("Type {type_name} cannot override attribute '{attribute}': {reason}")]
    IllegalOverride {
        type_name: String,
        attribute: String,
        reason: String,
    },

    /// Attribute declared twice by the same definition
    #[error("Type {type_name} declares attribute '{attribute}' more than once")]
    DuplicateAttribute { type_name: String, attribute: String },

    /// Registry no longer accepts definitions
    #[error("Schema registry is frozen")]
    Frozen,

    /// Namespace document could not be interpreted
    #[error("Malformed schema: {0}")]
    Malformed(String),
}

/// Failures while checking an instance against its type definition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required attribute absent
    #[error("Type {type_name} requires attribute '{attribute}'")]
    MissingRequiredAttribute { type_name: String, attribute: String },

    /// Attribute value does not have the declared datatype
    #[error("Attribute '{attribute}': expected {expected}, got {actual}")]
    DatatypeMismatch {
        attribute: String,
        expected: String,
        actual: String,
    },

    /// Attribute has a fixed value in the schema and the instance disagrees
    #[error("Attribute '{attribute}' must be '{expected}', got '{actual}'")]
    FixedValueMismatch {
        attribute: String,
        expected: String,
        actual: String,
    },

    /// Array attribute or dataset has the wrong rank or extent
    #[error("Attribute '{attribute}': expected shape {expected}, got {actual}")]
    ShapeMismatch {
        attribute: String,
        expected: String,
        actual: String,
    },

    /// Attribute present on the instance but not declared by its type
    #[error("Type {type_name} does not declare attribute '{attribute}'")]
    UndeclaredAttribute { type_name: String, attribute: String },

    /// NaN or infinite float in data or a float attribute
    #[error("Attribute '{attribute}' holds a non-finite value at index {index}")]
    NonFiniteValue { attribute: String, index: usize },

    /// Rate/timestamps invariant broken
    #[error("Timing invariant violated: {0}")]
    TimingInvariantViolation(String),

    /// Instance claims a type that is not the requested one nor derived from it
    #[error("Instance of type {actual} cannot be validated as {expected}")]
    TypeMismatch { expected: String, actual: String },
}

/// Failures while binding, serializing or re-linking cross references.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReferenceError {
    /// Strict resolver asked to bind a target outside the current scope
    #[error("Reference '{field}' points at {target}, which is not in the resolution scope")]
    DanglingReference { field: String, target: String },

    /// Stored path could not be resolved on read
    #[error("Reference '{field}' could not be resolved from path {path}")]
    UnresolvedReference { field: String, path: String },

    /// Required reference was never bound
    #[error("Required reference '{field}' is unbound")]
    MissingReference { field: String },

    /// Reference state machine step that is not allowed
    #[error("Reference '{field}' cannot move from {from} to {to}")]
    IllegalTransition {
        field: String,
        from: &'static str,
        to: &'static str,
    },

    /// Field is not a reference slot of the instance
    #[error("'{field}' is not a reference field of this series")]
    UndeclaredReference { field: String },

    /// Target exists but has the wrong type
    #[error("Reference '{field}' expects a {expected}, found {actual}")]
    TargetTypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// Series bound where rows are expected, or the other way round
    #[error("Reference '{field}' expects a {expected} target, found a {actual}")]
    TargetKindMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Electrode selection without rows
    #[error("Electrode region must select at least one row")]
    EmptyRegion,

    /// Electrode selection beyond the table
    #[error("Electrode row {row} out of range (table has {num_rows} rows)")]
    RowOutOfRange { row: usize, num_rows: usize },
}

/// Index range errors on series data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    /// Requested range exceeds the data extent or is reversed
    #[error("Range {start}..{end} out of bounds (len: {len})")]
    OutOfBounds { start: usize, end: usize, len: usize },
}

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Bounds(#[from] BoundsError),

    /// Two objects with the same name in one group
    #[error("Group {group} already contains an object named '{name}'")]
    DuplicateName { group: String, name: String },

    /// Object not found by path or name
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored document is structurally wrong
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

impl Error {
    /// Create an invalid document error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidDocument(msg.into())
    }
}

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = SchemaError::CyclicInheritance {
            chain: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(e.to_string(), "Cyclic inheritance: A -> B -> A");

        let e = BoundsError::OutOfBounds { start: 2, end: 12, len: 10 };
        assert!(e.to_string().contains("12"));
        assert!(e.to_string().contains("10"));
    }

    #[test]
    fn test_family_conversion() {
        let err: Error = ValidationError::TimingInvariantViolation("no timing".into()).into();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::TimingInvariantViolation(_))
        ));
        assert!(err.to_string().contains("no timing"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
