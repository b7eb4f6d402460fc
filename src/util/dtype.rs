//! Storage datatypes for schema attributes and datasets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Datatype of an attribute or dataset, named the way schema files spell them.
///
/// Numeric types are ordered inside their family by width, which is what
/// override narrowing is checked against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Dtype {
    /// Boolean flag
    Bool,
    /// Unsigned 8-bit integer
    Uint8,
    /// Signed 8-bit integer
    Int8,
    /// Unsigned 16-bit integer
    Uint16,
    /// Signed 16-bit integer
    Int16,
    /// Unsigned 32-bit integer
    Uint32,
    /// Signed 32-bit integer
    Int32,
    /// Unsigned 64-bit integer
    Uint64,
    /// Signed 64-bit integer
    Int64,
    /// 32-bit floating point
    Float32,
    /// 64-bit floating point
    Float64,
    /// UTF-8 text
    Text,
}

/// Coarse family a [`Dtype`] belongs to. Overrides never cross families.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DtypeFamily {
    /// `bool`
    Bool,
    /// `uint8` to `uint64`
    Unsigned,
    /// `int8` to `int64`
    Signed,
    /// `float32` and `float64`
    Float,
    /// Variable-length strings
    Text,
}

impl Dtype {
    /// Size in bytes of one element. Text reports 0 (variable length).
    #[inline]
    pub const fn num_bytes(self) -> usize {
        match self {
            Self::Bool | Self::Uint8 | Self::Int8 => 1,
            Self::Uint16 | Self::Int16 => 2,
            Self::Uint32 | Self::Int32 | Self::Float32 => 4,
            Self::Uint64 | Self::Int64 | Self::Float64 => 8,
            Self::Text => 0,
        }
    }

    /// Name as written in schema documents.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Uint8 => "uint8",
            Self::Int8 => "int8",
            Self::Uint16 => "uint16",
            Self::Int16 => "int16",
            Self::Uint32 => "uint32",
            Self::Int32 => "int32",
            Self::Uint64 => "uint64",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Text => "text",
        }
    }

    /// Parse a dtype name, accepting the common aliases used by schema authors.
    pub fn from_name(name: &str) -> Option<Self> {
        let dtype = match name {
            "bool" => Self::Bool,
            "uint8" => Self::Uint8,
            "int8" => Self::Int8,
            "uint16" => Self::Uint16,
            "int16" => Self::Int16,
            "uint32" | "uint" => Self::Uint32,
            "int32" | "int" => Self::Int32,
            "uint64" => Self::Uint64,
            "int64" | "long" => Self::Int64,
            "float32" | "float" => Self::Float32,
            "float64" | "double" => Self::Float64,
            "text" | "utf" | "utf8" | "utf-8" | "ascii" => Self::Text,
            _ => return None,
        };
        Some(dtype)
    }

    /// Family of this dtype.
    pub const fn family(self) -> DtypeFamily {
        match self {
            Self::Bool => DtypeFamily::Bool,
            Self::Uint8 | Self::Uint16 | Self::Uint32 | Self::Uint64 => DtypeFamily::Unsigned,
            Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 => DtypeFamily::Signed,
            Self::Float32 | Self::Float64 => DtypeFamily::Float,
            Self::Text => DtypeFamily::Text,
        }
    }

    /// Returns true for integer and floating point types.
    #[inline]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Bool | Self::Text)
    }

    /// Returns true for floating point types.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Whether `child` may replace `self` in a derived type definition.
    ///
    /// A child may keep the dtype or narrow it within the same family; it may
    /// never widen it or switch family.
    pub fn admits_override(self, child: Dtype) -> bool {
        self.family() == child.family() && child.num_bytes() <= self.num_bytes()
    }
}

impl TryFrom<String> for Dtype {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::from_name(&name).ok_or_else(|| format!("unknown dtype '{}'", name))
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
