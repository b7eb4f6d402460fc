//! Typed attributes attached to a series.
//!
//! Attributes are the type-specific scalar, string and small-array values of a
//! series (e.g. `scan_frequency`, `waveform_shape`). They are kept in insertion
//! order; equality ignores order.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::util::{Dtype, DtypeFamily};

/// A single attribute value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrValue {
    /// Boolean flag
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    Uint(u64),
    /// Floating point number
    Float(f64),
    /// UTF-8 string
    Text(String),
    /// 1-D signed integer array
    IntArray(Vec<i64>),
    /// 1-D float array
    FloatArray(Vec<f64>),
    /// 1-D string array
    TextArray(Vec<String>),
}

impl AttrValue {
    /// Short name of the value kind for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::IntArray(_) => "int array",
            Self::FloatArray(_) => "float array",
            Self::TextArray(_) => "text array",
        }
    }

    /// Check if this is an array value.
    pub fn is_array(&self) -> bool {
        matches!(self, Self::IntArray(_) | Self::FloatArray(_) | Self::TextArray(_))
    }

    /// Number of elements (1 for scalars).
    pub fn len(&self) -> usize {
        match self {
            Self::IntArray(v) => v.len(),
            Self::FloatArray(v) => v.len(),
            Self::TextArray(v) => v.len(),
            _ => 1,
        }
    }

    /// Index of the first NaN or infinite element, if any.
    pub fn non_finite_index(&self) -> Option<usize> {
        match self {
            Self::Float(v) if !v.is_finite() => Some(0),
            Self::FloatArray(v) => v.iter().position(|x| !x.is_finite()),
            _ => None,
        }
    }

    /// Float payload of a scalar float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Text payload of a scalar string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload, if it fits an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Uint(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Whether this value can be stored under `dtype` without conversion.
    ///
    /// Integers must also fit the width of the declared type.
    pub fn matches_dtype(&self, dtype: Dtype) -> bool {
        match self {
            Self::Bool(_) => dtype == Dtype::Bool,
            Self::Float(_) | Self::FloatArray(_) => dtype.is_float(),
            Self::Text(_) | Self::TextArray(_) => dtype == Dtype::Text,
            Self::Int(v) => int_fits(*v, dtype),
            Self::Uint(v) => uint_fits(*v, dtype),
            Self::IntArray(v) => v.iter().all(|x| int_fits(*x, dtype)),
        }
    }
}

fn int_fits(v: i64, dtype: Dtype) -> bool {
    match dtype.family() {
        DtypeFamily::Signed => {
            let bits = dtype.num_bytes() * 8;
            bits == 64 || (v >= -(1i64 << (bits - 1)) && v < (1i64 << (bits - 1)))
        }
        DtypeFamily::Unsigned => v >= 0 && uint_fits(v as u64, dtype),
        _ => false,
    }
}

fn uint_fits(v: u64, dtype: Dtype) -> bool {
    match dtype.family() {
        DtypeFamily::Unsigned => {
            let bits = dtype.num_bytes() * 8;
            bits == 64 || v < (1u64 << bits)
        }
        DtypeFamily::Signed => i64::try_from(v).map(|x| int_fits(x, dtype)).unwrap_or(false),
        _ => false,
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Uint(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
            Self::IntArray(v) => write!(f, "{:?}", v),
            Self::FloatArray(v) => write!(f, "{:?}", v),
            Self::TextArray(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(v: Vec<f64>) -> Self {
        Self::FloatArray(v)
    }
}

/// Ordered attribute storage.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes {
    entries: SmallVec<[(String, AttrValue); 6]>,
}

impl Attributes {
    /// Empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing an existing one with the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        let name = name.into();
        let value = value.into();
        for (k, v) in &mut self.entries {
            if *k == name {
                *v = value;
                return;
            }
        }
        self.entries.push((name, value));
    }

    /// Value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Check if a value is stored under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    /// Remove a value and return it.
    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        let pos = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(pos).1)
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no values are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Float attribute by name.
    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(AttrValue::as_f64)
    }

    /// Text attribute by name.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttrValue::as_str)
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter().map(|(k, v)| (k, v))).finish()
    }
}

impl FromIterator<(String, AttrValue)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (String, AttrValue)>>(iter: T) -> Self {
        let mut attrs = Self::new();
        for (k, v) in iter {
            attrs.set(k, v);
        }
        attrs
    }
}
