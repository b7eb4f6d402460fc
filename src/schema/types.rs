//! Type definition structures.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::core::AttrValue;
use crate::util::Dtype;

/// Identity of a registered type: `(namespace, name, version)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeKey {
    pub namespace: String,
    pub name: String,
    /// Dotted version, compared numerically.
    pub version: String,
}

impl TypeKey {
    /// Key from its parts.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    /// Same namespace and name, ignoring version.
    pub fn same_lineage(&self, other: &TypeKey) -> bool {
        self.namespace == other.namespace && self.name == other.name
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.namespace, self.name, self.version)
    }
}

impl PartialOrd for TypeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.namespace
            .cmp(&other.namespace)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| compare_versions(&self.version, &other.version))
            .then_with(|| self.version.cmp(&other.version))
    }
}

/// Compare dotted version strings numerically where possible ("0.10.0" > "0.9.1").
pub(crate) fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// How an attribute is stored on an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    /// Single value
    Scalar,
    /// N-dimensional values (datasets and array attributes)
    Array,
    /// Link to another object
    Reference,
}

fn default_true() -> bool {
    true
}

/// Declaration of one attribute of a type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    /// Attribute name, unique within the resolved type.
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
    pub kind: AttributeKind,
    /// Element datatype; `None` for references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<Dtype>,
    /// Whether instances must carry the attribute.
    #[serde(default = "default_true")]
    pub required: bool,
    /// Value assumed when an optional attribute is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<AttrValue>,
    /// Value the attribute must always have.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<AttrValue>,
    /// Type name a reference must point at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    /// Number of dimensions of an array; `None` means any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    /// Dimension labels of an array.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dims: Vec<String>,
    /// Reference selects rows of the target table rather than the whole object.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub region: bool,
}

impl AttributeSpec {
    fn base(name: &str, kind: AttributeKind, dtype: Option<Dtype>) -> Self {
        Self {
            name: name.to_string(),
            doc: String::new(),
            kind,
            dtype,
            required: true,
            default: None,
            value: None,
            target_type: None,
            rank: None,
            dims: Vec::new(),
            region: false,
        }
    }

    /// Required scalar attribute.
    pub fn scalar(name: &str, dtype: Dtype) -> Self {
        Self::base(name, AttributeKind::Scalar, Some(dtype))
    }

    /// Required array of any rank.
    pub fn array(name: &str, dtype: Dtype) -> Self {
        Self::base(name, AttributeKind::Array, Some(dtype))
    }

    /// Required reference to an object of `target_type`.
    pub fn reference(name: &str, target_type: &str) -> Self {
        let mut spec = Self::base(name, AttributeKind::Reference, None);
        spec.target_type = Some(target_type.to_string());
        spec
    }

    /// Required reference to rows of a table of `table_type`.
    pub fn region_reference(name: &str, table_type: &str) -> Self {
        let mut spec = Self::reference(name, table_type);
        spec.region = true;
        spec
    }

    /// Make the attribute optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set the documentation string.
    pub fn doc(mut self, doc: &str) -> Self {
        self.doc = doc.to_string();
        self
    }

    /// Value assumed when the attribute is absent.
    pub fn with_default(mut self, value: impl Into<AttrValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Value the attribute must always have.
    pub fn fixed(mut self, value: impl Into<AttrValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Fix the rank through dimension labels.
    pub fn dims(mut self, labels: &[&str]) -> Self {
        self.rank = Some(labels.len());
        self.dims = labels.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Check if the attribute links to another object.
    pub fn is_reference(&self) -> bool {
        self.kind == AttributeKind::Reference
    }
}

/// A data type declaration.
///
/// `namespace` and `version` come from the namespace the definition belongs to
/// and are not repeated inside namespace documents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    #[serde(skip)]
    pub namespace: String,
    #[serde(skip)]
    pub version: String,
    /// Type name, unique within its namespace and version.
    pub name: String,
    /// Name of the parent type, looked up in this namespace and its includes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
    /// Own attributes, in declaration order.
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
}

impl TypeDefinition {
    /// Definition without parent or attributes.
    pub fn new(namespace: &str, name: &str, version: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            version: version.to_string(),
            name: name.to_string(),
            parent: None,
            doc: String::new(),
            attributes: Vec::new(),
        }
    }

    /// Inherit from the type called `parent`.
    pub fn extends(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    /// Set the documentation string.
    pub fn doc(mut self, doc: &str) -> Self {
        self.doc = doc.to_string();
        self
    }

    /// Declare an attribute.
    pub fn attribute(mut self, spec: AttributeSpec) -> Self {
        self.attributes.push(spec);
        self
    }

    /// Registry key of this definition.
    pub fn key(&self) -> TypeKey {
        TypeKey::new(&self.namespace, &self.name, &self.version)
    }

    /// Own (not inherited) attribute by name.
    pub fn own_attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_ordering() {
        assert_eq!(compare_versions("0.10.0", "0.9.1"), Ordering::Greater);
        assert_eq!(compare_versions("1.0", "1.0.0"), Ordering::Less);
        assert_eq!(compare_versions("2.8.0", "2.8.0"), Ordering::Equal);
    }

    #[test]
    fn test_key_order_agrees_with_eq() {
        let one = TypeKey::new("ns", "A", "1");
        let padded = TypeKey::new("ns", "A", "01");
        assert_ne!(one, padded);
        assert_ne!(one.cmp(&padded), Ordering::Equal);
        assert!(TypeKey::new("ns", "A", "0.9") < TypeKey::new("ns", "A", "0.10"));
    }

    #[test]
    fn test_key_display() {
        let key = TypeKey::new("ndx-fscv", "FSCVResponseSeries", "0.1.0");
        assert_eq!(key.to_string(), "ndx-fscv:FSCVResponseSeries@0.1.0");
        assert!(key.same_lineage(&TypeKey::new("ndx-fscv", "FSCVResponseSeries", "0.2.0")));
    }

    #[test]
    fn test_attribute_builders() {
        let spec = AttributeSpec::array("data", Dtype::Float64).dims(&["num_timepoints", "num_electrodes"]);
        assert_eq!(spec.rank, Some(2));
        assert!(spec.required);

        let link = AttributeSpec::reference("excitation_series", "FSCVExcitationSeries");
        assert!(link.is_reference());
        assert!(!link.region);
        assert_eq!(link.dtype, None);

        let rows = AttributeSpec::region_reference("electrodes", "DynamicTable");
        assert!(rows.is_reference() && rows.region);
        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json["region"], true);
        assert!(serde_json::to_value(&link).unwrap().get("region").is_none());

        let opt = AttributeSpec::scalar("conversion", Dtype::Float32).optional().with_default(1.0);
        assert!(!opt.required);
        assert_eq!(opt.default, Some(AttrValue::Float(1.0)));
    }

    #[test]
    fn test_definition_json_omits_namespace() {
        let def = TypeDefinition::new("ndx-fscv", "X", "0.1.0")
            .extends("TimeSeries")
            .attribute(AttributeSpec::scalar("sweep_rate", Dtype::Float64));
        let json = serde_json::to_value(&def).unwrap();
        assert!(json.get("namespace").is_none());
        assert_eq!(json["parent"], "TimeSeries");
        assert_eq!(json["attributes"][0]["dtype"], "float64");
    }
}
