//! Namespace documents.
//!
//! A namespace bundles the type definitions published together under one name
//! and version, along with authorship metadata and the namespaces it builds on.
//! Documents are JSON:
//!
//! ```json
//! {
//!   "name": "ndx-fscv",
//!   "version": "0.1.0",
//!   "includes": ["core"],
//!   "types": [{ "name": "FSCVExcitationSeries", "parent": "TimeSeries", "attributes": [] }]
//! }
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{SchemaRegistry, TypeDefinition, TypeKey};
use crate::util::{Result, SchemaError};

/// A versioned namespace and its type definitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamespaceSpec {
    /// Namespace name, e.g. `"ndx-fscv"`.
    pub name: String,
    /// Version shared by every type of the namespace.
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    /// Contact addresses, one per author.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<String>,
    /// Namespaces whose types may be used as parents.
    #[serde(default)]
    pub includes: Vec<String>,
    /// Type definitions, in any order.
    #[serde(default)]
    pub types: Vec<TypeDefinition>,
}

impl NamespaceSpec {
    /// Empty namespace.
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            doc: String::new(),
            authors: Vec::new(),
            contacts: Vec::new(),
            includes: Vec::new(),
            types: Vec::new(),
        }
    }

    /// Allow parents from `namespace`.
    pub fn include(mut self, namespace: &str) -> Self {
        self.includes.push(namespace.to_string());
        self
    }

    /// Add a definition, stamping it with this namespace and version.
    pub fn with_type(mut self, mut definition: TypeDefinition) -> Self {
        definition.namespace = self.name.clone();
        definition.version = self.version.clone();
        self.types.push(definition);
        self
    }

    /// Definitions with namespace and version filled in.
    pub fn definitions(&self) -> Vec<TypeDefinition> {
        self.types
            .iter()
            .cloned()
            .map(|mut d| {
                d.namespace = self.name.clone();
                d.version = self.version.clone();
                d
            })
            .collect()
    }

    /// Parse a namespace document.
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: Self = serde_json::from_str(json)?;
        if spec.name.trim().is_empty() {
            return Err(SchemaError::Malformed("namespace name is empty".into()).into());
        }
        if spec.version.trim().is_empty() {
            return Err(SchemaError::Malformed(format!("namespace {} has no version", spec.name)).into());
        }
        if let Some(def) = spec.types.iter().find(|d| d.name.trim().is_empty()) {
            return Err(SchemaError::Malformed(format!(
                "namespace {} has a type without a name (parent {:?})",
                spec.name, def.parent
            ))
            .into());
        }
        Ok(spec)
    }

    /// Pretty-printed namespace document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parse a namespace document and register its types.
pub fn load_namespace(registry: &mut SchemaRegistry, json: &str) -> Result<Vec<TypeKey>> {
    let spec = NamespaceSpec::from_json(json)?;
    let keys = registry.register_namespace(&spec)?;
    info!(namespace = %spec.name, version = %spec.version, types = keys.len(), "loaded namespace");
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{Dtype, Error};

    const DOC: &str = r#"{
        "name": "lab-ext",
        "version": "1.2.0",
        "includes": ["core"],
        "types": [
            {
                "name": "TaggedSeries",
                "parent": "TimeSeries",
                "attributes": [
                    { "name": "tag", "kind": "scalar", "dtype": "text" },
                    { "name": "gain", "kind": "scalar", "dtype": "float64", "required": false, "default": { "float": 1.0 } }
                ]
            },
            {
                "name": "FancyTaggedSeries",
                "parent": "TaggedSeries"
            }
        ]
    }"#;

    #[test]
    fn test_load_with_core_parent() {
        let mut registry = SchemaRegistry::with_builtin().unwrap();
        let keys = load_namespace(&mut registry, DOC).unwrap();
        assert_eq!(keys.len(), 2);

        let fancy = TypeKey::new("lab-ext", "FancyTaggedSeries", "1.2.0");
        assert!(registry.is_a_named(&fancy, "TimeSeries"));
        let gain = registry.attribute(&fancy, "gain").unwrap();
        assert!(!gain.required);
        assert_eq!(gain.dtype, Some(Dtype::Float64));
    }

    #[test]
    fn test_missing_include_fails() {
        let mut registry = SchemaRegistry::new();
        let err = load_namespace(&mut registry, DOC).unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaError::UnknownParent { .. })));
    }

    #[test]
    fn test_malformed_documents() {
        let mut registry = SchemaRegistry::new();
        assert!(matches!(
            load_namespace(&mut registry, "{ not json").unwrap_err(),
            Error::Json(_)
        ));
        assert!(matches!(
            load_namespace(&mut registry, r#"{"name": "", "version": "1"}"#).unwrap_err(),
            Error::Schema(SchemaError::Malformed(_))
        ));
    }

    #[test]
    fn test_json_roundtrip_keeps_definitions() {
        let spec = crate::schema::fscv_namespace();
        let back = NamespaceSpec::from_json(&spec.to_json().unwrap()).unwrap();
        assert_eq!(back.definitions(), spec.definitions());
        assert_eq!(back.authors, spec.authors);
    }
}
