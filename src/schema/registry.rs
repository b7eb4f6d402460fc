//! Append-only registry of versioned type definitions.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use super::types::{AttributeKind, AttributeSpec, TypeDefinition, TypeKey};
use crate::core::AttrValue;
use crate::series::SeriesInstance;
use crate::util::{Dtype, Error, Result, SchemaError, ValidationError};

/// Names that map onto the built-in fields of a series rather than its
/// attribute map.
const TIMING_FIELDS: [&str; 3] = ["rate", "starting_time", "timestamps"];

/// A registered definition with its resolved parent and merged attributes.
#[derive(Clone, Debug)]
struct Registered {
    definition: TypeDefinition,
    parent: Option<TypeKey>,
    resolved: Vec<AttributeSpec>,
}

/// Registry of type definitions.
///
/// Registration is single-writer. After [`freeze`](Self::freeze) the registry
/// refuses further definitions and can be shared for read-only validation.
#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    types: BTreeMap<TypeKey, Registered>,
    includes: HashMap<String, Vec<String>>,
    frozen: bool,
}

impl SchemaRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the `core` and `ndx-fscv` namespaces.
    pub fn with_builtin() -> Result<Self> {
        let mut registry = Self::new();
        registry.register_namespace(&super::core_namespace())?;
        registry.register_namespace(&super::fscv_namespace())?;
        Ok(registry)
    }

    /// Stop accepting definitions.
    pub fn freeze(&mut self) {
        debug!(types = self.types.len(), "schema registry frozen");
        self.frozen = true;
    }

    /// Check if the registry refuses definitions.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Declare that names in `namespace` may also resolve against `included`.
    pub fn include_namespace(&mut self, namespace: &str, included: &str) -> Result<()> {
        if self.frozen {
            return Err(SchemaError::Frozen.into());
        }
        let list = self.includes.entry(namespace.to_string()).or_default();
        if !list.iter().any(|n| n == included) {
            list.push(included.to_string());
        }
        Ok(())
    }

    /// Register one definition.
    ///
    /// Re-registering identical content under the same key is a no-op.
    pub fn register(&mut self, definition: TypeDefinition) -> Result<()> {
        if self.frozen {
            return Err(SchemaError::Frozen.into());
        }
        let key = definition.key();

        if let Some(existing) = self.types.get(&key) {
            if existing.definition == definition {
                debug!(%key, "identical type already registered");
                return Ok(());
            }
            return Err(SchemaError::DuplicateType { key: key.to_string() }.into());
        }

        check_attributes(&definition)?;

        let parent = match &definition.parent {
            Some(parent_name) => Some(self.resolve_parent(&definition, parent_name)?),
            None => None,
        };

        let resolved = match &parent {
            Some(parent_key) => {
                let inherited = &self.types[parent_key].resolved;
                merge_attributes(&definition, inherited)?
            }
            None => definition.attributes.clone(),
        };

        debug!(%key, parent = ?parent.as_ref().map(|p| p.to_string()), attributes = resolved.len(), "registered type");
        self.types.insert(
            key,
            Registered {
                definition,
                parent,
                resolved,
            },
        );
        Ok(())
    }

    /// Register a batch of definitions whose parents may refer to each other
    /// in any order. Parents are registered before children; a parent loop
    /// inside the batch is a [`SchemaError::CyclicInheritance`].
    ///
    /// Either every definition is registered or none is.
    pub fn register_all(&mut self, definitions: Vec<TypeDefinition>) -> Result<()> {
        let mut staged = self.clone();
        staged.register_batch(definitions)?;
        *self = staged;
        Ok(())
    }

    fn register_batch(&mut self, definitions: Vec<TypeDefinition>) -> Result<()> {
        let by_name: HashMap<(String, String), usize> = definitions
            .iter()
            .enumerate()
            .map(|(i, d)| ((d.namespace.clone(), d.name.clone()), i))
            .collect();

        let mut order = Vec::with_capacity(definitions.len());
        let mut done = HashSet::new();
        for start in 0..definitions.len() {
            let mut chain: Vec<usize> = Vec::new();
            let mut current = Some(start);
            while let Some(i) = current {
                if done.contains(&i) {
                    break;
                }
                if let Some(pos) = chain.iter().position(|&c| c == i) {
                    let mut names: Vec<String> =
                        chain[pos..].iter().map(|&c| definitions[c].name.clone()).collect();
                    names.push(definitions[i].name.clone());
                    return Err(SchemaError::CyclicInheritance { chain: names }.into());
                }
                chain.push(i);
                let def = &definitions[i];
                current = def
                    .parent
                    .as_ref()
                    .and_then(|p| by_name.get(&(def.namespace.clone(), p.clone())).copied());
            }
            for &i in chain.iter().rev() {
                if done.insert(i) {
                    order.push(i);
                }
            }
        }

        let mut slots: Vec<Option<TypeDefinition>> = definitions.into_iter().map(Some).collect();
        for i in order {
            if let Some(def) = slots[i].take() {
                self.register(def)?;
            }
        }
        Ok(())
    }

    /// Register every type of a namespace document, recording its includes.
    ///
    /// A document that fails leaves the registry untouched.
    pub fn register_namespace(&mut self, namespace: &super::NamespaceSpec) -> Result<Vec<TypeKey>> {
        let mut staged = self.clone();
        for included in &namespace.includes {
            staged.include_namespace(&namespace.name, included)?;
        }
        let definitions = namespace.definitions();
        let keys = definitions.iter().map(TypeDefinition::key).collect();
        staged.register_batch(definitions)?;
        *self = staged;
        debug!(namespace = %namespace.name, version = %namespace.version, "registered namespace");
        Ok(keys)
    }

    /// Definition registered under `key`.
    pub fn get(&self, key: &TypeKey) -> Option<&TypeDefinition> {
        self.types.get(key).map(|r| &r.definition)
    }

    /// Check if `key` is registered.
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.types.contains_key(key)
    }

    /// All registered keys in order.
    pub fn type_keys(&self) -> impl Iterator<Item = &TypeKey> {
        self.types.keys()
    }

    /// Highest registered version of `name` in `namespace`.
    pub fn latest(&self, namespace: &str, name: &str) -> Option<&TypeKey> {
        self.types
            .keys()
            .filter(|k| k.namespace == namespace && k.name == name)
            .max()
    }

    /// Parent key of a registered type.
    pub fn parent_of(&self, key: &TypeKey) -> Option<&TypeKey> {
        self.types.get(key).and_then(|r| r.parent.as_ref())
    }

    /// Merged attribute set of a type: ancestors first, overrides in place.
    pub fn resolve_attributes(&self, key: &TypeKey) -> Result<&[AttributeSpec]> {
        self.types
            .get(key)
            .map(|r| r.resolved.as_slice())
            .ok_or_else(|| SchemaError::UnknownType(key.to_string()).into())
    }

    /// Single resolved attribute.
    pub fn attribute(&self, key: &TypeKey, name: &str) -> Option<&AttributeSpec> {
        self.types.get(key)?.resolved.iter().find(|a| a.name == name)
    }

    /// Whether `key` is `ancestor` or derives from it.
    pub fn is_a(&self, key: &TypeKey, ancestor: &TypeKey) -> bool {
        self.lineage(key).any(|k| k == ancestor)
    }

    /// Whether `key` is, or derives from, a type called `name` (any version).
    pub fn is_a_named(&self, key: &TypeKey, name: &str) -> bool {
        self.lineage(key).any(|k| k.name == name)
    }

    /// `key` followed by its ancestors.
    pub fn lineage<'a>(&'a self, key: &'a TypeKey) -> impl Iterator<Item = &'a TypeKey> + 'a {
        let start = self.types.get_key_value(key).map(|(k, _)| k);
        std::iter::successors(start, move |k| self.parent_of(k))
    }

    /// Attribute value of an instance, falling back to the schema default.
    pub fn attribute_value<'a>(&'a self, instance: &'a SeriesInstance, name: &str) -> Option<&'a AttrValue> {
        instance
            .attributes()
            .get(name)
            .or_else(|| self.attribute(instance.type_key(), name)?.default.as_ref())
    }

    /// Check an instance against `key`, including its reference slots.
    ///
    /// Stops at the first violation.
    pub fn validate(&self, instance: &SeriesInstance, key: &TypeKey) -> Result<()> {
        self.check_instance(instance, key, true)
    }

    /// Check everything except whether references are bound yet.
    pub(crate) fn validate_unlinked(&self, instance: &SeriesInstance, key: &TypeKey) -> Result<()> {
        self.check_instance(instance, key, false)
    }

    fn check_instance(&self, instance: &SeriesInstance, key: &TypeKey, check_refs: bool) -> Result<()> {
        let resolved = self.resolve_attributes(key)?;
        let own_type = instance.type_key();
        if own_type != key && !self.is_a(own_type, key) {
            return Err(ValidationError::TypeMismatch {
                expected: key.to_string(),
                actual: own_type.to_string(),
            }
            .into());
        }

        for spec in resolved {
            if TIMING_FIELDS.contains(&spec.name.as_str()) {
                continue;
            }
            match spec.name.as_str() {
                "data" => check_data(instance, spec)?,
                "unit" => check_value(key, spec, Some(&AttrValue::Text(instance.unit().to_string())))?,
                "description" => {
                    check_value(key, spec, Some(&AttrValue::Text(instance.description().to_string())))?
                }
                _ if spec.is_reference() => {
                    if check_refs && spec.required {
                        let bound = instance.reference(&spec.name).map(|r| !r.is_unbound());
                        if bound != Some(true) {
                            return Err(missing(key, &spec.name));
                        }
                    }
                }
                _ => check_value(key, spec, instance.attributes().get(&spec.name))?,
            }
        }

        if own_type == key {
            if let Some((name, _)) = instance
                .attributes()
                .iter()
                .find(|(name, _)| !resolved.iter().any(|s| s.name == *name && !s.is_reference()))
            {
                return Err(ValidationError::UndeclaredAttribute {
                    type_name: key.name.clone(),
                    attribute: name.to_string(),
                }
                .into());
            }
        }

        check_finite(instance)?;
        instance.timing().check(instance.num_samples())?;
        Ok(())
    }

    fn resolve_parent(&self, definition: &TypeDefinition, parent_name: &str) -> Result<TypeKey> {
        if definition.parent.as_deref() == Some(definition.name.as_str())
            && self.latest(&definition.namespace, parent_name).is_none()
        {
            return Err(SchemaError::CyclicInheritance {
                chain: vec![definition.name.clone(), definition.name.clone()],
            }
            .into());
        }

        let mut candidates = vec![definition.namespace.as_str()];
        if let Some(included) = self.includes.get(&definition.namespace) {
            candidates.extend(included.iter().map(String::as_str));
        }
        let parent = candidates
            .into_iter()
            .find_map(|ns| self.latest(ns, parent_name))
            .cloned()
            .ok_or_else(|| SchemaError::UnknownParent {
                type_name: definition.name.clone(),
                parent: parent_name.to_string(),
            })?;

        // A new version may not reach its own lineage through its parent chain.
        let own = definition.key();
        if self.lineage(&parent).any(|k| k.same_lineage(&own)) {
            let mut chain = vec![definition.name.clone()];
            for k in self.lineage(&parent) {
                chain.push(k.name.clone());
                if k.same_lineage(&own) {
                    break;
                }
            }
            return Err(SchemaError::CyclicInheritance { chain }.into());
        }
        Ok(parent)
    }
}

fn missing(key: &TypeKey, attribute: &str) -> Error {
    ValidationError::MissingRequiredAttribute {
        type_name: key.name.clone(),
        attribute: attribute.to_string(),
    }
    .into()
}

fn check_attributes(definition: &TypeDefinition) -> Result<()> {
    let mut seen = HashSet::new();
    for spec in &definition.attributes {
        if spec.region && !spec.is_reference() {
            return Err(SchemaError::Malformed(format!(
                "{}.{} is marked as a region but is not a reference",
                definition.name, spec.name
            ))
            .into());
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(SchemaError::DuplicateAttribute {
                type_name: definition.name.clone(),
                attribute: spec.name.clone(),
            }
            .into());
        }
    }
    Ok(())
}

/// Merge own attributes over the inherited set, narrowing only.
fn merge_attributes(definition: &TypeDefinition, inherited: &[AttributeSpec]) -> Result<Vec<AttributeSpec>> {
    let mut merged = inherited.to_vec();
    for spec in &definition.attributes {
        match merged.iter_mut().find(|a| a.name == spec.name) {
            Some(slot) => {
                check_override(&definition.name, slot, spec)?;
                *slot = spec.clone();
            }
            None => merged.push(spec.clone()),
        }
    }
    Ok(merged)
}

fn check_override(type_name: &str, parent: &AttributeSpec, child: &AttributeSpec) -> Result<()> {
    let illegal = |reason: String| -> Error {
        SchemaError::IllegalOverride {
            type_name: type_name.to_string(),
            attribute: child.name.clone(),
            reason,
        }
        .into()
    };

    if parent.kind != child.kind {
        return Err(illegal(format!("kind changes from {:?} to {:?}", parent.kind, child.kind)));
    }
    if let (Some(p), Some(c)) = (parent.dtype, child.dtype) {
        if !p.admits_override(c) {
            return Err(SchemaError::WideningOverride {
                type_name: type_name.to_string(),
                attribute: child.name.clone(),
                parent: p,
                child: c,
            }
            .into());
        }
    }
    if parent.required && !child.required {
        return Err(illegal("a required attribute cannot become optional".into()));
    }
    if let Some(fixed) = &parent.value {
        if child.value.as_ref() != Some(fixed) {
            return Err(illegal(format!("fixed value '{}' cannot change", fixed)));
        }
    }
    if let (Some(p), Some(c)) = (parent.rank, child.rank) {
        if p != c {
            return Err(illegal(format!("rank changes from {} to {}", p, c)));
        }
    }
    if parent.region != child.region {
        return Err(illegal("a reference cannot switch between object and region targets".into()));
    }
    if let (Some(p), None) = (&parent.target_type, &child.target_type) {
        return Err(illegal(format!("target type {} dropped", p)));
    }
    Ok(())
}

fn check_data(instance: &SeriesInstance, spec: &AttributeSpec) -> Result<()> {
    if let Some(dtype) = spec.dtype {
        if !dtype.is_float() {
            return Err(ValidationError::DatatypeMismatch {
                attribute: "data".into(),
                expected: dtype.to_string(),
                actual: Dtype::Float64.to_string(),
            }
            .into());
        }
    }
    let dims = instance.data().dims();
    if let Some(rank) = spec.rank {
        if dims.rank() != rank {
            let expected = if spec.dims.is_empty() {
                format!("rank {}", rank)
            } else {
                format!("({})", spec.dims.join(", "))
            };
            return Err(ValidationError::ShapeMismatch {
                attribute: "data".into(),
                expected,
                actual: dims.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

/// Stored documents cannot represent NaN or infinities.
fn check_finite(instance: &SeriesInstance) -> Result<()> {
    if let Some(index) = instance.data().as_slice().iter().position(|v| !v.is_finite()) {
        return Err(ValidationError::NonFiniteValue {
            attribute: "data".into(),
            index,
        }
        .into());
    }
    for (name, value) in instance.attributes().iter() {
        if let Some(index) = value.non_finite_index() {
            return Err(ValidationError::NonFiniteValue {
                attribute: name.to_string(),
                index,
            }
            .into());
        }
    }
    Ok(())
}

fn check_value(key: &TypeKey, spec: &AttributeSpec, value: Option<&AttrValue>) -> Result<()> {
    let Some(value) = value else {
        if spec.required && spec.default.is_none() {
            return Err(missing(key, &spec.name));
        }
        return Ok(());
    };

    if let Some(dtype) = spec.dtype {
        if !value.matches_dtype(dtype) {
            return Err(ValidationError::DatatypeMismatch {
                attribute: spec.name.clone(),
                expected: dtype.to_string(),
                actual: value.kind_name().to_string(),
            }
            .into());
        }
    }

    match spec.kind {
        AttributeKind::Scalar if value.is_array() => {
            return Err(ValidationError::ShapeMismatch {
                attribute: spec.name.clone(),
                expected: "scalar".into(),
                actual: format!("array of {}", value.len()),
            }
            .into());
        }
        AttributeKind::Array if !value.is_array() => {
            return Err(ValidationError::ShapeMismatch {
                attribute: spec.name.clone(),
                expected: "array".into(),
                actual: "scalar".into(),
            }
            .into());
        }
        AttributeKind::Array if spec.rank.is_some_and(|r| r != 1) => {
            return Err(ValidationError::ShapeMismatch {
                attribute: spec.name.clone(),
                expected: format!("rank {}", spec.rank.unwrap_or(1)),
                actual: "rank 1".into(),
            }
            .into());
        }
        _ => {}
    }

    if let Some(fixed) = &spec.value {
        if fixed != value {
            return Err(ValidationError::FixedValueMismatch {
                attribute: spec.name.clone(),
                expected: fixed.to_string(),
                actual: value.to_string(),
            }
            .into());
        }
    }
    Ok(())
}
