//! Binding, serializing and re-linking references within a resolution scope.

use std::collections::{BTreeMap, HashMap};

use tracing::{trace, warn};

use super::{ElectrodeRegion, LiveTarget, ObjectId, StoredRef};
use crate::core::ObjectPath;
use crate::schema::TypeKey;
use crate::series::SeriesInstance;
use crate::util::{Error, ReferenceError, Result};

/// How [`ReferenceResolver::bind`] treats targets outside the scope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResolverMode {
    /// Reject with [`ReferenceError::DanglingReference`].
    #[default]
    Strict,
    /// Record the reference and log a warning. It still fails at serialization.
    Lenient,
}

/// An object that references may point at.
#[derive(Clone, Debug, PartialEq)]
pub struct ScopeEntry {
    /// Storage path of the object.
    pub path: ObjectPath,
    /// Type of the object.
    pub type_key: TypeKey,
}

/// Resolution scope: maps in-session identities to storage paths and types.
#[derive(Clone, Debug, Default)]
pub struct ReferenceResolver {
    mode: ResolverMode,
    scope: BTreeMap<ObjectId, ScopeEntry>,
    by_path: HashMap<ObjectPath, ObjectId>,
}

impl ReferenceResolver {
    /// Empty scope.
    pub fn new(mode: ResolverMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// How dangling binds are treated.
    pub fn mode(&self) -> ResolverMode {
        self.mode
    }

    /// First identity not used in this scope.
    pub fn next_id(&self) -> ObjectId {
        self.scope
            .keys()
            .next_back()
            .map(|id| ObjectId(id.0 + 1))
            .unwrap_or(ObjectId(0))
    }

    /// Make an object referenceable.
    pub fn register_object(&mut self, id: ObjectId, path: ObjectPath, type_key: TypeKey) -> Result<()> {
        if self.scope.contains_key(&id) || self.by_path.contains_key(&path) {
            let group = path.parent().unwrap_or_else(ObjectPath::root);
            return Err(Error::DuplicateName {
                group: group.to_string(),
                name: path.name().to_string(),
            });
        }
        trace!(%id, %path, %type_key, "object registered");
        self.by_path.insert(path.clone(), id);
        self.scope.insert(id, ScopeEntry { path, type_key });
        Ok(())
    }

    /// Path and type registered for `id`.
    pub fn entry(&self, id: ObjectId) -> Option<&ScopeEntry> {
        self.scope.get(&id)
    }

    /// Identity registered under `path`.
    pub fn lookup(&self, path: &ObjectPath) -> Option<ObjectId> {
        self.by_path.get(path).copied()
    }

    /// Number of objects in the scope.
    pub fn len(&self) -> usize {
        self.scope.len()
    }

    /// Check if the scope has no objects.
    pub fn is_empty(&self) -> bool {
        self.scope.is_empty()
    }

    /// Bind reference `field` of `instance` to `target`.
    pub fn bind(&self, instance: &mut SeriesInstance, field: &str, target: LiveTarget) -> Result<()> {
        let series = instance.name().to_string();
        let slot = instance
            .reference_mut(field)
            .ok_or_else(|| ReferenceError::UndeclaredReference { field: field.to_string() })?;

        let id = target.object_id();
        if !self.scope.contains_key(&id) {
            match self.mode {
                ResolverMode::Strict => {
                    return Err(ReferenceError::DanglingReference {
                        field: field.to_string(),
                        target: id.to_string(),
                    }
                    .into());
                }
                ResolverMode::Lenient => {
                    warn!(%series, field, target = %id, "binding reference to an object outside the scope");
                }
            }
        }

        slot.bind(target)?;
        trace!(%series, field, target = %id, "reference bound");
        Ok(())
    }

    /// Storage form of every reference of `instance`, keyed by field.
    ///
    /// Optional unbound slots are left out.
    pub fn serialize_refs(&self, instance: &SeriesInstance) -> Result<BTreeMap<String, StoredRef>> {
        let mut out = BTreeMap::new();
        for slot in instance.references() {
            let stored = match (slot.target(), slot.stored()) {
                (Some(target), _) => self.store(slot.field(), target)?,
                (None, Some(stored)) => stored.clone(),
                (None, None) if slot.is_required() => {
                    return Err(ReferenceError::MissingReference {
                        field: slot.field().to_string(),
                    }
                    .into());
                }
                (None, None) => continue,
            };
            out.insert(slot.field().to_string(), stored);
        }
        Ok(out)
    }

    /// Move every bound reference of `instance` to its stored form.
    pub fn persist_refs(&self, instance: &mut SeriesInstance) -> Result<()> {
        let stored = self.serialize_refs(instance)?;
        for (field, value) in stored {
            if let Some(slot) = instance.reference_mut(&field) {
                if slot.target().is_some() {
                    slot.serialize(value)?;
                }
            }
        }
        Ok(())
    }

    /// Re-link stored references of `instance`.
    ///
    /// `lookup` maps a stored path to the identity of the object read back
    /// from that path. Every path is resolved before any slot changes, so
    /// on error the instance keeps its stored references.
    pub fn deserialize_refs<F>(
        &self,
        instance: &mut SeriesInstance,
        stored: &BTreeMap<String, StoredRef>,
        mut lookup: F,
    ) -> Result<()>
    where
        F: FnMut(&ObjectPath) -> Option<ObjectId>,
    {
        let mut resolved = Vec::with_capacity(stored.len());
        for (field, stored_ref) in stored {
            let id = lookup(stored_ref.path()).ok_or_else(|| ReferenceError::UnresolvedReference {
                field: field.clone(),
                path: stored_ref.path().to_string(),
            })?;
            let target = match stored_ref {
                StoredRef::Object { .. } => LiveTarget::Series(id),
                StoredRef::Region { rows, .. } if rows.is_empty() => {
                    return Err(ReferenceError::EmptyRegion.into());
                }
                StoredRef::Region { rows, description, .. } => LiveTarget::Region(ElectrodeRegion {
                    table: id,
                    rows: rows.iter().copied().collect(),
                    description: description.clone(),
                }),
            };
            instance
                .reference(field)
                .ok_or_else(|| ReferenceError::UndeclaredReference { field: field.clone() })?
                .check_bind(&target)?;
            resolved.push((field, target));
        }

        for (field, target) in resolved {
            if let Some(slot) = instance.reference_mut(field) {
                trace!(field = %field, target = %target.object_id(), "reference re-linked");
                slot.bind(target)?;
            }
        }
        Ok(())
    }

    fn store(&self, field: &str, target: &LiveTarget) -> Result<StoredRef> {
        let id = target.object_id();
        let entry = self.scope.get(&id).ok_or_else(|| ReferenceError::DanglingReference {
            field: field.to_string(),
            target: id.to_string(),
        })?;
        Ok(match target {
            LiveTarget::Series(_) => StoredRef::Object {
                path: entry.path.clone(),
            },
            LiveTarget::Region(region) => StoredRef::Region {
                table: entry.path.clone(),
                rows: region.rows.to_vec(),
                description: region.description.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fscv::testing::{MockExcitation, MockResponse};
    use crate::schema::SchemaRegistry;

    fn setup() -> (SchemaRegistry, ReferenceResolver, ObjectId) {
        let registry = SchemaRegistry::with_builtin().unwrap();
        let mut resolver = ReferenceResolver::new(ResolverMode::Strict);
        let id = resolver.next_id();
        resolver
            .register_object(
                id,
                ObjectPath::parse("/stimulus/excitation").unwrap(),
                crate::fscv::excitation_key(),
            )
            .unwrap();
        (registry, resolver, id)
    }

    #[test]
    fn test_strict_rejects_dangling() {
        let (registry, resolver, _) = setup();
        let mut response = MockResponse::default().build(&registry).unwrap();
        let err = resolver
            .bind(&mut response, "excitation_series", LiveTarget::Series(ObjectId(99)))
            .unwrap_err();
        assert!(matches!(err, Error::Reference(ReferenceError::DanglingReference { .. })));

        let err = resolver
            .bind(&mut response, "no_such_field", LiveTarget::Series(ObjectId(0)))
            .unwrap_err();
        assert!(matches!(err, Error::Reference(ReferenceError::UndeclaredReference { .. })));
    }

    #[test]
    fn test_lenient_binds_but_cannot_serialize() {
        let (registry, _, _) = setup();
        let resolver = ReferenceResolver::new(ResolverMode::Lenient);
        let excitation = MockExcitation::default().build(&registry).unwrap();
        assert_eq!(excitation.references().count(), 0);
        let mut response = MockResponse::default().build(&registry).unwrap();
        resolver
            .bind(&mut response, "excitation_series", LiveTarget::Series(ObjectId(42)))
            .unwrap();
        assert!(resolver.serialize_refs(&response).is_err());
    }

    #[test]
    fn test_missing_required_reference() {
        let (registry, resolver, id) = setup();
        let mut response = MockResponse::default().build(&registry).unwrap();
        resolver
            .bind(&mut response, "excitation_series", LiveTarget::Series(id))
            .unwrap();
        // `electrodes` is still unbound.
        let err = resolver.serialize_refs(&response).unwrap_err();
        assert!(matches!(
            err,
            Error::Reference(ReferenceError::MissingReference { ref field }) if field == "electrodes"
        ));
    }

    #[test]
    fn test_serialize_and_relink() {
        let (registry, mut resolver, exc_id) = setup();
        let table_id = resolver.next_id();
        resolver
            .register_object(
                table_id,
                ObjectPath::parse("/general/extracellular_ephys/electrodes").unwrap(),
                TypeKey::new(crate::schema::CORE_NAMESPACE, crate::schema::DYNAMIC_TABLE, crate::schema::CORE_VERSION),
            )
            .unwrap();

        let mut response = MockResponse::default().build(&registry).unwrap();
        resolver
            .bind(&mut response, "excitation_series", LiveTarget::Series(exc_id))
            .unwrap();
        let region = ElectrodeRegion {
            table: table_id,
            rows: [0, 1, 2, 3].into_iter().collect(),
            description: "all".into(),
        };
        resolver
            .bind(&mut response, "electrodes", LiveTarget::Region(region.clone()))
            .unwrap();

        let stored = resolver.serialize_refs(&response).unwrap();
        assert_eq!(
            stored["excitation_series"],
            StoredRef::Object {
                path: ObjectPath::parse("/stimulus/excitation").unwrap()
            }
        );

        resolver.persist_refs(&mut response).unwrap();
        assert!(response.reference("electrodes").unwrap().stored().is_some());

        // Serialized -> Bound through the lookup.
        let relinked_ids = HashMap::from([
            (ObjectPath::parse("/stimulus/excitation").unwrap(), ObjectId(10)),
            (ObjectPath::parse("/general/extracellular_ephys/electrodes").unwrap(), ObjectId(11)),
        ]);
        resolver
            .deserialize_refs(&mut response, &stored, |p| relinked_ids.get(p).copied())
            .unwrap();
        assert_eq!(
            response.reference("excitation_series").unwrap().target(),
            Some(&LiveTarget::Series(ObjectId(10)))
        );
        match response.reference("electrodes").unwrap().target() {
            Some(LiveTarget::Region(r)) => {
                assert_eq!(r.table, ObjectId(11));
                assert_eq!(r.rows.as_slice(), &[0, 1, 2, 3]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unresolved_on_relink() {
        let (registry, resolver, _) = setup();
        let mut response = MockResponse::default().build(&registry).unwrap();
        let stored = BTreeMap::from([(
            "excitation_series".to_string(),
            StoredRef::Object {
                path: ObjectPath::parse("/stimulus/gone").unwrap(),
            },
        )]);
        let err = resolver
            .deserialize_refs(&mut response, &stored, |_| None)
            .unwrap_err();
        assert!(matches!(err, Error::Reference(ReferenceError::UnresolvedReference { .. })));
    }

    #[test]
    fn test_failed_relink_changes_nothing() {
        let (registry, mut resolver, exc_id) = setup();
        let table_id = resolver.next_id();
        let table_path = ObjectPath::parse("/general/extracellular_ephys/electrodes").unwrap();
        resolver
            .register_object(
                table_id,
                table_path.clone(),
                TypeKey::new(crate::schema::CORE_NAMESPACE, crate::schema::DYNAMIC_TABLE, crate::schema::CORE_VERSION),
            )
            .unwrap();
        let mut response = MockResponse::default().build(&registry).unwrap();
        let region = ElectrodeRegion {
            table: table_id,
            rows: [0, 1, 2, 3].into_iter().collect(),
            description: "all".into(),
        };
        resolver
            .bind(&mut response, "electrodes", LiveTarget::Region(region))
            .unwrap();
        resolver
            .bind(&mut response, "excitation_series", LiveTarget::Series(exc_id))
            .unwrap();
        resolver.persist_refs(&mut response).unwrap();
        let before = response.clone();

        // "electrodes" sorts first and resolves; "excitation_series" does not.
        let mut stored = resolver.serialize_refs(&before).unwrap();
        stored.insert(
            "excitation_series".into(),
            StoredRef::Object {
                path: ObjectPath::parse("/stimulus/gone").unwrap(),
            },
        );
        let err = resolver
            .deserialize_refs(&mut response, &stored, |p| resolver.lookup(p))
            .unwrap_err();
        assert!(matches!(err, Error::Reference(ReferenceError::UnresolvedReference { .. })));
        assert!(response.reference("electrodes").unwrap().stored().is_some());
        assert!(response.reference("excitation_series").unwrap().stored().is_some());
    }

    #[test]
    fn test_kind_mismatch_on_bind_and_relink() {
        let (registry, resolver, exc_id) = setup();
        let mut response = MockResponse::default().build(&registry).unwrap();
        let err = resolver
            .bind(&mut response, "electrodes", LiveTarget::Series(exc_id))
            .unwrap_err();
        assert!(matches!(err, Error::Reference(ReferenceError::TargetKindMismatch { .. })));

        let region = ElectrodeRegion {
            table: exc_id,
            rows: [0, 1, 2, 3].into_iter().collect(),
            description: String::new(),
        };
        let err = resolver
            .bind(&mut response, "excitation_series", LiveTarget::Region(region))
            .unwrap_err();
        assert!(matches!(err, Error::Reference(ReferenceError::TargetKindMismatch { .. })));

        let stored = BTreeMap::from([(
            "electrodes".to_string(),
            StoredRef::Object {
                path: ObjectPath::parse("/stimulus/excitation").unwrap(),
            },
        )]);
        let err = resolver
            .deserialize_refs(&mut response, &stored, |p| resolver.lookup(p))
            .unwrap_err();
        assert!(matches!(err, Error::Reference(ReferenceError::TargetKindMismatch { .. })));
        assert!(response.reference("electrodes").unwrap().is_unbound());
    }

    #[test]
    fn test_duplicate_path() {
        let (_, mut resolver, _) = setup();
        let id = resolver.next_id();
        let err = resolver
            .register_object(id, ObjectPath::parse("/stimulus/excitation").unwrap(), crate::fscv::excitation_key())
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName { .. }));
    }
}
