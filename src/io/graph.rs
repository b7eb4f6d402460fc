//! In-memory recording: the root container of series and the electrode table.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::ObjectPath;
use crate::refs::{
    ElectrodeRegion, ElectrodeTable, ElectrodeTableRows, LiveTarget, ObjectId, ReferenceResolver, ResolverMode,
    StoredRef,
};
use crate::schema::{SchemaRegistry, TypeKey, CORE_NAMESPACE, CORE_VERSION, DYNAMIC_TABLE};
use crate::series::SeriesInstance;
use crate::util::{Error, ReferenceError, Result, ValidationError};

/// Group of acquired (recorded) series.
pub const ACQUISITION: &str = "/acquisition";
/// Group of stimulus series.
pub const STIMULUS: &str = "/stimulus";
/// Location of the electrode table.
pub const ELECTRODES_PATH: &str = "/general/extracellular_ephys/electrodes";

/// An object held by the graph.
#[derive(Clone, Debug)]
pub enum GraphObject {
    Series(SeriesInstance),
    Electrodes(ElectrodeTableRows),
}

/// A recording session: series grouped under `/acquisition` and `/stimulus`,
/// the electrode table, and the resolver that maps their identities to paths.
#[derive(Clone, Debug)]
pub struct RecordingGraph {
    identifier: String,
    session_description: String,
    resolver: ReferenceResolver,
    objects: BTreeMap<ObjectId, GraphObject>,
}

impl RecordingGraph {
    /// Empty graph with a strict resolver.
    pub fn new(identifier: &str, session_description: &str) -> Self {
        Self::with_mode(identifier, session_description, ResolverMode::Strict)
    }

    /// Empty graph whose resolver uses `mode`.
    pub fn with_mode(identifier: &str, session_description: &str, mode: ResolverMode) -> Self {
        Self {
            identifier: identifier.to_string(),
            session_description: session_description.to_string(),
            resolver: ReferenceResolver::new(mode),
            objects: BTreeMap::new(),
        }
    }

    /// Identifier of the recording session.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn session_description(&self) -> &str {
        &self.session_description
    }

    /// Resolution scope of every object in the graph.
    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }

    /// Store the electrode table. A graph holds at most one.
    pub fn set_electrodes(&mut self, table: ElectrodeTableRows) -> Result<ObjectId> {
        let path = ObjectPath::parse(ELECTRODES_PATH)?;
        let key = TypeKey::new(CORE_NAMESPACE, DYNAMIC_TABLE, CORE_VERSION);
        let id = self.insert(path, key, GraphObject::Electrodes(table))?;
        Ok(id)
    }

    /// The electrode table and its identity.
    pub fn electrodes(&self) -> Option<(ObjectId, &ElectrodeTableRows)> {
        self.objects.iter().find_map(|(id, obj)| match obj {
            GraphObject::Electrodes(table) => Some((*id, table)),
            GraphObject::Series(_) => None,
        })
    }

    /// Select rows of the electrode table.
    pub fn create_electrode_region(&self, rows: &[usize], description: &str) -> Result<ElectrodeRegion> {
        let (id, table) = self
            .electrodes()
            .ok_or_else(|| Error::ObjectNotFound(ELECTRODES_PATH.to_string()))?;
        Ok(ElectrodeRegion::select(id, table, rows, description)?)
    }

    /// Add a recorded series under `/acquisition`.
    pub fn add_acquisition(&mut self, series: SeriesInstance) -> Result<ObjectId> {
        self.add_series(ACQUISITION, series)
    }

    /// Add a stimulus series under `/stimulus`.
    pub fn add_stimulus(&mut self, series: SeriesInstance) -> Result<ObjectId> {
        self.add_series(STIMULUS, series)
    }

    fn add_series(&mut self, group: &str, series: SeriesInstance) -> Result<ObjectId> {
        let path = ObjectPath::parse(group)?.join(series.name());
        let key = series.type_key().clone();
        self.insert(path, key, GraphObject::Series(series))
    }

    /// Place an object at `path` and make it referenceable.
    pub(crate) fn insert(&mut self, path: ObjectPath, type_key: TypeKey, object: GraphObject) -> Result<ObjectId> {
        let id = self.resolver.next_id();
        self.resolver.register_object(id, path.clone(), type_key)?;
        debug!(%id, %path, "object added");
        self.objects.insert(id, object);
        Ok(id)
    }

    /// Bind reference `field` of series `id` to `target`.
    pub fn bind(&mut self, id: ObjectId, field: &str, target: LiveTarget) -> Result<()> {
        let Self { resolver, objects, .. } = self;
        match objects.get_mut(&id) {
            Some(GraphObject::Series(series)) => resolver.bind(series, field, target),
            _ => Err(Error::ObjectNotFound(id.to_string())),
        }
    }

    /// Re-link stored references of series `id` against this graph's paths.
    pub(crate) fn relink(&mut self, id: ObjectId, stored: &BTreeMap<String, StoredRef>) -> Result<()> {
        let Self { resolver, objects, .. } = self;
        match objects.get_mut(&id) {
            Some(GraphObject::Series(series)) => {
                resolver.deserialize_refs(series, stored, |path| resolver.lookup(path))
            }
            _ => Err(Error::ObjectNotFound(id.to_string())),
        }
    }

    /// Series with identity `id`.
    pub fn series(&self, id: ObjectId) -> Option<&SeriesInstance> {
        match self.objects.get(&id)? {
            GraphObject::Series(series) => Some(series),
            GraphObject::Electrodes(_) => None,
        }
    }

    /// Mutable series with identity `id`. Changes are checked by [`validate`](Self::validate).
    pub fn series_mut(&mut self, id: ObjectId) -> Option<&mut SeriesInstance> {
        match self.objects.get_mut(&id)? {
            GraphObject::Series(series) => Some(series),
            GraphObject::Electrodes(_) => None,
        }
    }

    /// Storage path of object `id`.
    pub fn path(&self, id: ObjectId) -> Option<&ObjectPath> {
        self.resolver.entry(id).map(|e| &e.path)
    }

    /// Identity of the object stored at `path`.
    pub fn find(&self, path: &ObjectPath) -> Option<ObjectId> {
        self.resolver.lookup(path)
    }

    /// Series called `name` in the acquisition group.
    pub fn acquisition(&self, name: &str) -> Option<&SeriesInstance> {
        self.in_group(ACQUISITION, name)
    }

    /// Series called `name` in the stimulus group.
    pub fn stimulus(&self, name: &str) -> Option<&SeriesInstance> {
        self.in_group(STIMULUS, name)
    }

    fn in_group(&self, group: &str, name: &str) -> Option<&SeriesInstance> {
        let path = ObjectPath::parse(group).ok()?.join(name);
        self.series(self.find(&path)?)
    }

    /// Series a reference of series `id` points at.
    pub fn target_series(&self, id: ObjectId, field: &str) -> Option<&SeriesInstance> {
        match self.series(id)?.reference(field)?.target()? {
            LiveTarget::Series(target) => self.series(*target),
            LiveTarget::Region(_) => None,
        }
    }

    /// All series with their identities and paths, in insertion order.
    pub fn iter_series(&self) -> impl Iterator<Item = (ObjectId, &ObjectPath, &SeriesInstance)> {
        self.objects.iter().filter_map(|(id, obj)| match obj {
            GraphObject::Series(series) => Some((*id, &self.resolver.entry(*id)?.path, series)),
            GraphObject::Electrodes(_) => None,
        })
    }

    /// Number of series in all groups.
    pub fn num_series(&self) -> usize {
        self.iter_series().count()
    }

    /// Check every series and every reference.
    ///
    /// Series must validate against their type, references must be bound to
    /// in-scope objects of the declared target type, and electrode regions must
    /// select one row per data column.
    pub fn validate(&self, registry: &SchemaRegistry) -> Result<()> {
        for (_, _, series) in self.iter_series() {
            registry.validate(series, series.type_key())?;
            self.check_references(registry, series)?;
            self.resolver.serialize_refs(series)?;
        }
        Ok(())
    }

    fn check_references(&self, registry: &SchemaRegistry, series: &SeriesInstance) -> Result<()> {
        for slot in series.references() {
            let Some(target) = slot.target() else {
                continue;
            };
            let field = slot.field();
            let entry = self
                .resolver
                .entry(target.object_id())
                .ok_or_else(|| ReferenceError::DanglingReference {
                    field: field.to_string(),
                    target: target.object_id().to_string(),
                })?;
            let expected = registry
                .attribute(series.type_key(), field)
                .and_then(|spec| spec.target_type.as_deref());
            if let Some(expected) = expected {
                if !registry.is_a_named(&entry.type_key, expected) {
                    return Err(ReferenceError::TargetTypeMismatch {
                        field: field.to_string(),
                        expected: expected.to_string(),
                        actual: entry.type_key.to_string(),
                    }
                    .into());
                }
            }

            if let LiveTarget::Region(region) = target {
                let Some(GraphObject::Electrodes(table)) = self.objects.get(&region.table) else {
                    return Err(ReferenceError::TargetTypeMismatch {
                        field: field.to_string(),
                        expected: "electrode table".into(),
                        actual: entry.type_key.to_string(),
                    }
                    .into());
                };
                if region.is_empty() {
                    return Err(ReferenceError::EmptyRegion.into());
                }
                if let Some(&row) = region.rows.iter().find(|&&r| r >= table.num_rows()) {
                    return Err(ReferenceError::RowOutOfRange {
                        row,
                        num_rows: table.num_rows(),
                    }
                    .into());
                }
                let columns = series.data().dims().size(1);
                if columns.is_some_and(|c| c != region.len()) {
                    return Err(ValidationError::ShapeMismatch {
                        attribute: field.to_string(),
                        expected: format!("{} electrodes", columns.unwrap_or(0)),
                        actual: format!("{} rows selected", region.len()),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}
