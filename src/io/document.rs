//! Storage form of a [`RecordingGraph`] and its JSON reader/writer.
//!
//! The document lists every series by path with its data stored in a shared
//! block table: identical arrays (same shape, same bytes) are written once and
//! referenced by index. References are stored as paths and re-linked on read.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::graph::{GraphObject, RecordingGraph, ELECTRODES_PATH};
use crate::core::{Attributes, DataArray, DataDigest, ObjectPath, Timing};
use crate::refs::{ElectrodeTableRows, ObjectId, ResolverMode, StoredRef};
use crate::schema::{SchemaRegistry, TypeKey};
use crate::series::SeriesInstance;
use crate::util::{Dimensions, Error, Result, SchemaError};

/// Format tag of graph documents.
pub const FORMAT: &str = "ndx-fscv-graph";
/// Current document layout version.
pub const FORMAT_VERSION: u32 = 1;

/// Options for writing documents.
#[derive(Clone, Copy, Debug)]
pub struct WriteOptions {
    /// Indent the JSON output.
    pub pretty: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Namespace used by at least one stored series.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamespaceRef {
    pub name: String,
    pub version: String,
}

/// A stored array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataBlock {
    /// Extent of each dimension.
    pub shape: Vec<usize>,
    /// Values in row-major order.
    pub values: Vec<f64>,
}

/// A stored series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesDoc {
    /// Position of the series in the graph.
    pub path: ObjectPath,
    /// Type the series was validated against.
    pub type_key: TypeKey,
    pub description: String,
    pub unit: String,
    /// Index into [`GraphDocument::blocks`].
    pub data: usize,
    /// Sampling rate in Hz, for rate timing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    /// Time of the first sample, for rate timing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_time: Option<f64>,
    /// Index into [`GraphDocument::blocks`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<usize>,
    /// Type-specific attributes.
    #[serde(default)]
    pub attributes: Attributes,
    /// Stored references keyed by field.
    #[serde(default)]
    pub references: BTreeMap<String, StoredRef>,
}

/// Storage form of a whole recording.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Always [`FORMAT`].
    pub format: String,
    /// Layout version, see [`FORMAT_VERSION`].
    pub format_version: u32,
    /// Identifier of the recording session.
    pub identifier: String,
    pub session_description: String,
    /// Namespaces the stored types come from.
    pub namespaces: Vec<NamespaceRef>,
    /// Electrode table, if the recording has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electrodes: Option<ElectrodeTableRows>,
    /// Data and timestamp arrays, each stored once.
    pub blocks: Vec<DataBlock>,
    /// Stored series.
    pub objects: Vec<SeriesDoc>,
}

/// Collects data blocks, storing identical arrays once.
#[derive(Default)]
struct BlockTable {
    blocks: Vec<DataBlock>,
    index: HashMap<DataDigest, usize>,
}

impl BlockTable {
    fn add(&mut self, data: &DataArray) -> usize {
        let digest = data.digest();
        if let Some(&idx) = self.index.get(&digest) {
            return idx;
        }
        let idx = self.blocks.len();
        self.blocks.push(DataBlock {
            shape: data.dims().sizes().to_vec(),
            values: data.as_slice().to_vec(),
        });
        self.index.insert(digest, idx);
        idx
    }
}

impl GraphDocument {
    /// Build the storage form of `graph`.
    ///
    /// The whole graph is validated first; nothing is produced for an invalid
    /// graph.
    pub fn from_graph(graph: &RecordingGraph, registry: &SchemaRegistry) -> Result<Self> {
        graph.validate(registry)?;

        let mut blocks = BlockTable::default();
        let mut namespaces = BTreeSet::new();
        let mut objects = Vec::new();

        for (_, path, series) in graph.iter_series() {
            let key = series.type_key();
            namespaces.insert(NamespaceRef {
                name: key.namespace.clone(),
                version: key.version.clone(),
            });
            let timing = series.timing();
            objects.push(SeriesDoc {
                path: path.clone(),
                type_key: key.clone(),
                description: series.description().to_string(),
                unit: series.unit().to_string(),
                data: blocks.add(series.data()),
                rate: timing.sampling_rate(),
                starting_time: timing.starting_time(),
                timestamps: match timing {
                    Timing::Timestamps(times) => Some(blocks.add(times)),
                    Timing::Rate { .. } => None,
                },
                attributes: series.attributes().clone(),
                references: graph.resolver().serialize_refs(series)?,
            });
        }

        debug!(
            objects = objects.len(),
            blocks = blocks.blocks.len(),
            "graph converted to document"
        );
        Ok(Self {
            format: FORMAT.to_string(),
            format_version: FORMAT_VERSION,
            identifier: graph.identifier().to_string(),
            session_description: graph.session_description().to_string(),
            namespaces: namespaces.into_iter().collect(),
            electrodes: graph.electrodes().map(|(_, table)| table.clone()),
            blocks: blocks.blocks,
            objects,
        })
    }

    /// Rebuild the graph and re-link its references.
    pub fn into_graph(self, registry: &SchemaRegistry, mode: ResolverMode) -> Result<RecordingGraph> {
        if self.format != FORMAT {
            return Err(Error::invalid(format!("unexpected format '{}'", self.format)));
        }
        if self.format_version != FORMAT_VERSION {
            return Err(Error::invalid(format!(
                "unsupported format version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }
        for ns in &self.namespaces {
            if !registry.type_keys().any(|k| k.namespace == ns.name && k.version == ns.version) {
                return Err(SchemaError::UnknownType(format!("namespace {}@{}", ns.name, ns.version)).into());
            }
        }

        let mut graph = RecordingGraph::with_mode(&self.identifier, &self.session_description, mode);
        if let Some(table) = self.electrodes {
            graph.set_electrodes(table)?;
        }

        let mut pending: Vec<(ObjectId, BTreeMap<String, StoredRef>)> = Vec::new();
        for doc in self.objects {
            if doc.path.as_str() == ELECTRODES_PATH || doc.path.parent().is_none() {
                return Err(Error::invalid(format!("series stored at reserved path {}", doc.path)));
            }
            let data = block(&self.blocks, doc.data)?;
            let timestamps = doc
                .timestamps
                .map(|idx| block(&self.blocks, idx).map(|b| b.as_slice().to_vec()))
                .transpose()?;
            let timing = Timing::from_parts(doc.rate, doc.starting_time, timestamps)?;

            let mut series = SeriesInstance::builder(doc.type_key.clone(), doc.path.name())
                .description(&doc.description)
                .data(data)
                .unit(&doc.unit)
                .timing(&timing)
                .attributes(doc.attributes)
                .build(registry)?;
            for (field, stored) in &doc.references {
                series.restore_reference(field, stored.clone())?;
            }

            let id = graph.insert(doc.path, doc.type_key, GraphObject::Series(series))?;
            pending.push((id, doc.references));
        }

        for (id, stored) in &pending {
            graph.relink(*id, stored)?;
        }
        graph.validate(registry)?;
        debug!(objects = pending.len(), "document converted to graph");
        Ok(graph)
    }
}

fn block(blocks: &[DataBlock], idx: usize) -> Result<DataArray> {
    let block = blocks
        .get(idx)
        .ok_or_else(|| Error::invalid(format!("data block {} does not exist ({} blocks)", idx, blocks.len())))?;
    Ok(DataArray::new(block.values.clone(), Dimensions::from_slice(&block.shape))?)
}

/// Write `graph` as a JSON document.
pub fn write_json<W: Write>(
    graph: &RecordingGraph,
    registry: &SchemaRegistry,
    writer: W,
    options: WriteOptions,
) -> Result<()> {
    let document = GraphDocument::from_graph(graph, registry)?;
    if options.pretty {
        serde_json::to_writer_pretty(writer, &document)?;
    } else {
        serde_json::to_writer(writer, &document)?;
    }
    info!(
        identifier = %document.identifier,
        objects = document.objects.len(),
        blocks = document.blocks.len(),
        "recording written"
    );
    Ok(())
}

/// Read a JSON document and rebuild its graph.
pub fn read_json<R: Read>(reader: R, registry: &SchemaRegistry, mode: ResolverMode) -> Result<RecordingGraph> {
    let document: GraphDocument = serde_json::from_reader(reader)?;
    let graph = document.into_graph(registry, mode)?;
    info!(identifier = %graph.identifier(), objects = graph.num_series(), "recording read");
    Ok(graph)
}

/// Write `graph` to a file.
pub fn write_file(
    graph: &RecordingGraph,
    registry: &SchemaRegistry,
    path: impl AsRef<Path>,
    options: WriteOptions,
) -> Result<()> {
    // Validate before the file is created so a bad graph leaves nothing behind.
    let document = GraphDocument::from_graph(graph, registry)?;
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    if options.pretty {
        serde_json::to_writer_pretty(&mut writer, &document)?;
    } else {
        serde_json::to_writer(&mut writer, &document)?;
    }
    writer.flush()?;
    info!(path = %path.as_ref().display(), objects = document.objects.len(), "recording written");
    Ok(())
}

/// Read a graph from a file.
pub fn read_file(path: impl AsRef<Path>, registry: &SchemaRegistry, mode: ResolverMode) -> Result<RecordingGraph> {
    let file = File::open(path.as_ref())?;
    read_json(BufReader::new(file), registry, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fscv::testing::{MockBackground, MockResponse};

    #[test]
    fn test_identical_blocks_stored_once() {
        let registry = SchemaRegistry::with_builtin().unwrap();
        let mut graph = RecordingGraph::new("s", "d");
        let response = MockResponse::default().add_to(&mut graph, &registry).unwrap();
        // The copy keeps the original's bound references.
        let copy = graph.series(response).unwrap().clone().with_name("copy");
        graph.add_acquisition(copy).unwrap();

        let doc = GraphDocument::from_graph(&graph, &registry).unwrap();
        assert_eq!(doc.objects.len(), 3);
        // Excitation data plus one shared response block.
        assert_eq!(doc.blocks.len(), 2);
    }

    #[test]
    fn test_invalid_graph_writes_nothing() {
        let registry = SchemaRegistry::with_builtin().unwrap();
        let mut graph = RecordingGraph::new("s", "d");
        graph
            .add_acquisition(MockBackground::default().build(&registry).unwrap())
            .unwrap();
        let mut out = Vec::new();
        assert!(write_json(&graph, &registry, &mut out, WriteOptions::default()).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_rejects_foreign_format() {
        let registry = SchemaRegistry::with_builtin().unwrap();
        let json = r#"{"format":"other","format_version":1,"identifier":"s","session_description":"d",
                       "namespaces":[],"blocks":[],"objects":[]}"#;
        let err = read_json(json.as_bytes(), &registry, ResolverMode::Strict).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
    }

    #[test]
    fn test_missing_block_index() {
        let registry = SchemaRegistry::with_builtin().unwrap();
        let json = format!(
            r#"{{"format":"{FORMAT}","format_version":{FORMAT_VERSION},"identifier":"s","session_description":"d",
                "namespaces":[],"blocks":[],
                "objects":[{{"path":"/stimulus/x","type_key":{{"namespace":"ndx-fscv","name":"FSCVExcitationSeries","version":"0.1.0"}},
                             "description":"d","unit":"volts","data":3,"rate":10.0}}]}}"#
        );
        let err = read_json(json.as_bytes(), &registry, ResolverMode::Strict).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
    }
}
