//! Persistence boundary.
//!
//! [`RecordingGraph`] is the finalized object graph handed to storage.
//! [`GraphDocument`] is its serialized form; [`write_json`] and [`read_json`]
//! move it through any `Write`/`Read`, and the file helpers wrap them.
//!
//! ```ignore
//! use ndx_fscv::io::{read_file, write_file, WriteOptions};
//! use ndx_fscv::refs::ResolverMode;
//!
//! write_file(&graph, &registry, "session.json", WriteOptions::default())?;
//! let back = read_file("session.json", &registry, ResolverMode::Strict)?;
//! ```

mod document;
mod graph;

pub use document::{
    read_file, read_json, write_file, write_json, DataBlock, GraphDocument, NamespaceRef, SeriesDoc, WriteOptions,
    FORMAT, FORMAT_VERSION,
};
pub use graph::{GraphObject, RecordingGraph, ACQUISITION, ELECTRODES_PATH, STIMULUS};
