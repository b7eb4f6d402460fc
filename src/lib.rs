//! # ndx-fscv
//!
//! Container types for Fast-Scan Cyclic Voltammetry (FSCV) recordings, built
//! on a small typed, versioned, hierarchical time-series model.
//!
//! ## Modules
//!
//! - [`util`] - Basic types (Dtype, Dimensions, errors, logging setup)
//! - [`core`] - Data arrays, timing, attributes, object paths
//! - [`schema`] - Versioned type definitions and instance validation
//! - [`series`] - Typed series container and builder
//! - [`refs`] - Cross-container references and their resolver
//! - [`io`] - Recording graph and its JSON storage form
//! - [`fscv`] - FSCV excitation, response and background-subtracted series
//!
//! ## Example
//!
//! ```ignore
//! use ndx_fscv::prelude::*;
//!
//! let registry = SchemaRegistry::with_builtin()?;
//! let mut graph = RecordingGraph::new("session-1", "dopamine release");
//! graph.set_electrodes(ElectrodeTableRows::with_electrodes(4, "striatum", "probe0"))?;
//!
//! let excitation = ExcitationBuilder::new("excitation")
//!     .description("triangle ramp")
//!     .voltages(ramp)
//!     .rate(25_000.0)
//!     .scan_frequency(10.0)
//!     .sweep_rate(400.0)
//!     .waveform_shape("Triangle")
//!     .build(&registry)?;
//! let exc = graph.add_stimulus(excitation)?;
//!
//! let response = ResponseBuilder::new("response")
//!     .description("carbon fiber current")
//!     .currents(currents)
//!     .rate(25_000.0)
//!     .build(&registry)?;
//! let resp = graph.add_acquisition(response)?;
//!
//! let region = graph.create_electrode_region(&[0, 1, 2, 3], "FSCV electrodes")?;
//! graph.bind(resp, "electrodes", LiveTarget::Region(region))?;
//! graph.bind(resp, "excitation_series", LiveTarget::Series(exc))?;
//!
//! write_file(&graph, &registry, "session.json", WriteOptions::default())?;
//! ```

pub mod util;
pub mod core;
pub mod schema;
pub mod series;
pub mod refs;
pub mod io;
pub mod fscv;

// Re-export commonly used types
pub use util::{Error, Result};
pub use schema::{SchemaRegistry, TypeKey};
pub use series::SeriesInstance;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Dtype, Dimensions, Error, Result};
    pub use crate::core::{AttrValue, Attributes, DataArray, ObjectPath, Timing};
    pub use crate::schema::{AttributeSpec, SchemaRegistry, SharedRegistry, TypeDefinition, TypeKey};
    pub use crate::series::{SeriesBuilder, SeriesInstance};
    pub use crate::refs::{ElectrodeRegion, ElectrodeTableRows, LiveTarget, ObjectId, ResolverMode};
    pub use crate::io::{read_file, write_file, RecordingGraph, WriteOptions};
    pub use crate::fscv::{
        BackgroundSubtractedBuilder, ExcitationBuilder, FscvBackgroundSubtractedSeries, FscvExcitationSeries,
        FscvResponseSeries, ResponseBuilder,
    };
}
