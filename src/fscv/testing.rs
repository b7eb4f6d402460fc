//! Mock FSCV series for tests and demos.
//!
//! Every mock has defaults matching a typical recording (2140 Hz sampling,
//! 10 Hz scans, 400 V/s triangle sweeps, four electrodes, 100 samples) and a
//! unique name unless one is given. `build` returns an unlinked series;
//! `add_to` places it in a graph together with whatever it links to.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::{BackgroundSubtractedBuilder, ExcitationBuilder, ResponseBuilder};
use crate::core::DataArray;
use crate::io::RecordingGraph;
use crate::refs::{ElectrodeTableRows, LiveTarget, ObjectId};
use crate::schema::SchemaRegistry;
use crate::series::SeriesInstance;
use crate::util::{Dimensions, Result};

static NAME_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// `base` followed by a process-wide counter.
pub fn unique_name(base: &str) -> String {
    format!("{}_{}", base, NAME_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Deterministic values in `[0, 1)` shaped `(rows, cols)`.
fn pseudo_random(rows: usize, cols: usize) -> Result<DataArray> {
    const GOLDEN: f64 = 0.618_033_988_749_895;
    let values = (0..rows * cols).map(|i| ((i + 1) as f64 * GOLDEN).fract()).collect();
    Ok(DataArray::new(values, Dimensions::d2(rows, cols))?)
}

fn ensure_electrodes(graph: &mut RecordingGraph, count: usize) -> Result<()> {
    if graph.electrodes().is_none() {
        graph.set_electrodes(ElectrodeTableRows::with_electrodes(count, "unknown", "mock_group"))?;
    }
    Ok(())
}

/// Mock excitation waveform.
#[derive(Clone, Debug)]
pub struct MockExcitation {
    /// Series name; a unique one is generated when `None`.
    pub name: Option<String>,
    pub description: String,
    /// Scan frequency in Hz.
    pub scan_frequency: f64,
    /// Sweep rate in V/s.
    pub sweep_rate: f64,
    pub waveform_shape: String,
    /// Sampling rate in Hz.
    pub rate: f64,
    /// Number of voltage samples.
    pub num_samples: usize,
}

impl Default for MockExcitation {
    fn default() -> Self {
        Self {
            name: None,
            description: "A mock FSCV excitation series to be used for testing.".into(),
            scan_frequency: 10.0,
            sweep_rate: 400.0,
            waveform_shape: "Triangle".into(),
            rate: 2140.0,
            num_samples: 100,
        }
    }
}

impl MockExcitation {
    /// Build the series on its own.
    pub fn build(&self, registry: &SchemaRegistry) -> Result<SeriesInstance> {
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| unique_name("fscv_excitation_series"));
        ExcitationBuilder::new(&name)
            .description(&self.description)
            .voltages(linspace(-1.0, 1.0, self.num_samples))
            .rate(self.rate)
            .scan_frequency(self.scan_frequency)
            .sweep_rate(self.sweep_rate)
            .waveform_shape(&self.waveform_shape)
            .build(registry)
    }

    /// Add to the graph's stimulus group.
    pub fn add_to(&self, graph: &mut RecordingGraph, registry: &SchemaRegistry) -> Result<ObjectId> {
        graph.add_stimulus(self.build(registry)?)
    }
}

/// Mock response current.
#[derive(Clone, Debug)]
pub struct MockResponse {
    /// Series name; a unique one is generated when `None`.
    pub name: Option<String>,
    pub description: String,
    /// Columns of the data, and electrodes selected by `add_to`.
    pub num_electrodes: usize,
    /// Number of time points.
    pub num_samples: usize,
    pub current_to_voltage_factor: f64,
    /// Sampling rate in Hz.
    pub rate: f64,
    /// Excitation to link; a mock one is added when `None`.
    pub excitation: Option<ObjectId>,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            name: None,
            description: "A mock FSCV response series to be used for testing.".into(),
            num_electrodes: 4,
            num_samples: 100,
            current_to_voltage_factor: 0.5,
            rate: 2140.0,
            excitation: None,
        }
    }
}

impl MockResponse {
    /// Build the series on its own, with unbound references.
    pub fn build(&self, registry: &SchemaRegistry) -> Result<SeriesInstance> {
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| unique_name("fscv_response_series"));
        ResponseBuilder::new(&name)
            .description(&self.description)
            .currents(pseudo_random(self.num_samples, self.num_electrodes)?)
            .rate(self.rate)
            .current_to_voltage_factor(self.current_to_voltage_factor)
            .build(registry)
    }

    /// Add to the graph's acquisition group, linked to every electrode and to
    /// the excitation.
    pub fn add_to(&self, graph: &mut RecordingGraph, registry: &SchemaRegistry) -> Result<ObjectId> {
        ensure_electrodes(graph, self.num_electrodes)?;
        let rows: Vec<usize> = (0..self.num_electrodes).collect();
        let region = graph.create_electrode_region(&rows, "FSCV electrodes")?;
        let excitation = match self.excitation {
            Some(id) => id,
            None => MockExcitation::default().add_to(graph, registry)?,
        };

        let id = graph.add_acquisition(self.build(registry)?)?;
        graph.bind(id, "electrodes", LiveTarget::Region(region))?;
        graph.bind(id, "excitation_series", LiveTarget::Series(excitation))?;
        Ok(id)
    }
}

/// Mock background-subtracted current.
#[derive(Clone, Debug)]
pub struct MockBackground {
    /// Series name; a unique one is generated when `None`.
    pub name: Option<String>,
    pub description: String,
    /// Columns of the data.
    pub num_electrodes: usize,
    /// Number of time points.
    pub num_samples: usize,
    /// Sampling rate in Hz.
    pub rate: f64,
    /// Response to link; a mock one is added when `None`.
    pub response: Option<ObjectId>,
}

impl Default for MockBackground {
    fn default() -> Self {
        Self {
            name: None,
            description: "A mock FSCV background-subtracted series to be used for testing.".into(),
            num_electrodes: 4,
            num_samples: 100,
            rate: 2140.0,
            response: None,
        }
    }
}

impl MockBackground {
    /// Build the series on its own, with an unbound response link.
    pub fn build(&self, registry: &SchemaRegistry) -> Result<SeriesInstance> {
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| unique_name("fscv_background_subtracted_series"));
        BackgroundSubtractedBuilder::new(&name)
            .description(&self.description)
            .currents(pseudo_random(self.num_samples, self.num_electrodes)?)
            .rate(self.rate)
            .build(registry)
    }

    /// Add to the graph's acquisition group, linked to the response.
    pub fn add_to(&self, graph: &mut RecordingGraph, registry: &SchemaRegistry) -> Result<ObjectId> {
        let response = match self.response {
            Some(id) => id,
            None => MockResponse {
                num_electrodes: self.num_electrodes,
                rate: self.rate,
                ..Default::default()
            }
            .add_to(graph, registry)?,
        };
        let id = graph.add_acquisition(self.build(registry)?)?;
        graph.bind(id, "response_series", LiveTarget::Series(response))?;
        Ok(id)
    }
}
