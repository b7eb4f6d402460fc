//! Typed builders for the FSCV series.
//!
//! Each builder presets the type key and fixed unit and exposes the
//! type-specific attributes as methods. Links are bound afterwards through a
//! [`RecordingGraph`](crate::io::RecordingGraph).

use crate::core::DataArray;
use crate::schema::SchemaRegistry;
use crate::series::{SeriesBuilder, SeriesInstance};
use crate::util::Result;

macro_rules! timing_methods {
    () => {
        /// Free-text description of the series.
        pub fn description(mut self, description: &str) -> Self {
            self.inner = self.inner.description(description);
            self
        }

        /// Sampling rate in Hz.
        pub fn rate(mut self, rate: f64) -> Self {
            self.inner = self.inner.rate(rate);
            self
        }

        /// Time of the first sample in seconds.
        pub fn starting_time(mut self, starting_time: f64) -> Self {
            self.inner = self.inner.starting_time(starting_time);
            self
        }

        /// Explicit sample times in seconds, instead of a rate.
        pub fn timestamps(mut self, timestamps: Vec<f64>) -> Self {
            self.inner = self.inner.timestamps(timestamps);
            self
        }

        /// Validate and create the series. References start unbound.
        pub fn build(self, registry: &SchemaRegistry) -> Result<SeriesInstance> {
            self.inner.build(registry)
        }
    };
}

/// Builder for `FSCVExcitationSeries`.
#[derive(Clone, Debug)]
pub struct ExcitationBuilder {
    inner: SeriesBuilder,
}

impl ExcitationBuilder {
    /// Start an excitation series called `name`.
    pub fn new(name: &str) -> Self {
        Self {
            inner: SeriesBuilder::new(super::excitation_key(), name),
        }
    }

    /// Applied voltages, one per sample.
    pub fn voltages(mut self, values: Vec<f64>) -> Self {
        self.inner = self.inner.data(DataArray::from_vec(values));
        self
    }

    /// Frequency at which the waveform is applied, in Hz.
    pub fn scan_frequency(mut self, hz: f64) -> Self {
        self.inner = self.inner.attribute("scan_frequency", hz);
        self
    }

    /// Voltage sweep rate within one scan, in V/s.
    pub fn sweep_rate(mut self, volts_per_second: f64) -> Self {
        self.inner = self.inner.attribute("sweep_rate", volts_per_second);
        self
    }

    /// Shape of the waveform, e.g. `"Triangle"`.
    pub fn waveform_shape(mut self, shape: &str) -> Self {
        self.inner = self.inner.attribute("waveform_shape", shape);
        self
    }

    timing_methods!();
}

/// Builder for `FSCVResponseSeries`.
#[derive(Clone, Debug)]
pub struct ResponseBuilder {
    inner: SeriesBuilder,
}

impl ResponseBuilder {
    /// Start a response series called `name`.
    pub fn new(name: &str) -> Self {
        Self {
            inner: SeriesBuilder::new(super::response_key(), name),
        }
    }

    /// Current samples shaped `(num_timepoints, num_electrodes)`.
    pub fn currents(mut self, data: DataArray) -> Self {
        self.inner = self.inner.data(data);
        self
    }

    /// Factor converting the measured current to volts.
    pub fn current_to_voltage_factor(mut self, factor: f64) -> Self {
        self.inner = self.inner.attribute("current_to_voltage_factor", factor);
        self
    }

    timing_methods!();
}

/// Builder for `FSCVBackgroundSubtractedSeries`.
#[derive(Clone, Debug)]
pub struct BackgroundSubtractedBuilder {
    inner: SeriesBuilder,
}

impl BackgroundSubtractedBuilder {
    /// Start a background-subtracted series called `name`.
    pub fn new(name: &str) -> Self {
        Self {
            inner: SeriesBuilder::new(super::background_key(), name),
        }
    }

    /// Corrected current shaped `(num_timepoints, num_electrodes)`.
    pub fn currents(mut self, data: DataArray) -> Self {
        self.inner = self.inner.data(data);
        self
    }

    timing_methods!();
}
