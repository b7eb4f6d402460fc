//! Sample timing for series.
//!
//! A series is timed either by a fixed sampling rate plus a start offset, or by
//! an explicit, strictly increasing timestamp per sample. There is no third
//! state: "neither" and "both" are rejected when the timing is assembled.

use super::DataArray;
use crate::util::{BoundsError, ValidationError};

/// Timing of the samples of a series.
#[derive(Clone, Debug, PartialEq)]
pub enum Timing {
    /// Sample `i` was taken at `starting_time + i / rate` seconds.
    Rate { rate: f64, starting_time: f64 },

    /// Sample `i` was taken at `timestamps[i]` seconds.
    Timestamps(DataArray),
}

impl Timing {
    /// Fixed-rate timing starting at 0 s.
    pub fn rate(rate: f64) -> Self {
        Self::Rate { rate, starting_time: 0.0 }
    }

    /// Fixed-rate timing with a start offset.
    pub fn rate_from(rate: f64, starting_time: f64) -> Self {
        Self::Rate { rate, starting_time }
    }

    /// Explicit timestamps.
    pub fn timestamps(times: Vec<f64>) -> Self {
        Self::Timestamps(DataArray::from_vec(times))
    }

    /// Assemble timing from optional parts, as they arrive from a builder or storage.
    pub fn from_parts(
        rate: Option<f64>,
        starting_time: Option<f64>,
        timestamps: Option<Vec<f64>>,
    ) -> Result<Self, ValidationError> {
        match (rate, timestamps) {
            (Some(rate), None) => Ok(Self::rate_from(rate, starting_time.unwrap_or(0.0))),
            (None, Some(times)) => {
                if starting_time.is_some() {
                    return Err(ValidationError::TimingInvariantViolation(
                        "starting_time only applies to rate-based timing".into(),
                    ));
                }
                Ok(Self::timestamps(times))
            }
            (None, None) => Err(ValidationError::TimingInvariantViolation(
                "neither rate nor timestamps is set".into(),
            )),
            (Some(_), Some(_)) => Err(ValidationError::TimingInvariantViolation(
                "both rate and timestamps are set".into(),
            )),
        }
    }

    /// Check the timing against a series with `num_samples` samples.
    pub fn check(&self, num_samples: usize) -> Result<(), ValidationError> {
        match self {
            Self::Rate { rate, starting_time } => {
                if !rate.is_finite() || *rate <= 0.0 {
                    return Err(ValidationError::TimingInvariantViolation(format!(
                        "rate must be a positive number, got {}",
                        rate
                    )));
                }
                if !starting_time.is_finite() {
                    return Err(ValidationError::TimingInvariantViolation(format!(
                        "starting_time must be finite, got {}",
                        starting_time
                    )));
                }
            }
            Self::Timestamps(times) => {
                if times.len() != num_samples {
                    return Err(ValidationError::TimingInvariantViolation(format!(
                        "{} timestamps for {} samples",
                        times.len(),
                        num_samples
                    )));
                }
                let ts = times.as_slice();
                if let Some(bad) = ts.iter().position(|t| !t.is_finite()) {
                    return Err(ValidationError::TimingInvariantViolation(format!(
                        "timestamp {} is not finite",
                        bad
                    )));
                }
                if let Some(i) = ts.windows(2).position(|w| w[1] <= w[0]) {
                    return Err(ValidationError::TimingInvariantViolation(format!(
                        "timestamps not strictly increasing at index {}",
                        i + 1
                    )));
                }
            }
        }
        Ok(())
    }

    /// Check if samples are spaced by a fixed rate.
    #[inline]
    pub fn is_rate(&self) -> bool {
        matches!(self, Self::Rate { .. })
    }

    /// Sampling rate in Hz, for rate-based timing.
    pub fn sampling_rate(&self) -> Option<f64> {
        match self {
            Self::Rate { rate, .. } => Some(*rate),
            Self::Timestamps(_) => None,
        }
    }

    /// Start offset, for rate-based timing.
    pub fn starting_time(&self) -> Option<f64> {
        match self {
            Self::Rate { starting_time, .. } => Some(*starting_time),
            Self::Timestamps(_) => None,
        }
    }

    /// Explicit timestamps, for timestamp-based timing.
    pub fn timestamp_values(&self) -> Option<&[f64]> {
        match self {
            Self::Rate { .. } => None,
            Self::Timestamps(times) => Some(times.as_slice()),
        }
    }

    /// Time of sample `index`, if the series has that many samples.
    pub fn sample_time(&self, index: usize, num_samples: usize) -> Option<f64> {
        if index >= num_samples {
            return None;
        }
        match self {
            Self::Rate { rate, starting_time } => Some(starting_time + index as f64 / rate),
            Self::Timestamps(times) => times.as_slice().get(index).copied(),
        }
    }

    /// Time span covered by `num_samples` samples.
    ///
    /// Rate timing covers `num_samples / rate` seconds. Timestamp timing covers
    /// the distance between the first and last timestamp.
    pub fn duration(&self, num_samples: usize) -> f64 {
        match self {
            Self::Rate { rate, .. } => num_samples as f64 / rate,
            Self::Timestamps(times) => match (times.first(), times.last()) {
                (Some(first), Some(last)) => last - first,
                _ => 0.0,
            },
        }
    }

    /// Timing of samples `start..end`. Timestamps share the original buffer.
    pub fn slice(&self, start: usize, end: usize) -> Result<Self, BoundsError> {
        match self {
            Self::Rate { rate, starting_time } => Ok(Self::Rate {
                rate: *rate,
                starting_time: starting_time + start as f64 / rate,
            }),
            Self::Timestamps(times) => Ok(Self::Timestamps(times.slice_rows(start, end)?)),
        }
    }

    /// Extend the timing for appended samples.
    ///
    /// Rate timing takes no extra values; timestamp timing needs exactly one
    /// new timestamp per appended sample, each later than the previous one.
    pub fn extend(&mut self, added: usize, new_times: Option<&[f64]>) -> Result<(), ValidationError> {
        match (self, new_times) {
            (Self::Rate { .. }, None) => Ok(()),
            (Self::Rate { .. }, Some(_)) => Err(ValidationError::TimingInvariantViolation(
                "timestamps supplied for a rate-based series".into(),
            )),
            (Self::Timestamps(_), None) => Err(ValidationError::TimingInvariantViolation(
                "appending to a timestamp-based series requires timestamps".into(),
            )),
            (Self::Timestamps(times), Some(new_times)) => {
                if new_times.len() != added {
                    return Err(ValidationError::TimingInvariantViolation(format!(
                        "{} timestamps for {} appended samples",
                        new_times.len(),
                        added
                    )));
                }
                let mut prev = times.last().unwrap_or(f64::NEG_INFINITY);
                for t in new_times {
                    if !t.is_finite() || *t <= prev {
                        return Err(ValidationError::TimingInvariantViolation(format!(
                            "appended timestamp {} does not follow {}",
                            t, prev
                        )));
                    }
                    prev = *t;
                }
                times.append_rows(new_times)?;
                Ok(())
            }
        }
    }
}
