//! Validated time series.

use std::fmt;

use super::SeriesBuilder;
use crate::core::{AttrValue, Attributes, DataArray, Timing};
use crate::refs::{CrossReference, StoredRef};
use crate::schema::TypeKey;
use crate::util::{ReferenceError, Result, ValidationError};

/// A named time series of a registered type.
///
/// Instances are created through [`SeriesBuilder`], which validates them
/// against the schema registry. The sample shape is fixed at construction;
/// the series can only grow by whole rows.
#[derive(Clone)]
pub struct SeriesInstance {
    pub(super) name: String,
    pub(super) description: String,
    pub(super) type_key: TypeKey,
    pub(super) data: DataArray,
    pub(super) timing: Timing,
    pub(super) unit: String,
    pub(super) attributes: Attributes,
    pub(super) references: Vec<CrossReference>,
}

impl SeriesInstance {
    /// Start building a series of type `type_key`.
    pub fn builder(type_key: TypeKey, name: &str) -> SeriesBuilder {
        SeriesBuilder::new(type_key, name)
    }

    /// Series name, unique within its group.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Type this series was validated against.
    #[inline]
    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    /// Sample data; the leading dimension is time.
    #[inline]
    pub fn data(&self) -> &DataArray {
        &self.data
    }

    /// Rate or timestamps of the samples.
    #[inline]
    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Unit of the data values.
    #[inline]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Type-specific attributes.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Attribute stored under `name`.
    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    /// Reference slots in schema order.
    pub fn references(&self) -> impl Iterator<Item = &CrossReference> {
        self.references.iter()
    }

    /// Reference slot for `field`.
    pub fn reference(&self, field: &str) -> Option<&CrossReference> {
        self.references.iter().find(|r| r.field() == field)
    }

    pub(crate) fn reference_mut(&mut self, field: &str) -> Option<&mut CrossReference> {
        self.references.iter_mut().find(|r| r.field() == field)
    }

    /// Put a reference back into its stored state after reading.
    pub(crate) fn restore_reference(&mut self, field: &str, stored: StoredRef) -> Result<()> {
        let slot = self
            .reference_mut(field)
            .ok_or_else(|| ReferenceError::UndeclaredReference { field: field.to_string() })?;
        Ok(slot.restore(stored)?)
    }

    /// Number of samples (leading data dimension).
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.data.len()
    }

    /// Time span of the series in seconds.
    ///
    /// Rate timing gives `num_samples / rate`; timestamp timing gives the
    /// distance between the first and last timestamp.
    pub fn duration(&self) -> f64 {
        self.timing.duration(self.num_samples())
    }

    /// Time of sample `index` in seconds.
    pub fn sample_time(&self, index: usize) -> Option<f64> {
        self.timing.sample_time(index, self.num_samples())
    }

    /// Samples `start..end` as a series sharing this one's buffers.
    pub fn slice(&self, start: usize, end: usize) -> Result<SeriesInstance> {
        let data = self.data.slice_rows(start, end)?;
        let timing = self.timing.slice(start, end)?;
        Ok(Self {
            data,
            timing,
            ..self.clone()
        })
    }

    /// Append rows given as a flat row-major slice.
    ///
    /// Timestamp-timed series need one new timestamp per row. Nothing is
    /// changed if the rows or timestamps are rejected.
    pub fn append_rows(&mut self, values: &[f64], timestamps: Option<&[f64]>) -> Result<usize> {
        let width = self.data.row_len();
        if width == 0 || values.len() % width != 0 {
            return Err(ValidationError::ShapeMismatch {
                attribute: "data".into(),
                expected: format!("rows of {}", width),
                actual: format!("{} values", values.len()),
            }
            .into());
        }
        let added = values.len() / width;
        self.timing.extend(added, timestamps)?;
        self.data.append_rows(values)?;
        Ok(added)
    }

    /// Same series under another name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Equal name, type, data, timing, unit and attributes.
    ///
    /// Reference slots are compared by field only, since their targets are
    /// session identities.
    pub fn same_content(&self, other: &SeriesInstance) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.type_key == other.type_key
            && self.unit == other.unit
            && self.data == other.data
            && self.timing == other.timing
            && self.attributes == other.attributes
            && self.references.len() == other.references.len()
            && self
                .references
                .iter()
                .zip(&other.references)
                .all(|(a, b)| a.field() == b.field())
    }
}

impl fmt::Debug for SeriesInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeriesInstance")
            .field("name", &self.name)
            .field("type", &self.type_key.to_string())
            .field("shape", &self.data.dims().to_string())
            .field("timing", &self.timing)
            .field("unit", &self.unit)
            .field("attributes", &self.attributes)
            .field("references", &self.references)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::fscv::testing::{MockExcitation, MockResponse};
    use crate::schema::SchemaRegistry;
    use crate::util::{BoundsError, Error};

    #[test]
    fn test_slice_shares_buffer() {
        let registry = SchemaRegistry::with_builtin().unwrap();
        let series = MockResponse::default().build(&registry).unwrap();
        let n = series.num_samples();

        let full = series.slice(0, n).unwrap();
        assert!(full.same_content(&series));

        let part = series.slice(10, 20).unwrap();
        assert_eq!(part.num_samples(), 10);
        assert!(part.data().shares_buffer(series.data()));
        assert_eq!(part.data().row(0), series.data().row(10));
        assert_eq!(part.sample_time(0), series.sample_time(10));

        let err = series.slice(2, n + 1).unwrap_err();
        assert!(matches!(err, Error::Bounds(BoundsError::OutOfBounds { .. })));
        assert!(series.slice(5, 4).is_err());
    }

    #[test]
    fn test_duration_from_rate() {
        let registry = SchemaRegistry::with_builtin().unwrap();
        let series = MockExcitation {
            rate: 25_000.0,
            num_samples: 100,
            ..Default::default()
        }
        .build(&registry)
        .unwrap();
        assert!((series.duration() - 0.004).abs() < 1e-12);
        assert_eq!(series.sample_time(100), None);
    }

    #[test]
    fn test_append_rows_copy_on_write() {
        let registry = SchemaRegistry::with_builtin().unwrap();
        let mut series = MockResponse::default().build(&registry).unwrap();
        let snapshot = series.clone();
        let width = series.data().row_len();

        assert_eq!(series.append_rows(&vec![1.0; width * 2], None).unwrap(), 2);
        assert_eq!(series.num_samples(), snapshot.num_samples() + 2);
        assert!(!series.data().shares_buffer(snapshot.data()));
        assert_eq!(snapshot.num_samples(), 100);

        let before = series.num_samples();
        assert!(series.append_rows(&[1.0], None).is_err());
        assert!(series.append_rows(&vec![1.0; width], Some(&[9.0][..])).is_err());
        assert_eq!(series.num_samples(), before);
    }
}
