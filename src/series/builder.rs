//! Builder for [`SeriesInstance`].

use tracing::debug;

use super::SeriesInstance;
use crate::core::{AttrValue, Attributes, DataArray, Timing};
use crate::refs::{CrossReference, TargetKind};
use crate::schema::{SchemaRegistry, TypeKey};
use crate::util::{Error, Result, ValidationError};

/// Collects the parts of a series and validates them on [`build`](Self::build).
#[derive(Clone, Debug)]
pub struct SeriesBuilder {
    type_key: TypeKey,
    name: String,
    description: Option<String>,
    data: Option<DataArray>,
    rate: Option<f64>,
    starting_time: Option<f64>,
    timestamps: Option<Vec<f64>>,
    unit: Option<String>,
    attributes: Attributes,
}

impl SeriesBuilder {
    /// Start a series of type `type_key` called `name`.
    pub fn new(type_key: TypeKey, name: &str) -> Self {
        Self {
            type_key,
            name: name.to_string(),
            description: None,
            data: None,
            rate: None,
            starting_time: None,
            timestamps: None,
            unit: None,
            attributes: Attributes::new(),
        }
    }

    /// Free-text description of the series.
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Sample data; the leading dimension is time.
    pub fn data(mut self, data: DataArray) -> Self {
        self.data = Some(data);
        self
    }

    /// Sampling rate in Hz.
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Time of the first sample in seconds, for rate timing.
    pub fn starting_time(mut self, starting_time: f64) -> Self {
        self.starting_time = Some(starting_time);
        self
    }

    /// One timestamp per sample, in seconds.
    pub fn timestamps(mut self, timestamps: Vec<f64>) -> Self {
        self.timestamps = Some(timestamps);
        self
    }

    /// Set the timing from an assembled [`Timing`].
    pub fn timing(mut self, timing: &Timing) -> Self {
        match timing {
            Timing::Rate { rate, starting_time } => {
                self.rate = Some(*rate);
                self.starting_time = Some(*starting_time);
                self.timestamps = None;
            }
            Timing::Timestamps(times) => {
                self.rate = None;
                self.starting_time = None;
                self.timestamps = Some(times.as_slice().to_vec());
            }
        }
        self
    }

    /// Unit of the data. Types with a fixed unit fill it in when omitted.
    pub fn unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    /// Type-specific attribute.
    pub fn attribute(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.attributes.set(name, value);
        self
    }

    /// Set every attribute in `attributes`.
    pub fn attributes(mut self, attributes: Attributes) -> Self {
        for (name, value) in attributes.iter() {
            self.attributes.set(name, value.clone());
        }
        self
    }

    /// Validate the collected parts against `registry` and create the series.
    ///
    /// Reference slots are created unbound for every reference the type
    /// declares; they are checked when the series is written.
    pub fn build(self, registry: &SchemaRegistry) -> Result<SeriesInstance> {
        let resolved = registry.resolve_attributes(&self.type_key)?;
        let missing = |attribute: &str| -> Error {
            ValidationError::MissingRequiredAttribute {
                type_name: self.type_key.name.clone(),
                attribute: attribute.to_string(),
            }
            .into()
        };

        let description = self.description.clone().ok_or_else(|| missing("description"))?;
        let data = self.data.clone().ok_or_else(|| missing("data"))?;
        let unit = match &self.unit {
            Some(unit) => unit.clone(),
            None => resolved
                .iter()
                .find(|a| a.name == "unit")
                .and_then(|a| a.value.as_ref())
                .and_then(AttrValue::as_str)
                .map(str::to_string)
                .ok_or_else(|| missing("unit"))?,
        };
        let timing = Timing::from_parts(self.rate, self.starting_time, self.timestamps.clone())?;

        let references = resolved
            .iter()
            .filter(|a| a.is_reference())
            .map(|a| {
                let kind = if a.region { TargetKind::Region } else { TargetKind::Series };
                CrossReference::new(&a.name, a.required, kind)
            })
            .collect();

        let instance = SeriesInstance {
            name: self.name,
            description,
            type_key: self.type_key,
            data,
            timing,
            unit,
            attributes: self.attributes,
            references,
        };
        registry.validate_unlinked(&instance, &instance.type_key)?;

        debug!(
            name = %instance.name,
            type_key = %instance.type_key,
            shape = %instance.data.dims(),
            "series built"
        );
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fscv;

    fn excitation() -> SeriesBuilder {
        SeriesInstance::builder(fscv::excitation_key(), "excitation")
            .description("ramp")
            .data(DataArray::from_vec(vec![-0.4, 0.0, 1.3, 0.0, -0.4]))
            .attribute("scan_frequency", 10.0)
            .attribute("sweep_rate", 400.0)
            .attribute("waveform_shape", "Triangle")
            .rate(2140.0)
    }

    #[test]
    fn test_fixed_unit_filled_in() {
        let registry = SchemaRegistry::with_builtin().unwrap();
        let series = excitation().build(&registry).unwrap();
        assert_eq!(series.unit(), "volts");
        assert_eq!(series.references().count(), 0);
    }

    #[test]
    fn test_missing_parts() {
        let registry = SchemaRegistry::with_builtin().unwrap();
        let err = SeriesInstance::builder(fscv::excitation_key(), "e")
            .description("ramp")
            .rate(10.0)
            .build(&registry)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingRequiredAttribute { ref attribute, .. }) if attribute == "data"
        ));

        let mut attrs = Attributes::new();
        attrs.set("scan_frequency", 10.0);
        let err = SeriesInstance::builder(fscv::excitation_key(), "e")
            .description("ramp")
            .data(DataArray::from_vec(vec![0.0]))
            .rate(10.0)
            .attributes(attrs)
            .build(&registry)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingRequiredAttribute { ref attribute, .. }) if attribute == "sweep_rate"
        ));
    }

    #[test]
    fn test_timing_required() {
        let registry = SchemaRegistry::with_builtin().unwrap();
        let err = SeriesInstance::builder(fscv::excitation_key(), "e")
            .description("ramp")
            .data(DataArray::from_vec(vec![0.0, 1.0]))
            .attribute("scan_frequency", 10.0)
            .attribute("sweep_rate", 400.0)
            .attribute("waveform_shape", "Triangle")
            .build(&registry)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::TimingInvariantViolation(_))
        ));

        let err = excitation()
            .timestamps(vec![0.0, 0.1, 0.2, 0.3, 0.4])
            .build(&registry)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::TimingInvariantViolation(_))
        ));

        let series = excitation()
            .timing(&Timing::timestamps(vec![0.0, 0.1, 0.2, 0.3, 0.4]))
            .build(&registry)
            .unwrap();
        assert!((series.duration() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_rank_checked() {
        let registry = SchemaRegistry::with_builtin().unwrap();
        let err = excitation()
            .data(DataArray::new(vec![0.0; 6], (3, 2)).unwrap())
            .build(&registry)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_undeclared_attribute_rejected() {
        let registry = SchemaRegistry::with_builtin().unwrap();
        let err = excitation()
            .attribute("gain", 2.0)
            .build(&registry)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::UndeclaredAttribute { .. })));
    }
}
