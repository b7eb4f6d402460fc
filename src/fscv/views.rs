//! Read-only typed views over FSCV series.

use crate::refs::{ElectrodeRegion, LiveTarget, ObjectId};
use crate::series::SeriesInstance;

fn is_type(series: &SeriesInstance, name: &str) -> bool {
    let key = series.type_key();
    key.namespace == super::NAMESPACE && key.name == name
}

fn linked_series(series: &SeriesInstance, field: &str) -> Option<ObjectId> {
    match series.reference(field)?.target()? {
        LiveTarget::Series(id) => Some(*id),
        LiveTarget::Region(_) => None,
    }
}

/// Applied excitation waveform.
#[derive(Clone, Copy, Debug)]
pub struct FscvExcitationSeries<'a> {
    series: &'a SeriesInstance,
}

impl<'a> FscvExcitationSeries<'a> {
    /// View `series` if it is an excitation series.
    pub fn new(series: &'a SeriesInstance) -> Option<Self> {
        is_type(series, super::EXCITATION_SERIES).then_some(Self { series })
    }

    /// Underlying series.
    pub fn series(&self) -> &'a SeriesInstance {
        self.series
    }

    /// Frequency at which the waveform is applied, in Hz.
    pub fn scan_frequency(&self) -> Option<f64> {
        self.series.attributes().float("scan_frequency")
    }

    /// Voltage sweep rate within one scan, in V/s.
    pub fn sweep_rate(&self) -> Option<f64> {
        self.series.attributes().float("sweep_rate")
    }

    /// Shape of the waveform, e.g. `"Triangle"`.
    pub fn waveform_shape(&self) -> Option<&'a str> {
        self.series.attributes().text("waveform_shape")
    }

    /// Voltage values of the waveform.
    pub fn voltages(&self) -> &'a [f64] {
        self.series.data().as_slice()
    }
}

/// Measured current, one column per electrode.
#[derive(Clone, Copy, Debug)]
pub struct FscvResponseSeries<'a> {
    series: &'a SeriesInstance,
}

impl<'a> FscvResponseSeries<'a> {
    /// View `series` if it is a response series.
    pub fn new(series: &'a SeriesInstance) -> Option<Self> {
        is_type(series, super::RESPONSE_SERIES).then_some(Self { series })
    }

    /// Underlying series.
    pub fn series(&self) -> &'a SeriesInstance {
        self.series
    }

    /// Number of data columns.
    pub fn num_electrodes(&self) -> usize {
        self.series.data().dims().size(1).unwrap_or(0)
    }

    /// Bound electrode selection.
    pub fn electrodes(&self) -> Option<&'a ElectrodeRegion> {
        match self.series.reference("electrodes")?.target()? {
            LiveTarget::Region(region) => Some(region),
            LiveTarget::Series(_) => None,
        }
    }

    /// Identity of the bound excitation series.
    pub fn excitation_series(&self) -> Option<ObjectId> {
        linked_series(self.series, "excitation_series")
    }

    /// Factor converting the measured current to volts, if recorded.
    pub fn current_to_voltage_factor(&self) -> Option<f64> {
        self.series.attributes().float("current_to_voltage_factor")
    }

    /// Data multiplied by the current-to-voltage factor.
    pub fn to_voltage(&self) -> Option<Vec<f64>> {
        let factor = self.current_to_voltage_factor()?;
        Some(self.series.data().as_slice().iter().map(|v| v * factor).collect())
    }
}

/// Current with the background removed.
#[derive(Clone, Copy, Debug)]
pub struct FscvBackgroundSubtractedSeries<'a> {
    series: &'a SeriesInstance,
}

impl<'a> FscvBackgroundSubtractedSeries<'a> {
    /// View `series` if it is a background-subtracted series.
    pub fn new(series: &'a SeriesInstance) -> Option<Self> {
        is_type(series, super::BACKGROUND_SUBTRACTED_SERIES).then_some(Self { series })
    }

    /// Underlying series.
    pub fn series(&self) -> &'a SeriesInstance {
        self.series
    }

    /// Number of data columns.
    pub fn num_electrodes(&self) -> usize {
        self.series.data().dims().size(1).unwrap_or(0)
    }

    /// Identity of the raw response series.
    pub fn response_series(&self) -> Option<ObjectId> {
        linked_series(self.series, "response_series")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fscv::testing::{MockExcitation, MockResponse};
    use crate::schema::SchemaRegistry;

    #[test]
    fn test_views_match_type() {
        let registry = SchemaRegistry::with_builtin().unwrap();
        let excitation = MockExcitation::default().build(&registry).unwrap();
        let response = MockResponse::default().build(&registry).unwrap();

        let view = FscvExcitationSeries::new(&excitation).unwrap();
        assert_eq!(view.scan_frequency(), Some(10.0));
        assert_eq!(view.sweep_rate(), Some(400.0));
        assert_eq!(view.waveform_shape(), Some("Triangle"));
        assert_eq!(view.voltages().first(), Some(&-1.0));
        assert!(FscvResponseSeries::new(&excitation).is_none());

        let view = FscvResponseSeries::new(&response).unwrap();
        assert_eq!(view.num_electrodes(), 4);
        assert_eq!(view.current_to_voltage_factor(), Some(0.5));
        assert!(view.electrodes().is_none());
        assert!(view.excitation_series().is_none());

        let volts = view.to_voltage().unwrap();
        assert_eq!(volts.len(), response.data().as_slice().len());
        assert_eq!(volts[5], response.data().as_slice()[5] * 0.5);
        assert!(FscvBackgroundSubtractedSeries::new(&response).is_none());
    }
}
