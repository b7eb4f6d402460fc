//! Built-in namespaces: the `core` base types and the `ndx-fscv` extension.

use super::{AttributeSpec, NamespaceSpec, TypeDefinition};
use crate::fscv;
use crate::util::Dtype;

/// Namespace of the base types.
pub const CORE_NAMESPACE: &str = "core";
/// Version of the base namespace.
pub const CORE_VERSION: &str = "2.8.0";

/// Base type of every time series.
pub const TIME_SERIES: &str = "TimeSeries";
/// Table of rows referenced by region selections (e.g. electrodes).
pub const DYNAMIC_TABLE: &str = "DynamicTable";

/// The subset of the core namespace the FSCV types build on.
pub fn core_namespace() -> NamespaceSpec {
    let mut ns = NamespaceSpec::new(CORE_NAMESPACE, CORE_VERSION);
    ns.doc = "Base types for time series and tables".into();

    ns.with_type(
        TypeDefinition::new(CORE_NAMESPACE, TIME_SERIES, CORE_VERSION)
            .doc("General purpose time series.")
            .attribute(AttributeSpec::scalar("description", Dtype::Text).optional().with_default("no description"))
            .attribute(AttributeSpec::scalar("comments", Dtype::Text).optional().with_default("no comments"))
            .attribute(
                AttributeSpec::array("data", Dtype::Float64)
                    .doc("Data values. The first dimension must be time."),
            )
            .attribute(AttributeSpec::scalar("unit", Dtype::Text).doc("Base unit of measurement for the data."))
            .attribute(AttributeSpec::scalar("conversion", Dtype::Float32).optional().with_default(1.0))
            .attribute(AttributeSpec::scalar("resolution", Dtype::Float32).optional().with_default(-1.0))
            .attribute(AttributeSpec::scalar("offset", Dtype::Float32).optional().with_default(0.0))
            .attribute(AttributeSpec::scalar("starting_time", Dtype::Float64).optional())
            .attribute(AttributeSpec::scalar("rate", Dtype::Float64).optional().doc("Sampling rate, in Hz."))
            .attribute(
                AttributeSpec::array("timestamps", Dtype::Float64)
                    .optional()
                    .dims(&["num_times"])
                    .doc("Timestamps for samples stored in data, in seconds."),
            ),
    )
    .with_type(
        TypeDefinition::new(CORE_NAMESPACE, DYNAMIC_TABLE, CORE_VERSION)
            .doc("A group containing multiple datasets that are aligned on their first dimension.")
            .attribute(AttributeSpec::scalar("description", Dtype::Text)),
    )
}

/// The `ndx-fscv` namespace.
pub fn fscv_namespace() -> NamespaceSpec {
    let mut ns = NamespaceSpec::new(fscv::NAMESPACE, fscv::VERSION).include(CORE_NAMESPACE);
    ns.doc = "Data types for Fast-Scan Cyclic Voltammetry (FSCV): the applied excitation waveform, \
              the measured electrochemical current and background-subtracted current."
        .into();
    ns.authors = vec!["Ben Dichter".into(), "Szonja Weigl".into()];
    ns.contacts = vec![
        "ben.dicther@catalystneuro.com".into(),
        "szonja.weigl@catalystneuro.com".into(),
    ];

    let amperes = || {
        AttributeSpec::scalar("unit", Dtype::Text)
            .fixed("amperes")
            .doc("Unit of the data values, should be 'amperes'.")
    };

    ns.with_type(
        TypeDefinition::new(fscv::NAMESPACE, fscv::RESPONSE_SERIES, fscv::VERSION)
            .extends(TIME_SERIES)
            .doc("Raw FSCV current measurements over time, linked to electrodes and the excitation waveform.")
            .attribute(
                AttributeSpec::array("data", Dtype::Float64)
                    .dims(&["num_timepoints", "num_electrodes"])
                    .doc("Measured current, one column per electrode."),
            )
            .attribute(amperes())
            .attribute(
                AttributeSpec::region_reference("electrodes", DYNAMIC_TABLE)
                    .doc("Region of the electrodes table this data comes from."),
            )
            .attribute(
                AttributeSpec::reference("excitation_series", fscv::EXCITATION_SERIES)
                    .doc("Link to the excitation waveform applied during FSCV."),
            )
            .attribute(
                AttributeSpec::scalar("current_to_voltage_factor", Dtype::Float64)
                    .optional()
                    .doc("Factor used to multiply each data value to convert measured current to voltage."),
            ),
    )
    .with_type(
        TypeDefinition::new(fscv::NAMESPACE, fscv::EXCITATION_SERIES, fscv::VERSION)
            .extends(TIME_SERIES)
            .doc("Applied FSCV excitation waveform over time.")
            .attribute(
                AttributeSpec::array("data", Dtype::Float64)
                    .dims(&["num_timepoints"])
                    .doc("Applied ramp voltage values."),
            )
            .attribute(
                AttributeSpec::scalar("unit", Dtype::Text)
                    .fixed("volts")
                    .doc("Unit of the data values, should be 'volts'."),
            )
            .attribute(
                AttributeSpec::scalar("scan_frequency", Dtype::Float64)
                    .doc("Frequency at which the excitation waveform is applied, in hertz."),
            )
            .attribute(
                AttributeSpec::scalar("sweep_rate", Dtype::Float64)
                    .doc("Voltage sweep rate during a single scan, in volts per second."),
            )
            .attribute(
                AttributeSpec::scalar("waveform_shape", Dtype::Text)
                    .doc("Shape of the waveform, e.g. 'Triangle', 'N-shape', 'Sawhorse'."),
            ),
    )
    .with_type(
        TypeDefinition::new(fscv::NAMESPACE, fscv::BACKGROUND_SUBTRACTED_SERIES, fscv::VERSION)
            .extends(TIME_SERIES)
            .doc("FSCV data with background subtraction applied.")
            .attribute(
                AttributeSpec::array("data", Dtype::Float64)
                    .dims(&["num_timepoints", "num_electrodes"])
                    .doc("Corrected current after background subtraction."),
            )
            .attribute(amperes())
            .attribute(
                AttributeSpec::reference("response_series", fscv::RESPONSE_SERIES)
                    .doc("Link to the raw FSCV data."),
            ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaRegistry, TypeKey};

    #[test]
    fn test_fscv_types_resolve_over_core() {
        let registry = SchemaRegistry::with_builtin().unwrap();
        let key = TypeKey::new(fscv::NAMESPACE, fscv::RESPONSE_SERIES, fscv::VERSION);
        let attrs = registry.resolve_attributes(&key).unwrap();

        // Inherited attributes keep their ancestor position.
        let names: Vec<&str> = attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names[..4], ["description", "comments", "data", "unit"]);
        assert!(names.contains(&"current_to_voltage_factor"));

        let data = attrs.iter().find(|a| a.name == "data").unwrap();
        assert_eq!(data.rank, Some(2));
        let unit = attrs.iter().find(|a| a.name == "unit").unwrap();
        assert_eq!(unit.value.as_ref().and_then(|v| v.as_str()), Some("amperes"));
        assert!(registry.is_a_named(&key, TIME_SERIES));
    }

    #[test]
    fn test_namespace_metadata() {
        let ns = fscv_namespace();
        assert_eq!(ns.includes, vec![CORE_NAMESPACE.to_string()]);
        assert_eq!(ns.authors.len(), 2);
        assert_eq!(ns.types.len(), 3);
        assert!(ns.definitions().iter().all(|d| d.version == fscv::VERSION));
    }
}
