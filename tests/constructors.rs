//! Integration tests for creating FSCV series in memory.

use ndx_fscv::fscv::testing::{MockBackground, MockExcitation, MockResponse};
use ndx_fscv::fscv::{FscvBackgroundSubtractedSeries, FscvExcitationSeries, FscvResponseSeries};
use ndx_fscv::io::RecordingGraph;
use ndx_fscv::SchemaRegistry;

#[test]
fn test_fscv_response_series() {
    let registry = SchemaRegistry::with_builtin().expect("Failed to load schema");
    let mut graph = RecordingGraph::new("constructors", "mock session");

    let id = MockResponse {
        name: Some("test_fscv_response_series".into()),
        num_electrodes: 4,
        num_samples: 100,
        current_to_voltage_factor: 0.5,
        rate: 25_000.0,
        ..Default::default()
    }
    .add_to(&mut graph, &registry)
    .expect("Failed to add response");

    let series = graph.series(id).unwrap();
    assert_eq!(series.name(), "test_fscv_response_series");
    assert_eq!(series.description(), "A mock FSCV response series to be used for testing.");
    assert_eq!(series.unit(), "amperes");
    assert_eq!(series.data().dims().sizes(), &[100, 4]);
    assert_eq!(series.timing().sampling_rate(), Some(25_000.0));

    let view = FscvResponseSeries::new(series).unwrap();
    assert_eq!(view.current_to_voltage_factor(), Some(0.5));
    assert!(view.electrodes().is_some());
    assert!(view.excitation_series().is_some());

    let excitation = graph.target_series(id, "excitation_series").unwrap();
    assert_eq!(excitation.unit(), "volts");
    graph.validate(&registry).expect("Mock graph should validate");
}

#[test]
fn test_fscv_excitation_series() {
    let registry = SchemaRegistry::with_builtin().unwrap();
    let series = MockExcitation {
        name: Some("test_fscv_excitation_series".into()),
        rate: 2140.0,
        scan_frequency: 10.0,
        sweep_rate: 400.0,
        waveform_shape: "Triangle".into(),
        ..Default::default()
    }
    .build(&registry)
    .expect("Failed to build excitation");

    assert_eq!(series.name(), "test_fscv_excitation_series");
    assert_eq!(series.unit(), "volts");
    let view = FscvExcitationSeries::new(&series).unwrap();
    assert_eq!(view.scan_frequency(), Some(10.0));
    assert_eq!(view.sweep_rate(), Some(400.0));
    assert_eq!(view.waveform_shape(), Some("Triangle"));
    registry
        .validate(&series, series.type_key())
        .expect("Excitation should validate");
}

#[test]
fn test_fscv_background_subtracted_series() {
    let registry = SchemaRegistry::with_builtin().unwrap();
    let mut graph = RecordingGraph::new("constructors", "mock session");
    let id = MockBackground {
        name: Some("test_fscv_background_subtracted_series".into()),
        ..Default::default()
    }
    .add_to(&mut graph, &registry)
    .unwrap();

    let series = graph.series(id).unwrap();
    assert_eq!(series.unit(), "amperes");
    let view = FscvBackgroundSubtractedSeries::new(series).unwrap();
    assert_eq!(view.num_electrodes(), 4);
    let response_id = view.response_series().expect("Response not linked");
    let response = graph.series(response_id).unwrap();
    assert!(FscvResponseSeries::new(response).is_some());
}

#[test]
fn test_mock_names_are_unique() {
    let registry = SchemaRegistry::with_builtin().unwrap();
    let a = MockExcitation::default().build(&registry).unwrap();
    let b = MockExcitation::default().build(&registry).unwrap();
    assert_ne!(a.name(), b.name());
}
