//! Integration tests for the schema registry.

use ndx_fscv::core::DataArray;
use ndx_fscv::schema::{load_namespace, AttributeSpec, SchemaRegistry, SharedRegistry, TypeDefinition, TypeKey};
use ndx_fscv::series::SeriesInstance;
use ndx_fscv::util::{Dtype, SchemaError, ValidationError};
use ndx_fscv::{fscv, Error};

#[test]
fn test_deep_chain_resolves() {
    let mut registry = SchemaRegistry::new();
    registry
        .register(TypeDefinition::new("deep", "T0", "1").attribute(AttributeSpec::scalar("a0", Dtype::Int32)))
        .unwrap();
    for i in 1..64 {
        let def = TypeDefinition::new("deep", &format!("T{}", i), "1")
            .extends(&format!("T{}", i - 1))
            .attribute(AttributeSpec::scalar(&format!("a{}", i), Dtype::Int32).optional());
        registry.register(def).expect("Chain registration failed");
    }

    let leaf = TypeKey::new("deep", "T63", "1");
    let attrs = registry.resolve_attributes(&leaf).unwrap();
    assert_eq!(attrs.len(), 64);
    assert_eq!(attrs[0].name, "a0");
    assert_eq!(attrs[63].name, "a63");
    assert!(registry.is_a(&leaf, &TypeKey::new("deep", "T0", "1")));
    assert_eq!(registry.lineage(&leaf).count(), 64);
}

#[test]
fn test_cycle_in_namespace_document() {
    let json = r#"{
        "name": "loop",
        "version": "1.0.0",
        "types": [
            { "name": "A", "parent": "B" },
            { "name": "B", "parent": "A" }
        ]
    }"#;
    let mut registry = SchemaRegistry::new();
    let err = load_namespace(&mut registry, json).unwrap_err();
    println!("Error: {}", err);
    assert!(matches!(err, Error::Schema(SchemaError::CyclicInheritance { .. })));
}

#[test]
fn test_builtin_registration_is_idempotent() {
    let mut registry = SchemaRegistry::with_builtin().unwrap();
    let before = registry.type_keys().count();
    registry
        .register_namespace(&ndx_fscv::schema::fscv_namespace())
        .expect("Re-registering identical definitions should be a no-op");
    assert_eq!(registry.type_keys().count(), before);

    let changed = TypeDefinition::new(fscv::NAMESPACE, fscv::EXCITATION_SERIES, fscv::VERSION)
        .extends("TimeSeries")
        .doc("changed");
    let err = registry.register(changed).unwrap_err();
    assert!(matches!(err, Error::Schema(SchemaError::DuplicateType { .. })));
}

#[test]
fn test_new_version_narrows_optional_to_required() {
    let mut registry = SchemaRegistry::with_builtin().unwrap();
    let v2 = TypeDefinition::new(fscv::NAMESPACE, fscv::RESPONSE_SERIES, "0.2.0")
        .extends("TimeSeries")
        .attribute(AttributeSpec::array("data", Dtype::Float64).dims(&["num_timepoints", "num_electrodes"]))
        .attribute(AttributeSpec::scalar("unit", Dtype::Text).fixed("amperes"))
        .attribute(AttributeSpec::scalar("current_to_voltage_factor", Dtype::Float64));
    registry.register(v2).unwrap();

    let latest = registry.latest(fscv::NAMESPACE, fscv::RESPONSE_SERIES).unwrap();
    assert_eq!(latest.version, "0.2.0");
    let spec = registry.attribute(latest, "current_to_voltage_factor").unwrap();
    assert!(spec.required);
    // The published version is untouched.
    let old = registry.attribute(&fscv::response_key(), "current_to_voltage_factor").unwrap();
    assert!(!old.required);
}

#[test]
fn test_missing_timing_rejected() {
    let registry = SchemaRegistry::with_builtin().unwrap();
    let err = SeriesInstance::builder(fscv::excitation_key(), "no_timing")
        .description("ramp")
        .data(DataArray::from_vec(vec![0.0; 10]))
        .attribute("scan_frequency", 10.0)
        .attribute("sweep_rate", 400.0)
        .attribute("waveform_shape", "Triangle")
        .build(&registry)
        .unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::TimingInvariantViolation(_))));
}

#[test]
fn test_shared_registry_refuses_after_freeze() {
    let shared = SharedRegistry::new(SchemaRegistry::with_builtin().unwrap());
    shared
        .register(TypeDefinition::new("lab", "Extra", "1").extends("Missing"))
        .expect_err("Unknown parent should fail");
    shared.freeze();
    assert!(shared.is_frozen());
    let err = shared.register(TypeDefinition::new("lab", "Extra", "1")).unwrap_err();
    assert!(matches!(err, Error::Schema(SchemaError::Frozen)));
}

#[test]
fn test_padded_version_is_a_distinct_triple() {
    let mut registry = SchemaRegistry::new();
    registry.register(TypeDefinition::new("lab", "A", "1")).unwrap();
    registry
        .register(TypeDefinition::new("lab", "A", "01").doc("padded"))
        .expect("Different version strings are different triples");
    assert_eq!(registry.type_keys().count(), 2);
    assert!(registry.contains(&TypeKey::new("lab", "A", "01")));
}
