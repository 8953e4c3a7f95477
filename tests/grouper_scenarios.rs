use std::path::PathBuf;

use medicare_repricer_rs::config::EngineConfig;
use medicare_repricer_rs::orchestrator::RepricingEngine;
use medicare_repricer_rs::types::{DrgType, GrouperInput, Sex};

fn fixture_engine() -> RepricingEngine {
    let data_directory = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/data");
    let config = EngineConfig::new(data_directory);
    RepricingEngine::new(&config).expect("fixture data must load")
}

#[test]
fn hip_replacement_groups_to_surgical_without_cc_mcc() {
    let engine = fixture_engine();
    let input = GrouperInput {
        principal_diagnosis: "M16.11".to_string(),
        secondary_diagnoses: Vec::new(),
        procedures: vec!["0SR9019".to_string()],
        age: 72,
        sex: Sex::F,
        discharge_status: None,
        length_of_stay: None,
    };
    let output = engine.assign_drg(&input);
    assert_eq!(output.mdc, "08");
    assert_eq!(output.drg_type, DrgType::Surgical);
    assert_eq!(output.ms_drg, "470");
    assert!(output.is_groupable());
}

#[test]
fn septicemia_with_mccs_groups_to_mcc_slot() {
    let engine = fixture_engine();
    let input = GrouperInput {
        principal_diagnosis: "A41.9".to_string(),
        secondary_diagnoses: vec!["R65.20".to_string(), "N17.9".to_string()],
        procedures: Vec::new(),
        age: 82,
        sex: Sex::M,
        discharge_status: None,
        length_of_stay: None,
    };
    let output = engine.assign_drg(&input);
    assert_eq!(output.mdc, "18");
    assert!(output.has_mcc);
    assert_eq!(output.ms_drg, "871");
    assert_eq!(output.drg_type, DrgType::Medical);
}

#[test]
fn resolved_drg_always_belongs_to_the_matched_family() {
    let engine = fixture_engine();
    let input = GrouperInput {
        principal_diagnosis: "M16.11".to_string(),
        secondary_diagnoses: Vec::new(),
        procedures: vec!["0SR9019".to_string()],
        age: 65,
        sex: Sex::M,
        discharge_status: None,
        length_of_stay: None,
    };
    let output = engine.assign_drg(&input);
    assert!(["469", "470"].contains(&output.ms_drg.as_str()));
}

#[test]
fn ungroupable_case_carries_an_explanatory_error() {
    let engine = fixture_engine();
    let input = GrouperInput {
        principal_diagnosis: String::new(),
        secondary_diagnoses: Vec::new(),
        procedures: Vec::new(),
        age: 50,
        sex: Sex::U,
        discharge_status: None,
        length_of_stay: None,
    };
    let output = engine.assign_drg(&input);
    assert!(!output.is_groupable());
    assert!(!output.errors.is_empty());
}
