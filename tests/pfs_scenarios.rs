use std::path::PathBuf;

use medicare_repricer_rs::config::EngineConfig;
use medicare_repricer_rs::orchestrator::RepricingEngine;
use medicare_repricer_rs::pfs;

fn fixture_engine() -> RepricingEngine {
    let data_directory = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/data");
    let config = EngineConfig::new(data_directory);
    RepricingEngine::new(&config).expect("fixture data must load")
}

#[test]
fn allowed_amount_is_monotone_in_work_rvu() {
    let engine = fixture_engine();
    let store = engine.data_store();

    // 20610 has a smaller work RVU than 29826; holding GPCI/locality/POS
    // fixed, the higher-work-RVU code must never price lower.
    let lower = pfs::calculate(store, "20610", &[], "11", Some("01"), None, 1, 1);
    let higher = pfs::calculate(store, "29826", &[], "11", Some("01"), None, 1, 1);
    assert!(higher.allowed >= lower.allowed);
}

#[test]
fn mppr_ineligible_code_is_unaffected_by_rank() {
    let engine = fixture_engine();
    let store = engine.data_store();

    let rank_one = pfs::calculate(store, "99213", &[], "11", Some("01"), None, 1, 1);
    let rank_two = pfs::calculate(store, "99213", &[], "11", Some("01"), None, 1, 2);
    assert_eq!(rank_one.allowed, rank_two.allowed);
}

#[test]
fn units_scale_the_allowed_amount_linearly() {
    let engine = fixture_engine();
    let store = engine.data_store();

    let one = pfs::calculate(store, "99213", &[], "11", Some("01"), None, 1, 1);
    let five = pfs::calculate(store, "99213", &[], "11", Some("01"), None, 5, 1);
    let expected = pfs::round_cents(one.allowed * 5.0);
    assert!((five.allowed - expected).abs() < 0.01);
}

#[test]
fn unknown_modifier_emits_a_warning_but_still_prices_the_line() {
    let engine = fixture_engine();
    let store = engine.data_store();

    let outcome = pfs::calculate(
        store,
        "99213",
        &["ZZ".to_string()],
        "11",
        Some("01"),
        None,
        1,
        1,
    );
    assert!(!outcome.has_fatal_error());
    assert!(outcome.allowed > 0.0);
    assert!(outcome
        .diagnostics
        .iter()
        .any(|d| !d.is_fatal() && d.message.contains("unknown modifier")));
}

#[test]
fn professional_and_technical_components_sum_to_the_unmodified_amount() {
    let engine = fixture_engine();
    let store = engine.data_store();

    let unmodified = pfs::calculate(store, "71046", &[], "22", Some("01"), None, 1, 1);
    let professional = pfs::calculate(
        store,
        "71046",
        &["26".to_string()],
        "22",
        Some("01"),
        None,
        1,
        1,
    );
    let technical = pfs::calculate(
        store,
        "71046",
        &["TC".to_string()],
        "22",
        Some("01"),
        None,
        1,
        1,
    );
    let recombined = professional.allowed + technical.allowed;
    assert!((recombined - unmodified.allowed).abs() < 0.02);
}
