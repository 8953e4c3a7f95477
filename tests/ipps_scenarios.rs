use std::path::PathBuf;

use medicare_repricer_rs::config::EngineConfig;
use medicare_repricer_rs::ipps;
use medicare_repricer_rs::orchestrator::RepricingEngine;

fn fixture_engine() -> RepricingEngine {
    let data_directory = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/data");
    let config = EngineConfig::new(data_directory);
    RepricingEngine::new(&config).expect("fixture data must load")
}

#[test]
fn base_payment_is_exactly_operating_plus_capital() {
    let engine = fixture_engine();
    let store = engine.data_store();
    let outcome = ipps::calculate(store, "469", "123456", 100_000.0, Some(5));
    let derivation = outcome.derivation.unwrap();
    assert!(
        (derivation.base_payment - (derivation.operating_payment + derivation.capital_payment))
            .abs()
            < 1e-9
    );
}

#[test]
fn outlier_is_zero_when_estimated_cost_does_not_exceed_threshold_plus_adjusted_base() {
    let engine = fixture_engine();
    let store = engine.data_store();
    let outcome = ipps::calculate(store, "470", "654321", 1_000.0, Some(1));
    let derivation = outcome.derivation.unwrap();
    assert_eq!(derivation.outlier_payment, 0.0);
}

#[test]
fn higher_relative_weight_drg_prices_higher_all_else_equal() {
    let engine = fixture_engine();
    let store = engine.data_store();
    // 469 (w/ MCC, weight 3.1234) vs 470 (w/o MCC, weight 1.9822) on the
    // same non-teaching, non-DSH hospital.
    let heavier = ipps::calculate(store, "469", "654321", 20_000.0, Some(4));
    let lighter = ipps::calculate(store, "470", "654321", 20_000.0, Some(4));
    assert!(heavier.allowed > lighter.allowed);
}

#[test]
fn covered_days_is_carried_through_without_affecting_payment() {
    let engine = fixture_engine();
    let store = engine.data_store();
    let short_stay = ipps::calculate(store, "470", "654321", 20_000.0, Some(1));
    let long_stay = ipps::calculate(store, "470", "654321", 20_000.0, Some(30));
    assert_eq!(short_stay.allowed, long_stay.allowed);
    assert_eq!(long_stay.derivation.unwrap().covered_days, Some(30));
}
