use std::path::PathBuf;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use medicare_repricer_rs::config::EngineConfig;
use medicare_repricer_rs::orchestrator::RepricingEngine;
use medicare_repricer_rs::types::{Claim, ClaimLine, GrouperInput, Sex};

fn fixture_engine() -> RepricingEngine {
    let data_directory = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/data");
    let config = EngineConfig::new(data_directory);
    RepricingEngine::new(&config).expect("fixture data must load")
}

fn synthetic_claim(line_count: u32) -> Claim {
    let lines = (1..=line_count)
        .map(|line_number| ClaimLine {
            line_number,
            procedure_code: Some("99213".to_string()),
            place_of_service: Some("11".to_string()),
            modifiers: Vec::new(),
            locality: Some("01".to_string()),
            zip: None,
            units: 1,
            ms_drg_code: None,
            provider_number: None,
            total_charges: None,
            covered_days: None,
        })
        .collect();
    Claim {
        claim_id: "BENCH-CLAIM".to_string(),
        patient_id: None,
        diagnosis_codes: None,
        lines,
    }
}

fn bench_reprice_claim(c: &mut Criterion) {
    let engine = fixture_engine();
    let mut group = c.benchmark_group("reprice_claim");
    for &line_count in &[1u32, 10, 50] {
        let claim = synthetic_claim(line_count);
        group.bench_with_input(
            BenchmarkId::from_parameter(line_count),
            &claim,
            |b, claim| {
                b.iter(|| engine.reprice_claim(claim).expect("claim must reprice"));
            },
        );
    }
    group.finish();
}

fn bench_assign_drg(c: &mut Criterion) {
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
    c.bench_function("assign_drg", |b| {
        b.iter(|| engine.assign_drg(&input));
    });
}

criterion_group!(benches, bench_reprice_claim, bench_assign_drg);
criterion_main!(benches);
