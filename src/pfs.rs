//! Physician Fee Schedule Calculator (§4.3): RBRVS pricing with geographic
//! adjustment, facility/non-facility selection, modifier effects, and an
//! MPPR-aware entry point.

use tracing::trace;

use crate::data_store::DataStore;
use crate::locality;
use crate::types::{DiagnosticCode, LineDiagnostic, PfsDerivation, NATIONAL_AVERAGE_LOCALITY};

/// Place-of-service codes priced under the facility RVU regime (§4.3 step 1).
const FACILITY_POS_CODES: &[&str] = &[
    "21", "22", "23", "24", "26", "31", "34", "51", "52", "53", "56", "61",
];

fn is_facility_pos(pos: &str) -> bool {
    FACILITY_POS_CODES.contains(&pos)
}

/// Procedure-code prefixes the core explicitly refuses to price under PFS
/// (§7 `unsupported_service_type`, resolving the source's Open Question to
/// reject rather than silently price dental/DME codes).
fn is_unsupported_procedure_code(code: &str) -> bool {
    code.starts_with('D') || code.starts_with('d')
}

/// Outcome of one PFS pricing call: the rounded allowed amount, its full
/// derivation trail, and any diagnostics (fatal or warning) encountered.
pub struct PfsOutcome {
    pub allowed: f64,
    pub derivation: Option<PfsDerivation>,
    pub diagnostics: Vec<LineDiagnostic>,
}

impl PfsOutcome {
    fn fatal(diagnostic: LineDiagnostic) -> Self {
        Self {
            allowed: 0.0,
            derivation: None,
            diagnostics: vec![diagnostic],
        }
    }

    pub fn has_fatal_error(&self) -> bool {
        self.diagnostics.iter().any(LineDiagnostic::is_fatal)
    }
}

/// Price one PFS line per §4.3.
///
/// `rank` is assigned by the orchestrator's MPPR ranking pass (pass 1, §4.6);
/// callers outside that pipeline (e.g. the read-through `calculate_pfs_allowed`
/// API) pass `rank = 1` for a stand-alone, unreduced calculation.
#[allow(clippy::too_many_arguments)]
pub fn calculate(
    data_store: &DataStore,
    procedure_code: &str,
    modifiers: &[String],
    place_of_service: &str,
    locality: Option<&str>,
    zip: Option<&str>,
    units: u32,
    rank: u32,
) -> PfsOutcome {
    if locality.is_none() && zip.is_none() {
        return PfsOutcome::fatal(LineDiagnostic::error(
            DiagnosticCode::LocalityOrZipRequired,
            "locality or zip required",
        ));
    }

    if is_unsupported_procedure_code(procedure_code) {
        return PfsOutcome::fatal(LineDiagnostic::error(
            DiagnosticCode::UnsupportedServiceType,
            format!(
                "procedure code {procedure_code} is outside core PFS coverage (dental/DME)"
            ),
        ));
    }

    let facility_selected = is_facility_pos(place_of_service);
    let first_modifier = modifiers.first().map(String::as_str);

    let rvu = match data_store.get_rvu(procedure_code, first_modifier) {
        Some(rvu) => rvu,
        None => {
            return PfsOutcome::fatal(LineDiagnostic::error(
                DiagnosticCode::ProcedureCodeNotFound,
                format!("procedure code {procedure_code} not found"),
            ));
        }
    };

    let mut diagnostics = Vec::new();

    let resolved_locality = locality::resolve(data_store, locality, zip);
    if let Some(diagnostic) = resolved_locality.diagnostic {
        diagnostics.push(diagnostic);
    }

    let gpci = match data_store.get_gpci(&resolved_locality.locality) {
        Some(gpci) => gpci,
        None => {
            diagnostics.push(LineDiagnostic::warning(
                DiagnosticCode::LocalityDefaulted,
                format!(
                    "locality {} not found; defaulted to national average",
                    resolved_locality.locality
                ),
            ));
            data_store
                .get_gpci(NATIONAL_AVERAGE_LOCALITY)
                .expect("national-average GPCI row must be present")
        }
    };

    let (mut work_rvu, mut pe_rvu, mut mp_rvu) = rvu.triple(facility_selected);
    let mut modifier_trail = Vec::new();
    let mut multiplier = 1.0_f64;

    for modifier in modifiers {
        match modifier.as_str() {
            "26" => {
                pe_rvu = 0.0;
                modifier_trail.push("26: professional component, pe_rvu zeroed".to_string());
            }
            "TC" => {
                work_rvu = 0.0;
                mp_rvu = 0.0;
                modifier_trail
                    .push("TC: technical component, work_rvu and mp_rvu zeroed".to_string());
            }
            "50" => {
                multiplier *= 1.50;
                modifier_trail.push("50: bilateral, x1.50".to_string());
            }
            "52" | "53" => {
                multiplier *= 0.50;
                modifier_trail.push(format!("{modifier}: reduced/discontinued, x0.50"));
            }
            "76" | "77" => {
                modifier_trail.push(format!("{modifier}: repeat procedure, no adjustment"));
            }
            "59" | "XE" | "XU" | "XP" | "XS" => {
                modifier_trail.push(format!("{modifier}: distinct service, no adjustment"));
            }
            other => {
                modifier_trail.push(format!("{other}: unrecognized modifier, no adjustment"));
                diagnostics.push(LineDiagnostic::warning(
                    DiagnosticCode::UnknownModifier,
                    format!("unknown modifier {other}"),
                ));
            }
        }
    }

    let conversion_factor = data_store.conversion_factor();
    let base_payment = (work_rvu * gpci.work_gpci
        + pe_rvu * gpci.pe_gpci
        + mp_rvu * gpci.mp_gpci)
        * conversion_factor;

    let mut amount = base_payment * multiplier;

    let mppr_applied = rvu.mppr_eligible() && rank >= 2;
    if mppr_applied {
        amount *= 0.50;
        diagnostics.push(LineDiagnostic::info(
            DiagnosticCode::MpprApplied,
            "MPPR applied (50%)",
        ));
    }

    amount *= units as f64;

    let allowed = round_cents(amount);

    trace!(
        procedure_code,
        facility_selected,
        base_payment,
        mppr_applied,
        allowed,
        "priced PFS line"
    );

    PfsOutcome {
        allowed,
        derivation: Some(PfsDerivation {
            procedure_code: procedure_code.to_string(),
            facility_selected,
            work_rvu,
            pe_rvu,
            mp_rvu,
            work_gpci: gpci.work_gpci,
            pe_gpci: gpci.pe_gpci,
            mp_gpci: gpci.mp_gpci,
            conversion_factor,
            base_payment,
            modifier_trail,
            mppr_rank: Some(rank),
            mppr_applied,
            units,
        }),
        diagnostics,
    }
}

/// Round half-up to 2 decimal places (§4.3 step 9).
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture_store() -> DataStore {
        DataStore::load(
            &PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/data"),
            crate::data_store::DEFAULT_CONVERSION_FACTOR,
        )
        .expect("fixture data directory must load")
    }

    #[test]
    fn office_visit_prices_non_facility() {
        let store = fixture_store();
        let outcome = calculate(&store, "99213", &[], "11", Some("01"), None, 1, 1);
        assert!(!outcome.has_fatal_error());
        assert!(outcome.allowed > 0.0);
        let derivation = outcome.derivation.expect("pfs derivation");
        assert!(!derivation.facility_selected);
    }

    #[test]
    fn professional_component_reduces_allowed_amount() {
        let store = fixture_store();
        let unmodified = calculate(&store, "71046", &[], "22", Some("01"), None, 1, 1);
        let modifier_26 = calculate(
            &store,
            "71046",
            &["26".to_string()],
            "22",
            Some("01"),
            None,
            1,
            1,
        );
        assert!(modifier_26.allowed < unmodified.allowed);
        let derivation = modifier_26.derivation.expect("pfs derivation");
        assert_eq!(derivation.pe_rvu, 0.0);
    }

    #[test]
    fn bilateral_modifier_multiplies_by_one_point_five() {
        let store = fixture_store();
        let unmodified = calculate(&store, "20610", &[], "11", Some("01"), None, 1, 1);
        let bilateral = calculate(
            &store,
            "20610",
            &["50".to_string()],
            "11",
            Some("01"),
            None,
            1,
            1,
        );
        let expected = round_cents(unmodified.allowed * 1.5);
        assert!((bilateral.allowed - expected).abs() < 0.01);
    }

    #[test]
    fn mppr_rank_one_is_never_reduced() {
        let store = fixture_store();
        let rank_one = calculate(&store, "29826", &[], "11", Some("01"), None, 1, 1);
        let rank_two_no_mppr_code = calculate(&store, "99213", &[], "11", Some("01"), None, 1, 2);
        // A non-MPPR-eligible code must price identically regardless of rank.
        let rank_one_same = calculate(&store, "99213", &[], "11", Some("01"), None, 1, 1);
        assert_eq!(rank_two_no_mppr_code.allowed, rank_one_same.allowed);
        assert!(rank_one.allowed > 0.0);
    }

    #[test]
    fn mppr_applies_fifty_percent_reduction_at_rank_two() {
        let store = fixture_store();
        let rank_one = calculate(&store, "29826", &[], "11", Some("01"), None, 1, 1);
        let rank_two = calculate(&store, "29826", &[], "11", Some("01"), None, 1, 2);
        let expected = round_cents(rank_one.allowed * 0.5);
        assert!((rank_two.allowed - expected).abs() < 0.01);
    }

    #[test]
    fn missing_procedure_code_is_fatal() {
        let store = fixture_store();
        let outcome = calculate(&store, "00000", &[], "11", Some("01"), None, 1, 1);
        assert!(outcome.has_fatal_error());
        assert_eq!(outcome.allowed, 0.0);
    }

    #[test]
    fn missing_locality_and_zip_is_fatal() {
        let store = fixture_store();
        let outcome = calculate(&store, "99213", &[], "11", None, None, 1, 1);
        assert!(outcome.has_fatal_error());
    }

    #[test]
    fn dental_code_is_unsupported_service_type() {
        let store = fixture_store();
        let outcome = calculate(&store, "D0120", &[], "11", Some("01"), None, 1, 1);
        assert!(outcome.has_fatal_error());
        assert!(outcome
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::UnsupportedServiceType));
    }

    #[test]
    fn units_multiply_allowed_amount() {
        let store = fixture_store();
        let one_unit = calculate(&store, "99213", &[], "11", Some("01"), None, 1, 1);
        let three_units = calculate(&store, "99213", &[], "11", Some("01"), None, 3, 1);
        let expected = round_cents(one_unit.allowed * 3.0);
        assert!((three_units.allowed - expected).abs() < 0.01);
    }
}
