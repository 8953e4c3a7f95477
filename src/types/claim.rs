//! The input claim/line shapes the engine consumes, and the output
//! priced-claim/line shapes it produces.

use serde::{Deserialize, Serialize};

use super::common::{LineDiagnostic, ServiceType};

/// One line item of an input claim.
///
/// Exactly one of `{locality, zip}` must be present for a PFS line (enforced
/// by the orchestrator, not by this type, since the requirement only applies
/// once the line is classified). IPPS lines use `procedure_code` as the
/// sentinel `"INPATIENT"` token and instead carry `ms_drg_code`,
/// `provider_number`, `total_charges`, and `covered_days`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimLine {
    pub line_number: u32,

    /// Required for PFS lines; the sentinel `"INPATIENT"` (or absent) for
    /// IPPS lines.
    #[serde(default)]
    pub procedure_code: Option<String>,

    /// Two-digit place-of-service code. Required for PFS lines.
    #[serde(default)]
    pub place_of_service: Option<String>,

    /// Up to two procedure modifiers, applied in the given order.
    #[serde(default)]
    pub modifiers: Vec<String>,

    #[serde(default)]
    pub locality: Option<String>,

    #[serde(default)]
    pub zip: Option<String>,

    #[serde(default = "default_units")]
    pub units: u32,

    // IPPS-only fields.
    #[serde(default)]
    pub ms_drg_code: Option<String>,
    #[serde(default)]
    pub provider_number: Option<String>,
    #[serde(default)]
    pub total_charges: Option<f64>,
    #[serde(default)]
    pub covered_days: Option<u32>,
}

fn default_units() -> u32 {
    1
}

/// Sentinel `procedure_code` marking an inpatient (IPPS) line.
pub const INPATIENT_SENTINEL: &str = "INPATIENT";

impl ClaimLine {
    /// Service type implied by line shape: IPPS when both `ms_drg_code` and
    /// `provider_number` are present, PFS otherwise. The orchestrator is
    /// responsible for treating a line that matches neither shape as
    /// unsupported.
    pub fn service_type(&self) -> Option<ServiceType> {
        if self.ms_drg_code.is_some() && self.provider_number.is_some() {
            Some(ServiceType::Ipps)
        } else if self.procedure_code.is_some() {
            Some(ServiceType::Pfs)
        } else {
            None
        }
    }
}

/// An input claim: one or more line items to reprice together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub claim_id: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub diagnosis_codes: Option<Vec<String>>,
    pub lines: Vec<ClaimLine>,
}

/// Derivation trail for a priced PFS line.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PfsDerivation {
    pub procedure_code: String,
    pub facility_selected: bool,
    pub work_rvu: f64,
    pub pe_rvu: f64,
    pub mp_rvu: f64,
    pub work_gpci: f64,
    pub pe_gpci: f64,
    pub mp_gpci: f64,
    pub conversion_factor: f64,
    /// Base payment after modifier component zeroing and GPCI/conversion,
    /// before the multiplicative modifier and MPPR factors.
    pub base_payment: f64,
    pub modifier_trail: Vec<String>,
    pub mppr_rank: Option<u32>,
    pub mppr_applied: bool,
    pub units: u32,
}

/// Derivation trail for a priced IPPS line.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IppsDerivation {
    pub ms_drg: String,
    pub relative_weight: f64,
    pub wage_index: f64,
    pub capital_wage_index: f64,
    pub operating_payment: f64,
    pub capital_payment: f64,
    pub base_payment: f64,
    pub ime_amount: f64,
    pub dsh_amount: f64,
    pub outlier_payment: f64,
    pub hospital_name: String,
    pub covered_days: Option<u32>,
}

/// The calculator-specific derivation trail for a repriced line, or `None`
/// when the line failed before a calculator could be dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineDerivation {
    Pfs(PfsDerivation),
    Ipps(IppsDerivation),
    None,
}

/// One priced/grouped line in a [`RepricedClaim`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepricedLine {
    pub line_number: u32,
    pub service_type: Option<ServiceType>,
    pub medicare_allowed: f64,
    pub derivation: LineDerivation,
    pub diagnostics: Vec<LineDiagnostic>,
}

impl RepricedLine {
    pub fn has_fatal_error(&self) -> bool {
        self.diagnostics.iter().any(LineDiagnostic::is_fatal)
    }
}

/// The priced claim returned by [`crate::orchestrator::RepricingEngine::reprice_claim`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepricedClaim {
    pub claim_id: String,
    pub lines: Vec<RepricedLine>,
    /// Sum of `medicare_allowed` over lines with no fatal diagnostic.
    pub total_allowed: f64,
}
