//! Inpatient Prospective Payment System Calculator (§4.5): MS-DRG weighted
//! base payment with wage-index, IME, DSH, and outlier adjustments.

use tracing::trace;

use crate::data_store::{
    DataStore, IME_EXPONENT, IME_FACTOR_C, IME_IRB_SHIFT, IPPS_CAPITAL_STANDARDIZED_AMOUNT,
    IPPS_LABOR_SHARE, IPPS_OPERATING_STANDARDIZED_AMOUNT, OUTLIER_FIXED_LOSS_THRESHOLD,
    OUTLIER_MARGINAL_COST_TO_CHARGE_RATIO, OUTLIER_PAYOUT_RATE, DSH_SIMPLIFIED_FACTOR,
};
use crate::pfs::round_cents;
use crate::types::{DiagnosticCode, IppsDerivation, LineDiagnostic};

/// Outcome of one IPPS pricing call.
pub struct IppsOutcome {
    pub allowed: f64,
    pub derivation: Option<IppsDerivation>,
    pub diagnostics: Vec<LineDiagnostic>,
}

impl IppsOutcome {
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

/// Price one IPPS line per §4.5.
pub fn calculate(
    data_store: &DataStore,
    ms_drg: &str,
    provider_number: &str,
    total_charges: f64,
    covered_days: Option<u32>,
) -> IppsOutcome {
    let drg_record = match data_store.get_msdrg(ms_drg) {
        Some(record) => record,
        None => {
            return IppsOutcome::fatal(LineDiagnostic::error(
                DiagnosticCode::DrgNotFound,
                format!("MS-DRG {ms_drg} not found"),
            ));
        }
    };

    let hospital = match data_store.get_hospital(provider_number) {
        Some(record) => record,
        None => {
            return IppsOutcome::fatal(LineDiagnostic::error(
                DiagnosticCode::HospitalNotFound,
                format!("provider {provider_number} not found"),
            ));
        }
    };

    let wage_index = match hospital.wage_index {
        Some(wage_index) => wage_index,
        None => match data_store.get_wage_index(&hospital.cbsa_code) {
            Some(record) => record.wage_index,
            None => {
                return IppsOutcome::fatal(LineDiagnostic::error(
                    DiagnosticCode::WageIndexNotFound,
                    format!(
                        "neither hospital {provider_number} nor CBSA {} has a wage index",
                        hospital.cbsa_code
                    ),
                ));
            }
        },
    };

    let capital_wage_index = hospital.capital_wage_index.unwrap_or_else(|| {
        data_store
            .get_wage_index(&hospital.cbsa_code)
            .map(|record| record.capital_gaf())
            .unwrap_or(wage_index)
    });

    let drg_weight = drg_record.relative_weight;

    let operating_payment = ((IPPS_OPERATING_STANDARDIZED_AMOUNT * IPPS_LABOR_SHARE * wage_index)
        + (IPPS_OPERATING_STANDARDIZED_AMOUNT * (1.0 - IPPS_LABOR_SHARE)))
        * drg_weight;

    let capital_payment = IPPS_CAPITAL_STANDARDIZED_AMOUNT * capital_wage_index * drg_weight;

    let base_payment = operating_payment + capital_payment;

    let ime_amount = if hospital.is_teaching_hospital {
        let irb = hospital.intern_resident_to_bed_ratio.unwrap_or(0.0);
        let ime_multiplier =
            IME_FACTOR_C * ((irb + IME_IRB_SHIFT).powf(IME_EXPONENT) - 1.0);
        base_payment * ime_multiplier
    } else {
        0.0
    };

    let dsh_amount = if hospital.is_dsh_hospital {
        let dsh_percentage = hospital.dsh_patient_percentage.unwrap_or(0.0);
        let dsh_multiplier = (dsh_percentage / 100.0).sqrt() * DSH_SIMPLIFIED_FACTOR;
        base_payment * dsh_multiplier
    } else {
        0.0
    };

    let estimated_cost = total_charges * OUTLIER_MARGINAL_COST_TO_CHARGE_RATIO;
    let adjusted_base = base_payment + ime_amount + dsh_amount;
    let excess = estimated_cost - adjusted_base;
    let outlier_payment = if excess > OUTLIER_FIXED_LOSS_THRESHOLD {
        (excess - OUTLIER_FIXED_LOSS_THRESHOLD) * OUTLIER_PAYOUT_RATE
    } else {
        0.0
    };

    let allowed = round_cents(base_payment + ime_amount + dsh_amount + outlier_payment);

    trace!(
        ms_drg,
        provider_number,
        wage_index,
        base_payment,
        ime_amount,
        dsh_amount,
        outlier_payment,
        allowed,
        "priced IPPS line"
    );

    IppsOutcome {
        allowed,
        derivation: Some(IppsDerivation {
            ms_drg: ms_drg.to_string(),
            relative_weight: drg_weight,
            wage_index,
            capital_wage_index,
            operating_payment,
            capital_payment,
            base_payment,
            ime_amount,
            dsh_amount,
            outlier_payment,
            hospital_name: hospital.hospital_name.clone(),
            covered_days,
        }),
        diagnostics: Vec::new(),
    }
}
