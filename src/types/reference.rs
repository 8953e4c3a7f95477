//! Reference entities loaded once from the data directory and held read-only
//! for the engine's lifetime. See [`crate::data_store::DataStore`].

use serde::{Deserialize, Serialize};

use super::common::DrgType;

/// One row of the Physician Fee Schedule relative value file, keyed by
/// `(procedure_code, modifier)` in the store.
///
/// Facility and non-facility RVU triples are both carried since the PFS
/// calculator chooses between them per line based on place of service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RvuRecord {
    pub procedure_code: String,
    #[serde(default)]
    pub modifier: Option<String>,
    pub description: String,
    pub work_rvu_nf: f64,
    pub pe_rvu_nf: f64,
    pub mp_rvu_nf: f64,
    pub work_rvu_f: f64,
    pub pe_rvu_f: f64,
    pub mp_rvu_f: f64,
    /// 0 = not subject to MPPR, 2 = subject to the 50% secondary-procedure
    /// reduction.
    pub mp_indicator: u8,
}

impl RvuRecord {
    /// The (work, pe, mp) triple for the given facility setting.
    pub fn triple(&self, facility: bool) -> (f64, f64, f64) {
        if facility {
            (self.work_rvu_f, self.pe_rvu_f, self.mp_rvu_f)
        } else {
            (self.work_rvu_nf, self.pe_rvu_nf, self.mp_rvu_nf)
        }
    }

    /// Whether this code is subject to Multiple Procedure Payment Reduction.
    pub fn mppr_eligible(&self) -> bool {
        self.mp_indicator == 2
    }
}

/// One row of the Geographic Practice Cost Index file, keyed by locality code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GpciRecord {
    pub locality: String,
    pub locality_name: String,
    pub work_gpci: f64,
    pub pe_gpci: f64,
    pub mp_gpci: f64,
}

/// Reserved locality code holding national-average GPCI factors; the
/// documented fallback when a claim's locality cannot be resolved.
pub const NATIONAL_AVERAGE_LOCALITY: &str = "00";

/// One row of the MS-DRG weight/length-of-stay table, keyed by 3-digit DRG.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MsDrgRecord {
    pub ms_drg: String,
    pub description: String,
    pub relative_weight: f64,
    pub geometric_mean_los: f64,
    pub arithmetic_mean_los: f64,
}

/// One row of the wage index file, keyed by CBSA code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WageIndexRecord {
    pub cbsa_code: String,
    pub area_name: String,
    pub wage_index: f64,
    #[serde(default)]
    pub capital_wage_index: Option<f64>,
}

impl WageIndexRecord {
    /// The capital geographic adjustment factor: the capital wage index when
    /// present, else the operating wage index.
    pub fn capital_gaf(&self) -> f64 {
        self.capital_wage_index.unwrap_or(self.wage_index)
    }
}

/// One row of the hospital provider file, keyed by 6-character provider number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HospitalRecord {
    pub provider_number: String,
    pub hospital_name: String,
    pub cbsa_code: String,
    /// Cached wage index for this provider. Present on essentially every
    /// real record; the IPPS calculator falls back to a CBSA lookup when
    /// absent.
    #[serde(default)]
    pub wage_index: Option<f64>,
    #[serde(default)]
    pub capital_wage_index: Option<f64>,
    pub is_teaching_hospital: bool,
    #[serde(default)]
    pub intern_resident_to_bed_ratio: Option<f64>,
    pub is_dsh_hospital: bool,
    #[serde(default)]
    pub dsh_patient_percentage: Option<f64>,
    pub is_rural: bool,
    #[serde(default)]
    pub bed_count: Option<u32>,
}

/// One row of the ICD-10-CM diagnosis table, keyed by code with the decimal
/// point stripped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosisEntry {
    pub code: String,
    pub description: String,
    /// Two-digit Major Diagnostic Category tag, "00"-"25".
    pub mdc: String,
    pub is_cc: bool,
    pub is_mcc: bool,
}

/// One row of the ICD-10-PCS procedure table, keyed by code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcedureEntry {
    pub code: String,
    pub description: String,
    pub is_or_procedure: bool,
    pub is_non_or_procedure: bool,
}

/// Human-readable metadata for a Major Diagnostic Category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MdcDefinition {
    pub mdc: String,
    pub name: String,
    pub body_system: String,
}

/// The severity-dependent DRG slots within one grouping-rule family.
///
/// Absence of a slot is legitimate data (not every family has an MCC- or
/// CC-specific DRG); the grouper falls back to the next-lower slot and warns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SeverityDrgMap {
    #[serde(default)]
    pub with_mcc: Option<String>,
    #[serde(default)]
    pub with_cc: Option<String>,
    #[serde(default)]
    pub without_cc_mcc: Option<String>,
}

impl SeverityDrgMap {
    /// Resolve a DRG code given the case's severity, falling back to the next
    /// lower severity slot when the preferred one is absent from the data
    /// file. Returns the resolved code plus whether a fallback occurred.
    pub fn resolve(&self, has_mcc: bool, has_cc: bool) -> (Option<&str>, bool) {
        let preferred = if has_mcc {
            &self.with_mcc
        } else if has_cc {
            &self.with_cc
        } else {
            &self.without_cc_mcc
        };
        if let Some(code) = preferred {
            return (Some(code.as_str()), false);
        }
        // Fall through lower-severity slots in order.
        let mut fell_back = false;
        if has_mcc {
            fell_back = true;
            if let Some(code) = &self.with_cc {
                return (Some(code.as_str()), fell_back);
            }
        }
        if has_mcc || has_cc {
            fell_back = true;
            if let Some(code) = &self.without_cc_mcc {
                return (Some(code.as_str()), fell_back);
            }
        }
        (None, fell_back)
    }
}

/// One procedure- or diagnosis-code pattern family within an MDC, mapping to
/// a severity-dependent MS-DRG.
///
/// Patterns are declared in data, not code, and are evaluated in file order —
/// the first whose pattern matches any of the case's codes wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupingRule {
    pub mdc: String,
    pub drg_type: DrgType,
    pub description: String,
    /// A code pattern: an exact code, a CMS-style prefix (e.g. `"027*"`), or
    /// a pattern using regex `.*` wildcards (e.g. `"027.*"`), matched against
    /// normalized (decimal-stripped, upper-cased) candidate codes.
    pub pattern: String,
    pub severity: SeverityDrgMap,
}
