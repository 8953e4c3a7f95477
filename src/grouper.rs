//! MS-DRG Grouper (§4.4): rule-driven classification of an inpatient
//! encounter into one of the MDC/DRG families declared in the grouping-rule
//! data file.

use tracing::{debug, warn};

use crate::data_store::{normalize_code, DataStore};
use crate::types::{DrgType, GrouperInput, GrouperOutput, Sex};

const UNASSIGNED_MDC: &str = "00";

/// Assign an MS-DRG to one clinical case per §4.4.
pub fn assign_drg(data_store: &DataStore, input: &GrouperInput) -> GrouperOutput {
    if input.principal_diagnosis.trim().is_empty() {
        return GrouperOutput::ungroupable("principal diagnosis is required");
    }
    if input.age > 120 {
        return GrouperOutput::ungroupable(format!("age {} is outside [0, 120]", input.age));
    }
    if input.sex == Sex::Invalid {
        return GrouperOutput::ungroupable("sex must be one of M, F, U");
    }

    let principal = normalize_code(&input.principal_diagnosis);
    let secondary: Vec<String> = input.secondary_diagnoses.iter().map(|c| normalize_code(c)).collect();
    let procedures: Vec<String> = input.procedures.iter().map(|c| normalize_code(c)).collect();

    let mut warnings = Vec::new();

    let (mdc, mdc_description) = match data_store.lookup_diagnosis(&principal) {
        Some(entry) => {
            let mdc = entry.mdc.clone();
            let description = data_store
                .mdc_definition(&mdc)
                .map(|d| d.name.clone())
                .unwrap_or_default();
            (mdc, description)
        }
        None => {
            warnings.push(format!(
                "principal diagnosis {principal} not found; defaulted to MDC {UNASSIGNED_MDC}"
            ));
            (UNASSIGNED_MDC.to_string(), String::new())
        }
    };

    let mut mcc_list = Vec::new();
    let mut cc_list = Vec::new();
    for code in &secondary {
        match data_store.lookup_diagnosis(code) {
            Some(entry) if entry.is_mcc => mcc_list.push(code.clone()),
            Some(entry) if entry.is_cc => cc_list.push(code.clone()),
            Some(_) => {}
            None => warnings.push(format!("secondary diagnosis {code} not found")),
        }
    }
    let has_mcc = !mcc_list.is_empty();
    let has_cc = !cc_list.is_empty();

    let mut has_or_procedure = false;
    for code in &procedures {
        match data_store.lookup_procedure(code) {
            Some(entry) if entry.is_or_procedure => has_or_procedure = true,
            Some(_) => {}
            None => {
                warnings.push(format!(
                    "procedure {code} not found; treated as non-OR"
                ));
            }
        }
    }
    let drg_type = if has_or_procedure {
        DrgType::Surgical
    } else {
        DrgType::Medical
    };

    let candidate_codes: &[String] = if has_or_procedure { &procedures } else {
        // Medical families match against diagnosis codes: principal first,
        // then secondaries.
        &secondary
    };

    let rule = data_store
        .rules_for_mdc_and_branch(&mdc, drg_type)
        .find(|rule| {
            if has_or_procedure {
                candidate_codes.iter().any(|code| rule.matches(code))
            } else {
                rule.matches(&principal) || candidate_codes.iter().any(|code| rule.matches(code))
            }
        });

    let rule = match rule {
        Some(rule) => rule,
        None => {
            let mut output = GrouperOutput::ungroupable(format!(
                "no grouping rule matched for MDC {mdc} branch {drg_type:?}"
            ));
            output.mdc = mdc;
            output.mdc_description = mdc_description;
            output.drg_type = drg_type;
            output.has_mcc = has_mcc;
            output.has_cc = has_cc;
            output.mcc_list = mcc_list;
            output.cc_list = cc_list;
            output.warnings = warnings;
            return output;
        }
    };

    debug!(mdc, ?drg_type, description = %rule.rule.description, "matched grouping rule family");

    let (resolved_code, fell_back) = rule.rule.severity.resolve(has_mcc, has_cc);
    if fell_back {
        warnings.push("severity_slot_fallback: preferred DRG severity slot absent, used next-lower slot".to_string());
        warn!(mdc, "grouper fell back to a lower-severity DRG slot");
    }

    let resolved_code = match resolved_code {
        Some(code) => code,
        None => {
            let mut output = GrouperOutput::ungroupable(format!(
                "no DRG severity slot resolved for family {} in MDC {mdc}",
                rule.rule.description
            ));
            output.mdc = mdc;
            output.mdc_description = mdc_description;
            output.drg_type = drg_type;
            output.has_mcc = has_mcc;
            output.has_cc = has_cc;
            output.mcc_list = mcc_list;
            output.cc_list = cc_list;
            output.warnings = warnings;
            return output;
        }
    };

    let ms_drg_record = match data_store.get_msdrg(resolved_code) {
        Some(record) => record,
        None => {
            let mut output = GrouperOutput::ungroupable(format!(
                "DRG {resolved_code} has no reference record"
            ));
            output.mdc = mdc;
            output.mdc_description = mdc_description;
            output.drg_type = drg_type;
            output.has_mcc = has_mcc;
            output.has_cc = has_cc;
            output.mcc_list = mcc_list;
            output.cc_list = cc_list;
            output.warnings = warnings;
            return output;
        }
    };

    GrouperOutput {
        ms_drg: ms_drg_record.ms_drg.clone(),
        description: ms_drg_record.description.clone(),
        mdc,
        mdc_description,
        drg_type,
        has_mcc,
        has_cc,
        mcc_list,
        cc_list,
        relative_weight: ms_drg_record.relative_weight,
        geometric_mean_los: ms_drg_record.geometric_mean_los,
        arithmetic_mean_los: ms_drg_record.arithmetic_mean_los,
        grouping_version: crate::types::GROUPING_VERSION.to_string(),
        warnings,
        errors: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sex;
    use std::path::PathBuf;

    fn fixture_store() -> DataStore {
        DataStore::load(
            &PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/data"),
            crate::data_store::DEFAULT_CONVERSION_FACTOR,
        )
        .expect("fixture data directory must load")
    }

    fn input(principal: &str) -> GrouperInput {
        GrouperInput {
            principal_diagnosis: principal.to_string(),
            secondary_diagnoses: Vec::new(),
            procedures: Vec::new(),
            age: 72,
            sex: Sex::F,
            discharge_status: None,
            length_of_stay: None,
        }
    }

    #[test]
    fn hip_replacement_groups_to_without_cc_mcc() {
        let store = fixture_store();
        let mut case = input("M16.11");
        case.procedures = vec!["0SR9019".to_string()];
        let output = assign_drg(&store, &case);
        assert_eq!(output.mdc, "08");
        assert_eq!(output.drg_type, DrgType::Surgical);
        assert_eq!(output.ms_drg, "470");
        assert!(!output.has_mcc);
    }

    #[test]
    fn septicemia_with_mccs_groups_to_mcc_slot() {
        let store = fixture_store();
        let mut case = input("A41.9");
        case.secondary_diagnoses = vec!["R65.20".to_string(), "N17.9".to_string()];
        case.age = 82;
        case.sex = Sex::M;
        let output = assign_drg(&store, &case);
        assert_eq!(output.mdc, "18");
        assert!(output.has_mcc);
        assert_eq!(output.ms_drg, "871");
    }

    #[test]
    fn empty_principal_diagnosis_is_ungroupable() {
        let store = fixture_store();
        let case = input("");
        let output = assign_drg(&store, &case);
        assert!(!output.is_groupable());
        assert!(!output.errors.is_empty());
    }

    #[test]
    fn age_out_of_range_is_ungroupable() {
        let store = fixture_store();
        let mut case = input("M16.11");
        case.age = 200;
        let output = assign_drg(&store, &case);
        assert!(!output.is_groupable());
    }

    #[test]
    fn invalid_sex_is_ungroupable() {
        let store = fixture_store();
        let mut case = input("M16.11");
        case.sex = Sex::Invalid;
        let output = assign_drg(&store, &case);
        assert!(!output.is_groupable());
        assert!(output.errors.iter().any(|e| e.contains("sex")));
    }

    #[test]
    fn unrecognized_sex_value_deserializes_to_invalid_instead_of_failing() {
        let value: Sex = serde_json::from_str("\"X\"").expect("serde(other) must catch unknown sex");
        assert_eq!(value, Sex::Invalid);
    }

    #[test]
    fn unknown_principal_diagnosis_defaults_to_unassigned_mdc() {
        let store = fixture_store();
        let case = input("Z99.99999");
        let output = assign_drg(&store, &case);
        assert_eq!(output.mdc, UNASSIGNED_MDC);
        assert!(output.warnings.iter().any(|w| w.contains("defaulted")));
    }

    #[test]
    fn mcc_takes_precedence_over_cc_when_both_present() {
        let store = fixture_store();
        let mut case = input("A41.9");
        // R65.20 is flagged MCC in fixture data; N17.9 also MCC.
        case.secondary_diagnoses = vec!["R65.20".to_string()];
        let output = assign_drg(&store, &case);
        assert!(output.has_mcc);
        assert!(output.cc_list.is_empty());
    }
}
