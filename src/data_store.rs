//! Reference Data Store (§4.1): loads a directory of normalized JSON files
//! once at engine construction and exposes O(1)-expected, read-only lookups.
//! No code path mutates these tables after [`DataStore::load`] returns.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::types::{
    DiagnosisEntry, DrgType, GpciRecord, GroupingRule, HospitalRecord, MdcDefinition,
    MsDrgRecord, ProcedureEntry, RvuRecord, WageIndexRecord,
};

// ---------------------------------------------------------------------------
// Plan-year scalar parameters (§4.1). These are fixed to one plan year at a
// time per the core's non-goals; re-pricing a prior year means constructing
// a different DataStore, not parameterizing this one further.
// ---------------------------------------------------------------------------

/// PFS conversion factor, plan year 2025, absent an `EngineConfig` override.
pub const DEFAULT_CONVERSION_FACTOR: f64 = 32.35;
pub const IPPS_OPERATING_STANDARDIZED_AMOUNT: f64 = 6690.00;
pub const IPPS_LABOR_SHARE: f64 = 0.676;
pub const IPPS_CAPITAL_STANDARDIZED_AMOUNT: f64 = 488.59;
pub const IME_FACTOR_C: f64 = 1.34;
pub const IME_EXPONENT: f64 = 0.405;
pub const IME_IRB_SHIFT: f64 = 0.4;
/// Project-specific simplification of the CMS DSH formula, not a regulatory
/// constant (see DESIGN.md).
pub const DSH_SIMPLIFIED_FACTOR: f64 = 0.35;
pub const OUTLIER_FIXED_LOSS_THRESHOLD: f64 = 46217.00;
pub const OUTLIER_MARGINAL_COST_TO_CHARGE_RATIO: f64 = 0.25;
pub const OUTLIER_PAYOUT_RATE: f64 = 0.80;

/// A [`GroupingRule`] with its code pattern pre-compiled to a regex, so the
/// grouper never recompiles a pattern per call.
#[derive(Debug, Clone)]
pub struct CompiledGroupingRule {
    pub rule: GroupingRule,
    pattern: Regex,
}

impl CompiledGroupingRule {
    fn compile(rule: GroupingRule) -> EngineResult<Self> {
        let anchored = format!("^{}$", rule.pattern);
        let pattern = Regex::new(&anchored).map_err(|e| EngineError::MalformedReferenceFile {
            file: "drg_grouping_rules.json".to_string(),
            source: serde_json::Error::custom(format!(
                "invalid grouping rule pattern {:?}: {e}",
                rule.pattern
            )),
        })?;
        Ok(Self { rule, pattern })
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.pattern.is_match(candidate)
    }
}

/// Minimal extension so we can synthesize a `serde_json::Error` for a
/// non-JSON validation failure (an invalid regex pattern) without inventing
/// a second error variant just for this one data-loading corner case.
trait CustomJsonError {
    fn custom(msg: impl std::fmt::Display) -> Self;
}

impl CustomJsonError for serde_json::Error {
    fn custom(msg: impl std::fmt::Display) -> Self {
        serde::de::Error::custom(msg)
    }
}

/// Normalize a diagnosis/procedure code the way the grouper and calculators
/// expect: strip decimal points, upper-case.
pub fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| *c != '.')
        .collect::<String>()
        .to_uppercase()
}

/// The loaded, read-only reference data for one plan year.
///
/// Held behind an `Arc` by [`crate::orchestrator::RepricingEngine`] so
/// sharing one store across worker threads needs no synchronization (§5).
#[derive(Debug)]
pub struct DataStore {
    rvu: HashMap<(String, Option<String>), RvuRecord>,
    gpci: HashMap<String, GpciRecord>,
    ms_drg: HashMap<String, MsDrgRecord>,
    wage_index: HashMap<String, WageIndexRecord>,
    hospital: HashMap<String, HospitalRecord>,
    diagnosis: HashMap<String, DiagnosisEntry>,
    procedure: HashMap<String, ProcedureEntry>,
    mdc_definitions: HashMap<String, MdcDefinition>,
    grouping_rules: HashMap<String, Vec<CompiledGroupingRule>>,
    /// Optional ZIP-3 -> locality map. Not one of the nine required
    /// reference files (§6 does not name a dedicated file for it); loaded
    /// from `zip_locality_data.json` when present, else empty, in which case
    /// every ZIP-based lookup defaults to the national-average locality per
    /// §4.2's documented fallback.
    zip_to_locality: HashMap<String, String>,
    conversion_factor: f64,
}

#[derive(Deserialize)]
struct Icd10CmEntryJson {
    description: String,
    mdc: String,
    is_cc: bool,
    is_mcc: bool,
}

#[derive(Deserialize)]
struct Icd10PcsEntryJson {
    description: String,
    is_or_procedure: bool,
    is_non_or_procedure: bool,
}

#[derive(Deserialize)]
struct ZipLocalityRow {
    zip_prefix: String,
    locality: String,
}

impl DataStore {
    /// Load every reference table from `data_directory`. A required file
    /// being missing, or the file as a whole not parsing as JSON, is a
    /// load-time error. A malformed *record* inside an otherwise-valid
    /// required file is skipped with a `warn!` and counted, not a hard
    /// failure — one corrupt row cannot block engine startup.
    pub fn load(data_directory: &Path, conversion_factor: f64) -> EngineResult<Self> {
        if !data_directory.is_dir() {
            return Err(EngineError::DataDirectoryNotFound(
                data_directory.to_path_buf(),
            ));
        }

        let rvu_records: Vec<RvuRecord> = read_required_array(data_directory, "rvu_data.json")?;
        let gpci_records: Vec<GpciRecord> = read_required_array(data_directory, "gpci_data.json")?;
        let ms_drg_records: Vec<MsDrgRecord> =
            read_required_array(data_directory, "ms_drg_data.json")?;
        let wage_index_records: Vec<WageIndexRecord> =
            read_required_array(data_directory, "wage_index_data.json")?;
        let hospital_records: Vec<HospitalRecord> =
            read_required_array(data_directory, "hospital_data.json")?;
        let diagnosis = read_icd10_cm(data_directory)?;
        let procedure = read_icd10_pcs(data_directory)?;
        let mdc_definitions: Vec<MdcDefinition> =
            read_required_array(data_directory, "mdc_definitions.json")?;
        let grouping_rules: Vec<GroupingRule> =
            read_required_array(data_directory, "drg_grouping_rules.json")?;
        let zip_rows: Vec<ZipLocalityRow> =
            read_optional_array(data_directory, "zip_locality_data.json")?;

        if !gpci_records
            .iter()
            .any(|g| g.locality == crate::types::NATIONAL_AVERAGE_LOCALITY)
        {
            warn!(
                "gpci_data.json has no \"00\" national-average row; locality fallback will fail"
            );
        }

        let mut rvu = HashMap::with_capacity(rvu_records.len());
        for record in rvu_records {
            rvu.insert(
                (record.procedure_code.clone(), record.modifier.clone()),
                record,
            );
        }

        let gpci = index_by(gpci_records, |r| r.locality.clone());
        let ms_drg = index_by(ms_drg_records, |r| r.ms_drg.clone());
        let wage_index = index_by(wage_index_records, |r| r.cbsa_code.clone());
        let hospital = index_by(hospital_records, |r| r.provider_number.clone());
        let mdc_definitions = index_by(mdc_definitions, |r| r.mdc.clone());

        let mut grouping_by_mdc: HashMap<String, Vec<CompiledGroupingRule>> = HashMap::new();
        for rule in grouping_rules {
            let mdc = rule.mdc.clone();
            let compiled = CompiledGroupingRule::compile(rule)?;
            grouping_by_mdc.entry(mdc).or_default().push(compiled);
        }

        let zip_to_locality = zip_rows
            .into_iter()
            .map(|row| (row.zip_prefix, row.locality))
            .collect::<HashMap<_, _>>();

        info!(
            rvu_rows = rvu.len(),
            gpci_rows = gpci.len(),
            ms_drg_rows = ms_drg.len(),
            wage_index_rows = wage_index.len(),
            hospital_rows = hospital.len(),
            diagnosis_rows = diagnosis.len(),
            procedure_rows = procedure.len(),
            mdc_count = mdc_definitions.len(),
            mdc_with_rules = grouping_by_mdc.len(),
            zip_prefixes = zip_to_locality.len(),
            "reference data loaded"
        );

        Ok(Self {
            rvu,
            gpci,
            ms_drg,
            wage_index,
            hospital,
            diagnosis,
            procedure,
            mdc_definitions,
            grouping_rules: grouping_by_mdc,
            zip_to_locality,
            conversion_factor,
        })
    }

    pub fn conversion_factor(&self) -> f64 {
        self.conversion_factor
    }

    /// Try `(code, modifier)` then fall back to `(code, None)` — CMS stores
    /// a modifier-specific row only when payment actually differs.
    pub fn get_rvu(&self, code: &str, modifier: Option<&str>) -> Option<&RvuRecord> {
        if let Some(m) = modifier {
            if let Some(record) = self.rvu.get(&(code.to_string(), Some(m.to_string()))) {
                return Some(record);
            }
        }
        self.rvu.get(&(code.to_string(), None))
    }

    pub fn get_gpci(&self, locality: &str) -> Option<&GpciRecord> {
        self.gpci.get(locality)
    }

    pub fn get_msdrg(&self, drg: &str) -> Option<&MsDrgRecord> {
        self.ms_drg.get(drg)
    }

    pub fn get_wage_index(&self, cbsa: &str) -> Option<&WageIndexRecord> {
        self.wage_index.get(cbsa)
    }

    pub fn get_hospital(&self, provider_number: &str) -> Option<&HospitalRecord> {
        self.hospital.get(provider_number)
    }

    pub fn lookup_diagnosis(&self, code: &str) -> Option<&DiagnosisEntry> {
        self.diagnosis.get(&normalize_code(code))
    }

    pub fn lookup_procedure(&self, code: &str) -> Option<&ProcedureEntry> {
        self.procedure.get(&normalize_code(code))
    }

    pub fn mdc_definition(&self, mdc: &str) -> Option<&MdcDefinition> {
        self.mdc_definitions.get(mdc)
    }

    /// Grouping rules declared for this MDC, in data-file order. Empty slice
    /// if the MDC has no family rules at all.
    pub fn rules_for_mdc(&self, mdc: &str) -> &[CompiledGroupingRule] {
        self.grouping_rules
            .get(mdc)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolve a 3-digit ZIP prefix to a locality code, if mapped.
    pub fn locality_for_zip_prefix(&self, zip_prefix: &str) -> Option<&str> {
        self.zip_to_locality.get(zip_prefix).map(String::as_str)
    }

    /// Rules of a given branch (surgical/medical) declared for an MDC, in
    /// file order. A convenience filter over [`Self::rules_for_mdc`] used by
    /// the grouper once surgical/medical branching is decided.
    pub fn rules_for_mdc_and_branch(
        &self,
        mdc: &str,
        drg_type: DrgType,
    ) -> impl Iterator<Item = &CompiledGroupingRule> {
        self.rules_for_mdc(mdc)
            .iter()
            .filter(move |r| r.rule.drg_type == drg_type)
    }
}

fn index_by<T, F: Fn(&T) -> String>(records: Vec<T>, key_fn: F) -> HashMap<String, T> {
    let mut map = HashMap::with_capacity(records.len());
    for record in records {
        let key = key_fn(&record);
        map.insert(key, record);
    }
    map
}

/// Read one reference file into a `serde_json::Value`. A missing required
/// file is a load-time error; a missing optional file warns and returns
/// `None`. Either way, the file existing but not parsing as JSON at all
/// (not just a bad record, but genuinely broken syntax) is also a load-time
/// error — there is no well-formed document to skip records out of.
fn read_json_value(
    dir: &Path,
    filename: &str,
    required: bool,
) -> EngineResult<Option<serde_json::Value>> {
    let path = dir.join(filename);
    if !path.exists() {
        if required {
            return Err(EngineError::RequiredFileMissing(filename.to_string()));
        }
        warn!(file = filename, "optional reference file not present");
        return Ok(None);
    }
    let file = File::open(&path).map_err(|source| EngineError::Io {
        file: filename.to_string(),
        source,
    })?;
    let reader = BufReader::new(file);
    let value = serde_json::from_reader(reader).map_err(|source| {
        EngineError::MalformedReferenceFile {
            file: filename.to_string(),
            source,
        }
    })?;
    Ok(Some(value))
}

/// Deserialize each element of a top-level JSON array independently,
/// skipping (and `warn!`-ing on, with a running count) any element that
/// fails to match `T` instead of failing the whole file. This is what makes
/// one corrupt `rvu_data.json` row, say, not block engine startup.
fn parse_array_tolerant<T: for<'de> Deserialize<'de>>(
    filename: &str,
    value: serde_json::Value,
) -> EngineResult<Vec<T>> {
    let serde_json::Value::Array(items) = value else {
        return Err(EngineError::MalformedReferenceFile {
            file: filename.to_string(),
            source: serde_json::Error::custom(format!(
                "{filename} must contain a JSON array at the top level"
            )),
        });
    };

    let mut records = Vec::with_capacity(items.len());
    let mut skipped = 0usize;
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<T>(item) {
            Ok(record) => records.push(record),
            Err(error) => {
                skipped += 1;
                warn!(file = filename, index, %error, "skipping malformed record");
            }
        }
    }
    if skipped > 0 {
        warn!(
            file = filename,
            skipped,
            "finished loading with malformed records skipped"
        );
    }
    Ok(records)
}

fn read_required_array<T: for<'de> Deserialize<'de>>(
    dir: &Path,
    filename: &str,
) -> EngineResult<Vec<T>> {
    let value = read_json_value(dir, filename, true)?
        .expect("read_json_value returns Some for a required file or errors");
    parse_array_tolerant(filename, value)
}

fn read_optional_array<T: for<'de> Deserialize<'de>>(
    dir: &Path,
    filename: &str,
) -> EngineResult<Vec<T>> {
    match read_json_value(dir, filename, false)? {
        Some(value) => parse_array_tolerant(filename, value),
        None => Ok(Vec::new()),
    }
}

/// Read `icd10_cm_data.json`'s nested `{codes: {<section>: {<code>: entry}}}`
/// shape, skipping individual malformed diagnosis entries rather than
/// failing the whole file (same per-record tolerance as the flat array
/// files, just one nesting level deeper).
fn read_icd10_cm(dir: &Path) -> EngineResult<HashMap<String, DiagnosisEntry>> {
    let filename = "icd10_cm_data.json";
    let value = read_json_value(dir, filename, true)?.expect("required file");
    let codes = value
        .get("codes")
        .and_then(|v| v.as_object())
        .ok_or_else(|| EngineError::MalformedReferenceFile {
            file: filename.to_string(),
            source: serde_json::Error::custom("missing top-level \"codes\" object"),
        })?;

    let mut diagnosis = HashMap::new();
    let mut skipped = 0usize;
    for entries in codes.values() {
        let Some(entries) = entries.as_object() else {
            skipped += 1;
            continue;
        };
        for (code, entry_value) in entries {
            match serde_json::from_value::<Icd10CmEntryJson>(entry_value.clone()) {
                Ok(entry) => {
                    let normalized = normalize_code(code);
                    diagnosis.insert(
                        normalized.clone(),
                        DiagnosisEntry {
                            code: normalized,
                            description: entry.description,
                            mdc: entry.mdc,
                            is_cc: entry.is_cc,
                            is_mcc: entry.is_mcc,
                        },
                    );
                }
                Err(error) => {
                    skipped += 1;
                    warn!(file = filename, code, %error, "skipping malformed diagnosis entry");
                }
            }
        }
    }
    if skipped > 0 {
        warn!(
            file = filename,
            skipped,
            "finished loading with malformed records skipped"
        );
    }
    Ok(diagnosis)
}

/// Read `icd10_pcs_data.json`'s nested `{procedures: {<group>: {<code>: entry}}}`
/// shape with the same per-entry tolerance as [`read_icd10_cm`].
fn read_icd10_pcs(dir: &Path) -> EngineResult<HashMap<String, ProcedureEntry>> {
    let filename = "icd10_pcs_data.json";
    let value = read_json_value(dir, filename, true)?.expect("required file");
    let procedures = value
        .get("procedures")
        .and_then(|v| v.as_object())
        .ok_or_else(|| EngineError::MalformedReferenceFile {
            file: filename.to_string(),
            source: serde_json::Error::custom("missing top-level \"procedures\" object"),
        })?;

    let mut procedure = HashMap::new();
    let mut skipped = 0usize;
    for entries in procedures.values() {
        let Some(entries) = entries.as_object() else {
            skipped += 1;
            continue;
        };
        for (code, entry_value) in entries {
            match serde_json::from_value::<Icd10PcsEntryJson>(entry_value.clone()) {
                Ok(entry) => {
                    let normalized = normalize_code(code);
                    procedure.insert(
                        normalized.clone(),
                        ProcedureEntry {
                            code: normalized,
                            description: entry.description,
                            is_or_procedure: entry.is_or_procedure,
                            is_non_or_procedure: entry.is_non_or_procedure,
                        },
                    );
                }
                Err(error) => {
                    skipped += 1;
                    warn!(file = filename, code, %error, "skipping malformed procedure entry");
                }
            }
        }
    }
    if skipped > 0 {
        warn!(
            file = filename,
            skipped,
            "finished loading with malformed records skipped"
        );
    }
    Ok(procedure)
}
