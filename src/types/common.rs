//! Small enumerations shared across the reference data, claim, and grouper types.

use serde::{Deserialize, Serialize};

/// Which calculator a claim line is dispatched to.
///
/// Determined by line shape alone (presence of `ms_drg_code` + `provider_number`
/// vs. `procedure_code`), never by an externally supplied tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    /// Physician Fee Schedule (RBRVS) line.
    Pfs,
    /// Inpatient Prospective Payment System (MS-DRG) line.
    Ipps,
}

/// Patient sex as recorded on the claim, for grouper input.
///
/// `U` ("unknown/unspecified") is itself a valid, spec-named value distinct
/// from a malformed one — callers that genuinely don't have this data send
/// `U`. [`Sex::Invalid`] is the deserializer's catch-all for a value that is
/// none of the three; the grouper rejects it explicitly (§4.4 step 2)
/// instead of letting it silently masquerade as a real sex.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Sex {
    M,
    F,
    U,
    /// Any value other than M/F/U. Caught here rather than failing
    /// deserialization outright, matching the lenient-enum pattern this
    /// codebase's reference types already use for externally supplied
    /// codes.
    #[serde(other)]
    Invalid,
}

/// MS-DRG classification branch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrgType {
    Surgical,
    Medical,
    /// No MDC could be assigned from the principal diagnosis.
    PreMdc,
    /// A `drg_type` value in `drg_grouping_rules.json` this grouping-rule
    /// data generation doesn't recognize. A rule in this state never
    /// matches any case (the orchestrator only filters rules by the two
    /// real branches), so a future rule-file addition degrades to "never
    /// selected" rather than aborting the whole data load.
    #[serde(other)]
    Unknown,
}

/// Severity of a structured per-line diagnostic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSeverity {
    /// Does not stop pricing of the line; the allowed amount still reflects
    /// whatever fallback the engine applied.
    Warning,
    /// The line cannot be priced; `medicare_allowed` is 0 for this line.
    Error,
}

/// Stable, versioned diagnostic code registry for per-line pricing/grouping
/// problems.
///
/// NEVER rename or remove a variant once shipped — these are part of the
/// derivation trail a consumer may match on. Add new codes only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    /// Fatal: the (code, modifier) and (code, none) RVU lookups both missed.
    ProcedureCodeNotFound,
    /// Fatal: a PFS line supplied neither `locality` nor `zip`.
    LocalityOrZipRequired,
    /// Fatal: the procedure code is outside the core's supported payment
    /// methodologies (dental, DME, anesthesia-only).
    UnsupportedServiceType,
    /// Fatal: the referenced MS-DRG code has no reference record.
    DrgNotFound,
    /// Fatal: the referenced provider number has no hospital record.
    HospitalNotFound,
    /// Fatal: neither the hospital nor its CBSA resolved a wage index.
    WageIndexNotFound,
    /// Fatal: the grouper could not assign any MS-DRG.
    GrouperUngroupable,
    /// Warning: no locality supplied or mapped; national average used.
    LocalityDefaulted,
    /// Warning: a modifier was present that the engine does not recognize.
    UnknownModifier,
    /// Warning: the grouper fell back to a lower-severity DRG slot because
    /// the requested one was absent from the data file.
    SeveritySlotFallback,
    /// Informational: Multiple Procedure Payment Reduction was applied.
    MpprApplied,
    /// Informational: a modifier changed the base payment (zeroing a
    /// component, or a multiplicative adjustment).
    ModifierApplied,
}

/// A single structured diagnostic attached to a repriced line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineDiagnostic {
    pub code: DiagnosticCode,
    pub severity: DiagnosticSeverity,
    pub message: String,
}

impl LineDiagnostic {
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: DiagnosticSeverity::Error,
            message: message.into(),
        }
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: DiagnosticSeverity::Warning,
            message: message.into(),
        }
    }

    pub fn info(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: DiagnosticSeverity::Warning,
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}
