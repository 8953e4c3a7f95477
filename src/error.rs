//! Crate-wide error type for load-time and claim-level failures.
//!
//! Per-line pricing/grouping problems never flow through this type — they
//! are structured [`crate::types::LineDiagnostic`] values attached to a
//! [`crate::types::RepricedLine`] instead, so one malformed line can never
//! abort a whole claim. `EngineError` is reserved for failures that are not
//! recoverable per-line: a missing data directory, a corrupt required
//! reference file, or a structurally invalid claim (no lines, duplicate line
//! numbers, invalid units).

use std::path::PathBuf;

/// Errors raised by engine construction or by claim-level validation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("data directory not found: {0}")]
    DataDirectoryNotFound(PathBuf),

    #[error("required reference file missing: {0}")]
    RequiredFileMissing(String),

    #[error("malformed reference file {file}: {source}")]
    MalformedReferenceFile {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("io error reading {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("claim {claim_id} has no lines")]
    EmptyClaim { claim_id: String },

    #[error("claim {claim_id} has no claim_id")]
    EmptyClaimId { claim_id: String },

    #[error("claim {claim_id} has duplicate line number {line_number}")]
    DuplicateLineNumber { claim_id: String, line_number: u32 },

    #[error("invalid units {units} on line {line_number}: units must be >= 1")]
    InvalidUnits { line_number: u32, units: u32 },
}

/// Result alias for all fallible top-level engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
