//! Repricer Orchestrator and [`RepricingEngine`] (§4.6, §4.7): the top-level
//! per-claim pipeline and the `Send + Sync` handle that owns the loaded
//! reference data.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info_span};

use crate::config::EngineConfig;
use crate::data_store::DataStore;
use crate::error::{EngineError, EngineResult};
use crate::grouper;
use crate::ipps;
use crate::pfs;
use crate::types::{
    Claim, ClaimLine, DiagnosticCode, GrouperInput, GrouperOutput, LineDerivation,
    LineDiagnostic, RepricedClaim, RepricedLine, ServiceType,
};

/// Top-level handle over one loaded plan year's reference data.
///
/// Construction loads the data directory once; the resulting `Arc<DataStore>`
/// is cheap to clone and safe to share across worker threads without
/// synchronization (§5) since nothing mutates it after `new` returns.
#[derive(Clone)]
pub struct RepricingEngine {
    data_store: Arc<DataStore>,
}

impl RepricingEngine {
    /// Load reference data from `config.data_directory` and build an engine.
    pub fn new(config: &EngineConfig) -> EngineResult<Self> {
        if config.data_directory.as_os_str().is_empty() {
            return Err(EngineError::DataDirectoryNotFound(
                config.data_directory.clone(),
            ));
        }
        let data_store = DataStore::load(&config.data_directory, config.conversion_factor())?;
        Ok(Self {
            data_store: Arc::new(data_store),
        })
    }

    /// Direct access to the loaded reference data, for tooling that wants the
    /// read-through accessors in §6 (`get_rvu`, `get_gpci`, `get_msdrg`, ...)
    /// without going through a claim.
    pub fn data_store(&self) -> &DataStore {
        &self.data_store
    }

    /// Assign an MS-DRG independently of a claim (§6 `assign_drg`).
    pub fn assign_drg(&self, input: &GrouperInput) -> GrouperOutput {
        grouper::assign_drg(&self.data_store, input)
    }

    /// Reprice one claim end to end (§4.6).
    pub fn reprice_claim(&self, claim: &Claim) -> EngineResult<RepricedClaim> {
        validate_claim(claim)?;

        let span = info_span!("reprice_claim", claim_id = %claim.claim_id);
        let _guard = span.enter();

        let ranks = assign_mppr_ranks(&self.data_store, &claim.lines);

        let mut lines = Vec::with_capacity(claim.lines.len());
        let mut total_allowed = 0.0;

        for line in &claim.lines {
            let service_type = line.service_type();
            debug!(
                line_number = line.line_number,
                ?service_type,
                rank = ranks.get(&line.line_number).copied().unwrap_or(1),
                "dispatching line"
            );

            let repriced = match service_type {
                Some(ServiceType::Pfs) => price_pfs_line(&self.data_store, line, &ranks),
                Some(ServiceType::Ipps) => price_ipps_line(&self.data_store, line),
                None => RepricedLine {
                    line_number: line.line_number,
                    service_type: None,
                    medicare_allowed: 0.0,
                    derivation: LineDerivation::None,
                    diagnostics: vec![LineDiagnostic::error(
                        DiagnosticCode::UnsupportedServiceType,
                        "line shape matches neither a PFS nor an IPPS line",
                    )],
                },
            };

            if !repriced.has_fatal_error() {
                total_allowed += repriced.medicare_allowed;
            }
            lines.push(repriced);
        }

        Ok(RepricedClaim {
            claim_id: claim.claim_id.clone(),
            lines,
            total_allowed: pfs::round_cents(total_allowed),
        })
    }
}

fn validate_claim(claim: &Claim) -> EngineResult<()> {
    if claim.claim_id.trim().is_empty() {
        return Err(EngineError::EmptyClaimId {
            claim_id: claim.claim_id.clone(),
        });
    }
    if claim.lines.is_empty() {
        return Err(EngineError::EmptyClaim {
            claim_id: claim.claim_id.clone(),
        });
    }

    let mut seen = HashSet::with_capacity(claim.lines.len());
    for line in &claim.lines {
        if !seen.insert(line.line_number) {
            return Err(EngineError::DuplicateLineNumber {
                claim_id: claim.claim_id.clone(),
                line_number: line.line_number,
            });
        }
        if line.units < 1 {
            return Err(EngineError::InvalidUnits {
                line_number: line.line_number,
                units: line.units,
            });
        }
    }

    Ok(())
}

/// Pass 1 (§4.6): rank PFS lines whose RVU record is MPPR-eligible by
/// descending candidacy score (sum of the selected RVU triple), stable
/// tie-break by ascending line number. Lines not found in the RVU table, or
/// whose record is not MPPR-eligible, are left unranked (rank 1 behavior).
fn assign_mppr_ranks(
    data_store: &DataStore,
    lines: &[ClaimLine],
) -> std::collections::HashMap<u32, u32> {
    let mut candidates: Vec<(u32, f64)> = Vec::new();

    for line in lines {
        if line.service_type() != Some(ServiceType::Pfs) {
            continue;
        }
        let Some(procedure_code) = &line.procedure_code else {
            continue;
        };
        let facility_selected = line
            .place_of_service
            .as_deref()
            .map(is_facility_pos)
            .unwrap_or(false);
        let first_modifier = line.modifiers.first().map(String::as_str);
        let Some(rvu) = data_store.get_rvu(procedure_code, first_modifier) else {
            continue;
        };
        if !rvu.mppr_eligible() {
            continue;
        }
        let (work, pe, mp) = rvu.triple(facility_selected);
        candidates.push((line.line_number, work + pe + mp));
    }

    candidates.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    candidates
        .into_iter()
        .enumerate()
        .map(|(index, (line_number, _))| (line_number, index as u32 + 1))
        .collect()
}

/// Mirrors `pfs::is_facility_pos` for the ranking pass, which runs before any
/// single line's calculator invocation.
fn is_facility_pos(pos: &str) -> bool {
    const FACILITY_POS_CODES: &[&str] = &[
        "21", "22", "23", "24", "26", "31", "34", "51", "52", "53", "56", "61",
    ];
    FACILITY_POS_CODES.contains(&pos)
}

fn price_pfs_line(
    data_store: &DataStore,
    line: &ClaimLine,
    ranks: &std::collections::HashMap<u32, u32>,
) -> RepricedLine {
    let Some(procedure_code) = &line.procedure_code else {
        return RepricedLine {
            line_number: line.line_number,
            service_type: Some(ServiceType::Pfs),
            medicare_allowed: 0.0,
            derivation: LineDerivation::None,
            diagnostics: vec![LineDiagnostic::error(
                DiagnosticCode::ProcedureCodeNotFound,
                "PFS line has no procedure_code",
            )],
        };
    };

    let rank = ranks.get(&line.line_number).copied().unwrap_or(1);
    let outcome = pfs::calculate(
        data_store,
        procedure_code,
        &line.modifiers,
        line.place_of_service.as_deref().unwrap_or(""),
        line.locality.as_deref(),
        line.zip.as_deref(),
        line.units,
        rank,
    );

    RepricedLine {
        line_number: line.line_number,
        service_type: Some(ServiceType::Pfs),
        medicare_allowed: outcome.allowed,
        derivation: outcome
            .derivation
            .map(LineDerivation::Pfs)
            .unwrap_or(LineDerivation::None),
        diagnostics: outcome.diagnostics,
    }
}

fn price_ipps_line(data_store: &DataStore, line: &ClaimLine) -> RepricedLine {
    let (Some(ms_drg), Some(provider_number)) = (&line.ms_drg_code, &line.provider_number) else {
        return RepricedLine {
            line_number: line.line_number,
            service_type: Some(ServiceType::Ipps),
            medicare_allowed: 0.0,
            derivation: LineDerivation::None,
            diagnostics: vec![LineDiagnostic::error(
                DiagnosticCode::DrgNotFound,
                "IPPS line requires ms_drg_code and provider_number",
            )],
        };
    };

    let outcome = ipps::calculate(
        data_store,
        ms_drg,
        provider_number,
        line.total_charges.unwrap_or(0.0),
        line.covered_days,
    );

    RepricedLine {
        line_number: line.line_number,
        service_type: Some(ServiceType::Ipps),
        medicare_allowed: outcome.allowed,
        derivation: outcome
            .derivation
            .map(LineDerivation::Ipps)
            .unwrap_or(LineDerivation::None),
        diagnostics: outcome.diagnostics,
    }
}
