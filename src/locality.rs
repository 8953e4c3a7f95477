//! Locality Resolver (§4.2): maps a claim line's `locality` or `zip` to the
//! Medicare locality code the PFS calculator will look GPCI up by.

use crate::data_store::DataStore;
use crate::types::{DiagnosticCode, LineDiagnostic, NATIONAL_AVERAGE_LOCALITY};

/// Outcome of resolving a line's locality: the code to use plus any warning
/// diagnostic emitted along the way (e.g. a default-to-national-average).
pub struct ResolvedLocality {
    pub locality: String,
    pub diagnostic: Option<LineDiagnostic>,
}

/// Resolve a PFS line's locality per §4.2.
///
/// `locality` wins verbatim when present. Otherwise the 3-digit ZIP prefix is
/// looked up; an unmapped prefix falls back to the national-average locality
/// with a warning. Neither supplied is the caller's responsibility to reject
/// as a fatal `locality_or_zip_required` error — this function only runs once
/// that precondition holds.
pub fn resolve(
    data_store: &DataStore,
    locality: Option<&str>,
    zip: Option<&str>,
) -> ResolvedLocality {
    if let Some(locality) = locality {
        return ResolvedLocality {
            locality: locality.to_string(),
            diagnostic: None,
        };
    }

    let zip = zip.expect("caller must ensure locality or zip is present");
    let prefix: String = zip.chars().take(3).collect();

    if let Some(resolved) = data_store.locality_for_zip_prefix(&prefix) {
        return ResolvedLocality {
            locality: resolved.to_string(),
            diagnostic: None,
        };
    }

    ResolvedLocality {
        locality: NATIONAL_AVERAGE_LOCALITY.to_string(),
        diagnostic: Some(LineDiagnostic::warning(
            DiagnosticCode::LocalityDefaulted,
            "locality defaulted to national average",
        )),
    }
}
