//! Case Summarizer — the deterministic vignette sent to the backend.

use crate::roster::models::CaseRecord;

/// Renders the short case vignette for a record. Pure; no backend involved.
pub fn summarize_case(record: &CaseRecord) -> String {
    let [d1, d2, d3] = &record.differentials;
    format!(
        "A pediatric patient presents with {}. Differential diagnoses include {}, {}, and {}.",
        record.primary_diagnosis, d1, d2, d3
    )
}
