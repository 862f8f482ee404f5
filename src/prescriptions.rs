//! Prescription analysis surface used by the HTTP layer.
//!
//! Every owner-scoped call takes the caller's identity and passes it down to
//! the store query; nothing here filters records after the fact.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::analysis::{normalize, AnalysisError, ParsedAnalysis};
use crate::core_state::CoreState;
use crate::db::{self, DatabaseError};
use crate::models::PrescriptionRecord;
use crate::oracle::{self, OracleError};
use crate::report::{self, ReportError, ReportMeta};

#[derive(Error, Debug)]
pub enum PrescriptionError {
    #[error("Bad input: {0}")]
    BadInput(String),

    #[error("Oracle failure: {0}")]
    Upstream(OracleError),

    #[error("Prescription not found")]
    NotFound,

    #[error("Stored analysis could not be parsed: {0}")]
    Parse(#[from] AnalysisError),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] DatabaseError),

    #[error("Report failure: {0}")]
    Report(#[from] ReportError),
}

impl From<OracleError> for PrescriptionError {
    fn from(e: OracleError) -> Self {
        match e {
            OracleError::EmptyInstruction => Self::BadInput(e.to_string()),
            other => Self::Upstream(other),
        }
    }
}

/// Result of a successful oracle call.
///
/// `record_id` is `None` when the analysis could not be stored; the text is
/// still returned to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub analysis: String,
    pub record_id: Option<Uuid>,
}

/// Ask the oracle about an uploaded image and store its answer for `owner`.
///
/// Blocking: performs the oracle round trip on the calling thread.
pub fn analyze(
    core: &CoreState,
    owner: &str,
    instruction: &str,
    image: Option<&[u8]>,
) -> Result<AnalysisOutcome, PrescriptionError> {
    if matches!(image, Some(bytes) if bytes.is_empty()) {
        return Err(PrescriptionError::BadInput("uploaded file is empty".into()));
    }

    let analysis = oracle::ask(core.oracle(), instruction, image)?;

    let record_id = match core.with_db(|conn| db::insert_prescription(conn, owner, &analysis)) {
        Ok(record) => {
            tracing::info!(record_id = %record.id, owner, "Prescription analysis stored");
            Some(record.id)
        }
        Err(e) => {
            tracing::warn!(owner, error = %e, "Failed to store prescription analysis");
            None
        }
    };

    Ok(AnalysisOutcome {
        analysis,
        record_id,
    })
}

/// Load a record owned by `owner` and parse its stored analysis.
pub fn fetch_parsed(
    core: &CoreState,
    id: &Uuid,
    owner: &str,
) -> Result<(PrescriptionRecord, ParsedAnalysis), PrescriptionError> {
    let record = core
        .with_db(|conn| db::get_prescription(conn, id, owner))?
        .ok_or(PrescriptionError::NotFound)?;

    match normalize(&record.raw_analysis) {
        Ok(parsed) => Ok((record, parsed)),
        Err(e) => {
            tracing::error!(
                record_id = %record.id,
                error = %e,
                raw_analysis = e.offending_text(),
                "Stored analysis is not structured data"
            );
            Err(e.into())
        }
    }
}

pub fn render_report(
    parsed: &ParsedAnalysis,
    meta: &ReportMeta,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, PrescriptionError> {
    Ok(report::render_report(parsed, meta, generated_at)?)
}

/// Fetch, parse and render in one step. Returns the download filename and
/// the PDF bytes.
pub fn download_report(
    core: &CoreState,
    id: &Uuid,
    owner: &str,
    generated_at: DateTime<Utc>,
) -> Result<(String, Vec<u8>), PrescriptionError> {
    let (record, parsed) = fetch_parsed(core, id, owner)?;
    let bytes = render_report(&parsed, &ReportMeta::from(&record), generated_at)?;
    Ok((report::report_filename(&record.id), bytes))
}

pub fn list_for_owner(
    core: &CoreState,
    owner: &str,
) -> Result<Vec<PrescriptionRecord>, PrescriptionError> {
    Ok(core.with_db(|conn| db::list_prescriptions_by_owner(conn, owner))?)
}

/// Delete a record owned by `owner`; `false` when nothing matched.
pub fn remove(core: &CoreState, id: &Uuid, owner: &str) -> Result<bool, PrescriptionError> {
    let deleted = core.with_db(|conn| db::delete_prescription(conn, id, owner))?;
    tracing::info!(record_id = %id, owner, deleted, "Prescription delete requested");
    Ok(deleted)
}

/// Parse a caller-supplied record id.
pub fn parse_record_id(raw: &str) -> Result<Uuid, PrescriptionError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(PrescriptionError::BadInput("missing prescription id".into()));
    }
    Uuid::parse_str(raw)
        .map_err(|_| PrescriptionError::BadInput(format!("invalid prescription id: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{GenerateContentResponse, MockOracle, Part, NO_RESPONSE_SENTINEL};
    use crate::prompts::PRESCRIPTION_ANALYSIS;
    use std::sync::Arc;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn core_with(mock: MockOracle) -> (CoreState, Arc<MockOracle>) {
        let mock = Arc::new(mock);
        let core = CoreState::in_memory(mock.clone()).unwrap();
        (core, mock)
    }

    #[test]
    fn analyze_stores_and_returns_oracle_text() {
        let (core, mock) = core_with(MockOracle::with_text(r#"{"manufacturer":"Acme"}"#));

        let outcome = analyze(&core, "alice", PRESCRIPTION_ANALYSIS, Some(PNG)).unwrap();
        assert_eq!(outcome.analysis, r#"{"manufacturer":"Acme"}"#);
        let id = outcome.record_id.unwrap();

        let listed = list_for_owner(&core, "alice").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].raw_analysis, outcome.analysis);

        let request = mock.last_request().unwrap();
        match &request.contents[0].parts[1] {
            Part::InlineData { inline_data } => assert_eq!(inline_data.mime_type, "image/png"),
            other => panic!("expected inline data, got {other:?}"),
        }
    }

    #[test]
    fn zero_candidates_yield_sentinel_not_error() {
        let (core, _) = core_with(MockOracle::new(GenerateContentResponse::default()));
        let outcome = analyze(&core, "alice", "X", None).unwrap();
        assert_eq!(outcome.analysis, NO_RESPONSE_SENTINEL);
    }

    #[test]
    fn oracle_failure_is_upstream_and_stores_nothing() {
        let (core, _) = core_with(MockOracle::failing(|| OracleError::Timeout { secs: 1 }));
        let err = analyze(&core, "alice", "X", Some(PNG)).unwrap_err();
        assert!(matches!(err, PrescriptionError::Upstream(OracleError::Timeout { .. })));
        assert!(list_for_owner(&core, "alice").unwrap().is_empty());
    }

    #[test]
    fn empty_instruction_is_bad_input() {
        let (core, mock) = core_with(MockOracle::with_text("x"));
        let err = analyze(&core, "alice", "   ", None).unwrap_err();
        assert!(matches!(err, PrescriptionError::BadInput(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn empty_upload_is_bad_input() {
        let (core, mock) = core_with(MockOracle::with_text("x"));
        let err = analyze(&core, "alice", "X", Some(&[])).unwrap_err();
        assert!(matches!(err, PrescriptionError::BadInput(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn persistence_failure_still_returns_analysis() {
        let (core, _) = core_with(MockOracle::with_text("{}"));
        core.with_db(|conn| conn.execute_batch("DROP TABLE prescriptions"))
            .unwrap();

        let outcome = analyze(&core, "alice", "X", Some(PNG)).unwrap();
        assert_eq!(outcome.analysis, "{}");
        assert!(outcome.record_id.is_none());
    }

    #[test]
    fn fetch_parsed_strips_fences() {
        let (core, _) = core_with(MockOracle::with_text(
            "```json\n{\"manufacturer\":\"Acme\"}\n```",
        ));
        let id = analyze(&core, "alice", "X", Some(PNG)).unwrap().record_id.unwrap();

        let (record, parsed) = fetch_parsed(&core, &id, "alice").unwrap();
        assert_eq!(record.owner, "alice");
        assert_eq!(parsed.as_map().len(), 1);
        assert_eq!(parsed.field("manufacturer").as_str(), Some("Acme"));
    }

    #[test]
    fn other_owner_cannot_fetch_or_remove() {
        let (core, _) = core_with(MockOracle::with_text("{}"));
        let id = analyze(&core, "alice", "X", Some(PNG)).unwrap().record_id.unwrap();

        assert!(matches!(
            fetch_parsed(&core, &id, "bob").unwrap_err(),
            PrescriptionError::NotFound
        ));
        assert!(!remove(&core, &id, "bob").unwrap());
        assert!(fetch_parsed(&core, &id, "alice").is_ok());
    }

    #[test]
    fn unparseable_analysis_is_parse_error() {
        let (core, _) = core_with(MockOracle::with_text("I could not read this image."));
        let id = analyze(&core, "alice", "X", Some(PNG)).unwrap().record_id.unwrap();

        let err = fetch_parsed(&core, &id, "alice").unwrap_err();
        match err {
            PrescriptionError::Parse(e) => {
                assert_eq!(e.offending_text(), "I could not read this image.")
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn remove_twice_reports_false() {
        let (core, _) = core_with(MockOracle::with_text("{}"));
        let id = analyze(&core, "alice", "X", None).unwrap().record_id.unwrap();
        assert!(remove(&core, &id, "alice").unwrap());
        assert!(!remove(&core, &id, "alice").unwrap());
    }

    #[test]
    fn download_report_names_file_after_record() {
        let (core, _) = core_with(MockOracle::with_text(r#"{"medicines":[{"name":"Paracetamol"}]}"#));
        let id = analyze(&core, "alice", "X", Some(PNG)).unwrap().record_id.unwrap();

        let (filename, bytes) = download_report(&core, &id, "alice", Utc::now()).unwrap();
        assert_eq!(filename, format!("prescription-analysis-{id}.pdf"));
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn record_id_parsing() {
        let id = Uuid::new_v4();
        assert_eq!(parse_record_id(&format!(" {id} ")).unwrap(), id);
        assert!(matches!(parse_record_id(""), Err(PrescriptionError::BadInput(_))));
        assert!(matches!(
            parse_record_id("507f1f77bcf86cd799439011"),
            Err(PrescriptionError::BadInput(_))
        ));
    }
}
