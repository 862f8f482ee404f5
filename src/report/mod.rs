//! Report renderer — fixed-layout PDF from a parsed analysis.
//!
//! Composition ([`prescription`]) produces a [`layout::Layout`] of positioned
//! text runs; [`pdf`] turns that into bytes. Only the final write can fail.

pub mod layout;
pub mod pdf;
pub mod prescription;

pub use prescription::{compose_report, format_timestamp, purchase_link, ReportMeta, REPORT_TITLE};

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::analysis::ParsedAnalysis;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

/// Render the prescription report for one record as PDF bytes.
pub fn render_report(
    parsed: &ParsedAnalysis,
    meta: &ReportMeta,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, ReportError> {
    let layout = compose_report(parsed, meta, generated_at);
    tracing::debug!(
        record_id = %meta.record_id,
        pages = layout.pages().len(),
        "Report composed"
    );
    pdf::write_pdf(&layout, REPORT_TITLE)
}

/// Download name for a record's report.
pub fn report_filename(id: &Uuid) -> String {
    format!("prescription-analysis-{id}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn renders_empty_analysis() {
        let meta = ReportMeta {
            record_id: Uuid::new_v4(),
            owner: "bob".into(),
            uploaded_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        };
        let bytes = render_report(&ParsedAnalysis::empty(), &meta, Utc::now()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn filename_includes_id() {
        let id = Uuid::nil();
        assert_eq!(
            report_filename(&id),
            "prescription-analysis-00000000-0000-0000-0000-000000000000.pdf"
        );
    }
}
