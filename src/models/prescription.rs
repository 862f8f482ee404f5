use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One oracle analysis of an uploaded prescription photo.
///
/// Created once when the oracle answers; never edited afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionRecord {
    pub id: Uuid,
    /// Username of the patient who uploaded the photo.
    pub owner: String,
    /// Oracle text exactly as received.
    pub raw_analysis: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Dashboard row — everything but the analysis body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionSummary {
    pub id: Uuid,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&PrescriptionRecord> for PrescriptionSummary {
    fn from(record: &PrescriptionRecord) -> Self {
        Self {
            id: record.id,
            uploaded_at: record.uploaded_at,
        }
    }
}
