//! Text-only oracle features: health chat and disease prediction.
//!
//! Neither answer is stored. Both calls block on the oracle round trip.

use crate::core_state::CoreState;
use crate::oracle;
use crate::prescriptions::PrescriptionError;
use crate::prompts::{self, PatientDetails};

/// Answer a short health question.
pub fn chat(core: &CoreState, message: &str) -> Result<String, PrescriptionError> {
    if message.trim().is_empty() {
        return Err(PrescriptionError::BadInput("message must not be empty".into()));
    }
    tracing::debug!(message_chars = message.chars().count(), "Health chat request");
    Ok(oracle::ask(core.oracle(), &prompts::chat_prompt(message), None)?)
}

/// Suggest likely conditions from patient-reported details.
///
/// At least the symptoms must be given; the other details are optional.
pub fn predict_disease(
    core: &CoreState,
    details: &PatientDetails,
) -> Result<String, PrescriptionError> {
    if details.symptoms.trim().is_empty() {
        return Err(PrescriptionError::BadInput("symptoms must not be empty".into()));
    }
    Ok(oracle::ask(core.oracle(), &prompts::disease_prompt(details), None)?)
}
