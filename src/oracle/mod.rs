//! AI request builder — multimodal prompts to the external inference
//! endpoint and decoding of its candidate envelope.
//!
//! The oracle is opaque: text (and optionally an image) goes in, free-form
//! text comes out. Nothing here retries; a caller may safely retry on
//! `Transport`/`Timeout` since a generate call has no side effects.

pub mod gemini;
pub mod mime;
pub mod types;

pub use gemini::*;
pub use mime::*;
pub use types::*;

use base64::Engine;
use thiserror::Error;

/// Returned verbatim when the oracle produces zero candidates.
pub const NO_RESPONSE_SENTINEL: &str = "No response from AI";

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Instruction text must not be empty")]
    EmptyInstruction,

    #[error("Oracle transport error: {0}")]
    Transport(String),

    #[error("Oracle request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Oracle returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Failed to read oracle response body: {0}")]
    BodyRead(String),

    #[error("Malformed oracle envelope: {0}")]
    Decode(String),

    #[error("Oracle candidate contained no text part")]
    EmptyEnvelope,

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl OracleError {
    /// Failures where repeating the identical request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout { .. })
    }
}

/// One round trip to an inference backend.
pub trait Oracle: Send + Sync {
    fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, OracleError>;
}

/// Assemble the single-turn request: a text part, plus an inline part
/// when an image is supplied.
pub fn build_request(
    instruction: &str,
    image: Option<&[u8]>,
) -> Result<GenerateContentRequest, OracleError> {
    if instruction.trim().is_empty() {
        return Err(OracleError::EmptyInstruction);
    }

    let mut parts = vec![Part::Text {
        text: instruction.to_string(),
    }];
    if let Some(bytes) = image {
        parts.push(Part::InlineData {
            inline_data: InlineData {
                mime_type: sniff_mime(bytes).to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(bytes),
            },
        });
    }

    Ok(GenerateContentRequest {
        contents: vec![Content { parts }],
    })
}

/// Text of the first candidate's first text part.
///
/// Zero candidates yields [`NO_RESPONSE_SENTINEL`]; a candidate without any
/// text is an `EmptyEnvelope` error.
pub fn first_candidate_text(response: &GenerateContentResponse) -> Result<String, OracleError> {
    let Some(candidate) = response.candidates.first() else {
        return Ok(NO_RESPONSE_SENTINEL.to_string());
    };
    candidate
        .content
        .parts
        .iter()
        .find_map(|p| p.text.clone())
        .ok_or(OracleError::EmptyEnvelope)
}

/// Build, send and decode in one call.
pub fn ask(
    oracle: &dyn Oracle,
    instruction: &str,
    image: Option<&[u8]>,
) -> Result<String, OracleError> {
    let request = build_request(instruction, image)?;
    if let Some(bytes) = image {
        tracing::debug!(
            mime = sniff_mime(bytes),
            image_bytes = bytes.len(),
            "Sending multimodal oracle request"
        );
    }
    let response = oracle.generate(&request).map_err(|e| {
        tracing::warn!(error = %e, "Oracle request failed");
        e
    })?;
    first_candidate_text(&response)
}
