//! Analysis normalizer — turns stored oracle text back into a tree.

pub mod normalize;
pub mod parsed;

pub use normalize::*;
pub use parsed::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The text (after fence stripping) is not valid JSON.
    #[error("Analysis is not valid JSON: {reason}")]
    InvalidJson { reason: String, text: String },

    /// Valid JSON, but the root is not an object.
    #[error("Analysis root must be a JSON object, found {found}")]
    NotAnObject { found: &'static str, text: String },
}

impl AnalysisError {
    /// The offending text, for diagnostics.
    pub fn offending_text(&self) -> &str {
        match self {
            Self::InvalidJson { text, .. } | Self::NotAnObject { text, .. } => text,
        }
    }
}
