//! Render errors

use rx_printer::PrintError;
use thiserror::Error;

/// Layout could not be composed
///
/// A render either composes fully or fails; nothing partial is returned.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Input rejected by the layout, naming the offending field
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Barcode error: {0}")]
    Barcode(#[from] PrintError),
}

impl RenderError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type RenderResult<T> = Result<T, RenderError>;
