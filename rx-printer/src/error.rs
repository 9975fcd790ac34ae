//! Error types for the printer library

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// Barcode text rejected by the symbology
    #[error("Barcode error: {0}")]
    Barcode(String),

    /// PDF document could not be assembled or saved
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Label descriptor could not be serialized
    #[error("Descriptor error: {0}")]
    Descriptor(String),

    /// IO error during output
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Printer service is not running or unreachable
    #[error("Printer service unavailable: {0}")]
    Unavailable(String),

    /// No printer matched the type filter
    #[error("No printer found for type: {0}")]
    NoPrinter(String),

    /// The printer service rejected the job
    #[error("Print failed: {0}")]
    PrintFailed(String),

    /// Timeout waiting for printer service
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
