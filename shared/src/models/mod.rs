//! Data models
//!
//! Records arrive from the UI shell as camelCase JSON and are never persisted
//! by the label core.

pub mod drug;
pub mod grid_sheet;
pub mod patient;
pub mod pharmacy;
pub mod prescriber;
pub mod prescription;

// Re-exports
pub use drug::*;
pub use grid_sheet::*;
pub use patient::*;
pub use pharmacy::*;
pub use prescriber::*;
pub use prescription::*;
