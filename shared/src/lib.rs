//! Shared types for the pharmacy label station
//!
//! Domain records passed from the UI shell into the numbering and
//! label-rendering core, plus the caller-side validation helpers.

pub mod models;
pub mod validation;

// Re-exports
pub use models::*;
pub use serde::{Deserialize, Serialize};
pub use validation::ValidationError;
