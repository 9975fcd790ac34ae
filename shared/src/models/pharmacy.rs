//! Pharmacy Model

use serde::{Deserialize, Serialize};

/// Dispensing pharmacy header
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pharmacy {
    pub name: String,
    pub address: String,
    pub phone: String,
}
