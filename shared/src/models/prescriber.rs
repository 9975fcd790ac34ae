//! Prescriber Model

use serde::{Deserialize, Serialize};

/// Prescribing practitioner
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prescriber {
    pub name: String,
    #[serde(default)]
    pub npi: Option<String>,
    #[serde(default)]
    pub dea: Option<String>,
}

impl Prescriber {
    /// DEA number, ignoring blank input
    pub fn dea_number(&self) -> Option<&str> {
        non_blank(self.dea.as_deref())
    }

    /// Joined display string: `Name / NPI: x / DEA: y`
    ///
    /// Missing or blank NPI/DEA are left out rather than rendered empty.
    pub fn display(&self) -> String {
        let mut parts = vec![self.name.trim().to_string()];
        if let Some(npi) = non_blank(self.npi.as_deref()) {
            parts.push(format!("NPI: {}", npi));
        }
        if let Some(dea) = self.dea_number() {
            parts.push(format!("DEA: {}", dea));
        }
        parts.join(" / ")
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
