//! Patient Model

use serde::{Deserialize, Serialize};

/// Allergy text printed when none are on file
pub const NO_KNOWN_ALLERGIES: &str = "NKDA";

/// Patient identity block printed on prescription labels
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub first_name: String,
    pub last_name: String,
    /// Kept verbatim as entered (e.g. `1984-02-29`)
    pub date_of_birth: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub allergies: String,
}

impl Patient {
    /// "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Allergy text, `NKDA` when blank
    pub fn allergies_or_default(&self) -> &str {
        let trimmed = self.allergies.trim();
        if trimmed.is_empty() {
            NO_KNOWN_ALLERGIES
        } else {
            trimmed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allergies_default() {
        let mut patient = Patient {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            ..Default::default()
        };
        assert_eq!(patient.allergies_or_default(), "NKDA");

        patient.allergies = "  Penicillin ".into();
        assert_eq!(patient.allergies_or_default(), "Penicillin");
        assert_eq!(patient.full_name(), "Ada Lovelace");
    }
}
