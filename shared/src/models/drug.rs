//! Drug Model

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unsupported controlled-substance schedule value
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("unsupported controlled schedule: {0} (expected 2-5)")]
pub struct ScheduleError(pub u8);

/// DEA controlled-substance schedule (II-V)
///
/// Schedule I substances are not dispensable and have no label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlledSchedule {
    II,
    III,
    IV,
    V,
}

impl ControlledSchedule {
    /// Numeric schedule (2-5)
    pub fn number(self) -> u8 {
        match self {
            Self::II => 2,
            Self::III => 3,
            Self::IV => 4,
            Self::V => 5,
        }
    }

    /// Roman numeral
    pub fn roman(self) -> &'static str {
        match self {
            Self::II => "II",
            Self::III => "III",
            Self::IV => "IV",
            Self::V => "V",
        }
    }

    /// Badge code printed inside the schedule circle (`CII`..`CV`)
    pub fn badge(self) -> String {
        format!("C{}", self.roman())
    }
}

impl TryFrom<u8> for ControlledSchedule {
    type Error = ScheduleError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Self::II),
            3 => Ok(Self::III),
            4 => Ok(Self::IV),
            5 => Ok(Self::V),
            other => Err(ScheduleError(other)),
        }
    }
}

/// Drug identity and packaging data
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Drug {
    pub brand_name: String,
    #[serde(default)]
    pub generic_name: String,
    #[serde(default)]
    pub strength: String,
    /// Dosage form (tablet, capsule, ...)
    #[serde(default)]
    pub form: String,
    pub ndc: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub lot_number: Option<String>,
    /// Raw schedule number as entered; resolved with [`Drug::schedule`]
    #[serde(default)]
    pub controlled_schedule: Option<u8>,
}

impl Drug {
    /// Resolve the controlled schedule, if any
    pub fn schedule(&self) -> Result<Option<ControlledSchedule>, ScheduleError> {
        self.controlled_schedule
            .map(ControlledSchedule::try_from)
            .transpose()
    }

    /// Whether a schedule was supplied (valid or not)
    pub fn is_controlled(&self) -> bool {
        self.controlled_schedule.is_some()
    }

    /// Name printed on prescription labels: brand plus strength when known
    pub fn label_name(&self) -> String {
        let strength = self.strength.trim();
        if strength.is_empty() {
            self.brand_name.trim().to_string()
        } else {
            format!("{} {}", self.brand_name.trim(), strength)
        }
    }
}
