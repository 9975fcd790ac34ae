//! Input validation helpers
//!
//! Caller-side checks run before a prescription reaches the numbering core.
//! Renderers assume these hold and do not re-check them.

use thiserror::Error;

use crate::models::{Drug, GridSheetRequest, PrescriptionRequest};

// ── Text length limits ──────────────────────────────────────────────

/// Person and drug names
pub const MAX_NAME_LEN: usize = 200;

/// Directions / sig text
pub const MAX_DIRECTIONS_LEN: usize = 500;

/// Short identifiers: NDC, NPI, DEA, phone
pub const MAX_SHORT_TEXT_LEN: usize = 100;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(String),

    #[error("{field} is too long ({len} chars, max {max})")]
    TooLong {
        field: String,
        len: usize,
        max: usize,
    },

    #[error("{field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("DEA number is required for controlled substances")]
    MissingDea,
}

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }
    validate_len(value, field, max_len)
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), ValidationError> {
    if let Some(v) = value {
        validate_len(v, field, max_len)?;
    }
    Ok(())
}

fn validate_len(value: &str, field: &str, max_len: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max_len {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            len,
            max: max_len,
        });
    }
    Ok(())
}

fn validate_drug(drug: &Drug) -> Result<(), ValidationError> {
    validate_required_text(&drug.brand_name, "drug.brandName", MAX_NAME_LEN)?;
    validate_required_text(&drug.ndc, "drug.ndc", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&drug.manufacturer, "drug.manufacturer", MAX_NAME_LEN)?;
    drug.schedule().map_err(|e| ValidationError::Invalid {
        field: "drug.controlledSchedule".into(),
        reason: e.to_string(),
    })?;
    Ok(())
}

impl GridSheetRequest {
    /// Validate before rendering a grid sheet
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_drug(&self.drug)?;
        validate_required_text(&self.operator, "operator", MAX_SHORT_TEXT_LEN)
    }
}

impl PrescriptionRequest {
    /// Validate before allocating a number
    ///
    /// A controlled prescription without a prescriber DEA number is rejected
    /// here; the renderers rely on this having been checked.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required_text(&self.patient.first_name, "patient.firstName", MAX_NAME_LEN)?;
        validate_required_text(&self.patient.last_name, "patient.lastName", MAX_NAME_LEN)?;
        validate_required_text(&self.patient.date_of_birth, "patient.dateOfBirth", MAX_SHORT_TEXT_LEN)?;
        validate_drug(&self.drug)?;
        validate_required_text(&self.prescriber.name, "prescriber.name", MAX_NAME_LEN)?;
        validate_optional_text(&self.prescriber.npi, "prescriber.npi", MAX_SHORT_TEXT_LEN)?;
        validate_optional_text(&self.prescriber.dea, "prescriber.dea", MAX_SHORT_TEXT_LEN)?;
        validate_required_text(&self.directions, "directions", MAX_DIRECTIONS_LEN)?;

        if self.drug.is_controlled() && self.prescriber.dea_number().is_none() {
            return Err(ValidationError::MissingDea);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Patient, Pharmacy, Prescriber};
    use chrono::NaiveDate;

    fn request() -> PrescriptionRequest {
        PrescriptionRequest {
            patient: Patient {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                date_of_birth: "1815-12-10".into(),
                ..Default::default()
            },
            drug: Drug {
                brand_name: "Lipitor".into(),
                ndc: "0071-0155-23".into(),
                ..Default::default()
            },
            prescriber: Prescriber {
                name: "Dr. Babbage".into(),
                ..Default::default()
            },
            pharmacy: Pharmacy::default(),
            quantity: 30,
            days_supply: 30,
            refills: 2,
            directions: "Take 1 tablet daily".into(),
            fill_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            package_date: None,
            expiration_date: None,
        }
    }

    #[test]
    fn test_valid_request() {
        assert_eq!(request().validate(), Ok(()));
    }

    #[test]
    fn test_controlled_requires_dea() {
        let mut req = request();
        req.drug.controlled_schedule = Some(2);
        assert_eq!(req.validate(), Err(ValidationError::MissingDea));

        req.prescriber.dea = Some("AB1234563".into());
        assert_eq!(req.validate(), Ok(()));
    }

    #[test]
    fn test_bad_schedule_names_field() {
        let mut req = request();
        req.drug.controlled_schedule = Some(7);
        req.prescriber.dea = Some("AB1234563".into());
        match req.validate() {
            Err(ValidationError::Invalid { field, .. }) => {
                assert_eq!(field, "drug.controlledSchedule")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_grid_sheet_needs_operator() {
        let mut grid = GridSheetRequest {
            drug: request().drug,
            operator: " ".into(),
            fill_date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            package_date: None,
            expiration_date: None,
        };
        assert_eq!(grid.validate(), Err(ValidationError::Empty("operator".into())));

        grid.operator = "jsmith".into();
        assert_eq!(grid.validate(), Ok(()));
    }

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("  ", "name", 10).is_err());
        assert!(validate_required_text("abcdefghijk", "name", 10).is_err());
        assert!(validate_required_text("abc", "name", 10).is_ok());
    }
}
