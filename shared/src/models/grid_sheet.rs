//! Grid Sheet Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Drug;
use super::prescription::today;

/// One 5x5 sheet of identical unit-dose labels for a single drug batch
///
/// No prescription number is involved; the lot number is generated at render
/// time unless `drug.lotNumber` is given.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridSheetRequest {
    pub drug: Drug,
    /// Packaging operator printed in the footer
    pub operator: String,
    #[serde(default = "today")]
    pub fill_date: NaiveDate,
    #[serde(default)]
    pub package_date: Option<NaiveDate>,
    /// Overrides the default fill date + 5 years
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
}

impl GridSheetRequest {
    pub fn package_date(&self) -> NaiveDate {
        self.package_date.unwrap_or(self.fill_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_request_defaults() {
        let json = r#"{
            "drug": {"brandName": "Lipitor", "strength": "20 mg", "ndc": "0071-0155-23"},
            "operator": "jsmith",
            "fillDate": "2025-02-01"
        }"#;
        let request: GridSheetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.package_date(), NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert!(request.expiration_date.is_none());
        assert!(request.drug.lot_number.is_none());
    }
}
