//! Prescription Model
//!
//! A [`PrescriptionRequest`] is what the UI shell hands over: validated, not
//! yet numbered. Stamping it with an allocated [`PrescriptionNumber`] yields
//! the [`LabelRecord`] every renderer consumes.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Drug, Patient, Pharmacy, Prescriber};

/// Independent prescription counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterKind {
    Standard,
    Controlled,
}

impl CounterKind {
    pub const ALL: [CounterKind; 2] = [CounterKind::Standard, CounterKind::Controlled];

    /// Counter key in the backing store
    pub fn key(self) -> &'static str {
        match self {
            Self::Standard => "rxCounter",
            Self::Controlled => "crxCounter",
        }
    }

    /// Documented first value of the counter
    pub fn default_seed(self) -> u64 {
        match self {
            Self::Standard => 1_000_000,
            Self::Controlled => 5_000_000,
        }
    }

    /// Counter a drug draws from: controlled when a schedule is present
    pub fn for_drug(drug: &Drug) -> Self {
        if drug.is_controlled() {
            Self::Controlled
        } else {
            Self::Standard
        }
    }
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Controlled => write!(f, "controlled"),
        }
    }
}

/// Issued prescription identifier
///
/// Standard numbers are the decimal counter value; controlled numbers carry a
/// `C` prefix. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrescriptionNumber(String);

impl PrescriptionNumber {
    pub const CONTROLLED_PREFIX: &'static str = "C";

    /// Format an allocated counter value
    pub fn issue(kind: CounterKind, value: u64) -> Self {
        match kind {
            CounterKind::Standard => Self(value.to_string()),
            CounterKind::Controlled => Self(format!("{}{}", Self::CONTROLLED_PREFIX, value)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_controlled(&self) -> bool {
        self.0.starts_with(Self::CONTROLLED_PREFIX)
    }
}

impl fmt::Display for PrescriptionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PrescriptionNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Prescription as submitted by the caller, before numbering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionRequest {
    pub patient: Patient,
    pub drug: Drug,
    pub prescriber: Prescriber,
    #[serde(default)]
    pub pharmacy: Pharmacy,
    pub quantity: u32,
    pub days_supply: u32,
    #[serde(default)]
    pub refills: u32,
    pub directions: String,
    #[serde(default = "today")]
    pub fill_date: NaiveDate,
    #[serde(default)]
    pub package_date: Option<NaiveDate>,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
}

impl PrescriptionRequest {
    /// Counter this prescription draws its number from
    pub fn counter_kind(&self) -> CounterKind {
        CounterKind::for_drug(&self.drug)
    }

    /// Stamp the allocated number, producing the render-ready record
    pub fn into_record(self, rx_number: PrescriptionNumber) -> LabelRecord {
        LabelRecord {
            patient: self.patient,
            drug: self.drug,
            prescriber: self.prescriber,
            pharmacy: self.pharmacy,
            rx_number,
            quantity: self.quantity,
            days_supply: self.days_supply,
            refills: self.refills,
            directions: self.directions,
            fill_date: self.fill_date,
            package_date: self.package_date,
            expiration_date: self.expiration_date,
        }
    }
}

/// Fully resolved prescription label data
///
/// Built per print request and never persisted by the label core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelRecord {
    pub patient: Patient,
    pub drug: Drug,
    pub prescriber: Prescriber,
    pub pharmacy: Pharmacy,
    pub rx_number: PrescriptionNumber,
    pub quantity: u32,
    pub days_supply: u32,
    pub refills: u32,
    pub directions: String,
    pub fill_date: NaiveDate,
    pub package_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
}

impl LabelRecord {
    /// Packaging date, defaulting to the fill date
    pub fn package_date(&self) -> NaiveDate {
        self.package_date.unwrap_or(self.fill_date)
    }
}

/// US short date (`3/7/2025`)
pub fn us_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}
