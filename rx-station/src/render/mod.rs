//! Label rendering
//!
//! Renderers turn resolved data into a [`RenderedLabel`]: drawing pages and,
//! for die-cut labels, descriptor documents. Encoding to bytes happens in
//! [`crate::output`].

pub mod error;
pub mod geometry;
pub mod grid;
pub mod lot;
pub mod prescription;

use chrono::NaiveDate;
use rx_printer::{LabelDescriptor, Page};
use shared::models::{ControlledSchedule, Drug, PrescriptionNumber};

pub use error::{RenderError, RenderResult};
pub use geometry::{BlockKind, BlockSpec, GridCell, GridGeometry, PrescriptionGeometry};
pub use grid::{GridSheet, GridSheetRenderer, SHELF_LIFE_MONTHS, grid_file_stem};
pub use lot::generate_lot_number;
pub use prescription::{
    CRX_CAPTION, LabelContent, PrescriptionRenderer, RX_CAPTION, prescription_file_stem,
};

/// Resolve a drug's schedule, naming the field when it is unsupported
pub fn resolve_schedule(drug: &Drug) -> RenderResult<Option<ControlledSchedule>> {
    drug.schedule()
        .map_err(|e| RenderError::invalid("drug.controlledSchedule", e.to_string()))
}

/// Rendered grid sheet
#[derive(Debug, Clone)]
pub struct GridSheetOutput {
    /// `{brand}_{strength}`
    pub file_stem: String,
    pub title: String,
    pub pages: Vec<Page>,
    pub lot_number: String,
    pub expiration_date: NaiveDate,
}

/// One physical prescription label
#[derive(Debug, Clone)]
pub struct PrescriptionCopy {
    /// 1-based
    pub copy: usize,
    pub page: Page,
    pub descriptor: LabelDescriptor,
}

/// Rendered prescription labels, one entry per copy
#[derive(Debug, Clone)]
pub struct PrescriptionOutput {
    pub rx_number: PrescriptionNumber,
    /// `rxlabel_{rx}_{lastName}`
    pub file_stem: String,
    pub title: String,
    pub copies: Vec<PrescriptionCopy>,
}

/// Renderer output handed to the output adapter
#[derive(Debug, Clone)]
pub enum RenderedLabel {
    GridSheet(GridSheetOutput),
    Prescription(PrescriptionOutput),
}

impl RenderedLabel {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GridSheet(_) => "grid sheet",
            Self::Prescription(_) => "prescription",
        }
    }
}
