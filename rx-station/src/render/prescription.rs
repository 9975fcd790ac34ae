//! Prescription label renderer
//!
//! Composes the text of one die-cut label once, then emits each copy both as
//! a PDF page and as a label descriptor from that same content. Copies are
//! identical; the number on them is allocated once per prescription.

use std::sync::Arc;

use rx_printer::{
    BarcodeObject, BarcodeRaster, BarcodeRequest, Face, FontSpec, HYPHEN, HorizontalAlignment,
    LabelDescriptor, Page, RoundRect, TextObject, canonicalize, chars_per_line,
    twips_to_pt, wrap_text,
};
use shared::models::{LabelRecord, PrescriptionNumber, us_date};

use super::error::{RenderError, RenderResult};
use super::geometry::{BlockKind, BlockSpec, PrescriptionGeometry};
use super::{PrescriptionCopy, PrescriptionOutput, RenderedLabel, resolve_schedule};

/// Number caption on standard labels
pub const RX_CAPTION: &str = "RX#:";

/// Number caption on controlled-substance labels
pub const CRX_CAPTION: &str = "CRX#:";

/// `rxlabel_{rx}_{lastName}`
pub fn prescription_file_stem(record: &LabelRecord) -> String {
    format!("rxlabel_{}_{}", record.rx_number, record.patient.last_name)
}

/// Text of every block plus the barcode payload
#[derive(Debug, Clone, PartialEq)]
pub struct LabelContent {
    pub blocks: Vec<(BlockSpec, String)>,
    /// Canonical (hyphen-stripped) prescription number
    pub barcode_text: String,
}

impl LabelContent {
    pub fn text(&self, kind: BlockKind) -> Option<&str> {
        self.blocks
            .iter()
            .find(|(spec, _)| spec.kind == kind)
            .map(|(_, text)| text.as_str())
    }
}

/// Prescription label renderer
#[derive(Debug, Clone, Default)]
pub struct PrescriptionRenderer {
    geometry: PrescriptionGeometry,
}

impl PrescriptionRenderer {
    pub fn new(geometry: PrescriptionGeometry) -> Self {
        Self { geometry }
    }

    /// Barcode of the prescription number, hyphens stripped
    pub fn barcode_request(&self, rx_number: &PrescriptionNumber) -> RenderResult<BarcodeRequest> {
        let text = canonicalize(rx_number.as_str(), HYPHEN);
        if text.is_empty() {
            return Err(RenderError::invalid("rxNumber", "empty"));
        }
        Ok(BarcodeRequest::code128(text)
            .module_width(self.geometry.barcode_module_width)
            .height(self.geometry.barcode_raster_height)
            .margin(self.geometry.barcode_margin))
    }

    /// Compose the label text
    ///
    /// Expects a caller-validated record: a controlled prescription without a
    /// prescriber DEA number is not rejected here. Missing NPI, DEA or
    /// manufacturer are left out rather than failing.
    pub fn compose(&self, record: &LabelRecord) -> RenderResult<LabelContent> {
        resolve_schedule(&record.drug)?;

        let caption = if record.drug.is_controlled() {
            CRX_CAPTION
        } else {
            RX_CAPTION
        };

        let pharmacy = &record.pharmacy;
        let patient = &record.patient;

        let header = format!("{}\n{}\n{}", pharmacy.name, pharmacy.address, pharmacy.phone);
        let patient_info = format!(
            "Patient: {}\nDOB: {}\nAddress: {}\nPhone: {}",
            patient.full_name(),
            patient.date_of_birth,
            patient.address,
            patient.phone
        );
        let drug_info = format!(
            "{}\n{} {}",
            record.drug.label_name(),
            caption,
            record.rx_number
        );
        let directions = format!("Directions: {}", record.directions);

        let mut additional = Vec::with_capacity(6);
        if let Some(mfr) = record
            .drug
            .manufacturer
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
        {
            additional.push(format!("Mfr: {}", mfr));
        }
        additional.push(format!("NDC: {}", record.drug.ndc));
        additional.push(format!("Prescriber: {}", record.prescriber.display()));
        additional.push(format!(
            "QTY: {}  Days Supply: {}  Refills: {}",
            record.quantity, record.days_supply, record.refills
        ));
        additional.push(format!("Allergies: {}", patient.allergies_or_default()));
        additional.push(format!("Filled: {}", us_date(record.fill_date)));

        let blocks = self
            .geometry
            .blocks
            .iter()
            .map(|spec| {
                let text = match spec.kind {
                    BlockKind::PharmacyHeader => header.clone(),
                    BlockKind::PatientInfo => patient_info.clone(),
                    BlockKind::DrugInfo => drug_info.clone(),
                    BlockKind::Directions => directions.clone(),
                    BlockKind::AdditionalInfo => additional.join("\n"),
                };
                (*spec, text)
            })
            .collect();

        Ok(LabelContent {
            blocks,
            barcode_text: canonicalize(record.rx_number.as_str(), HYPHEN),
        })
    }

    /// Compose `copies` identical labels
    pub fn render(
        &self,
        record: &LabelRecord,
        copies: usize,
        barcode: Arc<BarcodeRaster>,
    ) -> RenderResult<RenderedLabel> {
        if copies == 0 {
            return Err(RenderError::invalid("copies", "at least one copy is required"));
        }
        let content = self.compose(record)?;

        let copies = (1..=copies)
            .map(|copy| PrescriptionCopy {
                copy,
                page: self.render_page(&content, &barcode),
                descriptor: self.build_descriptor(&content),
            })
            .collect();

        Ok(RenderedLabel::Prescription(PrescriptionOutput {
            rx_number: record.rx_number.clone(),
            file_stem: prescription_file_stem(record),
            title: format!("Rx {}", record.rx_number),
            copies,
        }))
    }

    /// One PDF page sized to the die-cut label
    fn render_page(&self, content: &LabelContent, barcode: &Arc<BarcodeRaster>) -> Page {
        let g = &self.geometry;
        let mut page = Page::new(twips_to_pt(g.outline.width), twips_to_pt(g.outline.height));

        for (spec, text) in &content.blocks {
            self.render_block(&mut page, spec, text);
        }

        // Bars on top, caption in the band below
        let b = &g.barcode_bounds;
        let (x, y) = (twips_to_pt(b.x), twips_to_pt(b.y));
        let (w, h) = (twips_to_pt(b.width), twips_to_pt(b.height));
        let caption_size = g.barcode_font_size as f32;
        let bars_height = (h - caption_size - 2.0).max(1.0);
        page.image(x, y, w, bars_height, Arc::clone(barcode))
            .centered_text(x + w / 2.0, y + h - 1.0, content.barcode_text.as_str(), Face::Helvetica, caption_size);

        page
    }

    /// Wrap and shrink a block until it fits its bounds
    fn render_block(&self, page: &mut Page, spec: &BlockSpec, text: &str) {
        let g = &self.geometry;
        let x = twips_to_pt(spec.bounds.x);
        let top = twips_to_pt(spec.bounds.y);
        let width = twips_to_pt(spec.bounds.width);
        let height = twips_to_pt(spec.bounds.height);

        let mut size = spec.font_size as f32;
        let mut lines = wrap_text(text, chars_per_line(width, size));
        while lines.len() as f32 * size * g.line_spacing > height && size - g.font_step >= g.min_font_size {
            size -= g.font_step;
            lines = wrap_text(text, chars_per_line(width, size));
        }

        let leading = size * g.line_spacing;
        let max_lines = ((height / leading).floor() as usize).max(1);
        lines.truncate(max_lines);

        let face = Face::helvetica(spec.bold);
        for (i, line) in lines.into_iter().enumerate() {
            let baseline = top + size + i as f32 * leading;
            match spec.align {
                HorizontalAlignment::Left => page.text(x, baseline, line, face, size),
                HorizontalAlignment::Center => page.centered_text(x + width / 2.0, baseline, line, face, size),
            };
        }
    }

    fn build_descriptor(&self, content: &LabelContent) -> LabelDescriptor {
        let g = &self.geometry;
        LabelDescriptor {
            id: g.label_id.to_string(),
            paper_name: g.paper_name.to_string(),
            landscape: g.landscape,
            outline: RoundRect {
                bounds: g.outline,
                rx: g.corner_radius,
                ry: g.corner_radius,
            },
            text_objects: content
                .blocks
                .iter()
                .map(|(spec, text)| TextObject {
                    name: spec.kind.object_name().to_string(),
                    text: text.clone(),
                    font: FontSpec::arial(spec.font_size, spec.bold),
                    align: spec.align,
                    bounds: spec.bounds,
                })
                .collect(),
            barcode: BarcodeObject {
                name: "RxBarcode".into(),
                text: content.barcode_text.clone(),
                barcode_type: g.barcode_type.to_string(),
                show_text: true,
                font: FontSpec::arial(g.barcode_font_size, false),
                bar_height: g.bar_height,
                bar_width: g.bar_width,
                bounds: g.barcode_bounds,
            },
        }
    }
}
