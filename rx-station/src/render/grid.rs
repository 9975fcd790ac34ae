//! Grid sheet renderer
//!
//! Lays out a 5x5 sheet of identical unit-dose labels for one drug batch:
//! every cell carries the same drug, lot and expiration.

use std::sync::Arc;

use chrono::{Months, NaiveDate};
use rand::Rng;
use rx_printer::{
    BarcodeRaster, BarcodeRequest, Face, HYPHEN_AND_SPACE, Page, canonicalize, font_size_for,
    truncate,
};
use shared::models::{ControlledSchedule, Drug, GridSheetRequest, us_date};

use super::error::{RenderError, RenderResult};
use super::geometry::{GridCell, GridGeometry};
use super::lot::generate_lot_number;
use super::{GridSheetOutput, RenderedLabel, resolve_schedule};

/// Default shelf life of a packaged batch
pub const SHELF_LIFE_MONTHS: u32 = 60;

/// Grid sheet with every per-render value resolved
#[derive(Debug, Clone, PartialEq)]
pub struct GridSheet {
    pub drug: Drug,
    pub schedule: Option<ControlledSchedule>,
    pub lot_number: String,
    pub package_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub operator: String,
}

/// `{brand}_{strength}` with spaces replaced by underscores
pub fn grid_file_stem(drug: &Drug) -> String {
    format!("{}_{}", drug.brand_name, drug.strength).replace(' ', "_")
}

/// Text shared by all cells, sized once per render
struct CellText {
    brand: String,
    brand_size: f32,
    generic: String,
    generic_size: f32,
    expiration: String,
    footer: String,
    badge: Option<String>,
}

/// Grid sheet renderer
#[derive(Debug, Clone, Default)]
pub struct GridSheetRenderer {
    geometry: GridGeometry,
}

impl GridSheetRenderer {
    pub fn new(geometry: GridGeometry) -> Self {
        Self { geometry }
    }

    /// Resolve schedule, lot and dates for one render
    ///
    /// The lot number is drawn fresh from `rng` on every call, whatever the
    /// drug record carries. Expiration defaults to fill date + 5 years.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        request: &GridSheetRequest,
        rng: &mut R,
    ) -> RenderResult<GridSheet> {
        let schedule = resolve_schedule(&request.drug)?;

        let lot_number = generate_lot_number(rng);

        let expiration_date = match request.expiration_date {
            Some(date) => date,
            None => request
                .fill_date
                .checked_add_months(Months::new(SHELF_LIFE_MONTHS))
                .ok_or_else(|| RenderError::invalid("fillDate", "expiration date out of range"))?,
        };

        Ok(GridSheet {
            drug: request.drug.clone(),
            schedule,
            lot_number,
            package_date: request.package_date(),
            expiration_date,
            operator: request.operator.clone(),
        })
    }

    /// Barcode of the NDC, hyphens and spaces stripped
    pub fn barcode_request(&self, drug: &Drug) -> RenderResult<BarcodeRequest> {
        let text = canonicalize(&drug.ndc, HYPHEN_AND_SPACE);
        if text.is_empty() {
            return Err(RenderError::invalid("drug.ndc", "empty after removing separators"));
        }
        Ok(BarcodeRequest::code128(text)
            .module_width(self.geometry.barcode_module_width)
            .height(self.geometry.barcode_raster_height)
            .margin(self.geometry.barcode_margin))
    }

    /// Compose the sheet
    pub fn render(&self, sheet: &GridSheet, barcode: Arc<BarcodeRaster>) -> RenderedLabel {
        let g = &self.geometry;
        let brand = truncate(&sheet.drug.brand_name, g.max_name_len);
        let generic = truncate(&sheet.drug.generic_name, g.max_name_len);
        let text = CellText {
            brand_size: font_size_for(&brand),
            generic_size: font_size_for(&generic),
            brand,
            generic,
            expiration: format!("Exp: {}", us_date(sheet.expiration_date)),
            footer: format!("Pkg: {} by {}", us_date(sheet.package_date), sheet.operator),
            badge: sheet.schedule.map(ControlledSchedule::badge),
        };

        let mut page = Page::new(g.page_width, g.page_height);
        self.render_rules(&mut page);
        for cell in g.cells() {
            self.render_cell(&mut page, cell, sheet, &text, &barcode);
        }

        RenderedLabel::GridSheet(GridSheetOutput {
            file_stem: grid_file_stem(&sheet.drug),
            title: format!("{} {}", sheet.drug.brand_name, sheet.drug.strength),
            pages: vec![page],
            lot_number: sheet.lot_number.clone(),
            expiration_date: sheet.expiration_date,
        })
    }

    /// Horizontal and vertical cell borders
    fn render_rules(&self, page: &mut Page) {
        let g = &self.geometry;
        let (x0, y0) = g.origin;

        for row in 0..=g.rows {
            let y = y0 + row as f32 * g.cell_size;
            page.line((x0, y), (x0 + g.grid_width(), y), g.rule_width);
        }
        for col in 0..=g.cols {
            let x = x0 + col as f32 * g.cell_size;
            page.line((x, y0), (x, y0 + g.grid_height()), g.rule_width);
        }
    }

    fn render_cell(
        &self,
        page: &mut Page,
        cell: GridCell,
        sheet: &GridSheet,
        text: &CellText,
        barcode: &Arc<BarcodeRaster>,
    ) {
        let g = &self.geometry;
        let left = cell.x + g.text_inset;
        let center_x = cell.x + g.cell_size / 2.0;
        let mut y = cell.y + g.first_baseline;

        // Schedule badge in the top-right corner
        if let Some(badge) = &text.badge {
            let center = (cell.x + g.cell_size - g.badge_inset, cell.y + g.badge_inset);
            page.circle(center, g.badge_radius, g.badge_line_width)
                .centered_text(
                    center.0,
                    center.1 + g.badge_text_offset,
                    badge.as_str(),
                    Face::TimesBold,
                    g.badge_font_size,
                );
        }

        page.text(left, y, text.brand.as_str(), Face::HelveticaBold, text.brand_size);
        y += g.line_step;

        page.text(left, y, text.generic.as_str(), Face::Helvetica, text.generic_size);
        y += g.line_step;

        page.text(left, y, sheet.drug.strength.as_str(), Face::Helvetica, g.detail_font_size);
        y += g.line_step;

        page.text(left, y, sheet.lot_number.as_str(), Face::Helvetica, g.detail_font_size);
        y += g.wide_step;

        page.image(
            center_x - g.barcode_width / 2.0,
            y,
            g.barcode_width,
            g.barcode_height,
            Arc::clone(barcode),
        );
        y += g.barcode_height + g.barcode_gap;

        page.centered_text(center_x, y, sheet.drug.ndc.as_str(), Face::Helvetica, g.ndc_font_size);
        y += g.ndc_step;

        page.text(left, y, sheet.drug.form.as_str(), Face::Helvetica, g.detail_font_size);
        y += g.wide_step;

        let (oval_w, oval_h) = g.expiration_oval;
        page.ellipse((center_x, y), oval_w / 2.0, oval_h / 2.0, g.expiration_oval_width)
            .centered_text(
                center_x,
                y + g.expiration_text_offset,
                text.expiration.as_str(),
                Face::Helvetica,
                g.detail_font_size,
            );

        page.text(
            left,
            cell.y + g.cell_size - g.footer_offset,
            text.footer.as_str(),
            Face::Helvetica,
            g.footer_font_size,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rx_printer::{Code128Rasterizer, DrawOp};

    fn request(schedule: Option<u8>) -> GridSheetRequest {
        GridSheetRequest {
            drug: Drug {
                brand_name: "Lipitor".into(),
                generic_name: "Atorvastatin Calcium".into(),
                strength: "20 mg".into(),
                form: "Tablet".into(),
                ndc: "0071-0155 23".into(),
                controlled_schedule: schedule,
                ..Default::default()
            },
            operator: "jsmith".into(),
            fill_date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            package_date: None,
            expiration_date: None,
        }
    }

    fn render(schedule: Option<u8>) -> (GridSheet, GridSheetOutput) {
        let renderer = GridSheetRenderer::default();
        let sheet = renderer
            .resolve(&request(schedule), &mut StdRng::seed_from_u64(1))
            .unwrap();
        let barcode_request = renderer.barcode_request(&sheet.drug).unwrap();
        let raster = Code128Rasterizer::rasterize_blocking(&barcode_request).unwrap();
        match renderer.render(&sheet, Arc::new(raster)) {
            RenderedLabel::GridSheet(output) => (sheet, output),
            other => panic!("unexpected {:?}", other.kind()),
        }
    }

    #[test]
    fn test_resolve_dates_and_lot() {
        let (sheet, output) = render(None);
        assert_eq!(sheet.expiration_date, NaiveDate::from_ymd_opt(2030, 2, 1).unwrap());
        assert_eq!(sheet.package_date, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!(sheet.lot_number.len(), 7);
        assert_eq!(output.lot_number, sheet.lot_number);
        assert_eq!(output.file_stem, "Lipitor_20_mg");
    }

    #[test]
    fn test_lot_drawn_per_render() {
        let mut req = request(None);
        req.drug.lot_number = Some("ABC12D3".into());
        req.expiration_date = NaiveDate::from_ymd_opt(2026, 6, 30);
        let renderer = GridSheetRenderer::default();

        let first = renderer.resolve(&req, &mut StdRng::seed_from_u64(1)).unwrap();
        let again = renderer.resolve(&req, &mut StdRng::seed_from_u64(1)).unwrap();
        let other = renderer.resolve(&req, &mut StdRng::seed_from_u64(2)).unwrap();

        assert_ne!(first.lot_number, "ABC12D3");
        assert_eq!(first.lot_number, again.lot_number);
        assert_ne!(first.lot_number, other.lot_number);
        assert_eq!(first.expiration_date, NaiveDate::from_ymd_opt(2026, 6, 30).unwrap());
    }

    #[test]
    fn test_barcode_strips_hyphens_and_spaces() {
        let renderer = GridSheetRenderer::default();
        let barcode = renderer.barcode_request(&request(None).drug).unwrap();
        assert_eq!(barcode.text, "0071015523");
        assert_eq!((barcode.module_width, barcode.height, barcode.margin), (1, 40, 0));
        assert!(!barcode.show_text);
    }

    #[test]
    fn test_every_cell_identical() {
        let (sheet, output) = render(None);
        let page = &output.pages[0];

        let count = |needle: &str| page.texts().filter(|t| t.text == needle).count();
        assert_eq!(count("Lipitor"), 25);
        assert_eq!(count(&sheet.lot_number), 25);
        assert_eq!(count("Exp: 2/1/2030"), 25);
        assert_eq!(count("Pkg: 2/1/2025 by jsmith"), 25);
        assert_eq!(count("0071-0155 23"), 25);

        let images = page.ops.iter().filter(|op| matches!(op, DrawOp::Image { .. })).count();
        let rules = page.ops.iter().filter(|op| matches!(op, DrawOp::Line { .. })).count();
        assert_eq!(images, 25);
        assert_eq!(rules, 12);
    }

    #[test]
    fn test_first_cell_layout() {
        let (_, output) = render(None);
        let page = &output.pages[0];
        let brand = page.texts().find(|t| t.text == "Lipitor").unwrap();
        assert!((brand.x - 68.4).abs() < 1e-3);
        assert!((brand.y - 83.6).abs() < 1e-3);
        assert_eq!(brand.face, Face::HelveticaBold);

        // 20 characters: one step below the base size
        let generic = page.texts().find(|t| t.text == "Atorvastatin Calcium").unwrap();
        assert_eq!(generic.size, 6.5);
    }

    #[test]
    fn test_badge_only_when_controlled() {
        let (_, plain) = render(None);
        let circles = |o: &GridSheetOutput| {
            o.pages[0]
                .ops
                .iter()
                .filter(|op| matches!(op, DrawOp::Circle { .. }))
                .count()
        };
        assert_eq!(circles(&plain), 0);

        let (_, controlled) = render(Some(3));
        assert_eq!(circles(&controlled), 25);
        assert_eq!(
            controlled.pages[0].texts().filter(|t| t.text == "CIII").count(),
            25
        );
    }

    #[test]
    fn test_long_names_truncated() {
        let mut req = request(None);
        req.drug.brand_name = "X".repeat(50);
        let renderer = GridSheetRenderer::default();
        let sheet = renderer.resolve(&req, &mut StdRng::seed_from_u64(1)).unwrap();
        let raster = Code128Rasterizer::rasterize_blocking(&renderer.barcode_request(&sheet.drug).unwrap()).unwrap();
        let RenderedLabel::GridSheet(output) = renderer.render(&sheet, Arc::new(raster)) else {
            panic!("expected grid sheet");
        };
        let brand = output.pages[0].texts().find(|t| t.text.starts_with('X')).unwrap();
        assert_eq!(brand.text.len(), 35);
        assert_eq!(brand.size, 3.5);
    }

    #[test]
    fn test_bad_schedule_names_field() {
        let err = GridSheetRenderer::default()
            .resolve(&request(Some(1)), &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        match err {
            RenderError::InvalidField { field, .. } => assert_eq!(field, "drug.controlledSchedule"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
