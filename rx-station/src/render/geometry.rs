//! Physical label stock geometry
//!
//! One struct per label stock. Adding a stock means adding a constructor
//! here, not touching the renderers.

use rx_printer::{Bounds, HorizontalAlignment, PT_PER_INCH};

/// Letter-size sheet of square unit-dose labels (points, top-left origin)
#[derive(Debug, Clone, PartialEq)]
pub struct GridGeometry {
    pub page_width: f32,
    pub page_height: f32,
    /// Top-left corner of the first cell
    pub origin: (f32, f32),
    /// Cell pitch (cells are square)
    pub cell_size: f32,
    pub rows: usize,
    pub cols: usize,
    pub rule_width: f32,

    /// Left inset of text inside a cell
    pub text_inset: f32,
    /// First baseline below the cell top
    pub first_baseline: f32,
    /// Advance after brand, generic and strength lines
    pub line_step: f32,
    /// Advance after the lot line and after the form line
    pub wide_step: f32,
    pub detail_font_size: f32,
    pub max_name_len: usize,

    pub barcode_width: f32,
    pub barcode_height: f32,
    /// Gap between the bars and the NDC line
    pub barcode_gap: f32,
    pub barcode_module_width: u32,
    pub barcode_raster_height: u32,
    pub barcode_margin: u32,

    pub ndc_font_size: f32,
    pub ndc_step: f32,

    pub expiration_oval: (f32, f32),
    pub expiration_oval_width: f32,
    /// Baseline offset of the expiration text from the oval center
    pub expiration_text_offset: f32,

    /// Footer baseline, measured up from the cell bottom
    pub footer_offset: f32,
    pub footer_font_size: f32,

    /// Badge center inset from the cell's top-right corner
    pub badge_inset: f32,
    pub badge_radius: f32,
    pub badge_line_width: f32,
    pub badge_font_size: f32,
    pub badge_text_offset: f32,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            page_width: 8.5 * PT_PER_INCH,
            page_height: 11.0 * PT_PER_INCH,
            origin: (64.8, 75.6),
            cell_size: 85.68,
            rows: 5,
            cols: 5,
            rule_width: 1.0,

            text_inset: 3.6,
            first_baseline: 8.0,
            line_step: 7.2,
            wide_step: 7.9,
            detail_font_size: 8.0,
            max_name_len: 35,

            barcode_width: 60.0,
            barcode_height: 12.96,
            barcode_gap: 4.0,
            barcode_module_width: 1,
            barcode_raster_height: 40,
            barcode_margin: 0,

            ndc_font_size: 6.0,
            ndc_step: 6.5,

            expiration_oval: (72.0, 10.08),
            expiration_oval_width: 1.2,
            expiration_text_offset: 2.0,

            footer_offset: 5.0,
            footer_font_size: 4.0,

            badge_inset: 10.8,
            badge_radius: 7.2,
            badge_line_width: 0.5,
            badge_font_size: 5.0,
            badge_text_offset: 1.5,
        }
    }
}

/// A grid position and its top-left corner on the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    pub x: f32,
    pub y: f32,
}

impl GridGeometry {
    pub fn cell(&self, row: usize, col: usize) -> GridCell {
        GridCell {
            row,
            col,
            x: self.origin.0 + col as f32 * self.cell_size,
            y: self.origin.1 + row as f32 * self.cell_size,
        }
    }

    /// Every cell, row-major
    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| self.cell(row, col)))
    }

    pub fn grid_width(&self) -> f32 {
        self.cols as f32 * self.cell_size
    }

    pub fn grid_height(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }
}

/// Text regions of a prescription label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    PharmacyHeader,
    PatientInfo,
    DrugInfo,
    Directions,
    AdditionalInfo,
}

impl BlockKind {
    /// Object name in the label descriptor
    pub fn object_name(self) -> &'static str {
        match self {
            Self::PharmacyHeader => "PharmacyHeader",
            Self::PatientInfo => "PatientInfo",
            Self::DrugInfo => "DrugInfo",
            Self::Directions => "Directions",
            Self::AdditionalInfo => "AdditionalInfo",
        }
    }
}

/// Placement and style of one text region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockSpec {
    pub kind: BlockKind,
    /// Twips
    pub bounds: Bounds,
    pub font_size: u32,
    pub bold: bool,
    pub align: HorizontalAlignment,
}

/// Die-cut prescription label (30252 Address stock, landscape)
///
/// Bounds are twips and fixed: label hardware depends on them.
#[derive(Debug, Clone, PartialEq)]
pub struct PrescriptionGeometry {
    pub label_id: &'static str,
    pub paper_name: &'static str,
    pub landscape: bool,
    pub outline: Bounds,
    pub corner_radius: u32,
    pub blocks: [BlockSpec; 5],

    pub barcode_bounds: Bounds,
    pub barcode_type: &'static str,
    pub barcode_font_size: u32,
    pub bar_height: u32,
    pub bar_width: u32,

    pub barcode_module_width: u32,
    pub barcode_raster_height: u32,
    pub barcode_margin: u32,

    /// Smallest size shrink-to-fit goes down to in the PDF rendition
    pub min_font_size: f32,
    pub font_step: f32,
    pub line_spacing: f32,
}

impl Default for PrescriptionGeometry {
    fn default() -> Self {
        Self {
            label_id: "RxLabel",
            paper_name: "30252 Address",
            landscape: true,
            outline: Bounds::new(0, 0, 5760, 3240),
            corner_radius: 270,
            blocks: [
                BlockSpec {
                    kind: BlockKind::PharmacyHeader,
                    bounds: Bounds::new(144, 144, 5472, 432),
                    font_size: 10,
                    bold: true,
                    align: HorizontalAlignment::Center,
                },
                BlockSpec {
                    kind: BlockKind::PatientInfo,
                    bounds: Bounds::new(144, 576, 3600, 432),
                    font_size: 8,
                    bold: false,
                    align: HorizontalAlignment::Left,
                },
                BlockSpec {
                    kind: BlockKind::DrugInfo,
                    bounds: Bounds::new(144, 1008, 3600, 432),
                    font_size: 12,
                    bold: true,
                    align: HorizontalAlignment::Left,
                },
                BlockSpec {
                    kind: BlockKind::Directions,
                    bounds: Bounds::new(144, 1440, 3600, 432),
                    font_size: 10,
                    bold: false,
                    align: HorizontalAlignment::Left,
                },
                BlockSpec {
                    kind: BlockKind::AdditionalInfo,
                    bounds: Bounds::new(144, 1872, 3600, 1224),
                    font_size: 7,
                    bold: false,
                    align: HorizontalAlignment::Left,
                },
            ],

            barcode_bounds: Bounds::new(3888, 1440, 1584, 720),
            barcode_type: "Code128Auto",
            barcode_font_size: 8,
            bar_height: 576,
            bar_width: 2,

            barcode_module_width: 2,
            barcode_raster_height: 50,
            barcode_margin: 5,

            min_font_size: 4.0,
            font_step: 0.5,
            line_spacing: 1.15,
        }
    }
}

impl PrescriptionGeometry {
    pub fn block(&self, kind: BlockKind) -> &BlockSpec {
        // Every BlockKind has exactly one entry in `blocks`
        self.blocks
            .iter()
            .find(|b| b.kind == kind)
            .unwrap_or(&self.blocks[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_cells() {
        let geometry = GridGeometry::default();
        let cells: Vec<_> = geometry.cells().collect();
        assert_eq!(cells.len(), 25);
        assert_eq!((cells[0].x, cells[0].y), (64.8, 75.6));

        let last = cells[24];
        assert_eq!((last.row, last.col), (4, 4));
        assert!((last.x - (64.8 + 4.0 * 85.68)).abs() < 1e-3);

        // The grid fits on a letter page
        assert!(geometry.origin.0 + geometry.grid_width() < geometry.page_width);
        assert!(geometry.origin.1 + geometry.grid_height() < geometry.page_height);
    }

    #[test]
    fn test_barcode_clear_of_text_blocks() {
        let geometry = PrescriptionGeometry::default();
        for kind in [
            BlockKind::PatientInfo,
            BlockKind::DrugInfo,
            BlockKind::Directions,
            BlockKind::AdditionalInfo,
        ] {
            assert!(
                !geometry.block(kind).bounds.overlaps(&geometry.barcode_bounds),
                "{:?} overlaps the barcode",
                kind
            );
        }
    }

    #[test]
    fn test_blocks_inside_outline() {
        let geometry = PrescriptionGeometry::default();
        for block in &geometry.blocks {
            assert!(block.bounds.right() <= geometry.outline.right());
            assert!(block.bounds.bottom() <= geometry.outline.bottom());
        }
        assert_eq!(geometry.block(BlockKind::AdditionalInfo).font_size, 7);
    }
}
