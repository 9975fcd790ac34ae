//! Drawing IR shared by every label layout
//!
//! Coordinates are PostScript points with the origin at the top-left corner
//! of the page; text `y` is the baseline. Writers convert to their own
//! coordinate systems.

use std::sync::Arc;

use crate::barcode::BarcodeRaster;

/// Points per inch
pub const PT_PER_INCH: f32 = 72.0;

/// Twips per point
pub const TWIPS_PER_PT: f32 = 20.0;

/// Convert twips (1/1440 inch) to points
pub fn twips_to_pt(twips: u32) -> f32 {
    twips as f32 / TWIPS_PER_PT
}

/// Built-in font faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Helvetica,
    HelveticaBold,
    TimesBold,
}

impl Face {
    pub fn helvetica(bold: bool) -> Self {
        if bold { Self::HelveticaBold } else { Self::Helvetica }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
}

/// A single line of text
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    /// Baseline
    pub y: f32,
    pub text: String,
    pub face: Face,
    pub size: f32,
    /// `Center` treats `x` as the horizontal center
    pub align: Align,
}

/// Drawing operation
#[derive(Debug, Clone)]
pub enum DrawOp {
    Text(TextRun),
    Line {
        from: (f32, f32),
        to: (f32, f32),
        thickness: f32,
    },
    Circle {
        center: (f32, f32),
        radius: f32,
        thickness: f32,
    },
    Ellipse {
        center: (f32, f32),
        rx: f32,
        ry: f32,
        thickness: f32,
    },
    /// Raster scaled into the box whose top-left corner is (x, y)
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        raster: Arc<BarcodeRaster>,
    },
}

/// One physical page (sheet or die-cut label)
#[derive(Debug, Clone)]
pub struct Page {
    pub width: f32,
    pub height: f32,
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    /// US letter, portrait
    pub fn letter() -> Self {
        Self::new(8.5 * PT_PER_INCH, 11.0 * PT_PER_INCH)
    }

    pub fn text(&mut self, x: f32, y: f32, text: impl Into<String>, face: Face, size: f32) -> &mut Self {
        self.ops.push(DrawOp::Text(TextRun {
            x,
            y,
            text: text.into(),
            face,
            size,
            align: Align::Left,
        }));
        self
    }

    pub fn centered_text(
        &mut self,
        center_x: f32,
        y: f32,
        text: impl Into<String>,
        face: Face,
        size: f32,
    ) -> &mut Self {
        self.ops.push(DrawOp::Text(TextRun {
            x: center_x,
            y,
            text: text.into(),
            face,
            size,
            align: Align::Center,
        }));
        self
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), thickness: f32) -> &mut Self {
        self.ops.push(DrawOp::Line { from, to, thickness });
        self
    }

    pub fn circle(&mut self, center: (f32, f32), radius: f32, thickness: f32) -> &mut Self {
        self.ops.push(DrawOp::Circle {
            center,
            radius,
            thickness,
        });
        self
    }

    pub fn ellipse(&mut self, center: (f32, f32), rx: f32, ry: f32, thickness: f32) -> &mut Self {
        self.ops.push(DrawOp::Ellipse {
            center,
            rx,
            ry,
            thickness,
        });
        self
    }

    pub fn image(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        raster: Arc<BarcodeRaster>,
    ) -> &mut Self {
        self.ops.push(DrawOp::Image {
            x,
            y,
            width,
            height,
            raster,
        });
        self
    }

    /// All text runs, in draw order
    pub fn texts(&self) -> impl Iterator<Item = &TextRun> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text(run) => Some(run),
            _ => None,
        })
    }
}
