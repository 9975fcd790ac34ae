//! PDF writer for [`Page`] layouts
//!
//! Pages are drawn with the built-in PDF faces, so no font files ship with the
//! crate. Text width is estimated (see [`crate::fit::text_width`]) when
//! centering.

use std::collections::HashMap;
use std::io::BufWriter;

use lopdf::dictionary;
use printpdf::utils::calculate_points_for_circle;
use printpdf::{
    BuiltinFont, Color, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject,
    IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Point, Pt,
    Px, Rgb,
};
use tracing::{debug, instrument};

use crate::canvas::{Align, DrawOp, Face, Page, TextRun};
use crate::error::{PrintError, PrintResult};
use crate::fit::text_width;

/// MIME type of emitted documents
pub const PDF_MIME: &str = "application/pdf";

const LAYER_NAME: &str = "Layer 1";

fn mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

/// Renders pages into a single PDF document
pub struct PdfWriter {
    title: String,
}

impl PdfWriter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Draw every page and return the encoded document
    #[instrument(skip(self, pages), fields(title = %self.title, pages = pages.len()))]
    pub fn render(&self, pages: &[Page]) -> PrintResult<Vec<u8>> {
        let first = pages
            .first()
            .ok_or_else(|| PrintError::Pdf("document has no pages".into()))?;

        let (doc, page_idx, layer_idx) =
            PdfDocument::new(&self.title, mm(first.width), mm(first.height), LAYER_NAME);
        let fonts = Fonts::load(&doc)?;

        let layer = doc.get_page(page_idx).get_layer(layer_idx);
        draw_page(&layer, &fonts, first);

        for page in &pages[1..] {
            let (page_idx, layer_idx) = doc.add_page(mm(page.width), mm(page.height), LAYER_NAME);
            let layer = doc.get_page(page_idx).get_layer(layer_idx);
            draw_page(&layer, &fonts, page);
        }

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf)
            .map_err(|e| PrintError::Pdf(format!("save failed: {}", e)))?;
        let bytes = buf
            .into_inner()
            .map_err(|e| PrintError::Pdf(format!("buffer error: {}", e)))?;

        debug!(bytes = bytes.len(), "PDF rendered");
        Ok(bytes)
    }
}

struct Fonts {
    faces: HashMap<Face, IndirectFontRef>,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> PrintResult<Self> {
        let mut faces = HashMap::new();
        for (face, builtin) in [
            (Face::Helvetica, BuiltinFont::Helvetica),
            (Face::HelveticaBold, BuiltinFont::HelveticaBold),
            (Face::TimesBold, BuiltinFont::TimesBold),
        ] {
            let font = doc
                .add_builtin_font(builtin)
                .map_err(|e| PrintError::Pdf(format!("font error: {}", e)))?;
            faces.insert(face, font);
        }
        Ok(Self { faces })
    }

    fn get(&self, face: Face) -> &IndirectFontRef {
        // Every Face variant is loaded in `Fonts::load`
        &self.faces[&face]
    }
}

fn draw_page(layer: &PdfLayerReference, fonts: &Fonts, page: &Page) {
    layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));

    // PDF space grows upwards from the bottom-left corner
    let flip = |y: f32| page.height - y;

    for op in &page.ops {
        match op {
            DrawOp::Text(run) => draw_text(layer, fonts, run, page.height),
            DrawOp::Line {
                from,
                to,
                thickness,
            } => {
                layer.set_outline_thickness(*thickness);
                layer.add_line(Line {
                    points: vec![
                        (Point::new(mm(from.0), mm(flip(from.1))), false),
                        (Point::new(mm(to.0), mm(flip(to.1))), false),
                    ],
                    is_closed: false,
                });
            }
            DrawOp::Circle {
                center,
                radius,
                thickness,
            } => {
                layer.set_outline_thickness(*thickness);
                layer.add_line(Line {
                    points: calculate_points_for_circle(Pt(*radius), Pt(center.0), Pt(flip(center.1))),
                    is_closed: true,
                });
            }
            DrawOp::Ellipse {
                center,
                rx,
                ry,
                thickness,
            } => {
                layer.set_outline_thickness(*thickness);
                layer.add_line(Line {
                    points: ellipse_points(center.0, flip(center.1), *rx, *ry),
                    is_closed: true,
                });
            }
            DrawOp::Image {
                x,
                y,
                width,
                height,
                raster,
            } => {
                let image = Image::from(ImageXObject {
                    width: Px(raster.width_px() as usize),
                    height: Px(raster.height_px() as usize),
                    color_space: ColorSpace::Greyscale,
                    bits_per_component: ColorBits::Bit8,
                    interpolate: false,
                    image_data: raster.pixels().to_vec(),
                    image_filter: None,
                    clipping_bbox: None,
                    smask: None,
                });

                // At 72 dpi one pixel is one point; scale to the requested box
                image.add_to_layer(
                    layer.clone(),
                    ImageTransform {
                        translate_x: Some(mm(*x)),
                        translate_y: Some(mm(flip(y + height))),
                        scale_x: Some(width / raster.width_px() as f32),
                        scale_y: Some(height / raster.height_px() as f32),
                        dpi: Some(72.0),
                        ..Default::default()
                    },
                );
            }
        }
    }
}

fn draw_text(layer: &PdfLayerReference, fonts: &Fonts, run: &TextRun, page_height: f32) {
    let x = match run.align {
        Align::Left => run.x,
        Align::Center => run.x - text_width(&run.text, run.size) / 2.0,
    };
    layer.use_text(
        run.text.as_str(),
        run.size,
        mm(x),
        mm(page_height - run.y),
        fonts.get(run.face),
    );
}

/// Bezier outline of an axis-aligned ellipse, from a scaled unit circle
fn ellipse_points(cx: f32, cy: f32, rx: f32, ry: f32) -> Vec<(Point, bool)> {
    let ratio = if rx > 0.0 { ry / rx } else { 1.0 };
    calculate_points_for_circle(Pt(rx), Pt(0.0), Pt(0.0))
        .into_iter()
        .map(|(p, ctrl)| {
            (
                Point {
                    x: Pt(cx + p.x.0),
                    y: Pt(cy + p.y.0 * ratio),
                },
                ctrl,
            )
        })
        .collect()
}

/// Add an `/OpenAction` Print named action so viewers raise the print dialog on open
pub fn enable_auto_print(pdf: &[u8]) -> PrintResult<Vec<u8>> {
    let mut doc = lopdf::Document::load_mem(pdf)
        .map_err(|e| PrintError::Pdf(format!("reload failed: {}", e)))?;

    let root = doc
        .trailer
        .get(b"Root")
        .and_then(|o| o.as_reference())
        .map_err(|e| PrintError::Pdf(format!("missing catalog: {}", e)))?;
    let catalog = doc
        .get_object_mut(root)
        .and_then(|o| o.as_dict_mut())
        .map_err(|e| PrintError::Pdf(format!("bad catalog: {}", e)))?;
    catalog.set(
        "OpenAction",
        dictionary! {
            "S" => "Named",
            "N" => "Print",
        },
    );

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| PrintError::Pdf(format!("save failed: {}", e)))?;
    Ok(out)
}
