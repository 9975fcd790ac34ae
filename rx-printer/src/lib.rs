//! # rx-printer
//!
//! Label output library - low-level document and printer capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW a label reaches paper:
//! - Text fitting (step-table font sizes, truncation, wrapping)
//! - CODE128 rasterization
//! - Drawing IR ([`Page`]) and the PDF writer
//! - `DieCutLabel` descriptor documents
//! - Label-printer driver adapters (local print web service)
//!
//! Pharmacy layouts (WHAT goes on a label) stay in application code:
//! - Medication grid sheets and prescription labels → rx-station
//!
//! ## Example
//!
//! ```ignore
//! use rx_printer::{Face, Page, PdfWriter};
//!
//! let mut page = Page::letter();
//! page.text(72.0, 72.0, "Lipitor", Face::HelveticaBold, 8.0);
//! let pdf = PdfWriter::new("Lipitor").render(&[page])?;
//! ```

mod barcode;
mod canvas;
mod descriptor;
mod driver;
mod error;
mod fit;
mod pdf;

// Re-exports
pub use barcode::{
    BarcodeEncoder, BarcodeRaster, BarcodeRequest, Code128Rasterizer, HYPHEN, HYPHEN_AND_SPACE,
    Symbology, canonicalize,
};
pub use canvas::{Align, DrawOp, Face, PT_PER_INCH, Page, TWIPS_PER_PT, TextRun, twips_to_pt};
pub use descriptor::{
    Argb, BarcodeObject, Bounds, DESCRIPTOR_EXT, DESCRIPTOR_MIME, FontSpec, HorizontalAlignment,
    LabelDescriptor, RoundRect, TextObject, escape_xml,
};
pub use driver::{
    DEFAULT_PRINTER_TYPE, LabelPrinterDriver, PrinterInfo, parse_printers, print_descriptor,
    select_printer,
};
pub use error::{PrintError, PrintResult};
pub use fit::{BASE_FONT_SIZE, chars_per_line, font_size_for, text_width, truncate, wrap_text};
pub use pdf::{PDF_MIME, PdfWriter, enable_auto_print};

#[cfg(feature = "web-service")]
pub use driver::{DEFAULT_SERVICE_URL, WebServiceDriver};
