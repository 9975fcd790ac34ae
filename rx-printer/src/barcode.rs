//! Barcode canonicalization and CODE128 rasterization
//!
//! Renderers canonicalize identifiers before encoding (separators carry no
//! meaning in the symbol and break scanning) and request a raster without
//! human-readable text; they print their own text next to the bars.

use async_trait::async_trait;
use barcoders::sym::code128::Code128;
use image::{GrayImage, Luma};
use tracing::{debug, instrument};

use crate::error::{PrintError, PrintResult};

/// Separators stripped from every barcode payload
pub const HYPHEN: &[char] = &['-'];

/// Separators stripped from grid-sheet NDC payloads
pub const HYPHEN_AND_SPACE: &[char] = &['-', ' '];

// Code 128 start-set selectors understood by `barcoders`
const CODE_SET_B: char = 'Ɓ';
const CODE_SET_C: char = 'Ć';

/// Remove separator characters from an identifier
pub fn canonicalize(text: &str, separators: &[char]) -> String {
    text.chars().filter(|c| !separators.contains(c)).collect()
}

/// Supported 1-D symbologies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Symbology {
    #[default]
    Code128,
}

/// Raster request handed to a [`BarcodeEncoder`]
#[derive(Debug, Clone, PartialEq)]
pub struct BarcodeRequest {
    /// Canonical payload
    pub text: String,
    pub symbology: Symbology,
    /// Width of a single module in pixels
    pub module_width: u32,
    /// Bar height in pixels
    pub height: u32,
    /// Quiet zone on every side in pixels
    pub margin: u32,
    pub show_text: bool,
}

impl BarcodeRequest {
    /// CODE128 request with text suppressed
    pub fn code128(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            symbology: Symbology::Code128,
            module_width: 1,
            height: 40,
            margin: 0,
            show_text: false,
        }
    }

    pub fn module_width(mut self, px: u32) -> Self {
        self.module_width = px;
        self
    }

    pub fn height(mut self, px: u32) -> Self {
        self.height = px;
        self
    }

    pub fn margin(mut self, px: u32) -> Self {
        self.margin = px;
        self
    }
}

/// Embeddable 8-bit greyscale raster (black bars on white)
#[derive(Debug, Clone)]
pub struct BarcodeRaster {
    pub text: String,
    pub image: GrayImage,
}

impl BarcodeRaster {
    pub fn width_px(&self) -> u32 {
        self.image.width()
    }

    pub fn height_px(&self) -> u32 {
        self.image.height()
    }

    /// Raw greyscale bytes, row-major
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }
}

/// Barcode rasterization collaborator
#[async_trait]
pub trait BarcodeEncoder: Send + Sync {
    async fn rasterize(&self, request: &BarcodeRequest) -> PrintResult<BarcodeRaster>;
}

/// CODE128 encoder backed by `barcoders`, rasterized off the async runtime
#[derive(Debug, Clone, Copy, Default)]
pub struct Code128Rasterizer;

impl Code128Rasterizer {
    /// Encode and rasterize synchronously
    pub fn rasterize_blocking(request: &BarcodeRequest) -> PrintResult<BarcodeRaster> {
        if request.show_text {
            return Err(PrintError::Barcode(
                "human-readable text is printed by the renderer, not the raster".into(),
            ));
        }
        if request.text.is_empty() {
            return Err(PrintError::Barcode("empty barcode payload".into()));
        }

        let modules = encode_modules(&request.text)?;
        let module_width = request.module_width.max(1);
        let width = modules.len() as u32 * module_width + request.margin * 2;
        let height = request.height.max(1) + request.margin * 2;

        let mut image = GrayImage::from_pixel(width, height, Luma([255]));
        for (i, module) in modules.iter().enumerate() {
            if *module == 0 {
                continue;
            }
            let x0 = request.margin + i as u32 * module_width;
            for x in x0..x0 + module_width {
                for y in request.margin..request.margin + request.height.max(1) {
                    image.put_pixel(x, y, Luma([0]));
                }
            }
        }

        debug!(modules = modules.len(), width, height, "barcode rasterized");
        Ok(BarcodeRaster {
            text: request.text.clone(),
            image,
        })
    }
}

#[async_trait]
impl BarcodeEncoder for Code128Rasterizer {
    #[instrument(skip(self), fields(text = %request.text))]
    async fn rasterize(&self, request: &BarcodeRequest) -> PrintResult<BarcodeRaster> {
        let request = request.clone();
        tokio::task::spawn_blocking(move || Self::rasterize_blocking(&request))
            .await
            .map_err(|e| PrintError::Barcode(format!("Task join failed: {}", e)))?
    }
}

/// Bar/space modules (1 = bar) for a CODE128 payload
///
/// All-digit payloads of even length use code set C; everything else set B.
fn encode_modules(text: &str) -> PrintResult<Vec<u8>> {
    let all_digits = text.chars().all(|c| c.is_ascii_digit());
    let set = if all_digits && text.len() % 2 == 0 {
        CODE_SET_C
    } else {
        CODE_SET_B
    };

    let symbol = Code128::new(format!("{}{}", set, text))
        .map_err(|e| PrintError::Barcode(format!("{}: {}", text, e)))?;
    Ok(symbol.encode())
}
