//! Output adapter
//!
//! Encodes a [`RenderedLabel`] for the requested [`OutputMode`] and hands the
//! artifacts to a delivery. Descriptor transmission and the print dialog fall
//! back to saving a file; only a failed fallback is an error.

use std::path::PathBuf;
use std::sync::Arc;

use rx_printer::{
    DEFAULT_PRINTER_TYPE, DESCRIPTOR_EXT, DESCRIPTOR_MIME, LabelPrinterDriver, PDF_MIME, PdfWriter,
    PrintError, enable_auto_print, print_descriptor,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::delivery::ArtifactSink;
use crate::render::{GridSheetOutput, PrescriptionOutput, RenderedLabel};

/// Output encoding requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum OutputMode {
    /// Grid sheet as one PDF file
    GridPdf,
    /// Prescription labels as one PDF, one page per copy. `debug` saves the
    /// file; otherwise it opens in the print dialog.
    PrescriptionPdf { debug: bool },
    /// One label descriptor per copy, sent to the label printer when
    /// `transmit` is set, otherwise saved
    Descriptor { transmit: bool },
}

impl OutputMode {
    /// Whether this mode can encode a prescription (as opposed to a grid sheet)
    pub fn is_prescription_mode(&self) -> bool {
        !matches!(self, Self::GridPdf)
    }
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("{mode:?} cannot encode a {label}")]
    Unsupported { mode: OutputMode, label: &'static str },

    #[error("Encoding failed: {0}")]
    Encode(#[from] PrintError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// An encoded file
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Where an artifact ended up
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Delivery {
    Saved { path: PathBuf },
    PrintDialog { path: PathBuf },
    Printed { printer: String },
    /// Primary delivery failed; saved instead
    FallbackSaved { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Emitted {
    pub filename: String,
    pub delivery: Delivery,
}

/// Encodes rendered labels and routes them to a delivery
#[derive(Clone)]
pub struct OutputAdapter {
    files: Arc<dyn ArtifactSink>,
    print_dialog: Arc<dyn ArtifactSink>,
    driver: Option<Arc<dyn LabelPrinterDriver>>,
    printer_type: String,
}

impl OutputAdapter {
    /// Adapter that saves everything through `files`
    pub fn new(files: Arc<dyn ArtifactSink>) -> Self {
        Self {
            print_dialog: Arc::clone(&files),
            files,
            driver: None,
            printer_type: DEFAULT_PRINTER_TYPE.to_string(),
        }
    }

    pub fn with_print_dialog(mut self, sink: Arc<dyn ArtifactSink>) -> Self {
        self.print_dialog = sink;
        self
    }

    pub fn with_driver(mut self, driver: Arc<dyn LabelPrinterDriver>, printer_type: impl Into<String>) -> Self {
        self.driver = Some(driver);
        self.printer_type = printer_type.into();
        self
    }

    /// Encode without delivering
    pub fn encode(&self, label: &RenderedLabel, mode: OutputMode) -> Result<Vec<Artifact>, OutputError> {
        match (label, mode) {
            (RenderedLabel::GridSheet(grid), OutputMode::GridPdf) => Ok(vec![encode_grid(grid)?]),
            (RenderedLabel::Prescription(rx), OutputMode::PrescriptionPdf { debug }) => {
                Ok(vec![encode_prescription_pdf(rx, !debug)?])
            }
            (RenderedLabel::Prescription(rx), OutputMode::Descriptor { .. }) => encode_descriptors(rx),
            (label, mode) => Err(OutputError::Unsupported {
                mode,
                label: label.kind(),
            }),
        }
    }

    /// Encode and deliver
    #[instrument(skip(self, label), fields(label = label.kind()))]
    pub async fn emit(&self, label: &RenderedLabel, mode: OutputMode) -> Result<Vec<Emitted>, OutputError> {
        let artifacts = self.encode(label, mode)?;

        match mode {
            OutputMode::GridPdf | OutputMode::PrescriptionPdf { debug: true } => {
                self.save_all(artifacts).await
            }
            OutputMode::PrescriptionPdf { debug: false } => self.open_print_dialog(artifacts).await,
            OutputMode::Descriptor { transmit: false } => self.save_all(artifacts).await,
            OutputMode::Descriptor { transmit: true } => self.transmit(artifacts).await,
        }
    }

    async fn save_all(&self, artifacts: Vec<Artifact>) -> Result<Vec<Emitted>, OutputError> {
        let mut emitted = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let path = self.files.deliver(&artifact).await?;
            emitted.push(Emitted {
                filename: artifact.filename,
                delivery: Delivery::Saved { path },
            });
        }
        Ok(emitted)
    }

    async fn open_print_dialog(&self, artifacts: Vec<Artifact>) -> Result<Vec<Emitted>, OutputError> {
        let mut emitted = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let delivery = match self.print_dialog.deliver(&artifact).await {
                Ok(path) => Delivery::PrintDialog { path },
                Err(e) => {
                    warn!(file = %artifact.filename, error = %e, "Print dialog failed, saving instead");
                    self.fallback(&artifact, e.to_string()).await?
                }
            };
            emitted.push(Emitted {
                filename: artifact.filename,
                delivery,
            });
        }
        Ok(emitted)
    }

    /// Send each descriptor to the label printer
    ///
    /// After the first driver failure the remaining copies go straight to the
    /// fallback.
    async fn transmit(&self, artifacts: Vec<Artifact>) -> Result<Vec<Emitted>, OutputError> {
        let mut driver = self.driver.clone();
        let mut failure = driver
            .is_none()
            .then(|| "no label printer driver configured".to_string());

        let mut emitted = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            if let Some(active) = &driver {
                let result = match std::str::from_utf8(&artifact.bytes) {
                    Ok(xml) => print_descriptor(active.as_ref(), &self.printer_type, xml).await,
                    Err(e) => Err(PrintError::Descriptor(e.to_string())),
                };
                match result {
                    Ok(printer) => {
                        emitted.push(Emitted {
                            filename: artifact.filename,
                            delivery: Delivery::Printed { printer },
                        });
                        continue;
                    }
                    Err(e) => {
                        warn!(file = %artifact.filename, error = %e, "Label printer failed, saving instead");
                        failure = Some(e.to_string());
                        driver = None;
                    }
                }
            }

            let reason = failure.clone().unwrap_or_default();
            let delivery = self.fallback(&artifact, reason).await?;
            emitted.push(Emitted {
                filename: artifact.filename,
                delivery,
            });
        }
        Ok(emitted)
    }

    async fn fallback(&self, artifact: &Artifact, reason: String) -> Result<Delivery, OutputError> {
        let path = self.files.deliver(artifact).await?;
        info!(path = %path.display(), "Saved as fallback");
        Ok(Delivery::FallbackSaved { path, reason })
    }
}

fn encode_grid(grid: &GridSheetOutput) -> Result<Artifact, OutputError> {
    let bytes = PdfWriter::new(grid.title.as_str()).render(&grid.pages)?;
    Ok(Artifact {
        filename: format!("{}.pdf", grid.file_stem),
        mime: PDF_MIME,
        bytes,
    })
}

fn encode_prescription_pdf(rx: &PrescriptionOutput, auto_print: bool) -> Result<Artifact, OutputError> {
    let pages: Vec<_> = rx.copies.iter().map(|c| c.page.clone()).collect();
    let mut bytes = PdfWriter::new(rx.title.as_str()).render(&pages)?;
    if auto_print {
        bytes = enable_auto_print(&bytes)?;
    }
    Ok(Artifact {
        filename: format!("{}.pdf", rx.file_stem),
        mime: PDF_MIME,
        bytes,
    })
}

/// `{stem}.label` for the first copy, `{stem}_copy{n}.label` after
fn descriptor_file_name(stem: &str, copy: usize) -> String {
    if copy <= 1 {
        format!("{}.{}", stem, DESCRIPTOR_EXT)
    } else {
        format!("{}_copy{}.{}", stem, copy, DESCRIPTOR_EXT)
    }
}

fn encode_descriptors(rx: &PrescriptionOutput) -> Result<Vec<Artifact>, OutputError> {
    rx.copies
        .iter()
        .map(|copy| {
            Ok(Artifact {
                filename: descriptor_file_name(&rx.file_stem, copy.copy),
                mime: DESCRIPTOR_MIME,
                bytes: copy.descriptor.to_xml()?.into_bytes(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_file_names() {
        assert_eq!(
            descriptor_file_name("rxlabel_1000000_Lovelace", 1),
            "rxlabel_1000000_Lovelace.label"
        );
        assert_eq!(
            descriptor_file_name("rxlabel_1000000_Lovelace", 3),
            "rxlabel_1000000_Lovelace_copy3.label"
        );
    }

    #[test]
    fn test_mode_kinds() {
        assert!(!OutputMode::GridPdf.is_prescription_mode());
        assert!(OutputMode::PrescriptionPdf { debug: true }.is_prescription_mode());
        assert!(OutputMode::Descriptor { transmit: false }.is_prescription_mode());
    }
}
