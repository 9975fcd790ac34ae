//! Label service
//!
//! Entry point for the UI shell: numbers a prescription, renders its labels
//! and emits them; renders grid sheets (no number involved).

use std::sync::Arc;

use chrono::NaiveDate;
use rx_printer::{BarcodeEncoder, Code128Rasterizer, PrintError, WebServiceDriver};
use serde::Serialize;
use shared::models::{
    CounterKind, GridSheetRequest, Pharmacy, PrescriptionNumber, PrescriptionRequest,
};
use thiserror::Error;
use tracing::{info, instrument};

use crate::core::Config;
use crate::output::{Emitted, FileSink, OutputAdapter, OutputError, OutputMode, SystemPrintSink};
use crate::render::{
    GridGeometry, GridSheetRenderer, PrescriptionGeometry, PrescriptionRenderer, RenderError,
    resolve_schedule,
};
use crate::sequence::{
    AllocationError, CounterSeeds, RedbCounterStore, SequenceAllocator, StorageError,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("Counter store unavailable: {0}")]
    Storage(#[from] StorageError),

    #[error("Label printer setup failed: {0}")]
    Printer(#[from] PrintError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result of one prescription print request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueReport {
    pub rx_number: PrescriptionNumber,
    pub copies: usize,
    pub outputs: Vec<Emitted>,
}

/// Result of one grid sheet print request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridReport {
    pub lot_number: String,
    pub expiration_date: NaiveDate,
    pub outputs: Vec<Emitted>,
}

/// Next value of a counter, if it exists yet
#[derive(Debug, Clone, Serialize)]
pub struct CounterStatus {
    pub kind: CounterKind,
    pub key: &'static str,
    pub next: Option<u64>,
}

/// Numbering, rendering and output wired together
#[derive(Clone)]
pub struct LabelService {
    allocator: SequenceAllocator,
    encoder: Arc<dyn BarcodeEncoder>,
    grid: GridSheetRenderer,
    prescription: PrescriptionRenderer,
    output: OutputAdapter,
    default_pharmacy: Pharmacy,
}

impl LabelService {
    pub fn new(allocator: SequenceAllocator, output: OutputAdapter) -> Self {
        Self {
            allocator,
            encoder: Arc::new(Code128Rasterizer),
            grid: GridSheetRenderer::new(GridGeometry::default()),
            prescription: PrescriptionRenderer::new(PrescriptionGeometry::default()),
            output,
            default_pharmacy: Pharmacy::default(),
        }
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn BarcodeEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Header used when a request has no pharmacy name
    pub fn with_default_pharmacy(mut self, pharmacy: Pharmacy) -> Self {
        self.default_pharmacy = pharmacy;
        self
    }

    /// Build the station from configuration
    ///
    /// Opens (or creates) the counter database and seeds absent counters.
    pub async fn from_config(config: &Config) -> ServiceResult<Self> {
        if let Some(parent) = config.counter_db.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Arc::new(RedbCounterStore::open(&config.counter_db)?);
        let seeds = CounterSeeds {
            standard: config.seed(CounterKind::Standard),
            controlled: config.seed(CounterKind::Controlled),
        };
        let allocator = SequenceAllocator::new(store, seeds);
        allocator.ensure_seeded().await?;

        let driver = WebServiceDriver::new(
            &config.printer_service_url,
            config.printer_accept_invalid_certs,
        )?;
        let output = OutputAdapter::new(Arc::new(FileSink::new(&config.output_dir)))
            .with_print_dialog(Arc::new(SystemPrintSink::new(config.work_dir.join("spool"))))
            .with_driver(Arc::new(driver), config.printer_type.clone());

        info!(
            counter_db = %config.counter_db.display(),
            output_dir = %config.output_dir.display(),
            "Label service ready"
        );
        Ok(Self::new(allocator, output).with_default_pharmacy(config.pharmacy.clone()))
    }

    /// Number a prescription and emit `copies` identical labels
    ///
    /// Everything that can be rejected up front is checked before the counter
    /// moves. Exactly one number is allocated per call, whatever the copy
    /// count; a failure after allocation leaves a gap in the sequence.
    #[instrument(skip(self, request), fields(patient = %request.patient.last_name))]
    pub async fn issue_prescription(
        &self,
        mut request: PrescriptionRequest,
        copies: usize,
        mode: OutputMode,
    ) -> ServiceResult<IssueReport> {
        if !mode.is_prescription_mode() {
            return Err(OutputError::Unsupported {
                mode,
                label: "prescription",
            }
            .into());
        }
        if copies == 0 {
            return Err(RenderError::invalid("copies", "at least one copy is required").into());
        }
        resolve_schedule(&request.drug)?;
        if request.pharmacy.name.trim().is_empty() {
            request.pharmacy = self.default_pharmacy.clone();
        }

        let rx_number = self.allocator.allocate(request.counter_kind()).await?;
        let record = request.into_record(rx_number.clone());

        let barcode_request = self.prescription.barcode_request(&record.rx_number)?;
        let raster = self
            .encoder
            .rasterize(&barcode_request)
            .await
            .map_err(RenderError::from)?;
        let label = self.prescription.render(&record, copies, Arc::new(raster))?;
        let outputs = self.output.emit(&label, mode).await?;

        info!(rx_number = %rx_number, copies, "Prescription labels emitted");
        Ok(IssueReport {
            rx_number,
            copies,
            outputs,
        })
    }

    /// Render and save one grid sheet
    #[instrument(skip(self, request), fields(ndc = %request.drug.ndc))]
    pub async fn print_grid_sheet(&self, request: GridSheetRequest) -> ServiceResult<GridReport> {
        let sheet = {
            let mut rng = rand::thread_rng();
            self.grid.resolve(&request, &mut rng)?
        };

        let barcode_request = self.grid.barcode_request(&sheet.drug)?;
        let raster = self
            .encoder
            .rasterize(&barcode_request)
            .await
            .map_err(RenderError::from)?;
        let label = self.grid.render(&sheet, Arc::new(raster));
        let outputs = self.output.emit(&label, OutputMode::GridPdf).await?;

        info!(lot = %sheet.lot_number, "Grid sheet emitted");
        Ok(GridReport {
            lot_number: sheet.lot_number,
            expiration_date: sheet.expiration_date,
            outputs,
        })
    }

    /// Next value of each counter
    pub async fn counters(&self) -> ServiceResult<Vec<CounterStatus>> {
        let snapshot = self.allocator.snapshot().await?;
        Ok(snapshot
            .into_iter()
            .map(|(kind, next)| CounterStatus {
                kind,
                key: kind.key(),
                next,
            })
            .collect())
    }
}
