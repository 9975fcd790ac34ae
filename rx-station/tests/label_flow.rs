//! Prescription and grid sheet flows through LabelService

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::events::Event;
use rx_printer::{LabelPrinterDriver, PrintError, PrintResult, PrinterInfo};
use rx_station::output::{Delivery, FileSink, OutputAdapter, OutputMode, SystemPrintSink};
use rx_station::sequence::{
    AllocationError, CounterSeeds, CounterStore, RedbCounterStore, SequenceAllocator,
};
use rx_station::{LabelService, ServiceError};
use shared::models::{CounterKind, GridSheetRequest, PrescriptionRequest};

/// Counts allocations passing through to redb
struct CountingStore {
    inner: RedbCounterStore,
    increments: AtomicUsize,
}

#[async_trait]
impl CounterStore for CountingStore {
    async fn initialize(&self, seeds: &CounterSeeds) -> Result<(), AllocationError> {
        self.inner.initialize(seeds).await
    }

    async fn fetch_increment(&self, kind: CounterKind) -> Result<u64, AllocationError> {
        self.increments.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_increment(kind).await
    }

    async fn peek(&self, kind: CounterKind) -> Result<Option<u64>, AllocationError> {
        self.inner.peek(kind).await
    }
}

struct OfflineDriver;

#[async_trait]
impl LabelPrinterDriver for OfflineDriver {
    async fn printers(&self) -> PrintResult<Vec<PrinterInfo>> {
        Err(PrintError::Unavailable("connection refused".into()))
    }

    async fn print_label(&self, _printer_name: &str, _label_xml: &str) -> PrintResult<()> {
        unreachable!("no printer listed")
    }
}

/// Lists one label printer and accepts `accept` labels before failing
struct CountingDriver {
    accept: usize,
    calls: AtomicUsize,
}

impl CountingDriver {
    fn new(accept: usize) -> Arc<Self> {
        Arc::new(Self {
            accept,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LabelPrinterDriver for CountingDriver {
    async fn printers(&self) -> PrintResult<Vec<PrinterInfo>> {
        Ok(vec![PrinterInfo {
            name: "DYMO LabelWriter 450".into(),
            printer_type: "LabelWriterPrinter".into(),
            model: None,
            is_connected: true,
        }])
    }

    async fn print_label(&self, _printer_name: &str, _label_xml: &str) -> PrintResult<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.accept {
            Ok(())
        } else {
            Err(PrintError::PrintFailed("paper out".into()))
        }
    }
}

struct Station {
    dir: tempfile::TempDir,
    store: Arc<CountingStore>,
    service: LabelService,
}

fn station(adapter: impl FnOnce(OutputAdapter) -> OutputAdapter) -> Station {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(CountingStore {
        inner: RedbCounterStore::open(dir.path().join("counters.redb")).unwrap(),
        increments: AtomicUsize::new(0),
    });
    let allocator = SequenceAllocator::new(store.clone(), CounterSeeds::default());
    let output = adapter(OutputAdapter::new(Arc::new(FileSink::new(dir.path().join("labels")))));
    Station {
        service: LabelService::new(allocator, output),
        store,
        dir,
    }
}

fn prescription(schedule: Option<u8>) -> PrescriptionRequest {
    let mut value = serde_json::json!({
        "patient": {
            "firstName": "Ada",
            "lastName": "Lovelace",
            "dateOfBirth": "12/10/1815",
            "allergies": "Penicillin & <sulfa>"
        },
        "drug": {
            "brandName": "Lipitor",
            "strength": "20 mg",
            "ndc": "0071-0155-23",
            "manufacturer": "Pfizer"
        },
        "prescriber": { "name": "Dr. Babbage", "npi": "1234567890", "dea": "AB1234563" },
        "pharmacy": { "name": "Main Street Pharmacy", "address": "1 Main St", "phone": "(555) 000-0000" },
        "quantity": 30,
        "daysSupply": 30,
        "refills": 2,
        "directions": "Take 1 tablet by mouth daily",
        "fillDate": "2025-01-15"
    });
    if let Some(schedule) = schedule {
        value["drug"]["controlledSchedule"] = schedule.into();
    }
    serde_json::from_value(value).unwrap()
}

/// Text of the named object in a label descriptor, unescaped
fn object_text(xml: &str, object_name: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    let mut current_name = None::<String>;
    let mut in_name = false;
    let mut in_text = false;
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) if e.name().as_ref() == b"Name" => in_name = true,
            Event::Start(e) if e.name().as_ref() == b"String" || e.name().as_ref() == b"Text" => {
                in_text = true
            }
            Event::End(e) if e.name().as_ref() == b"Name" => in_name = false,
            Event::End(e) if e.name().as_ref() == b"String" || e.name().as_ref() == b"Text" => {
                in_text = false
            }
            Event::Text(t) if in_name => current_name = Some(t.unescape().unwrap().into_owned()),
            Event::Text(t) if in_text && current_name.as_deref() == Some(object_name) => {
                return Some(t.unescape().unwrap().into_owned());
            }
            Event::Eof => return None,
            _ => {}
        }
    }
}

#[tokio::test]
async fn copies_share_one_number() {
    let station = station(|adapter| adapter);

    let report = station
        .service
        .issue_prescription(prescription(None), 3, OutputMode::Descriptor { transmit: false })
        .await
        .unwrap();

    assert_eq!(report.rx_number.as_str(), "1000000");
    assert_eq!(station.store.increments.load(Ordering::SeqCst), 1);

    let names: Vec<_> = report.outputs.iter().map(|o| o.filename.as_str()).collect();
    assert_eq!(
        names,
        [
            "rxlabel_1000000_Lovelace.label",
            "rxlabel_1000000_Lovelace_copy2.label",
            "rxlabel_1000000_Lovelace_copy3.label",
        ]
    );

    let labels = station.dir.path().join("labels");
    let first = std::fs::read_to_string(labels.join(names[0])).unwrap();
    for name in &names[1..] {
        assert_eq!(std::fs::read_to_string(labels.join(name)).unwrap(), first);
    }
}

#[tokio::test]
async fn caption_follows_the_counter() {
    let station = station(|adapter| adapter);
    let mode = OutputMode::Descriptor { transmit: false };

    let rx = station.service.issue_prescription(prescription(None), 1, mode).await.unwrap();
    let crx = station.service.issue_prescription(prescription(Some(2)), 1, mode).await.unwrap();
    assert_eq!(crx.rx_number.as_str(), "C5000000");

    let labels = station.dir.path().join("labels");
    let rx_xml = std::fs::read_to_string(labels.join(&rx.outputs[0].filename)).unwrap();
    let crx_xml = std::fs::read_to_string(labels.join(&crx.outputs[0].filename)).unwrap();

    assert!(object_text(&rx_xml, "DrugInfo").unwrap().ends_with("RX#: 1000000"));
    assert!(object_text(&crx_xml, "DrugInfo").unwrap().ends_with("CRX#: C5000000"));
}

#[tokio::test]
async fn descriptor_text_is_escaped() {
    let station = station(|adapter| adapter);
    let report = station
        .service
        .issue_prescription(prescription(None), 1, OutputMode::Descriptor { transmit: false })
        .await
        .unwrap();

    let xml = std::fs::read_to_string(station.dir.path().join("labels").join(&report.outputs[0].filename))
        .unwrap();
    assert!(!xml.contains("<sulfa>"));
    let additional = object_text(&xml, "AdditionalInfo").unwrap();
    assert!(additional.contains("Allergies: Penicillin & <sulfa>"), "{}", additional);
}

#[tokio::test]
async fn printer_failure_falls_back_to_file() {
    let station = station(|adapter| adapter.with_driver(Arc::new(OfflineDriver), "LabelWriterPrinter"));

    let report = station
        .service
        .issue_prescription(prescription(None), 2, OutputMode::Descriptor { transmit: true })
        .await
        .unwrap();

    assert_eq!(report.outputs.len(), 2);
    for emitted in &report.outputs {
        match &emitted.delivery {
            Delivery::FallbackSaved { path, reason } => {
                assert!(path.exists());
                assert!(reason.contains("connection refused"), "{}", reason);
            }
            other => panic!("expected fallback, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn rejected_requests_do_not_consume_numbers() {
    let station = station(|adapter| adapter);

    let err = station
        .service
        .issue_prescription(prescription(Some(7)), 1, OutputMode::Descriptor { transmit: false })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Render(_)));

    let err = station
        .service
        .issue_prescription(prescription(None), 0, OutputMode::PrescriptionPdf { debug: true })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Render(_)));

    let err = station
        .service
        .issue_prescription(prescription(None), 1, OutputMode::GridPdf)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Output(_)));

    assert_eq!(station.store.increments.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn debug_pdf_holds_every_copy() {
    let station = station(|adapter| adapter);
    let report = station
        .service
        .issue_prescription(prescription(None), 2, OutputMode::PrescriptionPdf { debug: true })
        .await
        .unwrap();

    assert_eq!(report.outputs.len(), 1);
    assert_eq!(report.outputs[0].filename, "rxlabel_1000000_Lovelace.pdf");
    let Delivery::Saved { path } = &report.outputs[0].delivery else {
        panic!("expected a saved file");
    };
    let bytes = std::fs::read(path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    let document = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(document.get_pages().len(), 2);
}

#[tokio::test]
async fn print_dialog_failure_saves_pdf() {
    let spool = tempfile::tempdir().unwrap();
    let opener = Arc::new(SystemPrintSink::with_opener(spool.path(), "/nonexistent/opener", &[]));
    let station = station(move |adapter| adapter.with_print_dialog(opener));

    let report = station
        .service
        .issue_prescription(prescription(None), 1, OutputMode::PrescriptionPdf { debug: false })
        .await
        .unwrap();

    assert_eq!(report.outputs.len(), 1);
    match &report.outputs[0].delivery {
        Delivery::FallbackSaved { path, reason } => {
            assert_eq!(path, &station.dir.path().join("labels").join("rxlabel_1000000_Lovelace.pdf"));
            assert!(path.exists());
            assert!(reason.contains("/nonexistent/opener"), "{}", reason);
        }
        other => panic!("expected fallback, got {:?}", other),
    }
}

#[tokio::test]
async fn transmitted_copies_reach_the_printer() {
    let driver = CountingDriver::new(usize::MAX);
    let station = station({
        let driver = driver.clone();
        move |adapter| adapter.with_driver(driver, "LabelWriterPrinter")
    });

    let report = station
        .service
        .issue_prescription(prescription(None), 2, OutputMode::Descriptor { transmit: true })
        .await
        .unwrap();

    assert_eq!(driver.calls.load(Ordering::SeqCst), 2);
    for emitted in &report.outputs {
        assert_eq!(
            emitted.delivery,
            Delivery::Printed {
                printer: "DYMO LabelWriter 450".into()
            }
        );
    }
    assert!(!station.dir.path().join("labels").exists());
}

#[tokio::test]
async fn printer_stops_after_first_failure() {
    let driver = CountingDriver::new(1);
    let station = station({
        let driver = driver.clone();
        move |adapter| adapter.with_driver(driver, "LabelWriterPrinter")
    });

    let report = station
        .service
        .issue_prescription(prescription(None), 3, OutputMode::Descriptor { transmit: true })
        .await
        .unwrap();

    // One success, one failure, then the driver is skipped
    assert_eq!(driver.calls.load(Ordering::SeqCst), 2);
    assert!(matches!(report.outputs[0].delivery, Delivery::Printed { .. }));
    for emitted in &report.outputs[1..] {
        match &emitted.delivery {
            Delivery::FallbackSaved { path, reason } => {
                assert!(path.exists());
                assert!(reason.contains("paper out"), "{}", reason);
            }
            other => panic!("expected fallback, got {:?}", other),
        }
    }
    let saved: Vec<_> = report.outputs[1..].iter().map(|o| o.filename.as_str()).collect();
    assert_eq!(
        saved,
        ["rxlabel_1000000_Lovelace_copy2.label", "rxlabel_1000000_Lovelace_copy3.label"]
    );
}

#[tokio::test]
async fn grid_sheet_draws_fresh_lot() {
    let station = station(|adapter| adapter);
    let request: GridSheetRequest = serde_json::from_value(serde_json::json!({
        "drug": {
            "brandName": "Lipitor",
            "strength": "20 mg",
            "ndc": "0071-0155-23",
            "lotNumber": "ABC12D3"
        },
        "operator": "jsmith",
        "fillDate": "2025-02-01"
    }))
    .unwrap();

    let report = station.service.print_grid_sheet(request).await.unwrap();
    assert_ne!(report.lot_number, "ABC12D3");
    let lot: Vec<char> = report.lot_number.chars().collect();
    assert_eq!(lot.len(), 7);
    assert!(lot[..3].iter().all(|c| c.is_ascii_uppercase()));
    assert!(lot[3..5].iter().all(|c| c.is_ascii_digit()));
    assert!(lot[5].is_ascii_uppercase());
    assert!(lot[6].is_ascii_digit());
    assert_eq!(report.expiration_date.to_string(), "2030-02-01");
    assert_eq!(report.outputs[0].filename, "Lipitor_20_mg.pdf");
    assert_eq!(station.store.increments.load(Ordering::SeqCst), 0);
}
