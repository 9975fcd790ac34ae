//! Label-printer driver adapters
//!
//! A driver enumerates attached label printers and accepts a raw label
//! descriptor for one of them. The local web-service driver talks to the
//! vendor print service over HTTPS on the loopback interface.

use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{info, instrument, warn};

use crate::error::{PrintError, PrintResult};

/// Printer family accepted for prescription labels
pub const DEFAULT_PRINTER_TYPE: &str = "LabelWriterPrinter";

/// A printer reported by the driver
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PrinterInfo {
    pub name: String,
    /// Driver printer family (e.g. `LabelWriterPrinter`)
    pub printer_type: String,
    pub model: Option<String>,
    pub is_connected: bool,
}

/// Label-printer driver collaborator
#[async_trait]
pub trait LabelPrinterDriver: Send + Sync {
    /// Printers currently known to the driver
    async fn printers(&self) -> PrintResult<Vec<PrinterInfo>>;

    /// Print one label descriptor on the named printer
    async fn print_label(&self, printer_name: &str, label_xml: &str) -> PrintResult<()>;

    /// Whether the driver can be reached at all
    async fn is_online(&self) -> bool {
        true
    }
}

/// First printer whose type matches `type_filter`
pub fn select_printer<'a>(printers: &'a [PrinterInfo], type_filter: &str) -> Option<&'a PrinterInfo> {
    printers.iter().find(|p| p.printer_type == type_filter)
}

/// Check the service, enumerate, select and print; returns the printer used
#[instrument(skip(driver, label_xml), fields(xml_len = label_xml.len()))]
pub async fn print_descriptor(
    driver: &dyn LabelPrinterDriver,
    type_filter: &str,
    label_xml: &str,
) -> PrintResult<String> {
    if !driver.is_online().await {
        return Err(PrintError::Unavailable("print service not connected".into()));
    }

    let printers = driver.printers().await?;
    let printer = select_printer(&printers, type_filter).ok_or_else(|| {
        PrintError::NoPrinter(format!("{} ({} printer(s) listed)", type_filter, printers.len()))
    })?;

    if !printer.is_connected {
        warn!(printer = %printer.name, "Selected printer reports disconnected");
    }

    driver.print_label(&printer.name, label_xml).await?;
    info!(printer = %printer.name, "Label sent to printer");
    Ok(printer.name.clone())
}

/// Parse the driver's printer list
///
/// ```xml
/// <Printers>
///   <LabelWriterPrinter>
///     <Name>DYMO LabelWriter 450</Name>
///     <ModelName>DYMO LabelWriter 450</ModelName>
///     <IsConnected>True</IsConnected>
///   </LabelWriterPrinter>
/// </Printers>
/// ```
pub fn parse_printers(xml: &str) -> PrintResult<Vec<PrinterInfo>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut printers = Vec::new();
    let mut depth = 0usize;
    let mut current: Option<PrinterInfo> = None;
    let mut field = String::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| PrintError::Descriptor(format!("printer list: {}", e)))?;
        match event {
            Event::Start(e) => {
                depth += 1;
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match depth {
                    2 => {
                        current = Some(PrinterInfo {
                            name: String::new(),
                            printer_type: name,
                            model: None,
                            is_connected: false,
                        })
                    }
                    3 => field = name,
                    _ => {}
                }
            }
            Event::Text(t) if depth == 3 => {
                let value = t
                    .unescape()
                    .map_err(|e| PrintError::Descriptor(format!("printer list: {}", e)))?;
                if let Some(printer) = current.as_mut() {
                    match field.as_str() {
                        "Name" => printer.name = value.into_owned(),
                        "ModelName" => printer.model = Some(value.into_owned()),
                        "IsConnected" => printer.is_connected = value.eq_ignore_ascii_case("true"),
                        _ => {}
                    }
                }
            }
            Event::End(_) => {
                if depth == 2 {
                    if let Some(printer) = current.take().filter(|p| !p.name.is_empty()) {
                        printers.push(printer);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(printers)
}

#[cfg(feature = "web-service")]
pub use web::WebServiceDriver;

#[cfg(feature = "web-service")]
mod web {
    use super::*;
    use std::time::Duration;

    /// Default local print service endpoint
    pub const DEFAULT_SERVICE_URL: &str = "https://127.0.0.1:41951/DYMO/DLS/Printing";

    /// Driver backed by the vendor's local print web service
    #[derive(Debug, Clone)]
    pub struct WebServiceDriver {
        base_url: String,
        client: reqwest::Client,
    }

    impl WebServiceDriver {
        /// The service uses a self-signed loopback certificate, so certificate
        /// checks are relaxed when `accept_invalid_certs` is set.
        pub fn new(base_url: &str, accept_invalid_certs: bool) -> PrintResult<Self> {
            Self::with_timeout(base_url, accept_invalid_certs, Duration::from_secs(5))
        }

        pub fn with_timeout(
            base_url: &str,
            accept_invalid_certs: bool,
            timeout: Duration,
        ) -> PrintResult<Self> {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(PrintError::InvalidConfig(format!(
                    "Invalid service URL: {}",
                    base_url
                )));
            }
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .danger_accept_invalid_certs(accept_invalid_certs)
                .build()
                .map_err(|e| PrintError::InvalidConfig(format!("HTTP client: {}", e)))?;

            Ok(Self {
                base_url: base_url.trim_end_matches('/').to_string(),
                client,
            })
        }

        fn endpoint(&self, name: &str) -> String {
            format!("{}/{}", self.base_url, name)
        }

        async fn send(&self, request: reqwest::RequestBuilder) -> PrintResult<String> {
            let resp = request.send().await.map_err(map_reqwest)?;
            let status = resp.status();
            let body = resp.text().await.map_err(map_reqwest)?;
            if !status.is_success() {
                return Err(PrintError::PrintFailed(format!("HTTP {}: {}", status, body)));
            }
            Ok(body)
        }
    }

    /// The print service answers with a JSON string literal around its XML
    ///
    /// Bodies that are not a JSON string are returned as-is.
    fn unquote(body: &str) -> String {
        let body = body.trim();
        serde_json::from_str::<String>(body).unwrap_or_else(|_| body.to_string())
    }

    fn map_reqwest(e: reqwest::Error) -> PrintError {
        if e.is_timeout() {
            PrintError::Timeout(e.to_string())
        } else {
            PrintError::Unavailable(e.to_string())
        }
    }

    #[async_trait]
    impl LabelPrinterDriver for WebServiceDriver {
        #[instrument(skip(self), fields(url = %self.base_url))]
        async fn printers(&self) -> PrintResult<Vec<PrinterInfo>> {
            let body = self.send(self.client.get(self.endpoint("GetPrinters"))).await?;
            let printers = parse_printers(&unquote(&body))?;
            info!(count = printers.len(), "Printers enumerated");
            Ok(printers)
        }

        /// Check if the print service is reachable
        #[instrument(skip(self), fields(url = %self.base_url))]
        async fn is_online(&self) -> bool {
            match self.client.get(self.endpoint("StatusConnected")).send().await {
                Ok(resp) if resp.status().is_success() => {
                    let body = resp.text().await.unwrap_or_default();
                    unquote(&body).eq_ignore_ascii_case("true")
                }
                Ok(resp) => {
                    warn!(status = %resp.status(), "Print service unhealthy");
                    false
                }
                Err(e) => {
                    warn!(error = %e, "Print service offline");
                    false
                }
            }
        }

        #[instrument(skip(self, label_xml), fields(url = %self.base_url, xml_len = label_xml.len()))]
        async fn print_label(&self, printer_name: &str, label_xml: &str) -> PrintResult<()> {
            let form = [
                ("printerName", printer_name),
                ("printParamsXml", ""),
                ("labelXml", label_xml),
                ("labelSetXml", ""),
            ];
            let body = self
                .send(self.client.post(self.endpoint("PrintLabel")).form(&form))
                .await?;

            // The service reports some failures in a 200 body
            if unquote(&body).eq_ignore_ascii_case("false") {
                return Err(PrintError::PrintFailed(format!(
                    "{} rejected the label",
                    printer_name
                )));
            }
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_rejects_bad_url() {
            assert!(WebServiceDriver::new("127.0.0.1:41951", true).is_err());
            let driver = WebServiceDriver::new(DEFAULT_SERVICE_URL, true).unwrap();
            assert_eq!(
                driver.endpoint("GetPrinters"),
                "https://127.0.0.1:41951/DYMO/DLS/Printing/GetPrinters"
            );
        }

        #[test]
        fn test_unquote() {
            assert_eq!(
                unquote(r#""<Printers>\r\n<A \"x\"/></Printers>""#),
                "<Printers>\r\n<A \"x\"/></Printers>"
            );
            assert_eq!(unquote(" true "), "true");
            assert_eq!(unquote("<Printers/>"), "<Printers/>");
        }

        #[test]
        fn test_unquote_unicode_escapes() {
            let body = r#""\u003cPrinters\u003e\u003cLabelWriterPrinter\u003e\u003cName\u003eFront \u0026amp; Back\u003c/Name\u003e\u003cIsConnected\u003eTrue\u003c/IsConnected\u003e\u003c/LabelWriterPrinter\u003e\u003c/Printers\u003e""#;
            let xml = unquote(body);
            assert!(xml.starts_with("<Printers><LabelWriterPrinter>"), "{}", xml);

            let printers = parse_printers(&xml).unwrap();
            assert_eq!(printers.len(), 1);
            assert_eq!(printers[0].name, "Front & Back");
            assert!(printers[0].is_connected);
        }
    }
}

#[cfg(feature = "web-service")]
pub use web::DEFAULT_SERVICE_URL;
