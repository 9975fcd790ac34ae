use std::path::PathBuf;

use shared::models::Pharmacy;
use shared::CounterKind;

/// Station configuration
///
/// # Environment
///
/// Every field can be overridden by an environment variable:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./rx-station | base directory |
/// | COUNTER_DB | <WORK_DIR>/counters.redb | prescription counter database |
/// | OUTPUT_DIR | <WORK_DIR>/labels | saved PDFs and `.label` files |
/// | RX_SEED | 1000000 | first standard prescription number |
/// | CRX_SEED | 5000000 | first controlled prescription number |
/// | PRINTER_SERVICE_URL | https://127.0.0.1:41951/DYMO/DLS/Printing | label printer web service |
/// | PRINTER_TYPE | LabelWriterPrinter | printer type filter |
/// | PRINTER_ACCEPT_INVALID_CERTS | true | trust the service's self-signed certificate |
/// | PHARMACY_NAME / PHARMACY_ADDRESS / PHARMACY_PHONE | see below | label header |
/// | LOG_LEVEL | info | tracing level |
/// | LOG_DIR | unset | daily rolling log directory |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/srv/pharmacy PRINTER_TYPE=LabelWriterPrinter rx-station counters
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory for the counter database and outputs
    pub work_dir: PathBuf,
    pub counter_db: PathBuf,
    /// Download path for saved labels
    pub output_dir: PathBuf,
    pub rx_seed: u64,
    pub crx_seed: u64,
    pub printer_service_url: String,
    pub printer_type: String,
    pub printer_accept_invalid_certs: bool,
    /// Header used when a request carries no pharmacy
    pub pharmacy: Pharmacy,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Config {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let work_dir =
            PathBuf::from(std::env::var("WORK_DIR").unwrap_or_else(|_| "./rx-station".into()));

        Self {
            counter_db: std::env::var("COUNTER_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|_| work_dir.join("counters.redb")),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| work_dir.join("labels")),
            rx_seed: std::env::var("RX_SEED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(CounterKind::Standard.default_seed()),
            crx_seed: std::env::var("CRX_SEED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(CounterKind::Controlled.default_seed()),
            printer_service_url: std::env::var("PRINTER_SERVICE_URL")
                .unwrap_or_else(|_| rx_printer::DEFAULT_SERVICE_URL.into()),
            printer_type: std::env::var("PRINTER_TYPE")
                .unwrap_or_else(|_| rx_printer::DEFAULT_PRINTER_TYPE.into()),
            printer_accept_invalid_certs: std::env::var("PRINTER_ACCEPT_INVALID_CERTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            pharmacy: Pharmacy {
                name: std::env::var("PHARMACY_NAME")
                    .unwrap_or_else(|_| "Chantilly Academy Pharmacy".into()),
                address: std::env::var("PHARMACY_ADDRESS")
                    .unwrap_or_else(|_| "4201 Stringfellow Rd, Greenbriar, VA 20151".into()),
                phone: std::env::var("PHARMACY_PHONE").unwrap_or_else(|_| "(420) 102 0151".into()),
            },
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            work_dir,
        }
    }

    /// Load from the environment, rooted at a custom work directory
    ///
    /// Used by tests.
    pub fn with_work_dir(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        let mut config = Self::from_env();
        config.counter_db = work_dir.join("counters.redb");
        config.output_dir = work_dir.join("labels");
        config.work_dir = work_dir;
        config
    }

    /// Seed of a counter
    pub fn seed(&self, kind: CounterKind) -> u64 {
        match kind {
            CounterKind::Standard => self.rx_seed,
            CounterKind::Controlled => self.crx_seed,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_dir_override() {
        let config = Config::with_work_dir("/tmp/rx");
        assert_eq!(config.counter_db, PathBuf::from("/tmp/rx/counters.redb"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/rx/labels"));
        assert!(!config.pharmacy.name.is_empty());
    }
}
