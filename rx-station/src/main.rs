use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use rx_station::{Config, LabelService, OutputMode, init_logger_with_file};
use serde::de::DeserializeOwned;
use shared::models::{GridSheetRequest, PrescriptionRequest};

#[derive(Parser, Debug)]
#[command(name = "rx-station")]
#[command(about = "Prescription numbering and label printing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// One PDF with a page per copy
    Pdf,
    /// Label printer descriptors
    Label,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Number a prescription and print its labels
    Rx {
        /// Prescription JSON file, `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        #[arg(short, long, default_value_t = 1)]
        copies: usize,

        #[arg(short, long, value_enum, default_value_t = Format::Label)]
        format: Format,

        /// Save files instead of printing
        #[arg(long)]
        debug: bool,
    },

    /// Print a medidose grid sheet
    Grid {
        /// Grid sheet JSON file, `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Overrides the operator in the input
        #[arg(short, long)]
        operator: Option<String>,
    },

    /// Show the next prescription numbers
    Counters,
}

fn read_json<T: DeserializeOwned>(input: &Path) -> anyhow::Result<T> {
    let text = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("parsing {}", input.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    let service = LabelService::from_config(&config).await?;

    match cli.command {
        Commands::Rx {
            input,
            copies,
            format,
            debug,
        } => {
            let request: PrescriptionRequest = read_json(&input)?;
            request.validate()?;
            let mode = match format {
                Format::Pdf => OutputMode::PrescriptionPdf { debug },
                Format::Label => OutputMode::Descriptor { transmit: !debug },
            };
            let report = service.issue_prescription(request, copies, mode).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Grid { input, operator } => {
            let mut request: GridSheetRequest = read_json(&input)?;
            if let Some(operator) = operator {
                request.operator = operator;
            }
            request.validate()?;
            let report = service.print_grid_sheet(request).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Counters => {
            let counters = service.counters().await?;
            println!("{}", serde_json::to_string_pretty(&counters)?);
        }
    }

    Ok(())
}
