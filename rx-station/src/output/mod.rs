//! Label output
//!
//! Encodes rendered labels (PDF or label descriptor) and delivers them: save
//! to the output directory, open the print dialog, or transmit to the label
//! printer service.

pub mod adapter;
pub mod delivery;

pub use adapter::{Artifact, Delivery, Emitted, OutputAdapter, OutputError, OutputMode};
pub use delivery::{ArtifactSink, FileSink, SystemPrintSink, safe_file_name};
