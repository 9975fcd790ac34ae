//! Artifact deliveries
//!
//! - [`FileSink`]: save into the output directory (the download path)
//! - [`SystemPrintSink`]: spool, then open with the platform viewer so an
//!   auto-print PDF raises the print dialog

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{info, instrument};

use super::adapter::{Artifact, OutputError};

/// Destination for encoded artifacts
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Deliver one artifact, returning where it ended up
    async fn deliver(&self, artifact: &Artifact) -> Result<PathBuf, OutputError>;
}

/// Replace characters that would escape the output directory
pub fn safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.trim_start_matches('.') {
        "" => "_".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Saves artifacts into a directory
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ArtifactSink for FileSink {
    #[instrument(skip(self, artifact), fields(file = %artifact.filename, bytes = artifact.bytes.len()))]
    async fn deliver(&self, artifact: &Artifact) -> Result<PathBuf, OutputError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(safe_file_name(&artifact.filename));
        tokio::fs::write(&path, &artifact.bytes).await?;
        info!(path = %path.display(), "Artifact saved");
        Ok(path)
    }
}

/// Opens spooled documents with the platform viewer
#[derive(Debug, Clone)]
pub struct SystemPrintSink {
    spool: FileSink,
    program: String,
    args: Vec<String>,
}

impl SystemPrintSink {
    /// Spool into `spool_dir` and open with the platform default opener
    pub fn new(spool_dir: impl Into<PathBuf>) -> Self {
        let (program, args): (&str, &[&str]) = if cfg!(target_os = "windows") {
            ("cmd", &["/C", "start", ""])
        } else if cfg!(target_os = "macos") {
            ("open", &[])
        } else {
            ("xdg-open", &[])
        };
        Self::with_opener(spool_dir, program, args)
    }

    /// Use a specific opener command; the spooled path is appended last
    pub fn with_opener(spool_dir: impl Into<PathBuf>, program: &str, args: &[&str]) -> Self {
        Self {
            spool: FileSink::new(spool_dir),
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[async_trait]
impl ArtifactSink for SystemPrintSink {
    #[instrument(skip(self, artifact), fields(file = %artifact.filename, opener = %self.program))]
    async fn deliver(&self, artifact: &Artifact) -> Result<PathBuf, OutputError> {
        let path = self.spool.deliver(artifact).await?;

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&path)
            .status()
            .await
            .map_err(|e| OutputError::Delivery(format!("{}: {}", self.program, e)))?;
        if !status.success() {
            return Err(OutputError::Delivery(format!(
                "{} exited with {}",
                self.program, status
            )));
        }

        info!(path = %path.display(), "Sent to print dialog");
        Ok(path)
    }
}
