//! Export coordination: run a generator on a report snapshot and deliver the file
//!
//! Every export works on its own clone of the report, so several exports of
//! the same data can run at once without sharing state.

use crate::error::{RabError, RabResult};
use crate::excel::ExcelExporter;
use crate::format::CurrencyFormat;
use crate::labels::DEFAULT_FILE_STEM;
use crate::types::{Report, ReportMetadata};
use crate::word::WordExporter;
use clap::ValueEnum;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Output container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ExportFormat {
    /// Excel workbook with live formulas
    #[value(name = "xlsx")]
    Spreadsheet,
    /// Word document with pre-computed values
    #[value(name = "docx")]
    Document,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Spreadsheet, ExportFormat::Document];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => "xlsx",
            ExportFormat::Document => "docx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Document => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A generated file, ready to be delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Write the artifact into `dir` under its filename
    ///
    /// The bytes go to a temporary sibling first and are renamed into place,
    /// so a failed write never leaves a partial file under the final name.
    pub async fn save_to(&self, dir: &Path) -> RabResult<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;

        let target = dir.join(&self.filename);
        let partial = dir.join(format!(".{}.part", self.filename));

        if let Err(e) = tokio::fs::write(&partial, &self.bytes).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&partial, &target).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }

        info!(path = %target.display(), bytes = self.bytes.len(), "saved export");
        Ok(target)
    }
}

/// Longest stem, in bytes, for which `.<stem>.<ext>.part` stays within the
/// 255-byte file name limit of common filesystems
pub const MAX_FILE_STEM_BYTES: usize = 244;

/// `<title or "RAB">.<ext>`, with path-unsafe characters replaced
pub fn export_filename(metadata: &ReportMetadata, format: ExportFormat) -> String {
    format!("{}.{}", sanitize_file_stem(&metadata.title), format.extension())
}

/// Make a report title usable as a file name on common filesystems
///
/// Path separators, characters reserved on Windows and control characters
/// become `_`; leading and trailing dots and spaces are dropped. Long titles
/// are cut to [`MAX_FILE_STEM_BYTES`] on a character boundary. A title with
/// nothing left falls back to `RAB`.
pub fn sanitize_file_stem(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let is_padding = |c: char| c == '.' || c.is_whitespace();
    let mut trimmed = replaced.trim_matches(is_padding);
    if trimmed.len() > MAX_FILE_STEM_BYTES {
        let mut end = MAX_FILE_STEM_BYTES;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        trimmed = trimmed[..end].trim_end_matches(is_padding);
    }

    if trimmed.is_empty() {
        DEFAULT_FILE_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Runs generators and delivers their artifacts
#[derive(Debug, Clone, Default)]
pub struct ExportCoordinator {
    currency: CurrencyFormat,
}

impl ExportCoordinator {
    pub fn new(currency: CurrencyFormat) -> Self {
        Self { currency }
    }

    /// Generate one artifact from a snapshot of `report`
    pub async fn export(&self, report: &Report, format: ExportFormat) -> RabResult<Artifact> {
        let snapshot = Arc::new(report.clone());
        self.clone().spawn_export(snapshot, format).await
    }

    /// Generate several formats concurrently; results follow `formats` order
    pub async fn export_all(
        &self,
        report: &Report,
        formats: &[ExportFormat],
    ) -> RabResult<Vec<Artifact>> {
        let snapshot = Arc::new(report.clone());

        let pending: Vec<_> = formats
            .iter()
            .map(|format| tokio::spawn(self.clone().spawn_export(Arc::clone(&snapshot), *format)))
            .collect();

        let mut artifacts = Vec::with_capacity(pending.len());
        for handle in pending {
            let artifact = handle
                .await
                .map_err(|e| RabError::Serialization(format!("Export task failed: {}", e)))??;
            artifacts.push(artifact);
        }

        Ok(artifacts)
    }

    /// Generate and save one artifact into `dir`
    pub async fn export_to_dir(
        &self,
        report: &Report,
        format: ExportFormat,
        dir: &Path,
    ) -> RabResult<PathBuf> {
        let artifact = self.export(report, format).await?;
        artifact.save_to(dir).await
    }

    /// Run the generator on the blocking pool (container compression is CPU-bound)
    async fn spawn_export(self, report: Arc<Report>, format: ExportFormat) -> RabResult<Artifact> {
        let filename = export_filename(&report.metadata, format);
        debug!(%format, filename = %filename, items = report.item_count(), "starting export");

        let currency = self.currency.clone();
        let bytes = tokio::task::spawn_blocking(move || match format {
            ExportFormat::Spreadsheet => ExcelExporter::new(currency).generate(&report),
            ExportFormat::Document => WordExporter::new(currency).generate(&report),
        })
        .await
        .map_err(|e| RabError::Serialization(format!("Export task failed: {}", e)))??;

        info!(%format, filename = %filename, bytes = bytes.len(), "export complete");

        Ok(Artifact {
            filename,
            format,
            bytes,
        })
    }
}
