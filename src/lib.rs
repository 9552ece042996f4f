//! RAB - cost estimate reports to Excel and Word
//!
//! A report (title, date and line items) is exported as an `.xlsx` workbook
//! whose totals are live spreadsheet formulas, or as a `.docx` document with
//! the same figures already computed.
//!
//! # Features
//!
//! - Per-row `=Jumlah*Harga Satuan` formulas and a `SUM` grand total
//! - Formula reference sheet ("Penjelasan Rumus")
//! - Word document with the report table and grand total
//! - Concurrent export of both formats from one report snapshot
//! - Formula auditing of exported workbooks
//! - Saved report history (newest first, capped)
//!
//! # Example
//!
//! ```no_run
//! use rab_report::{ExportCoordinator, ExportFormat, LineItem, Report, ReportMetadata};
//! use std::path::Path;
//!
//! # async fn run() -> rab_report::RabResult<()> {
//! let mut report = Report::new(ReportMetadata::new("Renovasi Dapur", "2025-04-01"));
//! report.add_item(LineItem::new("Material", "Keramik", 20.0, "m2", 85000.0));
//!
//! let coordinator = ExportCoordinator::default();
//! let path = coordinator
//!     .export_to_dir(&report, ExportFormat::Spreadsheet, Path::new("out"))
//!     .await?;
//! println!("Saved {}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod error;
pub mod excel;
pub mod export;
pub mod format;
pub mod history;
pub mod labels;
pub mod parser;
pub mod types;
pub mod word;

// Re-export commonly used types
pub use error::{RabError, RabResult};
pub use export::{Artifact, ExportCoordinator, ExportFormat};
pub use format::CurrencyFormat;
pub use types::{LineItem, Report, ReportMetadata};
