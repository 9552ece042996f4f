//! Word (.docx) export for cost-estimate reports

mod exporter;

pub use exporter::WordExporter;
