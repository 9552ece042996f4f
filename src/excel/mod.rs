//! Excel export and formula audit for cost-estimate reports
//!
//! This module provides:
//! - Export: Report → Excel (.xlsx) with live row and grand-total formulas
//! - Audit: Excel (.xlsx) → totals recomputed from those formulas

mod auditor;
mod exporter;
mod formula_translator;

pub use auditor::{approx_eq, FormulaAuditor, RowAudit, WorkbookAudit};
pub use exporter::{DataRange, ExcelExporter, HEADER_ROW, REFERENCE_SHEET, REPORT_SHEET};
pub use formula_translator::FormulaTranslator;
