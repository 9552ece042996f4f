//! Formula audit of exported workbooks - .xlsx → recomputed totals
//!
//! Reads a workbook back, evaluates every formula of the total column with an
//! Excel-compatible engine, and compares the results with a report.

use super::exporter::{COL_TOTAL, REPORT_SHEET};
use super::FormulaTranslator;
use crate::error::{RabError, RabResult};
use crate::types::Report;
use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use regex::Regex;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;
use xlformula_engine::{calculate, parse_formula, types, NoCustomFunction};

/// Nested formula references deeper than this are treated as circular
const MAX_DEPTH: usize = 16;

/// Recomputed value of one row-total formula
#[derive(Debug, Clone, PartialEq)]
pub struct RowAudit {
    /// Excel row number (1-based)
    pub row: u32,
    /// Formula as stored in the workbook (without `=`)
    pub formula: String,
    pub value: f64,
}

/// Totals recomputed from the workbook's formulas
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookAudit {
    pub line_totals: Vec<RowAudit>,
    pub grand_total: f64,
    pub grand_total_formula: String,
}

impl WorkbookAudit {
    /// Sum of the recomputed row totals
    pub fn line_total_sum(&self) -> f64 {
        self.line_totals.iter().map(|r| r.value).sum()
    }

    /// Mismatches against a report, empty when the workbook agrees with it
    pub fn compare(&self, report: &Report) -> Vec<String> {
        let mut problems = Vec::new();

        if self.line_totals.len() != report.item_count() {
            problems.push(format!(
                "workbook has {} total formulas, report has {} items",
                self.line_totals.len(),
                report.item_count()
            ));
        }

        for (audit, expected) in self.line_totals.iter().zip(report.line_totals()) {
            if !approx_eq(audit.value, expected) {
                problems.push(format!(
                    "row {}: ={} evaluates to {}, expected {}",
                    audit.row, audit.formula, audit.value, expected
                ));
            }
        }

        if !approx_eq(self.grand_total, report.grand_total()) {
            problems.push(format!(
                "grand total ={} evaluates to {}, expected {}",
                self.grand_total_formula,
                self.grand_total,
                report.grand_total()
            ));
        }

        problems
    }

    /// Fail with a `Verification` error listing every mismatch
    pub fn verify(&self, report: &Report) -> RabResult<()> {
        let problems = self.compare(report);
        if problems.is_empty() {
            Ok(())
        } else {
            Err(RabError::Verification(problems.join("; ")))
        }
    }
}

/// Equality within the engine's single-precision arithmetic
pub fn approx_eq(actual: f64, expected: f64) -> bool {
    let scale = actual.abs().max(expected.abs()).max(1.0);
    (actual - expected).abs() <= scale * 1e-5
}

/// Formula auditor for workbooks written by [`super::ExcelExporter`]
pub struct FormulaAuditor {
    workbook: Xlsx<Cursor<Vec<u8>>>,
}

impl FormulaAuditor {
    /// Open a workbook from its bytes
    pub fn from_bytes(bytes: Vec<u8>) -> RabResult<Self> {
        let workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
            .map_err(|e| RabError::Parse(format!("Failed to open Excel workbook: {}", e)))?;
        Ok(Self { workbook })
    }

    /// Open a workbook file
    pub fn open<P: AsRef<Path>>(path: P) -> RabResult<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(bytes)
    }

    /// Recompute every formula of the total column
    pub fn audit(&mut self) -> RabResult<WorkbookAudit> {
        if !self.workbook.sheet_names().iter().any(|n| n == REPORT_SHEET) {
            return Err(RabError::Verification(format!(
                "workbook has no '{}' sheet",
                REPORT_SHEET
            )));
        }

        let values = self
            .workbook
            .worksheet_range(REPORT_SHEET)
            .map_err(|e| RabError::Parse(format!("Failed to read sheet values: {}", e)))?;
        let formulas = self
            .workbook
            .worksheet_formula(REPORT_SHEET)
            .map_err(|e| RabError::Parse(format!("Failed to read sheet formulas: {}", e)))?;

        let sheet = SheetCells::new(values, formulas)?;
        let mut line_totals = Vec::new();
        let mut grand_total = None;

        for (row, col, formula) in sheet.formula_cells() {
            if col != COL_TOTAL as u32 {
                continue;
            }

            let value = sheet.evaluate(col, row, 0)?;
            let excel_row = row + 1;
            debug!(row = excel_row, formula = %formula, value, "evaluated formula");

            if is_sum(&formula) {
                grand_total = Some((formula, value));
            } else {
                line_totals.push(RowAudit {
                    row: excel_row,
                    formula,
                    value,
                });
            }
        }

        let (grand_total_formula, grand_total) = grand_total.ok_or_else(|| {
            RabError::Verification("workbook has no grand total formula".to_string())
        })?;

        line_totals.sort_by_key(|r| r.row);

        Ok(WorkbookAudit {
            line_totals,
            grand_total,
            grand_total_formula,
        })
    }
}

fn is_sum(formula: &str) -> bool {
    formula
        .trim_start_matches('=')
        .trim_start()
        .to_ascii_uppercase()
        .starts_with("SUM(")
}

/// Literal values and formulas of one sheet, addressed by absolute 0-based position
struct SheetCells {
    values: Range<Data>,
    formulas: Range<String>,
    range_pattern: Regex,
}

impl SheetCells {
    fn new(values: Range<Data>, formulas: Range<String>) -> RabResult<Self> {
        let range_pattern = Regex::new(r"(\$?[A-Za-z]+\$?\d+):(\$?[A-Za-z]+\$?\d+)")
            .map_err(|e| RabError::Parse(format!("Regex error: {}", e)))?;
        Ok(Self {
            values,
            formulas,
            range_pattern,
        })
    }

    /// Non-empty formulas as (row, col, formula), 0-based absolute positions
    fn formula_cells(&self) -> Vec<(u32, u32, String)> {
        let (start_row, start_col) = self.formulas.start().unwrap_or((0, 0));
        self.formulas
            .cells()
            .filter(|(_, _, f)| !f.is_empty())
            .map(|(r, c, f)| (start_row + r as u32, start_col + c as u32, f.clone()))
            .collect()
    }

    fn formula_at(&self, col: u32, row: u32) -> Option<&str> {
        self.formulas
            .get_value((row, col))
            .map(String::as_str)
            .filter(|f| !f.is_empty())
    }

    fn literal_at(&self, col: u32, row: u32) -> Option<&Data> {
        self.values.get_value((row, col))
    }

    /// Whether SUM would count this cell (numbers and formulas, not text)
    fn is_summable(&self, col: u32, row: u32) -> bool {
        if self.formula_at(col, row).is_some() {
            return true;
        }
        matches!(self.literal_at(col, row), Some(Data::Float(_)) | Some(Data::Int(_)))
    }

    /// Evaluate the cell at (col, row), following formulas recursively
    fn evaluate(&self, col: u32, row: u32, depth: usize) -> RabResult<f64> {
        if depth > MAX_DEPTH {
            return Err(RabError::Verification(format!(
                "circular reference at {}",
                FormulaTranslator::cell_ref(col as usize, row + 1)
            )));
        }

        let Some(formula) = self.formula_at(col, row) else {
            return Ok(match self.literal_at(col, row) {
                Some(Data::Float(f)) => *f,
                Some(Data::Int(i)) => *i as f64,
                _ => 0.0,
            });
        };

        let expanded = self.expand_ranges(formula);
        let formula_str = format!("={}", expanded.trim_start_matches('='));

        let resolver = |name: String| -> types::Value {
            let Some((ref_col, ref_row)) = FormulaTranslator::parse_cell_ref(&name) else {
                return types::Value::Error(types::Error::Value);
            };
            let (ref_col, ref_row) = (ref_col as u32, ref_row - 1);

            if self.formula_at(ref_col, ref_row).is_none() {
                if let Some(Data::String(_)) = self.literal_at(ref_col, ref_row) {
                    return types::Value::Error(types::Error::Value);
                }
            }

            match self.evaluate(ref_col, ref_row, depth + 1) {
                Ok(value) => types::Value::Number(value as f32),
                Err(_) => types::Value::Error(types::Error::Value),
            }
        };

        let parsed = parse_formula::parse_string_to_formula(&formula_str, None::<NoCustomFunction>);
        let result = calculate::calculate_formula(parsed, Some(&resolver));

        match result {
            types::Value::Number(n) => Ok(n as f64),
            types::Value::Error(e) => Err(RabError::Verification(format!(
                "Formula '{}' returned error: {:?}",
                formula, e
            ))),
            other => Err(RabError::Verification(format!(
                "Formula '{}' returned unexpected type: {:?}",
                formula, other
            ))),
        }
    }

    /// Replace `G6:G8` with `G6,G7,G8`, keeping only cells SUM would count
    ///
    /// A range with nothing to count becomes `0`.
    fn expand_ranges(&self, formula: &str) -> String {
        let mut result = formula.to_string();
        let matches: Vec<_> = self.range_pattern.captures_iter(formula).collect();

        for caps in matches.iter().rev() {
            let (Some(whole), Some(from), Some(to)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            let (Some((c1, r1)), Some((c2, r2))) = (
                FormulaTranslator::parse_cell_ref(from.as_str()),
                FormulaTranslator::parse_cell_ref(to.as_str()),
            ) else {
                continue;
            };

            let mut cells = Vec::new();
            for col in c1.min(c2)..=c1.max(c2) {
                for row in r1.min(r2)..=r1.max(r2) {
                    if self.is_summable(col as u32, row - 1) {
                        cells.push(FormulaTranslator::cell_ref(col, row));
                    }
                }
            }

            let replacement = if cells.is_empty() {
                "0".to_string()
            } else {
                cells.join(",")
            };
            result.replace_range(whole.range(), &replacement);
        }

        result
    }
}
