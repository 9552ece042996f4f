//! Excel exporter implementation

use super::FormulaTranslator;
use crate::error::{RabError, RabResult};
use crate::format::CurrencyFormat;
use crate::labels::{self, COLUMN_HEADERS, GRAND_TOTAL_LABEL, REPORT_HEADING};
use crate::types::Report;
use rust_xlsxwriter::{Format, FormatAlign, Formula, Workbook, Worksheet, XlsxError};
use tracing::debug;

/// Name of the worksheet holding the cost table
pub const REPORT_SHEET: &str = "RAB";

/// Name of the worksheet documenting the formulas
pub const REFERENCE_SHEET: &str = "Penjelasan Rumus";

// Column positions (0-based)
pub(crate) const COL_NO: u16 = 0;
pub(crate) const COL_QUANTITY: u16 = 3;
pub(crate) const COL_UNIT_PRICE: u16 = 5;
pub(crate) const COL_TOTAL: u16 = 6;

/// Excel row (1-based) of the column header row; row 4 stays blank
pub const HEADER_ROW: u32 = 5;

const COLUMN_WIDTHS: [f64; 7] = [6.0, 20.0, 32.0, 12.0, 12.0, 16.0, 16.0];
const REFERENCE_HEADERS: [(&str, f64); 3] = [("Rumus", 16.0), ("Deskripsi", 40.0), ("Contoh", 40.0)];

/// Row numbers of the cost table for one report (Excel numbering, 1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRange {
    pub first_data_row: u32,
    /// Equals `HEADER_ROW` when the report has no items
    pub last_data_row: u32,
    pub summary_row: u32,
}

impl DataRange {
    pub fn for_item_count(count: usize) -> Self {
        let first_data_row = HEADER_ROW + 1;
        let last_data_row = HEADER_ROW + count as u32;
        Self {
            first_data_row,
            last_data_row,
            summary_row: last_data_row + 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.last_data_row < self.first_data_row
    }

    /// Rows covered by the grand-total SUM
    ///
    /// Without items the range collapses onto the header cell, whose text
    /// SUM ignores, so the formula yields 0 instead of referencing itself.
    pub fn sum_bounds(&self) -> (u32, u32) {
        if self.is_empty() {
            (HEADER_ROW, HEADER_ROW)
        } else {
            (self.first_data_row, self.last_data_row)
        }
    }
}

struct ExcelFormats {
    title: Format,
    header: Format,
    currency: Format,
    total_label: Format,
    total_currency: Format,
}

/// Excel exporter for cost-estimate reports
///
/// Produces the `RAB` sheet with live row and grand-total formulas and a
/// `Penjelasan Rumus` sheet documenting them.
#[derive(Debug, Clone, Default)]
pub struct ExcelExporter {
    currency: CurrencyFormat,
}

impl ExcelExporter {
    /// Create a new Excel exporter
    pub fn new(currency: CurrencyFormat) -> Self {
        Self { currency }
    }

    /// Translator bound to the report sheet's column layout
    pub fn translator() -> FormulaTranslator {
        FormulaTranslator::new(
            COL_QUANTITY as usize,
            COL_UNIT_PRICE as usize,
            COL_TOTAL as usize,
        )
    }

    /// Build the workbook and return the .xlsx bytes
    pub fn generate(&self, report: &Report) -> RabResult<Vec<u8>> {
        let mut workbook = Workbook::new();
        let formats = self.create_formats();
        let range = DataRange::for_item_count(report.item_count());

        debug!(
            items = report.item_count(),
            summary_row = range.summary_row,
            "building workbook"
        );

        self.write_report_sheet(&mut workbook, report, &formats, &range)?;
        self.write_reference_sheet(&mut workbook, &formats, &range)?;

        workbook
            .save_to_buffer()
            .map_err(|e| RabError::Serialization(format!("Failed to save Excel workbook: {}", e)))
    }

    fn create_formats(&self) -> ExcelFormats {
        let num_format = self.currency.excel_num_format();

        ExcelFormats {
            title: Format::new()
                .set_bold()
                .set_font_size(14)
                .set_align(FormatAlign::Center),
            header: Format::new().set_bold(),
            currency: Format::new().set_num_format(&num_format),
            total_label: Format::new().set_bold(),
            total_currency: Format::new().set_bold().set_num_format(&num_format),
        }
    }

    /// Title block, header row, one row per item, grand total
    fn write_report_sheet(
        &self,
        workbook: &mut Workbook,
        report: &Report,
        formats: &ExcelFormats,
        range: &DataRange,
    ) -> RabResult<()> {
        let translator = Self::translator();
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(REPORT_SHEET)
            .map_err(export_error("set worksheet name"))?;

        for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
            worksheet
                .set_column_width(col as u16, *width)
                .map_err(export_error("set column width"))?;
        }

        // Title spans the whole table
        worksheet
            .merge_range(0, COL_NO, 0, COL_TOTAL, REPORT_HEADING, &formats.title)
            .map_err(export_error("write title"))?;
        worksheet
            .write_string(1, 0, labels::title_line(&report.metadata.title))
            .map_err(export_error("write report title"))?;
        worksheet
            .write_string(2, 0, labels::date_line(&report.metadata.date))
            .map_err(export_error("write report date"))?;

        let header_row = HEADER_ROW - 1; // worksheet API is 0-indexed
        for (col, header) in COLUMN_HEADERS.iter().enumerate() {
            worksheet
                .write_string_with_format(header_row, col as u16, *header, &formats.header)
                .map_err(export_error("write header"))?;
        }

        for (idx, item) in report.items.iter().enumerate() {
            let excel_row = range.first_data_row + idx as u32;
            let row = excel_row - 1;

            if item.has_blank_label() {
                worksheet
                    .write_number(row, COL_NO, (idx + 1) as f64)
                    .map_err(export_error("write row number"))?;
            } else {
                worksheet
                    .write_string(row, COL_NO, item.label_at(idx))
                    .map_err(export_error("write row label"))?;
            }

            worksheet
                .write_string(row, 1, &item.category)
                .map_err(export_error("write category"))?;
            worksheet
                .write_string(row, 2, &item.description)
                .map_err(export_error("write description"))?;
            worksheet
                .write_number(row, COL_QUANTITY, item.quantity_or_zero())
                .map_err(export_error("write quantity"))?;
            worksheet
                .write_string(row, 4, &item.unit)
                .map_err(export_error("write unit"))?;
            worksheet
                .write_number_with_format(
                    row,
                    COL_UNIT_PRICE,
                    item.unit_price_or_zero(),
                    &formats.currency,
                )
                .map_err(export_error("write unit price"))?;

            let formula = Formula::new(translator.row_total(excel_row))
                .set_result(item.line_total().to_string());
            worksheet
                .write_formula_with_format(row, COL_TOTAL, formula, &formats.currency)
                .map_err(export_error("write row total formula"))?;
        }

        let (sum_first, sum_last) = range.sum_bounds();
        let summary = range.summary_row - 1;
        worksheet
            .write_string_with_format(summary, COL_UNIT_PRICE, GRAND_TOTAL_LABEL, &formats.total_label)
            .map_err(export_error("write grand total label"))?;

        let formula = Formula::new(translator.grand_total(sum_first, sum_last))
            .set_result(report.grand_total().to_string());
        worksheet
            .write_formula_with_format(summary, COL_TOTAL, formula, &formats.total_currency)
            .map_err(export_error("write grand total formula"))?;

        Ok(())
    }

    /// Static table explaining the formulas used in the report sheet
    fn write_reference_sheet(
        &self,
        workbook: &mut Workbook,
        formats: &ExcelFormats,
        range: &DataRange,
    ) -> RabResult<()> {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(REFERENCE_SHEET)
            .map_err(export_error("set worksheet name"))?;

        for (col, (header, width)) in REFERENCE_HEADERS.iter().enumerate() {
            worksheet
                .set_column_width(col as u16, *width)
                .map_err(export_error("set column width"))?;
            worksheet
                .write_string_with_format(0, col as u16, *header, &formats.header)
                .map_err(export_error("write header"))?;
        }

        for (idx, note) in Self::formula_notes(range).iter().enumerate() {
            let row = (idx + 1) as u32;
            write_text_row(worksheet, row, note)?;
        }

        Ok(())
    }

    /// Rows of the reference sheet: name, description, example formula
    pub fn formula_notes(range: &DataRange) -> [[String; 3]; 4] {
        let translator = Self::translator();
        let (sum_first, sum_last) = range.sum_bounds();

        [
            [
                "SUM".to_string(),
                "Menjumlahkan data.".to_string(),
                format!("Contoh {}", translator.grand_total(sum_first, sum_last)),
            ],
            [
                "AVERAGE".to_string(),
                "Menghitung rata-rata.".to_string(),
                format!("Contoh {}", translator.average(sum_first, sum_last)),
            ],
            [
                "PERCENTAGE".to_string(),
                "Menghitung persen.".to_string(),
                format!(
                    "Contoh {}",
                    translator.percentage(range.first_data_row, range.summary_row)
                ),
            ],
            [
                "TOTAL".to_string(),
                "Menghitung total biaya per item.".to_string(),
                format!("Contoh {}", translator.row_total(range.first_data_row)),
            ],
        ]
    }
}

fn write_text_row(worksheet: &mut Worksheet, row: u32, cells: &[String]) -> RabResult<()> {
    for (col, text) in cells.iter().enumerate() {
        worksheet
            .write_string(row, col as u16, text)
            .map_err(export_error("write formula note"))?;
    }
    Ok(())
}

fn export_error(action: &'static str) -> impl Fn(XlsxError) -> RabError {
    move |e| RabError::Serialization(format!("Failed to {}: {}", action, e))
}
