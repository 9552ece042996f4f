//! Word exporter implementation

use crate::error::{RabError, RabResult};
use crate::format::CurrencyFormat;
use crate::labels::{self, COLUMN_HEADERS, DOCUMENT_TOTAL_LABEL, GENERATED_NOTICE, REPORT_HEADING};
use crate::types::Report;
use docx_rs::{
    AlignmentType, Docx, Paragraph, Run, Style, StyleType, Table, TableCell, TableRow, WidthType,
};
use std::io::Cursor;
use tracing::debug;

const HEADING_STYLE: &str = "Heading1";

/// Full table width, in fiftieths of a percent
const FULL_WIDTH_PCT: usize = 5000;

/// Word exporter for cost-estimate reports
///
/// The table holds literal text only: every number is formatted when the
/// document is generated.
#[derive(Debug, Clone, Default)]
pub struct WordExporter {
    currency: CurrencyFormat,
}

impl WordExporter {
    /// Create a new Word exporter
    pub fn new(currency: CurrencyFormat) -> Self {
        Self { currency }
    }

    /// Build the document and return the .docx bytes
    pub fn generate(&self, report: &Report) -> RabResult<Vec<u8>> {
        debug!(items = report.item_count(), "building document");

        let heading_style = Style::new(HEADING_STYLE, StyleType::Paragraph)
            .name("Heading 1")
            .bold()
            .size(32); // half-points, 16pt

        let heading = Paragraph::new()
            .add_run(Run::new().add_text(REPORT_HEADING))
            .style(HEADING_STYLE)
            .align(AlignmentType::Center);

        let total = Paragraph::new().add_run(Run::new().add_text(self.grand_total_line(report)).bold());

        let docx = Docx::new()
            .add_style(heading_style)
            .add_paragraph(heading)
            .add_paragraph(text_paragraph(&labels::title_line(&report.metadata.title)))
            .add_paragraph(text_paragraph(&labels::date_line(&report.metadata.date)))
            .add_paragraph(Paragraph::new())
            .add_table(self.build_table(report))
            .add_paragraph(Paragraph::new())
            .add_paragraph(total)
            .add_paragraph(text_paragraph(GENERATED_NOTICE));

        let mut buf = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut buf)
            .map_err(|e| RabError::Serialization(format!("Failed to pack DOCX: {}", e)))?;

        Ok(buf.into_inner())
    }

    /// The bold closing line, e.g. `Total Keseluruhan: Rp 175`
    pub fn grand_total_line(&self, report: &Report) -> String {
        format!(
            "{}: {}",
            DOCUMENT_TOTAL_LABEL,
            self.currency.format(report.grand_total())
        )
    }

    /// Cell text of every data row, in report order
    pub fn table_rows(&self, report: &Report) -> Vec<[String; 7]> {
        report
            .items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                [
                    item.label_at(idx),
                    item.category.clone(),
                    item.description.clone(),
                    self.currency.format_quantity(item.quantity_or_zero()),
                    item.unit.clone(),
                    self.currency.format(item.unit_price_or_zero()),
                    self.currency.format(item.line_total()),
                ]
            })
            .collect()
    }

    fn build_table(&self, report: &Report) -> Table {
        let mut rows = Vec::with_capacity(report.item_count() + 1);

        let header_cells: Vec<TableCell> = COLUMN_HEADERS
            .iter()
            .map(|h| TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text(*h).bold())))
            .collect();
        rows.push(TableRow::new(header_cells));

        for row in self.table_rows(report) {
            let cells: Vec<TableCell> = row
                .iter()
                .map(|text| TableCell::new().add_paragraph(text_paragraph(text)))
                .collect();
            rows.push(TableRow::new(cells));
        }

        Table::new(rows).width(FULL_WIDTH_PCT, WidthType::Pct)
    }
}

fn text_paragraph(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}
