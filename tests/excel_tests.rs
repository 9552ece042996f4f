//! Excel export tests: workbook layout, live formulas and formula audit

use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use pretty_assertions::assert_eq;
use rab_report::excel::{
    approx_eq, DataRange, ExcelExporter, FormulaAuditor, HEADER_ROW, REFERENCE_SHEET, REPORT_SHEET,
};
use rab_report::types::{LineItem, Report, ReportMetadata};
use rab_report::RabError;
use std::io::{Cursor, Read};

fn sample_report() -> Report {
    let mut report = Report::new(ReportMetadata::new("Renovasi Dapur", "2025-04-01"));
    report.add_item(LineItem::new("Material", "Keramik", 20.0, "m2", 85000.0).with_label("1"));
    report.add_item(LineItem::new("Material", "Semen", 10.0, "sak", 65000.0).with_label("2"));
    report.add_item(LineItem::new("Upah", "Tukang", 3.0, "hari", 150000.0));
    report
}

fn open(bytes: Vec<u8>) -> Xlsx<Cursor<Vec<u8>>> {
    open_workbook_from_rs(Cursor::new(bytes)).unwrap()
}

fn values(bytes: &[u8], sheet: &str) -> Range<Data> {
    open(bytes.to_vec()).worksheet_range(sheet).unwrap()
}

fn formulas(bytes: &[u8]) -> Range<String> {
    open(bytes.to_vec()).worksheet_formula(REPORT_SHEET).unwrap()
}

/// Cell by Excel row number (1-based) and column index (0-based)
fn cell(range: &Range<Data>, excel_row: u32, col: u32) -> Data {
    range
        .get_value((excel_row - 1, col))
        .cloned()
        .unwrap_or(Data::Empty)
}

fn formula(range: &Range<String>, excel_row: u32, col: u32) -> String {
    range
        .get_value((excel_row - 1, col))
        .cloned()
        .unwrap_or_default()
}

fn zip_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut content = String::new();
    part.read_to_string(&mut content).unwrap();
    content
}

// ═══════════════════════════════════════════════════════════════════════════
// WORKBOOK LAYOUT TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_workbook_has_both_sheets() {
    let bytes = ExcelExporter::default().generate(&sample_report()).unwrap();
    let workbook = open(bytes);
    assert_eq!(
        workbook.sheet_names(),
        vec![REPORT_SHEET.to_string(), REFERENCE_SHEET.to_string()]
    );
}

#[test]
fn test_title_block_and_headers() {
    let bytes = ExcelExporter::default().generate(&sample_report()).unwrap();
    let sheet = values(&bytes, REPORT_SHEET);

    assert_eq!(
        cell(&sheet, 1, 0),
        Data::String("LAPORAN RENCANA ANGGARAN BIAYA".to_string())
    );
    assert_eq!(
        cell(&sheet, 2, 0),
        Data::String("Nama Laporan: Renovasi Dapur".to_string())
    );
    assert_eq!(cell(&sheet, 3, 0), Data::String("Tanggal: 2025-04-01".to_string()));
    assert_eq!(cell(&sheet, 4, 0), Data::Empty);

    let headers: Vec<Data> = (0..7).map(|col| cell(&sheet, HEADER_ROW, col)).collect();
    let expected: Vec<Data> = [
        "No",
        "Kategori",
        "Keterangan",
        "Jumlah",
        "Satuan",
        "Harga Satuan",
        "Total",
    ]
    .iter()
    .map(|h| Data::String(h.to_string()))
    .collect();
    assert_eq!(headers, expected);
}

#[test]
fn test_title_merged_across_table() {
    let bytes = ExcelExporter::default().generate(&sample_report()).unwrap();
    let sheet_xml = zip_part(&bytes, "xl/worksheets/sheet1.xml");
    assert!(sheet_xml.contains(r#"<mergeCell ref="A1:G1"/>"#));
}

#[test]
fn test_item_rows_in_input_order() {
    let bytes = ExcelExporter::default().generate(&sample_report()).unwrap();
    let sheet = values(&bytes, REPORT_SHEET);

    assert_eq!(cell(&sheet, 6, 2), Data::String("Keramik".to_string()));
    assert_eq!(cell(&sheet, 7, 2), Data::String("Semen".to_string()));
    assert_eq!(cell(&sheet, 8, 2), Data::String("Tukang".to_string()));

    assert_eq!(cell(&sheet, 6, 1), Data::String("Material".to_string()));
    assert_eq!(cell(&sheet, 6, 3), Data::Float(20.0));
    assert_eq!(cell(&sheet, 6, 4), Data::String("m2".to_string()));
    assert_eq!(cell(&sheet, 6, 5), Data::Float(85000.0));
}

#[test]
fn test_blank_label_uses_position() {
    let bytes = ExcelExporter::default().generate(&sample_report()).unwrap();
    let sheet = values(&bytes, REPORT_SHEET);

    assert_eq!(cell(&sheet, 6, 0), Data::String("1".to_string()));
    assert_eq!(cell(&sheet, 7, 0), Data::String("2".to_string()));
    // Third item has no label
    assert_eq!(cell(&sheet, 8, 0), Data::Float(3.0));
}

#[test]
fn test_missing_numbers_written_as_zero() {
    let mut report = Report::new(ReportMetadata::new("X", "2025-04-01"));
    let mut item = LineItem::new("Material", "Paku", 0.0, "kg", 0.0);
    item.quantity = None;
    item.unit_price = Some(f64::NAN);
    report.add_item(item);

    let bytes = ExcelExporter::default().generate(&report).unwrap();
    let sheet = values(&bytes, REPORT_SHEET);
    assert_eq!(cell(&sheet, 6, 3), Data::Float(0.0));
    assert_eq!(cell(&sheet, 6, 5), Data::Float(0.0));
}

// ═══════════════════════════════════════════════════════════════════════════
// LIVE FORMULA TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_row_totals_are_formulas() {
    let bytes = ExcelExporter::default().generate(&sample_report()).unwrap();
    let sheet_formulas = formulas(&bytes);

    assert_eq!(formula(&sheet_formulas, 6, 6), "D6*F6");
    assert_eq!(formula(&sheet_formulas, 7, 6), "D7*F7");
    assert_eq!(formula(&sheet_formulas, 8, 6), "D8*F8");
}

#[test]
fn test_grand_total_row() {
    let bytes = ExcelExporter::default().generate(&sample_report()).unwrap();
    let sheet = values(&bytes, REPORT_SHEET);
    let sheet_formulas = formulas(&bytes);

    assert_eq!(cell(&sheet, 9, 5), Data::String("Grand Total".to_string()));
    assert_eq!(formula(&sheet_formulas, 9, 6), "SUM(G6:G8)");
}

#[test]
fn test_cached_results_match_report() {
    let report = sample_report();
    let bytes = ExcelExporter::default().generate(&report).unwrap();
    let sheet = values(&bytes, REPORT_SHEET);

    assert_eq!(cell(&sheet, 6, 6), Data::Float(1_700_000.0));
    assert_eq!(cell(&sheet, 9, 6), Data::Float(report.grand_total()));
}

// ═══════════════════════════════════════════════════════════════════════════
// FORMULA AUDIT TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_grand_total_formula_evaluates_to_sum() {
    let report = sample_report();
    let bytes = ExcelExporter::default().generate(&report).unwrap();

    let audit = FormulaAuditor::from_bytes(bytes).unwrap().audit().unwrap();
    assert_eq!(audit.grand_total_formula, "SUM(G6:G8)");
    assert!(approx_eq(audit.grand_total, 2_800_000.0));
    assert!(approx_eq(audit.grand_total, report.grand_total()));
}

#[test]
fn test_row_formulas_evaluate_to_products() {
    let mut report = sample_report();
    let mut blank_quantity = LineItem::new("Material", "Pasir", 0.0, "m3", 250000.0);
    blank_quantity.quantity = None;
    report.add_item(blank_quantity);
    report.add_item(LineItem::new("Material", "Cat", 2.5, "galon", 0.0));

    let bytes = ExcelExporter::default().generate(&report).unwrap();
    let audit = FormulaAuditor::from_bytes(bytes).unwrap().audit().unwrap();

    assert_eq!(audit.line_totals.len(), report.item_count());
    for (row, expected) in audit.line_totals.iter().zip(report.line_totals()) {
        assert!(
            approx_eq(row.value, expected),
            "row {} = {}, expected {}",
            row.row,
            row.value,
            expected
        );
    }
    assert_eq!(audit.line_totals[3].value, 0.0);
    assert_eq!(audit.line_totals[4].value, 0.0);
    audit.verify(&report).unwrap();
}

#[test]
fn test_audit_detects_other_report() {
    let bytes = ExcelExporter::default().generate(&sample_report()).unwrap();
    let audit = FormulaAuditor::from_bytes(bytes).unwrap().audit().unwrap();

    let mut other = sample_report();
    other.items[1].quantity = Some(11.0);

    let problems = audit.compare(&other);
    assert_eq!(problems.len(), 2);
    assert!(problems[0].starts_with("row 7"));
    assert!(problems[1].starts_with("grand total"));
    assert!(audit.verify(&other).is_err());
}

#[test]
fn test_audit_rejects_foreign_workbook() {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    workbook.add_worksheet().set_name("Data").unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let result = FormulaAuditor::from_bytes(bytes).unwrap().audit();
    assert!(result.is_err());
}

// ═══════════════════════════════════════════════════════════════════════════
// EMPTY REPORT TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_empty_report_grand_total_is_zero() {
    let report = Report::new(ReportMetadata::new("", "2025-04-01"));
    let bytes = ExcelExporter::default().generate(&report).unwrap();

    let sheet = values(&bytes, REPORT_SHEET);
    assert_eq!(cell(&sheet, HEADER_ROW, 6), Data::String("Total".to_string()));
    assert_eq!(cell(&sheet, 6, 5), Data::String("Grand Total".to_string()));

    let audit = FormulaAuditor::from_bytes(bytes).unwrap().audit().unwrap();
    assert!(audit.line_totals.is_empty());
    assert_eq!(audit.grand_total, 0.0);
    audit.verify(&report).unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════
// SERIALIZATION FAILURE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_overlong_cell_text_is_serialization_error() {
    let mut report = sample_report();
    report.items[1].description = "d".repeat(40_000);

    let result = ExcelExporter::default().generate(&report);
    match result {
        Err(RabError::Serialization(message)) => assert!(message.contains("description")),
        other => panic!("expected serialization error, got {:?}", other.map(|b| b.len())),
    }
}

#[test]
fn test_overflowing_grand_total_written_as_zero() {
    let mut report = Report::new(ReportMetadata::new("X", "2025-04-01"));
    report.add_item(LineItem::new("Material", "A", 1.0, "ls", f64::MAX));
    report.add_item(LineItem::new("Material", "B", 1.0, "ls", f64::MAX));

    let bytes = ExcelExporter::default().generate(&report).unwrap();
    let sheet = values(&bytes, REPORT_SHEET);
    assert_eq!(cell(&sheet, 8, 5), Data::String("Grand Total".to_string()));
    assert_eq!(cell(&sheet, 8, 6), Data::Float(0.0));
}

// ═══════════════════════════════════════════════════════════════════════════
// REFERENCE SHEET TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_reference_sheet_matches_data_range() {
    let bytes = ExcelExporter::default().generate(&sample_report()).unwrap();
    let sheet = values(&bytes, REFERENCE_SHEET);

    assert_eq!(cell(&sheet, 1, 0), Data::String("Rumus".to_string()));
    assert_eq!(cell(&sheet, 2, 0), Data::String("SUM".to_string()));
    assert_eq!(cell(&sheet, 2, 2), Data::String("Contoh =SUM(G6:G8)".to_string()));
    assert_eq!(cell(&sheet, 3, 0), Data::String("AVERAGE".to_string()));
    assert_eq!(cell(&sheet, 4, 0), Data::String("PERCENTAGE".to_string()));
    assert_eq!(cell(&sheet, 5, 0), Data::String("TOTAL".to_string()));
    assert_eq!(cell(&sheet, 5, 2), Data::String("Contoh =D6*F6".to_string()));

    // Documentary only
    let sheet_formulas = open(bytes).worksheet_formula(REFERENCE_SHEET).unwrap();
    assert!(sheet_formulas.cells().all(|(_, _, f)| f.is_empty()));
}

#[test]
fn test_formula_notes_for_empty_report() {
    let notes = ExcelExporter::formula_notes(&DataRange::for_item_count(0));
    assert_eq!(notes[0][2], "Contoh =SUM(G5:G5)");
}

// ═══════════════════════════════════════════════════════════════════════════
// IDEMPOTENCE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_generate_twice_same_sheets() {
    let exporter = ExcelExporter::default();
    let report = sample_report();

    let first = exporter.generate(&report).unwrap();
    let second = exporter.generate(&report).unwrap();

    for part in [
        "xl/worksheets/sheet1.xml",
        "xl/worksheets/sheet2.xml",
        "xl/sharedStrings.xml",
        "xl/styles.xml",
    ] {
        assert_eq!(zip_part(&first, part), zip_part(&second, part), "{}", part);
    }
}

#[test]
fn test_generate_does_not_mutate_report() {
    let report = sample_report();
    let before = report.clone();
    ExcelExporter::default().generate(&report).unwrap();
    assert_eq!(report, before);
}
