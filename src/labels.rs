//! Fixed report wording shared by the Excel and Word exports

/// Heading printed at the top of every export
pub const REPORT_HEADING: &str = "LAPORAN RENCANA ANGGARAN BIAYA";

/// Cost table headers, in column order
pub const COLUMN_HEADERS: [&str; 7] = [
    "No",
    "Kategori",
    "Keterangan",
    "Jumlah",
    "Satuan",
    "Harga Satuan",
    "Total",
];

/// Base filename when the report has no title
pub const DEFAULT_FILE_STEM: &str = "RAB";

pub const GRAND_TOTAL_LABEL: &str = "Grand Total";
pub const DOCUMENT_TOTAL_LABEL: &str = "Total Keseluruhan";
pub const GENERATED_NOTICE: &str = "Catatan: Dokumen ini dihasilkan otomatis oleh sistem.";

pub fn title_line(title: &str) -> String {
    format!("Nama Laporan: {}", title)
}

pub fn date_line(date: &str) -> String {
    format!("Tanggal: {}", date)
}
