use crate::error::{RabError, RabResult};
use crate::excel::{approx_eq, FormulaAuditor};
use crate::export::{ExportCoordinator, ExportFormat};
use crate::format::{format_percentage, CurrencyFormat};
use crate::history::{JsonFileRepository, ReportRepository};
use crate::parser;
use crate::types::Report;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Formats to export when none are given on the command line
fn resolve_formats(formats: Vec<ExportFormat>) -> Vec<ExportFormat> {
    if formats.is_empty() {
        ExportFormat::ALL.to_vec()
    } else {
        let mut unique = Vec::with_capacity(formats.len());
        for format in formats {
            if !unique.contains(&format) {
                unique.push(format);
            }
        }
        unique
    }
}

/// Pad or cut `text` to exactly `width` characters
fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count > width {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    } else {
        format!("{}{}", text, " ".repeat(width - count))
    }
}

/// Execute the export command
pub async fn export(
    input: PathBuf,
    formats: Vec<ExportFormat>,
    out_dir: PathBuf,
    verbose: bool,
) -> RabResult<()> {
    println!("{}", "📄 RAB - Export".bold().green());
    println!("   Input:  {}", input.display());
    println!("   Output: {}\n", out_dir.display());

    if verbose {
        println!("{}", "📖 Reading report...".cyan());
    }

    let report = parser::load_report(&input)?;
    export_report(&report, formats, &out_dir, verbose).await
}

async fn export_report(
    report: &Report,
    formats: Vec<ExportFormat>,
    out_dir: &Path,
    verbose: bool,
) -> RabResult<()> {
    let formats = resolve_formats(formats);

    if verbose {
        println!(
            "   Found {} items, grand total {}\n",
            report.item_count(),
            CurrencyFormat::default().format(report.grand_total())
        );
        println!("{}", "📊 Generating files...".cyan());
    }

    let coordinator = ExportCoordinator::default();
    let artifacts = coordinator.export_all(report, &formats).await?;

    for artifact in &artifacts {
        let path = artifact.save_to(out_dir).await?;
        println!(
            "   {} {} ({} bytes)",
            "✅".green(),
            path.display(),
            artifact.bytes.len()
        );
    }

    println!("\n{}", "✅ Export Complete!".bold().green());
    Ok(())
}

/// Execute the preview command
pub fn preview(input: PathBuf) -> RabResult<()> {
    let report = parser::load_report(&input)?;
    print_report(&report);
    Ok(())
}

/// Print the report as a table with totals and the category breakdown
fn print_report(report: &Report) {
    let currency = CurrencyFormat::default();

    println!("{}", crate::labels::REPORT_HEADING.bold());
    println!("{}", crate::labels::title_line(&report.metadata.title));
    println!("{}\n", crate::labels::date_line(&report.metadata.date));

    let widths = [4, 14, 24, 8, 8, 16, 16];
    let header: Vec<String> = crate::labels::COLUMN_HEADERS
        .iter()
        .zip(widths)
        .map(|(h, w)| fit(h, w))
        .collect();
    println!("{}", header.join(" ").bold());
    println!("{}", "─".repeat(widths.iter().sum::<usize>() + widths.len() - 1));

    for (idx, item) in report.items.iter().enumerate() {
        let cells = [
            item.label_at(idx),
            item.category.clone(),
            item.description.clone(),
            currency.format_quantity(item.quantity_or_zero()),
            item.unit.clone(),
            currency.format(item.unit_price_or_zero()),
            currency.format(item.line_total()),
        ];
        let line: Vec<String> = cells.iter().zip(widths).map(|(c, w)| fit(c, w)).collect();
        println!("{}", line.join(" "));
    }

    if report.is_empty() {
        println!("{}", "   (no items)".dimmed());
    }

    println!(
        "\n{}: {}",
        crate::labels::DOCUMENT_TOTAL_LABEL.bold(),
        currency.format(report.grand_total()).bold().bright_green()
    );

    let categories = report.category_totals();
    if !categories.is_empty() {
        println!("\n{}", "Persentase per Kategori".bold());
        let grand_total = report.grand_total();
        for category in categories {
            println!(
                "   {} {:>8}  {}",
                fit(&category.category, 20),
                format_percentage(category.total, grand_total),
                currency.format(category.total)
            );
        }
    }
}

/// Execute the verify command
pub fn verify(workbook: PathBuf, report: Option<PathBuf>) -> RabResult<()> {
    println!("{}", "🔍 RAB - Formula Verification".bold().green());
    println!("   Workbook: {}\n", workbook.display());

    let mut auditor = FormulaAuditor::open(&workbook)?;
    let audit = auditor.audit()?;
    let currency = CurrencyFormat::default();

    for row in &audit.line_totals {
        println!(
            "   Row {:>4}  ={:<16} {}",
            row.row,
            row.formula,
            currency.format(row.value)
        );
    }
    println!(
        "   {}  ={:<16} {}\n",
        "Total".bold(),
        audit.grand_total_formula,
        currency.format(audit.grand_total).bold()
    );

    if !approx_eq(audit.grand_total, audit.line_total_sum()) {
        println!("{}", "❌ Grand total does not match the row totals".bold().red());
        return Err(RabError::Verification(format!(
            "grand total {} differs from sum of rows {}",
            audit.grand_total,
            audit.line_total_sum()
        )));
    }

    if let Some(report_path) = report {
        let report = parser::load_report(&report_path)?;
        let problems = audit.compare(&report);
        if !problems.is_empty() {
            println!("{}", "❌ Workbook does not match the report:".bold().red());
            for problem in &problems {
                println!("   • {}", problem.red());
            }
            return Err(RabError::Verification(problems.join("; ")));
        }
        println!("   Matches report: {}", report_path.display());
    }

    println!("{}", "✅ Formulas verified".bold().green());
    Ok(())
}

/// Execute `history save`
pub fn history_save(history: PathBuf, input: PathBuf) -> RabResult<()> {
    let report = parser::load_report(&input)?;
    let mut repo = JsonFileRepository::new(&history);
    let id = repo.save(&report)?;

    println!("{}", "💾 Report saved to history".bold().green());
    println!("   Id: {}", id.bright_blue());
    Ok(())
}

/// Execute `history list`
pub fn history_list(history: PathBuf) -> RabResult<()> {
    let repo = JsonFileRepository::new(&history);
    let entries = repo.list()?;

    if entries.is_empty() {
        println!("{}", "Belum ada riwayat.".yellow());
        return Ok(());
    }

    println!("{}", format!("📚 History ({} reports)", entries.len()).bold().green());
    for entry in entries {
        println!(
            "   {}  {}  {} • {} baris  ({})",
            entry.id.bright_blue(),
            entry.metadata.title.bold(),
            entry.metadata.date,
            entry.item_count,
            entry.saved_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

/// Execute `history show`
pub fn history_show(history: PathBuf, id: String) -> RabResult<()> {
    let repo = JsonFileRepository::new(&history);
    let report = repo.load(&id)?;
    print_report(&report);
    Ok(())
}

/// Execute `history export`
pub async fn history_export(
    history: PathBuf,
    id: String,
    formats: Vec<ExportFormat>,
    out_dir: PathBuf,
    verbose: bool,
) -> RabResult<()> {
    println!("{}", "📄 RAB - Export from history".bold().green());
    println!("   Id:     {}", id);
    println!("   Output: {}\n", out_dir.display());

    let repo = JsonFileRepository::new(&history);
    let report = repo.load(&id)?;
    export_report(&report, formats, &out_dir, verbose).await
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
