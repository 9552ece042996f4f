use clap::{Parser, Subcommand};
use rab_report::cli;
use rab_report::export::ExportFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rab")]
#[command(about = "Cost estimate (RAB) reports to Excel and Word")]
#[command(long_about = "RAB - Rencana Anggaran Biaya report exporter

Turns a cost estimate (title, date, line items) into an Excel workbook with
live formulas and a Word document with the same figures.

COMMANDS:
  export   - Report (YAML/JSON) to .xlsx and/or .docx
  preview  - Print the report table, totals and category shares
  verify   - Recompute the formulas in an exported workbook
  history  - Save, list, show and re-export saved reports

EXAMPLES:
  rab export renovasi.yaml                  # Both formats into .
  rab export renovasi.yaml -f xlsx -o out   # Excel only, into ./out
  rab verify out/Renovasi.xlsx --report renovasi.yaml
  rab history save renovasi.yaml")]
#[command(version)]
struct Cli {
    /// Show verbose output and debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Export a report to Excel and/or Word.

The workbook holds a 'RAB' sheet where every Total cell is a formula
(=Jumlah*Harga Satuan) and the Grand Total is a SUM over those cells,
plus a 'Penjelasan Rumus' sheet describing the formulas.
The document holds the same table with the values already computed.

Files are named after the report title (RAB when the title is empty).

EXAMPLES:
  rab export renovasi.yaml
  rab export renovasi.yaml --format docx --out-dir laporan")]
    /// Export a report to .xlsx and/or .docx
    Export {
        /// Path to report file (.yaml, .yml or .json)
        input: PathBuf,

        /// Formats to produce (default: all)
        #[arg(short = 'f', long = "format", value_enum)]
        formats: Vec<ExportFormat>,

        /// Directory to write the files into
        #[arg(short, long, default_value = ".", env = "RAB_OUT_DIR")]
        out_dir: PathBuf,
    },

    /// Print the report with totals and category percentages
    Preview {
        /// Path to report file (.yaml, .yml or .json)
        input: PathBuf,
    },

    #[command(long_about = "Recompute the formulas of an exported workbook.

Evaluates each row's Total formula and the Grand Total, then checks the
Grand Total equals the sum of the rows. With --report, also checks every
row and the Grand Total against the report's own arithmetic.")]
    /// Check an exported workbook's formulas
    Verify {
        /// Path to the exported workbook (.xlsx)
        workbook: PathBuf,

        /// Report the workbook should match
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Saved report history
    History {
        /// History file
        #[arg(long, default_value = "rab_history.json", env = "RAB_HISTORY")]
        history: PathBuf,

        #[command(subcommand)]
        command: HistoryCommands,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// Save a report to history
    Save {
        /// Path to report file (.yaml, .yml or .json)
        input: PathBuf,
    },

    /// List saved reports, newest first
    List,

    /// Print a saved report
    Show {
        /// Id of the saved report
        id: String,
    },

    /// Export a saved report
    Export {
        /// Id of the saved report
        id: String,

        /// Formats to produce (default: all)
        #[arg(short = 'f', long = "format", value_enum)]
        formats: Vec<ExportFormat>,

        /// Directory to write the files into
        #[arg(short, long, default_value = ".", env = "RAB_OUT_DIR")]
        out_dir: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "rab_report=debug"
    } else {
        "rab_report=warn"
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Export {
            input,
            formats,
            out_dir,
        } => cli::export(input, formats, out_dir, cli.verbose).await?,

        Commands::Preview { input } => cli::preview(input)?,

        Commands::Verify { workbook, report } => cli::verify(workbook, report)?,

        Commands::History { history, command } => match command {
            HistoryCommands::Save { input } => cli::history_save(history, input)?,
            HistoryCommands::List => cli::history_list(history)?,
            HistoryCommands::Show { id } => cli::history_show(history, id)?,
            HistoryCommands::Export {
                id,
                formats,
                out_dir,
            } => cli::history_export(history, id, formats, out_dir, cli.verbose).await?,
        },
    }

    Ok(())
}
