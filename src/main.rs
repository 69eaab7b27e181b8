use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, SystemTime};

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};

use schedule_pdf::config::{DEFAULT_MONTHS_AHEAD, DEFAULT_TITLE_PREFIX};
use schedule_pdf::{
    ColumnSchema, DateRange, Error, RenderOptions, ReportConfig, SchemaVariant, SheetOptions,
    SourceFormat,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InputFormat {
    /// Scheduling-software CSV export (dates as YYYY-MM-DD)
    Csv,
    /// Spreadsheet workbook (dates as DD/MM/YYYY or date cells)
    Xlsx,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TableLayout {
    /// Date, talk with speaker, chairman, reader, hospitality
    Hospitality,
    /// Date, talk, speaker, congregation, chairman, reader
    Speakers,
}

#[derive(Parser)]
#[command(name = "schedule-pdf", version, about = "Render a public-talk schedule as a PDF table")]
struct Cli {
    /// Input schedule (.csv or .xlsx)
    input: PathBuf,

    /// Output PDF path, or "-" for stdout
    #[arg(short, long, default_value = "Discursos.pdf")]
    output: PathBuf,

    /// Input format; inferred from the file extension when omitted
    #[arg(long, value_enum)]
    format: Option<InputFormat>,

    /// Worksheet to read from a workbook; empty for the first sheet
    #[arg(long, default_value = "Dados - Discursos")]
    sheet: String,

    /// Leading worksheet rows to skip
    #[arg(long, default_value_t = 13)]
    skip_rows: usize,

    /// Months to include after the current one (values below 1 use the default)
    #[arg(short, long, default_value_t = DEFAULT_MONTHS_AHEAD as i64, allow_negative_numbers = true)]
    months: i64,

    /// First day to include (YYYY-MM-DD); defaults to the start of this month
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Table layout
    #[arg(long, value_enum, default_value_t = TableLayout::Hospitality)]
    layout: TableLayout,

    /// Title text; the year of the first day is appended
    #[arg(long, default_value = DEFAULT_TITLE_PREFIX)]
    title: String,

    /// TrueType font for row text
    #[arg(long)]
    font: Option<PathBuf>,

    /// TrueType font for the title and headers
    #[arg(long)]
    bold_font: Option<PathBuf>,

    /// Keep an existing output younger than this many minutes
    #[arg(long)]
    max_age: Option<u64>,
}

fn is_fresh(path: &Path, max_age: Duration) -> bool {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age <= max_age)
}

/// Months after the current one to include; out-of-range values use the default.
fn months_ahead(requested: i64) -> u32 {
    u32::try_from(requested)
        .ok()
        .filter(|&m| m > 0)
        .unwrap_or(DEFAULT_MONTHS_AHEAD)
}

fn run(cli: Cli) -> Result<(), Error> {
    let to_stdout = cli.output.as_os_str() == "-";
    if let Some(minutes) = cli.max_age
        && !to_stdout
        && is_fresh(&cli.output, Duration::from_secs(minutes.saturating_mul(60)))
    {
        log::info!("{} is newer than {minutes} min, not rebuilding", cli.output.display());
        return Ok(());
    }

    let months = months_ahead(cli.months);
    let today = chrono::Local::now().date_naive();
    let default_range = DateRange::months_ahead(today, months);
    let range = DateRange::new(
        cli.start.unwrap_or(default_range.start),
        cli.end.unwrap_or(default_range.end),
    );

    let format = match cli.format {
        Some(InputFormat::Csv) => SourceFormat::FlatFile,
        Some(InputFormat::Xlsx) => SourceFormat::Spreadsheet,
        None => SourceFormat::from_path(&cli.input),
    };
    let sheet = SheetOptions {
        name: Some(cli.sheet).filter(|s| !s.is_empty()),
        skip_rows: cli.skip_rows,
    };
    let variant = match cli.layout {
        TableLayout::Hospitality => SchemaVariant::Hospitality,
        TableLayout::Speakers => SchemaVariant::Speakers,
    };
    let config = ReportConfig {
        range,
        schema: ColumnSchema::for_variant(variant),
        title_prefix: cli.title,
        render: RenderOptions {
            font: cli.font,
            bold_font: cli.bold_font,
            ..RenderOptions::default()
        },
    };
    log::info!(
        "schedule {}..={} from {} ({format:?}, {variant:?})",
        range.start,
        range.end,
        cli.input.display()
    );

    if to_stdout {
        let records = schedule_pdf::source::load(&cli.input, format, &sheet)?;
        let bytes = schedule_pdf::build_schedule_pdf(records, &config)?;
        let mut out = std::io::stdout().lock();
        out.write_all(&bytes)?;
        out.flush()?;
        Ok(())
    } else {
        schedule_pdf::convert_schedule_to_pdf(&cli.input, format, &sheet, &config, &cli.output)
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
