pub mod config;
mod dates;
mod error;
mod fonts;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod schema;
pub mod source;

pub use config::{Palette, RenderOptions, ReportConfig};
pub use dates::month_short;
pub use error::{Error, MeasureFailure};
pub use model::{CanonicalRecord, DateRange, Layout, LayoutInstruction, StyleClass};
pub use schema::{ColumnSchema, SchemaVariant};
pub use source::{SheetOptions, SourceFormat};

use std::path::{Path, PathBuf};
use std::time::Instant;

use layout::report_title;
use pdf::PdfSurface;

/// Lay out `records` under `config` and serialize the result as PDF bytes.
pub fn build_schedule_pdf(records: Vec<CanonicalRecord>, config: &ReportConfig) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();

    let surface = PdfSurface::new(config.render.clone())?;
    let title = report_title(&config.title_prefix, &config.range);
    let layout = layout::render(records, &config.range, &config.schema, &title, &surface)?;
    let t_layout = t0.elapsed();

    let bytes = surface.finish(&layout)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: layout={:.1}ms, pdf={:.1}ms ({} rows, {} bytes)",
        t_layout.as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        layout.row_count(),
        bytes.len(),
    );
    Ok(bytes)
}

/// Read `input`, build the schedule, and write it to `output`.
///
/// The document is written next to `output` under a temporary name and
/// renamed into place, so a failed build never leaves a partial file behind.
pub fn convert_schedule_to_pdf(
    input: &Path,
    format: SourceFormat,
    sheet: &SheetOptions,
    config: &ReportConfig,
    output: &Path,
) -> Result<(), Error> {
    let t0 = Instant::now();

    let records = source::load(input, format, sheet)?;
    let t_read = t0.elapsed();

    let bytes = build_schedule_pdf(records, config)?;
    let t_build = t0.elapsed();

    write_atomically(output, &bytes)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: read={:.1}ms, build={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_read.as_secs_f64() * 1000.0,
        (t_build - t_read).as_secs_f64() * 1000.0,
        (t_total - t_build).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(())
}

fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "schedule.pdf".to_string());
    output.with_file_name(format!(".{name}.partial"))
}

pub fn write_atomically(output: &Path, bytes: &[u8]) -> Result<(), Error> {
    let tmp = partial_path(output);
    if let Err(e) = std::fs::write(&tmp, bytes).and_then(|_| std::fs::rename(&tmp, output)) {
        let _ = std::fs::remove_file(&tmp);
        return Err(Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", e, output.display()),
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_sits_next_to_output() {
        assert_eq!(
            partial_path(Path::new("/srv/out/Discursos.pdf")),
            Path::new("/srv/out/.Discursos.pdf.partial")
        );
    }
}
