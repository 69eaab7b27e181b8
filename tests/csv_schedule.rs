mod common;

use common::{ExportRow, date, init_logging, media_boxes, page_count, write_export};
use schedule_pdf::{
    ColumnSchema, DateRange, ReportConfig, SheetOptions, SourceFormat, build_schedule_pdf,
    convert_schedule_to_pdf,
};

fn march_report() -> ReportConfig {
    let mut config = ReportConfig::for_date(date(2024, 3, 5));
    config.range = DateRange::new(date(2024, 3, 1), date(2024, 4, 30));
    config
}

fn row<'a>(day: &'a str, talk: &'a str) -> ExportRow<'a> {
    ExportRow {
        date: day,
        congregation: "Central",
        speaker: "João Silva",
        talk,
        chairman: "Pedro Alves",
        reader: "Marcos Lima",
        hospitality: "Família Souza",
    }
}

#[test]
fn export_rows_become_records_in_source_order() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = write_export(
        dir.path(),
        "export.csv",
        &[
            row("2024-03-10", "12 Confie em Deus"),
            row("10/03/2024", "wrong date format"),
            row("2024-03-03", "Assembleia"),
        ],
    );

    let records = schedule_pdf::source::load(&path, SourceFormat::FlatFile, &SheetOptions::default()).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].event_date, date(2024, 3, 10));
    assert_eq!(records[0].title, "12 Confie em Deus");
    assert_eq!(records[0].primary_person, "João Silva");
    assert_eq!(records[0].location, "Central");
    assert_eq!(records[0].presider, "Pedro Alves");
    assert_eq!(records[0].reader, "Marcos Lima");
    assert_eq!(records[0].hospitality_note, "Família Souza");
    assert_eq!(records[1].title, "Assembleia");
}

#[test]
fn quoted_fields_keep_their_commas() {
    let dir = tempfile::tempdir().unwrap();
    let mut r = row("2024-03-10", "54 Tenha fé, não medo");
    r.hospitality = "Souza, Lima";
    let path = write_export(dir.path(), "export.csv", &[r]);

    let records = schedule_pdf::source::load(&path, SourceFormat::FlatFile, &SheetOptions::default()).unwrap();
    assert_eq!(records[0].title, "54 Tenha fé, não medo");
    assert_eq!(records[0].hospitality_note, "Souza, Lima");
}

#[test]
fn converts_an_export_to_an_a4_document() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let input = write_export(
        dir.path(),
        "export.csv",
        &[
            row("2024-04-14", "7 Imite a misericórdia de Jeová"),
            row("2024-03-10", "12 Confie em Deus"),
            row("2024-03-17", "Visita do superintendente"),
            row("2024-05-05", "out of range"),
        ],
    );
    let output = dir.path().join("Discursos.pdf");

    convert_schedule_to_pdf(
        &input,
        SourceFormat::from_path(&input),
        &SheetOptions::default(),
        &march_report(),
        &output,
    )
    .unwrap();

    let bytes = std::fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    assert_eq!(page_count(&bytes), 1);
    let boxes = media_boxes(&bytes);
    assert_eq!(boxes.len(), 1);
    assert!((boxes[0].0 - 595.28).abs() < 0.5, "width {}", boxes[0].0);
    assert!((boxes[0].1 - 841.89).abs() < 0.5, "height {}", boxes[0].1);

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".partial"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn empty_range_still_produces_a_titled_page() {
    let config = march_report();
    let bytes = build_schedule_pdf(Vec::new(), &config).unwrap();
    assert_eq!(page_count(&bytes), 1);
}

#[test]
fn speakers_layout_renders() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_export(dir.path(), "export.csv", &[row("2024-03-10", "12 Confie em Deus")]);
    let records = schedule_pdf::source::load(&input, SourceFormat::FlatFile, &SheetOptions::default()).unwrap();

    let mut config = march_report();
    config.schema = ColumnSchema::speakers();
    let bytes = build_schedule_pdf(records, &config).unwrap();
    assert_eq!(page_count(&bytes), 1);
}

#[test]
fn missing_input_is_reported_with_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("absent.csv");
    let output = dir.path().join("Discursos.pdf");

    let err = convert_schedule_to_pdf(
        &input,
        SourceFormat::FlatFile,
        &SheetOptions::default(),
        &march_report(),
        &output,
    )
    .unwrap_err();
    assert!(err.to_string().contains("absent.csv"), "{err}");
    assert!(!output.exists());
}

#[test]
fn failed_build_keeps_the_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_export(dir.path(), "export.csv", &[row("2024-03-10", "12 Confie em Deus")]);
    let output = dir.path().join("Discursos.pdf");
    std::fs::write(&output, b"previous").unwrap();

    let mut config = march_report();
    config.render.font = Some(dir.path().join("no-such-font.ttf"));
    let result = convert_schedule_to_pdf(
        &input,
        SourceFormat::FlatFile,
        &SheetOptions::default(),
        &config,
        &output,
    );

    assert!(result.is_err());
    assert_eq!(std::fs::read(&output).unwrap(), b"previous");
}
