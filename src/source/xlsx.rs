//! Worksheet reader for `.xlsx` workbooks (the export of the schedule
//! spreadsheet). Only cell values are read; formatting matters just far enough
//! to tell date serials apart from plain numbers.

use std::collections::{HashMap, HashSet};
use std::io::{Read, Seek};
use std::path::Path;

use chrono::{Days, NaiveDate};

use crate::error::Error;

use super::RawRow;

const SML_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

fn sml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(SML_NS))
}

fn sml_children<'a>(
    node: roxmltree::Node<'a, 'a>,
    name: &'a str,
) -> impl Iterator<Item = roxmltree::Node<'a, 'a>> + 'a {
    node.children()
        .filter(move |n| n.tag_name().name() == name && n.tag_name().namespace() == Some(SML_NS))
}

/// Text of one archive part, `None` when the part is absent.
fn read_zip_text<R: Read + Seek>(zip: &mut zip::ZipArchive<R>, name: &str) -> Result<Option<String>, Error> {
    let mut entry = match zip.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(Some(content))
}

/// Read the rows of one worksheet, dropping the first `skip_rows` sheet rows.
/// With no `sheet_name` the first sheet of the workbook is used.
pub fn read_sheet(path: &Path, sheet_name: Option<&str>, skip_rows: usize) -> Result<Vec<RawRow>, Error> {
    let file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
            std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
        ),
        _ => Error::Io(e),
    })?;
    let mut zip = zip::ZipArchive::new(std::io::BufReader::new(file))
        .map_err(|_| Error::Source(format!("{} is not a ZIP archive", path.display())))?;
    read_workbook(&mut zip, sheet_name, skip_rows)
}

pub fn read_workbook<R: Read + Seek>(
    zip: &mut zip::ZipArchive<R>,
    sheet_name: Option<&str>,
    skip_rows: usize,
) -> Result<Vec<RawRow>, Error> {
    let workbook_xml = read_zip_text(zip, "xl/workbook.xml")?
        .ok_or_else(|| Error::Source("missing xl/workbook.xml (is this an XLSX file?)".into()))?;
    let rels_xml = read_zip_text(zip, "xl/_rels/workbook.xml.rels")?.unwrap_or_default();
    let workbook = parse_workbook(&workbook_xml, &rels_xml, sheet_name)?;

    let shared = match read_zip_text(zip, "xl/sharedStrings.xml")? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };
    let date_styles = match read_zip_text(zip, "xl/styles.xml")? {
        Some(xml) => parse_date_styles(&xml)?,
        None => HashSet::new(),
    };

    let sheet_xml = read_zip_text(zip, &workbook.sheet_part)?
        .ok_or_else(|| Error::Source(format!("missing worksheet part {}", workbook.sheet_part)))?;
    let ctx = CellContext {
        shared: &shared,
        date_styles: &date_styles,
        epoch: workbook.epoch,
    };
    let rows = parse_sheet_rows(&sheet_xml, &ctx, skip_rows)?;
    log::debug!(
        "xlsx: sheet {} → {} row(s), {} shared string(s)",
        workbook.sheet_part,
        rows.len(),
        shared.len()
    );
    Ok(rows)
}

struct WorkbookInfo {
    sheet_part: String,
    epoch: NaiveDate,
}

fn epoch_1900() -> NaiveDate {
    // Serial 1 is 1900-01-01, but the 1900 leap-year bug shifts everything
    // after February 1900 by one day.
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

fn epoch_1904() -> NaiveDate {
    NaiveDate::from_ymd_opt(1904, 1, 1).unwrap_or_default()
}

fn parse_workbook(workbook_xml: &str, rels_xml: &str, sheet_name: Option<&str>) -> Result<WorkbookInfo, Error> {
    let xml = roxmltree::Document::parse(workbook_xml)?;
    let root = xml.root_element();

    let date1904 = sml(root, "workbookPr")
        .and_then(|pr| pr.attribute("date1904"))
        .is_some_and(|v| v == "1" || v == "true");

    let sheets: Vec<(&str, &str)> = sml(root, "sheets")
        .into_iter()
        .flat_map(|s| sml_children(s, "sheet"))
        .filter_map(|n| Some((n.attribute("name")?, n.attribute((REL_NS, "id"))?)))
        .collect();

    let (name, rel_id) = match sheet_name {
        Some(wanted) => sheets
            .iter()
            .find(|(name, _)| *name == wanted)
            .copied()
            .ok_or_else(|| Error::Source(format!("worksheet {wanted:?} not found")))?,
        None => sheets
            .first()
            .copied()
            .ok_or_else(|| Error::Source("workbook has no worksheets".into()))?,
    };

    let rels = parse_rels_xml(rels_xml);
    let target = rels
        .get(rel_id)
        .ok_or_else(|| Error::Source(format!("worksheet {name:?} has no relationship {rel_id}")))?;
    let sheet_part = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    };

    Ok(WorkbookInfo {
        sheet_part,
        epoch: if date1904 { epoch_1904() } else { epoch_1900() },
    })
}

fn parse_rels_xml(xml_content: &str) -> HashMap<String, String> {
    let mut rels = HashMap::new();
    let Ok(xml) = roxmltree::Document::parse(xml_content) else {
        return rels;
    };
    for node in xml.root_element().children() {
        if node.tag_name().name() == "Relationship"
            && let (Some(id), Some(target)) = (node.attribute("Id"), node.attribute("Target"))
        {
            rels.insert(id.to_string(), target.to_string());
        }
    }
    rels
}

/// Concatenated text of every `t` element below `node` (plain and rich-text
/// runs alike), skipping phonetic hints.
fn collect_text(node: roxmltree::Node) -> String {
    node.descendants()
        .filter(|n| n.tag_name().name() == "t" && n.tag_name().namespace() == Some(SML_NS))
        .filter(|n| !n.ancestors().any(|a| a.tag_name().name() == "rPh"))
        .filter_map(|n| n.text())
        .collect()
}

fn parse_shared_strings(xml_content: &str) -> Result<Vec<String>, Error> {
    let xml = roxmltree::Document::parse(xml_content)?;
    Ok(sml_children(xml.root_element(), "si").map(collect_text).collect())
}

fn is_date_format_code(code: &str) -> bool {
    // Strip quoted literals and bracketed sections ([Red], [$-416]) before
    // looking for date tokens.
    let mut plain = String::with_capacity(code.len());
    let mut in_quote = false;
    let mut in_bracket = false;
    for ch in code.chars() {
        match ch {
            '"' => in_quote = !in_quote,
            '[' if !in_quote => in_bracket = true,
            ']' if !in_quote => in_bracket = false,
            _ if in_quote || in_bracket => {}
            _ => plain.push(ch.to_ascii_lowercase()),
        }
    }
    plain.contains('d') || plain.contains('y') || (plain.contains('m') && !plain.contains('h'))
}

/// Indices into `cellXfs` whose number format renders a date.
fn parse_date_styles(xml_content: &str) -> Result<HashSet<usize>, Error> {
    let xml = roxmltree::Document::parse(xml_content)?;
    let root = xml.root_element();

    let custom: HashMap<u32, bool> = sml(root, "numFmts")
        .into_iter()
        .flat_map(|n| sml_children(n, "numFmt"))
        .filter_map(|n| {
            let id = n.attribute("numFmtId")?.parse().ok()?;
            Some((id, is_date_format_code(n.attribute("formatCode")?)))
        })
        .collect();

    let is_date_fmt = |id: u32| match custom.get(&id) {
        Some(&is_date) => is_date,
        None => matches!(id, 14..=17 | 22 | 27..=36 | 45..=47 | 50..=58),
    };

    Ok(sml(root, "cellXfs")
        .into_iter()
        .flat_map(|n| sml_children(n, "xf"))
        .enumerate()
        .filter(|(_, xf)| {
            xf.attribute("numFmtId")
                .and_then(|v| v.parse().ok())
                .is_some_and(is_date_fmt)
        })
        .map(|(i, _)| i)
        .collect())
}

struct CellContext<'a> {
    shared: &'a [String],
    date_styles: &'a HashSet<usize>,
    epoch: NaiveDate,
}

/// Columns in a worksheet, `A` through `XFD`.
const MAX_COLUMNS: usize = 16_384;

/// Zero-based column index of a cell reference such as `"AB12"`. `None` when
/// the reference has no column letters or names a column past `XFD`.
fn column_index(cell_ref: &str) -> Option<usize> {
    let letters = cell_ref.bytes().take_while(|b| b.is_ascii_alphabetic());
    let mut idx = 0usize;
    for b in letters {
        let digit = (b.to_ascii_uppercase() - b'A' + 1) as usize;
        idx = idx.checked_mul(26)?.checked_add(digit)?;
        if idx > MAX_COLUMNS {
            return None;
        }
    }
    idx.checked_sub(1)
}

/// Render an Excel date serial as `dd/mm/yyyy`, the pattern spreadsheet
/// rows are normalized with.
fn serial_to_date_text(serial: f64, epoch: NaiveDate) -> Option<String> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let date = epoch.checked_add_days(Days::new(serial.floor() as u64))?;
    Some(date.format("%d/%m/%Y").to_string())
}

fn cell_value(cell: roxmltree::Node, ctx: &CellContext) -> String {
    let raw = sml(cell, "v").and_then(|v| v.text()).unwrap_or("");
    match cell.attribute("t") {
        Some("s") => raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| ctx.shared.get(i))
            .cloned()
            .unwrap_or_default(),
        Some("inlineStr") => sml(cell, "is").map(collect_text).unwrap_or_default(),
        Some("b") => (if raw.trim() == "1" { "TRUE" } else { "FALSE" }).to_string(),
        Some("e") => String::new(),
        Some("n") | None => {
            let is_date = cell
                .attribute("s")
                .and_then(|s| s.parse::<usize>().ok())
                .is_some_and(|s| ctx.date_styles.contains(&s));
            if is_date {
                if let Some(text) = raw.trim().parse::<f64>().ok().and_then(|v| serial_to_date_text(v, ctx.epoch)) {
                    return text;
                }
            }
            raw.to_string()
        }
        Some(_) => raw.to_string(),
    }
}

fn parse_sheet_rows(xml_content: &str, ctx: &CellContext, skip_rows: usize) -> Result<Vec<RawRow>, Error> {
    let xml = roxmltree::Document::parse(xml_content)?;
    let Some(sheet_data) = sml(xml.root_element(), "sheetData") else {
        return Ok(Vec::new());
    };

    let mut rows = Vec::new();
    for (pos, row) in sml_children(sheet_data, "row").enumerate() {
        let row_number = row
            .attribute("r")
            .and_then(|r| r.parse::<usize>().ok())
            .unwrap_or(pos + 1);
        if row_number <= skip_rows {
            continue;
        }

        let mut cells: RawRow = Vec::new();
        for cell in sml_children(row, "c") {
            let col = match cell.attribute("r") {
                Some(r) if r.starts_with(|c: char| c.is_ascii_alphabetic()) => column_index(r)
                    .ok_or_else(|| Error::Source(format!("cell reference {r:?} is past column XFD")))?,
                _ => cells.len(),
            };
            if cells.len() <= col {
                cells.resize(col + 1, String::new());
            }
            cells[col] = cell_value(cell, ctx);
        }
        rows.push(cells);
    }
    Ok(rows)
}
