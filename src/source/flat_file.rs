use std::io::Read;
use std::path::Path;

use crate::error::Error;

use super::RawRow;

/// Read comma-separated rows, skipping the header line. Rows may differ in
/// length; normalization fills the gaps.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<RawRow>, Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

pub fn read_file(path: &Path) -> Result<Vec<RawRow>, Error> {
    let file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
            std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
        ),
        _ => Error::Io(e),
    })?;
    read_rows(std::io::BufReader::new(file))
}
