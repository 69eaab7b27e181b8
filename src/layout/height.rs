use crate::error::Error;
use crate::model::CanonicalRecord;
use crate::schema::ColumnSchema;

/// Extra room added on top of the tallest cell so wrapped text never touches
/// the row borders.
pub const ROW_PADDING_FACTOR: f32 = 1.1;

/// Height of `text` once wrapped into a cell `width` points wide.
///
/// Implementations must return a positive height for every string they accept,
/// including the empty string, and an error for anything they cannot lay out.
pub trait TextMeasure {
    fn measure_wrapped_height(&self, text: &str, width: f32) -> Result<f32, Error>;
}

impl<T: TextMeasure + ?Sized> TextMeasure for &T {
    fn measure_wrapped_height(&self, text: &str, width: f32) -> Result<f32, Error> {
        (**self).measure_wrapped_height(text, width)
    }
}

/// One height for every cell of the row: the tallest measured cell, padded.
pub fn resolve_row_height<M: TextMeasure + ?Sized>(
    record: &CanonicalRecord,
    schema: &ColumnSchema,
    measure: &M,
) -> Result<f32, Error> {
    let mut tallest = 0.0f32;
    for (text, width) in schema.measured_cells(record) {
        let h = measure.measure_wrapped_height(&text, width)?;
        if !h.is_finite() || h <= 0.0 {
            return Err(Error::measure(&text, width, "surface returned a non-positive height"));
        }
        tallest = tallest.max(h);
    }
    Ok(tallest * ROW_PADDING_FACTOR)
}
