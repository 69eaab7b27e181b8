use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("invalid source: {0}")]
    Source(String),
    #[error("cannot measure {0}")]
    Measure(MeasureFailure),
    #[error("font error: {0}")]
    Font(String),
}

/// Context of a failed text measurement: which text, at which width.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureFailure {
    pub text: String,
    pub width: f32,
    pub reason: &'static str,
}

impl fmt::Display for MeasureFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.text.chars().take(32).collect();
        write!(f, "{:?} at width {:.2}pt: {}", preview, self.width, self.reason)
    }
}

impl Error {
    pub(crate) fn measure(text: &str, width: f32, reason: &'static str) -> Self {
        Error::Measure(MeasureFailure {
            text: text.to_string(),
            width,
            reason,
        })
    }
}
