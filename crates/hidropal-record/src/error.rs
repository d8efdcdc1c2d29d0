//! Errors for record identity and table encoding

/// Errors that can occur when working with records
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// Id literal has the wrong length
    #[error("invalid id length: expected {expected}, got {actual}")]
    InvalidIdLength { expected: usize, actual: usize },

    /// Id literal is not hex
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Table could not be read or written
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Encoded table buffer could not be recovered
    #[error("csv buffer error: {0}")]
    CsvBuffer(String),
}
