//! Custom error types for the application
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A read or a computed struct address fell outside the memory image.
    #[error("Invalid address: 0x{0:x}")]
    InvalidAddress(u64),

    #[error("Profile error: {0}")]
    ProfileError(String),

    #[error("Unknown structure: {0}")]
    UnknownStruct(String),

    #[error("Unknown field: {0}.{1}")]
    UnknownField(String, String),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("JSON error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl AnalysisError {
    /// Errors caused by the contents of one record rather than by the profile
    /// or the image as a whole. These are skipped, everything else is fatal.
    pub fn is_per_record(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidAddress(_) | AnalysisError::InvalidStructure(_)
        )
    }
}
