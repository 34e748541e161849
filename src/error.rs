use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillChartError {
    #[error("Header marker column '{0}' not found in the input grid")]
    MissingHeader(String),

    #[error("Invalid chart settings for '{field}': {details}")]
    InvalidSettings { field: String, details: String },

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BillChartError>;
