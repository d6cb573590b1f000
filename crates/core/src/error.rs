use thiserror::Error;

pub type RetailResult<T> = Result<T, RetailError>;

#[derive(Error, Debug)]
pub enum RetailError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input validation error: {0}")]
    Validation(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Unsupported dataset format: {0}")]
    UnsupportedFormat(String),

    #[error("Excel workbook error: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for RetailError {
    fn from(err: config::ConfigError) -> Self {
        RetailError::Config(err.to_string())
    }
}
