//! Error kinds shared by every imaging stage.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    /// Remote byte source unreachable, non-2xx, or over the size cap.
    #[error("Fetch failed: {0}")]
    Fetch(String),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),
    #[error("Unknown format: {0}")]
    UnknownFormat(String),
    #[error("Unknown fit: {0}")]
    UnknownFit(String),
    #[error("Invalid dimensions: {0}")]
    InvalidDimension(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

impl ImagingError {
    /// Short, stable name of the error kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::Decode(_) => "decode",
            Self::UnknownFilter(_) => "unknown_filter",
            Self::UnknownFormat(_) => "unknown_format",
            Self::UnknownFit(_) => "unknown_fit",
            Self::InvalidDimension(_) => "invalid_dimension",
            Self::Encode(_) => "encode",
        }
    }
}

pub type Result<T> = std::result::Result<T, ImagingError>;
