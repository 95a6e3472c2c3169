use thiserror::Error;

/// Errors raised by the training helpers.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller passed inputs that cannot be evaluated (empty or misaligned
    /// label sequences, a class list of the wrong size, a missing series...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A ratio was requested over a row or column with no samples.
    #[error("division by zero: {0}")]
    DivideByZero(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
