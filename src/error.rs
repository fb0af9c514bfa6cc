//! Error types for the DCGAN latent explorer library

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Latent sweeps divide by `batch - 1` and need at least two rows
    #[error("Invalid batch size {got}: need at least {min}")]
    InvalidBatchSize { got: usize, min: usize },

    /// Latent dimension index outside of `0..n_hidden`
    ///
    /// For pans, `index` is the first of the two dimensions and `index + 1`
    /// must also fit.
    #[error("Latent index {index} out of range for n_hidden = {n_hidden}")]
    LatentIndexOutOfRange { index: usize, n_hidden: usize },

    /// Two sizes that must agree do not
    #[error("Dimension mismatch in {context}: expected {expected}, got {got}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No usable samples were found
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// libtorch error
    #[error("Torch error: {0}")]
    Torch(#[from] tch::TchError),

    /// Array shape error
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML write error
    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Shorthand for a dimension mismatch
    pub fn mismatch(context: &'static str, expected: usize, got: usize) -> Self {
        Error::DimensionMismatch {
            context,
            expected,
            got,
        }
    }
}
