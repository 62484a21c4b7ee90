//! Error types for collage operations

use thiserror::Error;

/// Result type alias for collage operations
pub type Result<T> = std::result::Result<T, CollageError>;

/// Error types for collage building, import and export
#[derive(Error, Debug)]
pub enum CollageError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding, encoding or processing errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// HTTP transport failures and unexpected status codes
    #[error("Network error: {0}")]
    Network(String),

    /// Image search provider failures (missing token, malformed response)
    #[error("Search error: {0}")]
    Search(String),

    /// Backend inference errors
    #[error("Inference error: {0}")]
    Inference(String),

    /// Model loading or download errors
    #[error("Model error: {0}")]
    Model(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid user input (empty name, unknown sticker, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Layer index outside the current item list
    #[error("Layer index {index} out of range (collage has {len} items)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Rendering was requested before any item was added
    #[error("Collage is empty: add at least one photo, search result or sticker first")]
    EmptyCollage,

    /// Generic processing failure
    #[error("Processing error: {0}")]
    Processing(String),
}

impl CollageError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new search error
    pub fn search<S: Into<String>>(msg: S) -> Self {
        Self::Search(msg.into())
    }

    /// Create a new model error
    pub fn model<S: Into<String>>(msg: S) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new inference error
    pub fn inference<S: Into<String>>(msg: S) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create a network error with the failing operation as context
    pub fn network_error<S: Into<String>, E: std::fmt::Display>(context: S, error: E) -> Self {
        Self::Network(format!("{}: {}", context.into(), error))
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
    ) -> Self {
        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {})",
            parameter, value, valid_range
        ))
    }

    /// Whether retrying the same request might succeed
    ///
    /// Network and search failures are transient from the user's point of view.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Search(_))
    }
}
