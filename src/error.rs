//! Error types for annotation operations.

use thiserror::Error;

/// Errors that can occur while loading, editing or saving a label mask.
#[derive(Error, Debug)]
pub enum AnnotateError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON parsing error in the configuration file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Operation needs a source image but none is loaded
    #[error("No image loaded")]
    NoImageLoaded,

    /// Class id not present in the label map
    #[error("Unknown label id: {id}")]
    UnknownLabel {
        /// The offending class id
        id: u8,
    },

    /// Configuration failed validation
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem
        message: String,
    },
}

impl AnnotateError {
    /// Create an invalid configuration error with a message.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnnotateError>;
