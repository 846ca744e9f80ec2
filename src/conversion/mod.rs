// Grayscale conversion pipeline: validate -> decode -> transform -> encode.

pub mod codec;
pub mod filename;
pub mod grayscale;
mod service;

pub use codec::ImageDocument;
pub use service::{ConversionResult, ConversionService};

use crate::config::AllowedExtensions;
use image::ImageFormat;

/// Everything that can stop a single conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("No file")]
    NoFile,

    #[error("This file extension is not supported: {file_name}. Use extension: {allowed}")]
    UnsupportedExtension {
        file_name: String,
        allowed: AllowedExtensions,
    },

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Failed to encode image as {format:?}: {reason}")]
    EncodeFailed { format: ImageFormat, reason: String },

    #[error("Request body is empty or Content-Length is missing")]
    EmptyOrMissingLength,
}
