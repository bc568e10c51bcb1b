//! Error types for terrain cover analysis

use thiserror::Error;

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Failures surfaced by the analysis engine and its intake/encode helpers.
///
/// The classification math itself is total; everything here comes from the
/// boundary (pixel intake, decoding, configuration, output encoding).
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// No pixel data could be obtained for analysis
    #[error("No pixel buffer available: image has zero size or no data")]
    EmptyBuffer,

    /// Raw buffer length does not match the declared dimensions
    #[error("Pixel buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Caller-owned mask buffers do not match the analysed image
    #[error("Mask dimensions {mask_width}x{mask_height} do not match image {width}x{height}")]
    MaskDimensionMismatch {
        width: u32,
        height: u32,
        mask_width: u32,
        mask_height: u32,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    /// Encoded image could not be decoded into pixels
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// Output image could not be encoded
    #[error("Failed to encode {what}: {message}")]
    Encode { what: String, message: String },

    /// Filesystem access failed (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed or serialized
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Create an invalid parameter error
    pub fn invalid(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// True when the failure means there were no pixels to analyse at all
    pub fn is_missing_pixels(&self) -> bool {
        matches!(
            self,
            AnalysisError::EmptyBuffer | AnalysisError::BufferSizeMismatch { .. } | AnalysisError::Decode(_)
        )
    }

    /// Message for display to callers (JavaScript, CLI)
    pub fn user_message(&self) -> String {
        if self.is_missing_pixels() {
            format!("No pixel data could be read from the image; analysis cannot run. ({self})")
        } else {
            self.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_message_names_field() {
        let err = AnalysisError::invalid("grid_size", 0);
        assert_eq!(err.to_string(), "Invalid parameter: grid_size = 0");
        assert!(!err.is_missing_pixels());
    }

    #[test]
    fn empty_buffer_is_missing_pixels() {
        assert!(AnalysisError::EmptyBuffer.is_missing_pixels());
        let mismatch = AnalysisError::BufferSizeMismatch { expected: 12, actual: 3 };
        assert!(mismatch.is_missing_pixels());
        assert!(mismatch.to_string().contains("expected 12"));
    }

    #[test]
    fn user_message_flags_missing_pixels() {
        let msg = AnalysisError::EmptyBuffer.user_message();
        assert!(msg.starts_with("No pixel data could be read"), "{msg}");

        let bad = AnalysisError::invalid("grid_size", 0);
        assert_eq!(bad.user_message(), bad.to_string());
    }
}
