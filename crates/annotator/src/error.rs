use thiserror::Error;

/// Failures while turning a byte buffer into a calibrated sample grid.
///
/// A decode failure aborts the load in progress; whatever was loaded before
/// stays in place.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Missing DICM prefix after the 128 byte preamble")]
    MissingPrefix,

    #[error("Element ({group:04X},{element:04X}) runs past the end of the buffer")]
    Truncated { group: u16, element: u16 },

    #[error("Unsupported transfer syntax: {0}")]
    UnsupportedTransferSyntax(String),

    #[error("Unsupported bits allocated: {0} (only 16-bit samples are supported)")]
    UnsupportedBitDepth(u16),

    #[error("Missing required element: {0}")]
    MissingElement(&'static str),

    #[error("Invalid numeric value for {tag}: {value:?}")]
    InvalidNumber { tag: &'static str, value: String },

    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Sample count {actual} does not match {width}x{height} = {expected}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

#[derive(Error, Debug)]
pub enum AnnotatorError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] DecodeError),

    #[error("Invalid display window: center {center}, width {width} (width must be positive)")]
    InvalidWindow { center: f64, width: f64 },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnnotatorError>;
