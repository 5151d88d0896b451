use crate::{error::Result, types::DecodedSlice};

/// Trait for container decoders that extract a slice's metadata and samples
pub trait SliceDecoder: Send + Sync {
    /// Decode one single-frame grayscale image from its file bytes
    fn decode(&self, bytes: &[u8]) -> Result<DecodedSlice>;
}
