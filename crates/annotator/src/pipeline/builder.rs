use crate::{
    dicom::Part10Decoder,
    intensity::Window,
    pipeline::IntensityPipeline,
    traits::SliceDecoder,
};

/// Builder for creating intensity pipelines with a fluent API
pub struct IntensityPipelineBuilder {
    decoder: Option<Box<dyn SliceDecoder>>,
    window_override: Option<Window>,
}

impl IntensityPipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            decoder: None,
            window_override: None,
        }
    }

    /// Set the container decoder (replaces any existing one)
    pub fn set_decoder<D>(mut self, decoder: D) -> Self
    where
        D: SliceDecoder + 'static,
    {
        self.decoder = Some(Box::new(decoder));
        self
    }

    /// Display every slice with this window instead of the one in the file
    pub fn with_window(mut self, window: Window) -> Self {
        self.window_override = Some(window);
        self
    }

    /// Build the pipeline, decoding DICOM Part 10 unless told otherwise
    pub fn build(self) -> IntensityPipeline {
        let decoder = self.decoder.unwrap_or_else(|| Box::new(Part10Decoder));
        IntensityPipeline::new(decoder, self.window_override)
    }
}

impl Default for IntensityPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Result,
        intensity::Rescale,
        types::{DecodedSlice, Dimensions},
    };

    /// Treats the input bytes as little-endian samples of a 2x1 slice.
    struct RawPairDecoder;

    impl SliceDecoder for RawPairDecoder {
        fn decode(&self, bytes: &[u8]) -> Result<DecodedSlice> {
            Ok(DecodedSlice {
                dimensions: Dimensions::new(2, 1),
                bits_allocated: 16,
                window_center: Some(0.0),
                window_width: Some(2.0),
                rescale: Rescale::default(),
                modality: None,
                transfer_syntax: "raw".to_string(),
                samples: bytes
                    .chunks_exact(2)
                    .map(|b| u16::from_le_bytes([b[0], b[1]]))
                    .collect(),
            })
        }
    }

    #[test]
    fn test_custom_decoder() {
        let pipeline = IntensityPipeline::builder().set_decoder(RawPairDecoder).build();
        let slice = pipeline.process(&[0, 0, 5, 0]).expect("Should load");
        assert_eq!(slice.transfer_syntax, "raw");
        assert_eq!(slice.grayscale.as_raw(), &vec![128, 255]);
    }

    #[test]
    fn test_info_reports_override() {
        let pipeline = IntensityPipelineBuilder::new()
            .with_window(Window { center: 40.0, width: 400.0 })
            .build();
        assert_eq!(pipeline.info(), "Pipeline: window override 40/400");
        assert_eq!(IntensityPipeline::default().info(), "Pipeline: window from file");
    }
}
