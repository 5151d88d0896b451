pub mod builder;

use image::GrayImage;
use tracing::{info, warn};

use crate::{
    error::Result,
    intensity::{decode_calibrated_intensity, quantize_to_grayscale, IntensityBuffer, Rescale, Window},
    traits::SliceDecoder,
    types::{DecodedSlice, Dimensions},
};

/// A decoded slice with its calibrated intensities and display raster
#[derive(Debug, Clone)]
pub struct LoadedSlice {
    pub dimensions: Dimensions,
    pub rescale: Rescale,
    pub window: Window,
    pub modality: Option<String>,
    pub transfer_syntax: String,
    pub intensity: IntensityBuffer,
    pub grayscale: GrayImage,
}

impl LoadedSlice {
    /// Recompute the grayscale raster for another window.
    ///
    /// On error the slice keeps its previous window and raster.
    pub fn rewindow(&mut self, window: Window) -> Result<()> {
        let grayscale = quantize_to_grayscale(&self.intensity, window)?;
        self.window = window;
        self.grayscale = grayscale;
        Ok(())
    }
}

/// Bytes → decoded slice → calibrated intensities → windowed grayscale
pub struct IntensityPipeline {
    decoder: Box<dyn SliceDecoder>,
    window_override: Option<Window>,
}

impl IntensityPipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::IntensityPipelineBuilder {
        builder::IntensityPipelineBuilder::new()
    }

    pub fn new(decoder: Box<dyn SliceDecoder>, window_override: Option<Window>) -> Self {
        Self {
            decoder,
            window_override,
        }
    }

    /// Decode and process a file held in memory
    pub fn process(&self, bytes: &[u8]) -> Result<LoadedSlice> {
        let decoded = self.decoder.decode(bytes)?;
        self.process_decoded(decoded)
    }

    /// Process a slice some other decoder already extracted
    pub fn process_decoded(&self, decoded: DecodedSlice) -> Result<LoadedSlice> {
        let DecodedSlice {
            dimensions,
            window_center,
            window_width,
            rescale,
            modality,
            transfer_syntax,
            samples,
            ..
        } = decoded;

        // Step 1: calibrate stored samples
        let intensity = decode_calibrated_intensity(&samples, dimensions, rescale)?;

        // Step 2: pick the display window
        let window = match (self.window_override, window_center, window_width) {
            (Some(window), _, _) => window,
            (None, Some(center), Some(width)) => Window { center, width },
            (None, _, _) => {
                let window = Window::from_intensity_range(&intensity);
                warn!(
                    "No window in file, using intensity range: center {}, width {}",
                    window.center, window.width
                );
                window
            }
        };

        // Step 3: quantize for display
        let grayscale = quantize_to_grayscale(&intensity, window)?;

        info!(
            "Loaded {}x{} slice (slope {}, intercept {}, window {}/{})",
            dimensions.width,
            dimensions.height,
            rescale.slope,
            rescale.intercept,
            window.center,
            window.width
        );

        Ok(LoadedSlice {
            dimensions,
            rescale,
            window,
            modality,
            transfer_syntax,
            intensity,
            grayscale,
        })
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        match self.window_override {
            Some(window) => format!(
                "Pipeline: window override {}/{}",
                window.center, window.width
            ),
            None => "Pipeline: window from file".to_string(),
        }
    }
}

impl Default for IntensityPipeline {
    fn default() -> Self {
        Self::builder().build()
    }
}
