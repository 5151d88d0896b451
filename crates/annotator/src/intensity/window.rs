use image::GrayImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AnnotatorError, DecodeError, Result},
    intensity::IntensityBuffer,
};

/// Display window: the intensity range `[center - width/2, center + width/2]`
/// spread over the 0..=255 grayscale range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Window {
    pub center: f64,
    pub width: f64,
}

impl Window {
    /// Create a window, rejecting non-positive or non-finite widths
    pub fn new(center: f64, width: f64) -> Result<Self> {
        let window = Self { center, width };
        window.validate()?;
        Ok(window)
    }

    /// A window spanning the full calibrated range of `buffer`.
    pub fn from_intensity_range(buffer: &IntensityBuffer) -> Self {
        let (lo, hi) = buffer.range();
        let (lo, hi) = (f64::from(lo), f64::from(hi));
        Self {
            center: (lo + hi) / 2.0,
            width: (hi - lo).max(1.0),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.center.is_finite() && self.width.is_finite() && self.width > 0.0 {
            Ok(())
        } else {
            Err(AnnotatorError::InvalidWindow {
                center: self.center,
                width: self.width,
            })
        }
    }

    pub fn lower(&self) -> f64 {
        self.center - 0.5 * self.width
    }

    pub fn upper(&self) -> f64 {
        self.center + 0.5 * self.width
    }

    /// Gray level of one calibrated value. Assumes a validated window.
    pub fn map(&self, value: i32) -> u8 {
        let lo = self.lower();
        let clamped = f64::from(value).clamp(lo, self.upper());
        ((clamped - lo) * 255.0 / self.width).round().clamp(0.0, 255.0) as u8
    }
}

/// Clip every intensity to the window and rescale it to 8 bits.
pub fn quantize_to_grayscale(buffer: &IntensityBuffer, window: Window) -> Result<GrayImage> {
    window.validate()?;
    let dims = buffer.dimensions();
    let pixels: Vec<u8> = buffer.values().iter().map(|&v| window.map(v)).collect();

    let actual = pixels.len();
    GrayImage::from_raw(dims.width, dims.height, pixels).ok_or_else(|| {
        DecodeError::DimensionMismatch {
            width: dims.width,
            height: dims.height,
            expected: dims.pixel_count(),
            actual,
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        intensity::{decode_calibrated_intensity, Rescale},
        types::Dimensions,
    };

    fn buffer(values: &[u16], intercept: f64) -> IntensityBuffer {
        let dims = Dimensions::new(values.len() as u32, 1);
        decode_calibrated_intensity(values, dims, Rescale::new(1.0, intercept))
            .expect("Should decode")
    }

    #[test]
    fn test_uniform_midpoint_maps_to_128() {
        let dims = Dimensions::new(4, 4);
        let intensity = decode_calibrated_intensity(&[128; 16], dims, Rescale::default())
            .expect("Should decode");
        let window = Window::new(128.0, 256.0).unwrap();
        let gray = quantize_to_grayscale(&intensity, window).expect("Should quantize");
        assert_eq!(gray.dimensions(), (4, 4));
        assert!(gray.pixels().all(|p| p.0[0] == 128));
    }

    #[test]
    fn test_clamps_outside_window() {
        // CT soft tissue window: [-160, 240]
        let window = Window::new(40.0, 400.0).unwrap();
        let intensity = buffer(&[0, 500, 864, 1264, 1500, 3000], -1024.0);
        let gray = quantize_to_grayscale(&intensity, window).expect("Should quantize");
        let values: Vec<u8> = gray.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values[0], 0);
        assert_eq!(values[1], 0);
        assert_eq!(values[2], 0);
        assert_eq!(values[3], 255);
        assert_eq!(values[4], 255);
        assert_eq!(values[5], 255);
    }

    #[test]
    fn test_linear_inside_window() {
        let window = Window::new(50.0, 100.0).unwrap();
        assert_eq!(window.map(0), 0);
        assert_eq!(window.map(50), 128);
        assert_eq!(window.map(100), 255);
        assert_eq!(window.map(20), 51);
    }

    #[test]
    fn test_quantize_is_pure() {
        let window = Window::new(100.0, 300.0).unwrap();
        let intensity = buffer(&[0, 17, 99, 250, 400, 1000], 0.0);
        let first = quantize_to_grayscale(&intensity, window).unwrap();
        let second = quantize_to_grayscale(&intensity, window).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_degenerate_window() {
        let intensity = buffer(&[1, 2, 3], 0.0);
        let zero = Window { center: 10.0, width: 0.0 };
        let negative = Window { center: 10.0, width: -5.0 };
        let nan = Window { center: f64::NAN, width: 10.0 };
        for window in [zero, negative, nan] {
            assert!(matches!(
                quantize_to_grayscale(&intensity, window),
                Err(AnnotatorError::InvalidWindow { .. })
            ));
        }
        assert!(Window::new(0.0, 0.0).is_err());
    }

    #[test]
    fn test_window_from_intensity_range() {
        let window = Window::from_intensity_range(&buffer(&[100, 300], -200.0));
        assert_eq!(window.center, 0.0);
        assert_eq!(window.width, 200.0);

        let flat = Window::from_intensity_range(&buffer(&[7, 7], 0.0));
        assert_eq!(flat.width, 1.0);
    }
}
