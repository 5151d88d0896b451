use serde::{Deserialize, Serialize};

use crate::{
    error::{DecodeError, Result},
    types::Dimensions,
};

/// Rescale slope/intercept mapping stored samples to calibrated units
/// (Hounsfield units for CT).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rescale {
    pub slope: f64,
    pub intercept: f64,
}

impl Rescale {
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    /// Calibrated value of a single stored sample
    pub fn apply(&self, sample: u16) -> i32 {
        // `as` saturates, so extreme calibrations pin to the i32 range.
        (f64::from(sample) * self.slope + self.intercept).round() as i32
    }
}

impl Default for Rescale {
    fn default() -> Self {
        Self { slope: 1.0, intercept: 0.0 }
    }
}

/// Calibrated intensities of one slice, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityBuffer {
    dimensions: Dimensions,
    values: Vec<i32>,
}

impl IntensityBuffer {
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    /// Intensity under pixel `(x, y)`
    pub fn value_at(&self, x: u32, y: u32) -> Option<i32> {
        self.dimensions.index_of(x, y).map(|idx| self.values[idx])
    }

    /// Smallest and largest calibrated value
    pub fn range(&self) -> (i32, i32) {
        self.values
            .iter()
            .fold((i32::MAX, i32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}

/// Apply `sample * slope + intercept` to every stored sample.
///
/// `raw` must hold exactly `width * height` samples of a non-empty image.
pub fn decode_calibrated_intensity(
    raw: &[u16],
    dimensions: Dimensions,
    rescale: Rescale,
) -> Result<IntensityBuffer> {
    if dimensions.is_empty() {
        return Err(DecodeError::EmptyImage {
            width: dimensions.width,
            height: dimensions.height,
        }
        .into());
    }
    let expected = dimensions.pixel_count();
    if raw.len() != expected {
        return Err(DecodeError::DimensionMismatch {
            width: dimensions.width,
            height: dimensions.height,
            expected,
            actual: raw.len(),
        }
        .into());
    }

    let values = raw.iter().map(|&sample| rescale.apply(sample)).collect();
    Ok(IntensityBuffer { dimensions, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnnotatorError;

    #[test]
    fn test_applies_slope_and_intercept() {
        let dims = Dimensions::new(2, 2);
        let buffer =
            decode_calibrated_intensity(&[0, 1, 1000, 2048], dims, Rescale::new(1.0, -1024.0))
                .expect("Should decode");
        assert_eq!(buffer.values(), &[-1024, -1023, -24, 1024]);
        assert_eq!(buffer.range(), (-1024, 1024));
    }

    #[test]
    fn test_fractional_slope_rounds() {
        let dims = Dimensions::new(3, 1);
        let buffer = decode_calibrated_intensity(&[1, 3, 10], dims, Rescale::new(0.5, 0.0))
            .expect("Should decode");
        assert_eq!(buffer.values(), &[1, 2, 5]);
    }

    #[test]
    fn test_value_at_is_row_major() {
        let dims = Dimensions::new(3, 2);
        let buffer = decode_calibrated_intensity(&[0, 1, 2, 3, 4, 5], dims, Rescale::default())
            .expect("Should decode");
        assert_eq!(buffer.value_at(2, 1), Some(5));
        assert_eq!(buffer.value_at(0, 1), Some(3));
        assert_eq!(buffer.value_at(3, 0), None);
    }

    #[test]
    fn test_rejects_mismatched_length() {
        let err = decode_calibrated_intensity(&[1, 2, 3], Dimensions::new(2, 2), Rescale::default())
            .unwrap_err();
        assert!(matches!(
            err,
            AnnotatorError::Decode(DecodeError::DimensionMismatch { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_rejects_empty_image() {
        let err = decode_calibrated_intensity(&[], Dimensions::new(0, 4), Rescale::default())
            .unwrap_err();
        assert!(matches!(
            err,
            AnnotatorError::Decode(DecodeError::EmptyImage { .. })
        ));
    }
}
