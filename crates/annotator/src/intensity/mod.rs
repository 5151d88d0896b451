//! Raw sample → calibrated intensity → 8-bit grayscale.
//!
//! Both stages are pure functions of their inputs so they can be exercised
//! without any rendering surface.

pub mod calibration;
pub mod window;

pub use calibration::{decode_calibrated_intensity, IntensityBuffer, Rescale};
pub use window::{quantize_to_grayscale, Window};
