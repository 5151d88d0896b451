//! Composites the grayscale raster and the contour overlay into RGBA.
//!
//! The base raster is rebuilt only when the loaded slice or its window
//! changes; the overlay is redrawn on every call.

use std::path::Path;

use image::{GrayImage, Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
use tracing::debug;

use crate::{
    error::Result,
    intensity::Window,
    session::Session,
    types::{Contour, Point},
};

pub const OVERLAY_RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Identity of a base raster: which load, displayed through which window.
/// `load_id` is unique per load across all sessions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterKey {
    pub load_id: u64,
    pub window: Window,
}

/// Expand a grayscale raster to opaque RGBA
pub fn grayscale_to_rgba(gray: &GrayImage) -> RgbaImage {
    RgbaImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y).0[0];
        Rgba([v, v, v, 255])
    })
}

/// Write a rendered frame as PNG
pub fn save_png<P: AsRef<Path>>(frame: &RgbaImage, path: P) -> Result<()> {
    frame.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// Draw contour outlines onto `canvas`.
///
/// Each contour gets its first pixel marked and a segment between
/// consecutive points. Every contour except the active one is closed back
/// to its first point.
pub fn draw_contours(
    canvas: &mut RgbaImage,
    contours: &[Contour],
    active_index: Option<usize>,
    color: Rgba<u8>,
) {
    let to_f32 = |p: &Point| (p.x as f32, p.y as f32);

    for (i, contour) in contours.iter().enumerate() {
        let points = contour.points();
        let Some(first) = points.first() else {
            continue;
        };
        if first.x < canvas.width() && first.y < canvas.height() {
            canvas.put_pixel(first.x, first.y, color);
        }
        for pair in points.windows(2) {
            draw_line_segment_mut(canvas, to_f32(&pair[0]), to_f32(&pair[1]), color);
        }
        if Some(i) != active_index && points.len() > 1 {
            if let Some(last) = points.last() {
                draw_line_segment_mut(canvas, to_f32(last), to_f32(first), color);
            }
        }
    }
}

/// Renders a session, reusing the base raster while its key is unchanged
#[derive(Debug)]
pub struct Renderer {
    color: Rgba<u8>,
    cache: Option<(RasterKey, RgbaImage)>,
    base_builds: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Self::with_color(OVERLAY_RED)
    }

    pub fn with_color(color: Rgba<u8>) -> Self {
        Self {
            color,
            cache: None,
            base_builds: 0,
        }
    }

    /// How many times the base raster has been built
    pub fn base_builds(&self) -> usize {
        self.base_builds
    }

    /// Raster plus overlay, `None` while no slice is loaded
    pub fn render(&mut self, session: &Session) -> Option<RgbaImage> {
        let slice = session.slice()?;
        let key = RasterKey {
            load_id: session.load_id(),
            window: slice.window,
        };

        let fresh = match &self.cache {
            Some((cached, _)) => *cached != key,
            None => true,
        };
        if fresh {
            debug!("Building base raster for load #{}", key.load_id);
            self.cache = Some((key, grayscale_to_rgba(&slice.grayscale)));
            self.base_builds += 1;
        }

        let (_, base) = self.cache.as_ref()?;
        let mut frame = base.clone();
        if let Some(state) = session.current_state() {
            draw_contours(
                &mut frame,
                state.contours(),
                Some(state.active_index()),
                self.color,
            );
        }
        Some(frame)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
