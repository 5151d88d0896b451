//! # DICOM Slice Annotation Library
//!
//! Loads a single-frame grayscale DICOM slice, windows it into an 8-bit
//! raster and records polygon annotations drawn over it in an undoable,
//! append-only history.
//!
//! ## Core Features
//!
//! - **Intensity Pipeline**: stored samples → calibrated (HU) values →
//!   windowed grayscale, as pure functions
//! - **Snapshot History**: every edit appends a full contour snapshot, undo
//!   drops the last one
//! - **Session Controller**: pointer strokes, keyboard shortcuts and
//!   re-windowing as typed commands
//! - **Export**: JSON arrays of `[x, y]` pixel pairs, one per valid contour
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use annotator::{Session, SessionCommand, PointerButton};
//!
//! let mut session = Session::default();
//! session.load_file("slice.dcm")?;
//!
//! session.handle(SessionCommand::PointerDown { button: PointerButton::Primary })?;
//! session.handle(SessionCommand::PointerMove { x: 10, y: 10 })?;
//! session.handle(SessionCommand::PointerMove { x: 40, y: 10 })?;
//! session.handle(SessionCommand::PointerUp { button: PointerButton::Primary, x: 40, y: 40 })?;
//!
//! if let Some(export) = session.export() {
//!     export.save_in(".")?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Window
//!
//! ```rust,no_run
//! use annotator::{IntensityPipeline, Session, Window};
//!
//! // Lung window regardless of what the file says
//! let pipeline = IntensityPipeline::builder()
//!     .with_window(Window::new(-600.0, 1500.0)?)
//!     .build();
//! let mut session = Session::new(pipeline);
//! session.load_file("chest.dcm")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod dicom;
pub mod intensity;
pub mod pipeline;
pub mod history;
pub mod session;
pub mod render;
pub mod io;

// Re-exports for convenience
pub use error::{AnnotatorError, DecodeError, Result};
pub use types::{Contour, ContourSet, ContourSummary, DecodedSlice, Dimensions, Point};
pub use traits::*;
pub use dicom::Part10Decoder;
pub use intensity::{decode_calibrated_intensity, quantize_to_grayscale, IntensityBuffer, Rescale, Window};
pub use pipeline::{builder::IntensityPipelineBuilder, IntensityPipeline, LoadedSlice};
pub use history::HistoryLog;
pub use session::{command_for_key, Key, NoOp, Outcome, PointerButton, Session, SessionCommand};
pub use render::{save_png, Renderer, RasterKey};
pub use io::*;

#[cfg(test)]
mod tests {
    use super::*;
    use dicom::testing::TestFile;

    #[test]
    fn test_session_round_trip_through_export_and_import() {
        let bytes = TestFile::uniform(16, 16, 1000)
            .window("40", "400")
            .rescale("1", "-1024")
            .bytes();

        let mut session = Session::default();
        session.load("IM0001.dcm", &bytes).expect("Should load");
        for command in [
            SessionCommand::PointerDown { button: PointerButton::Primary },
            SessionCommand::PointerMove { x: 2, y: 2 },
            SessionCommand::PointerMove { x: 12, y: 2 },
            SessionCommand::PointerUp { button: PointerButton::Primary, x: 12, y: 12 },
        ] {
            session.handle(command).expect("Should handle");
        }
        let export = session.export().expect("Should export");
        assert_eq!(export.file_name, "IM0001.json");
        let json = export.document.to_json_string().unwrap();

        let mut fresh = Session::default();
        fresh.load("IM0001.dcm", &bytes).expect("Should load");
        fresh
            .import(AnnotationDocument::from_json_str(&json).unwrap())
            .expect("Should import");
        assert_eq!(fresh.valid_contours(), export.document.contours());

        let frame = Renderer::new().render(&fresh).expect("Should render");
        assert_eq!(frame.dimensions(), (16, 16));
        assert_eq!(frame.get_pixel(7, 2), &render::OVERLAY_RED);
    }

    #[test]
    fn test_intensity_readout_uses_calibrated_values() {
        let bytes = TestFile::uniform(2, 2, 1000).rescale("1", "-1024").bytes();
        let mut session = Session::default();
        session.load("a.dcm", &bytes).unwrap();
        session.handle(SessionCommand::PointerMove { x: 1, y: 1 }).unwrap();
        assert_eq!(session.intensity_at_cursor(), Some(-24));
    }
}
