//! The session controller: owns one loaded slice and its annotation history.
//!
//! Everything runs synchronously on the caller's thread; each call finishes
//! before the next input is handled.

pub mod input;

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use strum::Display;
use tracing::{debug, info};

use crate::{
    error::Result,
    history::HistoryLog,
    intensity::Window,
    io::{annotation_file_name, AnnotationDocument, AnnotationExport},
    pipeline::{IntensityPipeline, LoadedSlice},
    types::{Contour, ContourSet, Point},
};

pub use input::{command_for_key, Key, PointerButton, SessionCommand};

/// Result of an interaction that may legitimately do nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    NoOp(NoOp),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

/// Why an interaction was ignored. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum NoOp {
    NoImageLoaded,
    EmptyHistory,
    InvalidContour,
    NoValidContours,
    IgnoredButton,
}

/// Load identities are unique across every session in the process.
static NEXT_LOAD_ID: AtomicU64 = AtomicU64::new(1);

fn ignored(reason: NoOp) -> Outcome {
    debug!("Ignored: {}", reason);
    Outcome::NoOp(reason)
}

pub struct Session {
    pipeline: IntensityPipeline,
    slice: Option<LoadedSlice>,
    source_name: Option<String>,
    load_id: u64,
    history: HistoryLog,
    drawing: bool,
    cursor: Option<Point>,
}

impl Session {
    pub fn new(pipeline: IntensityPipeline) -> Self {
        Self {
            pipeline,
            slice: None,
            source_name: None,
            load_id: 0,
            history: HistoryLog::new(),
            drawing: false,
            cursor: None,
        }
    }

    /// Load a new slice from memory, discarding the previous annotations.
    ///
    /// When decoding or windowing fails the previous slice and history are
    /// kept as they were.
    pub fn load(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let slice = self.pipeline.process(bytes)?;
        self.slice = Some(slice);
        self.source_name = Some(name.to_string());
        self.load_id = NEXT_LOAD_ID.fetch_add(1, Ordering::Relaxed);
        self.history.reset();
        self.drawing = false;
        self.cursor = None;
        info!("Session load #{}: {}", self.load_id, name);
        Ok(())
    }

    /// Load a slice from disk
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.load(&name, &bytes)
    }

    pub fn slice(&self) -> Option<&LoadedSlice> {
        self.slice.as_ref()
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    /// Identity of the loaded image, distinct for every successful load in
    /// the process; 0 before the first one
    pub fn load_id(&self) -> u64 {
        self.load_id
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn current_state(&self) -> Option<&ContourSet> {
        self.history.current()
    }

    pub fn current_contours(&self) -> &[Contour] {
        self.history.current_contours()
    }

    /// Contours eligible for export
    pub fn valid_contours(&self) -> Vec<Contour> {
        self.current_contours()
            .iter()
            .filter(|c| c.is_valid())
            .cloned()
            .collect()
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    /// Calibrated intensity under the cursor
    pub fn intensity_at_cursor(&self) -> Option<i32> {
        let cursor = self.cursor?;
        self.slice.as_ref()?.intensity.value_at(cursor.x, cursor.y)
    }

    /// Add a point to the active contour, clamped into the image.
    pub fn add_point(&mut self, x: u32, y: u32) -> Outcome {
        let Some(slice) = &self.slice else {
            return ignored(NoOp::NoImageLoaded);
        };
        let point = slice.dimensions.clamp(i64::from(x), i64::from(y));
        self.history.add_point(point);
        Outcome::Applied
    }

    /// Close the active contour if it has at least three points
    pub fn advance_contour(&mut self) -> Outcome {
        if self.history.is_empty() {
            return ignored(NoOp::EmptyHistory);
        }
        if self.history.advance_contour() {
            Outcome::Applied
        } else {
            ignored(NoOp::InvalidContour)
        }
    }

    pub fn undo(&mut self) -> Outcome {
        if self.history.undo() {
            Outcome::Applied
        } else {
            ignored(NoOp::EmptyHistory)
        }
    }

    /// Recompute the display raster for a new window, keeping annotations
    pub fn set_window(&mut self, window: Window) -> Result<Outcome> {
        let Some(slice) = self.slice.as_mut() else {
            return Ok(ignored(NoOp::NoImageLoaded));
        };
        slice.rewindow(window)?;
        info!("Window set to {}/{}", window.center, window.width);
        Ok(Outcome::Applied)
    }

    /// Feed one input command through the session
    pub fn handle(&mut self, command: SessionCommand) -> Result<Outcome> {
        let outcome = match command {
            SessionCommand::PointerDown { button } => {
                if button != PointerButton::Primary {
                    ignored(NoOp::IgnoredButton)
                } else if self.slice.is_none() {
                    ignored(NoOp::NoImageLoaded)
                } else {
                    self.drawing = true;
                    Outcome::Applied
                }
            }
            SessionCommand::PointerMove { x, y } => self.pointer_move(x, y),
            SessionCommand::PointerUp { button, x, y } => {
                if button != PointerButton::Primary {
                    ignored(NoOp::IgnoredButton)
                } else {
                    self.drawing = false;
                    self.pointer_point(x, y)
                }
            }
            SessionCommand::Undo => self.undo(),
            SessionCommand::NewContour => self.advance_contour(),
            SessionCommand::SetWindow { center, width } => {
                return self.set_window(Window::new(center, width)?);
            }
        };
        Ok(outcome)
    }

    fn pointer_move(&mut self, x: i64, y: i64) -> Outcome {
        let Some(slice) = &self.slice else {
            return ignored(NoOp::NoImageLoaded);
        };
        self.cursor = Some(slice.dimensions.clamp(x, y));
        if self.drawing {
            self.pointer_point(x, y)
        } else {
            Outcome::Applied
        }
    }

    fn pointer_point(&mut self, x: i64, y: i64) -> Outcome {
        let Some(slice) = &self.slice else {
            return ignored(NoOp::NoImageLoaded);
        };
        let point = slice.dimensions.clamp(x, y);
        self.history.add_point(point);
        Outcome::Applied
    }

    /// Build the annotation file for the current contours.
    ///
    /// Returns `None` when no contour has three points yet. A successful
    /// export closes the active contour so drawing continues on a new one.
    pub fn export(&mut self) -> Option<AnnotationExport> {
        let document = AnnotationDocument::from_contours(self.current_contours());
        if document.is_empty() {
            ignored(NoOp::NoValidContours);
            return None;
        }
        let file_name = annotation_file_name(self.source_name.as_deref().unwrap_or_default());
        info!("Exporting {} contours to {}", document.len(), file_name);
        self.advance_contour();
        Some(AnnotationExport { file_name, document })
    }

    /// Replace the current contours with a previously exported document.
    ///
    /// Pushed as a regular history entry, so it can be undone.
    pub fn import(&mut self, document: AnnotationDocument) -> Result<Outcome> {
        let Some(slice) = &self.slice else {
            return Ok(ignored(NoOp::NoImageLoaded));
        };
        document.check_bounds(slice.dimensions)?;
        info!("Imported {} contours", document.len());
        self.history.push(document.into_contour_set());
        Ok(Outcome::Applied)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(IntensityPipeline::default())
    }
}
