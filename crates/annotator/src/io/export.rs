use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::{AnnotatorError, Result},
    types::{Contour, ContourSet, ContourSummary, Dimensions},
};

/// The exported annotation: a JSON array of contours, each an array of
/// `[x, y]` pixel pairs. Only contours with at least three points are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationDocument {
    contours: Vec<Contour>,
}

impl AnnotationDocument {
    /// Collect the valid contours of `contours`, in drawing order
    pub fn from_contours<'a>(contours: impl IntoIterator<Item = &'a Contour>) -> Self {
        Self {
            contours: contours.into_iter().filter(|c| c.is_valid()).cloned().collect(),
        }
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Point count, area, perimeter and bounds of every contour
    pub fn summaries(&self) -> Vec<ContourSummary> {
        self.contours.iter().map(Contour::summary).collect()
    }

    /// Compact JSON, as written to the annotation file
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self)?)
    }

    /// Save JSON to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Parse an exported document, rejecting contours under three points
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: Self = serde_json::from_str(json)?;
        if let Some((i, contour)) = document
            .contours
            .iter()
            .enumerate()
            .find(|(_, c)| !c.is_valid())
        {
            return Err(AnnotatorError::InvalidAnnotation(format!(
                "contour {} has {} points, at least 3 are required",
                i,
                contour.len()
            )));
        }
        Ok(document)
    }

    /// Load an exported document from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check every point lies inside an image of the given size
    pub fn check_bounds(&self, dimensions: Dimensions) -> Result<()> {
        for point in self.contours.iter().flat_map(Contour::points) {
            if dimensions.index_of(point.x, point.y).is_none() {
                return Err(AnnotatorError::InvalidAnnotation(format!(
                    "point [{}, {}] outside {}x{} image",
                    point.x, point.y, dimensions.width, dimensions.height
                )));
            }
        }
        Ok(())
    }

    /// Annotation state holding these contours with a fresh one to draw into
    pub fn into_contour_set(self) -> ContourSet {
        ContourSet::with_pending(self.contours)
    }
}

/// A document ready to be handed to whoever writes the file
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationExport {
    pub file_name: String,
    pub document: AnnotationDocument,
}

impl AnnotationExport {
    /// Write the document into `dir` under its export file name
    pub fn save_in<P: AsRef<Path>>(&self, dir: P) -> Result<std::path::PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        self.document.save(&path)?;
        Ok(path)
    }
}

/// `scan_042.dcm` → `scan_042.json`
pub fn annotation_file_name(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("annotation");
    format!("{stem}.json")
}
