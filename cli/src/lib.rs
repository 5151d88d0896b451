use annotator::{SessionCommand, Window};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// A scripted annotation run: one slice, a sequence of input commands and
/// where to put the results.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AnnotationJob {
    pub input_path: String,
    pub output_dir: String,
    /// Display window to use instead of the one stored in the file
    #[serde(default)]
    pub window: Option<Window>,
    /// Optional PNG of the final raster with the overlay drawn
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub commands: Vec<SessionCommand>,
}

impl AnnotationJob {
    /// Load AnnotationJob configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, JobError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load AnnotationJob configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, JobError> {
        Ok(toml::from_str(content)?)
    }

    /// Load AnnotationJob configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, JobError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load AnnotationJob configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self, JobError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, JobError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(JobError::UnsupportedFileFormat),
        }
    }

    /// Convert AnnotationJob to TOML string
    pub fn to_toml(&self) -> Result<String, JobError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Convert AnnotationJob to JSON string
    pub fn to_json(&self) -> Result<String, JobError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }
}
