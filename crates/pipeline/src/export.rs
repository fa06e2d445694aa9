//! Annotation-platform export model.
//!
//! An export is a JSON array of task records. Each task holds one or more
//! annotations; only the first annotation's results are used. Every result
//! carries one attribute of one region, keyed by region id.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use storyline_core::types::ChapterId;

use crate::error::{PipelineError, PipelineResult};

pub type TaskId = i64;

/// Upload names carry the episode number as `ep<digits>`.
static EPISODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ep(\d+)").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationTask {
    pub id: TaskId,
    /// Position of the task within its project. Missing sorts as 0.
    #[serde(default)]
    pub inner_id: Option<i64>,
    #[serde(default)]
    pub file_upload: Option<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl AnnotationTask {
    /// Results of the first annotation, or nothing.
    pub fn results(&self) -> &[AnnotationResult] {
        self.annotations
            .first()
            .map(|a| a.result.as_slice())
            .unwrap_or_default()
    }

    pub fn chapter_number(&self) -> Option<ChapterId> {
        self.file_upload
            .as_deref()
            .and_then(chapter_number_from_upload)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub result: Vec<AnnotationResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationResult {
    /// Region identifier shared by every attribute of one region.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub value: Option<ResultValue>,
}

/// The value payload of one result. Which fields are populated depends on
/// the control that produced it (labels, choices, text area, number).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultValue {
    #[serde(default)]
    pub start: Option<f64>,
    #[serde(default)]
    pub end: Option<f64>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub text: Vec<String>,
    #[serde(default)]
    pub number: Option<f64>,
}

impl ResultValue {
    /// Both time bounds, when this value carries them.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        Some((self.start?, self.end?))
    }
}

/// Extract the chapter number from an upload name (`.../show_ep03.mp4` -> 3).
pub fn chapter_number_from_upload(file_upload: &str) -> Option<ChapterId> {
    EPISODE_RE
        .captures(file_upload)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parse an export document. `source_name` only labels errors.
pub fn parse_export(text: &str, source_name: &str) -> PipelineResult<Vec<AnnotationTask>> {
    serde_json::from_str(text).map_err(|source| PipelineError::ExportParse {
        source_name: source_name.to_string(),
        source,
    })
}

pub fn load_export(path: &Path) -> PipelineResult<Vec<AnnotationTask>> {
    let text = std::fs::read_to_string(path).map_err(|source| PipelineError::ExportRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_export(&text, &path.display().to_string())
}
