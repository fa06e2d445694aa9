use std::path::PathBuf;

use storyline_core::error::CoreError;
use storyline_core::types::ChapterId;

/// Fatal input failures. Recoverable anomalies are logged and skipped
/// instead of surfacing here.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to read annotation export {path}: {source}")]
    ExportRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Annotation export {source_name} is not a valid task list: {source}")]
    ExportParse {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Subtitle track for chapter {chapter_id} not found at {path}")]
    SubtitleMissing { chapter_id: ChapterId, path: PathBuf },

    #[error("Failed to read subtitle track {path}: {source}")]
    SubtitleRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
