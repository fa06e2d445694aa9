//! Validation rule and report types.

use serde::{Deserialize, Serialize};

use crate::types::{SceneId, Timestamp};

/// Keys every blueprint document must carry.
pub const REQUIRED_TOP_LEVEL_KEYS: &[&str] = &[
    "project_metadata",
    "chapters",
    "scenes",
    "narrative_timeline",
];

/// Keys every scene must carry.
pub const REQUIRED_SCENE_KEYS: &[&str] = &[
    "id",
    "chapter_id",
    "name",
    "start_time",
    "end_time",
    "inferred_location",
    "character_dynamics",
    "mood_and_atmosphere",
    "scene_content_type",
    "branch",
    "dialogues",
    "captions",
    "highlights",
    "narrative_cues",
];

/// Keys every dialogue line must carry.
pub const REQUIRED_DIALOGUE_KEYS: &[&str] = &["speaker", "text", "start_time", "end_time"];

/// Rule codes reported in `rule_violated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rule {
    MissingTopLevelKey,
    MissingSceneKey,
    MissingDialogueKey,
    InvalidSceneMood,
    InvalidSceneContentType,
    InvalidHighlightType,
    InvalidHighlightMood,
    MissingStartMarker,
    DuplicateStartMarker,
    InconsistentTimeline,
    InsertPastSelfReference,
    InsertPastChain,
}

/// A single finding. `scene_id` is `None` for document-level findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub scene_id: Option<SceneId>,
    pub rule_violated: Rule,
    pub error_details: String,
}

/// Advisory report. Findings never block use of the blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub validation_time: Timestamp,
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of findings for `rule`.
    pub fn count(&self, rule: Rule) -> usize {
        self.errors.iter().filter(|e| e.rule_violated == rule).count()
    }
}
