//! Narrative blueprint document model.
//!
//! The blueprint is the only artifact the build produces. Every nested time
//! field holds the canonical `HH:MM:SS.mmm` string; no source-encoded time
//! survives into this model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chapters::{build_chapters, build_project_metadata};
use crate::error::CoreError;
use crate::timeline::{build_narrative_timeline, NarrativeTimeline};
use crate::types::{BranchId, ChapterId, SceneId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Schema version tag written into every blueprint.
pub const SCHEMA_VERSION: &str = "1.8";

/// Placeholder for descriptive scene attributes the annotator left empty.
pub const NOT_ANNOTATED: &str = "N/A";

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Top-level narrative blueprint.
///
/// Chapters and scenes are keyed by integer id; JSON renders the keys as
/// strings in ascending numeric order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub project_metadata: ProjectMetadata,
    pub chapters: BTreeMap<ChapterId, Chapter>,
    pub scenes: BTreeMap<SceneId, Scene>,
    pub narrative_timeline: NarrativeTimeline,
}

impl Blueprint {
    /// Derive chapters, metadata and the narrative timeline from assembled
    /// scenes and wrap everything into a document.
    pub fn assemble(
        project_name: &str,
        language: &str,
        scenes: Vec<Scene>,
        generated_at: Timestamp,
    ) -> Result<Self, CoreError> {
        let scenes: BTreeMap<SceneId, Scene> = scenes.into_iter().map(|s| (s.id, s)).collect();
        let chapters = build_chapters(scenes.values());
        let project_metadata = build_project_metadata(
            project_name,
            language,
            chapters.len(),
            scenes.len(),
            generated_at,
        )?;
        let narrative_timeline = build_narrative_timeline(scenes.values());
        Ok(Self {
            project_metadata,
            chapters,
            scenes,
            narrative_timeline,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub project_name: String,
    pub total_chapters: usize,
    pub total_scenes: usize,
    pub version: String,
    /// Language tag (e.g. `zh-CN`) selecting the validation lexicon.
    pub language: String,
    /// Wall-clock build time. Not part of any reproducibility guarantee.
    pub generation_date: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub name: String,
    pub textual: String,
    pub source_file: String,
    pub scene_ids: Vec<SceneId>,
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    pub name: String,
    pub textual: String,
    pub chapter_id: ChapterId,
    pub start_time: String,
    pub end_time: String,
    pub inferred_location: String,
    pub character_dynamics: String,
    pub mood_and_atmosphere: String,
    pub scene_content_type: String,
    pub branch: BranchInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline_marker: Option<TimelineMarker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub information_marker: Option<InformationMarker>,
    pub dialogues: Vec<SubtitleLine>,
    pub captions: Vec<SubtitleLine>,
    pub highlights: Vec<Highlight>,
    pub narrative_cues: Vec<NarrativeCue>,
}

impl Scene {
    /// The scene's timeline marker type, if it carries one.
    pub fn marker_type(&self) -> Option<TimelineMarkerType> {
        self.timeline_marker.as_ref().map(|m| m.kind)
    }
}

/// A dialogue or caption line from the subtitle track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleLine {
    pub speaker: String,
    pub text: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub mood: Option<String>,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NarrativeCueKind {
    #[serde(rename = "Key_Information")]
    KeyInformation,
    Object,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeCue {
    #[serde(rename = "type")]
    pub kind: NarrativeCueKind,
    pub value: String,
    pub start_time: String,
    pub end_time: String,
}

// ---------------------------------------------------------------------------
// Branching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchType {
    Linear,
    MultiBranch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub id: BranchId,
    #[serde(rename = "type")]
    pub kind: BranchType,
    #[serde(default)]
    pub intersection_with: Vec<BranchId>,
}

impl BranchInfo {
    pub fn branch(id: BranchId) -> Self {
        Self {
            id,
            kind: BranchType::MultiBranch,
            intersection_with: Vec::new(),
        }
    }

    pub fn intersection(id: BranchId, with: BranchId) -> Self {
        Self {
            id,
            kind: BranchType::MultiBranch,
            intersection_with: vec![with],
        }
    }

    pub fn is_linear(&self) -> bool {
        self.kind == BranchType::Linear
    }
}

impl Default for BranchInfo {
    fn default() -> Self {
        Self {
            id: 0,
            kind: BranchType::Linear,
            intersection_with: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Timeline markers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineMarkerType {
    Start,
    None,
    ReturnPresent,
    InsertPast,
    Forward,
    Past,
    Future,
    Unrelated,
}

impl TimelineMarkerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::None => "NONE",
            Self::ReturnPresent => "RETURN_PRESENT",
            Self::InsertPast => "INSERT_PAST",
            Self::Forward => "FORWARD",
            Self::Past => "PAST",
            Self::Future => "FUTURE",
            Self::Unrelated => "UNRELATED",
        }
    }

    /// Parse an annotation label. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "START" => Some(Self::Start),
            "NONE" => Some(Self::None),
            "RETURN_PRESENT" => Some(Self::ReturnPresent),
            "INSERT_PAST" => Some(Self::InsertPast),
            "FORWARD" => Some(Self::Forward),
            "PAST" => Some(Self::Past),
            "FUTURE" => Some(Self::Future),
            "UNRELATED" => Some(Self::Unrelated),
            _ => None,
        }
    }
}

impl std::fmt::Display for TimelineMarkerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineMarker {
    #[serde(rename = "type")]
    pub kind: TimelineMarkerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_chapter_id: Option<ChapterId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_scene_id: Option<SceneId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_information: Option<String>,
}

impl TimelineMarker {
    /// A marker with no positional data.
    pub fn new(kind: TimelineMarkerType) -> Self {
        Self {
            kind,
            insert_chapter_id: None,
            insert_scene_id: None,
            inner_index: None,
            extended_information: None,
        }
    }

    /// An `INSERT_PAST` directive targeting `scene_id`.
    pub fn insert_past(
        chapter_id: Option<ChapterId>,
        scene_id: Option<SceneId>,
        inner_index: Option<i64>,
    ) -> Self {
        Self {
            insert_chapter_id: chapter_id,
            insert_scene_id: scene_id,
            inner_index,
            ..Self::new(TimelineMarkerType::InsertPast)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InformationMarkerType {
    Recall,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InformationMarker {
    #[serde(rename = "type")]
    pub kind: InformationMarkerType,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
