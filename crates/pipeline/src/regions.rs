//! Region reconstruction and typing.
//!
//! An export scatters each annotated region over several results, one per
//! attribute. Results are regrouped by region id, then each region is typed
//! by its `region_type` label and turned into a draft scene, highlight or
//! narrative cues. Drafts keep their source-encoded times until assembly.

use std::collections::HashMap;

use storyline_core::blueprint::{
    BranchInfo, InformationMarker, InformationMarkerType, NarrativeCueKind, TimelineMarker,
    TimelineMarkerType, NOT_ANNOTATED,
};
use storyline_core::time::RawSpan;
use storyline_core::types::{BranchId, ChapterId, SceneId};

use crate::export::{AnnotationTask, ResultValue};

// ---------------------------------------------------------------------------
// Field names
// ---------------------------------------------------------------------------

const FIELD_REGION_TYPE: &str = "region_type";

const FIELD_LOCATION: &str = "scene_location";
const FIELD_CHARACTER_DYNAMICS: &str = "scene_character_dynamics";
const FIELD_MOOD: &str = "scene_mood_and_atmosphere";
const FIELD_CONTENT_TYPE: &str = "scene_content_type";

const FIELD_BRANCH_TYPE: &str = "narrative_branch_type";
const FIELD_BRANCH_ID: &str = "branch_id";
const FIELD_INTERSECTION_X: &str = "branch_intersection_x";
const FIELD_INTERSECTION_Y: &str = "branch_intersection_y";

const FIELD_MARKER_TYPE: &str = "scene_timeline_marker_type";
const FIELD_INSERT_CHAPTER: &str = "insert_past_chapter";
const FIELD_INSERT_SCENE: &str = "insert_past_scene";
const FIELD_INSERT_INNER_INDEX: &str = "insert_past_inner_index";

const FIELD_HIGHLIGHT_ID: &str = "highlight_id";
const FIELD_HIGHLIGHT_TYPE: &str = "highlight_type";
const FIELD_HIGHLIGHT_DESCRIPTION: &str = "highlight_description";
const FIELD_HIGHLIGHT_MOOD: &str = "highlight_mood";

const FIELD_KEY_INFORMATION: &str = "key_information_summary";
const FIELD_OBJECT_NAME: &str = "object_name";

/// Marker label that sets an information marker instead of a timeline one.
const REFERENCE_LABEL: &str = "REFERENCE";

// ---------------------------------------------------------------------------
// Region typing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Scene,
    Highlight,
    NarrativeCue,
}

impl RegionKind {
    /// Type a `region_type` label such as `Structure/Scene`.
    pub fn from_label(label: &str) -> Option<Self> {
        match strip_category(label).to_uppercase().as_str() {
            "SCENE" => Some(Self::Scene),
            "HIGHLIGHT" => Some(Self::Highlight),
            "NARRATIVE_CUE" => Some(Self::NarrativeCue),
            _ => None,
        }
    }
}

/// Drop a `category/` prefix.
pub fn strip_category(value: &str) -> &str {
    value.split_once('/').map_or(value, |(_, rest)| rest)
}

/// A single flattened attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

impl FieldValue {
    /// Read `choices[0]`, then `text[0]`, then `number`.
    pub fn flatten(value: &ResultValue) -> Option<Self> {
        if let Some(choice) = value.choices.first() {
            Some(Self::Text(strip_category(choice).to_string()))
        } else if let Some(text) = value.text.first() {
            Some(Self::Text(strip_category(text).to_string()))
        } else {
            value.number.map(Self::Number)
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(n) => n.to_string(),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Text(text) => text.trim().parse().ok(),
            Self::Number(n) if n.fract() == 0.0 => Some(*n as i64),
            Self::Number(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Regions
// ---------------------------------------------------------------------------

/// Every attribute of one region, gathered from the task's results.
#[derive(Debug, Clone)]
pub struct Region<'a> {
    pub id: &'a str,
    fields: HashMap<&'a str, &'a ResultValue>,
    bounds: Option<(f64, f64)>,
}

impl<'a> Region<'a> {
    fn new(id: &'a str) -> Self {
        Self {
            id,
            fields: HashMap::new(),
            bounds: None,
        }
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.bounds
    }

    pub fn kind(&self) -> Option<RegionKind> {
        self.fields
            .get(FIELD_REGION_TYPE)?
            .labels
            .first()
            .and_then(|label| RegionKind::from_label(label))
    }

    pub fn value(&self, field: &str) -> Option<FieldValue> {
        self.fields.get(field).and_then(|v| FieldValue::flatten(v))
    }

    pub fn text(&self, field: &str) -> Option<String> {
        self.value(field).map(FieldValue::into_text)
    }

    pub fn integer(&self, field: &str) -> Option<i64> {
        self.value(field).as_ref().and_then(FieldValue::as_integer)
    }

    /// All text entries of a field, unflattened.
    pub fn texts(&self, field: &str) -> &'a [String] {
        self.fields
            .get(field)
            .copied()
            .map(|v| v.text.as_slice())
            .unwrap_or_default()
    }

    fn text_or_unannotated(&self, field: &str) -> String {
        self.text(field)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| NOT_ANNOTATED.to_string())
    }
}

/// Regroup a task's results by region id, in first-seen order.
///
/// Results without an id, field name or value are ignored. A region's
/// bounds come from whichever result carries both `start` and `end`.
pub fn group_regions(task: &AnnotationTask) -> Vec<Region<'_>> {
    let mut regions: Vec<Region<'_>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for result in task.results() {
        let (Some(id), Some(field), Some(value)) = (
            result.id.as_deref(),
            result.from_name.as_deref(),
            result.value.as_ref(),
        ) else {
            continue;
        };

        let slot = *index.entry(id).or_insert_with(|| {
            regions.push(Region::new(id));
            regions.len() - 1
        });
        let region = &mut regions[slot];
        region.fields.insert(field, value);
        if let Some(bounds) = value.bounds() {
            region.bounds = Some(bounds);
        }
    }

    regions
}

// ---------------------------------------------------------------------------
// Drafts
// ---------------------------------------------------------------------------

/// Hands out scene ids for one build. Ids start at 1 and are never reused.
#[derive(Debug, Clone)]
pub struct SceneIdSequence {
    next: SceneId,
}

impl SceneIdSequence {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> SceneId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> usize {
        (self.next - 1) as usize
    }
}

impl Default for SceneIdSequence {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DraftScene {
    pub id: SceneId,
    pub chapter_id: ChapterId,
    pub span: RawSpan,
    pub inferred_location: String,
    pub character_dynamics: String,
    pub mood_and_atmosphere: String,
    pub scene_content_type: String,
    pub branch: BranchInfo,
    pub timeline_marker: Option<TimelineMarker>,
    pub information_marker: Option<InformationMarker>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DraftHighlight {
    pub chapter_id: ChapterId,
    pub span: RawSpan,
    pub id: Option<String>,
    pub kind: Option<String>,
    pub description: Option<String>,
    pub mood: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DraftCue {
    pub chapter_id: ChapterId,
    pub span: RawSpan,
    pub kind: NarrativeCueKind,
    pub value: String,
}

/// Everything one task contributed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTask {
    pub scenes: Vec<DraftScene>,
    pub highlights: Vec<DraftHighlight>,
    pub cues: Vec<DraftCue>,
}

/// Type the regions of one task, ascending by start time.
///
/// Scene ids are drawn from `ids` in that order, so they follow time within
/// a chapter. Untyped regions and regions without bounds are dropped.
pub fn parse_task(
    task: &AnnotationTask,
    chapter_id: ChapterId,
    ids: &mut SceneIdSequence,
) -> ParsedTask {
    let mut timed: Vec<(Region<'_>, (f64, f64))> = Vec::new();
    for region in group_regions(task) {
        match region.bounds() {
            Some(bounds) => timed.push((region, bounds)),
            None => {
                tracing::warn!(
                    task_id = task.id,
                    region_id = region.id,
                    "Dropping region without time bounds"
                );
            }
        }
    }
    timed.sort_by(|(_, a), (_, b)| a.0.total_cmp(&b.0));

    let mut parsed = ParsedTask::default();
    for (region, (start, end)) in timed {
        let span = RawSpan::from_seconds(start, end);
        match region.kind() {
            Some(RegionKind::Scene) => {
                parsed
                    .scenes
                    .push(scene_from_region(&region, ids.next_id(), chapter_id, span));
            }
            Some(RegionKind::Highlight) => {
                parsed
                    .highlights
                    .push(highlight_from_region(&region, chapter_id, span));
            }
            Some(RegionKind::NarrativeCue) => {
                parsed
                    .cues
                    .extend(cues_from_region(&region, chapter_id, &span));
            }
            None => {
                tracing::debug!(
                    task_id = task.id,
                    region_id = region.id,
                    "Ignoring untyped region"
                );
            }
        }
    }
    parsed
}

fn scene_from_region(
    region: &Region<'_>,
    id: SceneId,
    chapter_id: ChapterId,
    span: RawSpan,
) -> DraftScene {
    let (timeline_marker, information_marker) = markers_from_region(region);
    DraftScene {
        id,
        chapter_id,
        span,
        inferred_location: region.text_or_unannotated(FIELD_LOCATION),
        character_dynamics: region.text_or_unannotated(FIELD_CHARACTER_DYNAMICS),
        mood_and_atmosphere: region.text_or_unannotated(FIELD_MOOD),
        scene_content_type: region.text_or_unannotated(FIELD_CONTENT_TYPE),
        branch: branch_from_region(region),
        timeline_marker,
        information_marker,
    }
}

fn branch_from_region(region: &Region<'_>) -> BranchInfo {
    let id = |field: &str| -> BranchId { region.integer(field).unwrap_or(0) };
    match region.text(FIELD_BRANCH_TYPE).as_deref() {
        Some("BRANCH") => BranchInfo::branch(id(FIELD_BRANCH_ID)),
        Some("INTERSECTION") => match region.integer(FIELD_INTERSECTION_Y) {
            Some(with) => BranchInfo::intersection(id(FIELD_INTERSECTION_X), with),
            None => BranchInfo::branch(id(FIELD_INTERSECTION_X)),
        },
        _ => BranchInfo::default(),
    }
}

fn markers_from_region(
    region: &Region<'_>,
) -> (Option<TimelineMarker>, Option<InformationMarker>) {
    let Some(label) = region.text(FIELD_MARKER_TYPE) else {
        return (None, None);
    };
    if label == REFERENCE_LABEL {
        let recall = InformationMarker {
            kind: InformationMarkerType::Recall,
        };
        return (None, Some(recall));
    }

    let marker = match TimelineMarkerType::from_label(&label) {
        Some(TimelineMarkerType::InsertPast) => TimelineMarker::insert_past(
            region
                .integer(FIELD_INSERT_CHAPTER)
                .and_then(|id| ChapterId::try_from(id).ok()),
            region
                .integer(FIELD_INSERT_SCENE)
                .and_then(|id| SceneId::try_from(id).ok()),
            region.integer(FIELD_INSERT_INNER_INDEX),
        ),
        Some(kind @ (TimelineMarkerType::Past | TimelineMarkerType::Future)) => {
            let prefix = if kind == TimelineMarkerType::Past {
                "past"
            } else {
                "future"
            };
            TimelineMarker {
                inner_index: region.integer(&format!("{prefix}_inner_index")),
                extended_information: region.text(&format!("{prefix}_description")),
                ..TimelineMarker::new(kind)
            }
        }
        Some(kind) => TimelineMarker::new(kind),
        None => {
            tracing::warn!(region_id = region.id, label = %label, "Unknown timeline marker type");
            return (None, None);
        }
    };
    (Some(marker), None)
}

fn highlight_from_region(region: &Region<'_>, chapter_id: ChapterId, span: RawSpan) -> DraftHighlight {
    DraftHighlight {
        chapter_id,
        span,
        id: region.text(FIELD_HIGHLIGHT_ID),
        kind: region.text(FIELD_HIGHLIGHT_TYPE),
        description: region.text(FIELD_HIGHLIGHT_DESCRIPTION),
        mood: region.text(FIELD_HIGHLIGHT_MOOD),
    }
}

/// One cue per non-empty key-information text, then one per object name.
fn cues_from_region(region: &Region<'_>, chapter_id: ChapterId, span: &RawSpan) -> Vec<DraftCue> {
    let sources = [
        (FIELD_KEY_INFORMATION, NarrativeCueKind::KeyInformation),
        (FIELD_OBJECT_NAME, NarrativeCueKind::Object),
    ];
    sources
        .into_iter()
        .flat_map(|(field, kind)| {
            region
                .texts(field)
                .iter()
                .filter(|text| !text.is_empty())
                .map(move |text| DraftCue {
                    chapter_id,
                    span: span.clone(),
                    kind,
                    value: text.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::parse_export;
    use serde_json::{json, Value};

    fn result(id: &str, field: &str, value: Value) -> Value {
        json!({ "id": id, "from_name": field, "value": value })
    }

    fn typed(id: &str, label: &str, start: f64, end: f64) -> Value {
        result(id, "region_type", json!({ "start": start, "end": end, "labels": [label] }))
    }

    fn choice(id: &str, field: &str, choice: &str) -> Value {
        result(id, field, json!({ "choices": [choice] }))
    }

    fn task(results: Vec<Value>) -> AnnotationTask {
        let text = json!([{ "id": 1, "annotations": [{ "result": results }] }]).to_string();
        parse_export(&text, "inline").unwrap().remove(0)
    }

    // -- typing ----------------------------------------------------------------

    #[test]
    fn labels_are_typed_case_insensitively() {
        assert_eq!(RegionKind::from_label("Structure/Scene"), Some(RegionKind::Scene));
        assert_eq!(RegionKind::from_label("highlight"), Some(RegionKind::Highlight));
        assert_eq!(
            RegionKind::from_label("Narrative_Cue"),
            Some(RegionKind::NarrativeCue)
        );
        assert_eq!(RegionKind::from_label("Music"), None);
    }

    #[test]
    fn flatten_prefers_choices_then_text_then_number() {
        let value = ResultValue {
            choices: vec!["Mood/Tense".to_string()],
            text: vec!["ignored".to_string()],
            number: Some(3.0),
            ..Default::default()
        };
        assert_eq!(FieldValue::flatten(&value), Some(FieldValue::Text("Tense".to_string())));

        let value = ResultValue {
            number: Some(4.0),
            ..Default::default()
        };
        assert_eq!(FieldValue::flatten(&value).unwrap().as_integer(), Some(4));
        assert_eq!(FieldValue::flatten(&ResultValue::default()), None);
    }

    // -- grouping --------------------------------------------------------------

    #[test]
    fn results_are_grouped_by_region_id() {
        let task = task(vec![
            typed("a", "Scene", 0.0, 5.0),
            typed("b", "Highlight", 1.0, 2.0),
            choice("a", "scene_location", "Office"),
            json!({ "from_name": "orphan", "value": {} }),
        ]);
        let regions = group_regions(&task);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].id, "a");
        assert_eq!(regions[0].text("scene_location").as_deref(), Some("Office"));
        assert_eq!(regions[1].bounds(), Some((1.0, 2.0)));
    }

    // -- parse_task ------------------------------------------------------------

    #[test]
    fn scene_ids_follow_start_time() {
        let task = task(vec![
            typed("late", "Scene", 10.0, 20.0),
            typed("early", "Scene", 0.0, 10.0),
        ]);
        let mut ids = SceneIdSequence::new();
        ids.next_id();

        let parsed = parse_task(&task, 4, &mut ids);
        assert_eq!(parsed.scenes.len(), 2);
        assert_eq!(parsed.scenes[0].id, 2);
        assert_eq!(parsed.scenes[0].span, RawSpan::from_seconds(0.0, 10.0));
        assert_eq!(parsed.scenes[1].id, 3);
        assert_eq!(parsed.scenes[1].chapter_id, 4);
        assert_eq!(ids.issued(), 3);
    }

    #[test]
    fn unbounded_and_unknown_regions_are_dropped() {
        let task = task(vec![
            result("a", "region_type", json!({ "labels": ["Scene"] })),
            typed("b", "Music", 0.0, 1.0),
        ]);
        let mut ids = SceneIdSequence::new();
        assert_eq!(parse_task(&task, 1, &mut ids), ParsedTask::default());
        assert_eq!(ids.issued(), 0);
    }

    #[test]
    fn scene_attributes_default_to_not_annotated() {
        let task = task(vec![
            typed("a", "Scene", 0.0, 5.0),
            choice("a", "scene_mood_and_atmosphere", "Mood/Tense"),
        ]);
        let scene = parse_task(&task, 1, &mut SceneIdSequence::new()).scenes.remove(0);
        assert_eq!(scene.mood_and_atmosphere, "Tense");
        assert_eq!(scene.inferred_location, NOT_ANNOTATED);
        assert_eq!(scene.scene_content_type, NOT_ANNOTATED);
        assert_eq!(scene.branch, BranchInfo::default());
        assert_eq!(scene.timeline_marker, None);
    }

    #[test]
    fn branch_and_intersection_metadata() {
        let task = task(vec![
            typed("a", "Scene", 0.0, 5.0),
            choice("a", "narrative_branch_type", "BRANCH"),
            result("a", "branch_id", json!({ "number": 2 })),
            typed("b", "Scene", 5.0, 9.0),
            choice("b", "narrative_branch_type", "Branch/INTERSECTION"),
            result("b", "branch_intersection_x", json!({ "number": 1 })),
            result("b", "branch_intersection_y", json!({ "text": ["3"] })),
        ]);
        let scenes = parse_task(&task, 1, &mut SceneIdSequence::new()).scenes;
        assert_eq!(scenes[0].branch, BranchInfo::branch(2));
        assert_eq!(scenes[1].branch, BranchInfo::intersection(1, 3));
    }

    #[test]
    fn insert_past_marker_fields() {
        let task = task(vec![
            typed("a", "Scene", 0.0, 5.0),
            choice("a", "scene_timeline_marker_type", "Timeline/INSERT_PAST"),
            result("a", "insert_past_chapter", json!({ "number": 1 })),
            result("a", "insert_past_scene", json!({ "number": 4 })),
            result("a", "insert_past_inner_index", json!({ "number": 2 })),
        ]);
        let scene = parse_task(&task, 2, &mut SceneIdSequence::new()).scenes.remove(0);
        assert_eq!(
            scene.timeline_marker,
            Some(TimelineMarker::insert_past(Some(1), Some(4), Some(2)))
        );
    }

    #[test]
    fn past_marker_carries_extended_information() {
        let task = task(vec![
            typed("a", "Scene", 0.0, 5.0),
            choice("a", "scene_timeline_marker_type", "PAST"),
            result("a", "past_inner_index", json!({ "number": 1 })),
            result("a", "past_description", json!({ "text": ["Childhood"] })),
        ]);
        let marker = parse_task(&task, 1, &mut SceneIdSequence::new()).scenes[0]
            .timeline_marker
            .clone()
            .unwrap();
        assert_eq!(marker.kind, TimelineMarkerType::Past);
        assert_eq!(marker.inner_index, Some(1));
        assert_eq!(marker.extended_information.as_deref(), Some("Childhood"));
    }

    #[test]
    fn reference_marker_becomes_recall() {
        let task = task(vec![
            typed("a", "Scene", 0.0, 5.0),
            choice("a", "scene_timeline_marker_type", "REFERENCE"),
        ]);
        let scene = parse_task(&task, 1, &mut SceneIdSequence::new()).scenes.remove(0);
        assert_eq!(scene.timeline_marker, None);
        assert_eq!(
            scene.information_marker,
            Some(InformationMarker {
                kind: InformationMarkerType::Recall
            })
        );
    }

    #[test]
    fn highlights_do_not_consume_scene_ids() {
        let task = task(vec![
            typed("h", "Highlight", 1.0, 2.0),
            choice("h", "highlight_type", "Type/Plot_Twist"),
            result("h", "highlight_description", json!({ "text": ["Reveal"] })),
        ]);
        let mut ids = SceneIdSequence::new();
        let parsed = parse_task(&task, 1, &mut ids);
        assert_eq!(ids.issued(), 0);
        assert_eq!(parsed.highlights[0].kind.as_deref(), Some("Plot_Twist"));
        assert_eq!(parsed.highlights[0].description.as_deref(), Some("Reveal"));
        assert_eq!(parsed.highlights[0].mood, None);
    }

    #[test]
    fn cue_region_expands_per_text() {
        let task = task(vec![
            typed("c", "Narrative_Cue", 3.0, 4.0),
            result("c", "key_information_summary", json!({ "text": ["He lied", "", "She knows"] })),
            result("c", "object_name", json!({ "text": ["Ring"] })),
        ]);
        let cues = parse_task(&task, 1, &mut SceneIdSequence::new()).cues;
        let values: Vec<(NarrativeCueKind, &str)> =
            cues.iter().map(|c| (c.kind, c.value.as_str())).collect();
        assert_eq!(
            values,
            vec![
                (NarrativeCueKind::KeyInformation, "He lied"),
                (NarrativeCueKind::KeyInformation, "She knows"),
                (NarrativeCueKind::Object, "Ring"),
            ]
        );
    }
}
