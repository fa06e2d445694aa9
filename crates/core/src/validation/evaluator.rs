//! Blueprint evaluator. Pure logic, no I/O.
//!
//! Every rule family runs on every call; a structural finding never hides a
//! vocabulary or timeline finding. The input document is only read.

use serde_json::{Map, Value};

use super::lexicon::{Lexicon, Vocabulary};
use super::rules::{
    Rule, ValidationError, ValidationReport, REQUIRED_DIALOGUE_KEYS, REQUIRED_SCENE_KEYS,
    REQUIRED_TOP_LEVEL_KEYS,
};
use crate::blueprint::{Blueprint, TimelineMarkerType};
use crate::error::CoreError;
use crate::time::canonical_to_seconds;
use crate::types::{SceneId, Timestamp};

/// Nested event lists whose spans are checked for consistency.
const EVENT_LISTS: &[&str] = &["dialogues", "captions", "highlights", "narrative_cues"];

/// Validate a typed blueprint.
///
/// Fails only when the blueprint cannot be serialized; every rule violation
/// is a finding in the returned report.
pub fn validate_blueprint(
    blueprint: &Blueprint,
    validated_at: Timestamp,
) -> Result<ValidationReport, CoreError> {
    let document = serde_json::to_value(blueprint)?;
    Ok(validate_document(&document, validated_at))
}

/// Validate a blueprint document in its serialized JSON form.
pub fn validate_document(document: &Value, validated_at: Timestamp) -> ValidationReport {
    let scenes = collect_scenes(document);
    let mut errors = Vec::new();

    check_structure(document, &scenes, &mut errors);
    check_vocabulary(document, &scenes, &mut errors);
    check_timeline(document, &scenes, &mut errors);

    ValidationReport {
        validation_time: validated_at,
        errors,
    }
}

// ---------------------------------------------------------------------------
// Scene access
// ---------------------------------------------------------------------------

struct SceneEntry<'a> {
    id: Option<SceneId>,
    key: &'a str,
    body: Option<&'a Map<String, Value>>,
}

impl SceneEntry<'_> {
    fn field(&self, name: &str) -> Option<&Value> {
        self.body.and_then(|body| body.get(name))
    }

    fn marker_type(&self) -> Option<TimelineMarkerType> {
        self.field("timeline_marker")
            .and_then(|marker| marker.get("type"))
            .and_then(Value::as_str)
            .and_then(TimelineMarkerType::from_label)
    }
}

/// Scenes in ascending id order. The `id` field wins over the map key.
fn collect_scenes(document: &Value) -> Vec<SceneEntry<'_>> {
    let Some(scenes) = document.get("scenes").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut entries: Vec<SceneEntry<'_>> = scenes
        .iter()
        .map(|(key, value)| {
            let body = value.as_object();
            let id = body
                .and_then(|b| b.get("id"))
                .and_then(Value::as_u64)
                .and_then(|id| SceneId::try_from(id).ok())
                .or_else(|| key.parse().ok());
            SceneEntry {
                id,
                key: key.as_str(),
                body,
            }
        })
        .collect();
    entries.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.key.cmp(b.key)));
    entries
}

fn push(errors: &mut Vec<ValidationError>, scene_id: Option<SceneId>, rule: Rule, details: String) {
    errors.push(ValidationError {
        scene_id,
        rule_violated: rule,
        error_details: details,
    });
}

// ---------------------------------------------------------------------------
// Structural rules
// ---------------------------------------------------------------------------

fn check_structure(document: &Value, scenes: &[SceneEntry<'_>], errors: &mut Vec<ValidationError>) {
    for key in REQUIRED_TOP_LEVEL_KEYS {
        if document.get(key).is_none() {
            push(
                errors,
                None,
                Rule::MissingTopLevelKey,
                format!("Missing top-level key '{key}'"),
            );
        }
    }

    for scene in scenes {
        let Some(body) = scene.body else {
            push(
                errors,
                scene.id,
                Rule::MissingSceneKey,
                format!("Scene '{}' is not an object", scene.key),
            );
            continue;
        };

        for key in REQUIRED_SCENE_KEYS {
            if !body.contains_key(*key) {
                push(
                    errors,
                    scene.id,
                    Rule::MissingSceneKey,
                    format!("Scene is missing key '{key}'"),
                );
            }
        }

        let Some(dialogues) = body.get("dialogues").and_then(Value::as_array) else {
            continue;
        };
        for (index, line) in dialogues.iter().enumerate() {
            for key in REQUIRED_DIALOGUE_KEYS {
                if line.get(key).is_none() {
                    push(
                        errors,
                        scene.id,
                        Rule::MissingDialogueKey,
                        format!("Dialogue #{index} is missing key '{key}'"),
                    );
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Vocabulary rules
// ---------------------------------------------------------------------------

fn check_vocabulary(
    document: &Value,
    scenes: &[SceneEntry<'_>],
    errors: &mut Vec<ValidationError>,
) {
    let language = document
        .get("project_metadata")
        .and_then(|meta| meta.get("language"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let lexicon = Lexicon::for_language(language);

    for scene in scenes {
        // Absent scene fields are structural findings, not vocabulary ones.
        if let Some(value) = scene.field("mood_and_atmosphere") {
            check_term(&lexicon, Vocabulary::SceneMood, value, scene.id, "", errors);
        }
        if let Some(value) = scene.field("scene_content_type") {
            check_term(&lexicon, Vocabulary::SceneContentType, value, scene.id, "", errors);
        }

        let highlights = scene
            .field("highlights")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for (index, highlight) in highlights.iter().enumerate() {
            let context = format!(" on highlight #{index}");
            let kind = highlight.get("type").unwrap_or(&Value::Null);
            check_term(&lexicon, Vocabulary::HighlightType, kind, scene.id, &context, errors);
            let mood = highlight.get("mood").unwrap_or(&Value::Null);
            check_term(&lexicon, Vocabulary::HighlightMood, mood, scene.id, &context, errors);
        }
    }
}

fn check_term(
    lexicon: &Lexicon,
    vocabulary: Vocabulary,
    value: &Value,
    scene_id: Option<SceneId>,
    context: &str,
    errors: &mut Vec<ValidationError>,
) {
    match value.as_str() {
        Some(term) if lexicon.allows(vocabulary, term) => {}
        Some(term) => push(
            errors,
            scene_id,
            vocabulary.rule(),
            format!("Invalid {} '{term}'{context}", vocabulary.label()),
        ),
        None => push(
            errors,
            scene_id,
            vocabulary.rule(),
            format!("Invalid {} {value}{context}", vocabulary.label()),
        ),
    }
}

// ---------------------------------------------------------------------------
// Timeline rules
// ---------------------------------------------------------------------------

fn check_timeline(document: &Value, scenes: &[SceneEntry<'_>], errors: &mut Vec<ValidationError>) {
    for scene in scenes {
        check_span(scene.field("start_time"), scene.field("end_time"), scene.id, "Scene", errors);

        for list in EVENT_LISTS {
            let events = scene
                .field(list)
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for (index, event) in events.iter().enumerate() {
                let label = format!("{list} #{index}");
                check_span(
                    event.get("start_time"),
                    event.get("end_time"),
                    scene.id,
                    &label,
                    errors,
                );
            }
        }
    }

    let is_linear = document
        .get("narrative_timeline")
        .and_then(|timeline| timeline.get("type"))
        .and_then(Value::as_str)
        == Some("linear");
    if is_linear {
        check_start_markers(scenes, errors);
    }

    check_insert_markers(scenes, errors);
}

/// Checks one start/end pair. Absent fields are skipped.
fn check_span(
    start: Option<&Value>,
    end: Option<&Value>,
    scene_id: Option<SceneId>,
    label: &str,
    errors: &mut Vec<ValidationError>,
) {
    let (Some(start), Some(end)) = (start, end) else {
        return;
    };

    let mut parse = |value: &Value, which: &str| -> Option<f64> {
        let parsed = value.as_str().map(canonical_to_seconds);
        match parsed {
            Some(Ok(seconds)) if seconds < 0.0 => {
                push(
                    errors,
                    scene_id,
                    Rule::InconsistentTimeline,
                    format!("{label} has negative {which} time {value}"),
                );
                None
            }
            Some(Ok(seconds)) => Some(seconds),
            _ => {
                push(
                    errors,
                    scene_id,
                    Rule::InconsistentTimeline,
                    format!("{label} has unreadable {which} time {value}"),
                );
                None
            }
        }
    };

    let start_seconds = parse(start, "start");
    let end_seconds = parse(end, "end");
    if let (Some(s), Some(e)) = (start_seconds, end_seconds) {
        if s > e {
            push(
                errors,
                scene_id,
                Rule::InconsistentTimeline,
                format!("{label} starts at {start} after it ends at {end}"),
            );
        }
    }
}

fn check_start_markers(scenes: &[SceneEntry<'_>], errors: &mut Vec<ValidationError>) {
    let starts: Vec<&SceneEntry<'_>> = scenes
        .iter()
        .filter(|scene| scene.marker_type() == Some(TimelineMarkerType::Start))
        .collect();

    match starts.split_first() {
        None => push(
            errors,
            None,
            Rule::MissingStartMarker,
            "Linear timeline has no scene marked START".to_string(),
        ),
        Some((first, rest)) => {
            for duplicate in rest {
                push(
                    errors,
                    duplicate.id,
                    Rule::DuplicateStartMarker,
                    format!(
                        "Scene is marked START but scene {} already is",
                        display_id(first.id)
                    ),
                );
            }
        }
    }
}

fn check_insert_markers(scenes: &[SceneEntry<'_>], errors: &mut Vec<ValidationError>) {
    for scene in scenes {
        if scene.marker_type() != Some(TimelineMarkerType::InsertPast) {
            continue;
        }
        let target = scene
            .field("timeline_marker")
            .and_then(|marker| marker.get("insert_scene_id"))
            .and_then(Value::as_u64)
            .and_then(|id| SceneId::try_from(id).ok());
        let Some(target) = target else {
            continue;
        };

        if Some(target) == scene.id {
            push(
                errors,
                scene.id,
                Rule::InsertPastSelfReference,
                "INSERT_PAST marker targets its own scene".to_string(),
            );
            continue;
        }

        let target_is_insert = scenes
            .iter()
            .find(|other| other.id == Some(target))
            .is_some_and(|other| other.marker_type() == Some(TimelineMarkerType::InsertPast));
        if target_is_insert {
            push(
                errors,
                scene.id,
                Rule::InsertPastChain,
                format!("INSERT_PAST marker targets scene {target}, which is itself INSERT_PAST"),
            );
        }
    }
}

fn display_id(id: Option<SceneId>) -> String {
    id.map(|id| id.to_string())
        .unwrap_or_else(|| "?".to_string())
}
