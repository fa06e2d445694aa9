//! Narrative ordering of scenes (linear or multi-branch).
//!
//! The base ordering is natural scene order minus scenes marked
//! `INSERT_PAST` or `FORWARD`. `INSERT_PAST` scenes are then spliced in
//! after their target scene, sorted by
//! `(insert_chapter_id, insert_scene_id, inner_index)`. A target missing
//! from the ordering sends the scene to the end. Multi-branch timelines run
//! the same ordering independently inside each branch.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::blueprint::{Scene, TimelineMarker, TimelineMarkerType};
use crate::types::{BranchId, ChapterId, SceneId};

/// Key prefix for branch entries in the serialized timeline.
pub const BRANCH_KEY_PREFIX: &str = "BRANCH_";

// ---------------------------------------------------------------------------
// Timeline types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NarrativeTimeline {
    Linear {
        sequence: Sequence,
    },
    MultiBranch {
        branches: Branches,
        intersections: Vec<Intersection>,
    },
}

impl NarrativeTimeline {
    pub fn is_linear(&self) -> bool {
        matches!(self, Self::Linear { .. })
    }
}

/// Scene order along one narrative path.
///
/// Serializes as `{"<scene_id>": {"narrative_index": n}, ...}` with entries
/// in narrative order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence(Vec<SceneId>);

impl Sequence {
    pub fn from_order(order: Vec<SceneId>) -> Self {
        Self(order)
    }

    /// Scene ids in narrative order.
    pub fn scene_ids(&self) -> &[SceneId] {
        &self.0
    }

    /// 1-based position of `scene_id`, if it is part of the sequence.
    pub fn narrative_index(&self, scene_id: SceneId) -> Option<usize> {
        self.0.iter().position(|&id| id == scene_id).map(|i| i + 1)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Serialize, Deserialize)]
struct NarrativeIndex {
    narrative_index: usize,
}

impl Serialize for Sequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (i, id) in self.0.iter().enumerate() {
            map.serialize_entry(&id.to_string(), &NarrativeIndex { narrative_index: i + 1 })?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Sequence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SequenceVisitor;

        impl<'de> Visitor<'de> for SequenceVisitor {
            type Value = Sequence;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of scene id to narrative index")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Sequence, A::Error> {
                let mut entries: Vec<(usize, SceneId)> = Vec::new();
                while let Some((key, value)) = access.next_entry::<String, NarrativeIndex>()? {
                    let id = key.parse().map_err(|_| {
                        serde::de::Error::custom(format!("invalid scene id key '{key}'"))
                    })?;
                    entries.push((value.narrative_index, id));
                }
                entries.sort_by_key(|(index, _)| *index);
                Ok(Sequence(entries.into_iter().map(|(_, id)| id).collect()))
            }
        }

        deserializer.deserialize_map(SequenceVisitor)
    }
}

/// Per-branch timelines, keyed `BRANCH_<id>` in ascending branch id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Branches(pub BTreeMap<BranchId, BranchTimeline>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchTimeline {
    pub sequence: Sequence,
}

impl Serialize for Branches {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, branch) in &self.0 {
            map.serialize_entry(&format!("{BRANCH_KEY_PREFIX}{id}"), branch)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Branches {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, BranchTimeline>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(key, branch)| {
                key.strip_prefix(BRANCH_KEY_PREFIX)
                    .and_then(|id| id.parse::<BranchId>().ok())
                    .map(|id| (id, branch))
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid branch key '{key}'")))
            })
            .collect::<Result<_, _>>()
            .map(Branches)
    }
}

/// A scene shared between its own branch and the branches it declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intersection {
    pub scene_id: SceneId,
    pub branches: Vec<BranchId>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Build the narrative timeline for a set of scenes.
///
/// Scenes are taken in ascending id order regardless of iteration order.
/// The result is linear when every scene sits on the linear default branch.
pub fn build_narrative_timeline<'a, I>(scenes: I) -> NarrativeTimeline
where
    I: IntoIterator<Item = &'a Scene>,
{
    let mut scenes: Vec<&Scene> = scenes.into_iter().collect();
    scenes.sort_by_key(|s| s.id);

    if scenes.iter().all(|s| s.branch.is_linear()) {
        return NarrativeTimeline::Linear {
            sequence: Sequence::from_order(order_scenes(&scenes)),
        };
    }

    let mut by_branch: BTreeMap<BranchId, Vec<&Scene>> = BTreeMap::new();
    for scene in scenes.iter().copied() {
        by_branch.entry(scene.branch.id).or_default().push(scene);
    }

    let branches = by_branch
        .into_iter()
        .map(|(id, members)| {
            let sequence = Sequence::from_order(order_scenes(&members));
            (id, BranchTimeline { sequence })
        })
        .collect();

    let intersections = scenes
        .iter()
        .filter(|s| !s.branch.intersection_with.is_empty())
        .map(|s| Intersection {
            scene_id: s.id,
            branches: std::iter::once(s.branch.id)
                .chain(s.branch.intersection_with.iter().copied())
                .collect(),
        })
        .collect();

    NarrativeTimeline::MultiBranch {
        branches: Branches(branches),
        intersections,
    }
}

/// Order one path of scenes (already in natural order).
///
/// Targets are looked up in the ordering built so far, so an insert may
/// follow a previously spliced scene. Scenes spliced after the same target
/// keep their sorted order.
pub fn order_scenes(scenes: &[&Scene]) -> Vec<SceneId> {
    let mut ordering: Vec<SceneId> = scenes
        .iter()
        .filter(|s| {
            !matches!(
                s.marker_type(),
                Some(TimelineMarkerType::InsertPast | TimelineMarkerType::Forward)
            )
        })
        .map(|s| s.id)
        .collect();

    let mut inserts: Vec<(SceneId, &TimelineMarker)> = scenes
        .iter()
        .filter_map(|s| {
            s.timeline_marker
                .as_ref()
                .filter(|m| m.kind == TimelineMarkerType::InsertPast)
                .map(|m| (s.id, m))
        })
        .collect();
    inserts.sort_by_key(|(_, marker)| insertion_key(marker));

    // Number of scenes already spliced directly after each target.
    let mut spliced: HashMap<SceneId, usize> = HashMap::new();
    for (scene_id, marker) in inserts {
        let target = marker
            .insert_scene_id
            .and_then(|t| ordering.iter().position(|&id| id == t).map(|pos| (t, pos)));
        match target {
            Some((target_id, pos)) => {
                let run = spliced.entry(target_id).or_insert(0);
                ordering.insert(pos + 1 + *run, scene_id);
                *run += 1;
            }
            None => ordering.push(scene_id),
        }
    }

    ordering
}

fn insertion_key(marker: &TimelineMarker) -> (Option<ChapterId>, Option<SceneId>, Option<i64>) {
    (
        marker.insert_chapter_id,
        marker.insert_scene_id,
        marker.inner_index,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{BranchInfo, NOT_ANNOTATED};
    use assert_matches::assert_matches;
    use serde_json::json;

    fn scene(id: SceneId) -> Scene {
        Scene {
            id,
            name: format!("Scene_{id}"),
            textual: format!("Scene {id}"),
            chapter_id: 1,
            start_time: "00:00:00.000".to_string(),
            end_time: "00:00:01.000".to_string(),
            inferred_location: NOT_ANNOTATED.to_string(),
            character_dynamics: NOT_ANNOTATED.to_string(),
            mood_and_atmosphere: NOT_ANNOTATED.to_string(),
            scene_content_type: NOT_ANNOTATED.to_string(),
            branch: BranchInfo::default(),
            timeline_marker: None,
            information_marker: None,
            dialogues: vec![],
            captions: vec![],
            highlights: vec![],
            narrative_cues: vec![],
        }
    }

    fn inserted(id: SceneId, target: SceneId, inner: i64) -> Scene {
        Scene {
            timeline_marker: Some(TimelineMarker::insert_past(
                Some(1),
                Some(target),
                Some(inner),
            )),
            ..scene(id)
        }
    }

    fn marked(id: SceneId, kind: TimelineMarkerType) -> Scene {
        Scene {
            timeline_marker: Some(TimelineMarker::new(kind)),
            ..scene(id)
        }
    }

    fn on_branch(id: SceneId, branch: BranchInfo) -> Scene {
        Scene { branch, ..scene(id) }
    }

    fn linear_order(scenes: &[Scene]) -> Vec<SceneId> {
        match build_narrative_timeline(scenes) {
            NarrativeTimeline::Linear { sequence } => sequence.scene_ids().to_vec(),
            other => panic!("expected linear timeline, got {other:?}"),
        }
    }

    // -- linear ordering -----------------------------------------------------

    #[test]
    fn unmarked_scenes_keep_natural_order() {
        let scenes: Vec<Scene> = (1..=4).map(scene).collect();
        let NarrativeTimeline::Linear { sequence } = build_narrative_timeline(&scenes) else {
            panic!("expected linear timeline");
        };
        assert_eq!(sequence.scene_ids(), &[1, 2, 3, 4]);
        for id in 1..=4 {
            assert_eq!(sequence.narrative_index(id), Some(id as usize));
        }
    }

    #[test]
    fn input_order_does_not_matter() {
        let scenes = vec![scene(3), scene(1), scene(2)];
        assert_eq!(linear_order(&scenes), vec![1, 2, 3]);
    }

    #[test]
    fn insert_past_lands_immediately_after_target() {
        let scenes = vec![scene(1), inserted(2, 1, 1), scene(3)];
        assert_eq!(linear_order(&scenes), vec![1, 2, 3]);
    }

    #[test]
    fn insert_past_moves_scene_back() {
        let scenes = vec![scene(1), scene(2), inserted(3, 1, 1)];
        assert_eq!(linear_order(&scenes), vec![1, 3, 2]);
    }

    #[test]
    fn repeated_inserts_after_same_target_stay_sorted() {
        let scenes = vec![
            scene(1),
            scene(2),
            inserted(3, 1, 2),
            inserted(4, 1, 1),
            inserted(5, 1, 3),
        ];
        assert_eq!(linear_order(&scenes), vec![1, 4, 3, 5, 2]);
    }

    #[test]
    fn missing_target_appends_to_end() {
        let scenes = vec![inserted(1, 99, 1), scene(2), scene(3)];
        assert_eq!(linear_order(&scenes), vec![2, 3, 1]);
    }

    #[test]
    fn self_target_appends_to_end() {
        let scenes = vec![scene(1), inserted(2, 2, 1), scene(3)];
        assert_eq!(linear_order(&scenes), vec![1, 3, 2]);
    }

    #[test]
    fn forward_scenes_are_left_out() {
        let scenes = vec![
            marked(1, TimelineMarkerType::Start),
            marked(2, TimelineMarkerType::Forward),
            scene(3),
        ];
        assert_eq!(linear_order(&scenes), vec![1, 3]);
    }

    #[test]
    fn insert_may_target_a_spliced_scene() {
        let scenes = vec![scene(1), scene(2), inserted(3, 1, 1), inserted(4, 3, 1)];
        assert_eq!(linear_order(&scenes), vec![1, 3, 4, 2]);
    }

    #[test]
    fn markers_without_sort_keys_sort_first() {
        let mut bare = scene(4);
        bare.timeline_marker = Some(TimelineMarker::insert_past(None, Some(1), None));
        let scenes = vec![scene(1), scene(2), inserted(3, 1, 1), bare];
        assert_eq!(linear_order(&scenes), vec![1, 4, 3, 2]);
    }

    #[test]
    fn empty_scene_set_is_linear_and_empty() {
        let timeline = build_narrative_timeline(&Vec::<Scene>::new());
        assert_matches!(timeline, NarrativeTimeline::Linear { ref sequence } if sequence.is_empty());
    }

    // -- multi-branch --------------------------------------------------------

    #[test]
    fn branch_scenes_are_partitioned() {
        let scenes = vec![
            scene(1),
            on_branch(2, BranchInfo::branch(1)),
            scene(3),
            on_branch(4, BranchInfo::branch(1)),
        ];
        let NarrativeTimeline::MultiBranch {
            branches,
            intersections,
        } = build_narrative_timeline(&scenes)
        else {
            panic!("expected multi-branch timeline");
        };
        assert_eq!(branches.0[&0].sequence.scene_ids(), &[1, 3]);
        assert_eq!(branches.0[&1].sequence.scene_ids(), &[2, 4]);
        assert!(intersections.is_empty());
    }

    #[test]
    fn inserts_apply_within_each_branch() {
        let mut late = inserted(3, 1, 1);
        late.branch = BranchInfo::branch(2);
        let scenes = vec![
            on_branch(1, BranchInfo::branch(2)),
            on_branch(2, BranchInfo::branch(2)),
            late,
        ];
        let NarrativeTimeline::MultiBranch { branches, .. } = build_narrative_timeline(&scenes)
        else {
            panic!("expected multi-branch timeline");
        };
        assert_eq!(branches.0[&2].sequence.scene_ids(), &[1, 3, 2]);
    }

    #[test]
    fn intersections_are_recorded_once_per_scene() {
        let scenes = vec![
            on_branch(1, BranchInfo::branch(1)),
            on_branch(2, BranchInfo::intersection(1, 2)),
            on_branch(3, BranchInfo::branch(2)),
        ];
        let NarrativeTimeline::MultiBranch { intersections, .. } =
            build_narrative_timeline(&scenes)
        else {
            panic!("expected multi-branch timeline");
        };
        assert_eq!(
            intersections,
            vec![Intersection {
                scene_id: 2,
                branches: vec![1, 2],
            }]
        );
    }

    // -- serialization -------------------------------------------------------

    #[test]
    fn linear_sequence_serializes_in_narrative_order() {
        let scenes = vec![scene(1), scene(2), inserted(3, 1, 1)];
        let text = serde_json::to_string(&build_narrative_timeline(&scenes)).unwrap();
        assert_eq!(
            text,
            r#"{"type":"linear","sequence":{"1":{"narrative_index":1},"3":{"narrative_index":2},"2":{"narrative_index":3}}}"#
        );
    }

    #[test]
    fn multi_branch_serializes_branch_keys() {
        let scenes = vec![scene(1), on_branch(2, BranchInfo::intersection(1, 0))];
        let value = serde_json::to_value(build_narrative_timeline(&scenes)).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "multi_branch",
                "branches": {
                    "BRANCH_0": {"sequence": {"1": {"narrative_index": 1}}},
                    "BRANCH_1": {"sequence": {"2": {"narrative_index": 1}}}
                },
                "intersections": [{"scene_id": 2, "branches": [1, 0]}]
            })
        );
    }

    #[test]
    fn timeline_deserializes_back() {
        let scenes = vec![
            scene(1),
            on_branch(2, BranchInfo::branch(3)),
            inserted(3, 1, 1),
        ];
        let timeline = build_narrative_timeline(&scenes);
        let text = serde_json::to_string(&timeline).unwrap();
        let back: NarrativeTimeline = serde_json::from_str(&text).unwrap();
        assert_eq!(back, timeline);
    }

    #[test]
    fn bad_branch_key_is_rejected() {
        let value = json!({
            "type": "multi_branch",
            "branches": {"MAIN": {"sequence": {}}},
            "intersections": []
        });
        assert!(serde_json::from_value::<NarrativeTimeline>(value).is_err());
    }
}
