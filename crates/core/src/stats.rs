//! Per-speaker dialogue statistics (character audit).
//!
//! Only `dialogues` are counted. Caption lines never contribute.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::blueprint::Blueprint;
use crate::types::SceneId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerStats {
    pub speaker: String,
    pub line_count: usize,
    pub scene_count: usize,
    pub first_scene_id: SceneId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerReport {
    pub project_name: String,
    pub total_dialogue_lines: usize,
    /// Sorted by line count (descending), then speaker name.
    pub speakers: Vec<SpeakerStats>,
}

pub fn speaker_report(blueprint: &Blueprint) -> SpeakerReport {
    let mut lines: HashMap<&str, usize> = HashMap::new();
    let mut scenes: HashMap<&str, BTreeSet<SceneId>> = HashMap::new();

    for scene in blueprint.scenes.values() {
        for line in &scene.dialogues {
            *lines.entry(line.speaker.as_str()).or_default() += 1;
            scenes.entry(line.speaker.as_str()).or_default().insert(scene.id);
        }
    }

    let mut speakers: Vec<SpeakerStats> = scenes
        .into_iter()
        .filter_map(|(speaker, scene_ids)| {
            Some(SpeakerStats {
                speaker: speaker.to_string(),
                line_count: lines.get(speaker).copied().unwrap_or(0),
                scene_count: scene_ids.len(),
                first_scene_id: *scene_ids.first()?,
            })
        })
        .collect();
    speakers.sort_by(|a, b| {
        b.line_count
            .cmp(&a.line_count)
            .then_with(|| a.speaker.cmp(&b.speaker))
    });

    SpeakerReport {
        project_name: blueprint.project_metadata.project_name.clone(),
        total_dialogue_lines: speakers.iter().map(|s| s.line_count).sum(),
        speakers,
    }
}
