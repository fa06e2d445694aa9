//! Blueprint builder: the whole ingestion pass for one project.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::Utc;
use storyline_core::blueprint::Blueprint;
use storyline_core::types::Timestamp;

use crate::assembler::SceneAssembler;
use crate::error::PipelineResult;
use crate::export::AnnotationTask;
use crate::mapping::MappingProvider;
use crate::regions::{parse_task, DraftScene, SceneIdSequence};
use crate::subtitle::{load_subtitle_track, SubtitleTrack};

pub struct BlueprintBuilder<'a> {
    project_name: String,
    language: String,
    mapping: &'a dyn MappingProvider,
}

impl<'a> BlueprintBuilder<'a> {
    pub fn new(
        project_name: impl Into<String>,
        language: impl Into<String>,
        mapping: &'a dyn MappingProvider,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            language: language.into(),
            mapping,
        }
    }

    pub fn build(&self, tasks: &[AnnotationTask]) -> PipelineResult<Blueprint> {
        self.build_at(tasks, Utc::now())
    }

    /// Build with an explicit generation timestamp.
    ///
    /// Tasks run in ascending `inner_id` order so scene ids are global and
    /// stable. Unmapped tasks are skipped; a mapped task whose subtitle
    /// track is missing aborts the build.
    pub fn build_at(
        &self,
        tasks: &[AnnotationTask],
        generated_at: Timestamp,
    ) -> PipelineResult<Blueprint> {
        let mut ordered: Vec<&AnnotationTask> = tasks.iter().collect();
        ordered.sort_by_key(|task| task.inner_id.unwrap_or(0));

        let mut ids = SceneIdSequence::new();
        let mut tracks: HashMap<PathBuf, SubtitleTrack> = HashMap::new();
        let mut drafts: Vec<(DraftScene, PathBuf)> = Vec::new();
        let mut highlights = Vec::new();
        let mut cues = Vec::new();
        let mut skipped = 0usize;

        for task in ordered {
            let Some(mapping) = self.mapping.resolve(task.id) else {
                tracing::warn!(task_id = task.id, "No chapter mapping for task, skipping");
                skipped += 1;
                continue;
            };

            if !tracks.contains_key(&mapping.subtitle_path) {
                let track = load_subtitle_track(&mapping.subtitle_path, mapping.chapter_id)?;
                tracks.insert(mapping.subtitle_path.clone(), track);
            }

            let parsed = parse_task(task, mapping.chapter_id, &mut ids);
            tracing::debug!(
                task_id = task.id,
                chapter_id = mapping.chapter_id,
                scenes = parsed.scenes.len(),
                highlights = parsed.highlights.len(),
                cues = parsed.cues.len(),
                "Parsed annotation task",
            );

            drafts.extend(
                parsed
                    .scenes
                    .into_iter()
                    .map(|scene| (scene, mapping.subtitle_path.clone())),
            );
            highlights.extend(parsed.highlights);
            cues.extend(parsed.cues);
        }

        let assembler = SceneAssembler::new(&highlights, &cues);
        let empty = SubtitleTrack::default();
        let scenes = drafts
            .iter()
            .map(|(draft, path)| assembler.assemble(draft, tracks.get(path).unwrap_or(&empty)))
            .collect::<Result<Vec<_>, _>>()?;

        let blueprint =
            Blueprint::assemble(&self.project_name, &self.language, scenes, generated_at)?;

        tracing::info!(
            project = %self.project_name,
            chapters = blueprint.chapters.len(),
            scenes = blueprint.scenes.len(),
            skipped_tasks = skipped,
            linear = blueprint.narrative_timeline.is_linear(),
            "Blueprint built",
        );
        Ok(blueprint)
    }
}
