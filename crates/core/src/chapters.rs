//! Chapter grouping and project metadata derived from assembled scenes.

use std::collections::BTreeMap;

use crate::blueprint::{Chapter, ProjectMetadata, Scene, SCHEMA_VERSION};
use crate::error::CoreError;
use crate::types::{ChapterId, Timestamp};

/// Subtitle file name for a chapter, zero-padded to two digits (`03.ass`).
pub fn chapter_source_file(chapter_id: ChapterId) -> String {
    format!("{chapter_id:02}.ass")
}

/// Group scenes into chapters, ascending by chapter id.
///
/// Each chapter lists its scene ids in ascending order.
pub fn build_chapters<'a, I>(scenes: I) -> BTreeMap<ChapterId, Chapter>
where
    I: IntoIterator<Item = &'a Scene>,
{
    let mut chapters: BTreeMap<ChapterId, Chapter> = BTreeMap::new();
    for scene in scenes {
        chapters
            .entry(scene.chapter_id)
            .or_insert_with(|| Chapter {
                id: scene.chapter_id,
                name: format!("Chapter_{}", scene.chapter_id),
                textual: format!("Chapter {}", scene.chapter_id),
                source_file: chapter_source_file(scene.chapter_id),
                scene_ids: Vec::new(),
            })
            .scene_ids
            .push(scene.id);
    }
    for chapter in chapters.values_mut() {
        chapter.scene_ids.sort_unstable();
    }
    chapters
}

/// Build the metadata block. The project name must not be blank.
pub fn build_project_metadata(
    project_name: &str,
    language: &str,
    total_chapters: usize,
    total_scenes: usize,
    generated_at: Timestamp,
) -> Result<ProjectMetadata, CoreError> {
    if project_name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Project name must not be empty".to_string(),
        ));
    }
    Ok(ProjectMetadata {
        project_name: project_name.to_string(),
        total_chapters,
        total_scenes,
        version: SCHEMA_VERSION.to_string(),
        language: language.to_string(),
        generation_date: generated_at,
    })
}
