//! Task to chapter resolution.
//!
//! The builder never derives file locations on its own. Callers inject a
//! [`MappingProvider`]; a task it cannot resolve is skipped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use storyline_core::chapters::chapter_source_file;
use storyline_core::types::ChapterId;

use crate::export::{AnnotationTask, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterMapping {
    pub chapter_id: ChapterId,
    pub subtitle_path: PathBuf,
}

pub trait MappingProvider {
    fn resolve(&self, task_id: TaskId) -> Option<ChapterMapping>;
}

impl<F> MappingProvider for F
where
    F: Fn(TaskId) -> Option<ChapterMapping>,
{
    fn resolve(&self, task_id: TaskId) -> Option<ChapterMapping> {
        self(task_id)
    }
}

/// An explicit task table.
#[derive(Debug, Clone, Default)]
pub struct StaticMapping {
    entries: HashMap<TaskId, ChapterMapping>,
}

impl StaticMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, task_id: TaskId, chapter_id: ChapterId, path: impl Into<PathBuf>) -> Self {
        self.insert(task_id, chapter_id, path);
        self
    }

    pub fn insert(&mut self, task_id: TaskId, chapter_id: ChapterId, path: impl Into<PathBuf>) {
        self.entries.insert(
            task_id,
            ChapterMapping {
                chapter_id,
                subtitle_path: path.into(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MappingProvider for StaticMapping {
    fn resolve(&self, task_id: TaskId) -> Option<ChapterMapping> {
        self.entries.get(&task_id).cloned()
    }
}

/// Maps each task to `<dir>/<NN>.ass` using the episode number in its
/// upload name. Tasks without one stay unmapped.
#[derive(Debug, Clone)]
pub struct EpisodeDirectoryMapping {
    dir: PathBuf,
    chapters: HashMap<TaskId, ChapterId>,
}

impl EpisodeDirectoryMapping {
    pub fn from_tasks(tasks: &[AnnotationTask], dir: impl Into<PathBuf>) -> Self {
        let chapters = tasks
            .iter()
            .filter_map(|task| Some((task.id, task.chapter_number()?)))
            .collect();
        Self {
            dir: dir.into(),
            chapters,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn subtitle_path(&self, chapter_id: ChapterId) -> PathBuf {
        self.dir.join(chapter_source_file(chapter_id))
    }
}

impl MappingProvider for EpisodeDirectoryMapping {
    fn resolve(&self, task_id: TaskId) -> Option<ChapterMapping> {
        let chapter_id = *self.chapters.get(&task_id)?;
        Some(ChapterMapping {
            chapter_id,
            subtitle_path: self.subtitle_path(chapter_id),
        })
    }
}
