//! `storyline-worker` library crate.
//!
//! Runs one batch build: export + subtitle directory in, blueprint,
//! validation report and speaker report out. The binary entrypoint lives
//! in `main.rs`; [`run`] is exposed for integration testing.

pub mod config;

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use storyline_core::stats::speaker_report;
use storyline_core::validation::validate_blueprint;
use storyline_pipeline::export::load_export;
use storyline_pipeline::mapping::EpisodeDirectoryMapping;
use storyline_pipeline::BlueprintBuilder;

use crate::config::WorkerConfig;

pub const BLUEPRINT_FILE: &str = "blueprint.json";
pub const VALIDATION_REPORT_FILE: &str = "validation_report.json";
pub const SPEAKER_REPORT_FILE: &str = "speaker_report.json";

/// What a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub blueprint_path: PathBuf,
    pub validation_report_path: PathBuf,
    pub speaker_report_path: PathBuf,
    pub chapters: usize,
    pub scenes: usize,
    pub findings: usize,
}

pub fn run(config: &WorkerConfig) -> anyhow::Result<RunSummary> {
    let tasks = load_export(&config.export_path)?;
    let mapping = EpisodeDirectoryMapping::from_tasks(&tasks, &config.subtitle_dir);
    let blueprint = BlueprintBuilder::new(&config.project_name, &config.language, &mapping)
        .build(&tasks)
        .context("Failed to build blueprint")?;

    let report =
        validate_blueprint(&blueprint, Utc::now()).context("Failed to validate blueprint")?;
    if !report.is_clean() {
        tracing::warn!(
            findings = report.errors.len(),
            "Blueprint has validation findings",
        );
    }
    let speakers = speaker_report(&blueprint);

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    let summary = RunSummary {
        blueprint_path: config.output_dir.join(BLUEPRINT_FILE),
        validation_report_path: config.output_dir.join(VALIDATION_REPORT_FILE),
        speaker_report_path: config.output_dir.join(SPEAKER_REPORT_FILE),
        chapters: blueprint.chapters.len(),
        scenes: blueprint.scenes.len(),
        findings: report.errors.len(),
    };
    write_json(&summary.blueprint_path, &blueprint)?;
    write_json(&summary.validation_report_path, &report)?;
    write_json(&summary.speaker_report_path, &speakers)?;

    tracing::info!(
        output_dir = %config.output_dir.display(),
        scenes = summary.scenes,
        findings = summary.findings,
        "Run complete",
    );
    Ok(summary)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}
