//! `storyline-worker` -- batch blueprint builder.
//!
//! Fuses an annotation export with a directory of per-episode subtitle
//! tracks and writes the blueprint, its validation report and a speaker
//! report to the output directory.
//!
//! # Environment variables
//!
//! | Variable                 | Required | Default                 | Description                        |
//! |--------------------------|----------|-------------------------|------------------------------------|
//! | `STORYLINE_EXPORT_PATH`  | yes      | --                      | Annotation export JSON             |
//! | `STORYLINE_SUBTITLE_DIR` | yes      | --                      | Directory of `NN.ass` tracks       |
//! | `STORYLINE_PROJECT_NAME` | no       | subtitle directory name | Project name in metadata           |
//! | `STORYLINE_LANGUAGE`     | no       | `zh-CN`                 | Blueprint language (lexicon)       |
//! | `STORYLINE_OUTPUT_DIR`   | no       | `.`                     | Where output files are written     |

use anyhow::Context;
use storyline_worker::config::WorkerConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storyline_worker=info,storyline_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env().context("Invalid worker configuration")?;

    tracing::info!(
        export = %config.export_path.display(),
        subtitles = %config.subtitle_dir.display(),
        project = %config.project_name,
        language = %config.language,
        "Starting storyline-worker",
    );

    storyline_worker::run(&config)?;
    Ok(())
}
