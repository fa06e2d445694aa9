use std::path::PathBuf;

/// Default blueprint language.
pub const DEFAULT_LANGUAGE: &str = "zh-CN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Batch run configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Annotation export JSON.
    pub export_path: PathBuf,
    /// Directory holding one `NN.ass` track per chapter.
    pub subtitle_dir: PathBuf,
    pub project_name: String,
    pub language: String,
    pub output_dir: PathBuf,
}

impl WorkerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                  | Default                   |
    /// |--------------------------|---------------------------|
    /// | `STORYLINE_EXPORT_PATH`  | required                  |
    /// | `STORYLINE_SUBTITLE_DIR` | required                  |
    /// | `STORYLINE_PROJECT_NAME` | subtitle directory name   |
    /// | `STORYLINE_LANGUAGE`     | `zh-CN`                   |
    /// | `STORYLINE_OUTPUT_DIR`   | `.`                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let export_path: PathBuf = get("STORYLINE_EXPORT_PATH")
            .ok_or(ConfigError::Missing("STORYLINE_EXPORT_PATH"))?
            .into();
        let subtitle_dir: PathBuf = get("STORYLINE_SUBTITLE_DIR")
            .ok_or(ConfigError::Missing("STORYLINE_SUBTITLE_DIR"))?
            .into();

        let project_name = match get("STORYLINE_PROJECT_NAME") {
            Some(name) => name,
            None => subtitle_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| ConfigError::Invalid {
                    name: "STORYLINE_SUBTITLE_DIR",
                    reason: "cannot derive a project name from it".to_string(),
                })?,
        };

        let language = get("STORYLINE_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.into());
        let output_dir = get("STORYLINE_OUTPUT_DIR")
            .unwrap_or_else(|| ".".into())
            .into();

        Ok(Self {
            export_path,
            subtitle_dir,
            project_name,
            language,
            output_dir,
        })
    }
}
