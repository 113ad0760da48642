/// Render settings persisted between runs as JSON
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default configuration file, relative to the working directory.
pub const CONFIG_FILE_NAME: &str = "render_config.json";

/// Directory bare model names are resolved against.
pub const MODELS_DIR: &str = "models";

pub const DEFAULT_WIDTH: usize = 20;
pub const DEFAULT_HEIGHT: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write config {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("malformed config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("width and height must be positive integers, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("no model selected in configuration")]
    NoModel,

    #[error("model file not found: {0:?}")]
    ModelNotFound(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    pub model_file: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            model_file: String::new(),
        }
    }
}

impl RenderConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let data = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, data).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "saved config");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Path of the selected model. Bare file names live under `models_dir`;
    /// anything with a directory component is used as given.
    pub fn model_path(&self, models_dir: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
        if self.model_file.is_empty() {
            return Err(ConfigError::NoModel);
        }

        let file = Path::new(&self.model_file);
        let path = if file.components().count() > 1 || file.is_absolute() {
            file.to_path_buf()
        } else {
            models_dir.as_ref().join(file)
        };

        if !path.is_file() {
            return Err(ConfigError::ModelNotFound(path));
        }
        Ok(path)
    }
}
