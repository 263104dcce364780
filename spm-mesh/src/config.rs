//! Loader configuration (spm.toml)
//!
//! Controls where texture names from a mesh's material table are looked
//! up. Stored as TOML; every field has a default so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Error loading a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loader configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LoaderConfig {
    /// Texture lookup settings
    #[serde(default)]
    pub textures: TextureConfig,
}

/// Texture lookup settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureConfig {
    /// Extra directories searched for texture files, in order
    #[serde(default)]
    pub search_dirs: Vec<PathBuf>,
    /// Look next to the mesh file first (default: true)
    #[serde(default = "default_true")]
    pub relative_to_mesh: bool,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            search_dirs: Vec::new(),
            relative_to_mesh: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl LoaderConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
