use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::detect::{OverlayStyle, ParamsError, TargetParams};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Params(#[from] ParamsError),
}

/// Contents of a `--config` JSON file.
///
/// Detection parameters sit at the top level; an optional `overlay` object
/// tweaks the drawing style. Missing keys keep their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    #[serde(flatten)]
    pub params: TargetParams,
    pub overlay: OverlayStyle,
}

impl RunConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = serde_json::from_str(text)?;
        config.params.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }
}
