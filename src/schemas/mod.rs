use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::core::config::ConfigError;

pub(crate) mod evaluation;
pub(crate) mod roster;
pub(crate) mod rubric;

fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|err| ConfigError::InvalidFile {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;

    serde_json::from_str(&raw).map_err(|err| ConfigError::InvalidFile {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}
