//! Configuration types for the physics pipeline
//!
//! A scene carries its pipeline as a `physics` section:
//!
//! ```json
//! { "physics": { "fixedTimestep": 0.0166,
//!                "stages": [ { "name": "gravityStage", "config": { "gravity": [0, -9.8, 0] } },
//!                            { "name": "collisionStage" } ] } }
//! ```

use crate::physics::stages::GravityStage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while reading a scene configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error when reading the file
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// JSON syntax or shape error
    #[error("invalid scene configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// One named stage and its config object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEntry {
    /// Name the stage is registered under
    pub name: String,
    /// Stage specific settings, `null` when absent
    #[serde(default)]
    pub config: Value,
}

impl StageEntry {
    /// Entry for a stage with default settings
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: Value::Null,
        }
    }

    pub fn with_config(name: impl Into<String>, config: Value) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

fn default_fixed_timestep() -> f32 {
    1.0 / 60.0
}

/// Physics section of a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsConfig {
    /// Stages in execution order
    #[serde(default)]
    pub stages: Vec<StageEntry>,
    /// Length of one tick in seconds
    #[serde(default = "default_fixed_timestep")]
    pub fixed_timestep: f32,
}

impl Default for PhysicsConfig {
    /// Gravity with ground contact at 60 Hz
    fn default() -> Self {
        Self {
            stages: vec![StageEntry::named(GravityStage::NAME)],
            fixed_timestep: default_fixed_timestep(),
        }
    }
}

/// Scene document as far as the physics pipeline is concerned; other sections
/// are ignored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicsSceneConfig {
    #[serde(default)]
    pub physics: PhysicsConfig,
}

impl PhysicsSceneConfig {
    /// Parse a scene document from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        debug!(stages = config.physics.stages.len(), "Parsed scene configuration");
        Ok(config)
    }

    /// Load a scene document from a file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = ?path, "Loading scene configuration");
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_stage_list() {
        let config = PhysicsSceneConfig::from_json_str(
            r#"{
                "physics": {
                    "stages": [
                        { "name": "gravityStage", "config": { "gravity": [0, -1.62, 0] } },
                        { "name": "collisionStage" }
                    ]
                },
                "entities": []
            }"#,
        )
        .unwrap();

        let stages = &config.physics.stages;
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].name, "gravityStage");
        assert_eq!(stages[0].config, json!({ "gravity": [0, -1.62, 0] }));
        assert_eq!(stages[1].config, Value::Null);
        assert!((config.physics.fixed_timestep - 1.0 / 60.0).abs() < 1e-7);
    }

    #[test]
    fn test_missing_physics_section_uses_default_pipeline() {
        let config = PhysicsSceneConfig::from_json_str("{}").unwrap();
        assert_eq!(config.physics, PhysicsConfig::default());
        assert_eq!(config.physics.stages[0].name, "gravityStage");
    }

    #[test]
    fn test_empty_stage_list_is_kept() {
        let config = PhysicsSceneConfig::from_json_str(r#"{ "physics": { "fixedTimestep": 0.01 } }"#)
            .unwrap();
        assert!(config.physics.stages.is_empty());
        assert_eq!(config.physics.fixed_timestep, 0.01);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let err = PhysicsSceneConfig::from_json_str(r#"{ "physics": { "stages": 3 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = PhysicsSceneConfig::load_from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
