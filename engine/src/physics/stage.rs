//! Pluggable physics stages and the name-to-constructor registry
//!
//! A stage is a unit of work run once per fixed tick over the whole world.
//! Scene configuration refers to stages by name; [`StageRegistry`] turns
//! those names into boxed stage instances.

use crate::core::entity::World;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use super::stages::{CollisionStage, GravityStage, SolarStage};

/// Errors raised while building the stage pipeline
#[derive(Debug, Error)]
pub enum StageError {
    /// A stage config field had the wrong type or shape
    #[error("invalid configuration for stage `{stage}`: {source}")]
    InvalidConfig {
        stage: String,
        #[source]
        source: serde_json::Error,
    },
    /// A stage config field parsed but holds a value the stage cannot run with
    #[error("configuration field `{field}` of stage `{stage}` must be {expected}, got {value}")]
    OutOfRange {
        stage: String,
        field: &'static str,
        expected: &'static str,
        value: f32,
    },
    /// The pipeline was asked to tick by a non-positive or non-finite step
    #[error("fixed timestep must be positive and finite, got {0}")]
    InvalidTimestep(f32),
}

/// Reject negative (or NaN) coefficients such as friction or restitution
pub fn require_non_negative(stage: &str, field: &'static str, value: f32) -> Result<(), StageError> {
    if value >= 0.0 {
        return Ok(());
    }
    Err(StageError::OutOfRange {
        stage: stage.to_string(),
        field,
        expected: "non-negative",
        value,
    })
}

/// One unit of per-tick physics work
pub trait PhysicsStage: Send {
    /// Name the stage is registered under
    fn name(&self) -> &str;

    /// Apply the stage's JSON config object. Called once, before the first tick.
    fn initialize(&mut self, config: &Value) -> Result<(), StageError>;

    /// Run one fixed tick
    fn execute(&mut self, world: &mut World, fixed_delta_time: f32);
}

/// Deserialize a stage config, falling back to defaults for a missing object.
///
/// Unknown fields are ignored and absent ones take their default; only
/// malformed values are an error.
pub fn parse_stage_config<T>(stage: &str, config: &Value) -> Result<T, StageError>
where
    T: DeserializeOwned + Default,
{
    if config.is_null() {
        return Ok(T::default());
    }
    T::deserialize(config).map_err(|source| StageError::InvalidConfig {
        stage: stage.to_string(),
        source,
    })
}

type StageConstructor = Box<dyn Fn() -> Box<dyn PhysicsStage> + Send + Sync>;

/// Maps stage names to constructors
#[derive(Default)]
pub struct StageRegistry {
    constructors: HashMap<String, StageConstructor>,
}

impl StageRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `gravityStage`, `collisionStage` and `solarStage`
    pub fn with_builtin_stages() -> Self {
        let mut registry = Self::new();
        registry.register(GravityStage::NAME, || Box::new(GravityStage::default()));
        registry.register(CollisionStage::NAME, || Box::new(CollisionStage::default()));
        registry.register(SolarStage::NAME, || Box::new(SolarStage::default()));
        registry
    }

    /// Register a constructor, replacing any previous one under the same name
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn PhysicsStage> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Box::new(constructor));
    }

    /// Build a fresh, uninitialized stage
    pub fn create(&self, name: &str) -> Option<Box<dyn PhysicsStage>> {
        self.constructors.get(name).map(|constructor| constructor())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageRegistry")
            .field("stages", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_negative_coefficient_is_out_of_range() {
        assert!(require_non_negative("gravityStage", "mu", 0.0).is_ok());
        let err = require_non_negative("gravityStage", "mu", -0.1).unwrap_err();
        assert!(matches!(err, StageError::OutOfRange { field: "mu", .. }));
        assert!(err.to_string().contains("gravityStage"));
        assert!(require_non_negative("gravityStage", "mu", f32::NAN).is_err());
    }

    struct CountingStage {
        ticks: u32,
    }

    impl PhysicsStage for CountingStage {
        fn name(&self) -> &str {
            "countingStage"
        }

        fn initialize(&mut self, _config: &Value) -> Result<(), StageError> {
            Ok(())
        }

        fn execute(&mut self, _world: &mut World, _fixed_delta_time: f32) {
            self.ticks += 1;
        }
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct SampleConfig {
        strength: f32,
    }

    #[test]
    fn test_builtin_names() {
        let registry = StageRegistry::with_builtin_stages();
        assert_eq!(
            registry.names(),
            vec!["collisionStage", "gravityStage", "solarStage"]
        );
        let stage = registry.create("gravityStage").unwrap();
        assert_eq!(stage.name(), "gravityStage");
    }

    #[test]
    fn test_unknown_name_creates_nothing() {
        let registry = StageRegistry::with_builtin_stages();
        assert!(registry.create("windStage").is_none());
        assert!(!registry.contains("windStage"));
    }

    #[test]
    fn test_custom_stage_registration() {
        let mut registry = StageRegistry::new();
        assert!(registry.is_empty());
        registry.register("countingStage", || Box::new(CountingStage { ticks: 0 }));

        let mut stage = registry.create("countingStage").unwrap();
        let mut world = World::new();
        stage.execute(&mut world, 0.1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_parse_stage_config() {
        let parsed: SampleConfig =
            parse_stage_config("sample", &json!({ "strength": 2.5, "extra": true })).unwrap();
        assert_eq!(parsed.strength, 2.5);

        let defaulted: SampleConfig = parse_stage_config("sample", &Value::Null).unwrap();
        assert_eq!(defaulted.strength, 0.0);

        let err = parse_stage_config::<SampleConfig>("sample", &json!({ "strength": "lots" }))
            .unwrap_err();
        assert!(err.to_string().contains("sample"));
    }
}
