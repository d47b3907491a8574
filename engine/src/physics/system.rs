//! Ordered stage pipeline run once per fixed tick

use crate::config::StageEntry;
use crate::core::entity::{Entity, Transform, World};
use crate::physics::components::Rigidbody;
use crate::physics::stage::{PhysicsStage, StageError, StageRegistry};
use tracing::{info, info_span, trace, warn};

/// The physics pipeline: stages executed in configuration order
#[derive(Default)]
pub struct PhysicsSystem {
    stages: Vec<Box<dyn PhysicsStage>>,
}

impl PhysicsSystem {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the pipeline from a stage list.
    ///
    /// Names the registry does not know are logged and skipped. A stage whose
    /// config fails to parse aborts construction.
    pub fn from_config(registry: &StageRegistry, entries: &[StageEntry]) -> Result<Self, StageError> {
        let mut system = Self::new();

        for entry in entries {
            let Some(mut stage) = registry.create(&entry.name) else {
                warn!(
                    stage = %entry.name,
                    known = ?registry.names(),
                    "Unknown physics stage in configuration, skipping"
                );
                continue;
            };
            stage.initialize(&entry.config)?;
            system.add_stage(stage);
        }

        info!(stages = ?system.stage_names(), "Physics pipeline built");
        Ok(system)
    }

    /// Append an already initialized stage
    pub fn add_stage(&mut self, stage: Box<dyn PhysicsStage>) {
        self.stages.push(stage);
    }

    /// Run every stage once, in order.
    ///
    /// Bodies lacking a [`Transform`] are reported and left alone; every stage
    /// queries both components so they never match.
    pub fn update(&mut self, world: &mut World, fixed_delta_time: f32) {
        for entity in bodies_without_transform(world) {
            warn!(entity = ?entity, "Rigidbody without Transform, skipping entity");
        }

        for stage in &mut self.stages {
            let _span = info_span!("physics_stage", stage = stage.name()).entered();
            trace!("Executing stage");
            stage.execute(world, fixed_delta_time);
        }
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Entities carrying a [`Rigidbody`] but no [`Transform`]
pub fn bodies_without_transform(world: &World) -> Vec<Entity> {
    world
        .query::<()>()
        .with::<&Rigidbody>()
        .without::<&Transform>()
        .iter()
        .map(|(entity, ())| entity)
        .collect()
}

impl std::fmt::Debug for PhysicsSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsSystem")
            .field("stages", &self.stage_names())
            .finish()
    }
}
