//! Fixed-tick simulation driver
//!
//! [`Simulation`] owns the world, the stage pipeline and the frame-time
//! accumulator. Each tick runs every stage in order and then removes the
//! entities flagged for destruction during the tick.

use crate::config::{PhysicsConfig, PhysicsSceneConfig};
use crate::core::entity::{EntityId, Transform, World};
use crate::physics::{PhysicsAccumulator, PhysicsStage, PhysicsSystem, StageError, StageRegistry};
use tracing::{debug, info, trace};

/// A world advanced by the physics pipeline at a fixed rate
pub struct Simulation {
    /// Entity store, freely accessible between ticks
    pub world: World,
    physics: PhysicsSystem,
    accumulator: PhysicsAccumulator,
    tick: u64,
}

impl Simulation {
    /// Create a simulation from already built parts
    pub fn new(world: World, physics: PhysicsSystem, fixed_timestep: f32) -> Self {
        info!(
            fixed_timestep,
            stages = ?physics.stage_names(),
            "Creating Simulation"
        );
        Self {
            world,
            physics,
            accumulator: PhysicsAccumulator::new(fixed_timestep),
            tick: 0,
        }
    }

    /// Length of one tick in seconds
    pub fn fixed_timestep(&self) -> f32 {
        self.accumulator.fixed_timestep
    }

    /// Number of ticks run so far
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn physics(&self) -> &PhysicsSystem {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsSystem {
        &mut self.physics
    }

    /// Run exactly one tick: every stage, then the destroy sweep
    pub fn fixed_update(&mut self) {
        let dt = self.accumulator.fixed_timestep;
        self.physics.update(&mut self.world, dt);
        let destroyed = self.world.destroy_pending();
        self.tick += 1;
        trace!(tick = self.tick, destroyed, "Fixed update complete");
    }

    /// Run `ticks` fixed updates back to back
    pub fn run_ticks(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.fixed_update();
        }
    }

    /// Feed one frame's elapsed time, run the ticks that fit and return the
    /// interpolation alpha for rendering
    pub fn advance(&mut self, frame_delta_time: f32) -> f32 {
        let steps = self.accumulator.accumulate(frame_delta_time);
        if steps > 1 {
            debug!(steps, "Catching up physics ticks");
        }
        self.run_ticks(steps);
        self.accumulator.interpolation_alpha()
    }

    /// Copies of every transform, keyed by stable id, for the render side
    pub fn snapshot_transforms(&self) -> Vec<(EntityId, Transform)> {
        let mut snapshot: Vec<(EntityId, Transform)> = self
            .world
            .query::<(&EntityId, &Transform)>()
            .iter()
            .map(|(_, (id, transform))| (*id, *transform))
            .collect();
        snapshot.sort_by_key(|(id, _)| *id);
        snapshot
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("entities", &self.world.len())
            .field("physics", &self.physics)
            .field("tick", &self.tick)
            .finish()
    }
}

/// Builder for creating a [`Simulation`] with custom configuration
pub struct SimulationBuilder {
    registry: StageRegistry,
    config: PhysicsConfig,
    world: Option<World>,
}

impl SimulationBuilder {
    /// Builder with the built-in stages registered and the default pipeline
    pub fn new() -> Self {
        Self {
            registry: StageRegistry::with_builtin_stages(),
            config: PhysicsConfig::default(),
            world: None,
        }
    }

    /// Register an additional stage constructor
    pub fn register_stage<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn PhysicsStage> + Send + Sync + 'static,
    {
        self.registry.register(name, constructor);
        self
    }

    /// Use the given pipeline configuration
    pub fn physics_config(mut self, config: PhysicsConfig) -> Self {
        self.config = config;
        self
    }

    /// Use the physics section of a scene document
    pub fn scene_config(self, scene: PhysicsSceneConfig) -> Self {
        self.physics_config(scene.physics)
    }

    /// Set the fixed timestep in seconds
    pub fn fixed_timestep(mut self, fixed_timestep: f32) -> Self {
        self.config.fixed_timestep = fixed_timestep;
        self
    }

    /// Start from an existing world instead of an empty one
    pub fn world(mut self, world: World) -> Self {
        self.world = Some(world);
        self
    }

    /// Build the pipeline and the simulation
    pub fn build(self) -> Result<Simulation, StageError> {
        let fixed_timestep = self.config.fixed_timestep;
        if !(fixed_timestep.is_finite() && fixed_timestep > 0.0) {
            return Err(StageError::InvalidTimestep(fixed_timestep));
        }
        let physics = PhysicsSystem::from_config(&self.registry, &self.config.stages)?;
        Ok(Simulation::new(
            self.world.unwrap_or_default(),
            physics,
            fixed_timestep,
        ))
    }
}

impl Default for SimulationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageEntry;
    use crate::physics::Rigidbody;
    use glam::Vec3;

    #[test]
    fn test_default_pipeline_is_gravity() {
        let sim = SimulationBuilder::new().build().unwrap();
        assert_eq!(sim.physics().stage_names(), vec!["gravityStage"]);
        assert!((sim.fixed_timestep() - 1.0 / 60.0).abs() < 1e-7);
    }

    #[test]
    fn test_advance_runs_whole_ticks() {
        let mut sim = SimulationBuilder::new()
            .fixed_timestep(0.1)
            .physics_config(PhysicsConfig {
                stages: Vec::new(),
                fixed_timestep: 0.1,
            })
            .build()
            .unwrap();

        let alpha = sim.advance(0.25);
        assert_eq!(sim.tick_count(), 2);
        assert!((alpha - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_non_positive_timestep_is_rejected() {
        for step in [0.0, -0.1, f32::NAN, f32::INFINITY] {
            let result = SimulationBuilder::new().fixed_timestep(step).build();
            assert!(
                matches!(result, Err(StageError::InvalidTimestep(_))),
                "timestep {step} was accepted"
            );
        }
    }

    #[test]
    fn test_destroy_sweep_runs_after_stages() {
        let mut sim = SimulationBuilder::new().build().unwrap();
        let doomed = sim.world.spawn((
            Transform::from_position(Vec3::new(0.0, 5.0, 0.0)),
            Rigidbody::dynamic(1.0),
        ));
        let keep = sim.world.spawn((Transform::from_position(Vec3::new(3.0, 5.0, 0.0)),));
        sim.world.mark_for_destroy(doomed).unwrap();

        // Still visible until the tick ends
        assert!(sim.world.contains(doomed));
        sim.fixed_update();
        assert!(!sim.world.contains(doomed));
        assert!(sim.world.contains(keep));
    }

    #[test]
    fn test_snapshot_is_sorted_by_id() {
        let mut sim = SimulationBuilder::new()
            .physics_config(PhysicsConfig {
                stages: vec![StageEntry::named("solarStage")],
                fixed_timestep: 1.0 / 60.0,
            })
            .build()
            .unwrap();
        for x in 0..3 {
            sim.world.spawn((Transform::from_position(Vec3::new(x as f32, 0.0, 0.0)),));
        }

        let snapshot = sim.snapshot_transforms();
        let ids: Vec<u64> = snapshot.iter().map(|(id, _)| id.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(snapshot[2].1.position.x, 2.0);
    }
}
