//! Mutual Newtonian attraction between dynamic bodies

use crate::core::entity::{Entity, Transform, World};
use crate::physics::components::{DragModel, Rigidbody};
use crate::physics::integration::integrate_body;
use crate::physics::stage::{parse_stage_config, PhysicsStage, StageError};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

/// Settings read from the `solarStage` config object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolarSettings {
    /// Gravitational constant
    #[serde(rename = "G")]
    pub gravitational_constant: f32,
    /// Pairs closer than this exert no force on each other
    pub min_distance: f32,
    pub drag_model: DragModel,
}

impl Default for SolarSettings {
    fn default() -> Self {
        Self {
            gravitational_constant: 0.1,
            min_distance: 0.001,
            drag_model: DragModel::Linear,
        }
    }
}

/// Pairwise `G m1 m2 / r²` attraction followed by integration of every body.
///
/// The stage integrates on its own, so a pipeline that also runs
/// `gravityStage` moves each body twice per tick.
#[derive(Debug, Default)]
pub struct SolarStage {
    settings: SolarSettings,
}

impl SolarStage {
    pub const NAME: &'static str = "solarStage";

    pub fn new(settings: SolarSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SolarSettings {
        &self.settings
    }

    /// Net attraction on each body, in the order given
    pub fn attraction_forces(&self, bodies: &[(Vec3, f32)]) -> Vec<Vec3> {
        let mut forces = vec![Vec3::ZERO; bodies.len()];
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                let (position_i, mass_i) = bodies[i];
                let (position_j, mass_j) = bodies[j];
                let delta = position_j - position_i;
                let distance = delta.length();
                if distance < self.settings.min_distance {
                    continue;
                }
                let magnitude =
                    self.settings.gravitational_constant * mass_i * mass_j / (distance * distance);
                let force = delta / distance * magnitude;
                forces[i] += force;
                forces[j] -= force;
            }
        }
        forces
    }
}

impl PhysicsStage for SolarStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn initialize(&mut self, config: &Value) -> Result<(), StageError> {
        self.settings = parse_stage_config(Self::NAME, config)?;
        info!(
            g = self.settings.gravitational_constant,
            min_distance = self.settings.min_distance,
            "Solar stage initialized"
        );
        Ok(())
    }

    fn execute(&mut self, world: &mut World, fixed_delta_time: f32) {
        let (entities, bodies): (Vec<Entity>, Vec<(Vec3, f32)>) = world
            .query::<(&Transform, &Rigidbody)>()
            .iter()
            .filter(|(_, (_, rb))| rb.is_dynamic())
            .map(|(entity, (transform, rb))| (entity, (transform.position, rb.mass)))
            .unzip();

        let forces = self.attraction_forces(&bodies);

        for (entity, force) in entities.iter().zip(forces) {
            if let Ok((transform, rb)) = world.query_one_mut::<(&mut Transform, &mut Rigidbody)>(*entity) {
                rb.add_force(force);
                integrate_body(transform, rb, fixed_delta_time, self.settings.drag_model);
            }
        }

        debug!(bodies = entities.len(), "Solar stage tick");
    }
}
