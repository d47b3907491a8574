//! Building pipelines from stage names

use engine::app::SimulationBuilder;
use engine::config::{PhysicsConfig, StageEntry};
use engine::core::entity::{Transform, World};
use engine::physics::components::Rigidbody;
use engine::physics::stage::{parse_stage_config, PhysicsStage, StageError};
use glam::Vec3;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WindSettings {
    strength: f32,
}

/// Pushes every body along +X, a stand-in for a game-defined stage
#[derive(Default)]
struct WindStage {
    settings: WindSettings,
}

impl PhysicsStage for WindStage {
    fn name(&self) -> &str {
        "windStage"
    }

    fn initialize(&mut self, config: &Value) -> Result<(), StageError> {
        self.settings = parse_stage_config("windStage", config)?;
        Ok(())
    }

    fn execute(&mut self, world: &mut World, fixed_delta_time: f32) {
        for (_, rb) in world.query_mut::<&mut Rigidbody>() {
            if rb.is_dynamic() {
                rb.velocity.x += self.settings.strength * fixed_delta_time;
            }
        }
    }
}

fn pipeline(stages: Vec<StageEntry>) -> PhysicsConfig {
    PhysicsConfig {
        stages,
        fixed_timestep: 0.1,
    }
}

#[test]
fn test_custom_stage_runs_in_configured_order() {
    let mut sim = SimulationBuilder::new()
        .register_stage("windStage", || Box::new(WindStage::default()))
        .physics_config(pipeline(vec![
            StageEntry::with_config("windStage", json!({ "strength": 2.0 })),
            StageEntry::with_config("gravityStage", json!({ "gravity": [0.0, 0.0, 0.0] })),
        ]))
        .build()
        .unwrap();
    assert_eq!(sim.physics().stage_names(), vec!["windStage", "gravityStage"]);

    let body = sim.world.spawn((
        Transform::from_position(Vec3::new(0.0, 3.0, 0.0)),
        Rigidbody::dynamic(1.0),
    ));
    sim.fixed_update();

    // Wind adds 0.2 m/s before the gravity stage integrates it
    let transform = sim.world.get::<Transform>(body).unwrap();
    assert!((transform.position.x - 0.02).abs() < 1e-6);
}

#[test]
fn test_unknown_stage_names_are_skipped() {
    let sim = SimulationBuilder::new()
        .physics_config(pipeline(vec![
            StageEntry::named("windStage"),
            StageEntry::named("collisionStage"),
        ]))
        .build()
        .unwrap();
    assert_eq!(sim.physics().stage_names(), vec!["collisionStage"]);
}

#[test]
fn test_malformed_stage_config_fails_the_build() {
    let result = SimulationBuilder::new()
        .physics_config(pipeline(vec![StageEntry::with_config(
            "solarStage",
            json!({ "G": [1, 2] }),
        )]))
        .build();

    match result {
        Err(StageError::InvalidConfig { stage, .. }) => assert_eq!(stage, "solarStage"),
        other => panic!("expected InvalidConfig, got {other:?}"),
    }
}

#[test]
fn test_empty_pipeline_leaves_world_alone() {
    let mut sim = SimulationBuilder::new()
        .physics_config(pipeline(Vec::new()))
        .build()
        .unwrap();
    let body = sim.world.spawn((
        Transform::from_position(Vec3::new(0.0, 3.0, 0.0)),
        Rigidbody::dynamic(1.0).with_velocity(Vec3::ONE),
    ));

    sim.run_ticks(10);

    assert_eq!(sim.world.get::<Transform>(body).unwrap().position, Vec3::new(0.0, 3.0, 0.0));
    assert_eq!(sim.tick_count(), 10);
}

#[test]
fn test_negative_coefficients_fail_the_build() {
    let cases = [
        ("gravityStage", json!({ "mu": -0.1 }), "mu"),
        ("gravityStage", json!({ "groundRestitution": -0.5 }), "groundRestitution"),
        ("collisionStage", json!({ "mu": -0.1 }), "mu"),
    ];

    for (name, config, expected_field) in cases {
        let result = SimulationBuilder::new()
            .physics_config(pipeline(vec![StageEntry::with_config(name, config)]))
            .build();
        match result {
            Err(StageError::OutOfRange { stage, field, .. }) => {
                assert_eq!(stage, name);
                assert_eq!(field, expected_field);
            }
            other => panic!("expected OutOfRange for {name}, got {other:?}"),
        }
    }
}

#[test]
fn test_corrupt_body_elasticity_does_not_abort_tick() {
    let mut sim = SimulationBuilder::new()
        .physics_config(pipeline(vec![StageEntry::named("gravityStage")]))
        .build()
        .unwrap();
    let mut body = Rigidbody::dynamic(1.0).with_velocity(Vec3::new(2.0, -3.0, 0.0));
    // Bypasses the builder clamp; drives the normal impulse negative
    body.elasticity = -3.0;
    let entity = sim.world.spawn((Transform::from_position(Vec3::new(0.0, 0.45, 0.0)), body));

    sim.fixed_update();

    let rb = sim.world.get::<Rigidbody>(entity).unwrap();
    assert!(rb.velocity.is_finite());
    assert_eq!(sim.tick_count(), 1);
}
