//! Mutual attraction between bodies

use engine::app::{Simulation, SimulationBuilder};
use engine::config::{PhysicsConfig, StageEntry};
use engine::core::entity::{Entity, Transform};
use engine::physics::components::Rigidbody;
use glam::Vec3;
use serde_json::json;

fn solar(g: f32) -> Simulation {
    SimulationBuilder::new()
        .physics_config(PhysicsConfig {
            stages: vec![StageEntry::with_config("solarStage", json!({ "G": g }))],
            fixed_timestep: 1.0 / 60.0,
        })
        .build()
        .unwrap()
}

fn position(sim: &Simulation, entity: Entity) -> Vec3 {
    sim.world.get::<Transform>(entity).unwrap().position
}

#[test]
fn test_bodies_attract_and_conserve_momentum() {
    let mut sim = solar(1.0);
    let sun = sim.world.spawn((Transform::from_position(Vec3::ZERO), Rigidbody::dynamic(10.0)));
    let planet = sim.world.spawn((
        Transform::from_position(Vec3::new(5.0, 0.0, 0.0)),
        Rigidbody::dynamic(1.0),
    ));

    sim.run_ticks(30);

    let distance = position(&sim, sun).distance(position(&sim, planet));
    assert!(distance < 5.0, "Bodies should fall towards each other");

    let momentum = sim.world.get::<Rigidbody>(sun).unwrap().velocity * 10.0
        + sim.world.get::<Rigidbody>(planet).unwrap().velocity * 1.0;
    assert!(momentum.length() < 1e-4);
}

#[test]
fn test_orbit_keeps_distance_roughly_constant() {
    // Light satellite with circular orbit speed sqrt(G M / r)
    let g = 1.0;
    let central_mass = 1000.0;
    let radius = 10.0;
    let mut sim = solar(g);
    let _center = sim.world.spawn((Transform::from_position(Vec3::ZERO), Rigidbody::dynamic(central_mass)));
    let satellite = sim.world.spawn((
        Transform::from_position(Vec3::new(radius, 0.0, 0.0)),
        Rigidbody::dynamic(0.01).with_velocity(Vec3::new(0.0, 0.0, (g * central_mass / radius).sqrt())),
    ));

    for _ in 0..300 {
        sim.fixed_update();
        let r = position(&sim, satellite).length();
        assert!((r - radius).abs() < 0.5, "Orbit drifted to r = {r}");
    }
}

#[test]
fn test_coincident_bodies_stay_finite() {
    let mut sim = solar(1.0);
    let a = sim.world.spawn((Transform::from_position(Vec3::ONE), Rigidbody::dynamic(1.0)));
    let b = sim.world.spawn((Transform::from_position(Vec3::ONE), Rigidbody::dynamic(1.0)));

    sim.run_ticks(10);

    assert!(position(&sim, a).is_finite());
    assert_eq!(position(&sim, a), position(&sim, b));
}
