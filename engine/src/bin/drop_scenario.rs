//! Drops a box onto the ground and logs its trajectory
//!
//! Usage: cargo run --bin drop_scenario [scene.json] [ticks]
//!
//! Without a scene file the default pipeline (gravity with ground contact at
//! 60 Hz) is used. Set `RUST_LOG=debug` to see per-stage summaries.

use engine::prelude::*;
use std::env;
use std::process;
use tracing::{error, info};

const DEFAULT_TICKS: u32 = 600;

fn main() {
    engine::init_logging();

    let args: Vec<String> = env::args().collect();
    let scene = match args.get(1) {
        Some(path) => match PhysicsSceneConfig::load_from_file(path) {
            Ok(scene) => scene,
            Err(e) => {
                error!(error = %e, "Failed to load scene configuration");
                process::exit(1);
            }
        },
        None => PhysicsSceneConfig::default(),
    };
    let ticks = match args.get(2).map(|arg| arg.parse::<u32>()) {
        Some(Ok(ticks)) => ticks,
        Some(Err(e)) => {
            eprintln!("Usage: {} [scene.json] [ticks]", args[0]);
            eprintln!("Invalid tick count: {e}");
            process::exit(1);
        }
        None => DEFAULT_TICKS,
    };

    let mut sim = match SimulationBuilder::new().scene_config(scene).build() {
        Ok(sim) => sim,
        Err(e) => {
            error!(error = %e, "Failed to build physics pipeline");
            process::exit(1);
        }
    };

    let entity = sim.world.spawn((
        Name::new("drop_box"),
        Transform::from_position(Vec3::new(0.0, 5.0, 0.0)),
        Rigidbody::dynamic(1.0).with_elasticity(0.5),
    ));

    let mut peak_after_bounce = f32::MIN;
    let mut bounced = false;
    for _ in 0..ticks {
        sim.fixed_update();

        let (y, vy) = match (sim.world.get::<Transform>(entity), sim.world.get::<Rigidbody>(entity)) {
            (Ok(transform), Ok(rb)) => (transform.position.y, rb.velocity.y),
            _ => {
                error!("Drop box disappeared from the world");
                process::exit(1);
            }
        };

        if vy > 0.0 {
            bounced = true;
        }
        if bounced {
            peak_after_bounce = peak_after_bounce.max(y);
        }
        info!(tick = sim.tick_count(), y, vy, "Drop box");
    }

    let final_state = match (sim.world.get::<Transform>(entity), sim.world.get::<Rigidbody>(entity)) {
        (Ok(transform), Ok(rb)) => Some((transform.position.y, rb.velocity.y)),
        _ => None,
    };
    if let Some((final_y, final_vy)) = final_state {
        info!(
            ticks,
            final_y,
            final_vy,
            peak_after_bounce = ?bounced.then_some(peak_after_bounce),
            "Scenario finished"
        );
    }
}
