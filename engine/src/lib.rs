//! Fixed-tick rigid-body physics engine
//!
//! This crate provides a hecs based entity store and a pluggable pipeline of
//! physics stages (gravity with ground contact, body-body collision,
//! mutual attraction) driven at a fixed timestep.

pub mod app;
pub mod config;
pub mod core;
pub mod physics;

/// Everything needed to build a simulation and populate its world
pub mod prelude {
    pub use crate::app::{Simulation, SimulationBuilder};
    pub use crate::config::{ConfigError, PhysicsConfig, PhysicsSceneConfig, StageEntry};
    pub use crate::core::entity::{
        Entity, EntityId, LocalBounds, Name, Parent, PendingDestroy, Transform, World,
        WorldBounds,
    };
    pub use crate::physics::{
        ColliderType, CollisionStage, DragModel, GravityStage, PhysicsStage, PhysicsSystem,
        Rigidbody, SolarStage, StageError, StageRegistry,
    };
    pub use glam::{Mat3, Mat4, Quat, Vec3};
}

/// Install the global `tracing` subscriber.
///
/// Filtering follows `RUST_LOG` and falls back to `info`. A second call keeps
/// the subscriber that is already installed.
pub fn init_logging() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}
