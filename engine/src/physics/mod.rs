//! Fixed-tick rigid-body physics
//!
//! Physics runs as an ordered list of stages ([`PhysicsSystem`]) built by name
//! from scene configuration through a [`StageRegistry`]. The built-in stages
//! cover uniform gravity with ground contact, body-body collision response and
//! mutual attraction; all of them share the single-contact impulse math in
//! [`impulse`] and the integrator in [`integration`].

pub mod accumulator;
pub mod collision;
pub mod components;
pub mod impulse;
pub mod integration;
pub mod prefab;
pub mod stage;
pub mod stages;
pub mod system;

// Re-export commonly used types
pub use accumulator::PhysicsAccumulator;
pub use collision::{test_collision, Aabb, Contact};
pub use components::{ColliderType, CollisionShape, DragModel, Rigidbody, MIN_DYNAMIC_MASS};
pub use impulse::{resolve_contact, ContactBody, ContactParams, ImpulseResult};
pub use integration::integrate_body;
pub use prefab::{apply_prefab, spawn_prefab, PrefabError};
pub use stage::{PhysicsStage, StageError, StageRegistry};
pub use stages::{CollisionStage, GravityStage, SolarStage};
pub use system::PhysicsSystem;
