//! Entities, their placement and the world that stores them
//!
//! Stages reach entities through [`World`] queries over component tuples such
//! as `(&mut Transform, &mut Rigidbody)`.

pub mod components;
pub mod hierarchy;
pub mod world;

pub use components::{EntityId, LocalBounds, Name, Parent, PendingDestroy, Transform, WorldBounds};
pub use hecs::Entity;
pub use world::World;
