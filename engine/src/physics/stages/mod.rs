//! Built-in physics stages

pub mod collision;
pub mod gravity;
pub mod solar;

pub use collision::{CollisionSettings, CollisionStage};
pub use gravity::{GravitySettings, GravityStage, GroundContact};
pub use solar::{SolarSettings, SolarStage};
