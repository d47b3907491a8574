//! Rigid body data attached to entities

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Bodies at or below this mass are immovable and skipped by every stage
pub const MIN_DYNAMIC_MASS: f32 = 0.001;

/// Collider tag of a rigid body, written `"BOX"` / `"SPHERE"` in configs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColliderType {
    #[default]
    Box,
    Sphere,
    /// Tag read from data that names no known shape
    #[serde(other)]
    Unsupported,
}

impl ColliderType {
    /// Parse a config tag, `None` for unknown names
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "BOX" => Some(Self::Box),
            "SPHERE" => Some(Self::Sphere),
            _ => None,
        }
    }
}

/// How drag coefficients damp velocity over a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragModel {
    /// `v *= max(0, 1 - drag * dt)`
    #[default]
    Linear,
    /// `v *= exp(-drag * dt)`
    Exponential,
}

impl DragModel {
    /// Velocity scale factor for one step of length `dt`
    pub fn factor(self, drag: f32, dt: f32) -> f32 {
        match self {
            DragModel::Linear => (1.0 - drag * dt).max(0.0),
            DragModel::Exponential => (-drag * dt).exp(),
        }
    }
}

/// Collision shape with resolved dimensions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum CollisionShape {
    Sphere { radius: f32 },
    /// Oriented box, measured from its center to a face on each axis
    Box { half_extents: Vec3 },
}

impl CollisionShape {
    /// Body-space inertia tensor of a solid shape of uniform density
    pub fn inertia_tensor(&self, mass: f32) -> Mat3 {
        let diagonal = match *self {
            CollisionShape::Sphere { radius } => Vec3::splat(0.4 * mass * radius * radius),
            CollisionShape::Box { half_extents } => {
                let size_sq = (half_extents * 2.0) * (half_extents * 2.0);
                Vec3::new(
                    size_sq.y + size_sq.z,
                    size_sq.x + size_sq.z,
                    size_sq.x + size_sq.y,
                ) * (mass / 12.0)
            }
        };
        Mat3::from_diagonal(diagonal)
    }
}

/// Dynamic state of a simulated body. Pairs with a [`Transform`](crate::core::entity::Transform) on the same entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rigidbody {
    /// Mass in kilograms, `<= MIN_DYNAMIC_MASS` means immovable
    pub mass: f32,
    /// Linear drag coefficient
    pub linear_drag: f32,
    /// Angular drag coefficient
    pub angular_drag: f32,
    /// Restitution in [0, 1]
    pub elasticity: f32,
    /// Linear velocity in world space
    pub velocity: Vec3,
    /// Angular velocity in world space
    pub angular_velocity: Vec3,
    /// Angular momentum in world space
    pub angular_momentum: Vec3,
    /// Inverse inertia tensor in body space
    pub inverse_inertia_tensor: Mat3,
    pub collider: ColliderType,
    /// Collider half extents derived from the owner's scale
    pub hitbox: Vec3,

    /// Force accumulated during the current tick
    #[serde(skip)]
    pub force: Vec3,
    /// Torque accumulated during the current tick
    #[serde(skip)]
    pub torque: Vec3,
}

impl Default for Rigidbody {
    fn default() -> Self {
        Self::new(1.0, ColliderType::Box, Vec3::ONE)
    }
}

impl Rigidbody {
    /// Create a body at rest whose hitbox is sized from the owner's scale
    pub fn new(mass: f32, collider: ColliderType, scale: Vec3) -> Self {
        let mut body = Self {
            mass,
            linear_drag: 0.0,
            angular_drag: 0.0,
            elasticity: 0.0,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            angular_momentum: Vec3::ZERO,
            inverse_inertia_tensor: Mat3::ZERO,
            collider,
            hitbox: Vec3::ZERO,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
        };
        body.set_hitbox(scale);
        body
    }

    /// Create a dynamic box collider body for a unit-scale owner
    pub fn dynamic(mass: f32) -> Self {
        Self::new(mass, ColliderType::Box, Vec3::ONE)
    }

    /// Create an immovable body
    pub fn immovable(collider: ColliderType, scale: Vec3) -> Self {
        Self::new(0.0, collider, scale)
    }

    /// Set the restitution coefficient
    pub fn with_elasticity(mut self, elasticity: f32) -> Self {
        self.elasticity = elasticity.clamp(0.0, 1.0);
        self
    }

    /// Set the initial linear velocity
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set linear and angular drag coefficients
    pub fn with_drag(mut self, linear: f32, angular: f32) -> Self {
        self.linear_drag = linear;
        self.angular_drag = angular;
        self
    }

    /// Size the hitbox from the owner's scale and refresh the inertia tensor.
    ///
    /// Boxes use half the scale on each axis; spheres use half of the largest
    /// axis as radius.
    pub fn set_hitbox(&mut self, scale: Vec3) {
        let half = scale.abs() * 0.5;
        self.hitbox = match self.collider {
            ColliderType::Box => half,
            ColliderType::Sphere => Vec3::splat(half.max_element()),
            ColliderType::Unsupported => {
                warn!("Unsupported collider type, sizing hitbox as a box");
                half
            }
        };
        self.refresh_inertia();
    }

    /// Recompute the body-space inverse inertia tensor from mass and hitbox
    pub fn refresh_inertia(&mut self) {
        self.inverse_inertia_tensor = if self.is_dynamic() {
            let inertia = self.collision_shape().inertia_tensor(self.mass);
            let diagonal = Vec3::new(inertia.x_axis.x, inertia.y_axis.y, inertia.z_axis.z);
            // Degenerate axes (zero extent) get no angular response
            let invert = |v: f32| if v > f32::EPSILON { 1.0 / v } else { 0.0 };
            Mat3::from_diagonal(Vec3::new(invert(diagonal.x), invert(diagonal.y), invert(diagonal.z)))
        } else {
            Mat3::ZERO
        };
    }

    /// Shape used for inertia and narrow-phase tests
    pub fn collision_shape(&self) -> CollisionShape {
        match self.collider {
            ColliderType::Sphere => CollisionShape::Sphere {
                radius: self.hitbox.x,
            },
            ColliderType::Box | ColliderType::Unsupported => CollisionShape::Box {
                half_extents: self.hitbox,
            },
        }
    }

    /// Whether forces and impulses can move this body
    pub fn is_dynamic(&self) -> bool {
        self.mass > MIN_DYNAMIC_MASS
    }

    /// `1 / mass`, zero for immovable bodies
    pub fn inverse_mass(&self) -> f32 {
        if self.is_dynamic() {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Inverse inertia in world space: `R * I⁻¹ * Rᵀ`
    pub fn world_inverse_inertia(&self, rotation: Quat) -> Mat3 {
        let rot = Mat3::from_quat(rotation.normalize());
        rot * self.inverse_inertia_tensor * rot.transpose()
    }

    /// Set angular velocity and the matching angular momentum for the given orientation
    pub fn set_angular_velocity(&mut self, angular_velocity: Vec3, rotation: Quat) {
        self.angular_velocity = angular_velocity;
        let world_inverse = self.world_inverse_inertia(rotation);
        self.angular_momentum = if world_inverse.determinant().abs() > f32::EPSILON {
            world_inverse.inverse() * angular_velocity
        } else {
            Vec3::ZERO
        };
    }

    /// Accumulate a force through the centre of mass
    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
    }

    /// Accumulate a torque
    pub fn add_torque(&mut self, torque: Vec3) {
        self.torque += torque;
    }

    /// Accumulate a force applied at offset `r` from the centre of mass
    pub fn add_force_at(&mut self, force: Vec3, r: Vec3) {
        self.force += force;
        self.torque += r.cross(force);
    }

    /// Apply an instantaneous impulse at offset `r` from the centre of mass.
    ///
    /// Changes linear velocity by `impulse / mass` and angular momentum by
    /// `r × impulse`; angular velocity is rederived through
    /// `world_inverse_inertia`. Immovable bodies are left untouched.
    pub fn apply_impulse(&mut self, impulse: Vec3, r: Vec3, world_inverse_inertia: Mat3) {
        if !self.is_dynamic() {
            return;
        }
        self.velocity += impulse / self.mass;
        self.angular_momentum += r.cross(impulse);
        self.angular_velocity = world_inverse_inertia * self.angular_momentum;
    }

    /// Drop the forces and torques accumulated this tick
    pub fn clear_accumulators(&mut self) {
        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
    }
}
