//! Components shared by every simulated entity

use glam::{Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Placement relative to the parent (or the world for roots). Stages integrate
/// and correct `position` and `rotation` directly; `scale` doubles as the size
/// of the default box collider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Local transformation matrix (scale, then rotation, then translation)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation.normalize(), self.position)
    }

    /// Rotation matrix of the normalized orientation
    pub fn rotation_matrix(&self) -> Mat3 {
        Mat3::from_quat(self.rotation.normalize())
    }
}

/// Parent relation for hierarchical transforms.
///
/// The parent is only referenced, never owned: despawning the parent leaves the
/// child in place and the dangling link is ignored when world matrices are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub hecs::Entity);

/// Display name, filled from prefab `name` fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Stable entity identity handed out by [`World`](super::World).
///
/// Unlike `hecs::Entity`, whose slot index is recycled after a despawn, ids are
/// strictly increasing and never handed out twice by the same world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Marker for entities that are removed by the end-of-tick sweep
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingDestroy;

/// Local-space bounds the world bounding box is derived from.
///
/// Entities without this component use a unit cube centred on the origin, which
/// matches the default hitbox of a rigid body (`scale * 0.5`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for LocalBounds {
    fn default() -> Self {
        Self {
            min: Vec3::splat(-0.5),
            max: Vec3::splat(0.5),
        }
    }
}

impl LocalBounds {
    /// The 8 corners of the box, ordered by (x, y, z) bit pattern
    pub fn corners(&self) -> [Vec3; 8] {
        let (min, max) = (self.min, self.max);
        [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, max.y, max.z),
        ]
    }
}

/// World-space bounding box of an entity: the transformed local corners plus
/// their axis-aligned envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub corners: [Vec3; 8],
    pub min: Vec3,
    pub max: Vec3,
}

impl WorldBounds {
    /// Transform local bounds by a world matrix
    pub fn from_local(bounds: &LocalBounds, world_matrix: &Mat4) -> Self {
        let corners = bounds.corners().map(|c| world_matrix.transform_point3(c));
        let (min, max) = corners[1..]
            .iter()
            .fold((corners[0], corners[0]), |(lo, hi), c| (lo.min(*c), hi.max(*c)));
        Self { corners, min, max }
    }
}
