//! Collision shape placement in world space

use crate::physics::components::CollisionShape;
use glam::{Quat, Vec3};

use super::Aabb;

impl CollisionShape {
    /// Bounds of the shape placed at `position` with `rotation`
    pub fn world_aabb(&self, position: Vec3, rotation: Quat) -> Aabb {
        match *self {
            CollisionShape::Sphere { radius } => Aabb::around(position, Vec3::splat(radius)),
            CollisionShape::Box { half_extents } => {
                Aabb::enclosing(box_corners(position, rotation, half_extents))
            }
        }
    }
}

/// World-space corners of an oriented box
pub fn box_corners(position: Vec3, rotation: Quat, half_extents: Vec3) -> [Vec3; 8] {
    let h = half_extents;
    [
        Vec3::new(-h.x, -h.y, -h.z),
        Vec3::new(h.x, -h.y, -h.z),
        Vec3::new(-h.x, h.y, -h.z),
        Vec3::new(h.x, h.y, -h.z),
        Vec3::new(-h.x, -h.y, h.z),
        Vec3::new(h.x, -h.y, h.z),
        Vec3::new(-h.x, h.y, h.z),
        Vec3::new(h.x, h.y, h.z),
    ]
    .map(|corner| position + rotation * corner)
}
