//! Contact generation and world-space bounds for collider shapes

pub mod narrow_phase;
pub mod shapes;

pub use narrow_phase::test_collision;

use glam::Vec3;

/// Single contact produced by the narrow phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// World space contact point
    pub position: Vec3,
    /// Unit contact normal pointing from A to B
    pub normal: Vec3,
    /// Penetration depth along the normal
    pub penetration: f32,
}

impl Contact {
    pub fn new(position: Vec3, normal: Vec3, penetration: f32) -> Self {
        Self {
            position,
            normal,
            penetration,
        }
    }

    /// Same contact seen from the other body
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// World-space axis-aligned box used to reject far apart pairs cheaply
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box reaching `half_extents` out from `center` on every axis
    pub fn around(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Tightest box enclosing all `points`; empty input yields an inverted box
    /// that overlaps nothing
    pub fn enclosing(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(
            Self::new(Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |acc, point| Self::new(acc.min.min(point), acc.max.max(point)),
        )
    }

    /// Touching boxes count as overlapping
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }
}
