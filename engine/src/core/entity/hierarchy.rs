//! World matrices for entities linked through [`Parent`] relations

use super::components::{LocalBounds, Parent, Transform, WorldBounds};
use super::world::World;
use glam::Mat4;
use hecs::Entity;
use tracing::{error, trace};

/// Hierarchies deeper than this are treated as cyclic
const MAX_HIERARCHY_DEPTH: usize = 64;

/// Compute the world matrix of an entity by composing its local transform with
/// every ancestor's.
///
/// Returns `None` when the entity has no [`Transform`]. A parent link pointing
/// at a despawned entity (or at an entity without a transform) ends the chain
/// there; a cycle is logged and broken at the depth limit.
pub fn world_matrix(world: &World, entity: Entity) -> Option<Mat4> {
    let inner = world.inner();
    let mut matrix = inner.get::<&Transform>(entity).ok()?.to_matrix();
    let mut current = entity;

    for depth in 0.. {
        let parent = match inner.get::<&Parent>(current) {
            Ok(parent) => parent.0,
            Err(_) => break,
        };
        if depth >= MAX_HIERARCHY_DEPTH {
            error!(entity = ?entity, "Parent chain exceeds {MAX_HIERARCHY_DEPTH} levels, possible cycle");
            break;
        }
        let Ok(parent_transform) = inner.get::<&Transform>(parent) else {
            trace!(entity = ?current, parent = ?parent, "Dangling parent link ignored");
            break;
        };
        matrix = parent_transform.to_matrix() * matrix;
        current = parent;
    }

    Some(matrix)
}

/// World-space bounding box of an entity: its [`LocalBounds`] (unit cube by
/// default) transformed by [`world_matrix`]
pub fn world_bounding_box(world: &World, entity: Entity) -> Option<WorldBounds> {
    let matrix = world_matrix(world, entity)?;
    let local = world
        .inner()
        .get::<&LocalBounds>(entity)
        .map(|b| *b)
        .unwrap_or_default();
    Some(WorldBounds::from_local(&local, &matrix))
}
