//! Entity storage for the simulation
//!
//! [`World`] owns a `hecs::World` and stamps every spawned entity with an
//! [`EntityId`] taken from a per-world counter. hecs recycles entity slots, the
//! ids are never handed out twice.

use super::components::{EntityId, PendingDestroy, WorldBounds};
use super::hierarchy;
use glam::Mat4;
use hecs::{Component, ComponentError, DynamicBundle, Entity, EntityBuilder, NoSuchEntity};
use tracing::debug;

#[derive(Default)]
pub struct World {
    entities: hecs::World,
    next_id: u64,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `components` as a new entity tagged with a fresh [`EntityId`]
    pub fn spawn(&mut self, components: impl DynamicBundle) -> Entity {
        let id = EntityId(self.next_id);
        self.next_id += 1;

        let mut builder = EntityBuilder::new();
        builder.add_bundle(components).add(id);
        self.entities.spawn(builder.build())
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Result<hecs::Ref<'_, T>, ComponentError> {
        self.entities.get::<&T>(entity)
    }

    pub fn query_one_mut<Q: hecs::Query>(
        &mut self,
        entity: Entity,
    ) -> Result<Q::Item<'_>, hecs::QueryOneError> {
        self.entities.query_one_mut::<Q>(entity)
    }

    /// Add or replace a single component
    pub fn insert_one(&mut self, entity: Entity, component: impl Component) -> Result<(), NoSuchEntity> {
        self.entities.insert_one(entity, component)
    }

    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.entities.query()
    }

    pub fn query_mut<Q: hecs::Query>(&mut self) -> hecs::QueryMut<'_, Q> {
        self.entities.query_mut()
    }

    /// Remove an entity right away. Code running inside a stage goes through
    /// [`World::mark_for_destroy`] so iteration over the tick stays valid.
    pub fn despawn(&mut self, entity: Entity) -> Result<(), NoSuchEntity> {
        self.entities.despawn(entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(entity)
    }

    pub fn len(&self) -> u32 {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entity_id(&self, entity: Entity) -> Option<EntityId> {
        self.get::<EntityId>(entity).ok().map(|id| *id)
    }

    /// Live entity stamped with `id`, if it still exists
    pub fn find(&self, id: EntityId) -> Option<Entity> {
        self.entities
            .query::<&EntityId>()
            .iter()
            .find_map(|(entity, candidate)| (*candidate == id).then_some(entity))
    }

    /// Tag an entity for the end-of-tick sweep
    pub fn mark_for_destroy(&mut self, entity: Entity) -> Result<(), NoSuchEntity> {
        self.entities.insert_one(entity, PendingDestroy)
    }

    pub fn is_pending_destroy(&self, entity: Entity) -> bool {
        self.get::<PendingDestroy>(entity).is_ok()
    }

    /// Despawn everything tagged [`PendingDestroy`] and return the count
    pub fn destroy_pending(&mut self) -> usize {
        let doomed: Vec<Entity> = self
            .entities
            .query::<()>()
            .with::<&PendingDestroy>()
            .iter()
            .map(|(entity, ())| entity)
            .collect();

        for entity in &doomed {
            // Ignore the error, the entity came from the live query above
            let _ = self.entities.despawn(*entity);
        }

        if !doomed.is_empty() {
            debug!(count = doomed.len(), "Swept destroyed entities");
        }
        doomed.len()
    }

    /// Local-to-world matrix, composed through the parent chain
    pub fn world_matrix(&self, entity: Entity) -> Option<Mat4> {
        hierarchy::world_matrix(self, entity)
    }

    /// Corners and envelope of the entity's box in world space
    pub fn world_bounding_box(&self, entity: Entity) -> Option<WorldBounds> {
        hierarchy::world_bounding_box(self, entity)
    }

    /// Underlying hecs storage, read only
    pub fn inner(&self) -> &hecs::World {
        &self.entities
    }
}
