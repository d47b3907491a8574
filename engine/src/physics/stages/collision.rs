//! Pairwise body-body contact resolution
//!
//! Every pair of bodies is tested with the narrow phase; overlapping pairs are
//! pushed apart in proportion to their inverse masses and exchange an impulse
//! through the same single-contact math the ground uses. Pairs are rejected
//! early on their world AABBs but there is no spatial partitioning, so the
//! stage is quadratic in the number of bodies.

use crate::core::entity::{Entity, Transform, World};
use crate::physics::collision::{test_collision, Contact};
use crate::physics::components::{ColliderType, Rigidbody};
use crate::physics::impulse::{resolve_contact, ContactBody, ContactParams};
use crate::physics::stage::{parse_stage_config, require_non_negative, PhysicsStage, StageError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, trace, warn};

/// Settings read from the `collisionStage` config object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionSettings {
    /// Penetrations at or below this depth are ignored
    pub epsilon: f32,
    /// Coulomb friction coefficient between bodies
    pub mu: f32,
}

impl Default for CollisionSettings {
    fn default() -> Self {
        Self {
            epsilon: 0.0001,
            mu: 0.1,
        }
    }
}

/// Working copy of one body for the duration of a tick
struct BodyState {
    entity: Entity,
    transform: Transform,
    body: Rigidbody,
    touched: bool,
}

/// Body-body collision response
#[derive(Debug, Default)]
pub struct CollisionStage {
    settings: CollisionSettings,
    warned_unsupported: bool,
}

impl CollisionStage {
    pub const NAME: &'static str = "collisionStage";

    pub fn new(settings: CollisionSettings) -> Self {
        Self {
            settings,
            warned_unsupported: false,
        }
    }

    pub fn settings(&self) -> &CollisionSettings {
        &self.settings
    }

    /// Detect and resolve one pair, returning the contact when it was resolved
    fn resolve_pair(&mut self, a: &mut BodyState, b: &mut BodyState) -> Option<Contact> {
        if !a.body.is_dynamic() && !b.body.is_dynamic() {
            return None;
        }

        if a.body.collider == ColliderType::Unsupported || b.body.collider == ColliderType::Unsupported {
            if !self.warned_unsupported {
                warn!(
                    a = ?a.entity,
                    b = ?b.entity,
                    "Collision between unsupported collider types is not implemented, skipping"
                );
                self.warned_unsupported = true;
            }
            return None;
        }

        let shape_a = a.body.collision_shape();
        let shape_b = b.body.collision_shape();
        let bounds_a = shape_a.world_aabb(a.transform.position, a.transform.rotation);
        let bounds_b = shape_b.world_aabb(b.transform.position, b.transform.rotation);
        if !bounds_a.overlaps(&bounds_b) {
            return None;
        }

        let contact = test_collision(
            &shape_a,
            (a.transform.position, a.transform.rotation),
            &shape_b,
            (b.transform.position, b.transform.rotation),
        )?;
        if contact.penetration <= self.settings.epsilon {
            return None;
        }

        // Split the positional correction by inverse mass; the normal points A -> B
        let inv_mass_a = a.body.inverse_mass();
        let inv_mass_b = b.body.inverse_mass();
        let inv_mass_sum = inv_mass_a + inv_mass_b;
        let correction = contact.normal * contact.penetration / inv_mass_sum;
        a.transform.position -= correction * inv_mass_a;
        b.transform.position += correction * inv_mass_b;

        let restitution = a.body.elasticity * b.body.elasticity;
        let mut body_a = ContactBody::new(&mut a.body, &a.transform);
        let mut body_b = ContactBody::new(&mut b.body, &b.transform);
        let impulse = resolve_contact(
            &mut body_a,
            Some(&mut body_b),
            &ContactParams {
                point: contact.position,
                normal: -contact.normal,
                restitution,
                friction: self.settings.mu,
            },
        );

        trace!(
            a = ?a.entity,
            b = ?b.entity,
            penetration = contact.penetration,
            j = impulse.map_or(0.0, |i| i.normal_impulse),
            "Body contact"
        );

        a.touched = true;
        b.touched = true;
        Some(contact)
    }
}

impl PhysicsStage for CollisionStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn initialize(&mut self, config: &Value) -> Result<(), StageError> {
        let settings: CollisionSettings = parse_stage_config(Self::NAME, config)?;
        require_non_negative(Self::NAME, "mu", settings.mu)?;
        self.settings = settings;
        info!(
            epsilon = self.settings.epsilon,
            mu = self.settings.mu,
            "Collision stage initialized"
        );
        Ok(())
    }

    fn execute(&mut self, world: &mut World, _fixed_delta_time: f32) {
        let mut bodies: Vec<BodyState> = world
            .query::<(&Transform, &Rigidbody)>()
            .iter()
            .map(|(entity, (transform, body))| BodyState {
                entity,
                transform: *transform,
                body: body.clone(),
                touched: false,
            })
            .collect();

        let mut contacts = 0usize;
        for j in 1..bodies.len() {
            let (head, tail) = bodies.split_at_mut(j);
            let b = &mut tail[0];
            for a in head.iter_mut() {
                if self.resolve_pair(a, b).is_some() {
                    contacts += 1;
                }
            }
        }

        for state in bodies.into_iter().filter(|state| state.touched) {
            if let Ok((transform, body)) =
                world.query_one_mut::<(&mut Transform, &mut Rigidbody)>(state.entity)
            {
                *transform = state.transform;
                *body = state.body;
            }
        }

        debug!(contacts, "Collision stage tick");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use serde_json::json;

    fn state(position: Vec3, body: Rigidbody) -> BodyState {
        BodyState {
            entity: Entity::DANGLING,
            transform: Transform::from_position(position),
            body,
            touched: false,
        }
    }

    #[test]
    fn test_settings_from_config() {
        let mut stage = CollisionStage::default();
        stage.initialize(&json!({ "epsilon": 0.01 })).unwrap();
        assert_eq!(stage.settings().epsilon, 0.01);
        assert_eq!(stage.settings().mu, 0.1);
    }

    #[test]
    fn test_overlapping_boxes_are_separated_by_inverse_mass() {
        let mut stage = CollisionStage::default();
        let mut a = state(Vec3::ZERO, Rigidbody::dynamic(1.0));
        let mut b = state(Vec3::new(0.9, 0.0, 0.0), Rigidbody::dynamic(3.0));

        let contact = stage.resolve_pair(&mut a, &mut b).unwrap();
        assert!((contact.penetration - 0.1).abs() < 1e-5);

        // Lighter body moves three times as far
        assert!((a.transform.position.x + 0.075).abs() < 1e-5);
        assert!((b.transform.position.x - 0.925).abs() < 1e-5);
        assert!(a.touched && b.touched);
    }

    #[test]
    fn test_approaching_spheres_bounce() {
        let mut stage = CollisionStage::default();
        let sphere = |velocity: Vec3| {
            Rigidbody::new(1.0, ColliderType::Sphere, Vec3::ONE)
                .with_elasticity(1.0)
                .with_velocity(velocity)
        };
        let mut a = state(Vec3::ZERO, sphere(Vec3::X));
        let mut b = state(Vec3::new(0.95, 0.0, 0.0), sphere(-Vec3::X));

        stage.resolve_pair(&mut a, &mut b).unwrap();

        assert!((a.body.velocity.x + 1.0).abs() < 1e-4);
        assert!((b.body.velocity.x - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_immovable_pair_is_skipped() {
        let mut stage = CollisionStage::default();
        let mut a = state(Vec3::ZERO, Rigidbody::immovable(ColliderType::Box, Vec3::ONE));
        let mut b = state(Vec3::new(0.5, 0.0, 0.0), Rigidbody::immovable(ColliderType::Box, Vec3::ONE));
        assert!(stage.resolve_pair(&mut a, &mut b).is_none());
        assert_eq!(b.transform.position.x, 0.5);
    }

    #[test]
    fn test_unsupported_collider_is_skipped() {
        let mut stage = CollisionStage::default();
        let mut odd = Rigidbody::dynamic(1.0);
        odd.collider = ColliderType::Unsupported;
        let mut a = state(Vec3::ZERO, odd);
        let mut b = state(Vec3::new(0.5, 0.0, 0.0), Rigidbody::dynamic(1.0));

        assert!(stage.resolve_pair(&mut a, &mut b).is_none());
        assert!(stage.warned_unsupported);
    }

    #[test]
    fn test_shallow_overlap_below_epsilon_is_ignored() {
        let mut stage = CollisionStage::new(CollisionSettings {
            epsilon: 0.01,
            mu: 0.1,
        });
        let mut a = state(Vec3::ZERO, Rigidbody::dynamic(1.0));
        let mut b = state(Vec3::new(0.995, 0.0, 0.0), Rigidbody::dynamic(1.0));
        assert!(stage.resolve_pair(&mut a, &mut b).is_none());
        assert!(!a.touched);
    }
}
