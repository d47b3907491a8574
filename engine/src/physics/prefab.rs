//! Spawning bodies from JSON prefab descriptions
//!
//! A prefab is an ordered list of single-key component objects:
//!
//! ```json
//! { "name": "crate",
//!   "components": [
//!     { "TransformComponent": { "position": [0, 5, 0], "scale": [1, 1, 1], "rotation": [0, 0, 0] } },
//!     { "RigidBodyComponent": { "mass": 2.0, "elasticity": 0.5, "colliderType": "BOX" } } ] }
//! ```
//!
//! Components are applied in order, so a rigid body can only be sized from a
//! transform listed before it.

use crate::core::entity::{Entity, Name, Transform, World};
use crate::physics::components::{ColliderType, Rigidbody};
use glam::{EulerRot, Quat, Vec3};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while reading a prefab
#[derive(Debug, Error)]
pub enum PrefabError {
    #[error("prefab JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A `components` entry was not a single-key object
    #[error("component entry {index} must be an object with exactly one key")]
    MalformedEntry { index: usize },
    /// A known component carried fields of the wrong type
    #[error("invalid `{component}` data: {source}")]
    InvalidComponent {
        component: String,
        #[source]
        source: serde_json::Error,
    },
    /// The target entity is not in the world
    #[error("prefab target entity does not exist")]
    MissingEntity(#[from] hecs::NoSuchEntity),
}

/// `TransformComponent` fields
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransformDesc {
    pub position: Vec3,
    pub scale: Vec3,
    /// Euler angles in radians, applied X then Y then Z
    pub rotation: Vec3,
}

impl Default for TransformDesc {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
        }
    }
}

impl TransformDesc {
    pub fn build(&self) -> Transform {
        let rotation = Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z);
        Transform::from_position_rotation(self.position, rotation).with_scale(self.scale)
    }
}

/// `RigidBodyComponent` fields
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RigidbodyDesc {
    pub mass: f32,
    pub drag: f32,
    pub angular_drag: f32,
    pub elasticity: f32,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub collider_type: String,
}

impl Default for RigidbodyDesc {
    fn default() -> Self {
        Self {
            mass: 1.0,
            drag: 0.0,
            angular_drag: 0.0,
            elasticity: 0.0,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            collider_type: "BOX".to_string(),
        }
    }
}

impl RigidbodyDesc {
    /// Build the body for an owner with the given transform. Unknown collider
    /// names fall back to a box.
    pub fn build(&self, transform: &Transform) -> Rigidbody {
        let collider = ColliderType::from_name(&self.collider_type).unwrap_or_else(|| {
            warn!(
                collider = %self.collider_type,
                "Unknown collider type, defaulting to BOX"
            );
            ColliderType::Box
        });

        let mut body = Rigidbody::new(self.mass, collider, transform.scale)
            .with_drag(self.drag, self.angular_drag)
            .with_elasticity(self.elasticity)
            .with_velocity(self.velocity);
        body.set_angular_velocity(self.angular_velocity, transform.rotation);
        body
    }
}

enum PrefabComponent {
    Transform(TransformDesc),
    Rigidbody(RigidbodyDesc),
}

#[derive(Debug, Default, Deserialize)]
struct PrefabDocument {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    components: Vec<Value>,
}

fn parse_component<T: for<'de> Deserialize<'de>>(name: &str, data: &Value) -> Result<T, PrefabError> {
    let data = if data.is_null() {
        Value::Object(Map::new())
    } else {
        data.clone()
    };
    serde_json::from_value(data).map_err(|source| PrefabError::InvalidComponent {
        component: name.to_string(),
        source,
    })
}

/// Check a whole prefab document, returning its name and known components
fn parse_prefab(prefab: &Value) -> Result<(String, Vec<PrefabComponent>), PrefabError> {
    let document = PrefabDocument::deserialize(prefab)?;

    let mut components = Vec::with_capacity(document.components.len());
    for (index, entry) in document.components.iter().enumerate() {
        let Some((name, data)) = entry
            .as_object()
            .filter(|object| object.len() == 1)
            .and_then(|object| object.iter().next())
        else {
            return Err(PrefabError::MalformedEntry { index });
        };

        match name.as_str() {
            "TransformComponent" => {
                components.push(PrefabComponent::Transform(parse_component(name, data)?))
            }
            "RigidBodyComponent" => {
                components.push(PrefabComponent::Rigidbody(parse_component(name, data)?))
            }
            other => warn!(component = other, "Component not implemented, skipping"),
        }
    }

    let name = document.name.unwrap_or_else(|| "Prefab".to_string());
    Ok((name, components))
}

fn insert_components(
    world: &mut World,
    entity: Entity,
    name: &str,
    components: Vec<PrefabComponent>,
) -> Result<(), PrefabError> {
    world.insert_one(entity, Name::new(name))?;

    let mut transform: Option<Transform> = None;
    for component in components {
        match component {
            PrefabComponent::Transform(desc) => {
                let built = desc.build();
                world.insert_one(entity, built)?;
                transform = Some(built);
            }
            PrefabComponent::Rigidbody(desc) => {
                let Some(owner) = transform.as_ref() else {
                    warn!(prefab = %name, "RigidBodyComponent requires a TransformComponent first, skipping");
                    continue;
                };
                world.insert_one(entity, desc.build(owner))?;
            }
        }
    }
    Ok(())
}

/// Spawn an entity from a prefab document.
///
/// The whole document is validated before anything is spawned. Component
/// names that are not physics components are logged and skipped, as is a
/// `RigidBodyComponent` with no `TransformComponent` before it.
pub fn spawn_prefab(world: &mut World, prefab: &Value) -> Result<Entity, PrefabError> {
    let (name, components) = parse_prefab(prefab)?;
    let entity = world.spawn((Name::new(name.as_str()),));
    if let Err(e) = insert_components(world, entity, &name, components) {
        world.despawn(entity)?;
        return Err(e);
    }

    debug!(prefab = %name, entity = ?entity, "Spawned prefab");
    Ok(entity)
}

/// Apply a prefab's components to an existing entity, replacing any
/// [`Name`], [`Transform`] or [`Rigidbody`] it already has
pub fn apply_prefab(world: &mut World, entity: Entity, prefab: &Value) -> Result<(), PrefabError> {
    let (name, components) = parse_prefab(prefab)?;
    insert_components(world, entity, &name, components)?;
    debug!(prefab = %name, entity = ?entity, "Applied prefab");
    Ok(())
}
