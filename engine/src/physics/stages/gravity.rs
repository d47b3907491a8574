//! Uniform gravity, integration and ground-plane contact
//!
//! Each tick every dynamic body receives `gravity * mass`, is integrated, and is
//! then tested against the horizontal ground plane at `groundY` using the eight
//! corners of its world bounding box. Penetrating bodies are lifted back onto
//! the plane and receive a restitution impulse plus Coulomb friction at the
//! averaged contact point.
//!
//! Whether a body is resting is judged from the vertical speed it had when the
//! tick started, so the gravity added during the tick does not keep a settled
//! body bouncing.

use crate::core::entity::{Entity, Transform, World};
use crate::physics::components::{DragModel, Rigidbody};
use crate::physics::impulse::{resolve_contact, ContactBody, ContactParams, ImpulseResult};
use crate::physics::integration::integrate_body;
use crate::physics::stage::{parse_stage_config, require_non_negative, PhysicsStage, StageError};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, trace};

/// Bodies slower than this vertically (m/s) count as resting
pub const RESTING_SPEED: f32 = 0.1;

/// Resting bodies within this penetration depth get their vertical motion zeroed
pub const REST_PENETRATION: f32 = 0.001;

/// Resting bodies supported by at least this many corners are damped
pub const STABLE_CONTACT_COUNT: usize = 3;

/// Residual speed (squared) snapped to zero on a damped resting body
const REST_SNAP_SPEED_SQ: f32 = 0.01;

/// Settings read from the `gravityStage` config object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GravitySettings {
    /// Acceleration applied to every dynamic body
    pub gravity: Vec3,
    /// Height of the ground plane
    pub ground_y: f32,
    /// Multiplied with a body's elasticity to get the bounce restitution
    pub ground_restitution: f32,
    /// Coulomb friction coefficient against the ground
    pub mu: f32,
    /// Velocity and angular momentum scale for settled bodies
    pub rest_damping: f32,
    /// Corners this close above the plane count as touching it
    pub contact_tolerance: f32,
    pub drag_model: DragModel,
}

impl Default for GravitySettings {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.8, 0.0),
            ground_y: 0.0,
            ground_restitution: 1.0,
            mu: 0.1,
            rest_damping: 0.5,
            contact_tolerance: 0.01,
            drag_model: DragModel::Linear,
        }
    }
}

/// Result of resolving one body against the ground plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundContact {
    /// Depth below the plane before correction
    pub penetration: f32,
    /// Corrected corners lying on the plane
    pub contacts: usize,
    /// Averaged contact point after correction
    pub point: Vec3,
    /// `None` when the body was already separating
    pub impulse: Option<ImpulseResult>,
    /// Whether resting stabilization zeroed the vertical velocity
    pub stabilized: bool,
}

/// Resolve a body whose world bounding box has the given `corners` against the
/// ground plane.
///
/// Returns `None` when no corner is below the plane. `was_resting` selects zero
/// restitution and enables stabilization.
pub fn resolve_ground_contact(
    transform: &mut Transform,
    rb: &mut Rigidbody,
    corners: &[Vec3; 8],
    was_resting: bool,
    settings: &GravitySettings,
) -> Option<GroundContact> {
    let low_y = corners.iter().map(|c| c.y).fold(f32::INFINITY, f32::min);
    if low_y >= settings.ground_y {
        return None;
    }

    let penetration = settings.ground_y - low_y;
    transform.position.y += penetration;

    let lift = Vec3::new(0.0, penetration, 0.0);
    let touch_height = settings.ground_y + settings.contact_tolerance;
    let (sum, contacts) = corners
        .iter()
        .map(|corner| *corner + lift)
        .filter(|corner| corner.y < touch_height)
        .fold((Vec3::ZERO, 0usize), |(sum, count), corner| {
            (sum + corner, count + 1)
        });
    // The lowest corner sits on the plane after correction, so at least one
    // corner is found unless the tolerance is negative
    let point = if contacts > 0 {
        sum / contacts as f32
    } else {
        Vec3::new(transform.position.x, settings.ground_y, transform.position.z)
    };

    let restitution = if was_resting {
        0.0
    } else {
        rb.elasticity * settings.ground_restitution
    };

    let impulse = {
        let mut body = ContactBody::new(rb, transform);
        resolve_contact(
            &mut body,
            None,
            &ContactParams {
                point,
                normal: Vec3::Y,
                restitution,
                friction: settings.mu,
            },
        )
    };

    let stabilized = was_resting && penetration <= REST_PENETRATION;
    if stabilized {
        rb.velocity.y = 0.0;

        if contacts >= STABLE_CONTACT_COUNT {
            rb.angular_momentum *= settings.rest_damping;
            rb.velocity *= settings.rest_damping;
            if rb.velocity.length_squared() < REST_SNAP_SPEED_SQ {
                rb.velocity = Vec3::ZERO;
            }
            rb.angular_velocity = rb.world_inverse_inertia(transform.rotation) * rb.angular_momentum;
        }
    }

    Some(GroundContact {
        penetration,
        contacts,
        point,
        impulse,
        stabilized,
    })
}

/// Uniform gravity with ground-plane contact
#[derive(Debug, Default)]
pub struct GravityStage {
    settings: GravitySettings,
}

impl GravityStage {
    pub const NAME: &'static str = "gravityStage";

    pub fn new(settings: GravitySettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &GravitySettings {
        &self.settings
    }
}

impl PhysicsStage for GravityStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn initialize(&mut self, config: &Value) -> Result<(), StageError> {
        let settings: GravitySettings = parse_stage_config(Self::NAME, config)?;
        require_non_negative(Self::NAME, "mu", settings.mu)?;
        require_non_negative(Self::NAME, "groundRestitution", settings.ground_restitution)?;
        self.settings = settings;
        info!(
            gravity = ?self.settings.gravity,
            ground_y = self.settings.ground_y,
            mu = self.settings.mu,
            "Gravity stage initialized"
        );
        Ok(())
    }

    fn execute(&mut self, world: &mut World, fixed_delta_time: f32) {
        let bodies: Vec<Entity> = world
            .query::<(&Transform, &Rigidbody)>()
            .iter()
            .filter(|(_, (_, rb))| rb.is_dynamic())
            .map(|(entity, _)| entity)
            .collect();

        let mut grounded = 0usize;
        // Integrate first, then resolve the ground against the new pose; the
        // resting checks rely on this order (DESIGN.md, open question 1)
        for &entity in &bodies {
            let was_resting = match world.query_one_mut::<(&mut Transform, &mut Rigidbody)>(entity) {
                Ok((transform, rb)) => {
                    let was_resting = rb.velocity.y.abs() < RESTING_SPEED;
                    rb.add_force(self.settings.gravity * rb.mass);
                    integrate_body(transform, rb, fixed_delta_time, self.settings.drag_model);
                    was_resting
                }
                Err(_) => continue,
            };

            // Bounds go through the parent chain, so read them between the borrows
            let Some(bounds) = world.world_bounding_box(entity) else {
                continue;
            };

            if let Ok((transform, rb)) = world.query_one_mut::<(&mut Transform, &mut Rigidbody)>(entity) {
                if let Some(contact) =
                    resolve_ground_contact(transform, rb, &bounds.corners, was_resting, &self.settings)
                {
                    grounded += 1;
                    trace!(
                        entity = ?entity,
                        penetration = contact.penetration,
                        contacts = contact.contacts,
                        stabilized = contact.stabilized,
                        "Ground contact"
                    );
                }
            }
        }

        debug!(bodies = bodies.len(), grounded, "Gravity stage tick");
    }
}
