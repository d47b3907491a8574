//! Single-contact impulse resolution shared by the ground and pairwise stages
//!
//! A contact is described from body A's point of view: the normal points away
//! from the other surface, towards A. Against the static ground plane there is
//! no body B and the normal is `+Y`.

use crate::core::entity::Transform;
use crate::physics::components::Rigidbody;
use glam::{Mat3, Vec3};
use tracing::trace;

/// Normal relative velocity must be below this for the contact to be resolved;
/// anything above is treated as already separating
pub const APPROACH_THRESHOLD: f32 = -0.01;

/// Tangential slip with a squared length below this is numerical noise and gets
/// no friction impulse
pub const TANGENT_NOISE_SQ: f32 = 0.01;

/// Effective-mass denominators below this are degenerate (two immovable bodies)
const MIN_DENOMINATOR: f32 = 1e-9;

/// Mutable view of one body taking part in a contact
pub struct ContactBody<'a> {
    pub body: &'a mut Rigidbody,
    /// Centre of mass in world space
    pub center: Vec3,
    pub world_inverse_inertia: Mat3,
}

impl<'a> ContactBody<'a> {
    /// View a body at the pose described by `transform`
    pub fn new(body: &'a mut Rigidbody, transform: &Transform) -> Self {
        let world_inverse_inertia = body.world_inverse_inertia(transform.rotation);
        Self {
            body,
            center: transform.position,
            world_inverse_inertia,
        }
    }

    fn velocity_at(&self, r: Vec3) -> Vec3 {
        self.body.velocity + self.body.angular_velocity.cross(r)
    }

    /// `(r × d) · (W (r × d))`, the rotational share of the effective mass
    fn angular_term(&self, r: Vec3, direction: Vec3) -> f32 {
        let r_cross_d = r.cross(direction);
        r_cross_d.dot(self.world_inverse_inertia * r_cross_d)
    }

    fn apply(&mut self, impulse: Vec3, r: Vec3) {
        self.body
            .apply_impulse(impulse, r, self.world_inverse_inertia);
    }
}

/// Contact geometry and material response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactParams {
    /// World space contact point
    pub point: Vec3,
    /// Unit normal pointing towards body A
    pub normal: Vec3,
    /// Effective restitution for this contact
    pub restitution: f32,
    /// Coulomb friction coefficient
    pub friction: f32,
}

/// Impulses applied while resolving a contact
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImpulseResult {
    /// Normal relative velocity before resolution
    pub normal_velocity: f32,
    /// Magnitude of the normal impulse applied to A
    pub normal_impulse: f32,
    /// Signed friction impulse along `tangent`, zero when no friction was applied
    pub friction_impulse: f32,
    pub tangent: Vec3,
}

/// Resolve one contact between body A and an optional body B.
///
/// Returns `None` when the bodies are separating (normal relative velocity not
/// below [`APPROACH_THRESHOLD`]) or when neither body can move. Otherwise A
/// receives `j * normal` plus the friction impulse and B the opposite, both
/// applied at the contact point so angular momentum changes as well.
pub fn resolve_contact(
    a: &mut ContactBody<'_>,
    mut b: Option<&mut ContactBody<'_>>,
    params: &ContactParams,
) -> Option<ImpulseResult> {
    let normal = params.normal;
    let r_a = params.point - a.center;
    let r_b = b.as_ref().map_or(Vec3::ZERO, |b| params.point - b.center);

    let relative_velocity =
        a.velocity_at(r_a) - b.as_ref().map_or(Vec3::ZERO, |b| b.velocity_at(r_b));
    let normal_velocity = relative_velocity.dot(normal);

    if normal_velocity >= APPROACH_THRESHOLD {
        return None;
    }

    let inverse_mass_sum =
        a.body.inverse_mass() + b.as_ref().map_or(0.0, |b| b.body.inverse_mass());
    let normal_term = a.angular_term(r_a, normal)
        + b.as_ref().map_or(0.0, |b| b.angular_term(r_b, normal));
    let denominator = inverse_mass_sum + normal_term;
    if denominator < MIN_DENOMINATOR {
        return None;
    }

    let j = -(1.0 + params.restitution) * normal_velocity / denominator;
    let impulse = normal * j;
    a.apply(impulse, r_a);
    if let Some(b) = b.as_mut() {
        b.apply(-impulse, r_b);
    }

    let mut result = ImpulseResult {
        normal_velocity,
        normal_impulse: j,
        ..Default::default()
    };

    // Friction opposes the pre-impulse tangential slip
    let tangent = relative_velocity - normal * normal_velocity;
    if tangent.length_squared() > TANGENT_NOISE_SQ {
        let tangent = tangent.normalize();
        let tangent_velocity = relative_velocity.dot(tangent);
        let tangent_term = a.angular_term(r_a, tangent)
            + b.as_ref().map_or(0.0, |b| b.angular_term(r_b, tangent));

        // Negative coefficients or restitution can flip the sign of `j`
        let max_friction = (params.friction * j).abs();
        let jt = (-tangent_velocity / (inverse_mass_sum + tangent_term))
            .max(-max_friction)
            .min(max_friction);

        let friction_impulse = tangent * jt;
        a.apply(friction_impulse, r_a);
        if let Some(b) = b.as_mut() {
            b.apply(-friction_impulse, r_b);
        }

        result.friction_impulse = jt;
        result.tangent = tangent;
    }

    trace!(
        normal_velocity,
        j,
        jt = result.friction_impulse,
        "Resolved contact"
    );

    Some(result)
}
