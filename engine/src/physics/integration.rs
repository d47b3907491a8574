//! Semi-implicit Euler integration of a single rigid body

use crate::core::entity::Transform;
use crate::physics::components::{DragModel, Rigidbody};
use glam::Quat;

/// Rotations below this angular speed (rad/s, squared) are not applied
const MIN_ANGULAR_SPEED_SQ: f32 = 1e-12;

/// Advance one body by `dt` using its accumulated force and torque.
///
/// Velocity is updated before position. Angular momentum is the authoritative
/// rotational state; angular velocity is rederived from it through the world
/// inverse inertia tensor. Accumulators are cleared afterwards, and immovable
/// bodies only get their accumulators cleared.
pub fn integrate_body(transform: &mut Transform, rb: &mut Rigidbody, dt: f32, drag: DragModel) {
    if !rb.is_dynamic() {
        rb.clear_accumulators();
        return;
    }

    rb.velocity += rb.force / rb.mass * dt;
    rb.angular_momentum += rb.torque * dt;

    rb.velocity *= drag.factor(rb.linear_drag, dt);
    rb.angular_momentum *= drag.factor(rb.angular_drag, dt);

    let world_inverse_inertia = rb.world_inverse_inertia(transform.rotation);
    rb.angular_velocity = world_inverse_inertia * rb.angular_momentum;

    transform.position += rb.velocity * dt;

    let angular_speed_sq = rb.angular_velocity.length_squared();
    if angular_speed_sq > MIN_ANGULAR_SPEED_SQ {
        let angular_speed = angular_speed_sq.sqrt();
        let axis = rb.angular_velocity / angular_speed;
        let delta = Quat::from_axis_angle(axis, angular_speed * dt);
        transform.rotation = (delta * transform.rotation).normalize();
    }

    rb.clear_accumulators();
}
