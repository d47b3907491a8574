//! Narrow phase collision detection for generating contact points

use super::shapes::box_corners;
use super::Contact;
use crate::physics::components::CollisionShape;
use glam::{Quat, Vec3};

/// Slack used when deciding whether a box corner touches the other box
const CORNER_TOLERANCE: f32 = 0.01;

/// Overlap test between two placed shapes.
///
/// Each shape comes with its `(position, rotation)`. The returned normal points
/// from A to B; `None` means the shapes are apart.
pub fn test_collision(
    shape_a: &CollisionShape,
    (pos_a, rot_a): (Vec3, Quat),
    shape_b: &CollisionShape,
    (pos_b, rot_b): (Vec3, Quat),
) -> Option<Contact> {
    use CollisionShape::{Box as Cuboid, Sphere};

    match (*shape_a, *shape_b) {
        (Sphere { radius: ra }, Sphere { radius: rb }) => sphere_sphere_collision(pos_a, ra, pos_b, rb),
        (Sphere { radius }, Cuboid { half_extents }) => {
            sphere_box_collision(pos_a, radius, pos_b, rot_b, half_extents)
        }
        (Cuboid { half_extents }, Sphere { radius }) => {
            sphere_box_collision(pos_b, radius, pos_a, rot_a, half_extents).map(Contact::flipped)
        }
        (Cuboid { half_extents: ha }, Cuboid { half_extents: hb }) => {
            box_box_collision(pos_a, rot_a, ha, pos_b, rot_b, hb)
        }
    }
}

fn sphere_sphere_collision(center_a: Vec3, radius_a: f32, center_b: Vec3, radius_b: f32) -> Option<Contact> {
    let reach = radius_a + radius_b;
    let offset = center_b - center_a;
    if offset.length_squared() > reach * reach {
        return None;
    }

    let gap = offset.length();
    // Concentric spheres, any direction separates them
    let normal = offset.try_normalize().unwrap_or(Vec3::Y);
    let penetration = reach - gap;

    // Midway through the overlapping lens
    let point = center_a + normal * (radius_a - penetration * 0.5);
    Some(Contact::new(point, normal, penetration))
}

/// Sphere (A) against an oriented box (B), by the box point closest to the
/// sphere center
fn sphere_box_collision(
    center: Vec3,
    radius: f32,
    box_center: Vec3,
    box_rotation: Quat,
    half_extents: Vec3,
) -> Option<Contact> {
    let local_center = box_rotation.conjugate() * (center - box_center);
    let nearest = local_center.clamp(-half_extents, half_extents);
    let outside = local_center - nearest;
    if outside.length_squared() > radius * radius {
        return None;
    }

    // Outward face direction of the box towards the sphere, in box space
    let (face, penetration) = match outside.try_normalize() {
        Some(direction) => (direction, radius - outside.length()),
        None => {
            // Center is inside the box, leave through the closest face
            let depth = half_extents - local_center.abs();
            let axis = if depth.x <= depth.y && depth.x <= depth.z {
                0
            } else if depth.y <= depth.z {
                1
            } else {
                2
            };
            let mut face = Vec3::ZERO;
            face[axis] = if local_center[axis] < 0.0 { -1.0 } else { 1.0 };
            (face, radius + depth[axis])
        }
    };

    let box_to_sphere = box_rotation * face;
    let point = center - box_to_sphere * radius;
    Some(Contact::new(point, -box_to_sphere, penetration))
}

/// Oriented box in world space
#[derive(Debug, Clone, Copy)]
struct OrientedBox {
    center: Vec3,
    rotation: Quat,
    half_extents: Vec3,
    axes: [Vec3; 3],
}

impl OrientedBox {
    fn new(center: Vec3, rotation: Quat, half_extents: Vec3) -> Self {
        Self {
            center,
            rotation,
            half_extents,
            axes: [rotation * Vec3::X, rotation * Vec3::Y, rotation * Vec3::Z],
        }
    }

    /// Half length of the box's shadow on `axis`
    fn projected_radius(&self, axis: Vec3) -> f32 {
        self.axes
            .iter()
            .zip(self.half_extents.to_array())
            .map(|(local, extent)| extent * local.dot(axis).abs())
            .sum()
    }

    /// Corner reaching furthest along `direction`
    fn furthest_corner(&self, direction: Vec3) -> Vec3 {
        self.axes
            .iter()
            .zip(self.half_extents.to_array())
            .fold(self.center, |acc, (local, extent)| {
                acc + *local * extent.copysign(local.dot(direction))
            })
    }

    fn encloses(&self, point: Vec3) -> bool {
        let local = self.rotation.conjugate() * (point - self.center);
        local
            .abs()
            .cmple(self.half_extents + Vec3::splat(CORNER_TOLERANCE))
            .all()
    }

    fn corners(&self) -> [Vec3; 8] {
        box_corners(self.center, self.rotation, self.half_extents)
    }
}

/// Box-box overlap by the separating axis test over the 15 candidate axes
fn box_box_collision(
    pos_a: Vec3,
    rot_a: Quat,
    extents_a: Vec3,
    pos_b: Vec3,
    rot_b: Quat,
    extents_b: Vec3,
) -> Option<Contact> {
    let a = OrientedBox::new(pos_a, rot_a, extents_a);
    let b = OrientedBox::new(pos_b, rot_b, extents_b);
    let offset = b.center - a.center;

    let edge_axes = a
        .axes
        .iter()
        .flat_map(|&ea| b.axes.iter().map(move |&eb| ea.cross(eb)))
        // Parallel edges produce no new axis
        .filter(|axis| axis.length_squared() > 1e-6)
        .map(Vec3::normalize);

    let mut shallowest: Option<(f32, Vec3)> = None;
    for axis in a.axes.into_iter().chain(b.axes).chain(edge_axes) {
        let along = offset.dot(axis);
        let overlap = a.projected_radius(axis) + b.projected_radius(axis) - along.abs();
        if overlap < 0.0 {
            return None;
        }
        if shallowest.map_or(true, |(best, _)| overlap < best) {
            let towards_b = if along < 0.0 { -axis } else { axis };
            shallowest = Some((overlap, towards_b));
        }
    }

    let (penetration, normal) = shallowest?;
    Some(Contact::new(overlap_point(&a, &b, normal), normal, penetration))
}

/// Mean of the corners of either box that lie inside the other. Edge-edge
/// contacts enclose no corner, so the midpoint of the two deepest corners is
/// used instead.
fn overlap_point(a: &OrientedBox, b: &OrientedBox, normal: Vec3) -> Vec3 {
    let enclosed: Vec<Vec3> = a
        .corners()
        .into_iter()
        .filter(|&corner| b.encloses(corner))
        .chain(b.corners().into_iter().filter(|&corner| a.encloses(corner)))
        .collect();

    if enclosed.is_empty() {
        return (a.furthest_corner(normal) + b.furthest_corner(-normal)) * 0.5;
    }
    enclosed.iter().copied().sum::<Vec3>() / enclosed.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> CollisionShape {
        CollisionShape::Box {
            half_extents: Vec3::splat(0.5),
        }
    }

    #[test]
    fn test_sphere_sphere_collision() {
        let contact =
            sphere_sphere_collision(Vec3::ZERO, 1.0, Vec3::new(1.5, 0.0, 0.0), 1.0).unwrap();
        assert!((contact.penetration - 0.5).abs() < 1e-6);
        assert!((contact.normal - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_no_collision() {
        let contact = sphere_sphere_collision(Vec3::ZERO, 1.0, Vec3::new(10.0, 0.0, 0.0), 1.0);
        assert!(contact.is_none());
    }

    #[test]
    fn test_sphere_box_normal_points_from_sphere_to_box() {
        let contact = sphere_box_collision(
            Vec3::new(1.5, 0.0, 0.0),
            1.0,
            Vec3::ZERO,
            Quat::IDENTITY,
            Vec3::ONE,
        )
        .unwrap();
        assert!((contact.penetration - 0.5).abs() < 1e-6);
        assert!((contact.normal + Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_sphere_centre_inside_box() {
        let contact = sphere_box_collision(
            Vec3::new(0.0, 0.8, 0.0),
            0.5,
            Vec3::ZERO,
            Quat::IDENTITY,
            Vec3::ONE,
        )
        .unwrap();
        // Nearest face is +Y, 0.2 away; sphere must travel 0.2 + radius to clear it
        assert!((contact.penetration - 0.7).abs() < 1e-5);
        assert!((contact.normal + Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_box_sphere_dispatch_is_flipped() {
        let contact = test_collision(
            &unit_box(),
            (Vec3::ZERO, Quat::IDENTITY),
            &CollisionShape::Sphere { radius: 0.5 },
            (Vec3::new(0.0, 0.9, 0.0), Quat::IDENTITY),
        )
        .unwrap();
        assert!((contact.normal - Vec3::Y).length() < 1e-6);
        assert!((contact.penetration - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_box_box_stacked() {
        let contact = test_collision(
            &unit_box(),
            (Vec3::ZERO, Quat::IDENTITY),
            &unit_box(),
            (Vec3::new(0.0, 0.9, 0.0), Quat::IDENTITY),
        )
        .unwrap();
        assert!((contact.normal - Vec3::Y).length() < 1e-5);
        assert!((contact.penetration - 0.1).abs() < 1e-5);
        // Face contact: point averaged over the overlapping corners, centred in x/z
        assert!(contact.position.x.abs() < 1e-5);
        assert!(contact.position.z.abs() < 1e-5);
    }

    #[test]
    fn test_box_box_separated() {
        let contact = test_collision(
            &unit_box(),
            (Vec3::ZERO, Quat::IDENTITY),
            &unit_box(),
            (Vec3::new(1.2, 0.0, 0.0), Quat::from_rotation_y(0.3)),
        );
        assert!(contact.is_none());
    }
}
