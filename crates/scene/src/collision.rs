//! Ellipsoid-vs-box collision for the first-person camera.
//!
//! The ellipsoid is approximated by its bounding box and movement is resolved
//! one axis at a time, so a blocked axis does not stop sliding along the
//! others.

use atrium_common::Aabb;
use glam::Vec3;

/// Move a body of half-extents `ellipsoid` from `position` by `displacement`,
/// stopping on any axis that would push it into a collider.
///
/// Colliders the body already overlaps are ignored so enclosing volumes (a
/// room's outer shell) do not trap it.
pub fn slide(position: Vec3, ellipsoid: Vec3, displacement: Vec3, colliders: &[Aabb]) -> Vec3 {
    let start = Aabb::from_center(position, ellipsoid);
    let blocking: Vec<&Aabb> = colliders.iter().filter(|c| !start.intersects(c)).collect();

    let mut pos = position;
    for axis in 0..3 {
        if displacement[axis] == 0.0 {
            continue;
        }
        let mut candidate = pos;
        candidate[axis] += displacement[axis];
        let body = Aabb::from_center(candidate, ellipsoid);
        if blocking.iter().all(|c| !body.intersects(c)) {
            pos = candidate;
        }
    }
    pos
}
