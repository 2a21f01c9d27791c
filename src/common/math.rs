//! Vector helpers and ray intersection primitives.
//!
//! Plain algebra (sums, scaling, cross/dot products, lengths, normalization) is whatever
//! `nalgebra` gives us; this module only holds what nalgebra doesn't. Angles are in degrees.
//! Normalizing a zero vector yields NaN components, so callers have to rule that out first.

use nalgebra::Vector3;

use crate::common::error::{EditorError, EditorResult};
use crate::consts::math::EPSILON;

/// Unsigned angle between `a` and `b` in degrees, within `[0, 180]`.
pub fn absolute_angle(a: &Vector3<f64>, b: &Vector3<f64>) -> EditorResult<f64> {
    if a.norm_squared() <= EPSILON * EPSILON || b.norm_squared() <= EPSILON * EPSILON {
        return Err(EditorError::domain(
            "can't measure the angle of a zero length vector",
        ));
    }
    // atan2 keeps precision near 0 and 180 where acos falls apart.
    Ok(a.cross(b).norm().atan2(a.dot(b)).to_degrees())
}

/// Signed angle from `a` to `b` in degrees, within `(-180, 180]`. Positive when the rotation
/// from `a` to `b` is counter clockwise looking down `axis`.
pub fn angle(a: &Vector3<f64>, b: &Vector3<f64>, axis: &Vector3<f64>) -> EditorResult<f64> {
    let unsigned = absolute_angle(a, b)?;
    if axis.dot(&a.cross(b)) < 0.0 {
        return Ok(-unsigned);
    }
    Ok(unsigned)
}

/// Rodrigues' rotation, right handed about `axis`. `axis` doesn't need to be normalized.
pub fn rotate_around_axis(v: &Vector3<f64>, axis: &Vector3<f64>, degrees: f64) -> Vector3<f64> {
    let k = axis.normalize();
    let (sin, cos) = degrees.to_radians().sin_cos();
    v * cos + k.cross(v) * sin + k * k.dot(v) * (1.0 - cos)
}

pub fn rotate_point_around_line(
    point: &Vector3<f64>,
    point_on_line: &Vector3<f64>,
    dir: &Vector3<f64>,
    degrees: f64,
) -> Vector3<f64> {
    rotate_around_axis(&(point - point_on_line), dir, degrees) + point_on_line
}

/// Signed length of `point - origin` projected onto `dir`.
pub fn distance_along_direction(
    point: &Vector3<f64>,
    origin: &Vector3<f64>,
    dir: &Vector3<f64>,
) -> f64 {
    (point - origin).dot(&dir.normalize())
}

pub fn project_on_vector(v: &Vector3<f64>, onto: &Vector3<f64>) -> Vector3<f64> {
    onto * (v.dot(onto) / onto.norm_squared())
}

pub fn project_point_on_line(
    point: &Vector3<f64>,
    line_point: &Vector3<f64>,
    line_dir: &Vector3<f64>,
) -> Vector3<f64> {
    line_point + project_on_vector(&(point - line_point), line_dir)
}

pub fn project_point_on_plane(
    point: &Vector3<f64>,
    plane_point: &Vector3<f64>,
    plane_normal: &Vector3<f64>,
) -> Vector3<f64> {
    point - project_on_vector(&(point - plane_point), plane_normal)
}

/// Intersects the ray `origin + t * dir` (t >= 0) with the plane through `plane_point`.
///
/// A ray lying inside the plane hits at its own origin. A parallel ray off the plane, or a
/// plane behind the ray, gives `None`.
pub fn ray_plane_intersection(
    origin: &Vector3<f64>,
    dir: &Vector3<f64>,
    plane_normal: &Vector3<f64>,
    plane_point: &Vector3<f64>,
) -> Option<Vector3<f64>> {
    let denom = dir.dot(plane_normal);
    let offset = (plane_point - origin).dot(plane_normal);
    if denom.abs() <= EPSILON {
        if offset.abs() <= EPSILON {
            return Some(*origin);
        }
        return None;
    }

    let t = offset / denom;
    if t < 0.0 {
        return None;
    }
    Some(origin + dir * t)
}

/// Intersects a ray with the rectangle spanned by the edges `rect[1] - rect[0]` and
/// `rect[3] - rect[0]`.
pub fn ray_rectangle_intersection(
    origin: &Vector3<f64>,
    dir: &Vector3<f64>,
    rect: &[Vector3<f64>; 4],
) -> Option<Vector3<f64>> {
    let edge_a = rect[1] - rect[0];
    let edge_b = rect[3] - rect[0];
    let normal = edge_a.cross(&edge_b);

    let hit = ray_plane_intersection(origin, dir, &normal, &rect[0])?;
    let local = hit - rect[0];
    let along_a = local.dot(&edge_a);
    let along_b = local.dot(&edge_b);
    if along_a < 0.0 || along_a > edge_a.norm_squared() {
        return None;
    }
    if along_b < 0.0 || along_b > edge_b.norm_squared() {
        return None;
    }
    Some(hit)
}

/// The point on the infinite line through `line_point` along `line_dir` closest to the
/// ray. `None` when the two are parallel, since every point is then equally close.
pub fn closest_point_on_line_to_ray(
    line_point: &Vector3<f64>,
    line_dir: &Vector3<f64>,
    ray_origin: &Vector3<f64>,
    ray_dir: &Vector3<f64>,
) -> Option<Vector3<f64>> {
    let w0 = line_point - ray_origin;
    let a = line_dir.dot(line_dir);
    let b = line_dir.dot(ray_dir);
    let c = ray_dir.dot(ray_dir);
    let d = line_dir.dot(&w0);
    let e = ray_dir.dot(&w0);

    let denom = a * c - b * b;
    if denom.abs() <= EPSILON * a.max(1.0) * c.max(1.0) {
        return None;
    }
    let s = (b * e - c * d) / denom;
    Some(line_point + line_dir * s)
}
