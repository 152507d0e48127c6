//! Geometric primitives shared by the collision index and the pointer
//! resolver.
//!
//! All values are world-space `glam` vectors.

use glam::Vec3;
use serde::{Deserialize, Serialize};

const EPSILON: f32 = 1e-6;

/// Vertical swept sphere approximating the character body.
///
/// `start` is the centre of the bottom sphere and `end` the centre of the top
/// sphere. The segment between them never changes length or orientation once
/// the capsule is created; only [`Capsule::translate`] and
/// [`Capsule::seat_at`] move it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    pub start: Vec3,
    pub end: Vec3,
    pub radius: f32,
}

impl Capsule {
    /// Builds a capsule whose bottom sphere rests on `feet`.
    pub fn standing_at(feet: Vec3, radius: f32, height: f32) -> Self {
        Self {
            start: feet + Vec3::new(0.0, radius, 0.0),
            end: feet + Vec3::new(0.0, height, 0.0),
            radius,
        }
    }

    /// Moves both endpoints so that the bottom sphere rests on `feet` again.
    pub fn seat_at(&mut self, feet: Vec3) {
        let segment = self.end - self.start;
        self.start = feet + Vec3::new(0.0, self.radius, 0.0);
        self.end = self.start + segment;
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.start += offset;
        self.end += offset;
    }

    pub fn center(&self) -> Vec3 {
        (self.start + self.end) * 0.5
    }

    /// Vertical distance between the two sphere centres.
    pub fn segment_height(&self) -> f32 {
        self.end.y - self.start.y
    }

    /// Point on the ground directly below the bottom sphere.
    pub fn feet(&self) -> Vec3 {
        self.start - Vec3::new(0.0, self.radius, 0.0)
    }

    pub fn bounds(&self) -> Aabb {
        let r = Vec3::splat(self.radius);
        Aabb {
            min: self.start.min(self.end) - r,
            max: self.start.max(self.end) + r,
        }
    }
}

/// Axis aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box that contains nothing; expanding it by any point yields that point.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn include_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn expanded(&self, margin: f32) -> Aabb {
        let margin = Vec3::splat(margin);
        Aabb {
            min: self.min - margin,
            max: self.max + margin,
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    /// Splits the box into its eight octants around the centre.
    pub fn octants(&self) -> [Aabb; 8] {
        let half = (self.max - self.min) * 0.5;
        let mut out = [Aabb::EMPTY; 8];
        for (i, slot) in out.iter_mut().enumerate() {
            let offset = Vec3::new(
                if i & 1 == 0 { 0.0 } else { half.x },
                if i & 2 == 0 { 0.0 } else { half.y },
                if i & 4 == 0 { 0.0 } else { half.z },
            );
            let min = self.min + offset;
            *slot = Aabb::new(min, min + half);
        }
        out
    }

    /// Slab test; returns the entry distance along the ray when it hits.
    pub fn ray_entry(&self, ray: &Ray) -> Option<f32> {
        let inv = ray.direction.recip();
        let t0 = (self.min - ray.origin) * inv;
        let t1 = (self.max - ray.origin) * inv;
        let near = t0.min(t1).max_element();
        let far = t0.max(t1).min_element();
        if far >= near.max(0.0) {
            Some(near.max(0.0))
        } else {
            None
        }
    }
}

/// Half line used for pointer picking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Creates a ray; `direction` is normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// World-space triangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    /// Unit face normal following counter-clockwise winding, or `None` for
    /// degenerate (zero area) triangles.
    pub fn normal(&self) -> Option<Vec3> {
        let n = (self.b - self.a).cross(self.c - self.a);
        (n.length_squared() > EPSILON * EPSILON).then(|| n.normalize())
    }

    pub fn bounds(&self) -> Aabb {
        Aabb {
            min: self.a.min(self.b).min(self.c),
            max: self.a.max(self.b).max(self.c),
        }
    }

    pub fn edges(&self) -> [(Vec3, Vec3); 3] {
        [(self.a, self.b), (self.b, self.c), (self.c, self.a)]
    }

    /// Barycentric containment of `point` projected onto the triangle plane.
    pub fn contains_point(&self, point: Vec3) -> bool {
        let v0 = self.c - self.a;
        let v1 = self.b - self.a;
        let v2 = point - self.a;
        let dot00 = v0.dot(v0);
        let dot01 = v0.dot(v1);
        let dot02 = v0.dot(v2);
        let dot11 = v1.dot(v1);
        let dot12 = v1.dot(v2);
        let denom = dot00 * dot11 - dot01 * dot01;
        if denom.abs() <= f32::EPSILON {
            return false;
        }
        let inv = 1.0 / denom;
        let u = (dot11 * dot02 - dot01 * dot12) * inv;
        let v = (dot00 * dot12 - dot01 * dot02) * inv;
        u >= 0.0 && v >= 0.0 && u + v <= 1.0
    }

    /// Möller–Trumbore intersection, double sided. Returns the hit distance.
    pub fn ray_intersect(&self, ray: &Ray) -> Option<f32> {
        let edge1 = self.b - self.a;
        let edge2 = self.c - self.a;
        let p = ray.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = ray.origin - self.a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(edge1);
        let v = ray.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = edge2.dot(q) * inv_det;
        (t >= 0.0).then_some(t)
    }
}

/// Closest points between segments `p1..q1` and `p2..q2`.
///
/// Returns `(on_first, on_second)`. Degenerate segments collapse to points.
pub fn closest_points_on_segments(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (Vec3, Vec3) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);

    if a <= EPSILON && e <= EPSILON {
        return (p1, p2);
    }

    let (s, t) = if a <= EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let s = if denom > EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let t = (b * s + f) / e;
            if t < 0.0 {
                ((-c / a).clamp(0.0, 1.0), 0.0)
            } else if t > 1.0 {
                (((b - c) / a).clamp(0.0, 1.0), 1.0)
            } else {
                (s, t)
            }
        }
    };

    (p1 + d1 * s, p2 + d2 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_triangle() -> Triangle {
        Triangle::new(
            Vec3::new(-1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, -1.0),
        )
    }

    #[test]
    fn counter_clockwise_floor_faces_up() {
        assert_eq!(floor_triangle().normal(), Some(Vec3::Y));
    }

    #[test]
    fn degenerate_triangle_has_no_normal() {
        let tri = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::X * 2.0);
        assert!(tri.normal().is_none());
    }

    #[test]
    fn contains_point_ignores_plane_offset() {
        let tri = floor_triangle();
        assert!(tri.contains_point(Vec3::new(0.5, 3.0, 0.0)));
        assert!(!tri.contains_point(Vec3::new(-0.5, 0.0, -0.5)));
    }

    #[test]
    fn ray_hits_triangle_from_either_side() {
        let tri = floor_triangle();
        let down = Ray::new(Vec3::new(0.5, 4.0, 0.0), Vec3::NEG_Y);
        let up = Ray::new(Vec3::new(0.5, -2.0, 0.0), Vec3::Y);
        assert!((tri.ray_intersect(&down).unwrap() - 4.0).abs() < 1e-5);
        assert!((tri.ray_intersect(&up).unwrap() - 2.0).abs() < 1e-5);
        let away = Ray::new(Vec3::new(0.5, 4.0, 0.0), Vec3::Y);
        assert!(tri.ray_intersect(&away).is_none());
    }

    #[test]
    fn capsule_keeps_segment_when_reseated() {
        let mut capsule = Capsule::standing_at(Vec3::ZERO, 0.35, 1.0);
        let height = capsule.segment_height();
        capsule.translate(Vec3::new(4.0, -2.0, 1.0));
        capsule.seat_at(Vec3::new(1.0, 2.0, 3.0));
        assert!((capsule.feet() - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
        assert!((capsule.segment_height() - height).abs() < 1e-6);
    }

    #[test]
    fn octants_tile_the_parent() {
        let parent = Aabb::new(Vec3::ZERO, Vec3::splat(2.0));
        let merged = parent
            .octants()
            .iter()
            .fold(Aabb::EMPTY, |acc, child| acc.union(child));
        assert_eq!(merged, parent);
    }

    #[test]
    fn ray_entry_reports_distance_to_box() {
        let cube = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!((cube.ray_entry(&ray).unwrap() - 4.0).abs() < 1e-6);
        let miss = Ray::new(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!(cube.ray_entry(&miss).is_none());
    }

    #[test]
    fn closest_points_between_crossing_segments() {
        let (a, b) = closest_points_on_segments(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
        );
        assert_eq!(a, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(b, Vec3::ZERO);
    }
}
