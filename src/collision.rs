//! Static collision index built once from the collider subgraph.
//!
//! Triangles live in a flat list; the octree cells only store indices into
//! it, so a triangle that straddles several cells is tested once per query.

use glam::Vec3;
use log::debug;

use crate::geometry::{closest_points_on_segments, Aabb, Capsule, Triangle};
use crate::scene::{NodeId, SceneGraph};

const TRIANGLES_PER_LEAF: usize = 8;
const MAX_DEPTH: u32 = 16;
const BOUNDS_MARGIN: f32 = 0.01;
/// Separation below which a sphere still counts as touching a face.
const CONTACT_SLOP: f32 = 1e-4;

/// Combined push-out for one capsule query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit direction the capsule has to move to separate.
    pub normal: Vec3,
    /// Distance along `normal`; zero when the capsule is exactly touching.
    pub depth: f32,
}

#[derive(Debug, Clone)]
struct Cell {
    bounds: Aabb,
    triangles: Vec<u32>,
    children: Vec<Cell>,
}

impl Cell {
    fn split(&mut self, all: &[Triangle], depth: u32) {
        if self.triangles.len() <= TRIANGLES_PER_LEAF || depth >= MAX_DEPTH {
            return;
        }
        for bounds in self.bounds.octants() {
            let triangles: Vec<u32> = self
                .triangles
                .iter()
                .copied()
                .filter(|index| all[*index as usize].bounds().intersects(&bounds))
                .collect();
            if triangles.is_empty() {
                continue;
            }
            let mut child = Cell {
                bounds,
                triangles,
                children: Vec::new(),
            };
            child.split(all, depth + 1);
            self.children.push(child);
        }
        self.triangles.clear();
    }

    fn collect(&self, query: &Aabb, out: &mut Vec<u32>) {
        if !self.bounds.intersects(query) {
            return;
        }
        out.extend_from_slice(&self.triangles);
        for child in &self.children {
            child.collect(query, out);
        }
    }

    fn depth(&self) -> u32 {
        1 + self.children.iter().map(Cell::depth).max().unwrap_or(0)
    }
}

/// Octree over immutable world triangles.
#[derive(Debug, Clone, Default)]
pub struct CollisionIndex {
    triangles: Vec<Triangle>,
    root: Option<Cell>,
}

impl CollisionIndex {
    /// Index that never reports a contact.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds the index from every mesh under `roots`.
    pub fn from_scene(scene: &SceneGraph, roots: &[NodeId]) -> Self {
        let triangles = roots
            .iter()
            .flat_map(|root| scene.subtree_triangles(*root))
            .map(|(_, triangle)| triangle)
            .collect();
        Self::from_triangles(triangles)
    }

    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        let triangles: Vec<Triangle> = triangles
            .into_iter()
            .filter(|triangle| triangle.normal().is_some())
            .collect();
        if triangles.is_empty() {
            return Self::empty();
        }

        let bounds = triangles
            .iter()
            .fold(Aabb::EMPTY, |acc, triangle| acc.union(&triangle.bounds()))
            .expanded(BOUNDS_MARGIN);
        let mut root = Cell {
            bounds,
            triangles: (0..triangles.len() as u32).collect(),
            children: Vec::new(),
        };
        root.split(&triangles, 0);
        debug!(
            "collision index built: {} triangles, depth {}",
            triangles.len(),
            root.depth()
        );
        Self {
            triangles,
            root: Some(root),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Distinct triangles whose cells overlap `query`.
    fn candidates(&self, query: &Aabb) -> Vec<u32> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            root.collect(query, &mut out);
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Resolves every triangle contact against a probe copy of `capsule` and
    /// reports the net correction as a single contact.
    pub fn capsule_intersect(&self, capsule: &Capsule) -> Option<Contact> {
        let mut probe = *capsule;
        let mut touched = Vec3::ZERO;
        let mut hit = false;

        for index in self.candidates(&capsule.bounds()) {
            let triangle = &self.triangles[index as usize];
            if let Some(contact) = triangle_capsule_contact(triangle, &probe) {
                hit = true;
                touched += contact.normal;
                probe.translate(contact.normal * contact.depth);
            }
        }

        if !hit {
            return None;
        }

        let correction = probe.center() - capsule.center();
        let length = correction.length();
        let (normal, depth) = if length > f32::EPSILON {
            (correction / length, length)
        } else {
            // Resting contact: nothing to push, but callers still need the
            // surface orientation for the grounded test.
            (touched.normalize_or_zero(), 0.0)
        };
        Some(Contact { normal, depth })
    }
}

/// Contact between one triangle and a capsule, if they overlap.
pub fn triangle_capsule_contact(triangle: &Triangle, capsule: &Capsule) -> Option<Contact> {
    let normal = triangle.normal()?;
    let radius = capsule.radius;
    let d1 = normal.dot(capsule.start - triangle.a) - radius;
    let d2 = normal.dot(capsule.end - triangle.a) - radius;

    if (d1 > CONTACT_SLOP && d2 > CONTACT_SLOP) || (d1 < -radius && d2 < -radius) {
        return None;
    }

    let span = d1.abs() + d2.abs();
    let t = if span > f32::EPSILON {
        (d1 / span).abs()
    } else {
        0.0
    };
    let point = capsule.start.lerp(capsule.end, t);
    if triangle.contains_point(point) {
        return Some(Contact {
            normal,
            depth: (-d1.min(d2)).max(0.0),
        });
    }

    let radius_sq = radius * radius;
    for (edge_start, edge_end) in triangle.edges() {
        let (on_capsule, on_edge) =
            closest_points_on_segments(capsule.start, capsule.end, edge_start, edge_end);
        let distance_sq = on_capsule.distance_squared(on_edge);
        if distance_sq < radius_sq {
            let away = (on_capsule - on_edge).normalize_or_zero();
            if away == Vec3::ZERO {
                continue;
            }
            return Some(Contact {
                normal: away,
                depth: radius - distance_sq.sqrt(),
            });
        }
    }

    None
}
