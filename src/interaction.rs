//! Pointer picking against the registered interactable subtrees.

use std::collections::HashMap;

use glam::Vec2;
use log::debug;

use crate::camera::Camera;
use crate::config::NameConfig;
use crate::geometry::Ray;
use crate::scene::{NodeId, SceneGraph};

/// What clicking a registered name does, decided once at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    InfoPanel(String),
    Reactive(String),
}

impl Target {
    pub fn name(&self) -> &str {
        match self {
            Target::InfoPanel(name) | Target::Reactive(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    Pointer,
}

/// Registered names plus the scene nodes whose subtrees are ray tested.
#[derive(Debug, Clone, Default)]
pub struct InteractableRegistry {
    targets: HashMap<String, Target>,
    nodes: Vec<NodeId>,
}

impl InteractableRegistry {
    /// Registers every node that is, or is the nearest registered ancestor
    /// of, some node in the scene. Each node is added once.
    pub fn build(scene: &SceneGraph, names: &NameConfig) -> Self {
        let targets: HashMap<String, Target> = names
            .interactables
            .iter()
            .map(|name| {
                let target = if names.creatures.contains(name) {
                    Target::Reactive(name.clone())
                } else {
                    Target::InfoPanel(name.clone())
                };
                (name.clone(), target)
            })
            .collect();

        let mut registry = Self {
            targets,
            nodes: Vec::new(),
        };
        for id in scene.traverse() {
            if let Some(owner) = registry.owner_of(scene, id) {
                if !registry.nodes.contains(&owner) {
                    registry.nodes.push(owner);
                }
            }
        }
        debug!(
            "registered {} interactable node(s) for {} name(s)",
            registry.nodes.len(),
            registry.targets.len()
        );
        registry
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    /// Nearest ancestor of `id` (itself included) carrying a registered name.
    fn owner_of(&self, scene: &SceneGraph, id: NodeId) -> Option<NodeId> {
        scene
            .ancestors(id)
            .find(|ancestor| self.targets.contains_key(&scene.node(*ancestor).name))
    }

    /// Mesh nodes under the registered subtrees hit by `ray`, nearest first.
    fn hits(&self, scene: &SceneGraph, ray: &Ray) -> Vec<(f32, NodeId)> {
        let mut hits = Vec::new();
        for root in &self.nodes {
            let bounds = scene.subtree_bounds(*root);
            if bounds.is_empty() || bounds.ray_entry(ray).is_none() {
                continue;
            }
            for (node, triangle) in scene.subtree_triangles(*root) {
                if let Some(distance) = triangle.ray_intersect(ray) {
                    hits.push((distance, node));
                }
            }
        }
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits
    }
}

/// Resolves the pointer at `ndc` to the nearest registered target.
pub fn resolve_target<'a>(
    ndc: Vec2,
    camera: &Camera,
    registry: &'a InteractableRegistry,
    scene: &SceneGraph,
) -> Option<&'a Target> {
    let ray = camera.ray_from_ndc(ndc);
    registry
        .hits(scene, &ray)
        .into_iter()
        .find_map(|(_, node)| {
            let owner = registry.owner_of(scene, node)?;
            registry.target(&scene.node(owner).name)
        })
}

/// Cursor to show for the pointer at `ndc`.
pub fn hover_cursor(
    ndc: Vec2,
    camera: &Camera,
    registry: &InteractableRegistry,
    scene: &SceneGraph,
    overlay_open: bool,
) -> CursorStyle {
    if overlay_open {
        return CursorStyle::Default;
    }
    let ray = camera.ray_from_ndc(ndc);
    if registry.hits(scene, &ray).is_empty() {
        CursorStyle::Default
    } else {
        CursorStyle::Pointer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::input::Viewport;
    use crate::obj::TriangleMesh;
    use crate::scene::SceneNode;
    use glam::Vec3;

    struct Fixture {
        scene: SceneGraph,
        registry: InteractableRegistry,
        camera: Camera,
    }

    /// Two slabs stacked along the camera's centre ray: `board001` at
    /// (5, 15, 5) is in front of `board` at (0, 10, 0).
    fn fixture() -> Fixture {
        let mut scene = SceneGraph::new();
        let slab = TriangleMesh::unit_cube();

        let board = scene.add(
            None,
            SceneNode::new("board").with_position(Vec3::new(0.0, 10.0, 0.0)),
        );
        scene.add(
            Some(board),
            SceneNode::new("Cube.010")
                .with_scale(Vec3::new(8.0, 0.2, 8.0))
                .with_mesh(slab.clone()),
        );
        scene.add(
            Some(board),
            SceneNode::new("Frame.010")
                .with_position(Vec3::new(0.0, -0.5, 0.0))
                .with_scale(Vec3::new(1.0, 0.2, 1.0))
                .with_mesh(slab.clone()),
        );

        let near = scene.add(
            None,
            SceneNode::new("board001").with_position(Vec3::new(5.0, 15.0, 5.0)),
        );
        scene.add(
            Some(near),
            SceneNode::new("Cube.011")
                .with_scale(Vec3::new(4.0, 0.2, 4.0))
                .with_mesh(slab.clone()),
        );

        scene.add(
            None,
            SceneNode::new("rock")
                .with_position(Vec3::new(-30.0, 0.0, 0.0))
                .with_mesh(slab),
        );

        let registry = InteractableRegistry::build(&scene, &NameConfig::default());
        let camera = Camera::new(CameraConfig::default(), &Viewport::new(1000.0, 1000.0));
        Fixture {
            scene,
            registry,
            camera,
        }
    }

    #[test]
    fn registry_adds_each_named_ancestor_once() {
        let f = fixture();
        let names: Vec<_> = f
            .registry
            .nodes()
            .iter()
            .map(|id| f.scene.node(*id).name.as_str())
            .collect();
        assert_eq!(names, ["board", "board001"]);
        assert_eq!(
            f.registry.target("Snorlax"),
            Some(&Target::Reactive("Snorlax".into()))
        );
        assert_eq!(
            f.registry.target("board002"),
            Some(&Target::InfoPanel("board002".into()))
        );
    }

    #[test]
    fn nearer_interactable_wins() {
        let f = fixture();
        let target = resolve_target(Vec2::ZERO, &f.camera, &f.registry, &f.scene);
        assert_eq!(target.map(Target::name), Some("board001"));
    }

    #[test]
    fn unobstructed_far_board_resolves() {
        let f = fixture();
        let ndc = f.camera.world_to_ndc(Vec3::new(-3.5, 10.1, -3.5)).truncate();
        let target = resolve_target(ndc, &f.camera, &f.registry, &f.scene);
        assert_eq!(target.map(Target::name), Some("board"));
    }

    #[test]
    fn empty_space_and_unregistered_meshes_resolve_to_nothing() {
        let f = fixture();
        assert!(resolve_target(Vec2::new(0.95, 0.95), &f.camera, &f.registry, &f.scene).is_none());
        let rock = f.camera.world_to_ndc(Vec3::new(-30.0, 0.5, 0.0)).truncate();
        assert!(resolve_target(rock, &f.camera, &f.registry, &f.scene).is_none());
    }

    #[test]
    fn hover_shows_pointer_unless_overlay_is_open() {
        let f = fixture();
        let cursor = |ndc, open| hover_cursor(ndc, &f.camera, &f.registry, &f.scene, open);
        assert_eq!(cursor(Vec2::ZERO, false), CursorStyle::Pointer);
        assert_eq!(cursor(Vec2::ZERO, true), CursorStyle::Default);
        assert_eq!(cursor(Vec2::new(0.95, 0.95), false), CursorStyle::Default);
    }
}
