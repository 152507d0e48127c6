//! Owned explorer state: the loaded scene plus every controller that
//! reads or mutates it.

use std::path::Path;

use glam::{EulerRot, Quat, Vec2};
use log::{info, warn};

use crate::camera::Camera;
use crate::character::CharacterState;
use crate::collision::CollisionIndex;
use crate::config::WorldConfig;
use crate::dispatch::{Cues, Dispatcher, HeadlessOverlay, Intent, LoggingCues, Overlay};
use crate::error::SceneError;
use crate::input::{InputSnapshot, Viewport};
use crate::interaction::{hover_cursor, resolve_target, CursorStyle, InteractableRegistry, Target};
use crate::locomotion::{squash_and_stretch, Hop, LocomotionController, TickOutcome};
use crate::scene::{NodeId, SceneGraph};

/// What a successful load produced.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    pub nodes: usize,
    pub collider_nodes: usize,
    pub collider_triangles: usize,
    pub interactables: usize,
    /// Name of the resolved character node, if any.
    pub character: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub tick: Option<TickOutcome>,
    pub hop: Option<Hop>,
    pub cursor: CursorStyle,
    pub intent: Option<Intent>,
}

struct Ready {
    scene: SceneGraph,
    collision: CollisionIndex,
    registry: InteractableRegistry,
    character: CharacterState,
    /// Authored X and Z rotation of the character node, kept around the yaw.
    tilt: (f32, f32),
}

pub struct World {
    config: WorldConfig,
    locomotion: LocomotionController,
    camera: Camera,
    viewport: Viewport,
    dispatcher: Dispatcher,
    overlay: Box<dyn Overlay>,
    cues: Box<dyn Cues>,
    ready: Option<Ready>,
    cursor: CursorStyle,
    hovered: Option<Target>,
}

impl World {
    pub fn new(config: WorldConfig, viewport: Viewport) -> Self {
        Self::with_collaborators(
            config,
            viewport,
            Box::new(HeadlessOverlay::new()),
            Box::new(LoggingCues),
        )
    }

    pub fn with_collaborators(
        config: WorldConfig,
        viewport: Viewport,
        overlay: Box<dyn Overlay>,
        cues: Box<dyn Cues>,
    ) -> Self {
        Self {
            locomotion: LocomotionController::new(config.physics),
            camera: Camera::new(config.camera, &viewport),
            dispatcher: Dispatcher::new(config.panels.clone(), config.reaction.duration),
            config,
            viewport,
            overlay,
            cues,
            ready: None,
            cursor: CursorStyle::Default,
            hovered: None,
        }
    }

    /// Reads a scene file and installs it. On error the world keeps its
    /// previous state.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<LoadSummary, SceneError> {
        let scene = SceneGraph::load(path)?;
        Ok(self.load(scene))
    }

    /// Builds the collision index, character and interactable registry from
    /// `scene`. The world only becomes ready when a character node exists.
    pub fn load(&mut self, mut scene: SceneGraph) -> LoadSummary {
        let names = &self.config.names;
        let nodes = scene.traverse();

        let colliders: Vec<NodeId> = nodes
            .iter()
            .copied()
            .filter(|id| names.collider.contains(&scene.node(*id).name))
            .collect();
        let collision = CollisionIndex::from_scene(&scene, &colliders);
        for collider in &colliders {
            scene.hide_subtree(*collider);
        }
        if collision.is_empty() {
            warn!("scene has no collision geometry; the character will free-fall");
        }

        let registry = InteractableRegistry::build(&scene, names);
        let character_node = nodes
            .iter()
            .copied()
            .find(|id| names.character.contains(&scene.node(*id).name));

        let summary = LoadSummary {
            nodes: scene.len(),
            collider_nodes: colliders.len(),
            collider_triangles: collision.triangle_count(),
            interactables: registry.nodes().len(),
            character: character_node.map(|id| scene.node(id).name.clone()),
        };

        let Some(node) = character_node else {
            warn!("scene has no character node; world stays inactive");
            self.ready = None;
            return summary;
        };

        let spawn_point = scene.world_position(node);
        let (tilt_x, yaw, tilt_z) = scene.node(node).rotation.to_euler(EulerRot::XYZ);
        let base_scale = scene.node(node).scale;
        let mut character =
            CharacterState::new(node, spawn_point, yaw, base_scale, &self.config.physics);
        if let Some(feet) = self.config.spawn_override {
            character.place_at(feet);
        }
        self.camera.follow(character.position);

        info!(
            "loaded scene: {} nodes, {} collider triangles, {} interactables",
            summary.nodes, summary.collider_triangles, summary.interactables
        );
        self.hovered = None;
        self.ready = Some(Ready {
            scene,
            collision,
            registry,
            character,
            tilt: (tilt_x, tilt_z),
        });
        summary
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_some()
    }

    pub fn character(&self) -> Option<&CharacterState> {
        self.ready.as_ref().map(|ready| &ready.character)
    }

    pub fn scene(&self) -> Option<&SceneGraph> {
        self.ready.as_ref().map(|ready| &ready.scene)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn cursor(&self) -> CursorStyle {
        self.cursor
    }

    /// Target under the pointer as of the last frame.
    pub fn hovered(&self) -> Option<&Target> {
        self.hovered.as_ref()
    }

    pub fn overlay_open(&self) -> bool {
        self.overlay.is_open()
    }

    pub fn is_reacting(&self, name: &str) -> bool {
        self.dispatcher.is_reacting(name)
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.resize(&viewport);
    }

    /// Runs one frame: edge-triggered actions, the locomotion tick, hop
    /// input, camera follow, hover and finally any pending click.
    ///
    /// Hover resolves to nothing while the overlay is open.
    pub fn frame(&mut self, input: &InputSnapshot) -> FrameReport {
        let mut report = FrameReport::default();
        if input.close_overlay {
            self.close_overlay();
        }
        if input.respawn {
            self.respawn();
        }
        if input.jump {
            self.jump();
        }

        let Some(ready) = self.ready.as_mut() else {
            return report;
        };
        report.tick = Some(self.locomotion.tick(&mut ready.character, &ready.collision));
        if !self.overlay.is_open() {
            report.hop = self
                .locomotion
                .apply_hop_input(&mut ready.character, &input.held);
        }
        if report.hop.is_some() {
            self.cues.play_hop();
            self.cues
                .squash_and_stretch(&squash_and_stretch(ready.character.base_scale));
        }
        self.camera.follow(ready.character.position);
        sync_character_node(ready);
        self.dispatcher.advance(self.locomotion.physics().tick_dt);

        let overlay_open = self.overlay.is_open();
        match input.pointer {
            Some(pointer) if !overlay_open => {
                let ndc = self.viewport.to_ndc(pointer);
                self.cursor =
                    hover_cursor(ndc, &self.camera, &ready.registry, &ready.scene, overlay_open);
                self.hovered =
                    resolve_target(ndc, &self.camera, &ready.registry, &ready.scene).cloned();
            }
            _ => {
                self.cursor = CursorStyle::Default;
                self.hovered = None;
            }
        }
        if input.click {
            // Before the first pointer move the pointer sits at the viewport centre.
            let pointer = input.pointer.unwrap_or_else(|| self.viewport.center());
            report.intent = self.click(pointer);
        }
        report.cursor = self.cursor;
        report
    }

    /// Resolves and dispatches a click at client coordinates.
    pub fn click(&mut self, pointer: Vec2) -> Option<Intent> {
        let ready = self.ready.as_ref()?;
        let ndc = self.viewport.to_ndc(pointer);
        let target = resolve_target(ndc, &self.camera, &ready.registry, &ready.scene);
        self.dispatcher
            .dispatch(target, self.overlay.as_mut(), self.cues.as_mut())
    }

    /// Jumps in place. Ignored while the overlay is open.
    pub fn jump(&mut self) -> bool {
        if self.overlay.is_open() {
            return false;
        }
        let Some(ready) = self.ready.as_mut() else {
            return false;
        };
        if !self.locomotion.jump(&mut ready.character) {
            return false;
        }
        self.cues.play_hop();
        self.cues
            .squash_and_stretch(&squash_and_stretch(ready.character.base_scale));
        true
    }

    pub fn respawn(&mut self) {
        if let Some(ready) = self.ready.as_mut() {
            ready.character.respawn();
            sync_character_node(ready);
        }
    }

    pub fn close_overlay(&mut self) {
        if self.overlay.close() {
            self.cues.panel_closed();
        }
    }

    /// Animation collaborator callback for a finished creature reaction.
    pub fn complete_reaction(&mut self, name: &str) {
        self.dispatcher.complete_reaction(name);
    }
}

/// Copies the character's pose back onto its scene node.
fn sync_character_node(ready: &mut Ready) {
    let node = ready.character.node;
    let parent_inverse = ready
        .scene
        .node(node)
        .parent()
        .map(|parent| ready.scene.world_matrix(parent).inverse());
    let local = match parent_inverse {
        Some(inverse) => inverse.transform_point3(ready.character.position),
        None => ready.character.position,
    };
    let (tilt_x, tilt_z) = ready.tilt;
    let scene_node = ready.scene.node_mut(node);
    scene_node.position = local;
    scene_node.rotation = Quat::from_euler(EulerRot::XYZ, tilt_x, ready.character.yaw, tilt_z);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PanelContent;
    use crate::input::{Direction, InputState};
    use crate::obj::TriangleMesh;
    use crate::scene::SceneNode;
    use glam::Vec3;

    fn garden() -> SceneGraph {
        let mut scene = SceneGraph::new();
        let collider = scene.add(None, SceneNode::new("ground_collider"));
        scene.add(
            Some(collider),
            SceneNode::new("Plane")
                .with_scale(Vec3::new(40.0, 1.0, 40.0))
                .with_mesh(TriangleMesh::unit_plane()),
        );
        let character = scene.add(
            None,
            SceneNode::new("character").with_position(Vec3::new(3.0, 0.0, 6.0)),
        );
        scene.add(
            Some(character),
            SceneNode::new("Body")
                .with_position(Vec3::new(0.0, 0.5, 0.0))
                .with_scale(Vec3::splat(0.5))
                .with_mesh(TriangleMesh::unit_cube()),
        );
        let board = scene.add(
            None,
            SceneNode::new("board002").with_position(Vec3::new(8.0, 0.5, -8.0)),
        );
        scene.add(
            Some(board),
            SceneNode::new("Cube.002")
                .with_scale(Vec3::splat(3.0))
                .with_mesh(TriangleMesh::unit_cube()),
        );
        scene.add(
            None,
            SceneNode::new("Snorlax")
                .with_position(Vec3::new(-8.0, 1.0, -8.0))
                .with_scale(Vec3::splat(2.0))
                .with_mesh(TriangleMesh::unit_cube()),
        );
        scene
    }

    fn config() -> WorldConfig {
        let mut config = WorldConfig::default();
        config.panels.insert(
            "board002".into(),
            PanelContent {
                title: "threejs".into(),
                description: "ParkFolio".into(),
                link: None,
                image: "/images/portf.webp".into(),
            },
        );
        config
    }

    fn loaded() -> World {
        let mut world = World::new(config(), Viewport::default());
        world.load(garden());
        world
    }

    fn screen_point(world: &World, point: Vec3) -> Vec2 {
        let ndc = world.camera().world_to_ndc(point);
        let viewport = world.viewport();
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * viewport.width + viewport.left,
            (1.0 - ndc.y) * 0.5 * viewport.height + viewport.top,
        )
    }

    fn idle(world: &mut World, frames: usize) {
        for _ in 0..frames {
            world.frame(&InputSnapshot::default());
        }
    }

    #[test]
    fn unloaded_world_ignores_everything() {
        let mut world = World::new(config(), Viewport::default());
        let input = InputSnapshot {
            jump: true,
            respawn: true,
            click: true,
            pointer: Some(Vec2::new(10.0, 10.0)),
            ..InputSnapshot::default()
        };
        assert_eq!(world.frame(&input), FrameReport::default());
        assert!(world.click(Vec2::ZERO).is_none());
        assert!(!world.jump());
        world.respawn();
        assert!(!world.is_ready());
    }

    #[test]
    fn load_hides_collider_and_resolves_character() {
        let mut world = World::new(config(), Viewport::default());
        let summary = world.load(garden());
        assert_eq!(summary.collider_nodes, 1);
        assert_eq!(summary.collider_triangles, 2);
        assert_eq!(summary.interactables, 3);
        assert_eq!(summary.character.as_deref(), Some("character"));

        let scene = world.scene().unwrap();
        let plane = scene.find_by_name("Plane").unwrap();
        assert!(!scene.node(plane).visible);
        let character = world.character().unwrap();
        assert_eq!(character.spawn_point, Vec3::new(3.0, 0.0, 6.0));
    }

    #[test]
    fn scene_without_character_stays_inactive() {
        let mut scene = garden();
        let character = scene.find_by_name("character").unwrap();
        scene.node_mut(character).name = "statue".into();
        let mut world = World::new(config(), Viewport::default());
        let summary = world.load(scene);
        assert!(summary.character.is_none());
        assert!(!world.is_ready());
    }

    #[test]
    fn character_settles_and_hops() {
        let mut world = loaded();
        idle(&mut world, 3);
        let rest = world.character().unwrap().clone();
        assert!(rest.grounded);
        assert!(rest.position.y.abs() < 1e-3);

        let input = InputState::new();
        input.set_direction(Direction::Up, true);
        let report = world.frame(&input.take_snapshot());
        let hop = report.hop.unwrap();
        assert_eq!(hop.velocity, Vec3::new(-10.0, 10.0, 0.0));
        assert_eq!(hop.target_yaw, 0.0);

        input.blur();
        idle(&mut world, 40);
        let landed = world.character().unwrap();
        assert!(landed.grounded && !landed.moving);
        assert!(landed.position.x < rest.position.x - 5.0);
        assert!((landed.position.z - rest.position.z).abs() < 1e-4);

        let scene = world.scene().unwrap();
        let node = scene.node(landed.node);
        assert_eq!(node.position, landed.position);
        let camera = world.camera();
        assert_eq!(camera.position.x, landed.position.x + 30.0);
    }

    #[test]
    fn free_fall_is_caught_by_the_floor_threshold() {
        let mut scene = garden();
        let collider = scene.find_by_name("ground_collider").unwrap();
        scene.node_mut(collider).name = "decor".into();
        let mut world = World::new(config(), Viewport::default());
        world.load(scene);

        let mut respawned = false;
        for _ in 0..200 {
            if world.frame(&InputSnapshot::default()).tick == Some(TickOutcome::Respawned) {
                respawned = true;
                break;
            }
        }
        assert!(respawned);
        let character = world.character().unwrap();
        assert_eq!(character.position, character.spawn_point);
    }

    #[test]
    fn clicking_a_board_opens_its_panel_once() {
        let mut world = loaded();
        let board = screen_point(&world, Vec3::new(8.3, 2.0, -7.6));

        match world.click(board) {
            Some(Intent::InfoPanel { id, content }) => {
                assert_eq!(id, "board002");
                assert_eq!(content.title, "threejs");
            }
            other => panic!("unexpected intent {other:?}"),
        }
        assert!(world.overlay_open());
        assert!(world.click(board).is_none());

        let input = InputSnapshot {
            pointer: Some(board),
            ..InputSnapshot::default()
        };
        assert_eq!(world.frame(&input).cursor, CursorStyle::Default);

        world.close_overlay();
        assert!(!world.overlay_open());
        assert_eq!(world.frame(&input).cursor, CursorStyle::Pointer);
        assert_eq!(world.hovered().map(Target::name), Some("board002"));
    }

    #[test]
    fn hover_clears_while_overlay_is_open() {
        let mut world = loaded();
        let board = screen_point(&world, Vec3::new(8.3, 2.0, -7.6));
        let hover = InputSnapshot {
            pointer: Some(board),
            ..InputSnapshot::default()
        };
        world.frame(&hover);
        assert_eq!(world.hovered().map(Target::name), Some("board002"));

        let click = InputSnapshot {
            click: true,
            ..hover
        };
        assert!(world.frame(&click).intent.is_some());
        let report = world.frame(&hover);
        assert_eq!(report.cursor, CursorStyle::Default);
        assert!(world.hovered().is_none());
    }

    #[test]
    fn click_before_any_pointer_move_uses_the_screen_centre() {
        let mut config = config();
        // Puts Snorlax's top face under the centre of the screen.
        config.spawn_override = Some(Vec3::new(0.2, 0.0, -0.3));
        let mut world = World::new(config, Viewport::default());
        world.load(garden());

        let click = InputSnapshot {
            click: true,
            ..InputSnapshot::default()
        };
        let report = world.frame(&click);
        assert_eq!(
            report.intent,
            Some(Intent::ReactiveAnimation {
                target: "Snorlax".into(),
                duration: 0.75
            })
        );
        assert_eq!(report.cursor, CursorStyle::Default);
        assert!(world.hovered().is_none());
    }

    #[test]
    fn node_sync_keeps_authored_tilt() {
        let mut scene = garden();
        let character = scene.find_by_name("character").unwrap();
        let authored = scene
            .node(character)
            .clone()
            .with_rotation(Quat::from_euler(EulerRot::XYZ, 0.2, 0.5, -0.1));
        *scene.node_mut(character) = authored;
        let mut world = World::new(config(), Viewport::default());
        world.load(scene);

        let input = InputState::new();
        input.set_direction(Direction::Right, true);
        world.frame(&input.take_snapshot());
        world.frame(&InputSnapshot::default());

        let state = world.character().unwrap();
        let node = world.scene().unwrap().node(state.node);
        let (x, y, z) = node.rotation.to_euler(EulerRot::XYZ);
        assert!((x - 0.2).abs() < 1e-4);
        assert!((z + 0.1).abs() < 1e-4);
        assert!((y - state.yaw).abs() < 1e-4);
        assert!((state.yaw - 0.5).abs() > 1e-3);
    }

    #[test]
    fn open_overlay_freezes_movement_input() {
        let mut world = loaded();
        idle(&mut world, 3);
        let board = screen_point(&world, Vec3::new(8.3, 2.0, -7.6));
        assert!(world.click(board).is_some());

        let input = InputState::new();
        input.set_direction(Direction::Down, true);
        let report = world.frame(&input.take_snapshot());
        assert!(report.hop.is_none());
        assert!(!world.jump());
        assert!(!world.character().unwrap().moving);

        world.close_overlay();
        assert!(world.frame(&input.take_snapshot()).hop.is_some());
    }

    #[test]
    fn creature_reaction_latches_until_it_finishes() {
        let mut world = loaded();
        let snorlax = screen_point(&world, Vec3::new(-7.8, 2.0, -8.3));

        assert!(matches!(
            world.click(snorlax),
            Some(Intent::ReactiveAnimation { ref target, .. }) if target == "Snorlax"
        ));
        assert!(world.click(snorlax).is_none());
        assert!(world.is_reacting("Snorlax"));

        // Camera follows the character, so keep it still while time passes.
        idle(&mut world, 25);
        let snorlax = screen_point(&world, Vec3::new(-7.8, 2.0, -8.3));
        assert!(!world.is_reacting("Snorlax"));
        assert!(world.click(snorlax).is_some());
        world.complete_reaction("Snorlax");
        assert!(world.click(snorlax).is_some());
    }

    #[test]
    fn respawn_override_moves_character_but_keeps_spawn() {
        let mut config = config();
        config.spawn_override = Some(Vec3::new(-2.0, 1.0, 4.0));
        let mut world = World::new(config, Viewport::default());
        world.load(garden());
        assert_eq!(world.character().unwrap().position, Vec3::new(-2.0, 1.0, 4.0));
        world.respawn();
        assert_eq!(world.character().unwrap().position, Vec3::new(3.0, 0.0, 6.0));
    }
}
