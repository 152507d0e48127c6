use glam::Vec3;
use log::info;

use crate::config::PhysicsConfig;
use crate::geometry::Capsule;
use crate::scene::NodeId;

/// Kinematic state of the player character.
///
/// `position` is the feet position shown to the renderer. It is derived from
/// the capsule after every tick, so code outside the locomotion controller
/// should treat it as read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterState {
    pub node: NodeId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub yaw: f32,
    pub target_yaw: f32,
    pub grounded: bool,
    pub moving: bool,
    pub spawn_point: Vec3,
    pub base_scale: Vec3,
    capsule: Capsule,
}

impl CharacterState {
    /// Character standing at `spawn_point`, airborne until the first contact.
    pub fn new(
        node: NodeId,
        spawn_point: Vec3,
        yaw: f32,
        base_scale: Vec3,
        physics: &PhysicsConfig,
    ) -> Self {
        Self {
            node,
            position: spawn_point,
            velocity: Vec3::ZERO,
            yaw,
            target_yaw: yaw,
            grounded: false,
            moving: false,
            spawn_point,
            base_scale,
            capsule: Capsule::standing_at(
                spawn_point,
                physics.capsule_radius,
                physics.capsule_height,
            ),
        }
    }

    pub fn capsule(&self) -> &Capsule {
        &self.capsule
    }

    pub(crate) fn capsule_mut(&mut self) -> &mut Capsule {
        &mut self.capsule
    }

    /// Moves the character without touching its spawn point or velocity.
    pub fn place_at(&mut self, feet: Vec3) {
        self.position = feet;
        self.capsule.seat_at(feet);
    }

    /// Puts the character back on its spawn point at rest.
    pub fn respawn(&mut self) {
        info!(
            "respawning character at ({:.2}, {:.2}, {:.2})",
            self.spawn_point.x, self.spawn_point.y, self.spawn_point.z
        );
        self.place_at(self.spawn_point);
        self.velocity = Vec3::ZERO;
        self.moving = false;
    }
}
