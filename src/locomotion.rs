//! Hop locomotion: gravity, directional hops, capsule collision and yaw
//! smoothing for the player character.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec3;
use log::{debug, trace};

use crate::character::CharacterState;
use crate::collision::CollisionIndex;
use crate::config::PhysicsConfig;
use crate::input::{Direction, HeldDirections};

/// Total length of the hop squash-and-stretch, in seconds.
pub const SQUASH_DURATION: f32 = 0.3;

/// One step of a scale tween.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleKey {
    pub scale: Vec3,
    pub duration: f32,
}

/// Squash, stretch, then settle back on `base`.
pub fn squash_and_stretch(base: Vec3) -> [ScaleKey; 3] {
    [
        ScaleKey {
            scale: base * Vec3::new(1.08, 0.93, 1.08),
            duration: SQUASH_DURATION * 0.2,
        },
        ScaleKey {
            scale: base * Vec3::new(0.92, 1.07, 0.92),
            duration: SQUASH_DURATION * 0.3,
        },
        ScaleKey {
            scale: base,
            duration: SQUASH_DURATION * 0.3,
        },
    ]
}

/// Signed difference `to - from` wrapped into `[-π, π]`.
pub fn shortest_angle_delta(from: f32, to: f32) -> f32 {
    ((to - from) % TAU + 3.0 * PI) % TAU - PI
}

/// Yaw the character faces after hopping in `direction`.
pub fn facing(direction: Direction) -> f32 {
    match direction {
        Direction::Up => 0.0,
        Direction::Down => PI,
        Direction::Left => -FRAC_PI_2,
        Direction::Right => FRAC_PI_2,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The character fell below the floor threshold and was put back.
    Respawned,
    Integrated { grounded: bool },
}

/// A hop that was started this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hop {
    pub velocity: Vec3,
    pub target_yaw: f32,
}

#[derive(Debug, Clone)]
pub struct LocomotionController {
    physics: PhysicsConfig,
}

impl LocomotionController {
    pub fn new(physics: PhysicsConfig) -> Self {
        Self { physics }
    }

    pub fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    /// Advances the character by one fixed step.
    pub fn tick(&self, state: &mut CharacterState, collision: &CollisionIndex) -> TickOutcome {
        let physics = &self.physics;
        if state.position.y < physics.floor_threshold {
            state.respawn();
            return TickOutcome::Respawned;
        }

        if !state.grounded {
            state.velocity.y -= physics.gravity * physics.tick_dt;
        }

        let step = state.velocity * physics.tick_dt;
        state.capsule_mut().translate(step);

        state.grounded = false;
        if let Some(contact) = collision.capsule_intersect(state.capsule()) {
            state.grounded = contact.normal.y > 0.0;
            state.capsule_mut().translate(contact.normal * contact.depth);
            if state.grounded {
                state.moving = false;
                state.velocity.x = 0.0;
                state.velocity.z = 0.0;
            }
        }

        state.position = state.capsule().feet();

        let delta = shortest_angle_delta(state.yaw, state.target_yaw);
        state.yaw += delta * physics.rotation_smoothing;

        trace!(
            "tick: pos=({:.3}, {:.3}, {:.3}) vel=({:.3}, {:.3}, {:.3}) grounded={}",
            state.position.x,
            state.position.y,
            state.position.z,
            state.velocity.x,
            state.velocity.y,
            state.velocity.z,
            state.grounded
        );
        TickOutcome::Integrated {
            grounded: state.grounded,
        }
    }

    /// Starts a hop when a direction is held and no hop is in progress.
    ///
    /// Every held direction contributes its horizontal impulse; the facing of
    /// the last one in [`Direction::ALL`] order wins.
    pub fn apply_hop_input(
        &self,
        state: &mut CharacterState,
        held: &HeldDirections,
    ) -> Option<Hop> {
        if !held.any() || state.moving {
            return None;
        }
        let speed = self.physics.move_speed;
        for direction in held.iter() {
            match direction {
                Direction::Up => state.velocity.x -= speed,
                Direction::Down => state.velocity.x += speed,
                Direction::Left => state.velocity.z += speed,
                Direction::Right => state.velocity.z -= speed,
            }
            state.target_yaw = facing(direction);
        }
        state.velocity.y = self.physics.jump_height;
        state.moving = true;
        debug!(
            "hop: vel=({:.2}, {:.2}, {:.2}) target_yaw={:.3}",
            state.velocity.x, state.velocity.y, state.velocity.z, state.target_yaw
        );
        Some(Hop {
            velocity: state.velocity,
            target_yaw: state.target_yaw,
        })
    }

    /// Vertical jump in place; only allowed from the ground.
    pub fn jump(&self, state: &mut CharacterState) -> bool {
        if !state.grounded {
            return false;
        }
        state.velocity.y = self.physics.jump_height;
        state.grounded = false;
        state.moving = true;
        debug!("jump from y={:.2}", state.position.y);
        true
    }
}
