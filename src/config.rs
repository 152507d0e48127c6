//! Tunables and content tables, loaded from an optional `world.toml`.
//!
//! Every field has a default so an empty file (or no file at all) yields the
//! stock garden behaviour.

use std::collections::BTreeMap;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub physics: PhysicsConfig,
    pub names: NameConfig,
    pub camera: CameraConfig,
    pub reaction: ReactionConfig,
    /// Info panel content keyed by interactable name.
    pub panels: BTreeMap<String, PanelContent>,
    /// Feet position applied to the character once it is loaded. The spawn
    /// point stays at the authored position.
    pub spawn_override: Option<Vec3>,
}

impl WorldConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub jump_height: f32,
    pub move_speed: f32,
    pub capsule_radius: f32,
    /// Height of the top sphere centre above the feet.
    pub capsule_height: f32,
    pub tick_dt: f32,
    pub floor_threshold: f32,
    /// Fraction of the remaining yaw error closed each tick.
    pub rotation_smoothing: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 30.0,
            jump_height: 10.0,
            move_speed: 10.0,
            capsule_radius: 0.35,
            capsule_height: 1.0,
            tick_dt: 0.035,
            floor_threshold: -35.0,
            rotation_smoothing: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameConfig {
    pub character: Vec<String>,
    pub collider: Vec<String>,
    pub interactables: Vec<String>,
    /// Interactables that play a reactive animation instead of opening a panel.
    pub creatures: Vec<String>,
}

impl Default for NameConfig {
    fn default() -> Self {
        Self {
            character: strings(&["character", "Character"]),
            collider: strings(&["ground_collider", "Ground_Collider"]),
            interactables: strings(&[
                "board", "board001", "board002", "board003", "character", "tuttle", "Snorlax",
                "name",
            ]),
            creatures: strings(&["tuttle", "Snorlax"]),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub offset: Vec3,
    /// Half height of the orthographic frustum.
    pub view_size: f32,
    pub near: f32,
    pub far: f32,
    /// Added to `offset.y` to get the camera height.
    pub height_bias: f32,
    /// How far below the camera the look-at point sits.
    pub look_drop: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            offset: Vec3::splat(30.0),
            view_size: 25.0,
            near: 0.1,
            far: 1000.0,
            height_bias: 10.0,
            look_drop: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionConfig {
    /// Seconds a creature stays latched after it starts reacting.
    pub duration: f32,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self { duration: 0.75 }
    }
}

/// Content shown by the info panel overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelContent {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default = "default_image")]
    pub image: String,
}

fn default_image() -> String {
    "/images/default.jpeg".to_string()
}
