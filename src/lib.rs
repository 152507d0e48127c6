//! Core of the garden explorer: hop locomotion over a static collision
//! mesh plus pointer interaction with named scene objects.
//!
//! Rendering, audio, overlays and tweens stay outside of the crate. The
//! [`World`] talks to them only through the [`Overlay`] and [`Cues`] traits
//! and the state it exposes, so everything here runs headless.

pub mod camera;
pub mod character;
pub mod collision;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod geometry;
pub mod input;
pub mod interaction;
pub mod locomotion;
pub mod obj;
pub mod scene;
pub mod world;

pub use camera::Camera;
pub use character::CharacterState;
pub use collision::{CollisionIndex, Contact};
pub use config::{PanelContent, PhysicsConfig, WorldConfig};
pub use dispatch::{Cues, Dispatcher, HeadlessOverlay, Intent, LoggingCues, Overlay, SilentCues};
pub use error::{ConfigError, SceneError};
pub use geometry::{Aabb, Capsule, Ray, Triangle};
pub use input::{Direction, InputSnapshot, InputState, KeyCode, NamedKey, Viewport};
pub use interaction::{resolve_target, CursorStyle, InteractableRegistry, Target};
pub use locomotion::{shortest_angle_delta, LocomotionController, TickOutcome};
pub use obj::{load_obj_from_str, TriangleMesh};
pub use scene::{NodeId, SceneGraph, SceneNode};
pub use world::{FrameReport, LoadSummary, World};
