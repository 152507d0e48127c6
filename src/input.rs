use glam::Vec2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
}

impl KeyCode {
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(key) = parse_named_key(name) {
            return Some(key);
        }
        let mut chars = name.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return None;
        };
        ch.is_ascii_alphabetic()
            .then(|| Self::Character(ch.to_ascii_uppercase()))
    }
}

fn parse_named_key(name: &str) -> Option<KeyCode> {
    use NamedKey::*;
    let key = match name {
        "Space" | " " => Space,
        "Left" | "ArrowLeft" => Left,
        "Right" | "ArrowRight" => Right,
        "Up" | "ArrowUp" => Up,
        "Down" | "ArrowDown" => Down,
        "Escape" | "Esc" => Escape,
        _ => return None,
    };
    Some(KeyCode::Named(key))
}

/// Friendly names for the keys the explorer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Space,
    Left,
    Right,
    Up,
    Down,
    Escape,
}

/// Hop direction, named after the on-screen arrow it is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Application order used when several directions are held at once.
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// What a key press means to the explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(Direction),
    Jump,
    Respawn,
    CloseOverlay,
}

impl Action {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        let action = match key {
            KeyCode::Character('W') | KeyCode::Named(NamedKey::Up) => Self::Move(Direction::Up),
            KeyCode::Character('S') | KeyCode::Named(NamedKey::Down) => {
                Self::Move(Direction::Down)
            }
            KeyCode::Character('A') | KeyCode::Named(NamedKey::Left) => {
                Self::Move(Direction::Left)
            }
            KeyCode::Character('D') | KeyCode::Named(NamedKey::Right) => {
                Self::Move(Direction::Right)
            }
            KeyCode::Named(NamedKey::Space) => Self::Jump,
            KeyCode::Character('R') => Self::Respawn,
            KeyCode::Named(NamedKey::Escape) => Self::CloseOverlay,
            _ => return None,
        };
        Some(action)
    }
}

/// Directions currently held down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeldDirections {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl HeldDirections {
    pub fn set(&mut self, direction: Direction, held: bool) {
        match direction {
            Direction::Up => self.up = held,
            Direction::Down => self.down = held,
            Direction::Left => self.left = held,
            Direction::Right => self.right = held,
        }
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// Held directions in application order.
    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL
            .into_iter()
            .filter(move |direction| self.is_held(*direction))
    }
}

/// One frame's worth of input, taken with [`InputState::take_snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputSnapshot {
    pub held: HeldDirections,
    pub jump: bool,
    pub respawn: bool,
    pub close_overlay: bool,
    pub click: bool,
    /// Last known pointer position in client coordinates.
    pub pointer: Option<Vec2>,
}

#[derive(Debug, Default)]
struct Pending {
    jump: bool,
    respawn: bool,
    close_overlay: bool,
    click: bool,
}

/// Thread-safe input state written by platform event handlers.
///
/// Held directions are level-triggered. Jump, respawn, overlay close and
/// click are edge-triggered: they are reported by exactly one snapshot.
#[derive(Debug, Default)]
pub struct InputState {
    held: RwLock<HeldDirections>,
    pending: RwLock<Pending>,
    pointer: RwLock<Option<Vec2>>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes a key press through the explorer's key bindings. Unbound keys
    /// are ignored.
    pub fn key_down(&self, key: KeyCode) {
        match Action::from_key(key) {
            Some(Action::Move(direction)) => self.set_direction(direction, true),
            Some(Action::Jump) => self.pending.write().jump = true,
            Some(Action::Respawn) => self.pending.write().respawn = true,
            Some(Action::CloseOverlay) => self.pending.write().close_overlay = true,
            None => {}
        }
    }

    pub fn key_up(&self, key: KeyCode) {
        if let Some(Action::Move(direction)) = Action::from_key(key) {
            self.set_direction(direction, false);
        }
    }

    /// Direct access for on-screen arrow buttons.
    pub fn set_direction(&self, direction: Direction, held: bool) {
        self.held.write().set(direction, held);
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        self.held.read().is_held(direction)
    }

    pub fn set_pointer_position(&self, position: Vec2) {
        *self.pointer.write() = Some(position);
    }

    pub fn pointer_position(&self) -> Option<Vec2> {
        *self.pointer.read()
    }

    pub fn click(&self) {
        self.pending.write().click = true;
    }

    /// Window focus was lost; nothing stays held.
    pub fn blur(&self) {
        *self.held.write() = HeldDirections::default();
    }

    pub fn take_snapshot(&self) -> InputSnapshot {
        let pending = std::mem::take(&mut *self.pending.write());
        InputSnapshot {
            held: *self.held.read(),
            jump: pending.jump,
            respawn: pending.respawn,
            close_overlay: pending.close_overlay,
            click: pending.click,
            pointer: self.pointer_position(),
        }
    }
}

/// Client-space rectangle of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }

    pub fn aspect(&self) -> f32 {
        if self.height <= 0.0 {
            1.0
        } else {
            self.width / self.height
        }
    }

    /// Client coordinates of the middle of the surface.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.left + self.width * 0.5, self.top + self.height * 0.5)
    }

    /// Converts client coordinates into normalized device coordinates, +Y up.
    pub fn to_ndc(&self, client: Vec2) -> Vec2 {
        let width = self.width.max(1.0);
        let height = self.height.max(1.0);
        Vec2::new(
            (client.x - self.left) / width * 2.0 - 1.0,
            -((client.y - self.top) / height) * 2.0 + 1.0,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}
