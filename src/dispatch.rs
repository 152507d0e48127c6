//! Turns a resolved target into an intent and drives the overlay and cue
//! collaborators.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::config::PanelContent;
use crate::interaction::Target;
use crate::locomotion::ScaleKey;

/// Modal info panel shown on top of the scene.
pub trait Overlay {
    fn is_open(&self) -> bool;
    /// Shows `content`, replacing whatever was displayed.
    fn open(&mut self, id: &str, content: &PanelContent);
    /// Hides the panel. Returns `false` when it was already closed.
    fn close(&mut self) -> bool;
}

/// Overlay that only remembers which panel is showing.
#[derive(Debug, Clone, Default)]
pub struct HeadlessOverlay {
    current: Option<(String, PanelContent)>,
}

impl HeadlessOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_ref().map(|(id, _)| id.as_str())
    }

    pub fn current_content(&self) -> Option<&PanelContent> {
        self.current.as_ref().map(|(_, content)| content)
    }
}

impl Overlay for HeadlessOverlay {
    fn is_open(&self) -> bool {
        self.current.is_some()
    }

    fn open(&mut self, id: &str, content: &PanelContent) {
        self.current = Some((id.to_string(), content.clone()));
    }

    fn close(&mut self) -> bool {
        self.current.take().is_some()
    }
}

/// Fire-and-forget sound and tween cues.
pub trait Cues {
    fn play_hop(&mut self);
    fn play_reactive_creature(&mut self, name: &str);
    fn play_panel_chime(&mut self);
    fn panel_closed(&mut self);

    fn squash_and_stretch(&mut self, _keys: &[ScaleKey]) {}
}

/// Cues that go nowhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentCues;

impl Cues for SilentCues {
    fn play_hop(&mut self) {}
    fn play_reactive_creature(&mut self, _name: &str) {}
    fn play_panel_chime(&mut self) {}
    fn panel_closed(&mut self) {}
}

/// Cues reported through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingCues;

impl Cues for LoggingCues {
    fn play_hop(&mut self) {
        debug!("cue: hop");
    }

    fn play_reactive_creature(&mut self, name: &str) {
        info!("cue: creature {name}");
    }

    fn play_panel_chime(&mut self) {
        info!("cue: panel chime");
    }

    fn panel_closed(&mut self) {
        info!("cue: panel closed");
    }

    fn squash_and_stretch(&mut self, keys: &[ScaleKey]) {
        debug!("cue: squash and stretch over {} key(s)", keys.len());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    InfoPanel { id: String, content: PanelContent },
    ReactiveAnimation { target: String, duration: f32 },
}

/// Routes clicks to panels or creature reactions.
///
/// Creatures share one ready latch: while any reaction is in flight, clicks
/// on every creature are dropped.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    panels: BTreeMap<String, PanelContent>,
    reaction_duration: f32,
    /// Creature currently reacting and the seconds it has left.
    in_flight: Option<(String, f32)>,
}

impl Dispatcher {
    pub fn new(panels: BTreeMap<String, PanelContent>, reaction_duration: f32) -> Self {
        Self {
            panels,
            reaction_duration,
            in_flight: None,
        }
    }

    pub fn panel(&self, id: &str) -> Option<&PanelContent> {
        self.panels.get(id)
    }

    pub fn is_reacting(&self, name: &str) -> bool {
        self.reacting() == Some(name)
    }

    pub fn reacting(&self) -> Option<&str> {
        self.in_flight.as_ref().map(|(name, _)| name.as_str())
    }

    pub fn dispatch(
        &mut self,
        target: Option<&Target>,
        overlay: &mut dyn Overlay,
        cues: &mut dyn Cues,
    ) -> Option<Intent> {
        if overlay.is_open() {
            debug!("dispatch suppressed: overlay is open");
            return None;
        }
        match target? {
            Target::Reactive(name) => {
                if let Some(busy) = self.reacting() {
                    debug!("dispatch of {name} suppressed: {busy} is still reacting");
                    return None;
                }
                self.in_flight = Some((name.clone(), self.reaction_duration));
                cues.play_reactive_creature(name);
                info!("reactive animation for {name}");
                Some(Intent::ReactiveAnimation {
                    target: name.clone(),
                    duration: self.reaction_duration,
                })
            }
            Target::InfoPanel(id) => {
                let Some(content) = self.panels.get(id) else {
                    debug!("no panel content for {id}");
                    return None;
                };
                overlay.open(id, content);
                cues.play_panel_chime();
                info!("opened info panel {id}");
                Some(Intent::InfoPanel {
                    id: id.clone(),
                    content: content.clone(),
                })
            }
        }
    }

    /// Releases the latch once the running reaction's time has run out.
    pub fn advance(&mut self, dt: f32) {
        let Some((name, remaining)) = self.in_flight.as_mut() else {
            return;
        };
        *remaining -= dt;
        if *remaining <= 0.0 {
            debug!("{name} finished reacting");
            self.in_flight = None;
        }
    }

    /// Called by the animation collaborator when a reaction finishes early.
    /// Ignored unless `name` is the creature currently reacting.
    pub fn complete_reaction(&mut self, name: &str) {
        if self.is_reacting(name) {
            self.in_flight = None;
        }
    }
}
