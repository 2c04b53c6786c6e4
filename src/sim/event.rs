/// Events emitted during a simulation step, and the collaborator seams
/// that consume them.
///
/// The engine never talks to the camera, the effect layer or the sprite
/// renderer directly. `step` returns events; `dispatch` routes the ones
/// that matter to whichever collaborators are plugged in. Sound and HUD
/// messages read the same event list in `main`.

use crate::domain::grid::{Cell, Direction, WorldPos};
use crate::domain::status::SpriteKey;
use crate::domain::tile::TileType;

/// Input sampled once per tick. Edge-triggered: a held key yields a
/// direction only on the tick it was pressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub direction: Option<Direction>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Moved { to: Cell },
    Blocked { at: Cell },
    TileReplaced { cell: Cell, from: TileType, to: TileType },
    Explosion { cell: Cell, pos: WorldPos },
    Soaked,
    Ignited,
    Extinguished,
    Shocked,
    Stuck { cell: Cell },
    BrokeFree,
    SlideStarted { direction: Direction },
    SlideStopped { at: Cell },
    JumpStarted { landing: Cell },
    Landed { at: Cell },
    LevelComplete { camera: WorldPos },
    SpriteChanged(SpriteKey),
}

// ── Collaborators ──

pub trait CameraControl {
    /// Stop following the player and settle on `pos` instead.
    fn disable_follow(&mut self, pos: WorldPos);
    fn enable_follow(&mut self);
}

pub trait EffectSpawner {
    fn spawn_effect(&mut self, pos: WorldPos);
}

pub trait SpriteSink {
    fn show_sprite(&mut self, sprite: SpriteKey);
}

/// Route events to the presentation collaborators.
pub fn dispatch(
    events: &[GameEvent],
    camera: &mut dyn CameraControl,
    effects: &mut dyn EffectSpawner,
    sprites: &mut dyn SpriteSink,
) {
    for ev in events {
        match ev {
            GameEvent::LevelComplete { camera: pos } => camera.disable_follow(*pos),
            GameEvent::Explosion { pos, .. } => effects.spawn_effect(*pos),
            GameEvent::SpriteChanged(key) => sprites.show_sprite(*key),
            _ => {}
        }
    }
}
