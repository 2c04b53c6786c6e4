/// WorldState: the complete snapshot of a running game.
///
/// ## Tile Architecture
///
/// Two grids, same shape:
///   - `base_grid` — the level as loaded. **Never mutated** after load.
///   - `grid`      — the effective terrain (base + burnt, melted, exploded
///                   cells). Only the movement resolver writes to it, by
///                   committing `TileChange`s from the effect engine.
///
/// `restart_level` resets `grid = base_grid.clone()`.
///
/// ## Player motion
///
/// The player is grid aligned through `target` and drawn at the
/// continuous `pos`. Idle-at-target means `pos` equals the Actor-anchored
/// world position of `target`; `WorldPos::move_towards` guarantees exact
/// equality on arrival.
///
/// A `WorldState` is only ever built from a parsed and validated
/// `LevelDef`, so a running game always has a grid and a player.

use crate::config::SpeedConfig;
use crate::domain::grid::{Anchor, Cell, Grid, WorldPos};
use crate::domain::status::{PlayerStatus, SpriteKey};
use crate::domain::tile::TileType;
use crate::sim::level::LevelDef;
use crate::sim::motion::Sequence;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
    LevelComplete,
    GameComplete,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub pos: WorldPos,
    pub target: Cell,
    pub status: PlayerStatus,
    /// Tile type of the last cell a directional step landed on.
    pub last_tile: Option<TileType>,
}

impl Player {
    pub fn spawn(cell: Cell, grid: &Grid) -> Self {
        Player {
            pos: grid.cell_to_world(cell, Anchor::Actor),
            target: cell,
            status: PlayerStatus::new(),
            last_tile: grid.tile_type(cell),
        }
    }

    pub fn target_pos(&self, grid: &Grid) -> WorldPos {
        grid.cell_to_world(self.target, Anchor::Actor)
    }

    #[inline]
    pub fn is_idle(&self, grid: &Grid) -> bool {
        self.pos == self.target_pos(grid)
    }
}

pub struct WorldState {
    // ── Tile layers ──
    pub base_grid: Grid,
    pub grid: Grid,

    // ── Player ──
    pub player: Player,
    pub player_spawn: Cell,
    /// Active slide or jump. At most one at a time.
    pub sequence: Option<Sequence>,
    /// Sprite shown after the previous tick, for change detection.
    pub last_sprite: SpriteKey,

    // ── Speed config ──
    pub speed: SpeedConfig,

    // ── Meta ──
    pub phase: Phase,
    pub current_level: usize,
    pub total_levels: usize,
    pub level_name: String,
    pub tick: u64,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,

    // ── Pause ──
    pub paused: bool,
}

// ── Construction ──

impl WorldState {
    pub fn new(level: &LevelDef, speed: SpeedConfig) -> Self {
        let player = Player::spawn(level.spawn, &level.grid);
        let last_sprite = player.status.sprite();
        WorldState {
            base_grid: level.grid.clone(),
            grid: level.grid.clone(),
            player,
            player_spawn: level.spawn,
            sequence: None,
            last_sprite,
            speed,
            phase: Phase::Title,
            current_level: 0,
            total_levels: 1,
            level_name: level.name.clone(),
            tick: 0,
            message: String::new(),
            message_timer: 0,
            paused: false,
        }
    }

    /// Replace the running level. Keeps speed settings; enters Playing.
    pub fn load_level(&mut self, level: &LevelDef, index: usize, total: usize) {
        self.base_grid = level.grid.clone();
        self.player_spawn = level.spawn;
        self.current_level = index;
        self.total_levels = total;
        self.level_name = level.name.clone();
        self.restart_level();
        log::info!("level {} loaded: {}", index + 1, level.name);
        self.set_message(&level.name, 120);
    }

    /// Reset the effective grid and the player to the state at load time.
    pub fn restart_level(&mut self) {
        self.grid = self.base_grid.clone();
        self.player = Player::spawn(self.player_spawn, &self.grid);
        self.last_sprite = self.player.status.sprite();
        self.sequence = None;
        self.tick = 0;
        self.paused = false;
        self.phase = Phase::Playing;
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Cell the player currently occupies on screen.
    pub fn player_cell(&self) -> Cell {
        self.grid.world_to_cell(self.player.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::grid_from;
    use crate::domain::grid::TileChange;
    use crate::domain::tile::Tile;

    fn level(rows: &[&str]) -> LevelDef {
        let (grid, spawn) = grid_from(rows);
        LevelDef {
            name: "test".into(),
            grid,
            spawn: spawn.unwrap_or_default(),
        }
    }

    #[test]
    fn new_world_places_player_idle_on_spawn() {
        let world = WorldState::new(&level(&["P.I"]), SpeedConfig::default());
        assert_eq!(world.player.target, Cell::new(0, 0));
        assert!(world.player.is_idle(&world.grid));
        assert_eq!(world.player_cell(), Cell::new(0, 0));
        assert_eq!(world.phase, Phase::Title);
        assert!(world.sequence.is_none());
    }

    #[test]
    fn restart_restores_grid_and_player() {
        let mut world = WorldState::new(&level(&["PF"]), SpeedConfig::default());
        world.load_level(&level(&["PF"]), 0, 1);
        let fire = Cell::new(1, 0);
        world.grid.apply(&[TileChange { cell: fire, from: TileType::Fire, to: Tile::new(TileType::FireSmall) }]);
        world.player.target = fire;
        world.player.status.set_wet(true);

        world.restart_level();
        assert_eq!(world.grid.tile_type(fire), Some(TileType::Fire));
        assert_eq!(world.base_grid.tile_type(fire), Some(TileType::Fire));
        assert_eq!(world.player.target, Cell::new(0, 0));
        assert!(!world.player.status.is_wet());
        assert_eq!(world.phase, Phase::Playing);
    }

    #[test]
    fn moving_target_leaves_idle() {
        let mut world = WorldState::new(&level(&["P."]), SpeedConfig::default());
        world.player.target = Cell::new(1, 0);
        assert!(!world.player.is_idle(&world.grid));
    }
}
