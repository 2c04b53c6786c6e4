/// Tile effect engine — truth-table driven, pure.
///
/// Two entry points:
///   - `is_accessible` — may the player occupy / pass over a tile right now?
///     Used by slide and jump look-ahead without committing anything.
///   - `apply_step` — what happens when a move resolves onto a cell.
///     Returns the next status, the tile changes to commit, the cells that
///     exploded and an optional movement directive. Nothing is mutated here;
///     the movement resolver commits the outcome.
///
/// ## Accessibility Table
/// ┌──────────────────────────────────────────┬──────────────────┐
/// │ TileType                                  │ Accessible when  │
/// ├──────────────────────────────────────────┼──────────────────┤
/// │ Normal, FireSmall, Ice, Water, Bounce, Mud│ always           │
/// │ Wall, Hole, Win, no tile                  │ never            │
/// │ Fire                                      │ wet              │
/// │ Electric                                  │ not wet          │
/// │ Gas                                       │ on fire          │
/// └──────────────────────────────────────────┴──────────────────┘
///
/// ## Step Table
/// ┌───────────┬──────────────────────────────────────────────────────┐
/// │ Normal    │ nothing                                              │
/// │ Wall      │ cancel                                               │
/// │ Fire      │ wet: burn down to replacement │ dry: cancel          │
/// │ FireSmall │ set on fire                                          │
/// │ Electric  │ wet: dry + cancel │ on fire: short out + extinguish  │
/// │ Gas       │ on fire: chain explosion │ otherwise: cancel         │
/// │ Ice       │ on fire: melt │ otherwise: slide                     │
/// │ Water     │ set wet                                              │
/// │ Bounce    │ jump, max distance 2                                 │
/// │ Mud       │ dry + extinguish, stick once                         │
/// │ Hole      │ cancel (jumpable)                                    │
/// │ Win       │ level complete                                       │
/// │ no tile   │ cancel                                               │
/// └───────────┴──────────────────────────────────────────────────────┘

use super::grid::{Anchor, Cell, Direction, Grid, TileChange, WorldPos};
use super::status::PlayerStatus;
use super::tile::{Tile, TileType};

use std::collections::HashSet;

/// How far a Bounce tile throws the player.
pub const BOUNCE_DISTANCE: u32 = 2;

/// Multi-cell motion (or level end) requested by a step.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Directive {
    Slide(Direction),
    Jump { direction: Direction, max_distance: u32 },
    LevelComplete { camera: WorldPos },
}

#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome {
    pub status: PlayerStatus,
    pub changes: Vec<TileChange>,
    /// Cells converted by a gas explosion, in detonation order.
    pub explosions: Vec<Cell>,
    pub directive: Option<Directive>,
}

impl StepOutcome {
    fn new(status: PlayerStatus) -> Self {
        StepOutcome {
            status,
            changes: Vec::new(),
            explosions: Vec::new(),
            directive: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status.prevent_movement
    }
}

// ── Accessibility ──

/// See the accessibility table above. A missing tile is never accessible.
pub fn is_accessible(tile: Option<TileType>, status: &PlayerStatus) -> bool {
    match tile {
        Some(TileType::Normal)
        | Some(TileType::FireSmall)
        | Some(TileType::Ice)
        | Some(TileType::Water)
        | Some(TileType::Bounce)
        | Some(TileType::Mud) => true,
        Some(TileType::Fire) => status.is_wet(),
        Some(TileType::Electric) => !status.is_wet(),
        Some(TileType::Gas) => status.is_on_fire(),
        Some(TileType::Wall) | Some(TileType::Hole) | Some(TileType::Win) | None => false,
    }
}

// ── Step effects ──

/// Resolve the player stepping onto `cell`, which holds `tile`.
pub fn apply_step(tile: Option<&Tile>, cell: Cell, status: &PlayerStatus, grid: &Grid) -> StepOutcome {
    let mut out = tile_effect(tile, cell, status, grid);
    // A cancelled move never left the stuck cell
    if out.is_cancelled() {
        out.status.freshly_unstuck = status.freshly_unstuck;
    }
    out
}

fn tile_effect(tile: Option<&Tile>, cell: Cell, status: &PlayerStatus, grid: &Grid) -> StepOutcome {
    let mut out = StepOutcome::new(*status);
    out.status.settle(cell);

    let tile = match tile {
        Some(t) => t,
        None => {
            log::debug!("step into void at {:?}: blocked", cell);
            out.status.prevent_move();
            return out;
        }
    };

    let s = &mut out.status;
    match tile.kind() {
        TileType::Normal => {}

        TileType::Wall | TileType::Hole => s.prevent_move(),

        TileType::Fire => {
            if s.is_wet() {
                replace_in_place(tile, cell, grid, &mut out.changes);
            } else {
                s.prevent_move();
            }
        }

        TileType::FireSmall => s.set_on_fire(true),

        TileType::Electric => {
            if s.is_wet() {
                log::debug!("shocked at {:?}", cell);
                s.set_wet(false);
                s.prevent_move();
            } else if s.is_on_fire() && replace_in_place(tile, cell, grid, &mut out.changes) {
                s.set_on_fire(false);
            }
        }

        TileType::Gas => {
            if s.is_on_fire() {
                explode_gas(cell, grid, &mut out.changes, &mut out.explosions);
            } else {
                s.prevent_move();
            }
        }

        TileType::Ice => {
            if s.is_on_fire() {
                replace_in_place(tile, cell, grid, &mut out.changes);
            } else {
                out.directive = Some(Directive::Slide(s.last_input));
            }
        }

        TileType::Water => s.set_wet(true),

        TileType::Bounce => {
            out.directive = Some(Directive::Jump {
                direction: s.last_input,
                max_distance: BOUNCE_DISTANCE,
            });
        }

        TileType::Mud => {
            s.set_wet(false);
            s.set_on_fire(false);
            if s.is_stuck {
                s.break_free();
            } else if !s.freshly_unstuck {
                s.get_stuck(cell);
            }
        }

        TileType::Win => {
            let camera = tile
                .camera_override()
                .unwrap_or_else(|| grid.cell_to_world(cell, Anchor::Actor));
            log::info!("level complete at {:?}", cell);
            out.directive = Some(Directive::LevelComplete { camera });
        }
    }

    out
}

/// Swap the tile at `cell` for its replacement, but only if the grid still
/// holds this kind of tile there. Returns whether a change was queued.
fn replace_in_place(tile: &Tile, cell: Cell, grid: &Grid, changes: &mut Vec<TileChange>) -> bool {
    if grid.tile_type(cell) != Some(tile.kind()) {
        return false;
    }
    match tile.replacement() {
        Some(next) => {
            log::debug!("{:?} at {:?} -> {:?}", tile.kind(), cell, next);
            changes.push(TileChange { cell, from: tile.kind(), to: Tile::new(next) });
            true
        }
        None => {
            log::warn!("{:?} at {:?} has no replacement tile", tile.kind(), cell);
            false
        }
    }
}

/// Chain explosion over 4-connected Gas cells starting at `origin`.
///
/// Each Gas cell is converted to its own replacement and detonates once.
/// The visited set keeps the fill finite even for a Gas tile whose
/// replacement is Gas again.
fn explode_gas(origin: Cell, grid: &Grid, changes: &mut Vec<TileChange>, explosions: &mut Vec<Cell>) {
    let mut visited: HashSet<Cell> = HashSet::new();
    let mut stack = vec![origin];

    while let Some(cell) = stack.pop() {
        if !visited.insert(cell) {
            continue;
        }
        let tile = match grid.get_tile(cell) {
            Some(t) if t.kind() == TileType::Gas => t,
            _ => continue,
        };
        let next = tile.replacement().unwrap_or(TileType::Normal);
        changes.push(TileChange { cell, from: TileType::Gas, to: Tile::new(next) });
        explosions.push(cell);

        // Reverse so Up is explored first
        for dir in Direction::ALL.iter().rev() {
            let n = cell.offset(*dir);
            if !visited.contains(&n) && grid.tile_type(n) == Some(TileType::Gas) {
                stack.push(n);
            }
        }
    }

    log::debug!("gas explosion from {:?}: {} cells", origin, explosions.len());
}
