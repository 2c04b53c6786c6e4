/// Multi-cell motions as resumable state objects.
///
/// A `Sequence` lives in `WorldState::sequence` while active. The step
/// function drives it once per tick:
///   - **Slide** — resumes only when the player has reached its current
///     target, then either picks the next cell or finishes.
///   - **Jump**  — landing cell is chosen up front by `plan_jump`; the
///     target is only committed after the wind-up timer runs out.
///
/// Neither can be cancelled from outside; both run to their natural end.

use crate::domain::effect::is_accessible;
use crate::domain::grid::{Cell, Direction, Grid};
use crate::domain::status::PlayerStatus;
use crate::domain::tile::TileType;

#[derive(Clone, Debug, PartialEq)]
pub enum Sequence {
    Slide(Slide),
    Jump(Jump),
}

// ── Slide ──

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Slide {
    pub direction: Direction,
    /// Cell the player occupies (or is heading to) at this point of the slide.
    pub current: Cell,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlideStep {
    /// Move on to this cell and wait until it is reached.
    Advance(Cell),
    Finished,
}

impl Slide {
    pub fn new(start: Cell, direction: Direction) -> Self {
        Slide { direction, current: start }
    }

    /// Evaluate the next cell. Only call while the player is idle at `current`.
    ///
    /// Stops when the current cell is no longer Ice, or when the next cell
    /// is not accessible for the player's status.
    pub fn advance(&mut self, grid: &Grid, status: &PlayerStatus) -> SlideStep {
        if grid.tile_type(self.current) != Some(TileType::Ice) {
            return SlideStep::Finished;
        }
        let next = self.current.offset(self.direction);
        if !is_accessible(grid.tile_type(next), status) {
            return SlideStep::Finished;
        }
        self.current = next;
        SlideStep::Advance(next)
    }
}

// ── Jump ──

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Jump {
    pub landing: Cell,
    /// Seconds of wind-up left before the landing target is committed.
    pub windup_left: f32,
}

impl Jump {
    pub fn new(landing: Cell, windup: f32) -> Self {
        Jump { landing, windup_left: windup }
    }

    /// Burn `dt` seconds. Returns the landing cell once the wind-up is over.
    pub fn tick(&mut self, dt: f32) -> Option<Cell> {
        self.windup_left -= dt;
        if self.windup_left <= 0.0 {
            Some(self.landing)
        } else {
            None
        }
    }
}

/// Choose where a jump from `start` lands.
///
/// Scans up to `max_distance` cells in `dir`:
///   - Wall or no tile → stop scanning immediately
///   - inaccessible    → jump over it, unless it is the last scanned cell
///   - accessible      → best landing so far
///
/// Returns `start` when nothing ahead is a legal landing.
pub fn plan_jump(grid: &Grid, status: &PlayerStatus, start: Cell, dir: Direction, max_distance: u32) -> Cell {
    let mut scan = start;
    let mut landing = start;

    for i in 1..=max_distance {
        let next = scan.offset(dir);
        let kind = grid.tile_type(next);

        if matches!(kind, None | Some(TileType::Wall)) {
            break;
        }
        if !is_accessible(kind, status) {
            if i == max_distance {
                break;
            }
            scan = next;
            continue;
        }
        scan = next;
        landing = next;
    }

    landing
}
