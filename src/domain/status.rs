/// Player status: the flag record mutated by tile effects, plus the
/// sprite-selection state machine derived from it.
///
/// ## Invariants
///   - `wet` and `on_fire` never hold together; setting one clears the other.
///     Both are private so every write goes through `set_wet` / `set_on_fire`.
///   - `prevent_movement` is a one-shot latch: set by a tile effect,
///     consumed by the next input cycle via `take_prevent_move`.
///   - `freshly_unstuck` is set when a stuck player breaks free and cleared
///     once the player occupies a cell other than `last_stuck_cell`.

use super::grid::{Cell, Direction};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct PlayerStatus {
    wet: bool,
    on_fire: bool,
    pub is_stuck: bool,
    pub freshly_unstuck: bool,
    pub prevent_movement: bool,
    pub last_stuck_cell: Option<Cell>,
    pub last_input: Direction,
}

impl PlayerStatus {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_wet(&self) -> bool {
        self.wet
    }

    #[inline]
    pub fn is_on_fire(&self) -> bool {
        self.on_fire
    }

    pub fn set_wet(&mut self, wet: bool) {
        self.wet = wet;
        if wet {
            self.on_fire = false;
        }
    }

    pub fn set_on_fire(&mut self, fire: bool) {
        self.on_fire = fire;
        if fire {
            self.wet = false;
        }
    }

    pub fn prevent_move(&mut self) {
        self.prevent_movement = true;
    }

    /// Consume the latch. Returns whether it was set.
    pub fn take_prevent_move(&mut self) -> bool {
        std::mem::take(&mut self.prevent_movement)
    }

    pub fn get_stuck(&mut self, cell: Cell) {
        self.is_stuck = true;
        self.freshly_unstuck = false;
        self.last_stuck_cell = Some(cell);
    }

    pub fn break_free(&mut self) {
        self.is_stuck = false;
        self.freshly_unstuck = true;
    }

    /// Clear `freshly_unstuck` once the player is somewhere else.
    pub fn settle(&mut self, here: Cell) {
        if self.freshly_unstuck && self.last_stuck_cell != Some(here) {
            self.freshly_unstuck = false;
        }
    }

    pub fn sprite(&self) -> SpriteKey {
        let look = if self.is_stuck {
            Look::Stuck
        } else if self.wet {
            Look::Wet
        } else if self.on_fire {
            Look::Fire
        } else {
            Look::Default
        };
        SpriteKey { look, facing: self.last_input }
    }
}

// ── Sprite selection ──

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Look {
    Default,
    Wet,
    Fire,
    Stuck,
}

/// Abstract sprite reference. The presentation layer maps it to an asset.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SpriteKey {
    pub look: Look,
    pub facing: Direction,
}

impl SpriteKey {
    /// Asset name, e.g. `"wet_left"` or `"def_front"`.
    pub fn name(&self) -> &'static str {
        use Direction::*;
        match (self.look, self.facing) {
            (Look::Default, Up) => "def_back",
            (Look::Default, Down) => "def_front",
            (Look::Default, Left) => "def_left",
            (Look::Default, Right) => "def_right",
            (Look::Wet, Up) => "wet_back",
            (Look::Wet, Down) => "wet_front",
            (Look::Wet, Left) => "wet_left",
            (Look::Wet, Right) => "wet_right",
            (Look::Fire, Up) => "fire_back",
            (Look::Fire, Down) => "fire_front",
            (Look::Fire, Left) => "fire_left",
            (Look::Fire, Right) => "fire_right",
            (Look::Stuck, Up) => "stuck_back",
            (Look::Stuck, Down) => "stuck_front",
            (Look::Stuck, Left) => "stuck_left",
            (Look::Stuck, Right) => "stuck_right",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wet_and_fire_exclude_each_other_in_any_order() {
        let mut s = PlayerStatus::new();
        s.set_on_fire(true);
        s.set_wet(true);
        assert!(s.is_wet() && !s.is_on_fire());

        s.set_on_fire(true);
        assert!(s.is_on_fire() && !s.is_wet());

        // Clearing one never sets the other
        s.set_on_fire(false);
        assert!(!s.is_on_fire() && !s.is_wet());
        s.set_wet(true);
        s.set_wet(false);
        assert!(!s.is_on_fire() && !s.is_wet());
    }

    #[test]
    fn prevent_latch_is_one_shot() {
        let mut s = PlayerStatus::new();
        assert!(!s.take_prevent_move());
        s.prevent_move();
        assert!(s.take_prevent_move());
        assert!(!s.take_prevent_move());
    }

    #[test]
    fn stuck_cycle_and_settle() {
        let mud = Cell::new(4, 4);
        let mut s = PlayerStatus::new();
        s.get_stuck(mud);
        assert!(s.is_stuck);
        s.break_free();
        assert!(!s.is_stuck && s.freshly_unstuck);
        s.settle(mud);
        assert!(s.freshly_unstuck, "still on the mud cell");
        s.settle(Cell::new(5, 4));
        assert!(!s.freshly_unstuck);
    }

    #[test]
    fn sprite_priority_is_stuck_wet_fire_default() {
        let mut s = PlayerStatus::new();
        assert_eq!(s.sprite().name(), "def_front");

        s.last_input = Direction::Left;
        s.set_on_fire(true);
        assert_eq!(s.sprite().look, Look::Fire);
        assert_eq!(s.sprite().name(), "fire_left");

        s.set_wet(true);
        assert_eq!(s.sprite().name(), "wet_left");

        s.get_stuck(Cell::new(0, 0));
        s.last_input = Direction::Up;
        assert_eq!(s.sprite().name(), "stuck_back");
    }
}
