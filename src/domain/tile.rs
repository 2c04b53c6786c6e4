/// Tile types and per-tile data.
/// Behaviour lives in `effect.rs`; this module only describes what a tile IS.

use super::grid::WorldPos;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TileType {
    Normal,
    Wall,
    Fire,      // Enterable only while wet, then burns down
    FireSmall, // Walkable, sets the player alight
    Electric,  // Shocks wet players, shorts out under fire
    Gas,       // Explodes (chain) when entered on fire
    Ice,       // Slippery, melts under fire
    Water,
    Bounce,    // Launches the player forward
    Mud,       // Sticks the player for one input
    Hole,      // Blocks walking, not jumping
    Win,
}

impl TileType {
    pub const ALL: [TileType; 12] = [
        TileType::Normal,
        TileType::Wall,
        TileType::Fire,
        TileType::FireSmall,
        TileType::Electric,
        TileType::Gas,
        TileType::Ice,
        TileType::Water,
        TileType::Bounce,
        TileType::Mud,
        TileType::Hole,
        TileType::Win,
    ];

    /// Only these kinds carry a replacement (what they turn into when consumed).
    pub fn is_replaceable(self) -> bool {
        matches!(self, TileType::Fire | TileType::Electric | TileType::Gas | TileType::Ice)
    }

    pub fn default_replacement(self) -> Option<TileType> {
        match self {
            TileType::Fire => Some(TileType::FireSmall),
            TileType::Electric => Some(TileType::Normal),
            TileType::Gas => Some(TileType::Normal),
            TileType::Ice => Some(TileType::Water),
            _ => None,
        }
    }

    /// Level file symbol.
    pub fn symbol(self) -> char {
        match self {
            TileType::Normal => '.',
            TileType::Wall => '#',
            TileType::Fire => 'F',
            TileType::FireSmall => 'f',
            TileType::Electric => 'E',
            TileType::Gas => 'G',
            TileType::Ice => 'I',
            TileType::Water => 'W',
            TileType::Bounce => 'B',
            TileType::Mud => 'M',
            TileType::Hole => 'O',
            TileType::Win => 'X',
        }
    }

    pub fn from_symbol(ch: char) -> Option<TileType> {
        TileType::ALL.iter().copied().find(|t| t.symbol() == ch)
    }

    /// Case-insensitive name lookup, used by level replacement overrides.
    pub fn from_name(s: &str) -> Option<TileType> {
        TileType::ALL
            .iter()
            .copied()
            .find(|t| format!("{:?}", t).eq_ignore_ascii_case(s.trim()))
    }
}

/// One tile instance on the grid.
///
/// `replacement` is only ever stored for replaceable kinds and
/// `camera_override` only for Win, so the engine never has to check
/// which fields are meaningful.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Tile {
    kind: TileType,
    replacement: Option<TileType>,
    camera_override: Option<WorldPos>,
}

impl Tile {
    pub fn new(kind: TileType) -> Self {
        Tile {
            kind,
            replacement: kind.default_replacement(),
            camera_override: None,
        }
    }

    pub fn with_replacement(mut self, replacement: TileType) -> Self {
        if self.kind.is_replaceable() {
            self.replacement = Some(replacement);
        }
        self
    }

    pub fn with_camera_override(mut self, pos: WorldPos) -> Self {
        if self.kind == TileType::Win {
            self.camera_override = Some(pos);
        }
        self
    }

    #[inline]
    pub fn kind(&self) -> TileType {
        self.kind
    }

    #[inline]
    pub fn replacement(&self) -> Option<TileType> {
        self.replacement
    }

    #[inline]
    pub fn camera_override(&self) -> Option<WorldPos> {
        self.camera_override
    }
}

impl From<TileType> for Tile {
    fn from(kind: TileType) -> Self {
        Tile::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replacement_only_kept_for_replaceable_kinds() {
        assert_eq!(Tile::new(TileType::Fire).replacement(), Some(TileType::FireSmall));
        assert_eq!(
            Tile::new(TileType::Ice).with_replacement(TileType::Normal).replacement(),
            Some(TileType::Normal)
        );
        assert_eq!(Tile::new(TileType::Water).with_replacement(TileType::Ice).replacement(), None);
        assert_eq!(Tile::new(TileType::Mud).replacement(), None);
    }

    #[test]
    fn camera_override_only_on_win() {
        let pos = WorldPos::new(1.0, 2.0);
        assert_eq!(Tile::new(TileType::Win).with_camera_override(pos).camera_override(), Some(pos));
        assert_eq!(Tile::new(TileType::Normal).with_camera_override(pos).camera_override(), None);
    }

    #[test]
    fn symbols_and_names_are_unique_and_reversible() {
        for t in TileType::ALL {
            assert_eq!(TileType::from_symbol(t.symbol()), Some(t));
            assert_eq!(TileType::from_name(&format!("{:?}", t).to_lowercase()), Some(t));
        }
        assert_eq!(TileType::from_symbol('?'), None);
        assert_eq!(TileType::from_name("lava"), None);
    }
}
