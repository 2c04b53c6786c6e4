/// Grid store: the tile layer plus the cell <-> world coordinate mapping.
///
/// ## Coordinates
///
/// Two spaces, converted only here:
///   - `Cell`     — integer grid coordinate, the key into the tile layer.
///   - `WorldPos` — continuous position used for smooth interpolation.
///
/// `+y` is up (`Direction::Up`), matching the level files being read
/// top-to-bottom and flipped on load.
///
/// A cell that was never populated (or lies outside the grid) has no tile.
/// Callers treat "no tile" as impassable, exactly like a Wall.

use super::tile::{Tile, TileType};

// ── Cell / Direction ──

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Cell { x, y }
    }

    /// The neighbouring cell in `dir`.
    pub fn offset(self, dir: Direction) -> Cell {
        let (dx, dy) = dir.delta();
        Cell { x: self.x + dx, y: self.y + dy }
    }
}

/// The four cardinal directions. No diagonals exist anywhere in the engine.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    /// Neighbour scan order for flood fills.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

// ── World space ──

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
}

impl WorldPos {
    pub const fn new(x: f32, y: f32) -> Self {
        WorldPos { x, y }
    }

    pub fn distance(self, other: WorldPos) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Step toward `target` by at most `max_delta`.
    /// Lands exactly on `target` once it is within reach, so callers can
    /// compare positions with `==` to detect arrival.
    pub fn move_towards(self, target: WorldPos, max_delta: f32) -> WorldPos {
        let dist = self.distance(target);
        if dist <= max_delta || dist == 0.0 {
            return target;
        }
        let t = max_delta / dist;
        WorldPos {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
        }
    }

    /// Linear interpolation, `t` in 0..=1.
    pub fn lerp(self, target: WorldPos, t: f32) -> WorldPos {
        WorldPos {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
        }
    }
}

/// Which centring offset `cell_to_world` applies.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Anchor {
    /// Where the player stands inside a cell.
    Actor,
    /// Where transient effects (explosions) are drawn.
    Effect,
}

/// Cell size and per-anchor offsets, all in world units.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CellMetrics {
    pub cell_size: f32,
    pub actor_offset: WorldPos,
    pub effect_offset: WorldPos,
}

impl Default for CellMetrics {
    fn default() -> Self {
        CellMetrics {
            cell_size: 3.2,
            actor_offset: WorldPos::new(0.8, 1.3),
            effect_offset: WorldPos::new(1.9, 1.9),
        }
    }
}

/// A committed tile replacement produced by the effect engine.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TileChange {
    pub cell: Cell,
    pub from: TileType,
    pub to: Tile,
}

// ── Grid ──

#[derive(Clone, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Option<Tile>>,
    metrics: CellMetrics,
}

impl Grid {
    /// An all-unpopulated grid.
    pub fn new(width: usize, height: usize, metrics: CellMetrics) -> Self {
        Grid {
            width,
            height,
            tiles: vec![None; width * height],
            metrics,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn metrics(&self) -> &CellMetrics {
        &self.metrics
    }

    #[inline]
    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 {
            return None;
        }
        let (x, y) = (cell.x as usize, cell.y as usize);
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// Tile at `cell`, `None` when unpopulated or out of bounds.
    #[inline]
    pub fn get_tile(&self, cell: Cell) -> Option<&Tile> {
        self.index(cell).and_then(|i| self.tiles[i].as_ref())
    }

    #[inline]
    pub fn tile_type(&self, cell: Cell) -> Option<TileType> {
        self.get_tile(cell).map(|t| t.kind())
    }

    /// Place a tile, returning whatever was there before.
    /// Writes outside the grid are dropped.
    pub fn set_tile(&mut self, cell: Cell, tile: Tile) -> Option<Tile> {
        match self.index(cell) {
            Some(i) => self.tiles[i].replace(tile),
            None => {
                log::warn!("set_tile outside grid at {:?} ({:?})", cell, tile.kind());
                None
            }
        }
    }

    /// Commit a batch of engine changes in order.
    pub fn apply(&mut self, changes: &[TileChange]) {
        for change in changes {
            self.set_tile(change.cell, change.to);
        }
    }

    pub fn world_to_cell(&self, pos: WorldPos) -> Cell {
        let size = self.metrics.cell_size;
        Cell {
            x: (pos.x / size).floor() as i32,
            y: (pos.y / size).floor() as i32,
        }
    }

    pub fn cell_to_world(&self, cell: Cell, anchor: Anchor) -> WorldPos {
        let size = self.metrics.cell_size;
        let offset = match anchor {
            Anchor::Actor => self.metrics.actor_offset,
            Anchor::Effect => self.metrics.effect_offset,
        };
        WorldPos {
            x: cell.x as f32 * size + offset.x,
            y: cell.y as f32 * size + offset.y,
        }
    }

    /// Every in-bounds cell with its tile, row by row from y = 0.
    pub fn cells(&self) -> impl Iterator<Item = (Cell, Option<&Tile>)> + '_ {
        self.tiles.iter().enumerate().map(move |(i, t)| {
            let cell = Cell::new((i % self.width) as i32, (i / self.width) as i32);
            (cell, t.as_ref())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpopulated_and_out_of_bounds_have_no_tile() {
        let mut g = Grid::new(3, 2, CellMetrics::default());
        g.set_tile(Cell::new(1, 1), Tile::new(TileType::Ice));
        assert_eq!(g.tile_type(Cell::new(1, 1)), Some(TileType::Ice));
        assert_eq!(g.tile_type(Cell::new(0, 0)), None);
        assert_eq!(g.tile_type(Cell::new(-1, 0)), None);
        assert_eq!(g.tile_type(Cell::new(3, 0)), None);
    }

    #[test]
    fn set_tile_returns_previous_and_ignores_outside() {
        let mut g = Grid::new(2, 2, CellMetrics::default());
        assert!(g.set_tile(Cell::new(0, 0), Tile::new(TileType::Fire)).is_none());
        let prev = g.set_tile(Cell::new(0, 0), Tile::new(TileType::FireSmall));
        assert_eq!(prev.map(|t| t.kind()), Some(TileType::Fire));
        assert!(g.set_tile(Cell::new(5, 5), Tile::new(TileType::Wall)).is_none());
        assert_eq!(g.tile_type(Cell::new(5, 5)), None);
    }

    #[test]
    fn cell_world_round_trip_for_both_anchors() {
        let g = Grid::new(10, 10, CellMetrics::default());
        for &cell in &[Cell::new(0, 0), Cell::new(3, 7), Cell::new(9, 2)] {
            assert_eq!(g.world_to_cell(g.cell_to_world(cell, Anchor::Actor)), cell);
            assert_eq!(g.world_to_cell(g.cell_to_world(cell, Anchor::Effect)), cell);
        }
        // Negative coordinates floor instead of truncating toward zero
        assert_eq!(g.world_to_cell(WorldPos::new(-0.1, -3.3)), Cell::new(-1, -2));
    }

    #[test]
    fn move_towards_snaps_onto_target() {
        let a = WorldPos::new(0.0, 0.0);
        let b = WorldPos::new(3.2, 0.0);
        let mid = a.move_towards(b, 1.0);
        assert!((mid.x - 1.0).abs() < 1e-5);
        assert_eq!(mid.move_towards(b, 5.0), b);
        assert_eq!(b.move_towards(b, 0.0), b);
    }

    #[test]
    fn offsets_follow_direction() {
        let c = Cell::new(2, 2);
        assert_eq!(c.offset(Direction::Up), Cell::new(2, 3));
        assert_eq!(c.offset(Direction::Down), Cell::new(2, 1));
        assert_eq!(c.offset(Direction::Left), Cell::new(1, 2));
        assert_eq!(c.offset(Direction::Right), Cell::new(3, 2));
    }
}
