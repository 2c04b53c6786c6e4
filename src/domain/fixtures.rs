/// Test fixtures: build grids from string diagrams.
///
/// Rows are written top-to-bottom as they appear on screen; the first row
/// is the highest `y`. Symbols follow `TileType::symbol`, `P` is a Normal
/// tile marking the start cell, and a space leaves the cell unpopulated.

use super::grid::{Cell, CellMetrics, Grid};
use super::tile::{Tile, TileType};

pub fn grid_from(rows: &[&str]) -> (Grid, Option<Cell>) {
    let height = rows.len();
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let mut grid = Grid::new(width, height, CellMetrics::default());
    let mut start = None;

    for (row, line) in rows.iter().enumerate() {
        let y = (height - 1 - row) as i32;
        for (x, ch) in line.chars().enumerate() {
            let cell = Cell::new(x as i32, y);
            let kind = match ch {
                'P' => {
                    start = Some(cell);
                    TileType::Normal
                }
                other => match TileType::from_symbol(other) {
                    Some(t) => t,
                    None => continue,
                },
            };
            grid.set_tile(cell, Tile::new(kind));
        }
    }

    (grid, start)
}
