/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by filename)
///   2. Built-in embedded levels
///
/// ## Level format (`.txt`):
///   ```text
///   # Level Name
///   % Gas=Ice
///   ! 4,2
///   <map rows, top row first>
///   ```
///
///   - `# Name` — only recognised before the first map row, and only when
///     the text after `# ` contains something other than tile symbols,
///     so a wall row like `#########` is never mistaken for a name.
///   - `% Kind=Replacement` — replacement tile for every `Kind` tile in
///     this level. Only Fire, Electric, Gas and Ice can be overridden.
///   - `! x,y` — camera override for every Win tile, in cell coordinates
///     (`+y` up, row 0 at the bottom), anchored like the player.
///
/// ## Tile legend:
///   '.' = Normal      '#' = Wall        'F' = Fire       'f' = FireSmall
///   'E' = Electric    'G' = Gas         'I' = Ice        'W' = Water
///   'B' = Bounce      'M' = Mud         'O' = Hole       'X' = Win
///   'P' = Player spawn (Normal underneath)
///   ' ' = no tile (impassable)
///
/// Unknown symbols leave the cell empty and log a warning. Structural
/// problems (no map, no spawn, bad directives) are a `LevelError`.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::GameConfig;
use crate::domain::grid::{Cell, CellMetrics, Grid, WorldPos};
use crate::domain::tile::{Tile, TileType};

/// A parsed and validated level, ready to become a `WorldState`.
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub grid: Grid,
    pub spawn: Cell,
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level has no map rows")]
    Empty,
    #[error("level has no player spawn 'P'")]
    MissingSpawn,
    #[error("level has {0} player spawns, expected exactly one")]
    MultipleSpawns(usize),
    #[error("line {line}: bad replacement directive {text:?}")]
    BadReplacement { line: usize, text: String },
    #[error("line {line}: bad camera directive {text:?}")]
    BadCamera { line: usize, text: String },
    #[error("{}: {source}", .path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<LevelError>,
    },
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load every level for this configuration.
///
/// Uses `config.levels_dir` when it holds at least one `.txt` file,
/// otherwise the embedded levels. Any invalid level fails the whole load.
pub fn load_levels(config: &GameConfig) -> Result<Vec<LevelDef>, LevelError> {
    let dir = &config.levels_dir;
    if dir.is_dir() {
        let levels = load_from_directory(dir, &config.grid)?;
        if !levels.is_empty() {
            log::info!("{} levels from {}", levels.len(), dir.display());
            return Ok(levels);
        }
    }
    log::info!("using built-in levels");
    embedded_levels(&config.grid)
}

/// Parse a single level from text content.
pub fn parse_level(content: &str, metrics: &CellMetrics) -> Result<LevelDef, LevelError> {
    let mut name = String::new();
    let mut rows: Vec<&str> = vec![];
    let mut replacements: Vec<(TileType, TileType)> = vec![];
    let mut camera: Option<(f32, f32)> = None;

    for (i, line) in content.lines().enumerate() {
        let line_no = i + 1;
        if rows.is_empty() && name.is_empty() && is_name_line(line) {
            name = line[1..].trim().to_string();
        } else if let Some(rest) = line.strip_prefix('%') {
            let pair = parse_replacement(rest).ok_or_else(|| LevelError::BadReplacement {
                line: line_no,
                text: line.to_string(),
            })?;
            replacements.push(pair);
        } else if let Some(rest) = line.strip_prefix('!') {
            let xy = parse_camera(rest).ok_or_else(|| LevelError::BadCamera {
                line: line_no,
                text: line.to_string(),
            })?;
            camera = Some(xy);
        } else if rows.is_empty() && line.trim().is_empty() {
            // leading blank lines
        } else {
            rows.push(line);
        }
    }

    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }
    if rows.is_empty() {
        return Err(LevelError::Empty);
    }

    if name.is_empty() {
        name = "Unnamed Level".to_string();
    }

    let height = rows.len();
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let mut grid = Grid::new(width, height, *metrics);

    let camera_pos = camera.map(|(x, y)| {
        WorldPos::new(
            x * metrics.cell_size + metrics.actor_offset.x,
            y * metrics.cell_size + metrics.actor_offset.y,
        )
    });

    let mut spawns = vec![];
    for (row, line) in rows.iter().enumerate() {
        // Top row of the file is the highest y
        let y = (height - 1 - row) as i32;
        for (x, ch) in line.chars().enumerate() {
            let cell = Cell::new(x as i32, y);
            let kind = match ch {
                ' ' => continue,
                'P' => {
                    spawns.push(cell);
                    TileType::Normal
                }
                other => match TileType::from_symbol(other) {
                    Some(t) => t,
                    None => {
                        log::warn!("{}: unknown tile {:?} at {:?}, left empty", name, other, cell);
                        continue;
                    }
                },
            };

            let mut tile = Tile::new(kind);
            if let Some(&(_, to)) = replacements.iter().rev().find(|(from, _)| *from == kind) {
                tile = tile.with_replacement(to);
            }
            if let Some(pos) = camera_pos {
                tile = tile.with_camera_override(pos);
            }
            grid.set_tile(cell, tile);
        }
    }

    let spawn = match spawns.as_slice() {
        [] => return Err(LevelError::MissingSpawn),
        [one] => *one,
        many => return Err(LevelError::MultipleSpawns(many.len())),
    };

    if camera_pos.is_some() && !grid.cells().any(|(_, t)| t.map(|t| t.kind()) == Some(TileType::Win)) {
        log::warn!("{}: camera override given but the level has no Win tile", name);
    }

    Ok(LevelDef { name, grid, spawn })
}

// ══════════════════════════════════════════════════════════════
// Directive parsing
// ══════════════════════════════════════════════════════════════

/// A name line starts with `# ` and holds at least one character that is
/// not a tile symbol.
fn is_name_line(line: &str) -> bool {
    match line.strip_prefix("# ") {
        Some(rest) => rest
            .chars()
            .any(|c| c != ' ' && c != 'P' && TileType::from_symbol(c).is_none()),
        None => false,
    }
}

/// `Kind=Replacement`, both tile names, case-insensitive.
fn parse_replacement(text: &str) -> Option<(TileType, TileType)> {
    let (from, to) = text.split_once('=')?;
    let from = TileType::from_name(from.trim())?;
    let to = TileType::from_name(to.trim())?;
    if !from.is_replaceable() {
        return None;
    }
    Some((from, to))
}

/// `x,y` in cell units.
fn parse_camera(text: &str) -> Option<(f32, f32)> {
    let (x, y) = text.split_once(',')?;
    let x = x.trim().parse::<f32>().ok()?;
    let y = y.trim().parse::<f32>().ok()?;
    if x.is_finite() && y.is_finite() {
        Some((x, y))
    } else {
        None
    }
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .txt files)
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path, metrics: &CellMetrics) -> Result<Vec<LevelDef>, LevelError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LevelError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |e| e == "txt"))
        .collect();
    paths.sort();

    let mut levels = vec![];
    for path in paths {
        let content = std::fs::read_to_string(&path).map_err(|source| LevelError::Io {
            path: path.clone(),
            source,
        })?;
        let def = parse_level(&content, metrics).map_err(|e| LevelError::InFile {
            path: path.clone(),
            source: Box::new(e),
        })?;
        levels.push(def);
    }

    Ok(levels)
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

const EMBEDDED: &[&str] = &[
    "\
# Level 1 - Douse
#########
#P.W.FFX#
#########
",
    "\
# Level 2 - Thin Ice
#########
#.......#
#P.IIIII#
#######.#
#X......#
#########
",
    "\
# Level 3 - Spark and Soot
############
#P.f.GG.E.X#
############
",
    "\
# Level 4 - Spring Mud
##########
#P.BO.M.X#
##########
",
    "\
# Level 5 - Wet Wires
% Fire=Normal
! 4,2
#########
#.W.E...#
#P#F#.#.#
#...f.#X#
#########
",
];

fn embedded_levels(metrics: &CellMetrics) -> Result<Vec<LevelDef>, LevelError> {
    EMBEDDED.iter().map(|text| parse_level(text, metrics)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::Anchor;

    fn parse(text: &str) -> Result<LevelDef, LevelError> {
        parse_level(text, &CellMetrics::default())
    }

    #[test]
    fn embedded_levels_are_valid() {
        let levels = embedded_levels(&CellMetrics::default()).unwrap();
        assert_eq!(levels.len(), EMBEDDED.len());
        for l in &levels {
            assert!(l.name.starts_with("Level "));
            assert_eq!(l.grid.tile_type(l.spawn), Some(TileType::Normal));
        }
    }

    #[test]
    fn rows_are_flipped_so_top_row_is_highest() {
        let def = parse("# Flip\nX.\nP.\n").unwrap();
        assert_eq!(def.spawn, Cell::new(0, 0));
        assert_eq!(def.grid.tile_type(Cell::new(0, 1)), Some(TileType::Win));
        assert_eq!(def.grid.height(), 2);
    }

    #[test]
    fn wall_row_is_not_a_name() {
        let def = parse("#####\n#P.X#\n#####\n").unwrap();
        assert_eq!(def.name, "Unnamed Level");
        assert_eq!(def.grid.height(), 3);
        assert_eq!(def.grid.tile_type(Cell::new(0, 2)), Some(TileType::Wall));
    }

    #[test]
    fn short_rows_and_spaces_are_empty_cells() {
        let def = parse("# Gaps\nP . X\n..\n").unwrap();
        assert_eq!(def.grid.width(), 5);
        assert_eq!(def.grid.tile_type(Cell::new(1, 1)), None);
        assert_eq!(def.grid.tile_type(Cell::new(4, 0)), None);
        assert_eq!(def.grid.tile_type(Cell::new(1, 0)), Some(TileType::Normal));
    }

    #[test]
    fn unknown_symbol_leaves_cell_empty() {
        let def = parse("# Odd\nP?X\n").unwrap();
        assert_eq!(def.grid.tile_type(Cell::new(1, 0)), None);
    }

    #[test]
    fn replacement_directive_applies_to_kind() {
        let def = parse("# Swap\n% gas = ice\nPGG\n").unwrap();
        for x in 1..3 {
            let tile = def.grid.get_tile(Cell::new(x, 0)).unwrap();
            assert_eq!(tile.replacement(), Some(TileType::Ice));
        }
    }

    #[test]
    fn camera_directive_converts_with_actor_anchor() {
        let def = parse("# Cam\n! 2,1\nP.X\n").unwrap();
        let win = def.grid.get_tile(Cell::new(2, 0)).unwrap();
        let expected = def.grid.cell_to_world(Cell::new(2, 1), Anchor::Actor);
        assert_eq!(win.camera_override(), Some(expected));
        assert_eq!(def.grid.get_tile(Cell::new(1, 0)).unwrap().camera_override(), None);
    }

    #[test]
    fn structural_errors() {
        assert!(matches!(parse("# Nothing\n\n"), Err(LevelError::Empty)));
        assert!(matches!(parse("# No spawn\n..X\n"), Err(LevelError::MissingSpawn)));
        assert!(matches!(parse("# Two\nP.P\n"), Err(LevelError::MultipleSpawns(2))));
        assert!(matches!(
            parse("# Bad\n% Wall=Normal\nP\n"),
            Err(LevelError::BadReplacement { line: 2, .. })
        ));
        assert!(matches!(
            parse("# Bad\n% Fire\nP\n"),
            Err(LevelError::BadReplacement { .. })
        ));
        assert!(matches!(
            parse("# Bad\n! 1;2\nP\n"),
            Err(LevelError::BadCamera { line: 2, .. })
        ));
    }

    #[test]
    fn directory_levels_sorted_and_errors_name_the_file() {
        let dir = std::env::temp_dir().join(format!("tilestep-levels-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("b.txt"), "# Second\nP.X\n").unwrap();
        std::fs::write(dir.join("a.txt"), "# First\nPX\n").unwrap();
        std::fs::write(dir.join("notes.md"), "ignored").unwrap();

        let levels = load_from_directory(&dir, &CellMetrics::default()).unwrap();
        let names: Vec<_> = levels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);

        std::fs::write(dir.join("c.txt"), "# Broken\n...\n").unwrap();
        let err = load_from_directory(&dir, &CellMetrics::default()).unwrap_err();
        assert!(err.to_string().contains("c.txt"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
