/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Glyph)
///   2. Compare each glyph with `back` buffer (previous frame)
///   3. Only emit terminal commands for glyphs that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each grid cell is drawn as two terminal columns. World `+y` is up, so
/// screen rows grow as world `y` shrinks. The viewport is centred on the
/// camera position, which is what makes the camera smoothing visible.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::grid::{Direction, WorldPos};
use crate::domain::status::{Look, SpriteKey};
use crate::domain::tile::TileType;
use crate::sim::event::SpriteSink;
use crate::sim::world::{Phase, WorldState};
use crate::ui::camera::CameraFollow;
use crate::ui::effects::EffectLayer;

// ── Glyph: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Glyph {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Glyph {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// gaps between rows match on terminals that paint them separately.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Glyph = Glyph { ch: ' ', fg: Color::White, bg: Glyph::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Glyph = Glyph { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Glyph { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Glyphs ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Glyph>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Glyph::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Glyph::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Glyph::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, g: Glyph) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = g;
        }
    }

    fn get(&self, x: usize, y: usize) -> Glyph {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Glyph::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Glyph::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Glyph::new(' ', Color::Black, bg));
        }
    }
}

// ── Styling ──

/// Two-column face for each tile type.
fn tile_face(kind: TileType) -> ([char; 2], Color, Color) {
    let rgb = |r, g, b| Color::Rgb { r, g, b };
    match kind {
        TileType::Normal => (['.', ' '], rgb(90, 90, 110), rgb(40, 40, 55)),
        TileType::Wall => (['█', '█'], rgb(120, 120, 130), Color::Reset),
        TileType::Fire => (['▲', '▲'], rgb(255, 80, 30), rgb(90, 20, 10)),
        TileType::FireSmall => (['^', ' '], rgb(255, 160, 50), rgb(60, 30, 20)),
        TileType::Electric => (['ϟ', 'ϟ'], rgb(255, 240, 80), rgb(50, 50, 20)),
        TileType::Gas => (['░', '░'], rgb(140, 220, 90), rgb(30, 60, 30)),
        TileType::Ice => (['=', '='], rgb(220, 250, 255), rgb(80, 150, 190)),
        TileType::Water => (['~', '~'], rgb(120, 180, 255), rgb(20, 50, 120)),
        TileType::Bounce => (['(', ')'], rgb(255, 120, 255), rgb(60, 20, 60)),
        TileType::Mud => ([':', ':'], rgb(170, 120, 70), rgb(70, 45, 25)),
        TileType::Hole => ([' ', ' '], Color::Black, Color::Black),
        TileType::Win => (['[', ']'], rgb(255, 220, 50), rgb(80, 60, 10)),
    }
}

fn player_face(sprite: SpriteKey) -> ([char; 2], Color) {
    let arrow = match sprite.facing {
        Direction::Up => '^',
        Direction::Down => 'v',
        Direction::Left => '<',
        Direction::Right => '>',
    };
    let fg = match sprite.look {
        Look::Default => Color::White,
        Look::Wet => Color::Rgb { r: 90, g: 170, b: 255 },
        Look::Fire => Color::Rgb { r: 255, g: 110, b: 40 },
        Look::Stuck => Color::Rgb { r: 190, g: 140, b: 80 },
    };
    (['@', arrow], fg)
}

fn status_label(w: &WorldState) -> &'static str {
    let s = &w.player.status;
    if s.is_stuck {
        "STUCK"
    } else if s.is_wet() {
        "WET"
    } else if s.is_on_fire() {
        "ON FIRE"
    } else {
        "dry"
    }
}

// ── Viewport: world cell units → screen columns/rows ──

/// Each game cell spans this many terminal columns.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

#[derive(Clone, Copy, Debug)]
struct Viewport {
    cols: usize,
    rows: usize,
    top: usize,
    /// Camera position in cell units.
    center: (f32, f32),
}

impl Viewport {
    /// Left column and row of the cell-unit position `(cx, cy)`, if visible.
    fn to_screen(&self, cx: f32, cy: f32) -> Option<(usize, usize)> {
        let col = (self.cols / 2) as f32 + (cx - self.center.0) * CELL_W as f32;
        let row = (self.rows / 2) as f32 - (cy - self.center.1);
        let (col, row) = (col.round(), row.round());
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        if col + 1 >= self.cols || row >= self.rows {
            return None;
        }
        Some((col, self.top + row))
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    sprite: SpriteKey,
}

impl SpriteSink for Renderer {
    fn show_sprite(&mut self, sprite: SpriteKey) {
        log::trace!("sprite {}", sprite.name());
        self.sprite = sprite;
    }
}

impl Renderer {
    pub fn new(sprite: SpriteKey) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            sprite,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Glyph::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame
        self.back.cells.fill(Glyph::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState, camera: &CameraFollow, effects: &EffectLayer) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Glyph::INVALID);
            queue!(self.writer, SetBackgroundColor(Glyph::BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change → clear for a clean transition
        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Glyph::INVALID);
            queue!(self.writer, SetBackgroundColor(Glyph::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.front.clear();
        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::Playing | Phase::LevelComplete => self.compose_game(world, camera, effects),
            Phase::GameComplete => self.compose_game_complete(world),
        }
        if world.paused {
            self.compose_pause_overlay();
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed glyphs ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Glyph::BASE_BG;

        // Explicit base colors; ResetColor would fall back to the terminal default
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Glyph::BASE_BG))?;

        for y in 0..self.front.height {
            let mut need_move = true;
            for x in 0..self.front.width {
                let g = self.front.get(x, y);
                if g == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }
                if need_move {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if g.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(g.fg))?;
                    last_fg = g.fg;
                }
                if g.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(g.bg))?;
                    last_bg = g.bg;
                }
                queue!(self.writer, Print(g.ch))?;
            }
        }
        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn viewport(&self, w: &WorldState, camera: &CameraFollow) -> Viewport {
        let m = w.grid.metrics();
        // Camera tracks the actor anchor; undo it to get cell units
        let cx = (camera.pos.x - m.actor_offset.x) / m.cell_size;
        let cy = (camera.pos.y - m.actor_offset.y) / m.cell_size;
        Viewport {
            cols: self.front.width,
            rows: self.front.height.saturating_sub(MAP_ROW + 2),
            top: MAP_ROW,
            center: (cx, cy),
        }
    }

    fn compose_game(&mut self, w: &WorldState, camera: &CameraFollow, effects: &EffectLayer) {
        // ── HUD row ──
        let last = w.player.last_tile.map(|t| format!("{:?}", t)).unwrap_or_else(|| "-".into());
        let hud = format!(
            " Lv.{}/{}  {}   status: {:<7}  on: {:<9} ",
            w.current_level + 1, w.total_levels, w.level_name, status_label(w), last,
        );
        self.front.fill_row(HUD_ROW, Color::Rgb { r: 40, g: 40, b: 70 });
        self.front.put_str(0, HUD_ROW, &hud, Color::Rgb { r: 255, g: 220, b: 50 }, Color::Rgb { r: 40, g: 40, b: 70 });

        let view = self.viewport(w, camera);
        let m = *w.grid.metrics();

        // ── Tiles ──
        for (cell, tile) in w.grid.cells() {
            let tile = match tile {
                Some(t) => t,
                None => continue,
            };
            if let Some((col, row)) = view.to_screen(cell.x as f32, cell.y as f32) {
                let (chars, fg, bg) = tile_face(tile.kind());
                self.front.set(col, row, Glyph::new(chars[0], fg, bg));
                self.front.set(col + 1, row, Glyph::new(chars[1], fg, bg));
            }
        }

        // ── Effects ──
        for e in effects.iter() {
            let p = effects.progress(e);
            let fade = (255.0 * (1.0 - p)) as u8;
            let fg = Color::Rgb { r: 255, g: fade, b: 0 };
            let (cx, cy) = to_cells(e.pos, m.effect_offset, m.cell_size);
            if let Some((col, row)) = view.to_screen(cx, cy) {
                let bg = self.front.get(col, row).bg;
                self.front.set(col, row, Glyph::new('*', fg, bg));
                self.front.set(col + 1, row, Glyph::new('*', fg, bg));
            }
        }

        // ── Player ──
        let (cx, cy) = to_cells(w.player.pos, m.actor_offset, m.cell_size);
        if let Some((col, row)) = view.to_screen(cx, cy) {
            let (chars, fg) = player_face(self.sprite);
            let bg = self.front.get(col, row).bg;
            self.front.set(col, row, Glyph::new(chars[0], fg, bg));
            self.front.set(col + 1, row, Glyph::new(chars[1], fg, bg));
        }

        // ── Message + help rows ──
        let msg_row = self.front.height.saturating_sub(2);
        if !w.message.is_empty() {
            let msg = format!(" ◈ {} ", w.message);
            self.front.fill_row(msg_row, Color::Rgb { r: 200, g: 180, b: 50 });
            self.front.put_str(0, msg_row, &msg, Color::Black, Color::Rgb { r: 200, g: 180, b: 50 });
        }
        let help = " ←→↑↓/WASD Move   F1 Pause   R Restart   ESC Quit";
        self.front.put_str(0, msg_row + 1, help, Color::DarkGrey, Color::Reset);
    }

    fn compose_title(&mut self, w: &WorldState) {
        let title = [
            r"  _____ _ _       ____  _             ",
            r" |_   _(_) | ___ / ___|| |_ ___ _ __  ",
            r"   | | | | |/ _ \___ \| __/ _ \ '_ \ ",
            r"   | | | | |  __/ ___) | ||  __/ |_) |",
            r"   |_| |_|_|\___||____/ \__\___| .__/ ",
            r"                               |_|    ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, Color::Rgb { r: 120, g: 210, b: 255 }, Color::Reset);
        }

        let info = format!("{} levels loaded", w.total_levels);
        self.front.put_str(8, 10, &info, Color::DarkGrey, Color::Reset);
        self.front.put_str(8, 12, "ENTER   Start", Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);
        self.front.put_str(8, 13, " ESC    Quit", Color::White, Color::Reset);

        let legend: [(TileType, &str); 6] = [
            (TileType::Water, "soaks you; wet feet walk through fire"),
            (TileType::FireSmall, "sets you alight; burning melts ice"),
            (TileType::Electric, "shocks the wet, shorts out when burnt"),
            (TileType::Gas, "explodes in a chain under a burning player"),
            (TileType::Bounce, "throws you two cells ahead"),
            (TileType::Mud, "holds you for one move"),
        ];
        for (i, (kind, text)) in legend.iter().enumerate() {
            let (chars, fg, bg) = tile_face(*kind);
            let row = 15 + i;
            self.front.set(8, row, Glyph::new(chars[0], fg, bg));
            self.front.set(9, row, Glyph::new(chars[1], fg, bg));
            self.front.put_str(11, row, text, Color::White, Color::Reset);
        }
    }

    fn compose_game_complete(&mut self, w: &WorldState) {
        let box_art = [
            "╔══════════════════════════════╗",
            "║   ★  ALL LEVELS COMPLETE  ★  ║",
            "╚══════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(4, 4 + i, l, Color::Rgb { r: 255, g: 220, b: 50 }, Color::Reset);
        }
        let levels = format!("◈ {} levels cleared", w.total_levels);
        self.front.put_str(6, 9, &levels, Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);
        self.front.put_str(6, 11, "▸ ENTER / ESC: Quit", Color::White, Color::Reset);
    }

    fn compose_pause_overlay(&mut self) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let box_w = 28_usize.min(self.front.width);
        let box_h = 6_usize.min(self.front.height.saturating_sub(MAP_ROW));
        let box_x = self.front.width.saturating_sub(box_w) / 2;
        let box_y = MAP_ROW + self.front.height.saturating_sub(MAP_ROW + box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Glyph::new(' ', Color::Reset, dim));
            }
        }
        let hdr = Color::Rgb { r: 255, g: 220, b: 50 };
        let key = Color::Rgb { r: 100, g: 200, b: 255 };
        self.front.put_str(box_x + 9, box_y + 1, "PAUSED", hdr, dim);
        self.front.put_str(box_x + 2, box_y + 3, "F1  Resume", key, dim);
        self.front.put_str(box_x + 2, box_y + 4, "F2  Restart Level", key, dim);
    }
}

/// World position with its anchor offset removed, in cell units.
fn to_cells(pos: WorldPos, offset: WorldPos, cell_size: f32) -> (f32, f32) {
    ((pos.x - offset.x) / cell_size, (pos.y - offset.y) / cell_size)
}
