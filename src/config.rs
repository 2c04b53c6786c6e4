/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::grid::{CellMetrics, WorldPos};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub grid: CellMetrics,
    pub camera: CameraConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    pub move_speed: f32,          // world units per second while interpolating
    pub jump_windup_ms: u64,      // delay before a bounce commits its landing
    pub effect_lifetime_ms: u64,  // how long an explosion stays on screen
}

impl SpeedConfig {
    /// Seconds per simulation tick.
    pub fn dt(&self) -> f32 {
        self.tick_rate_ms as f32 / 1000.0
    }

    pub fn jump_windup(&self) -> f32 {
        self.jump_windup_ms as f32 / 1000.0
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        let t = TomlSpeed::default();
        SpeedConfig {
            tick_rate_ms: t.tick_rate_ms,
            move_speed: t.move_speed,
            jump_windup_ms: t.jump_windup_ms,
            effect_lifetime_ms: t.effect_lifetime_ms,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    pub smooth: f32,
    pub offset: WorldPos,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    grid: TomlGrid,
    #[serde(default)]
    camera: TomlCamera,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_move_speed")]
    move_speed: f32,
    #[serde(default = "default_jump_windup")]
    jump_windup_ms: u64,
    #[serde(default = "default_effect_lifetime")]
    effect_lifetime_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGrid {
    #[serde(default = "default_cell_size")]
    cell_size: f32,
    #[serde(default = "default_actor_offset")]
    actor_offset: [f32; 2],
    #[serde(default = "default_effect_offset")]
    effect_offset: [f32; 2],
}

#[derive(Deserialize, Debug)]
struct TomlCamera {
    #[serde(default = "default_smooth")]
    smooth: f32,
    #[serde(default)]
    offset: [f32; 2],
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }
fn default_move_speed() -> f32 { 10.0 }     // one 3.2-unit cell in ~0.32s
fn default_jump_windup() -> u64 { 200 }
fn default_effect_lifetime() -> u64 { 400 }

fn default_cell_size() -> f32 { 3.2 }
fn default_actor_offset() -> [f32; 2] { [0.8, 1.3] }
fn default_effect_offset() -> [f32; 2] { [1.9, 1.9] }

fn default_smooth() -> f32 { 0.125 }

fn default_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_restart() -> Vec<String> { vec!["Y".into()] }
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            move_speed: default_move_speed(),
            jump_windup_ms: default_jump_windup(),
            effect_lifetime_ms: default_effect_lifetime(),
        }
    }
}

impl Default for TomlGrid {
    fn default() -> Self {
        TomlGrid {
            cell_size: default_cell_size(),
            actor_offset: default_actor_offset(),
            effect_offset: default_effect_offset(),
        }
    }
}

impl Default for TomlCamera {
    fn default() -> Self {
        TomlCamera { smooth: default_smooth(), offset: [0.0, 0.0] }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { levels_dir: default_levels_dir() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        // Resolve levels directory against the same search path
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig::from_toml(toml_cfg, levels_dir)
    }

    /// Parse a config document directly (no file search).
    #[cfg(test)]
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        let levels_dir = PathBuf::from(&cfg.general.levels_dir);
        Ok(GameConfig::from_toml(cfg, levels_dir))
    }

    fn from_toml(cfg: TomlConfig, levels_dir: PathBuf) -> Self {
        let mut speed = SpeedConfig {
            tick_rate_ms: cfg.speed.tick_rate_ms,
            move_speed: cfg.speed.move_speed,
            jump_windup_ms: cfg.speed.jump_windup_ms,
            effect_lifetime_ms: cfg.speed.effect_lifetime_ms,
        };
        if speed.tick_rate_ms == 0 {
            log::warn!("speed.tick_rate_ms must be positive, using {}", default_tick_rate());
            speed.tick_rate_ms = default_tick_rate();
        }
        if !positive(speed.move_speed) {
            log::warn!("speed.move_speed must be positive, using {}", default_move_speed());
            speed.move_speed = default_move_speed();
        }

        let mut cell_size = cfg.grid.cell_size;
        if !positive(cell_size) {
            log::warn!("grid.cell_size must be positive, using {}", default_cell_size());
            cell_size = default_cell_size();
        }

        let smooth = if cfg.camera.smooth.is_nan() {
            log::warn!("camera.smooth is not a number, using {}", default_smooth());
            default_smooth()
        } else {
            cfg.camera.smooth.clamp(0.0, 1.0)
        };

        GameConfig {
            speed,
            grid: CellMetrics {
                cell_size,
                actor_offset: inside_cell("grid.actor_offset", cfg.grid.actor_offset, cell_size),
                effect_offset: inside_cell("grid.effect_offset", cfg.grid.effect_offset, cell_size),
            },
            camera: CameraConfig {
                smooth,
                offset: pos(cfg.camera.offset.map(|v| if v.is_finite() { v } else { 0.0 })),
            },
            gamepad: GamepadConfig {
                confirm: cfg.gamepad.confirm,
                cancel: cfg.gamepad.cancel,
                restart: cfg.gamepad.restart,
            },
            levels_dir,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), PathBuf::from(default_levels_dir()))
    }
}

fn pos(v: [f32; 2]) -> WorldPos {
    WorldPos::new(v[0], v[1])
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable (symlinks resolved)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/tilestep)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/tilestep");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share/tilestep");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Rejects NaN and infinities as well as zero and negatives.
fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

/// Keep an anchor offset inside the cell so `world_to_cell` maps it back.
fn inside_cell(key: &str, raw: [f32; 2], cell_size: f32) -> WorldPos {
    let fixed = raw.map(|v| {
        if !v.is_finite() {
            0.0
        } else if v >= cell_size {
            // Largest value strictly below the cell edge
            f32::from_bits(cell_size.to_bits() - 1)
        } else {
            v.max(0.0)
        }
    });
    if fixed != raw {
        log::warn!("{key} {:?} lies outside the {cell_size} cell, using {:?}", raw, fixed);
    }
    pos(fixed)
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => {
                    log::info!("loaded {}", path.display());
                    return cfg;
                }
                Err(e) => {
                    log::warn!("{}: parse error, using default settings: {e}", path.display());
                    return TomlConfig::default();
                }
            },
            Err(e) => log::warn!("could not read {}: {e}", path.display()),
        }
    }
    TomlConfig::default()
}
