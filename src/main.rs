/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use sim::event::{dispatch, CameraControl, FrameInput, SpriteSink};
use sim::level::{load_levels, LevelDef};
use sim::step;
use sim::world::{Phase, WorldState};
use ui::camera::CameraFollow;
use ui::effects::EffectLayer;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{Cue, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Everything the loop draws or plays besides the world itself.
struct Presentation {
    renderer: Renderer,
    camera: CameraFollow,
    effects: EffectLayer,
    sound: Option<SoundEngine>,
}

fn main() {
    init_logging();

    let config = GameConfig::load();
    let levels = match load_levels(&config) {
        Ok(levels) => levels,
        Err(e) => {
            log::error!("level load failed: {e}");
            eprintln!("Could not load levels: {e}");
            std::process::exit(1);
        }
    };
    // load_levels never returns an empty list on success
    let Some(first) = levels.first() else {
        eprintln!("No levels found.");
        std::process::exit(1);
    };

    let mut world = WorldState::new(first, config.speed.clone());
    world.total_levels = levels.len();

    let mut pres = Presentation {
        renderer: Renderer::new(world.last_sprite),
        camera: CameraFollow::new(&config.camera),
        effects: EffectLayer::new(config.speed.effect_lifetime_ms),
        sound: None,
    };

    if let Err(e) = pres.renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    pres.sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut pres, &levels, &config);

    if let Err(e) = pres.renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game loop aborted: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Tilestep!");
    println!("Levels cleared: {}/{}", levels_cleared(&world), world.total_levels);
}

/// The terminal belongs to the game, so logs go to a file.
/// `RUST_LOG` picks the level, `TILESTEP_LOG` the path.
fn init_logging() {
    let path = std::env::var_os("TILESTEP_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("tilestep.log"));
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match File::create(&path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            // No writable log file: stay silent rather than draw over the game
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    // A second init (tests, embedding) is harmless
    let _ = builder.try_init();
}

fn levels_cleared(world: &WorldState) -> usize {
    match world.phase {
        Phase::Title => 0,
        Phase::Playing => world.current_level,
        Phase::LevelComplete => world.current_level + 1,
        Phase::GameComplete => world.total_levels,
    }
}

fn game_loop(
    world: &mut WorldState,
    pres: &mut Presentation,
    levels: &[LevelDef],
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.enable_release_events();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let result = run_loop(world, pres, levels, config, &mut kb, &mut gp);
    kb.disable_release_events();
    result
}

fn run_loop(
    world: &mut WorldState,
    pres: &mut Presentation,
    levels: &[LevelDef],
    config: &GameConfig,
    kb: &mut InputState,
    gp: &mut GamepadState,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);

    // Directions pressed between ticks are held for the next one
    let mut pending_dir = None;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, pres, levels, kb, gp) {
            break;
        }

        if world.phase == Phase::Playing && !world.paused {
            if let Some(dir) = kb.direction().or_else(|| gp.direction()) {
                pending_dir = Some(dir);
            }
        } else {
            pending_dir = None;
        }

        if last_tick.elapsed() >= tick_rate {
            let input = FrameInput { direction: pending_dir.take() };
            let events = step::step(world, input, config.speed.dt());
            for ev in &events {
                log::trace!("tick {}: {:?}", world.tick, ev);
            }

            dispatch(&events, &mut pres.camera, &mut pres.effects, &mut pres.renderer);
            if let Some(sfx) = &pres.sound {
                for cue in Cue::for_events(&events) {
                    sfx.play(cue);
                }
            }

            if !world.paused {
                pres.camera.update(world.player.pos);
                pres.effects.tick(config.speed.tick_rate_ms);
            }

            last_tick = Instant::now();
        }

        pres.renderer.render(world, &pres.camera, &pres.effects)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::F(1), KeyCode::Char('p'), KeyCode::Char('P')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::F(2), KeyCode::Char('r'), KeyCode::Char('R')];

/// Load `index` into the world and reset the presentation around it.
fn enter_level(world: &mut WorldState, pres: &mut Presentation, levels: &[LevelDef], index: usize) {
    world.load_level(&levels[index], index, levels.len());
    reset_presentation(world, pres);
}

fn reset_presentation(world: &WorldState, pres: &mut Presentation) {
    pres.camera.enable_follow();
    pres.camera.snap_to(world.player.pos);
    pres.effects.clear();
    pres.renderer.show_sprite(world.last_sprite);
}

/// Handle keys that act outside the simulation. Returns true to quit.
fn handle_meta(
    world: &mut WorldState,
    pres: &mut Presentation,
    levels: &[LevelDef],
    kb: &InputState,
    gp: &GamepadState,
) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let quit = kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed();

    if quit {
        return true;
    }

    match world.phase {
        Phase::Title => {
            if confirm {
                enter_level(world, pres, levels, 0);
            }
        }
        Phase::Playing => {
            if kb.any_pressed(KEYS_PAUSE) {
                world.paused = !world.paused;
                log::debug!("paused: {}", world.paused);
                return false;
            }
            // Restart also resumes a paused level
            if kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
                world.restart_level();
                reset_presentation(world, pres);
                world.set_message("Level Restarted", 30);
            }
        }
        Phase::LevelComplete => {
            if confirm {
                let next = world.current_level + 1;
                if next < levels.len() {
                    enter_level(world, pres, levels, next);
                } else {
                    log::info!("all {} levels complete", levels.len());
                    world.phase = Phase::GameComplete;
                    world.message.clear();
                    world.message_timer = 0;
                }
            } else if kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
                world.restart_level();
                reset_presentation(world, pres);
            }
        }
        Phase::GameComplete => {
            if confirm {
                return true;
            }
        }
    }

    false
}
