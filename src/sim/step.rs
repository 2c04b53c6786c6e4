/// The step function: advances the world by one fixed tick.
///
/// Processing order:
///   1. Mud bookkeeping (clear `freshly_unstuck` once off the stuck cell)
///   2. Input phase when idle-at-target with no active sequence,
///      otherwise interpolation toward the current target
///   3. Active sequence (slide resume / jump wind-up)
///   4. Sprite change detection
///
/// The input phase is the only place a directional step is resolved:
///   stuck?          → any direction breaks free, no movement
///   latch set?      → consume it, no movement
///   direction?      → effect engine on the destination, then commit
///
/// Cells reached by a slide or a jump landing are moved onto without
/// running their step effects. Only the cell entered by a directional
/// step is resolved by the effect engine.

use crate::domain::effect::{apply_step, Directive};
use crate::domain::grid::{Anchor, Cell, Direction, TileChange};
use crate::domain::status::PlayerStatus;
use crate::domain::tile::TileType;
use super::event::{FrameInput, GameEvent};
use super::motion::{plan_jump, Jump, Sequence, Slide, SlideStep};
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput, dt: f32) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    if world.paused || !matches!(world.phase, Phase::Playing | Phase::LevelComplete) {
        return events;
    }
    world.tick += 1;

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 { world.message.clear(); }
    }

    let here = world.player_cell();
    world.player.status.settle(here);

    let idle = world.player.is_idle(&world.grid);
    if idle && world.sequence.is_none() && world.phase == Phase::Playing {
        resolve_input(world, input.direction, &mut events);
    } else if !idle {
        let target = world.player.target_pos(&world.grid);
        world.player.pos = world.player.pos.move_towards(target, world.speed.move_speed * dt);
    }

    resolve_sequence(world, dt, &mut events);
    resolve_sprite(world, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Input phase
// ══════════════════════════════════════════════════════════════

fn resolve_input(world: &mut WorldState, direction: Option<Direction>, events: &mut Vec<GameEvent>) {
    let status = &mut world.player.status;

    if status.is_stuck {
        if direction.is_some() {
            status.break_free();
            log::debug!("broke free of mud at {:?}", status.last_stuck_cell);
            events.push(GameEvent::BrokeFree);
        }
        return;
    }

    // Blocked last time: this tick only acknowledges it
    if status.take_prevent_move() { return; }

    if let Some(dir) = direction {
        resolve_directional_step(world, dir, events);
    }
}

fn resolve_directional_step(world: &mut WorldState, dir: Direction, events: &mut Vec<GameEvent>) {
    world.player.status.last_input = dir;
    let dest = world.player.target.offset(dir);
    let tile = world.grid.get_tile(dest).copied();
    let before = world.player.status;

    let out = apply_step(tile.as_ref(), dest, &before, &world.grid);
    commit_changes(world, &out.changes, &out.explosions, events);
    report_status(&before, &out.status, tile.map(|t| t.kind()), dest, events);
    world.player.status = out.status;

    if out.is_cancelled() {
        log::debug!("move {:?} into {:?} blocked", dir, dest);
        events.push(GameEvent::Blocked { at: dest });
        return;
    }

    world.player.target = dest;
    world.player.last_tile = tile.map(|t| t.kind());
    events.push(GameEvent::Moved { to: dest });

    match out.directive {
        None => {}
        Some(Directive::Slide(direction)) => start_slide(world, dest, direction, events),
        Some(Directive::Jump { direction, max_distance }) => {
            start_jump(world, dest, direction, max_distance, events)
        }
        Some(Directive::LevelComplete { camera }) => {
            world.phase = Phase::LevelComplete;
            let msg = format!("{} complete! [Enter] next level", world.level_name);
            world.set_message(&msg, 0);
            events.push(GameEvent::LevelComplete { camera });
        }
    }
}

fn commit_changes(world: &mut WorldState, changes: &[TileChange], explosions: &[Cell], events: &mut Vec<GameEvent>) {
    world.grid.apply(changes);
    for c in changes {
        events.push(GameEvent::TileReplaced { cell: c.cell, from: c.from, to: c.to.kind() });
    }
    for &cell in explosions {
        let pos = world.grid.cell_to_world(cell, Anchor::Effect);
        events.push(GameEvent::Explosion { cell, pos });
    }
}

/// Translate a status transition into events for sound and HUD.
fn report_status(before: &PlayerStatus, after: &PlayerStatus, kind: Option<TileType>, cell: Cell, events: &mut Vec<GameEvent>) {
    if kind == Some(TileType::Electric) && before.is_wet() && !after.is_wet() {
        events.push(GameEvent::Shocked);
    }
    if !before.is_wet() && after.is_wet() {
        events.push(GameEvent::Soaked);
    }
    if !before.is_on_fire() && after.is_on_fire() {
        events.push(GameEvent::Ignited);
    }
    if before.is_on_fire() && !after.is_on_fire() {
        events.push(GameEvent::Extinguished);
    }
    if !before.is_stuck && after.is_stuck {
        events.push(GameEvent::Stuck { cell });
    }
}

// ══════════════════════════════════════════════════════════════
// Sequences
// ══════════════════════════════════════════════════════════════

fn start_slide(world: &mut WorldState, start: Cell, direction: Direction, events: &mut Vec<GameEvent>) {
    if world.sequence.is_some() {
        log::debug!("slide requested while a sequence is active; ignored");
        return;
    }
    world.sequence = Some(Sequence::Slide(Slide::new(start, direction)));
    events.push(GameEvent::SlideStarted { direction });
}

fn start_jump(world: &mut WorldState, start: Cell, direction: Direction, max_distance: u32, events: &mut Vec<GameEvent>) {
    if world.sequence.is_some() {
        log::debug!("jump requested while a sequence is active; ignored");
        return;
    }
    let landing = plan_jump(&world.grid, &world.player.status, start, direction, max_distance);
    log::debug!("jump from {:?} lands on {:?}", start, landing);
    world.sequence = Some(Sequence::Jump(Jump::new(landing, world.speed.jump_windup())));
    events.push(GameEvent::JumpStarted { landing });
}

fn resolve_sequence(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    let finished = match world.sequence.as_mut() {
        None => return,
        Some(Sequence::Slide(slide)) => {
            // Resume only once the previous cell is reached
            if !world.player.is_idle(&world.grid) { return; }
            match slide.advance(&world.grid, &world.player.status) {
                SlideStep::Advance(next) => {
                    world.player.target = next;
                    false
                }
                SlideStep::Finished => {
                    events.push(GameEvent::SlideStopped { at: slide.current });
                    true
                }
            }
        }
        Some(Sequence::Jump(jump)) => match jump.tick(dt) {
            Some(landing) => {
                world.player.target = landing;
                events.push(GameEvent::Landed { at: landing });
                true
            }
            None => false,
        },
    };

    if finished {
        world.sequence = None;
    }
}

// ══════════════════════════════════════════════════════════════
// Sprite
// ══════════════════════════════════════════════════════════════

fn resolve_sprite(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let sprite = world.player.status.sprite();
    if sprite != world.last_sprite {
        world.last_sprite = sprite;
        events.push(GameEvent::SpriteChanged(sprite));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpeedConfig;
    use crate::domain::fixtures::grid_from;
    use crate::sim::level::LevelDef;

    const DT: f32 = 0.016;

    fn world(rows: &[&str]) -> WorldState {
        let (grid, spawn) = grid_from(rows);
        let def = LevelDef { name: "test".into(), grid, spawn: spawn.expect("fixture has no P") };
        let mut w = WorldState::new(&def, SpeedConfig::default());
        w.load_level(&def, 0, 1);
        w
    }

    fn press(w: &mut WorldState, dir: Direction) -> Vec<GameEvent> {
        step(w, FrameInput { direction: Some(dir) }, DT)
    }

    /// Tick without input until the player is idle with no sequence.
    fn settle(w: &mut WorldState) -> Vec<GameEvent> {
        let mut events = vec![];
        for _ in 0..1000 {
            if w.player.is_idle(&w.grid) && w.sequence.is_none() {
                return events;
            }
            events.extend(step(w, FrameInput::default(), DT));
        }
        panic!("world never settled");
    }

    #[test]
    fn directional_step_moves_one_cell_then_interpolates() {
        let mut w = world(&["P.."]);
        let ev = press(&mut w, Direction::Right);
        assert!(ev.contains(&GameEvent::Moved { to: Cell::new(1, 0) }));
        assert_eq!(w.player.target, Cell::new(1, 0));
        assert!(!w.player.is_idle(&w.grid));

        settle(&mut w);
        assert_eq!(w.player.pos, w.grid.cell_to_world(Cell::new(1, 0), Anchor::Actor));
        assert_eq!(w.player.last_tile, Some(TileType::Normal));
    }

    #[test]
    fn input_is_ignored_while_interpolating() {
        let mut w = world(&["P..."]);
        press(&mut w, Direction::Right);
        press(&mut w, Direction::Right);
        assert_eq!(w.player.target, Cell::new(1, 0));
    }

    #[test]
    fn blocked_move_costs_one_acknowledgement_tick() {
        let mut w = world(&[".P#"]);
        let ev = press(&mut w, Direction::Right);
        assert!(ev.contains(&GameEvent::Blocked { at: Cell::new(2, 0) }));
        assert_eq!(w.player.target, Cell::new(1, 0));
        assert!(w.player.status.prevent_movement);

        // The next input only clears the latch
        press(&mut w, Direction::Left);
        assert_eq!(w.player.target, Cell::new(1, 0));
        assert!(!w.player.status.prevent_movement);

        press(&mut w, Direction::Left);
        assert_eq!(w.player.target, Cell::new(0, 0));
    }

    #[test]
    fn stepping_into_void_is_blocked() {
        let mut w = world(&["P"]);
        press(&mut w, Direction::Up);
        assert_eq!(w.player.target, Cell::new(0, 0));
        assert!(w.player.status.prevent_movement);
    }

    #[test]
    fn mud_cycle_through_the_resolver() {
        let mut w = world(&["PM."]);
        let ev = press(&mut w, Direction::Right);
        assert!(ev.contains(&GameEvent::Stuck { cell: Cell::new(1, 0) }));
        assert!(w.player.status.is_stuck);
        settle(&mut w);

        // One input frees the player without moving
        let ev = press(&mut w, Direction::Right);
        assert!(ev.contains(&GameEvent::BrokeFree));
        assert_eq!(w.player.target, Cell::new(1, 0));
        assert!(!w.player.status.is_stuck);
        assert!(w.player.status.freshly_unstuck);

        // Leaving the mud cell clears freshly_unstuck
        press(&mut w, Direction::Right);
        assert_eq!(w.player.target, Cell::new(2, 0));
        assert!(!w.player.status.freshly_unstuck);
    }

    #[test]
    fn bumping_a_wall_after_breaking_free_keeps_the_mud_memory() {
        let mut w = world(&["PM#"]);
        press(&mut w, Direction::Right);
        settle(&mut w);
        let ev = press(&mut w, Direction::Right);
        assert!(ev.contains(&GameEvent::BrokeFree));

        let ev = press(&mut w, Direction::Right);
        assert!(ev.contains(&GameEvent::Blocked { at: Cell::new(2, 0) }));
        assert_eq!(w.player_cell(), Cell::new(1, 0));
        assert!(w.player.status.freshly_unstuck);

        // Still on the mud cell, so the next ticks keep it too
        step(&mut w, FrameInput::default(), DT);
        assert!(w.player.status.freshly_unstuck);
        assert!(!w.player.status.is_stuck);
    }

    #[test]
    fn no_input_while_stuck_keeps_player_stuck() {
        let mut w = world(&["PM"]);
        press(&mut w, Direction::Right);
        settle(&mut w);
        step(&mut w, FrameInput::default(), DT);
        assert!(w.player.status.is_stuck);
    }

    #[test]
    fn slide_halts_on_last_ice_before_wall() {
        let mut w = world(&["PIII#"]);
        let ev = press(&mut w, Direction::Right);
        assert!(ev.contains(&GameEvent::SlideStarted { direction: Direction::Right }));
        assert!(w.sequence.is_some());

        let ev = settle(&mut w);
        assert_eq!(w.player.target, Cell::new(3, 0));
        assert!(ev.contains(&GameEvent::SlideStopped { at: Cell::new(3, 0) }));
        assert!(w.sequence.is_none());
    }

    #[test]
    fn input_is_ignored_during_slide() {
        let mut w = world(&["PIII."]);
        press(&mut w, Direction::Right);
        for _ in 0..5 {
            press(&mut w, Direction::Left);
        }
        settle(&mut w);
        assert_eq!(w.player.target, Cell::new(4, 0));
    }

    #[test]
    fn slide_exit_cell_has_no_step_effect() {
        let mut w = world(&["PIW."]);
        press(&mut w, Direction::Right);
        settle(&mut w);
        assert_eq!(w.player.target, Cell::new(2, 0));
        assert!(!w.player.status.is_wet());
    }

    #[test]
    fn burning_player_melts_ice_instead_of_sliding() {
        let mut w = world(&["PfI."]);
        press(&mut w, Direction::Right);
        settle(&mut w);
        let ev = press(&mut w, Direction::Right);
        assert!(w.sequence.is_none());
        assert!(ev.contains(&GameEvent::TileReplaced {
            cell: Cell::new(2, 0),
            from: TileType::Ice,
            to: TileType::Water,
        }));
        assert_eq!(w.grid.tile_type(Cell::new(2, 0)), Some(TileType::Water));
    }

    #[test]
    fn bounce_jumps_over_a_hole_after_windup() {
        let mut w = world(&["PBO."]);
        let ev = press(&mut w, Direction::Right);
        assert!(ev.contains(&GameEvent::JumpStarted { landing: Cell::new(3, 0) }));
        // Landing is not committed before the wind-up runs out
        step(&mut w, FrameInput::default(), DT);
        assert_eq!(w.player.target, Cell::new(1, 0));

        let ev = settle(&mut w);
        assert!(ev.contains(&GameEvent::Landed { at: Cell::new(3, 0) }));
        assert_eq!(w.player.target, Cell::new(3, 0));
    }

    #[test]
    fn bounce_toward_adjacent_wall_stays_on_bounce() {
        let mut w = world(&["PB#."]);
        press(&mut w, Direction::Right);
        settle(&mut w);
        assert_eq!(w.player.target, Cell::new(1, 0));
    }

    #[test]
    fn wet_player_burns_fire_down() {
        let mut w = world(&["PWF."]);
        let ev = press(&mut w, Direction::Right);
        assert!(ev.contains(&GameEvent::Soaked));
        settle(&mut w);

        let ev = press(&mut w, Direction::Right);
        assert!(ev.contains(&GameEvent::TileReplaced {
            cell: Cell::new(2, 0),
            from: TileType::Fire,
            to: TileType::FireSmall,
        }));
        assert_eq!(w.player.target, Cell::new(2, 0));
        assert_eq!(w.base_grid.tile_type(Cell::new(2, 0)), Some(TileType::Fire));
    }

    #[test]
    fn dry_player_is_stopped_by_fire() {
        let mut w = world(&["PF"]);
        let ev = press(&mut w, Direction::Right);
        assert!(ev.contains(&GameEvent::Blocked { at: Cell::new(1, 0) }));
        assert_eq!(w.grid.tile_type(Cell::new(1, 0)), Some(TileType::Fire));
    }

    #[test]
    fn wet_player_is_shocked_by_electric() {
        let mut w = world(&["PWE"]);
        press(&mut w, Direction::Right);
        settle(&mut w);
        let ev = press(&mut w, Direction::Right);
        assert!(ev.contains(&GameEvent::Shocked));
        assert!(ev.contains(&GameEvent::Blocked { at: Cell::new(2, 0) }));
        assert!(!w.player.status.is_wet());
    }

    #[test]
    fn gas_run_explodes_with_one_effect_per_cell() {
        let mut w = world(&["PfGGG"]);
        let ev = press(&mut w, Direction::Right);
        assert!(ev.contains(&GameEvent::Ignited));
        settle(&mut w);

        let ev = press(&mut w, Direction::Right);
        let blasts: Vec<_> = ev
            .iter()
            .filter_map(|e| match e {
                GameEvent::Explosion { cell, pos } => Some((*cell, *pos)),
                _ => None,
            })
            .collect();
        assert_eq!(blasts.len(), 3);
        for (cell, pos) in blasts {
            assert_eq!(pos, w.grid.cell_to_world(cell, Anchor::Effect));
        }
        for x in 2..5 {
            assert_eq!(w.grid.tile_type(Cell::new(x, 0)), Some(TileType::Normal));
        }
        assert_eq!(w.player.target, Cell::new(2, 0));
    }

    #[test]
    fn win_completes_level_and_freezes_input() {
        let mut w = world(&["PX."]);
        let ev = press(&mut w, Direction::Right);
        let camera = w.grid.cell_to_world(Cell::new(1, 0), Anchor::Actor);
        assert!(ev.contains(&GameEvent::LevelComplete { camera }));
        assert_eq!(w.phase, Phase::LevelComplete);

        // Still finishes the move onto the Win cell
        settle(&mut w);
        assert_eq!(w.player.pos, camera);
        press(&mut w, Direction::Right);
        assert_eq!(w.player.target, Cell::new(1, 0));
    }

    #[test]
    fn sprite_change_is_reported_once() {
        let mut w = world(&["P.W"]);
        let ev = press(&mut w, Direction::Right);
        let changes: Vec<_> = ev.iter().filter(|e| matches!(e, GameEvent::SpriteChanged(_))).collect();
        assert_eq!(changes.len(), 1);
        assert_eq!(w.last_sprite.name(), "def_right");

        let ev = settle(&mut w);
        assert!(!ev.iter().any(|e| matches!(e, GameEvent::SpriteChanged(_))));

        press(&mut w, Direction::Right);
        assert_eq!(w.last_sprite.name(), "wet_right");
    }

    #[test]
    fn paused_or_title_world_does_not_advance() {
        let mut w = world(&["P."]);
        w.paused = true;
        assert!(press(&mut w, Direction::Right).is_empty());
        assert_eq!(w.player.target, Cell::new(0, 0));

        w.paused = false;
        w.phase = Phase::Title;
        assert!(press(&mut w, Direction::Right).is_empty());
    }
}
