/// Smoothing camera.
///
/// Follows the player (plus a configured offset) by lerping a fixed
/// fraction of the remaining distance every tick. The Win tile switches
/// it to a static position through `CameraControl::disable_follow`;
/// loading a level switches following back on.

use crate::config::CameraConfig;
use crate::domain::grid::WorldPos;
use crate::sim::event::CameraControl;

#[derive(Clone, Debug, PartialEq)]
pub struct CameraFollow {
    pub pos: WorldPos,
    following: bool,
    fixed: WorldPos,
    smooth: f32,
    offset: WorldPos,
}

impl CameraFollow {
    pub fn new(cfg: &CameraConfig) -> Self {
        CameraFollow {
            pos: WorldPos::default(),
            following: true,
            fixed: WorldPos::default(),
            smooth: cfg.smooth,
            offset: cfg.offset,
        }
    }

    #[cfg(test)]
    pub fn is_following(&self) -> bool {
        self.following
    }

    /// Jump straight onto the player, e.g. on level load.
    pub fn snap_to(&mut self, player: WorldPos) {
        self.pos = self.goal(player);
    }

    /// Advance one tick toward the current goal.
    pub fn update(&mut self, player: WorldPos) {
        let goal = self.goal(player);
        self.pos = self.pos.lerp(goal, self.smooth);
    }

    fn goal(&self, player: WorldPos) -> WorldPos {
        if self.following {
            WorldPos::new(player.x + self.offset.x, player.y + self.offset.y)
        } else {
            self.fixed
        }
    }
}

impl CameraControl for CameraFollow {
    fn disable_follow(&mut self, pos: WorldPos) {
        log::debug!("camera fixed at {:?}", pos);
        self.following = false;
        self.fixed = pos;
    }

    fn enable_follow(&mut self) {
        self.following = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> CameraFollow {
        CameraFollow::new(&CameraConfig { smooth: 0.5, offset: WorldPos::new(0.0, 1.0) })
    }

    #[test]
    fn follow_closes_a_fixed_fraction_each_tick() {
        let mut cam = camera();
        let player = WorldPos::new(8.0, 3.0);
        cam.update(player);
        assert_eq!(cam.pos, WorldPos::new(4.0, 2.0));
        cam.update(player);
        assert_eq!(cam.pos, WorldPos::new(6.0, 3.0));
    }

    #[test]
    fn disabled_follow_heads_for_the_fixed_position() {
        let mut cam = camera();
        cam.snap_to(WorldPos::new(2.0, 2.0));
        assert_eq!(cam.pos, WorldPos::new(2.0, 3.0));

        cam.disable_follow(WorldPos::new(10.0, 3.0));
        assert!(!cam.is_following());
        // The player keeps moving but the camera ignores it
        cam.update(WorldPos::new(-50.0, -50.0));
        assert_eq!(cam.pos, WorldPos::new(6.0, 3.0));

        cam.enable_follow();
        cam.update(WorldPos::new(6.0, 2.0));
        assert_eq!(cam.pos, WorldPos::new(6.0, 3.0));
    }
}
