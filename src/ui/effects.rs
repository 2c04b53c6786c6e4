/// Transient visual effects (explosion flashes).
///
/// Each spawned effect lives for a fixed number of milliseconds and then
/// removes itself on the next `tick`.

use crate::domain::grid::WorldPos;
use crate::sim::event::EffectSpawner;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Effect {
    pub pos: WorldPos,
    /// Milliseconds left on screen.
    pub remaining_ms: u64,
}

pub struct EffectLayer {
    effects: Vec<Effect>,
    lifetime_ms: u64,
}

impl EffectLayer {
    pub fn new(lifetime_ms: u64) -> Self {
        EffectLayer { effects: Vec::new(), lifetime_ms }
    }

    /// Age every effect by `elapsed_ms` and drop the expired ones.
    pub fn tick(&mut self, elapsed_ms: u64) {
        for e in &mut self.effects {
            e.remaining_ms = e.remaining_ms.saturating_sub(elapsed_ms);
        }
        self.effects.retain(|e| e.remaining_ms > 0);
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter()
    }

    /// 0.0 for a fresh effect, approaching 1.0 as it expires.
    pub fn progress(&self, effect: &Effect) -> f32 {
        if self.lifetime_ms == 0 {
            return 1.0;
        }
        1.0 - effect.remaining_ms as f32 / self.lifetime_ms as f32
    }
}

impl EffectSpawner for EffectLayer {
    fn spawn_effect(&mut self, pos: WorldPos) {
        self.effects.push(Effect { pos, remaining_ms: self.lifetime_ms });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_expire_after_their_lifetime() {
        let mut layer = EffectLayer::new(400);
        layer.spawn_effect(WorldPos::new(1.9, 1.9));
        layer.tick(160);
        layer.spawn_effect(WorldPos::new(5.1, 1.9));

        layer.tick(240);
        let left: Vec<_> = layer.iter().map(|e| e.pos).collect();
        assert_eq!(left, vec![WorldPos::new(5.1, 1.9)]);

        layer.tick(160);
        assert_eq!(layer.iter().count(), 0);
    }

    #[test]
    fn progress_runs_from_zero_to_one() {
        let mut layer = EffectLayer::new(400);
        layer.spawn_effect(WorldPos::default());
        let fresh = *layer.iter().next().unwrap();
        assert_eq!(layer.progress(&fresh), 0.0);
        layer.tick(100);
        let aged = *layer.iter().next().unwrap();
        assert!((layer.progress(&aged) - 0.25).abs() < 1e-6);
    }
}
