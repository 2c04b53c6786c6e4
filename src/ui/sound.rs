/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All cues are synthesized into in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

use crate::sim::event::GameEvent;

/// Every sound the game can make.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Cue {
    Soaked,
    Ignited,
    Shocked,
    Explosion,
    Bounce,
    Blocked,
    LevelComplete,
}

impl Cue {
    #[cfg_attr(not(feature = "sound"), allow(dead_code))]
    const ALL: [Cue; 7] = [
        Cue::Soaked,
        Cue::Ignited,
        Cue::Shocked,
        Cue::Explosion,
        Cue::Bounce,
        Cue::Blocked,
        Cue::LevelComplete,
    ];

    pub fn for_event(ev: &GameEvent) -> Option<Cue> {
        match ev {
            GameEvent::Soaked => Some(Cue::Soaked),
            GameEvent::Ignited => Some(Cue::Ignited),
            GameEvent::Shocked => Some(Cue::Shocked),
            GameEvent::Explosion { .. } => Some(Cue::Explosion),
            GameEvent::JumpStarted { .. } => Some(Cue::Bounce),
            GameEvent::Blocked { .. } => Some(Cue::Blocked),
            GameEvent::LevelComplete { .. } => Some(Cue::LevelComplete),
            _ => None,
        }
    }

    /// Cues for one tick's events. A chain explosion plays one blast.
    pub fn for_events(events: &[GameEvent]) -> Vec<Cue> {
        let mut cues: Vec<Cue> = Vec::new();
        for cue in events.iter().filter_map(Cue::for_event) {
            if !cues.contains(&cue) {
                cues.push(cue);
            }
        }
        cues
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{synth, Cue};

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: HashMap<Cue, Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output: {e}");
                    return None;
                }
            };
            let buffers = Cue::ALL
                .iter()
                .map(|&c| (c, Arc::new(synth::make_wav(&synth::render(c)))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, cue: Cue) {
            let buf = match self.buffers.get(&cue) {
                Some(b) => b,
                None => return,
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Synthesis — mono f32 samples, wrapped into 16-bit PCM WAV
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
mod synth {
    use std::f32::consts::TAU;

    use super::Cue;

    pub const SAMPLE_RATE: u32 = 22050;

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Sequence of notes; each note is the sum of `harmonics` (multiple, weight).
    fn notes(seq: &[(f32, f32)], harmonics: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut out = Vec::new();
        for &(freq, dur) in seq {
            let n = samples_for(dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave: f32 = harmonics
                    .iter()
                    .map(|&(mult, w)| (t * freq * mult * TAU).sin() * w)
                    .sum();
                out.push(wave * env * volume);
            }
        }
        out
    }

    /// Pitch sweep from `from` to `to` Hz mixed with LCG noise.
    fn sweep(from: f32, to: f32, duration: f32, noise: f32, volume: f32) -> Vec<f32> {
        let n = samples_for(duration);
        let mut rng: u32 = 12345;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = from + (to - from) * t;
                phase += freq / SAMPLE_RATE as f32;
                let tone = (phase * TAU).sin();
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let hiss = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - t).powf(0.8);
                (tone * (1.0 - noise) + hiss * noise) * env * volume
            })
            .collect()
    }

    pub fn render(cue: Cue) -> Vec<f32> {
        const PURE: &[(f32, f32)] = &[(1.0, 1.0)];
        const BRIGHT: &[(f32, f32)] = &[(1.0, 0.6), (2.0, 0.3), (3.0, 0.1)];
        match cue {
            Cue::Soaked => sweep(900.0, 300.0, 0.18, 0.15, 0.25),
            Cue::Ignited => sweep(200.0, 700.0, 0.15, 0.5, 0.25),
            Cue::Shocked => sweep(1200.0, 1100.0, 0.2, 0.7, 0.3),
            Cue::Explosion => sweep(180.0, 40.0, 0.35, 0.85, 0.4),
            Cue::Bounce => sweep(250.0, 900.0, 0.12, 0.0, 0.25),
            Cue::Blocked => notes(&[(140.0, 0.06)], PURE, 0.3),
            Cue::LevelComplete => notes(
                &[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.3)],
                BRIGHT,
                0.3,
            ),
        }
    }

    pub fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _cue: Cue) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::{Cell, WorldPos};

    #[test]
    fn chain_explosion_plays_one_blast() {
        let blast = |x| GameEvent::Explosion { cell: Cell::new(x, 0), pos: WorldPos::default() };
        let events = vec![blast(0), GameEvent::Moved { to: Cell::new(1, 0) }, blast(1), blast(2)];
        assert_eq!(Cue::for_events(&events), vec![Cue::Explosion]);
    }

    #[test]
    fn quiet_events_have_no_cue() {
        assert_eq!(Cue::for_event(&GameEvent::BrokeFree), None);
        assert_eq!(Cue::for_event(&GameEvent::JumpStarted { landing: Cell::new(0, 0) }), Some(Cue::Bounce));
    }

    #[test]
    fn every_cue_renders_a_valid_wav() {
        for cue in Cue::ALL {
            let samples = synth::render(cue);
            assert!(!samples.is_empty(), "{:?}", cue);
            assert!(samples.iter().all(|s| s.is_finite()));
            let wav = synth::make_wav(&samples);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + samples.len() * 2);
        }
    }
}
