//! Audio feedback
//!
//! Procedurally generated sound cues - no external files needed. Each cue is
//! a small recipe of oscillator tones; the browser player schedules them
//! through Web Audio, everything else just drops or records them. Playing a
//! cue never touches engine state and never fails loudly.

use crate::transitions::TransitionEvent;

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Food eaten; pitch rises with food type
    Eat { food_type: u8 },
    /// Snake crashed
    Crash,
    /// Game over on a new record
    Win,
    /// Best score beaten mid-run
    HighScore,
    /// Boost kicked in
    Boost,
    /// Round started
    Start,
    /// Cannon shot
    Fire,
    Explosion,
    /// Opponent hit
    AiStun,
}

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One scheduled oscillator note (times in seconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub freq: f32,
    pub waveform: Waveform,
    pub duration: f32,
    /// Peak gain before the master volume is applied
    pub volume: f32,
    /// Offset from the moment the cue is played
    pub delay: f32,
    /// Exponential pitch sweep target, reached at the end of the note
    pub sweep_to: Option<f32>,
}

impl Tone {
    const fn new(freq: f32, waveform: Waveform, duration: f32, volume: f32) -> Self {
        Self {
            freq,
            waveform,
            duration,
            volume,
            delay: 0.0,
            sweep_to: None,
        }
    }

    const fn after(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    const fn sweep(mut self, to: f32) -> Self {
        self.sweep_to = Some(to);
        self
    }

    /// When the note has finished
    pub fn end(&self) -> f32 {
        self.delay + self.duration
    }
}

/// Eat pitches by food type (A4, C#5, E5, A5)
const EAT_PITCHES: [f32; 4] = [440.0, 554.0, 659.0, 880.0];
/// Win arpeggio (C5, E5, G5, C6)
const WIN_ARPEGGIO: [f32; 4] = [523.25, 659.25, 783.99, 1046.5];

/// Tone recipe for a cue
pub fn tones(cue: SoundCue) -> Vec<Tone> {
    use Waveform::*;

    match cue {
        SoundCue::Eat { food_type } => {
            let f = EAT_PITCHES
                .get(food_type as usize)
                .copied()
                .unwrap_or(EAT_PITCHES[0]);
            vec![
                Tone::new(f, Triangle, 0.3, 0.15),
                // Echo a fifth up
                Tone::new(f * 1.5, Triangle, 0.2, 0.1).after(0.05),
            ]
        }
        SoundCue::Crash => vec![
            Tone::new(100.0, Sawtooth, 0.5, 0.2),
            Tone::new(50.0, Square, 0.8, 0.1),
        ],
        SoundCue::Win => WIN_ARPEGGIO
            .iter()
            .enumerate()
            .map(|(i, f)| Tone::new(*f, Triangle, 0.5, 0.1).after(i as f32 * 0.1))
            .collect(),
        SoundCue::HighScore => vec![
            Tone::new(WIN_ARPEGGIO[2], Triangle, 0.2, 0.1),
            Tone::new(WIN_ARPEGGIO[3], Triangle, 0.3, 0.1).after(0.08),
        ],
        SoundCue::Boost => vec![Tone::new(200.0, Sine, 0.1, 0.03)],
        SoundCue::Start => vec![Tone::new(150.0, Sine, 0.1, 0.05)],
        SoundCue::Fire => vec![
            Tone::new(150.0, Square, 0.2, 0.2),
            Tone::new(80.0, Sine, 0.5, 0.15).after(0.03),
        ],
        SoundCue::Explosion => vec![
            Tone::new(100.0, Sawtooth, 0.3, 0.2),
            Tone::new(60.0, Square, 0.4, 0.1),
            Tone::new(1000.0, Triangle, 0.15, 0.1).sweep(10.0),
        ],
        SoundCue::AiStun => vec![
            Tone::new(1200.0, Sine, 0.1, 0.1),
            Tone::new(800.0, Sine, 0.15, 0.05).after(0.05),
            Tone::new(120.0, Square, 0.5, 0.1),
        ],
    }
}

/// Cue for a transition, if it has one
///
/// New highs are left to the engine, which knows whether the run already
/// celebrated.
pub fn cue_for(event: &TransitionEvent) -> Option<SoundCue> {
    match event {
        TransitionEvent::GameStarted | TransitionEvent::GameRestarted => Some(SoundCue::Start),
        TransitionEvent::GameOverEntered => Some(SoundCue::Crash),
        TransitionEvent::FoodEaten { food_type, .. } => Some(SoundCue::Eat {
            food_type: *food_type,
        }),
        TransitionEvent::AiStunned { .. } => Some(SoundCue::AiStun),
        TransitionEvent::FireballLaunched { .. } => Some(SoundCue::Fire),
        TransitionEvent::BoostStarted => Some(SoundCue::Boost),
        TransitionEvent::Initialized
        | TransitionEvent::AiRecovered
        | TransitionEvent::BoostEnded
        | TransitionEvent::Paused
        | TransitionEvent::Resumed
        | TransitionEvent::NewHighScore { .. }
        | TransitionEvent::ServerMessage { .. }
        | TransitionEvent::ServerMessageCleared => None,
    }
}

/// Something that can play cues, fire-and-forget
pub trait CuePlayer {
    fn play(&mut self, cue: SoundCue);

    /// Output volume (0.0 - 1.0); 0 silences
    fn set_volume(&mut self, _volume: f32) {}
}

/// Player with no device (native builds, audio unavailable)
#[derive(Debug, Default)]
pub struct SilentPlayer;

impl CuePlayer for SilentPlayer {
    fn play(&mut self, cue: SoundCue) {
        log::trace!("cue {cue:?} (silent)");
    }
}

/// Player that keeps every cue it was asked to play
#[derive(Debug, Default, Clone)]
pub struct RecordingPlayer {
    cues: std::rc::Rc<std::cell::RefCell<Vec<SoundCue>>>,
}

impl RecordingPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cues played so far (shared with every clone)
    pub fn cues(&self) -> Vec<SoundCue> {
        self.cues.borrow().clone()
    }
}

impl CuePlayer for RecordingPlayer {
    fn play(&mut self, cue: SoundCue) {
        self.cues.borrow_mut().push(cue);
    }
}

/// Maps transitions to cues and forwards them to a player
pub struct AudioFeedback {
    player: Box<dyn CuePlayer>,
}

impl AudioFeedback {
    pub fn new(player: Box<dyn CuePlayer>) -> Self {
        Self { player }
    }

    pub fn silent() -> Self {
        Self::new(Box::new(SilentPlayer))
    }

    pub fn on_event(&mut self, event: &TransitionEvent) {
        if let Some(cue) = cue_for(event) {
            self.player.play(cue);
        }
    }

    /// Play a cue that does not come from a single transition
    pub fn play(&mut self, cue: SoundCue) {
        self.player.play(cue);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.player.set_volume(volume.clamp(0.0, 1.0));
    }
}

impl std::fmt::Debug for AudioFeedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AudioFeedback")
    }
}

// === Web Audio player ===

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use super::{CuePlayer, SoundCue, Tone, Waveform, tones};
    use web_sys::{AudioContext, AudioContextState, GainNode, OscillatorNode, OscillatorType};

    /// Web Audio cue player
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        volume: f32,
    }

    impl AudioManager {
        pub fn new(volume: f32) -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                volume: volume.clamp(0.0, 1.0),
            }
        }

        /// Create an oscillator with gain node wired to the output
        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            waveform: Waveform,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(match waveform {
                Waveform::Sine => OscillatorType::Sine,
                Waveform::Square => OscillatorType::Square,
                Waveform::Sawtooth => OscillatorType::Sawtooth,
                Waveform::Triangle => OscillatorType::Triangle,
            });
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        fn schedule(&self, ctx: &AudioContext, tone: &Tone, now: f64) {
            let Some((osc, gain)) = Self::create_osc(ctx, tone.freq, tone.waveform) else {
                return;
            };
            let start = now + tone.delay as f64;
            let end = start + tone.duration as f64;

            gain.gain()
                .set_value_at_time(tone.volume * self.volume, start)
                .ok();
            gain.gain().exponential_ramp_to_value_at_time(0.0001, end).ok();
            osc.frequency().set_value_at_time(tone.freq, start).ok();
            if let Some(to) = tone.sweep_to {
                osc.frequency().exponential_ramp_to_value_at_time(to, end).ok();
            }

            osc.start_with_when(start).ok();
            osc.stop_with_when(end).ok();
        }
    }

    impl CuePlayer for AudioManager {
        fn play(&mut self, cue: SoundCue) {
            if self.volume <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            // Browsers keep the context suspended until a user gesture
            if ctx.state() == AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let now = ctx.current_time();
            for tone in tones(cue) {
                self.schedule(ctx, &tone, now);
            }
        }

        fn set_volume(&mut self, volume: f32) {
            self.volume = volume;
        }
    }
}
