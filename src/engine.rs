//! Presentation engine
//!
//! Owns every piece of client-side presentation state and exposes two entry
//! points that never block each other:
//!
//! - [`PresentationEngine::on_snapshot`] runs on network arrival: replace the
//!   snapshot, derive transitions, spawn effects, messages and cues.
//! - [`PresentationEngine::tick`] runs on the display cadence: prune expired
//!   effects, compose the frame for `now`, hand it to the surface.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::audio::{AudioFeedback, SoundCue};
use crate::best_score::BestScore;
use crate::commands::{self, ClientCommand, LastKnown};
use crate::consts::CELL_SIZE;
use crate::effects::EffectRegistry;
use crate::message::{MessageKind, MessageTimeline};
use crate::renderer::palette;
use crate::renderer::{DrawSurface, Frame, PresentationState, compose};
use crate::settings::Settings;
use crate::snapshot::{Snapshot, SnapshotBuffer};
use crate::transitions::{Baseline, TransitionEvent, detect};

/// Shown over the board when a run ends on a record
pub const RECORD_TEXT: &str = "🎊 AMAZING! NEW HIGH SCORE! 🎊";

/// Presentation state machine for one client
#[derive(Debug)]
pub struct PresentationEngine {
    snapshots: SnapshotBuffer,
    effects: EffectRegistry,
    timeline: MessageTimeline,
    best: BestScore,
    audio: AudioFeedback,
    settings: Settings,
    rng: Pcg32,
    /// The current run already celebrated beating the best score
    celebrated: bool,
}

impl PresentationEngine {
    pub fn new(settings: Settings, best: BestScore, mut audio: AudioFeedback, seed: u64) -> Self {
        audio.set_volume(settings.effective_volume());
        Self {
            snapshots: SnapshotBuffer::new(),
            effects: EffectRegistry::new(settings.max_effects()),
            timeline: MessageTimeline::new(),
            best,
            audio,
            settings,
            rng: Pcg32::seed_from_u64(seed),
            celebrated: false,
        }
    }

    // === Network path ===

    /// Decode a raw payload and apply it
    ///
    /// A payload that is not a JSON object is logged and ignored; the
    /// previous snapshot stays on screen.
    pub fn on_message(&mut self, raw: &str, now: f64) -> Vec<TransitionEvent> {
        match Snapshot::from_json(raw) {
            Ok(snapshot) => self.on_snapshot(snapshot, now),
            Err(err) => {
                log::warn!("Dropping update: {err}");
                Vec::new()
            }
        }
    }

    /// Apply one authoritative snapshot
    pub fn on_snapshot(&mut self, snapshot: Snapshot, now: f64) -> Vec<TransitionEvent> {
        let baseline = Baseline {
            best_score: self.best.get(),
            message_key: self.timeline.server_key().map(str::to_string),
        };
        self.snapshots.replace(snapshot);
        let events = match self.snapshots.latest() {
            Some(current) => detect(self.snapshots.previous(), current, &baseline),
            None => Vec::new(),
        };

        for event in &events {
            log::debug!("transition: {event:?}");
            self.audio.on_event(event);
            self.react(event, now);
        }

        self.snapshots.settle();
        events
    }

    /// The socket dropped; the next snapshot counts as the first one
    pub fn on_disconnect(&mut self) {
        log::info!("Disconnected; waiting for a fresh snapshot");
        self.snapshots = SnapshotBuffer::new();
        self.timeline.clear();
        self.timeline.release_server();
        self.effects.clear();
    }

    fn react(&mut self, event: &TransitionEvent, now: f64) {
        match event {
            TransitionEvent::Initialized => log::info!("First snapshot received"),
            TransitionEvent::GameStarted | TransitionEvent::GameRestarted => {
                self.celebrated = false;
                self.timeline.clear();
            }
            TransitionEvent::GameOverEntered => self.on_game_over(now),
            TransitionEvent::FoodEaten {
                count,
                food_type,
                points,
                at,
            } => {
                if let Some(at) = at.filter(|_| self.settings.floating_scores) {
                    let text = if *points > 0 {
                        format!("+{points}")
                    } else {
                        format!("+{count}")
                    };
                    let anchor = at.center() - Vec2::new(0.0, CELL_SIZE / 2.0);
                    self.effects.spawn_floating_score(
                        anchor,
                        text,
                        palette::food_color(*food_type),
                        now,
                    );
                }
            }
            TransitionEvent::AiStunned { at } => {
                if let Some(at) = at.filter(|_| self.settings.explosions()) {
                    self.effects.spawn_explosion(at.center(), now);
                }
            }
            TransitionEvent::NewHighScore {
                score,
                previous_best,
            } => {
                self.best.record(*score);
                let mid_run = self.snapshots.latest().is_some_and(Snapshot::is_active);
                // A first-ever score is not worth a fanfare
                if !self.celebrated && *previous_best > 0 && mid_run {
                    self.celebrated = true;
                    self.timeline
                        .show(format!("🏆 New best: {score}!"), MessageKind::Bonus, now);
                    self.audio.play(SoundCue::HighScore);
                }
            }
            TransitionEvent::ServerMessage { text } => {
                self.timeline.offer_server(text, now);
            }
            TransitionEvent::ServerMessageCleared => self.timeline.release_server(),
            TransitionEvent::AiRecovered
            | TransitionEvent::FireballLaunched { .. }
            | TransitionEvent::BoostStarted
            | TransitionEvent::BoostEnded
            | TransitionEvent::Paused
            | TransitionEvent::Resumed => {}
        }
    }

    fn on_game_over(&mut self, now: f64) {
        let Some(snap) = self.snapshots.latest() else {
            return;
        };
        let score = snap.score;
        let crash = snap.crash_point;
        let server_text = snap.message_text().to_string();

        if let Some(crash) = crash.filter(|_| self.settings.explosions()) {
            self.effects.spawn_explosion(crash.center(), now);
            self.audio.play(SoundCue::Explosion);
        }

        // Ties with the stored best count; this pass has not recorded yet
        if score > 0 && score >= self.best.get() {
            log::info!("Run ended on a record: {score}");
            self.timeline.show(RECORD_TEXT, MessageKind::Permanent, now);
            self.timeline.suppress_server(&server_text);

            let size = self.settings.scene_options().size();
            let origin = Vec2::new(size.x / 2.0, size.y / 3.0);
            let count = self.settings.confetti_count();
            self.effects
                .spawn_confetti_burst(&mut self.rng, origin, count, now);
            self.audio.play(SoundCue::Win);
        }
    }

    // === Render path ===

    /// One render tick: prune, compose, present
    pub fn tick(&mut self, now: f64, surface: &mut dyn DrawSurface) {
        let pruned = self.effects.prune(now);
        if pruned > 0 {
            log::trace!("pruned {pruned} effects");
        }
        let frame = self.compose(now);
        surface.present(&frame);
    }

    /// The frame for `now` without mutating anything
    pub fn compose(&self, now: f64) -> Frame {
        let state = PresentationState {
            snapshot: self.snapshots.latest(),
            effects: self.effects.all(),
            message: self.timeline.current(now),
        };
        compose(&state, now, &self.settings.scene_options())
    }

    // === Accessors ===

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.latest()
    }

    pub fn effects(&self) -> &EffectRegistry {
        &self.effects
    }

    pub fn timeline(&self) -> &MessageTimeline {
        &self.timeline
    }

    pub fn best_score(&self) -> u64 {
        self.best.get()
    }

    /// False once a failed write left the best score in memory only
    pub fn best_is_persisted(&self) -> bool {
        !self.best.is_memory_only()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Swap settings; caps and volume apply immediately
    pub fn set_settings(&mut self, settings: Settings) {
        self.effects.set_capacity(settings.max_effects());
        self.audio.set_volume(settings.effective_volume());
        self.settings = settings;
    }

    /// Flip sound on or off; returns the new muted flag
    pub fn toggle_mute(&mut self) -> bool {
        let mut settings = self.settings.clone();
        settings.muted = !settings.muted;
        log::info!("Sound {}", if settings.muted { "off" } else { "on" });
        self.set_settings(settings);
        self.settings.muted
    }

    /// Flags from the latest snapshot (all false before the first one)
    pub fn last_known(&self) -> LastKnown {
        self.snapshots
            .latest()
            .map(LastKnown::from)
            .unwrap_or_default()
    }

    pub fn available_commands(&self) -> Vec<ClientCommand> {
        commands::available(&self.last_known())
    }

    /// What a tap on the board means right now (nothing before the first snapshot)
    pub fn overlay_action(&self) -> Option<ClientCommand> {
        commands::overlay_action(self.snapshots.latest().map(LastKnown::from).as_ref())
    }
}
