//! Presentation settings and preferences
//!
//! Persisted as JSON next to the best score. Nothing here changes what the
//! server simulates; it only shapes how much the client draws and plays.

use serde::{Deserialize, Serialize};

use crate::persistence::KeyValueStore;
use crate::renderer::SceneOptions;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Live effect cap for this preset
    pub fn max_effects(&self) -> usize {
        match self {
            QualityPreset::Low => 60,
            QualityPreset::Medium => 200,
            QualityPreset::High => 500,
        }
    }

    /// Confetti pieces per celebration
    pub fn confetti_count(&self) -> usize {
        match self {
            QualityPreset::Low => 30,
            QualityPreset::Medium => 80,
            QualityPreset::High => 150,
        }
    }
}

/// Presentation preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Effect density preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Explosions and confetti
    pub particles: bool,
    /// "+N" labels where food was eaten
    pub floating_scores: bool,
    /// Pulse foods that are about to expire
    pub food_pulse: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Accessibility ===
    /// Reduced motion (no pulsing, no confetti)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,

            particles: true,
            floating_scores: true,
            food_pulse: true,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "snake_presenter_settings";

    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective effect cap
    pub fn max_effects(&self) -> usize {
        self.quality.max_effects()
    }

    /// Confetti pieces per burst (0 when particles are off or motion is reduced)
    pub fn confetti_count(&self) -> usize {
        if !self.particles || self.reduced_motion {
            0
        } else {
            self.quality.confetti_count()
        }
    }

    /// Explosions are shown when particles are enabled
    pub fn explosions(&self) -> bool {
        self.particles
    }

    /// Effective food pulse (respects reduced_motion)
    pub fn effective_food_pulse(&self) -> bool {
        self.food_pulse && !self.reduced_motion
    }

    /// Effective volume (0 when muted)
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Scene knobs derived from these settings
    pub fn scene_options(&self) -> SceneOptions {
        SceneOptions {
            food_pulse: self.effective_food_pulse(),
            ..SceneOptions::default()
        }
    }

    /// Load from `store`; defaults when absent or unreadable
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    settings
                }
                Err(err) => {
                    log::warn!("Ignoring corrupt settings: {err}");
                    Self::default()
                }
            },
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(err) => {
                log::warn!("Could not read settings: {err}");
                Self::default()
            }
        }
    }

    /// Save to `store`, logging (not returning) failures
    pub fn save(&self, store: &mut dyn KeyValueStore) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("Could not encode settings: {err}");
                return;
            }
        };
        match store.set(Self::STORAGE_KEY, &json) {
            Ok(()) => log::info!("Settings saved"),
            Err(err) => log::warn!("Could not save settings: {err}"),
        }
    }
}
