//! Client-only visual effects
//!
//! Every effect carries an immutable spawn time and duration. Anything that
//! changes over an effect's life (radius, fade, confetti position) is computed
//! from `now - spawned_at`, never accumulated per frame, so the result does
//! not depend on how often the render loop runs.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::consts::*;
use crate::renderer::palette::{self, Rgba};

/// Confetti piece shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfettiShape {
    Strip,
    Square,
    Circle,
}

/// Expanding fireball flash
#[derive(Debug, Clone, PartialEq)]
pub struct Explosion {
    /// Pixel center
    pub center: Vec2,
}

/// One confetti piece under constant gravity
#[derive(Debug, Clone, PartialEq)]
pub struct ConfettiParticle {
    pub origin: Vec2,
    /// Initial velocity (px/s)
    pub velocity: Vec2,
    /// Downward acceleration (px/s²)
    pub gravity: f32,
    pub rotation: f32,
    /// Angular velocity (rad/s)
    pub spin: f32,
    pub size: f32,
    pub color: Rgba,
    pub shape: ConfettiShape,
}

/// "+N" label that drifts up from where food was eaten
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingScore {
    pub anchor: Vec2,
    pub text: String,
    pub color: Rgba,
}

/// Effect variants
#[derive(Debug, Clone, PartialEq)]
pub enum EffectKind {
    Explosion(Explosion),
    Confetti(ConfettiParticle),
    FloatingScore(FloatingScore),
}

/// A live effect in the registry
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    spawned_at: f64,
    duration: f64,
    pub kind: EffectKind,
}

impl Effect {
    pub fn spawned_at(&self) -> f64 {
        self.spawned_at
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Milliseconds since spawn (never negative)
    pub fn age(&self, now: f64) -> f64 {
        (now - self.spawned_at).max(0.0)
    }

    /// Life progress in [0, 1]
    pub fn progress(&self, now: f64) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.age(now) / self.duration).clamp(0.0, 1.0) as f32
    }

    pub fn is_expired(&self, now: f64) -> bool {
        now - self.spawned_at >= self.duration
    }
}

/// Sampled explosion state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplosionSample {
    pub radius: f32,
    pub alpha: f32,
}

impl Explosion {
    pub fn sample(&self, progress: f32) -> ExplosionSample {
        ExplosionSample {
            radius: CELL_SIZE * EXPLOSION_RADIUS_CELLS * progress,
            alpha: 1.0 - progress,
        }
    }
}

impl ConfettiParticle {
    /// Closed-form ballistic position after `age_ms`
    pub fn position(&self, age_ms: f64) -> Vec2 {
        let t = (age_ms / 1000.0) as f32;
        self.origin + self.velocity * t + Vec2::new(0.0, 0.5 * self.gravity * t * t)
    }

    pub fn rotation_at(&self, age_ms: f64) -> f32 {
        self.rotation + self.spin * (age_ms / 1000.0) as f32
    }

    /// Opaque for most of its life, fading over the last 40%
    pub fn alpha(progress: f32) -> f32 {
        const FADE_FROM: f32 = 0.6;
        if progress <= FADE_FROM {
            1.0
        } else {
            (1.0 - (progress - FADE_FROM) / (1.0 - FADE_FROM)).max(0.0)
        }
    }
}

impl FloatingScore {
    pub fn position(&self, progress: f32) -> Vec2 {
        self.anchor - Vec2::new(0.0, FLOATING_SCORE_RISE * progress)
    }

    pub fn alpha(progress: f32) -> f32 {
        1.0 - progress
    }
}

/// Ordered collection of live effects (oldest first)
#[derive(Debug, Clone)]
pub struct EffectRegistry {
    effects: Vec<Effect>,
    capacity: usize,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new(crate::settings::QualityPreset::default().max_effects())
    }
}

impl EffectRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            effects: Vec::new(),
            capacity,
        }
    }

    /// Change the cap; excess oldest effects are evicted immediately
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        if self.effects.len() > capacity {
            let excess = self.effects.len() - capacity;
            self.effects.drain(..excess);
        }
    }

    /// Add an effect stamped with `now`
    pub fn spawn(&mut self, kind: EffectKind, duration: f64, now: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.effects.len() >= self.capacity {
            // Remove oldest to make room
            self.effects.remove(0);
        }
        self.effects.push(Effect {
            spawned_at: now,
            duration,
            kind,
        });
    }

    /// Remove every effect whose lifetime has elapsed at `now`
    pub fn prune(&mut self, now: f64) -> usize {
        let before = self.effects.len();
        self.effects.retain(|e| !e.is_expired(now));
        before - self.effects.len()
    }

    /// Live effects in spawn order
    pub fn all(&self) -> &[Effect] {
        &self.effects
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    // === Convenience spawners ===

    pub fn spawn_explosion(&mut self, center: Vec2, now: f64) {
        self.spawn(EffectKind::Explosion(Explosion { center }), EXPLOSION_MS, now);
    }

    pub fn spawn_floating_score(&mut self, anchor: Vec2, text: String, color: Rgba, now: f64) {
        self.spawn(
            EffectKind::FloatingScore(FloatingScore {
                anchor,
                text,
                color,
            }),
            FLOATING_SCORE_MS,
            now,
        );
    }

    /// Spawn a confetti burst fanning upward from `origin`
    pub fn spawn_confetti_burst(&mut self, rng: &mut Pcg32, origin: Vec2, count: usize, now: f64) {
        for _ in 0..count {
            let (particle, lifetime) = random_confetti(rng, origin);
            self.spawn(EffectKind::Confetti(particle), lifetime, now);
        }
    }
}

/// Roll one confetti piece and its lifetime
fn random_confetti(rng: &mut Pcg32, origin: Vec2) -> (ConfettiParticle, f64) {
    // Mostly upward, spread ±60°
    let angle = -std::f32::consts::FRAC_PI_2 + rng.random_range(-1.05f32..1.05);
    let speed = rng.random_range(250.0f32..550.0);
    let shape = match rng.random_range(0u8..3) {
        0 => ConfettiShape::Strip,
        1 => ConfettiShape::Square,
        _ => ConfettiShape::Circle,
    };
    let color = palette::CONFETTI[rng.random_range(0..palette::CONFETTI.len())];

    let particle = ConfettiParticle {
        origin: origin + Vec2::new(rng.random_range(-20.0f32..20.0), 0.0),
        velocity: Vec2::new(angle.cos(), angle.sin()) * speed,
        gravity: CONFETTI_GRAVITY,
        rotation: rng.random_range(0.0f32..std::f32::consts::TAU),
        spin: rng.random_range(-6.0f32..6.0),
        size: rng.random_range(3.0f32..7.0),
        color,
        shape,
    };
    let lifetime = rng.random_range(CONFETTI_MIN_MS..CONFETTI_MAX_MS);
    (particle, lifetime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    #[test]
    fn test_explosion_lifetime_boundaries() {
        let mut registry = EffectRegistry::new(16);
        registry.spawn_explosion(Vec2::new(100.0, 100.0), 1000.0);

        registry.prune(1000.0);
        assert_eq!(registry.len(), 1);
        registry.prune(1499.9);
        assert_eq!(registry.len(), 1);
        registry.prune(1500.0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_explosion_sample() {
        let exp = Explosion {
            center: Vec2::ZERO,
        };
        let start = exp.sample(0.0);
        assert_eq!(start.radius, 0.0);
        assert_eq!(start.alpha, 1.0);
        let mid = exp.sample(0.5);
        assert!((mid.radius - CELL_SIZE * 0.75).abs() < 1e-4);
        assert!((mid.alpha - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_spawn_order_is_oldest_first() {
        let mut registry = EffectRegistry::new(16);
        registry.spawn_explosion(Vec2::ZERO, 10.0);
        registry.spawn_floating_score(Vec2::ZERO, "+5".into(), palette::WHITE, 20.0);
        registry.spawn_explosion(Vec2::ONE, 30.0);

        let times: Vec<f64> = registry.all().iter().map(|e| e.spawned_at()).collect();
        assert_eq!(times, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut registry = EffectRegistry::new(2);
        registry.spawn_explosion(Vec2::ZERO, 1.0);
        registry.spawn_explosion(Vec2::ZERO, 2.0);
        registry.spawn_explosion(Vec2::ZERO, 3.0);
        let times: Vec<f64> = registry.all().iter().map(|e| e.spawned_at()).collect();
        assert_eq!(times, vec![2.0, 3.0]);

        registry.set_capacity(1);
        assert_eq!(registry.all()[0].spawned_at(), 3.0);

        registry.set_capacity(0);
        registry.spawn_explosion(Vec2::ZERO, 4.0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_confetti_position_is_reproducible() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut registry = EffectRegistry::new(64);
        registry.spawn_confetti_burst(&mut rng, Vec2::new(250.0, 400.0), 10, 0.0);
        assert_eq!(registry.len(), 10);

        for effect in registry.all() {
            let EffectKind::Confetti(p) = &effect.kind else {
                panic!("expected confetti");
            };
            let a = p.position(812.5);
            let b = p.position(812.5);
            assert_eq!(a, b);

            // Same numbers from the closed form
            let t = 0.8125f32;
            let expected = p.origin + p.velocity * t + Vec2::new(0.0, 0.5 * p.gravity * t * t);
            assert!((a - expected).length() < 1e-3);
            assert!(effect.duration() >= CONFETTI_MIN_MS && effect.duration() < CONFETTI_MAX_MS);
        }
    }

    #[test]
    fn test_confetti_burst_is_deterministic_per_seed() {
        let mut a = EffectRegistry::new(64);
        let mut b = EffectRegistry::new(64);
        a.spawn_confetti_burst(&mut Pcg32::seed_from_u64(99), Vec2::ZERO, 20, 5.0);
        b.spawn_confetti_burst(&mut Pcg32::seed_from_u64(99), Vec2::ZERO, 20, 5.0);
        assert_eq!(a.all(), b.all());
    }

    #[test]
    fn test_fades() {
        assert_eq!(ConfettiParticle::alpha(0.3), 1.0);
        assert!((ConfettiParticle::alpha(0.8) - 0.5).abs() < 1e-6);
        assert_eq!(ConfettiParticle::alpha(1.0), 0.0);
        assert_eq!(FloatingScore::alpha(0.25), 0.75);

        let label = FloatingScore {
            anchor: Vec2::new(10.0, 100.0),
            text: "+1".into(),
            color: palette::WHITE,
        };
        assert_eq!(label.position(0.5), Vec2::new(10.0, 100.0 - FLOATING_SCORE_RISE / 2.0));
    }

    proptest! {
        #[test]
        fn test_prune_is_time_pure(
            t0 in 0u32..10_000,
            mut probes in prop::collection::vec(0u32..1_000, 0..20),
            check in 0u32..1_000,
        ) {
            // Whole milliseconds keep the boundary arithmetic exact
            probes.sort_unstable();
            let t0 = t0 as f64;
            let check = check as f64;

            let mut registry = EffectRegistry::new(8);
            registry.spawn_explosion(Vec2::ZERO, t0);

            // Any number of earlier prunes inside the window leave it alive
            for offset in probes.iter().map(|o| *o as f64).filter(|o| *o < check) {
                registry.prune(t0 + offset);
            }
            registry.prune(t0 + check);

            let alive = !registry.is_empty();
            prop_assert_eq!(alive, check < EXPLOSION_MS);

            // Pruning again at the same instant changes nothing
            registry.prune(t0 + check);
            prop_assert_eq!(!registry.is_empty(), alive);
        }
    }
}
