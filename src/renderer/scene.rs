//! Scene composition
//!
//! `compose` is pure: the same state and `now` always give the same frame.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;

use super::palette::{self, Rgba, fade};
use super::{DrawCmd, Frame, Glow, Label, Layer};
use crate::consts::*;
use crate::effects::{ConfettiParticle, ConfettiShape, Effect, EffectKind, FloatingScore};
use crate::message::{MessageFrame, MessageKind};
use crate::snapshot::{Food, GridPoint, Snapshot};
use crate::cell_origin;

/// Everything a frame is drawn from
#[derive(Debug, Clone)]
pub struct PresentationState<'a> {
    pub snapshot: Option<&'a Snapshot>,
    pub effects: &'a [Effect],
    pub message: Option<MessageFrame<'a>>,
}

/// Layout and accessibility knobs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneOptions {
    pub cols: i32,
    pub rows: i32,
    /// Pulse expiring foods (off under reduced motion)
    pub food_pulse: bool,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            cols: BOARD_COLS,
            rows: BOARD_ROWS,
            food_pulse: true,
        }
    }
}

impl SceneOptions {
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.cols as f32, self.rows as f32) * CELL_SIZE
    }
}

/// Waiting text shown before the first snapshot
pub const PLACEHOLDER_TEXT: &str = "Connecting to server...";

/// Build the frame for `now`
pub fn compose(state: &PresentationState, now: f64, opts: &SceneOptions) -> Frame {
    let Some(snap) = state.snapshot else {
        return placeholder(opts);
    };

    let mut frame = Frame::new();
    frame.push(
        Layer::Background,
        DrawCmd::Clear {
            color: palette::BACKGROUND,
        },
    );
    draw_boundary(&mut frame, opts);
    draw_obstacles(&mut frame, snap);
    draw_foods(&mut frame, snap, now, opts);
    draw_food_rings(&mut frame, snap);
    draw_player(&mut frame, &snap.snake);
    draw_opponent(&mut frame, &snap.ai_snake, snap.ai_stunned);
    draw_fireballs(&mut frame, snap);
    for effect in state.effects {
        draw_effect(&mut frame, effect, now);
    }
    if snap.game_over {
        if let Some(crash) = snap.crash_point {
            frame.push(
                Layer::CrashMarker,
                DrawCmd::Text {
                    center: crash.center(),
                    text: palette::CRASH_GLYPH.to_string(),
                    font_px: CELL_SIZE,
                    color: palette::WHITE,
                },
            );
        }
    }
    if let Some(message) = &state.message {
        frame.push(Layer::Message, DrawCmd::Label(message_label(message, opts)));
    }
    frame
}

fn placeholder(opts: &SceneOptions) -> Frame {
    let mut frame = Frame::placeholder();
    frame.push(
        Layer::Background,
        DrawCmd::Clear {
            color: palette::BACKGROUND,
        },
    );
    frame.push(
        Layer::Message,
        DrawCmd::Text {
            center: opts.size() / 2.0,
            text: PLACEHOLDER_TEXT.to_string(),
            font_px: 20.0,
            color: palette::WHITE,
        },
    );
    frame
}

/// Inset cell square, as the board draws every occupied cell
fn cell(p: GridPoint, color: Rgba, glow: Option<Glow>) -> DrawCmd {
    DrawCmd::Rect {
        pos: cell_origin(p.x, p.y) + Vec2::ONE,
        size: Vec2::splat(CELL_SIZE - 2.0),
        color,
        glow,
    }
}

fn draw_boundary(frame: &mut Frame, opts: &SceneOptions) {
    let (w, h) = (opts.cols, opts.rows);
    for x in 0..w {
        frame.push(Layer::Boundary, cell(GridPoint::new(x, 0), palette::WALL, None));
        frame.push(Layer::Boundary, cell(GridPoint::new(x, h - 1), palette::WALL, None));
    }
    for y in 1..h - 1 {
        frame.push(Layer::Boundary, cell(GridPoint::new(0, y), palette::WALL, None));
        frame.push(Layer::Boundary, cell(GridPoint::new(w - 1, y), palette::WALL, None));
    }
}

fn draw_obstacles(frame: &mut Frame, snap: &Snapshot) {
    let glow = Some(Glow {
        blur: 8.0,
        color: palette::OBSTACLE_GLOW,
    });
    for p in snap.obstacles.iter().flat_map(|o| &o.points) {
        frame.push(Layer::Hazards, cell(*p, palette::OBSTACLE, glow));
    }
}

/// Pulse scale for a food that is about to expire
///
/// The pulse speeds up from 3 Hz-ish to 5 Hz-ish as the countdown runs out.
pub fn food_pulse(food: &Food, now: f64) -> f32 {
    if !food.is_expiring() {
        return 1.0;
    }
    let frequency = 5.0 - (food.remaining_seconds - 1) as f64 * 0.5;
    1.0 + 0.15 * (now * 0.005 * frequency).sin() as f32
}

fn draw_foods(frame: &mut Frame, snap: &Snapshot, now: f64, opts: &SceneOptions) {
    let pulsing = opts.food_pulse && snap.is_active();
    for food in &snap.foods {
        let scale = if pulsing { food_pulse(food, now) } else { 1.0 };
        frame.push(
            Layer::Collectibles,
            DrawCmd::Text {
                center: food.pos.center(),
                text: palette::food_glyph(food.food_type).to_string(),
                font_px: (CELL_SIZE - 4.0) * scale,
                color: palette::WHITE,
            },
        );
    }
}

fn draw_food_rings(frame: &mut Frame, snap: &Snapshot) {
    let radius = CELL_SIZE / 2.0 - 1.0;
    for food in snap.foods.iter().filter(|f| f.is_expiring()) {
        let center = food.pos.center();
        let progress = food.remaining_seconds as f32 / FOOD_WARNING_SECS as f32;
        let start = -FRAC_PI_2;
        frame.push(
            Layer::CollectibleRings,
            DrawCmd::Arc {
                center,
                radius,
                start: 0.0,
                end: TAU,
                width: 2.0,
                color: palette::RING_TRACK,
                glow: None,
            },
        );
        frame.push(
            Layer::CollectibleRings,
            DrawCmd::Arc {
                center,
                radius,
                start,
                end: start + progress * TAU,
                width: 2.0,
                color: palette::RING_PROGRESS,
                glow: Some(Glow {
                    blur: 6.0,
                    color: palette::WHITE,
                }),
            },
        );
    }
}

/// Unit heading of a snake on screen (head minus neck), facing up by default
fn heading(segments: &[GridPoint]) -> Vec2 {
    match segments {
        [head, neck, ..] => {
            let dir = Vec2::new((head.x - neck.x) as f32, (head.y - neck.y) as f32);
            let dir = dir.normalize_or_zero();
            if dir == Vec2::ZERO { Vec2::NEG_Y } else { dir }
        }
        _ => Vec2::NEG_Y,
    }
}

/// Eye centers: 4 px ahead of the cell center, 4 px either side
fn eye_positions(head: GridPoint, dir: Vec2) -> [Vec2; 2] {
    let center = head.center();
    let side = Vec2::new(-dir.y, dir.x);
    let ahead = center + dir * 4.0;
    [ahead - side * 4.0, ahead + side * 4.0]
}

fn draw_player(frame: &mut Frame, snake: &[GridPoint]) {
    let Some((head, body)) = snake.split_first() else {
        return;
    };
    for segment in body {
        frame.push(Layer::Player, cell(*segment, palette::SNAKE_BODY, None));
    }
    frame.push(Layer::Player, cell(*head, palette::SNAKE_HEAD, None));
    for eye in eye_positions(*head, heading(snake)) {
        frame.push(
            Layer::Player,
            DrawCmd::Circle {
                center: eye,
                radius: 2.0,
                color: palette::BLACK,
                glow: None,
            },
        );
    }
}

fn draw_opponent(frame: &mut Frame, snake: &[GridPoint], stunned: bool) {
    let Some((head, body)) = snake.split_first() else {
        return;
    };
    let (head_color, body_color, eye_color) = if stunned {
        (palette::AI_HEAD_STUNNED, palette::AI_BODY_STUNNED, palette::AI_EYE_STUNNED)
    } else {
        (palette::AI_HEAD, palette::AI_BODY, palette::WHITE)
    };

    for segment in body {
        frame.push(Layer::Opponent, cell(*segment, body_color, None));
    }
    frame.push(Layer::Opponent, cell(*head, head_color, None));

    for eye in eye_positions(*head, heading(snake)) {
        frame.push(
            Layer::Opponent,
            DrawCmd::Circle {
                center: eye,
                radius: 3.0,
                color: eye_color,
                glow: None,
            },
        );
        if stunned {
            // Crossed-out eyes
            for (a, b) in [
                (Vec2::new(-2.0, -2.0), Vec2::new(2.0, 2.0)),
                (Vec2::new(2.0, -2.0), Vec2::new(-2.0, 2.0)),
            ] {
                frame.push(
                    Layer::Opponent,
                    DrawCmd::Line {
                        from: eye + a,
                        to: eye + b,
                        width: 1.0,
                        color: palette::WHITE,
                    },
                );
            }
        } else {
            frame.push(
                Layer::Opponent,
                DrawCmd::Circle {
                    center: eye,
                    radius: 1.0,
                    color: palette::AI_PUPIL,
                    glow: None,
                },
            );
        }
    }
}

fn draw_fireballs(frame: &mut Frame, snap: &Snapshot) {
    for fireball in &snap.fireballs {
        let center = fireball.pos.center();
        frame.push(
            Layer::Projectiles,
            DrawCmd::Circle {
                center,
                radius: CELL_SIZE / 2.5,
                color: palette::FIREBALL,
                glow: Some(Glow {
                    blur: 15.0,
                    color: palette::FIREBALL_GLOW,
                }),
            },
        );
        frame.push(
            Layer::Projectiles,
            DrawCmd::Circle {
                center,
                radius: CELL_SIZE / 5.0,
                color: palette::FIREBALL_CORE,
                glow: Some(Glow {
                    blur: 4.0,
                    color: palette::FIREBALL_GLOW,
                }),
            },
        );
    }
}

/// Single dispatch point for effect variants
fn draw_effect(frame: &mut Frame, effect: &Effect, now: f64) {
    let progress = effect.progress(now);
    match &effect.kind {
        EffectKind::Explosion(explosion) => {
            let sample = explosion.sample(progress);
            frame.push(
                Layer::Effects,
                DrawCmd::Burst {
                    center: explosion.center,
                    radius: sample.radius,
                    alpha: sample.alpha,
                },
            );
        }
        EffectKind::Confetti(particle) => {
            let age = effect.age(now);
            let center = particle.position(age);
            let color = fade(particle.color, ConfettiParticle::alpha(progress));
            let s = particle.size;
            let cmd = match particle.shape {
                ConfettiShape::Circle => DrawCmd::Circle {
                    center,
                    radius: s,
                    color,
                    glow: None,
                },
                shape => DrawCmd::Quad {
                    center,
                    size: if shape == ConfettiShape::Strip {
                        Vec2::new(s * 2.0, s / 1.5)
                    } else {
                        Vec2::splat(s * 2.0)
                    },
                    rotation: particle.rotation_at(age),
                    color,
                },
            };
            frame.push(Layer::Effects, cmd);
        }
        EffectKind::FloatingScore(label) => {
            let alpha = FloatingScore::alpha(progress);
            frame.push(
                Layer::Effects,
                DrawCmd::Label(Label {
                    center: label.position(progress),
                    lines: vec![label.text.clone()],
                    font_px: 13.0,
                    bold: true,
                    text_color: fade(label.color, alpha),
                    fill: fade([1.0, 1.0, 1.0, 0.1], alpha),
                    stroke: fade([1.0, 1.0, 1.0, 0.2], alpha),
                    stroke_width: 1.0,
                    corner_radius: 10.0,
                    padding: Vec2::new(8.0, 4.0),
                    line_height: 14.0,
                    shadow: None,
                }),
            );
        }
    }
}

/// Overlay panel for the active message
fn message_label(message: &MessageFrame, opts: &SceneOptions) -> Label {
    let size = opts.size();
    let bonus = message.kind == MessageKind::Bonus;
    let font_px = message.kind.font_px();
    let line_height = font_px * 1.4;
    let base_height = if bonus { 36.0 } else { 42.0 };
    let alpha = message.alpha;

    // The server sends line breaks either escaped or raw
    let lines = message
        .text
        .split("\\n")
        .flat_map(|chunk| chunk.split('\n'))
        .map(str::to_string)
        .collect();

    Label {
        center: Vec2::new(size.x / 2.0, size.y / 5.0 + message.y_offset),
        lines,
        font_px,
        bold: true,
        text_color: fade(palette::WHITE, alpha),
        fill: fade([0.0, 0.0, 0.0, if bonus { 0.65 } else { 0.8 }], alpha),
        stroke: fade([1.0, 1.0, 1.0, if bonus { 0.3 } else { 0.5 }], alpha),
        stroke_width: if bonus { 1.0 } else { 2.0 },
        corner_radius: if bonus { 18.0 } else { 27.0 },
        padding: Vec2::new(
            if bonus { 15.0 } else { 17.5 },
            ((base_height - line_height) / 2.0).max(0.0),
        ),
        line_height,
        shadow: Some(Glow {
            blur: if bonus { 10.0 } else { 15.0 },
            color: fade([0.0, 0.0, 0.0, 0.5], alpha),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectRegistry;
    use crate::message::MessageTimeline;
    use crate::snapshot::{Fireball, Obstacle};

    fn busy_snapshot() -> Snapshot {
        Snapshot {
            started: true,
            game_over: true,
            crash_point: Some(GridPoint::new(6, 5)),
            snake: vec![GridPoint::new(5, 5), GridPoint::new(4, 5), GridPoint::new(3, 5)],
            ai_snake: vec![GridPoint::new(15, 15), GridPoint::new(15, 16)],
            ai_stunned: true,
            foods: vec![
                Food {
                    pos: GridPoint::new(10, 10),
                    food_type: 1,
                    remaining_seconds: 3,
                },
                Food {
                    pos: GridPoint::new(12, 12),
                    food_type: 2,
                    remaining_seconds: 30,
                },
            ],
            obstacles: vec![Obstacle {
                points: vec![GridPoint::new(8, 8)],
            }],
            fireballs: vec![Fireball {
                pos: GridPoint::new(7, 5),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_placeholder_without_snapshot() {
        let state = PresentationState {
            snapshot: None,
            effects: &[],
            message: None,
        };
        let frame = compose(&state, 0.0, &SceneOptions::default());
        assert!(frame.is_placeholder());
        let texts: Vec<&DrawCmd> = frame.layer(Layer::Message).collect();
        assert!(matches!(texts[0], DrawCmd::Text { text, .. } if text == PLACEHOLDER_TEXT));
    }

    #[test]
    fn test_layers_are_back_to_front() {
        let snap = busy_snapshot();
        let mut effects = EffectRegistry::new(64);
        effects.spawn_explosion(Vec2::new(100.0, 100.0), 0.0);
        effects.spawn_floating_score(Vec2::new(50.0, 50.0), "+10".into(), palette::WHITE, 0.0);
        let mut timeline = MessageTimeline::new();
        timeline.show("Boom", MessageKind::Normal, 0.0);

        let state = PresentationState {
            snapshot: Some(&snap),
            effects: effects.all(),
            message: timeline.current(100.0),
        };
        let frame = compose(&state, 100.0, &SceneOptions::default());

        let layers: Vec<Layer> = frame.items().iter().map(|(l, _)| *l).collect();
        assert!(layers.windows(2).all(|w| w[0] <= w[1]));
        for layer in [
            Layer::Background,
            Layer::Boundary,
            Layer::Hazards,
            Layer::Collectibles,
            Layer::CollectibleRings,
            Layer::Player,
            Layer::Opponent,
            Layer::Projectiles,
            Layer::Effects,
            Layer::CrashMarker,
            Layer::Message,
        ] {
            assert!(layers.contains(&layer), "missing {layer:?}");
        }
        assert_eq!(layers.last(), Some(&Layer::Message));
    }

    #[test]
    fn test_player_body_then_head_then_eyes() {
        let snap = busy_snapshot();
        let state = PresentationState {
            snapshot: Some(&snap),
            effects: &[],
            message: None,
        };
        let frame = compose(&state, 0.0, &SceneOptions::default());
        let player: Vec<&DrawCmd> = frame.layer(Layer::Player).collect();
        assert_eq!(player.len(), 5);
        assert!(matches!(player[0], DrawCmd::Rect { color, .. } if *color == palette::SNAKE_BODY));
        assert!(matches!(player[2], DrawCmd::Rect { color, .. } if *color == palette::SNAKE_HEAD));
        assert!(matches!(player[3], DrawCmd::Circle { .. }));
    }

    #[test]
    fn test_eyes_follow_heading() {
        // Moving right: eyes sit on the right half of the head cell
        let head = GridPoint::new(5, 5);
        let eyes = eye_positions(head, heading(&[head, GridPoint::new(4, 5)]));
        let center = head.center();
        assert!(eyes.iter().all(|e| e.x > center.x));

        // Lone head defaults to facing up, like the classic sprite
        let eyes = eye_positions(head, heading(&[head]));
        assert_eq!(eyes[0], center + Vec2::new(-4.0, -4.0));
        assert_eq!(eyes[1], center + Vec2::new(4.0, -4.0));
    }

    #[test]
    fn test_only_expiring_foods_get_rings() {
        let snap = busy_snapshot();
        let state = PresentationState {
            snapshot: Some(&snap),
            effects: &[],
            message: None,
        };
        let frame = compose(&state, 0.0, &SceneOptions::default());
        assert_eq!(frame.layer(Layer::CollectibleRings).count(), 2);
        assert_eq!(frame.layer(Layer::Collectibles).count(), 2);
    }

    #[test]
    fn test_food_pulse_only_while_active() {
        let mut snap = busy_snapshot();
        snap.game_over = false;
        let now = 314.0;
        let state = PresentationState {
            snapshot: Some(&snap),
            effects: &[],
            message: None,
        };

        let sizes = |frame: &Frame| -> Vec<f32> {
            frame
                .layer(Layer::Collectibles)
                .filter_map(|cmd| match cmd {
                    DrawCmd::Text { font_px, .. } => Some(*font_px),
                    _ => None,
                })
                .collect()
        };

        let frame = compose(&state, now, &SceneOptions::default());
        let expected = (CELL_SIZE - 4.0) * food_pulse(&snap.foods[0], now);
        assert!((sizes(&frame)[0] - expected).abs() < 1e-4);
        assert_eq!(sizes(&frame)[1], CELL_SIZE - 4.0);

        let calm = SceneOptions {
            food_pulse: false,
            ..Default::default()
        };
        assert_eq!(sizes(&compose(&state, now, &calm))[0], CELL_SIZE - 4.0);
    }

    #[test]
    fn test_compose_is_pure() {
        let snap = busy_snapshot();
        let mut effects = EffectRegistry::new(64);
        effects.spawn_confetti_burst(
            &mut <rand_pcg::Pcg32 as rand::SeedableRng>::seed_from_u64(3),
            Vec2::new(250.0, 300.0),
            12,
            0.0,
        );
        let state = PresentationState {
            snapshot: Some(&snap),
            effects: effects.all(),
            message: None,
        };
        let opts = SceneOptions::default();
        assert_eq!(compose(&state, 640.0, &opts), compose(&state, 640.0, &opts));
    }

    #[test]
    fn test_message_lines_split() {
        let frame = MessageFrame {
            text: "GAME OVER\\nPress R",
            kind: MessageKind::Permanent,
            alpha: 1.0,
            y_offset: 0.0,
        };
        let label = message_label(&frame, &SceneOptions::default());
        assert_eq!(label.lines, vec!["GAME OVER", "Press R"]);
        assert_eq!(label.font_px, 28.0);
        assert_eq!(label.center, Vec2::new(250.0, 100.0));
    }
}
