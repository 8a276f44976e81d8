//! Edge detection between consecutive snapshots
//!
//! `detect` is a pure function of the previous snapshot, the current one and
//! an explicit [`Baseline`] (the client-side values the server knows nothing
//! about). Running it pairwise over a sequence gives the same events as
//! running it incrementally.

use serde::{Deserialize, Serialize};

use crate::snapshot::{GridPoint, Snapshot};

/// Derived, instantaneous facts; consumed once and dropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionEvent {
    /// First snapshot after startup or reconnect
    Initialized,
    GameStarted,
    /// Game over was cleared (server restarted the round)
    GameRestarted,
    GameOverEntered,
    /// `food_eaten` went up. `food_type` is a heuristic: the server lists the
    /// freshest food first, so index 0 of the current list is used.
    FoodEaten {
        count: u32,
        food_type: u8,
        points: u64,
        at: Option<GridPoint>,
    },
    AiStunned {
        at: Option<GridPoint>,
    },
    AiRecovered,
    FireballLaunched {
        count: u32,
    },
    BoostStarted,
    BoostEnded,
    Paused,
    Resumed,
    NewHighScore {
        score: u64,
        previous_best: u64,
    },
    ServerMessage {
        text: String,
    },
    /// The server stopped sending the message it was repeating
    ServerMessageCleared,
}

/// Client-side inputs to detection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Baseline {
    /// Best score known before this snapshot
    pub best_score: u64,
    /// Server text already reacted to (suppressed while repeated)
    pub message_key: Option<String>,
}

/// Derive the ordered transition events for one snapshot arrival
pub fn detect(
    previous: Option<&Snapshot>,
    current: &Snapshot,
    baseline: &Baseline,
) -> Vec<TransitionEvent> {
    let mut events = Vec::new();

    match previous {
        None => events.push(TransitionEvent::Initialized),
        Some(prev) => detect_edges(prev, current, &mut events),
    }

    // Baseline rules apply to the first snapshot as well
    if current.score > baseline.best_score {
        events.push(TransitionEvent::NewHighScore {
            score: current.score,
            previous_best: baseline.best_score,
        });
    }

    let text = current.message_text();
    if !text.is_empty() {
        if baseline.message_key.as_deref() != Some(text) {
            events.push(TransitionEvent::ServerMessage {
                text: text.to_string(),
            });
        }
    } else if baseline.message_key.is_some() {
        events.push(TransitionEvent::ServerMessageCleared);
    }

    events
}

fn detect_edges(prev: &Snapshot, cur: &Snapshot, events: &mut Vec<TransitionEvent>) {
    if !prev.started && cur.started {
        events.push(TransitionEvent::GameStarted);
    }
    if prev.game_over && !cur.game_over {
        events.push(TransitionEvent::GameRestarted);
    }
    if !prev.game_over && cur.game_over {
        events.push(TransitionEvent::GameOverEntered);
    }

    if cur.food_eaten > prev.food_eaten {
        events.push(TransitionEvent::FoodEaten {
            count: cur.food_eaten - prev.food_eaten,
            food_type: cur.foods.first().map(|f| f.food_type).unwrap_or(0),
            points: cur.score.saturating_sub(prev.score),
            at: cur.head(),
        });
    }

    match (prev.ai_stunned, cur.ai_stunned) {
        (false, true) => events.push(TransitionEvent::AiStunned { at: cur.ai_head() }),
        (true, false) => events.push(TransitionEvent::AiRecovered),
        _ => {}
    }

    if cur.fireballs.len() > prev.fireballs.len() {
        events.push(TransitionEvent::FireballLaunched {
            count: (cur.fireballs.len() - prev.fireballs.len()) as u32,
        });
    }

    match (prev.boosting, cur.boosting) {
        (false, true) => events.push(TransitionEvent::BoostStarted),
        (true, false) => events.push(TransitionEvent::BoostEnded),
        _ => {}
    }

    match (prev.paused, cur.paused) {
        (false, true) => events.push(TransitionEvent::Paused),
        (true, false) => events.push(TransitionEvent::Resumed),
        _ => {}
    }
}

/// Advance a baseline past one detection pass
///
/// This is what the engine does between arrivals; it is exposed so callers
/// replaying a recording can reproduce the same baselines.
pub fn advance_baseline(baseline: &mut Baseline, current: &Snapshot) {
    baseline.best_score = baseline.best_score.max(current.score);
    let text = current.message_text();
    baseline.message_key = if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Fireball, Food};
    use proptest::prelude::*;

    fn snap(score: u64) -> Snapshot {
        Snapshot {
            started: true,
            score,
            snake: vec![GridPoint::new(5, 5), GridPoint::new(4, 5)],
            ..Default::default()
        }
    }

    fn count_high_scores(events: &[TransitionEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, TransitionEvent::NewHighScore { .. }))
            .count()
    }

    #[test]
    fn test_first_snapshot_only_initializes() {
        let cur = Snapshot {
            started: true,
            boosting: true,
            game_over: true,
            ..Default::default()
        };
        let events = detect(None, &cur, &Baseline::default());
        assert_eq!(events, vec![TransitionEvent::Initialized]);
    }

    #[test]
    fn test_game_over_edge_fires_once() {
        let prev = snap(10);
        let mut cur = snap(10);
        cur.game_over = true;
        let baseline = Baseline {
            best_score: 10,
            ..Default::default()
        };

        let events = detect(Some(&prev), &cur, &baseline);
        assert_eq!(events, vec![TransitionEvent::GameOverEntered]);

        // Still game over: no new edge
        let events = detect(Some(&cur), &cur, &baseline);
        assert!(events.is_empty());
    }

    #[test]
    fn test_game_over_with_record_orders_events() {
        let prev = snap(40);
        let mut cur = snap(42);
        cur.game_over = true;
        let baseline = Baseline {
            best_score: 30,
            ..Default::default()
        };

        let events = detect(Some(&prev), &cur, &baseline);
        assert_eq!(
            events,
            vec![
                TransitionEvent::GameOverEntered,
                TransitionEvent::NewHighScore {
                    score: 42,
                    previous_best: 30
                },
            ]
        );
    }

    #[test]
    fn test_high_score_once_per_crossing() {
        let scores = [5, 5, 9, 9, 12];
        let mut baseline = Baseline::default();
        let mut previous: Option<Snapshot> = None;
        let mut fired = 0;

        for score in scores {
            let cur = snap(score);
            let events = detect(previous.as_ref(), &cur, &baseline);
            fired += count_high_scores(&events);
            advance_baseline(&mut baseline, &cur);
            previous = Some(cur);
        }

        assert_eq!(fired, 3);
    }

    #[test]
    fn test_food_eaten_uses_first_food() {
        let mut prev = snap(10);
        prev.food_eaten = 3;
        let mut cur = snap(25);
        cur.food_eaten = 5;
        cur.foods = vec![
            Food {
                pos: GridPoint::new(1, 1),
                food_type: 3,
                remaining_seconds: 0,
            },
            Food {
                pos: GridPoint::new(2, 2),
                food_type: 1,
                remaining_seconds: 0,
            },
        ];
        let baseline = Baseline {
            best_score: 100,
            ..Default::default()
        };

        let events = detect(Some(&prev), &cur, &baseline);
        assert_eq!(
            events,
            vec![TransitionEvent::FoodEaten {
                count: 2,
                food_type: 3,
                points: 15,
                at: Some(GridPoint::new(5, 5)),
            }]
        );
    }

    #[test]
    fn test_boost_pause_stun_and_fireball_edges() {
        let prev = snap(0);
        let mut cur = snap(0);
        cur.boosting = true;
        cur.paused = true;
        cur.ai_stunned = true;
        cur.ai_snake = vec![GridPoint::new(9, 9)];
        cur.fireballs = vec![Fireball {
            pos: GridPoint::new(3, 3),
        }];

        let events = detect(Some(&prev), &cur, &Baseline::default());
        assert_eq!(
            events,
            vec![
                TransitionEvent::AiStunned {
                    at: Some(GridPoint::new(9, 9))
                },
                TransitionEvent::FireballLaunched { count: 1 },
                TransitionEvent::BoostStarted,
                TransitionEvent::Paused,
            ]
        );

        let events = detect(Some(&cur), &prev, &Baseline::default());
        assert_eq!(
            events,
            vec![
                TransitionEvent::AiRecovered,
                TransitionEvent::BoostEnded,
                TransitionEvent::Resumed,
            ]
        );
    }

    #[test]
    fn test_start_and_restart_edges() {
        let idle = Snapshot::default();
        let mut running = idle.clone();
        running.started = true;
        assert_eq!(
            detect(Some(&idle), &running, &Baseline::default()),
            vec![TransitionEvent::GameStarted]
        );

        let mut over = running.clone();
        over.game_over = true;
        assert_eq!(
            detect(Some(&over), &running, &Baseline::default()),
            vec![TransitionEvent::GameRestarted]
        );
    }

    #[test]
    fn test_server_message_suppressed_while_repeated() {
        let messages = ["Nice!", "Nice!", "Nice!", "", "Nice!"];
        let mut baseline = Baseline::default();
        let mut previous: Option<Snapshot> = None;
        let mut shown = Vec::new();
        let mut cleared = 0;

        for (i, text) in messages.iter().enumerate() {
            let cur = Snapshot {
                message: Some(text.to_string()),
                ..Default::default()
            };
            for event in detect(previous.as_ref(), &cur, &baseline) {
                match event {
                    TransitionEvent::ServerMessage { .. } => shown.push(i),
                    TransitionEvent::ServerMessageCleared => cleared += 1,
                    _ => {}
                }
            }
            advance_baseline(&mut baseline, &cur);
            previous = Some(cur);
        }

        assert_eq!(shown, vec![0, 4]);
        assert_eq!(cleared, 1);
    }

    fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
        (
            0u64..50,
            0u32..20,
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            prop::option::of(prop::sample::select(vec!["", "Nice!", "+10 bonus"])),
        )
            .prop_map(|(score, food_eaten, started, game_over, boosting, paused, msg)| {
                Snapshot {
                    score,
                    food_eaten,
                    started,
                    game_over,
                    boosting,
                    paused,
                    message: msg.map(str::to_string),
                    ..Default::default()
                }
            })
    }

    proptest! {
        #[test]
        fn test_pairwise_matches_incremental(seq in prop::collection::vec(arb_snapshot(), 1..12)) {
            // Incremental: one running baseline and predecessor
            let mut incremental = Vec::new();
            let mut baseline = Baseline::default();
            for (i, cur) in seq.iter().enumerate() {
                let prev = if i == 0 { None } else { Some(&seq[i - 1]) };
                incremental.extend(detect(prev, cur, &baseline));
                advance_baseline(&mut baseline, cur);
            }

            // Pairwise: each pair on its own, baseline rebuilt from scratch
            let mut pairwise = Vec::new();
            for i in 0..seq.len() {
                let mut base = Baseline::default();
                for earlier in &seq[..i] {
                    advance_baseline(&mut base, earlier);
                }
                let prev = if i == 0 { None } else { Some(&seq[i - 1]) };
                pairwise.extend(detect(prev, &seq[i], &base));
            }

            prop_assert_eq!(incremental, pairwise);
        }
    }
}
