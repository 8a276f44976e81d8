//! Authoritative world-state snapshots
//!
//! A snapshot is never patched: every arrival replaces the previous one
//! wholesale. Decoding is lenient per field, so a malformed optional value
//! degrades to its default instead of rejecting the whole update.

use std::fmt;

use glam::Vec2;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A cell coordinate on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Pixel center of this cell
    pub fn center(&self) -> Vec2 {
        crate::cell_center(self.x, self.y)
    }
}

/// A collectible food item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    pub pos: GridPoint,
    /// Food type (0-3 on the current server, drives color and cue pitch)
    #[serde(default, deserialize_with = "lenient")]
    pub food_type: u8,
    /// Seconds until the food disappears (0 = no countdown)
    #[serde(default, deserialize_with = "lenient")]
    pub remaining_seconds: i32,
}

impl Food {
    /// True while the countdown ring and pulse should be shown
    pub fn is_expiring(&self) -> bool {
        self.remaining_seconds > 0 && self.remaining_seconds <= crate::consts::FOOD_WARNING_SECS
    }
}

/// A static obstacle made of one or more cells
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Obstacle {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub points: Vec<GridPoint>,
}

/// A projectile in flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fireball {
    pub pos: GridPoint,
}

/// One authoritative state update
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    /// Player snake, head first
    #[serde(deserialize_with = "lenient_vec")]
    pub snake: Vec<GridPoint>,
    /// Opponent snake, head first
    #[serde(deserialize_with = "lenient_vec")]
    pub ai_snake: Vec<GridPoint>,
    #[serde(deserialize_with = "lenient_vec")]
    pub foods: Vec<Food>,
    #[serde(deserialize_with = "lenient_vec")]
    pub obstacles: Vec<Obstacle>,
    #[serde(deserialize_with = "lenient_vec")]
    pub fireballs: Vec<Fireball>,
    #[serde(deserialize_with = "lenient")]
    pub score: u64,
    #[serde(deserialize_with = "lenient")]
    pub food_eaten: u32,
    /// Foods per second, as computed by the server
    #[serde(deserialize_with = "lenient")]
    pub eating_speed: f32,
    #[serde(deserialize_with = "lenient")]
    pub started: bool,
    #[serde(deserialize_with = "lenient")]
    pub paused: bool,
    #[serde(deserialize_with = "lenient")]
    pub game_over: bool,
    #[serde(deserialize_with = "lenient")]
    pub boosting: bool,
    #[serde(deserialize_with = "lenient")]
    pub ai_stunned: bool,
    #[serde(deserialize_with = "lenient")]
    pub auto_play: bool,
    #[serde(deserialize_with = "lenient")]
    pub difficulty: String,
    /// One-shot server text (repeated by the server for as long as it is current)
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub crash_point: Option<GridPoint>,
}

impl Snapshot {
    /// Decode a snapshot from a raw network payload
    ///
    /// Only a payload that is not a JSON object is rejected; individual
    /// fields that fail to decode fall back to their defaults.
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let value: Value = serde_json::from_str(raw).map_err(SnapshotError::Syntax)?;
        Self::from_value(value)
    }

    /// Decode from an already-parsed JSON value
    pub fn from_value(value: Value) -> Result<Self, SnapshotError> {
        if !value.is_object() {
            return Err(SnapshotError::NotAnObject(json_kind(&value)));
        }
        serde_json::from_value(value).map_err(SnapshotError::Syntax)
    }

    /// Player head
    pub fn head(&self) -> Option<GridPoint> {
        self.snake.first().copied()
    }

    /// Opponent head
    pub fn ai_head(&self) -> Option<GridPoint> {
        self.ai_snake.first().copied()
    }

    /// Server message, with "absent" and "empty" treated alike
    pub fn message_text(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }

    /// Gameplay is running (foods pulse only while this holds)
    pub fn is_active(&self) -> bool {
        self.started && !self.paused && !self.game_over
    }
}

/// Why a payload could not be turned into a snapshot at all
#[derive(Debug)]
pub enum SnapshotError {
    /// Not valid JSON
    Syntax(serde_json::Error),
    /// Valid JSON, but not an object (carries the JSON kind found)
    NotAnObject(&'static str),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Syntax(e) => write!(f, "snapshot is not valid JSON: {e}"),
            SnapshotError::NotAnObject(kind) => write!(f, "snapshot must be an object, got {kind}"),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Syntax(e) => Some(e),
            SnapshotError::NotAnObject(_) => None,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode a field, falling back to its default when the value is malformed
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_else(|e| {
        log::debug!("Ignoring malformed snapshot field: {e}");
        T::default()
    }))
}

/// Decode a list, keeping only the elements that decode cleanly
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Latest snapshot plus the predecessor, held only until detection has run
#[derive(Debug, Default)]
pub struct SnapshotBuffer {
    latest: Option<Snapshot>,
    previous: Option<Snapshot>,
}

impl SnapshotBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the latest snapshot; the old one is kept as `previous`
    pub fn replace(&mut self, snapshot: Snapshot) {
        self.previous = self.latest.replace(snapshot);
    }

    /// Drop the predecessor once transitions have been derived from it
    pub fn settle(&mut self) {
        self.previous = None;
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.latest.as_ref()
    }

    pub fn previous(&self) -> Option<&Snapshot> {
        self.previous.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_STATE: &str = r#"{
        "snake": [{"x": 5, "y": 5}, {"x": 4, "y": 5}, {"x": 3, "y": 5}],
        "aiSnake": [{"x": 20, "y": 20}, {"x": 20, "y": 21}],
        "foods": [{"pos": {"x": 10, "y": 12}, "foodType": 2, "remainingSeconds": 4}],
        "obstacles": [{"points": [{"x": 8, "y": 8}, {"x": 8, "y": 9}]}],
        "fireballs": [{"pos": {"x": 6, "y": 5}}],
        "score": 42,
        "foodEaten": 7,
        "eatingSpeed": 0.85,
        "started": true,
        "gameOver": false,
        "paused": false,
        "boosting": true,
        "aiStunned": false,
        "autoPlay": false,
        "difficulty": "mid",
        "message": "Nice!"
    }"#;

    #[test]
    fn test_decode_full_state() {
        let snap = Snapshot::from_json(FULL_STATE).unwrap();
        assert_eq!(snap.snake.len(), 3);
        assert_eq!(snap.head(), Some(GridPoint::new(5, 5)));
        assert_eq!(snap.ai_head(), Some(GridPoint::new(20, 20)));
        assert_eq!(snap.foods[0].food_type, 2);
        assert!(snap.foods[0].is_expiring());
        assert_eq!(snap.obstacles[0].points.len(), 2);
        assert_eq!(snap.fireballs.len(), 1);
        assert_eq!(snap.score, 42);
        assert_eq!(snap.food_eaten, 7);
        assert!(snap.boosting);
        assert_eq!(snap.difficulty, "mid");
        assert_eq!(snap.message_text(), "Nice!");
        assert_eq!(snap.crash_point, None);
        assert!(snap.is_active());
    }

    #[test]
    fn test_malformed_fields_fall_back() {
        let raw = r#"{
            "snake": [{"x": 1, "y": 1}],
            "score": "lots",
            "foodEaten": -3,
            "boosting": null,
            "message": 17,
            "crashPoint": {"x": "a"},
            "foods": [
                {"pos": {"x": 2, "y": 3}, "foodType": 1},
                {"foodType": 3},
                "garbage"
            ],
            "fireballs": 12
        }"#;
        let snap = Snapshot::from_json(raw).unwrap();
        assert_eq!(snap.snake, vec![GridPoint::new(1, 1)]);
        assert_eq!(snap.score, 0);
        assert_eq!(snap.food_eaten, 0);
        assert!(!snap.boosting);
        assert_eq!(snap.message, None);
        assert_eq!(snap.crash_point, None);
        assert_eq!(snap.foods.len(), 1);
        assert_eq!(snap.foods[0].remaining_seconds, 0);
        assert!(snap.fireballs.is_empty());
    }

    #[test]
    fn test_missing_fields_default() {
        let snap = Snapshot::from_json("{}").unwrap();
        assert_eq!(snap, Snapshot::default());
        assert!(!snap.is_active());
        assert_eq!(snap.message_text(), "");
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(
            Snapshot::from_json("[1, 2, 3]"),
            Err(SnapshotError::NotAnObject("an array"))
        ));
        assert!(matches!(
            Snapshot::from_json("{not json"),
            Err(SnapshotError::Syntax(_))
        ));
    }

    #[test]
    fn test_buffer_keeps_predecessor_until_settled() {
        let mut buffer = SnapshotBuffer::new();
        assert!(buffer.latest().is_none());

        buffer.replace(Snapshot {
            score: 1,
            ..Default::default()
        });
        assert!(buffer.previous().is_none());

        buffer.replace(Snapshot {
            score: 2,
            ..Default::default()
        });
        assert_eq!(buffer.previous().map(|s| s.score), Some(1));
        assert_eq!(buffer.latest().map(|s| s.score), Some(2));

        buffer.settle();
        assert!(buffer.previous().is_none());
        assert_eq!(buffer.latest().map(|s| s.score), Some(2));
    }
}
