//! Outbound commands
//!
//! The client never changes game state itself; it only sends one of these
//! and waits for the next snapshot. Which commands make sense is derived
//! from the last known flags so the UI can grey out the rest.

use serde::{Deserialize, Serialize};

use crate::snapshot::Snapshot;

/// A command sent upstream as `{"action": "..."}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientCommand {
    Up,
    Down,
    Left,
    Right,
    /// Toggle pause (also starts a fresh game)
    Pause,
    Start,
    Restart,
    Quit,
    DiffLow,
    DiffMid,
    DiffHigh,
    /// Toggle autoplay
    Auto,
}

impl ClientCommand {
    pub const ALL: [ClientCommand; 12] = [
        ClientCommand::Up,
        ClientCommand::Down,
        ClientCommand::Left,
        ClientCommand::Right,
        ClientCommand::Pause,
        ClientCommand::Start,
        ClientCommand::Restart,
        ClientCommand::Quit,
        ClientCommand::DiffLow,
        ClientCommand::DiffMid,
        ClientCommand::DiffHigh,
        ClientCommand::Auto,
    ];

    /// Keyboard binding (`KeyboardEvent.key`, any case)
    pub fn from_key(key: &str) -> Option<Self> {
        let cmd = match key.to_lowercase().as_str() {
            "arrowup" | "w" => ClientCommand::Up,
            "arrowdown" | "s" => ClientCommand::Down,
            "arrowleft" | "a" => ClientCommand::Left,
            "arrowright" | "d" => ClientCommand::Right,
            " " | "p" => ClientCommand::Pause,
            "r" => ClientCommand::Restart,
            "q" => ClientCommand::Quit,
            _ => return None,
        };
        Some(cmd)
    }

    /// Wire form
    pub fn to_json(&self) -> String {
        // A fieldless tagged enum cannot fail to serialize
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Flags from the most recent snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LastKnown {
    pub started: bool,
    pub paused: bool,
    pub game_over: bool,
    pub boosting: bool,
}

impl From<&Snapshot> for LastKnown {
    fn from(snap: &Snapshot) -> Self {
        Self {
            started: snap.started,
            paused: snap.paused,
            game_over: snap.game_over,
            boosting: snap.boosting,
        }
    }
}

/// Whether the server would act on `cmd` given `flags`
pub fn is_available(cmd: ClientCommand, flags: &LastKnown) -> bool {
    match cmd {
        ClientCommand::Up
        | ClientCommand::Down
        | ClientCommand::Left
        | ClientCommand::Right
        | ClientCommand::Quit => true,
        ClientCommand::Pause | ClientCommand::Auto => !flags.game_over,
        ClientCommand::Start => !flags.started && !flags.game_over,
        ClientCommand::Restart => flags.game_over,
        ClientCommand::DiffLow | ClientCommand::DiffMid | ClientCommand::DiffHigh => {
            !flags.started || flags.game_over
        }
    }
}

/// Every command that makes sense right now
pub fn available(flags: &LastKnown) -> Vec<ClientCommand> {
    ClientCommand::ALL
        .into_iter()
        .filter(|cmd| is_available(*cmd, flags))
        .collect()
}

/// What a tap on the board overlay means
///
/// Nothing before the first snapshot: there is no game to start yet.
pub fn overlay_action(flags: Option<&LastKnown>) -> Option<ClientCommand> {
    let flags = flags?;
    if flags.game_over {
        Some(ClientCommand::Restart)
    } else if !flags.started {
        Some(ClientCommand::Start)
    } else {
        None
    }
}
