//! Transient message overlay
//!
//! At most one message is visible. Its alpha and vertical drift are sampled
//! from `now`; nothing is scheduled. Server-sourced text is deduplicated
//! against a separate suppression key so a message the server keeps
//! repeating is shown once, even after it has faded out.

/// Message style; decides lifetime and fade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageKind {
    #[default]
    Normal,
    /// Short-lived, smaller text (bonus pickups)
    Bonus,
    /// Stays until cleared or preempted
    Permanent,
}

/// Length of the closing fade
pub const FADE_MS: f64 = 500.0;
/// Upward drift over the fade (px)
pub const FADE_RISE: f32 = 30.0;

impl MessageKind {
    /// Total display time (None = forever)
    pub fn max_duration(&self) -> Option<f64> {
        match self {
            MessageKind::Normal => Some(1000.0),
            MessageKind::Bonus => Some(800.0),
            MessageKind::Permanent => None,
        }
    }

    /// Age at which the fade begins
    pub fn fade_start(&self) -> Option<f64> {
        self.max_duration().map(|max| (max - FADE_MS).max(0.0))
    }

    /// Font size used by the overlay
    pub fn font_px(&self) -> f32 {
        match self {
            MessageKind::Normal => 18.0,
            MessageKind::Bonus => 16.0,
            MessageKind::Permanent => 28.0,
        }
    }

    /// Guess the style of a server message
    pub fn classify(text: &str) -> Self {
        if text.trim_start().starts_with('+') || text.to_lowercase().contains("bonus") {
            MessageKind::Bonus
        } else {
            MessageKind::Normal
        }
    }
}

/// Timeline phase at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePhase {
    Empty,
    Showing(MessageKind),
    FadingOut(MessageKind),
}

/// What the overlay should draw this frame
#[derive(Debug, Clone, PartialEq)]
pub struct MessageFrame<'a> {
    pub text: &'a str,
    pub kind: MessageKind,
    pub alpha: f32,
    pub y_offset: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct ActiveMessage {
    text: String,
    shown_at: f64,
    kind: MessageKind,
}

/// Single-slot message state machine
#[derive(Debug, Clone, Default)]
pub struct MessageTimeline {
    active: Option<ActiveMessage>,
    server_key: Option<String>,
}

impl MessageTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `text`, preempting whatever is on screen
    pub fn show(&mut self, text: impl Into<String>, kind: MessageKind, now: f64) {
        self.active = Some(ActiveMessage {
            text: text.into(),
            shown_at: now,
            kind,
        });
    }

    /// Drop the current message (the only way a permanent one goes away)
    pub fn clear(&mut self) {
        self.active = None;
    }

    /// React to server text unless it is the text already reacted to
    ///
    /// Returns true when the message was shown.
    pub fn offer_server(&mut self, text: &str, now: f64) -> bool {
        if text.is_empty() {
            self.release_server();
            return false;
        }
        if self.server_key.as_deref() == Some(text) {
            return false;
        }
        self.server_key = Some(text.to_string());
        self.show(text, MessageKind::classify(text), now);
        true
    }

    /// The server stopped repeating its text; the same text may show again
    pub fn release_server(&mut self) {
        self.server_key = None;
    }

    /// Treat `text` as already reacted to without showing it
    ///
    /// Used when the client replaces the server's text with its own.
    pub fn suppress_server(&mut self, text: &str) {
        self.server_key = (!text.is_empty()).then(|| text.to_string());
    }

    /// Server text currently suppressed
    pub fn server_key(&self) -> Option<&str> {
        self.server_key.as_deref()
    }

    pub fn phase(&self, now: f64) -> MessagePhase {
        let Some(msg) = &self.active else {
            return MessagePhase::Empty;
        };
        let age = now - msg.shown_at;
        match (msg.kind.fade_start(), msg.kind.max_duration()) {
            (Some(_), Some(max)) if age >= max => MessagePhase::Empty,
            (Some(fade), Some(_)) if age > fade => MessagePhase::FadingOut(msg.kind),
            _ => MessagePhase::Showing(msg.kind),
        }
    }

    /// Sample the overlay at `now`
    pub fn current(&self, now: f64) -> Option<MessageFrame<'_>> {
        let msg = self.active.as_ref()?;
        let (alpha, y_offset) = match self.phase(now) {
            MessagePhase::Empty => return None,
            MessagePhase::Showing(_) => (1.0, 0.0),
            MessagePhase::FadingOut(kind) => {
                let fade_start = kind.fade_start().unwrap_or(0.0);
                let progress = (((now - msg.shown_at) - fade_start) / FADE_MS).clamp(0.0, 1.0) as f32;
                (1.0 - progress, -progress * FADE_RISE)
            }
        };
        Some(MessageFrame {
            text: &msg.text,
            kind: msg.kind,
            alpha,
            y_offset,
        })
    }
}
