//! Platform abstraction layer
//!
//! Wall clock and single-slot timer bookkeeping. The actual timer callbacks
//! live in the browser entry point; the slot only tracks which handle is
//! pending so that cancelling twice, or cancelling after the timer fired, is
//! harmless.

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Holder for at most one pending timer handle
#[derive(Debug)]
pub struct TimerSlot<H> {
    pending: Option<H>,
}

impl<H> Default for TimerSlot<H> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<H> TimerSlot<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Store `handle` unless one is already pending
    ///
    /// Hands `handle` back when the slot is occupied.
    pub fn arm(&mut self, handle: H) -> Result<(), H> {
        if self.pending.is_some() {
            return Err(handle);
        }
        self.pending = Some(handle);
        Ok(())
    }

    /// Take the pending handle out for cancelling
    ///
    /// Idempotent: the second call returns `None`.
    pub fn cancel(&mut self) -> Option<H> {
        self.pending.take()
    }

    /// The timer ran; forget its handle
    pub fn fired(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_idempotent() {
        let mut slot = TimerSlot::new();
        assert!(slot.cancel().is_none());

        slot.arm(7).unwrap();
        assert!(slot.is_armed());
        assert_eq!(slot.cancel(), Some(7));
        assert_eq!(slot.cancel(), None);
        assert!(!slot.is_armed());
    }

    #[test]
    fn test_arm_does_not_stack() {
        let mut slot = TimerSlot::new();
        slot.arm(1).unwrap();
        assert_eq!(slot.arm(2), Err(2));
        assert_eq!(slot.cancel(), Some(1));
        assert_eq!(slot.arm(3), Ok(()));
    }

    #[test]
    fn test_cancel_after_fire_is_noop() {
        let mut slot = TimerSlot::new();
        slot.arm(9).unwrap();
        slot.fired();
        assert_eq!(slot.cancel(), None);
    }

    #[test]
    fn test_now_is_epoch_milliseconds() {
        // Past 2001-09-09 in ms; wall clocks may step backwards, so no ordering check
        assert!(now_ms() > 1.0e12);
    }
}
