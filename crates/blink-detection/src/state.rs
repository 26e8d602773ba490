//! Blink state machine
//!
//! Edge-triggered on the open→closed transition, debounced by a frame
//! cooldown that starts when a blink is emitted. Reopening the eye does not
//! clear the cooldown.

use serde::{Deserialize, Serialize};

/// Per-face blink tracking state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlinkState {
    /// Whether the eye is currently considered closed
    pub is_eye_closed: bool,
    /// Frames left before a new blink can be registered
    pub cooldown_remaining: u32,
}

impl BlinkState {
    /// Advance by one frame, returning the new state and whether a blink fired
    pub fn next(self, ear: f64, threshold: f64, cooldown_frames: u32) -> (Self, bool) {
        let mut state = self;
        let blink = state.update(ear, threshold, cooldown_frames);
        (state, blink)
    }

    /// Advance in place by one frame; returns true when a blink is emitted
    pub fn update(&mut self, ear: f64, threshold: f64, cooldown_frames: u32) -> bool {
        let mut blink = false;

        if ear < threshold && !self.is_eye_closed && self.cooldown_remaining == 0 {
            self.is_eye_closed = true;
            self.cooldown_remaining = cooldown_frames;
            blink = true;
        } else if ear >= threshold {
            self.is_eye_closed = false;
        }

        if self.cooldown_remaining > 0 {
            self.cooldown_remaining -= 1;
        }

        blink
    }

    /// Whether a closing transition would be counted right now
    pub fn can_emit(&self) -> bool {
        !self.is_eye_closed && self.cooldown_remaining == 0
    }
}
