//! Clip-window loop enforcement.
//!
//! Watches play-head time on the engine's time-changed cadence and snaps
//! back to the clip start whenever playback exits the window. The grace
//! below the nominal start tolerates the engine briefly reporting a time
//! just before the start right after a loop-triggered seek.

use std::time::Duration;

use clipcut_types::Clip;

pub struct ClipLoopGovernor {
    active: Option<Clip>,
    grace: Duration,
}

impl ClipLoopGovernor {
    pub fn new(grace: Duration) -> Self {
        Self {
            active: None,
            grace,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Activates the loop and returns the seek target entering the window
    /// deterministically, rather than waiting for a natural boundary
    /// crossing. `None` until the media length is known.
    pub fn enable(&mut self, clip: Clip, total: Duration) -> Option<f64> {
        self.active = Some(clip);
        if total.is_zero() {
            return None;
        }
        Some(clip.start_fraction(total))
    }

    /// Deactivates without seeking; playback continues from wherever it is.
    pub fn disable(&mut self) {
        self.active = None;
    }

    /// Edited bounds make the loop target stale; the loop is dropped and
    /// must be explicitly re-enabled.
    pub fn clip_edited(&mut self) {
        self.active = None;
    }

    /// Evaluated on every time-changed callback. Returns the snap-back
    /// target fraction when the play-head has exited the window, else
    /// `None`. A window with `end <= start` re-snaps every call; that
    /// stutter is the documented behavior for misconfigured bounds, not an
    /// error of this layer.
    pub fn on_time_changed(&self, current: Duration, total: Duration) -> Option<f64> {
        let clip = self.active?;
        if total.is_zero() {
            return None;
        }
        let below_start = current < clip.start.saturating_sub(self.grace);
        let past_end = current >= clip.end;
        if below_start || past_end {
            return Some(clip.start_fraction(total));
        }
        None
    }

    /// Coerces a user seek into the window while a loop is active:
    /// below-start up to the start, above-end down to the end.
    pub fn clamp(&self, fraction: f64, total: Duration) -> f64 {
        let Some(clip) = self.active else {
            return fraction;
        };
        if total.is_zero() {
            return fraction;
        }
        let lower = clip.start_fraction(total);
        let upper = clip.end_fraction(total);
        // Not f64::clamp: a degenerate window has lower > upper and must
        // coerce instead of panicking.
        if fraction < lower {
            lower
        } else if fraction > upper {
            upper
        } else {
            fraction
        }
    }
}
