//! Arbitration between user-driven seeking and polled progress.
//!
//! The seek control and the progress poller race to define "the" displayed
//! position. While a drag is live the drag value wins outright. After the
//! drag ends and the single seek command is issued, the engine keeps
//! reporting the stale pre-seek position for one or more polls, so raw
//! progress stays distrusted for a guard window measured from the command.

use std::time::{Duration, Instant};

pub struct SeekReconciler {
    scrubbing: bool,
    requested: f64,
    last_seek_at: Option<Instant>,
    guard: Duration,
}

impl SeekReconciler {
    pub fn new(guard: Duration) -> Self {
        Self {
            scrubbing: false,
            requested: 0.0,
            last_seek_at: None,
            guard,
        }
    }

    /// The user grabbed the seek control. No engine command is issued while
    /// the drag is live; intermediate values only steer the display.
    pub fn begin_scrub(&mut self) {
        self.scrubbing = true;
    }

    /// Live drag value.
    pub fn preview(&mut self, fraction: f64) {
        self.requested = fraction;
    }

    /// The drag ended (or a direct seek was requested): record the command
    /// instant and hand back the fraction for exactly one engine seek.
    /// There is no cancel path; releasing the drag always commits.
    pub fn commit(&mut self, fraction: f64, now: Instant) -> f64 {
        self.scrubbing = false;
        self.requested = fraction;
        self.last_seek_at = Some(now);
        fraction
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrubbing
    }

    /// The single coherent position value:
    /// `requested` while scrubbing or inside the guard window, else the raw
    /// polled fraction.
    pub fn display(&self, progress_fraction: f64, now: Instant) -> f64 {
        if self.scrubbing {
            return self.requested;
        }
        match self.last_seek_at {
            Some(at) if now.saturating_duration_since(at) < self.guard => self.requested,
            _ => progress_fraction,
        }
    }
}
