use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A clip window within the loaded media.
///
/// No ordering is enforced between `start` and `end`; a window with
/// `end <= start` is degenerate but representable, and the loop governor
/// handles it without panicking. Validity is an upstream concern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clip {
    pub start: Duration,
    pub end: Duration,
}

impl Clip {
    pub fn new(start: Duration, end: Duration) -> Self {
        Self { start, end }
    }

    /// Position of `start` as a fraction of `total`, or 0.0 when the total
    /// duration is not yet known.
    pub fn start_fraction(&self, total: Duration) -> f64 {
        fraction_of(self.start, total)
    }

    pub fn end_fraction(&self, total: Duration) -> f64 {
        fraction_of(self.end, total)
    }
}

fn fraction_of(position: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 0.0;
    }
    (position.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
}
