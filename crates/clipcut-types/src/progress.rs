use std::time::Duration;

/// One poll tick of decoder-reported playback progress.
///
/// `elapsed` is the decoder's own time read, not recomputed from
/// `fraction * total`; the two can disagree by up to the decoder's internal
/// update granularity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Progress {
    pub fraction: f64,
    pub elapsed: Duration,
    pub total: Duration,
}

impl Progress {
    /// Some engines report a negative position before any media is loaded;
    /// the fraction is coerced into `[0, 1]` here so downstream consumers
    /// never see it.
    pub fn new(fraction: f64, elapsed: Duration, total: Duration) -> Self {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            fraction,
            elapsed,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_is_clamped() {
        let progress = Progress::new(-1.0, Duration::ZERO, Duration::from_secs(10));
        assert_eq!(progress.fraction, 0.0);
        let progress = Progress::new(1.5, Duration::from_secs(10), Duration::from_secs(10));
        assert_eq!(progress.fraction, 1.0);
    }

    #[test]
    fn non_finite_fraction_becomes_zero() {
        let progress = Progress::new(f64::NAN, Duration::ZERO, Duration::ZERO);
        assert_eq!(progress.fraction, 0.0);
    }
}
