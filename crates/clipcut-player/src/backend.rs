use std::sync::Arc;
use std::time::Duration;

use clipcut_types::{PixelLayout, PlayerResult};

/// Receiver for decoded pixel buffers, registered with the backend as the
/// active video output target.
///
/// Both callbacks arrive on a thread owned by the native engine. `display`
/// must not retain the borrowed buffer past the call; the backend is free to
/// reuse or free it immediately afterwards.
pub trait VideoOutput: Send + Sync {
    /// Format negotiation, fired once per stream before the first frame.
    /// The buffer handed to every subsequent `display` call is tightly
    /// packed `width * height * 4` bytes in the given layout.
    fn negotiate(&self, width: u32, height: u32, layout: PixelLayout);

    /// One decoded frame. Work done here must stay well under a millisecond
    /// or the engine's render thread stalls.
    fn display(&self, pixels: &[u8]);

    /// The stream is being torn down; the negotiated format is void.
    fn teardown(&self);
}

/// Playback event callbacks, also delivered on engine-owned threads.
///
/// Time-changed events fire more frequently than the polled progress signal
/// but are not synchronized with frame delivery.
pub trait PlaybackListener: Send + Sync {
    fn time_changed(&self, current: Duration);
    fn length_changed(&self, total: Duration);
    fn stopped(&self);
}

/// The opaque native playback engine.
///
/// Command methods are fire-and-forget: the engine applies them
/// asynchronously and anomalies degrade gracefully rather than surfacing as
/// errors. Callers are expected to serialize command issuance; the trait
/// adds no locking of its own. Factories constructing a backend return
/// `PlayerResult` so an unavailable engine surfaces as a creation failure,
/// not a half-initialized handle.
pub trait MediaBackend: Send + Sync {
    fn attach_output(&self, output: Arc<dyn VideoOutput>);
    fn attach_listener(&self, listener: Arc<dyn PlaybackListener>);

    /// Load and start playing a new source.
    fn play(&self, url: &str);
    fn pause(&self);
    fn resume(&self);
    fn stop(&self);
    /// Move the play-head to a position fraction in `[0, 1]`.
    fn seek(&self, fraction: f64);
    fn set_volume(&self, volume: u32);
    fn set_mute(&self, muted: bool);
    fn set_rate(&self, rate: f32);

    /// Current play-head position as a fraction of the total length.
    fn position(&self) -> f64;
    /// Current play-head time. Reported by the engine on its own update
    /// cadence; stale for a short window after a seek.
    fn time(&self) -> Duration;
    fn length(&self) -> Duration;
    fn is_playing(&self) -> bool;

    /// Deregister all callbacks previously attached.
    fn detach(&self) -> PlayerResult<()>;
    /// Release the engine instance. Nothing may be called afterwards.
    fn release(&self) -> PlayerResult<()>;
}
