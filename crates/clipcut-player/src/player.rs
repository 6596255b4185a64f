//! Playback facade.
//!
//! Owns the native backend handle and the lifecycle of the frame sink, the
//! progress poller, the seek reconciler and the clip-loop governor. Commands
//! flow UI -> facade -> backend; signals flow backend -> sink/poller -> UI.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use clipcut_types::{Clip, PixelLayout, PlayerError, PlayerResult, Progress, VideoFrame};

use crate::backend::{MediaBackend, PlaybackListener};
use crate::clip_loop::ClipLoopGovernor;
use crate::frame_sink::FrameSink;
use crate::progress::ProgressSource;
use crate::seek::SeekReconciler;

/// Engine tuning constants.
///
/// The defaults are tuned to the native engine's internal update cadence:
/// polling faster than 250 ms yields no new information, and the seek guard
/// must outlast at least one position refresh. A different engine needs
/// these re-derived empirically, not copied.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub poll_period: Duration,
    pub seek_guard: Duration,
    pub loop_grace: Duration,
    pub restart_threshold: Duration,
    pub initial_volume: u32,
    pub initial_mute: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            poll_period: Duration::from_millis(250),
            seek_guard: Duration::from_millis(1000),
            loop_grace: Duration::from_millis(500),
            restart_threshold: Duration::from_secs(1),
            initial_volume: 100,
            initial_mute: false,
        }
    }
}

type FinishListener = Box<dyn Fn() + Send + Sync>;

/// State shared with the backend's event callbacks. Scoped to the facade
/// instance; dropped with it.
struct PlayerShared {
    backend: Arc<dyn MediaBackend>,
    governor: Mutex<ClipLoopGovernor>,
    seek: Mutex<SeekReconciler>,
    clip: Mutex<Option<Clip>>,
    current_url: Mutex<Option<String>>,
    last_length: Mutex<Duration>,
    finish: Mutex<Option<FinishListener>>,
    restart_threshold: Duration,
}

impl PlaybackListener for PlayerShared {
    fn time_changed(&self, current: Duration) {
        // At most one seek command per callback; the engine thread must not
        // be kept waiting.
        let total = self.backend.length();
        let target = self.governor.lock().on_time_changed(current, total);
        if let Some(fraction) = target {
            debug!(fraction, "clip loop snap-back");
            self.backend.seek(fraction);
        }
    }

    fn length_changed(&self, total: Duration) {
        *self.last_length.lock() = total;
    }

    fn stopped(&self) {
        let length = *self.last_length.lock();
        // Near-zero lengths are spurious stop events from single-image or
        // degenerate sources.
        if length <= self.restart_threshold {
            return;
        }
        let url = self.current_url.lock().clone();
        if let Some(url) = url {
            debug!(%url, "stream stopped; restarting from the beginning");
            self.backend.play(&url);
        }
        if let Some(listener) = self.finish.lock().as_ref() {
            listener();
        }
    }
}

pub struct Player {
    backend: Arc<dyn MediaBackend>,
    frame_sink: Arc<FrameSink>,
    progress: ProgressSource,
    shared: Arc<PlayerShared>,
    screenshot_seq: AtomicU64,
}

impl Player {
    /// Wires the engine together and starts progress monitoring. Must be
    /// called inside a tokio runtime context. Backend factories surface an
    /// unavailable engine before this point; here only the configuration
    /// can be rejected.
    pub fn new(backend: Arc<dyn MediaBackend>, config: PlayerConfig) -> PlayerResult<Self> {
        if config.poll_period.is_zero() {
            return Err(PlayerError::configuration(
                "poll_period must be greater than zero",
            ));
        }

        let frame_sink = FrameSink::new();
        backend.attach_output(frame_sink.clone());

        let shared = Arc::new(PlayerShared {
            backend: backend.clone(),
            governor: Mutex::new(ClipLoopGovernor::new(config.loop_grace)),
            seek: Mutex::new(SeekReconciler::new(config.seek_guard)),
            clip: Mutex::new(None),
            current_url: Mutex::new(None),
            last_length: Mutex::new(Duration::ZERO),
            finish: Mutex::new(None),
            restart_threshold: config.restart_threshold,
        });
        backend.attach_listener(shared.clone());

        backend.set_volume(config.initial_volume);
        backend.set_mute(config.initial_mute);

        let progress = ProgressSource::spawn(backend.clone(), config.poll_period);

        Ok(Self {
            backend,
            frame_sink,
            progress,
            shared,
            screenshot_seq: AtomicU64::new(0),
        })
    }

    // ---- signals -----------------------------------------------------

    /// Latest-frame slot. Readers consume on their own thread; the UI
    /// toolkit's dispatch thread is the expected consumer.
    pub fn frames(&self) -> watch::Receiver<Option<VideoFrame>> {
        self.frame_sink.subscribe()
    }

    pub fn progress(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// The arbitrated position for display: the drag value while scrubbing,
    /// the committed seek target inside the guard window, raw polled
    /// progress otherwise.
    pub fn displayed_fraction(&self) -> f64 {
        let progress = self.progress.latest();
        self.shared.seek.lock().display(progress.fraction, Instant::now())
    }

    // ---- transport ---------------------------------------------------

    /// Loads and plays a new source. The published frame is cleared first
    /// so the previous source never shows over the new one's loading
    /// period.
    pub fn play(&self, url: &str) {
        self.frame_sink.clear();
        *self.shared.current_url.lock() = Some(url.to_owned());
        self.backend.play(url);
    }

    pub fn pause(&self) {
        self.backend.pause();
    }

    pub fn resume(&self) {
        self.backend.resume();
    }

    pub fn toggle_resume(&self) {
        if self.backend.is_playing() {
            self.backend.pause();
        } else {
            self.backend.resume();
        }
    }

    // ---- seeking -----------------------------------------------------

    /// The user grabbed the seek control; display follows the drag from now
    /// on, without flooding the engine with intermediate seeks.
    pub fn begin_seek(&self) {
        self.shared.seek.lock().begin_scrub();
    }

    pub fn preview_seek(&self, fraction: f64) {
        self.shared.seek.lock().preview(fraction);
    }

    /// Commits a seek: coerced into the clip window while a loop is active,
    /// then issued to the engine exactly once.
    pub fn seek(&self, fraction: f64) {
        let total = self.backend.length();
        let clamped = self.shared.governor.lock().clamp(fraction, total);
        self.issue_seek(clamped);
    }

    fn issue_seek(&self, fraction: f64) {
        let fraction = self.shared.seek.lock().commit(fraction, Instant::now());
        self.backend.seek(fraction);
    }

    // ---- audio / rate ------------------------------------------------

    pub fn mute(&self) {
        self.backend.set_mute(true);
    }

    pub fn un_mute(&self) {
        self.backend.set_mute(false);
    }

    pub fn set_volume(&self, volume: u32) {
        self.backend.set_volume(volume);
    }

    pub fn set_speed(&self, rate: f32) {
        self.backend.set_rate(rate);
    }

    // ---- clip loop ---------------------------------------------------

    /// Replaces the configured clip bounds. An active loop always drops:
    /// its target is stale once either bound moves, and `None` removes the
    /// loop target entirely.
    pub fn set_clip(&self, clip: Option<Clip>) {
        *self.shared.clip.lock() = clip;
        self.shared.governor.lock().clip_edited();
    }

    /// Toggles looping over the configured clip. Enabling seeks straight to
    /// the clip start so the window is entered deterministically; disabling
    /// leaves the play-head where it is.
    pub fn loop_clip(&self, enabled: bool) {
        if !enabled {
            self.shared.governor.lock().disable();
            return;
        }
        let Some(clip) = *self.shared.clip.lock() else {
            debug!("loop requested without a configured clip");
            return;
        };
        let total = self.backend.length();
        let target = self.shared.governor.lock().enable(clip, total);
        if let Some(fraction) = target {
            self.issue_seek(fraction);
        }
    }

    // ---- misc --------------------------------------------------------

    /// Writes the currently published frame into `directory` as a PNG.
    /// The only user-facing failure of this engine; everything else
    /// degrades gracefully.
    pub fn take_screenshot(&self, directory: &Path) -> bool {
        let frame = self.frames().borrow().clone();
        let Some(frame) = frame else {
            debug!("screenshot requested with no published frame");
            return false;
        };
        let path = directory.join(self.screenshot_name());
        match write_frame_png(&path, &frame) {
            Ok(()) => true,
            Err(err) => {
                warn!(path = %path.display(), "screenshot write failed: {err}");
                false
            }
        }
    }

    fn screenshot_name(&self) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let seq = self.screenshot_seq.fetch_add(1, Ordering::Relaxed);
        PathBuf::from(format!("clipcut-{millis}-{seq}.png"))
    }

    /// Called once the implicit-restart path fires, which is the only
    /// "finished" this engine recognizes.
    pub fn set_finish_listener(&self, listener: impl Fn() + Send + Sync + 'static) {
        *self.shared.finish.lock() = Some(Box::new(listener));
    }

    /// Ordered, irreversible shutdown: stop polling, deregister callbacks,
    /// release the engine. Each step is attempted independently so one
    /// failed release does not prevent the others. No facade method is
    /// valid afterwards.
    pub fn terminate(&self) {
        self.progress.abort();
        if let Err(err) = self.backend.detach() {
            warn!("failed to deregister native callbacks: {err}");
        }
        if let Err(err) = self.backend.release() {
            warn!("failed to release playback engine: {err}");
        }
    }
}

fn write_frame_png(path: &Path, frame: &VideoFrame) -> Result<(), png::EncodingError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let mut encoder = png::Encoder::new(writer, frame.width, frame.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&rgba_pixels(frame))?;
    writer.finish()
}

fn rgba_pixels(frame: &VideoFrame) -> Vec<u8> {
    let mut pixels = frame.pixels.as_ref().to_vec();
    if frame.layout == PixelLayout::Bgra {
        for pixel in pixels.chunks_exact_mut(4) {
            pixel.swap(0, 2);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::{MockBackend, MockCommand};

    fn player_with(backend: &Arc<MockBackend>) -> Player {
        Player::new(backend.clone(), PlayerConfig::default()).expect("default config is valid")
    }

    #[tokio::test]
    async fn rejects_zero_poll_period() {
        let backend = MockBackend::new();
        let config = PlayerConfig {
            poll_period: Duration::ZERO,
            ..PlayerConfig::default()
        };
        let result = Player::new(backend, config).map(|_| ());
        assert!(matches!(result, Err(PlayerError::Configuration(_))));
    }

    #[tokio::test]
    async fn construction_applies_injected_audio_defaults() {
        let backend = MockBackend::new();
        let config = PlayerConfig {
            initial_volume: 60,
            initial_mute: true,
            ..PlayerConfig::default()
        };
        let _player = Player::new(backend.clone(), config).expect("valid config");
        let commands = backend.commands();
        assert!(commands.contains(&MockCommand::SetVolume(60)));
        assert!(commands.contains(&MockCommand::SetMute(true)));
    }

    #[tokio::test]
    async fn toggle_resume_follows_backend_state() {
        let backend = MockBackend::new();
        let player = player_with(&backend);
        backend.take_commands();

        player.toggle_resume();
        assert_eq!(backend.take_commands(), vec![MockCommand::Resume]);
        player.toggle_resume();
        assert_eq!(backend.take_commands(), vec![MockCommand::Pause]);
    }

    #[tokio::test]
    async fn audio_and_rate_commands_pass_through() {
        let backend = MockBackend::new();
        let player = player_with(&backend);
        backend.take_commands();

        player.mute();
        player.un_mute();
        player.set_volume(80);
        player.set_speed(1.5);
        assert_eq!(
            backend.take_commands(),
            vec![
                MockCommand::SetMute(true),
                MockCommand::SetMute(false),
                MockCommand::SetVolume(80),
                MockCommand::SetRate(1.5),
            ]
        );
    }

    #[tokio::test]
    async fn terminate_detaches_then_releases() {
        let backend = MockBackend::new();
        let player = player_with(&backend);
        backend.take_commands();

        player.terminate();
        assert_eq!(
            backend.take_commands(),
            vec![MockCommand::Detach, MockCommand::Release]
        );
        assert!(backend.is_released());
    }

    #[tokio::test]
    async fn terminate_attempts_every_step_despite_failures() {
        let backend = MockBackend::new();
        let player = player_with(&backend);
        backend.set_fail_teardown(true);
        backend.take_commands();

        // A failed detach must not prevent the release attempt.
        player.terminate();
        assert_eq!(
            backend.take_commands(),
            vec![MockCommand::Detach, MockCommand::Release]
        );
    }
}
