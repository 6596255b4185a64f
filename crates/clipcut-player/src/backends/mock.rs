//! In-process scripted backend.
//!
//! Stands in for the native engine wherever one is unavailable: tests,
//! headless embedders, CI. Commands are recorded in issue order and playback
//! events are fired explicitly by the driver via the `emit_*` methods.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use clipcut_types::{PixelLayout, PlayerError, PlayerResult};

use crate::backend::{MediaBackend, PlaybackListener, VideoOutput};

#[derive(Clone, Debug, PartialEq)]
pub enum MockCommand {
    Play(String),
    Pause,
    Resume,
    Stop,
    Seek(f64),
    SetVolume(u32),
    SetMute(bool),
    SetRate(f32),
    Detach,
    Release,
}

#[derive(Default)]
struct MockState {
    output: Option<Arc<dyn VideoOutput>>,
    listener: Option<Arc<dyn PlaybackListener>>,
    position: f64,
    time: Duration,
    length: Duration,
    playing: bool,
    released: bool,
    fail_teardown: bool,
}

pub struct MockBackend {
    state: Mutex<MockState>,
    commands: Mutex<Vec<MockCommand>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockState::default()),
            commands: Mutex::new(Vec::new()),
        })
    }

    /// Factory honoring the backend creation contract: an engine whose
    /// native libraries cannot be loaded fails here, before any facade
    /// sees a handle.
    pub fn create(available: bool) -> PlayerResult<Arc<Self>> {
        if !available {
            return Err(PlayerError::engine_unavailable(
                "mock engine flagged unavailable",
            ));
        }
        Ok(Self::new())
    }

    /// Makes `detach`/`release` fail, standing in for an engine whose
    /// native teardown calls error out.
    pub fn set_fail_teardown(&self, fail: bool) {
        self.state.lock().fail_teardown = fail;
    }

    fn record(&self, command: MockCommand) {
        self.commands.lock().push(command);
    }

    pub fn commands(&self) -> Vec<MockCommand> {
        self.commands.lock().clone()
    }

    pub fn take_commands(&self) -> Vec<MockCommand> {
        std::mem::take(&mut *self.commands.lock())
    }

    pub fn set_position(&self, fraction: f64) {
        self.state.lock().position = fraction;
    }

    pub fn set_time(&self, time: Duration) {
        self.state.lock().time = time;
    }

    pub fn set_length(&self, length: Duration) {
        self.state.lock().length = length;
    }

    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }

    // Event emitters call the registered sinks outside the state lock so a
    // sink issuing a command back into the mock cannot deadlock.

    pub fn emit_format(&self, width: u32, height: u32, layout: PixelLayout) {
        let output = self.state.lock().output.clone();
        if let Some(output) = output {
            output.negotiate(width, height, layout);
        }
    }

    pub fn emit_frame(&self, pixels: &[u8]) {
        let output = self.state.lock().output.clone();
        if let Some(output) = output {
            output.display(pixels);
        }
    }

    pub fn emit_stream_teardown(&self) {
        let output = self.state.lock().output.clone();
        if let Some(output) = output {
            output.teardown();
        }
    }

    pub fn emit_time_changed(&self, current: Duration) {
        let listener = self.state.lock().listener.clone();
        if let Some(listener) = listener {
            listener.time_changed(current);
        }
    }

    pub fn emit_length_changed(&self, total: Duration) {
        self.state.lock().length = total;
        let listener = self.state.lock().listener.clone();
        if let Some(listener) = listener {
            listener.length_changed(total);
        }
    }

    pub fn emit_stopped(&self) {
        {
            let mut state = self.state.lock();
            state.playing = false;
        }
        let listener = self.state.lock().listener.clone();
        if let Some(listener) = listener {
            listener.stopped();
        }
    }
}

impl MediaBackend for MockBackend {
    fn attach_output(&self, output: Arc<dyn VideoOutput>) {
        self.state.lock().output = Some(output);
    }

    fn attach_listener(&self, listener: Arc<dyn PlaybackListener>) {
        self.state.lock().listener = Some(listener);
    }

    fn play(&self, url: &str) {
        self.record(MockCommand::Play(url.to_owned()));
        let mut state = self.state.lock();
        state.playing = true;
        state.position = 0.0;
        state.time = Duration::ZERO;
    }

    fn pause(&self) {
        self.record(MockCommand::Pause);
        self.state.lock().playing = false;
    }

    fn resume(&self) {
        self.record(MockCommand::Resume);
        self.state.lock().playing = true;
    }

    fn stop(&self) {
        self.record(MockCommand::Stop);
        self.state.lock().playing = false;
    }

    fn seek(&self, fraction: f64) {
        self.record(MockCommand::Seek(fraction));
        let mut state = self.state.lock();
        state.position = fraction;
        if !state.length.is_zero() {
            state.time = state.length.mul_f64(fraction.clamp(0.0, 1.0));
        }
    }

    fn set_volume(&self, volume: u32) {
        self.record(MockCommand::SetVolume(volume));
    }

    fn set_mute(&self, muted: bool) {
        self.record(MockCommand::SetMute(muted));
    }

    fn set_rate(&self, rate: f32) {
        self.record(MockCommand::SetRate(rate));
    }

    fn position(&self) -> f64 {
        self.state.lock().position
    }

    fn time(&self) -> Duration {
        self.state.lock().time
    }

    fn length(&self) -> Duration {
        self.state.lock().length
    }

    fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    fn detach(&self) -> PlayerResult<()> {
        self.record(MockCommand::Detach);
        let mut state = self.state.lock();
        if state.fail_teardown {
            return Err(PlayerError::teardown("mock detach failure"));
        }
        state.output = None;
        state.listener = None;
        Ok(())
    }

    fn release(&self) -> PlayerResult<()> {
        self.record(MockCommand::Release);
        let mut state = self.state.lock();
        if state.fail_teardown {
            return Err(PlayerError::teardown("mock release failure"));
        }
        state.released = true;
        Ok(())
    }
}
