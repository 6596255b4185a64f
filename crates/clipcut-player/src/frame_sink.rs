//! FrameBuffer bridge between the native render callback and the UI.
//!
//! The native buffer's lifetime ends with the callback, so each frame is
//! copied into a scratch buffer that is reused for the whole stream, then
//! published as an immutable snapshot into a single-slot watch channel.
//! Last write wins; there is no queue because only the newest frame matters.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use clipcut_types::{PixelLayout, VideoFrame};

use crate::backend::VideoOutput;

#[derive(Clone, Copy)]
struct NegotiatedFormat {
    width: u32,
    height: u32,
    layout: PixelLayout,
}

#[derive(Default)]
struct SinkState {
    format: Option<NegotiatedFormat>,
    scratch: Vec<u8>,
}

pub struct FrameSink {
    state: Mutex<SinkState>,
    frames_tx: watch::Sender<Option<VideoFrame>>,
}

impl FrameSink {
    pub fn new() -> Arc<Self> {
        let (frames_tx, _) = watch::channel(None);
        Arc::new(Self {
            state: Mutex::new(SinkState::default()),
            frames_tx,
        })
    }

    /// New read handle on the latest-frame slot. `None` means no frame is
    /// available (nothing decoded yet, or the source was just switched).
    pub fn subscribe(&self) -> watch::Receiver<Option<VideoFrame>> {
        self.frames_tx.subscribe()
    }

    /// Empty the published slot and forget the negotiated format, so a
    /// stale frame from the previous source can never be shown over the
    /// next one's loading period.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.format = None;
        drop(state);
        self.frames_tx.send_replace(None);
    }
}

impl VideoOutput for FrameSink {
    fn negotiate(&self, width: u32, height: u32, layout: PixelLayout) {
        let mut state = self.state.lock();
        state.scratch.clear();
        state
            .scratch
            .resize(VideoFrame::expected_len(width, height), 0);
        state.format = Some(NegotiatedFormat {
            width,
            height,
            layout,
        });
    }

    fn display(&self, pixels: &[u8]) {
        let mut state = self.state.lock();
        let Some(format) = state.format else {
            // Render callback raced ahead of format negotiation.
            debug!("dropping frame delivered before format negotiation");
            return;
        };
        let expected = VideoFrame::expected_len(format.width, format.height);
        if pixels.len() < expected {
            warn!(
                got = pixels.len(),
                expected, "dropping short frame buffer from native engine"
            );
            return;
        }
        state.scratch.copy_from_slice(&pixels[..expected]);
        let snapshot: Arc<[u8]> = Arc::from(state.scratch.as_slice());
        let frame = VideoFrame::new(format.width, format.height, format.layout, snapshot);
        drop(state);
        self.frames_tx.send_replace(Some(frame));
    }

    fn teardown(&self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_before_negotiation_is_dropped() {
        let sink = FrameSink::new();
        let rx = sink.subscribe();
        sink.display(&[0xff; 16]);
        assert!(rx.borrow().is_none());
    }

    #[test]
    fn negotiated_frame_is_published() {
        let sink = FrameSink::new();
        let rx = sink.subscribe();
        sink.negotiate(2, 2, PixelLayout::Bgra);
        sink.display(&[0xaa; 16]);
        let frame = rx.borrow().clone().expect("frame published");
        assert_eq!(frame.width, 2);
        assert_eq!(frame.height, 2);
        assert_eq!(frame.pixels.as_ref(), &[0xaa; 16]);
    }

    #[test]
    fn later_frame_replaces_earlier_one() {
        let sink = FrameSink::new();
        let rx = sink.subscribe();
        sink.negotiate(1, 1, PixelLayout::Rgba);
        sink.display(&[1, 2, 3, 4]);
        sink.display(&[5, 6, 7, 8]);
        let frame = rx.borrow().clone().expect("frame published");
        assert_eq!(frame.pixels.as_ref(), &[5, 6, 7, 8]);
    }

    #[test]
    fn published_frames_are_independent_snapshots() {
        let sink = FrameSink::new();
        let rx = sink.subscribe();
        sink.negotiate(1, 1, PixelLayout::Bgra);
        sink.display(&[1, 1, 1, 1]);
        let first = rx.borrow().clone().expect("frame published");
        sink.display(&[2, 2, 2, 2]);
        // Scratch reuse must not mutate the previously published snapshot.
        assert_eq!(first.pixels.as_ref(), &[1, 1, 1, 1]);
    }

    #[test]
    fn short_buffer_is_dropped() {
        let sink = FrameSink::new();
        let rx = sink.subscribe();
        sink.negotiate(2, 2, PixelLayout::Bgra);
        sink.display(&[0u8; 8]);
        assert!(rx.borrow().is_none());
    }

    #[test]
    fn clear_empties_slot_and_voids_format() {
        let sink = FrameSink::new();
        let rx = sink.subscribe();
        sink.negotiate(1, 1, PixelLayout::Bgra);
        sink.display(&[9; 4]);
        sink.clear();
        assert!(rx.borrow().is_none());
        // Frames of the torn-down stream no longer pass.
        sink.display(&[9; 4]);
        assert!(rx.borrow().is_none());
    }
}
