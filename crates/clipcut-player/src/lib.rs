pub mod backend;
pub mod backends;

mod clip_loop;
mod frame_sink;
mod player;
mod progress;
mod seek;

pub use backend::{MediaBackend, PlaybackListener, VideoOutput};
pub use clip_loop::ClipLoopGovernor;
pub use frame_sink::FrameSink;
pub use player::{Player, PlayerConfig};
pub use progress::ProgressSource;
pub use seek::SeekReconciler;

pub use clipcut_types::{Clip, PixelLayout, PlayerError, PlayerResult, Progress, VideoFrame};
