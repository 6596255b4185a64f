mod clip;
mod error;
mod frame;
mod progress;

pub use clip::Clip;
pub use error::{PlayerError, PlayerResult};
pub use frame::{BYTES_PER_PIXEL, PixelLayout, VideoFrame};
pub use progress::Progress;
