use std::sync::Arc;

/// The 32-bit-per-pixel channel order negotiated once per stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelLayout {
    /// Little-endian RV32 output, the common native decoder default.
    #[default]
    Bgra,
    Rgba,
}

pub const BYTES_PER_PIXEL: usize = 4;

/// An immutable snapshot of one decoded video frame.
///
/// The pixel data is shared, never mutated after publication; cloning a
/// frame clones the `Arc`, not the pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub pixels: Arc<[u8]>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, layout: PixelLayout, pixels: Arc<[u8]>) -> Self {
        Self {
            width,
            height,
            layout,
            pixels,
        }
    }

    /// Tightly packed: one row is exactly `width * 4` bytes.
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    pub fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * BYTES_PER_PIXEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_matches_packed_rows() {
        let pixels: Arc<[u8]> = Arc::from(vec![0u8; 2 * 3 * 4].into_boxed_slice());
        let frame = VideoFrame::new(2, 3, PixelLayout::Bgra, pixels);
        assert_eq!(frame.stride(), 8);
        assert_eq!(frame.pixels.len(), VideoFrame::expected_len(2, 3));
    }

    #[test]
    fn clone_shares_pixels() {
        let pixels: Arc<[u8]> = Arc::from(vec![7u8; 4].into_boxed_slice());
        let frame = VideoFrame::new(1, 1, PixelLayout::Rgba, pixels);
        let copy = frame.clone();
        assert!(Arc::ptr_eq(&frame.pixels, &copy.pixels));
    }
}
