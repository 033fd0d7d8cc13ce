//! A contiguous block of depth values for a run of square frames,
//! indexed by (frame, row, column).  Workers fill one for their own
//! range; the coordinator ends up with one covering every frame.

use crate::error::FractalError;

/// Owned depth buffer.  Frames are stored one after another, each
/// row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    width: usize,
    frames: usize,
    depths: Vec<u8>,
}

impl FrameBuffer {
    /// A zeroed buffer for `frames` frames of `width` by `width`.
    pub fn new(width: usize, frames: usize) -> FrameBuffer {
        FrameBuffer {
            width,
            frames,
            depths: vec![0; frames * width * width],
        }
    }

    /// Adopt an existing run of depths, which must be exactly the
    /// right size.
    pub fn from_raw(width: usize, frames: usize, depths: Vec<u8>) -> Result<FrameBuffer, FractalError> {
        let expected = frames * width * width;
        if depths.len() != expected {
            return Err(FractalError::BufferSize {
                expected,
                actual: depths.len(),
            });
        }
        Ok(FrameBuffer {
            width,
            frames,
            depths,
        })
    }

    /// Pixels per side.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frames held.
    pub fn frame_count(&self) -> usize {
        self.frames
    }

    /// Bytes in one frame.
    pub fn frame_len(&self) -> usize {
        self.width * self.width
    }

    /// Total bytes held.
    pub fn len(&self) -> usize {
        self.depths.len()
    }

    /// True when the buffer holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    /// Linear position of (frame, row, col).
    #[inline]
    pub fn offset(&self, frame: usize, row: usize, col: usize) -> usize {
        debug_assert!(frame < self.frames && row < self.width && col < self.width);
        (frame * self.width + row) * self.width + col
    }

    /// Depth at (frame, row, col).
    pub fn get(&self, frame: usize, row: usize, col: usize) -> u8 {
        self.depths[self.offset(frame, row, col)]
    }

    /// Store a depth at (frame, row, col).
    pub fn set(&mut self, frame: usize, row: usize, col: usize, depth: u8) {
        let offset = self.offset(frame, row, col);
        self.depths[offset] = depth;
    }

    /// One frame's pixels, row-major.
    pub fn frame(&self, frame: usize) -> &[u8] {
        let len = self.frame_len();
        &self.depths[frame * len..(frame + 1) * len]
    }

    /// One frame's pixels, mutable.
    pub fn frame_mut(&mut self, frame: usize) -> &mut [u8] {
        let len = self.frame_len();
        &mut self.depths[frame * len..(frame + 1) * len]
    }

    /// Every frame in order.
    pub fn frames(&self) -> std::slice::Chunks<u8> {
        self.depths.chunks(self.frame_len())
    }

    /// The raw depths.
    pub fn as_slice(&self) -> &[u8] {
        &self.depths
    }

    /// Give up the buffer.
    pub fn into_raw(self) -> Vec<u8> {
        self.depths
    }
}
