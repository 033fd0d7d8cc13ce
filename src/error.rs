// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Everything that can stop a job.  Configuration and partition
//! errors are raised before any rendering starts; the rest can only
//! happen at the edges (the gather and the image sink).

use failure::Fail;
use std::path::Path;

/// The single error type for the library.
#[derive(Debug, Fail)]
pub enum FractalError {
    /// The frame is too narrow to be worth rendering.
    #[fail(display = "frame_width must be at least {}", minimum)]
    FrameTooNarrow {
        /// The smallest width we accept.
        minimum: usize,
    },

    /// A job needs at least one frame.
    #[fail(display = "num_frames must be at least 1")]
    NoFrames,

    /// A job needs at least one worker.
    #[fail(display = "worker count must be at least 1")]
    NoWorkers,

    /// The frame count does not split evenly over the workers.
    /// Every worker sees this, but only the coordinator reports it.
    #[fail(display = "#frames not multiple of #processors")]
    Indivisible {
        /// Requested frame count.
        frames: usize,
        /// Size of the worker group.
        workers: usize,
    },

    /// Asked for the range of a worker that is not in the group.
    #[fail(display = "worker {} is outside a group of {}", rank, workers)]
    NoSuchWorker {
        /// The rank that was asked for.
        rank: usize,
        /// Size of the worker group.
        workers: usize,
    },

    /// A frame range whose end comes before its start.
    #[fail(display = "frame range {}..{} runs backwards", start, end)]
    BackwardsRange {
        /// First frame asked for.
        start: usize,
        /// One past the last frame asked for.
        end: usize,
    },

    /// Escape parameters the kernel cannot honour.
    #[fail(display = "invalid escape parameters: {}", _0)]
    EscapeParams(String),

    /// A raw buffer that does not have `frames * width * width` bytes.
    #[fail(display = "buffer holds {} bytes, expected {}", actual, expected)]
    BufferSize {
        /// What the frame geometry needs.
        expected: usize,
        /// What was handed over.
        actual: usize,
    },

    /// A worker contributed a buffer of the wrong length to the gather.
    #[fail(display = "worker {} contributed {} bytes to the gather, expected {}", rank, actual, expected)]
    GatherMismatch {
        /// The offending worker.
        rank: usize,
        /// The coordinator's own contribution length.
        expected: usize,
        /// What arrived.
        actual: usize,
    },

    /// The group fell apart in the middle of a collective.
    #[fail(display = "worker group disconnected during {}", _0)]
    Disconnected(&'static str),

    /// A worker thread panicked.
    #[fail(display = "worker {} panicked", _0)]
    WorkerPanicked(usize),

    /// The group finished without the coordinator producing frames.
    #[fail(display = "the coordinator returned no frames")]
    NoCoordinatorOutput,

    /// Could not create an output file or directory.
    #[fail(display = "could not write {}: {}", path, cause)]
    Io {
        /// Path being written.
        path: String,
        /// Underlying failure.
        #[fail(cause)]
        cause: std::io::Error,
    },

    /// The image encoder refused the frame.
    #[fail(display = "could not encode {}: {}", path, cause)]
    Encode {
        /// Path being written.
        path: String,
        /// Underlying failure.
        #[fail(cause)]
        cause: image::ImageError,
    },
}

impl FractalError {
    /// Wrap an I/O error with the path that caused it.
    pub fn io(path: &Path, cause: std::io::Error) -> Self {
        FractalError::Io {
            path: path.display().to_string(),
            cause,
        }
    }

    /// Wrap an encoder error with the path that caused it.
    pub fn encode(path: &Path, cause: image::ImageError) -> Self {
        FractalError::Encode {
            path: path.display().to_string(),
            cause,
        }
    }

    /// Partition failures are the "clean" kind: reported once, the
    /// job ends, nobody exits with an error status.
    pub fn is_clean_abort(&self) -> bool {
        match self {
            FractalError::Indivisible { .. } => true,
            _ => false,
        }
    }
}
