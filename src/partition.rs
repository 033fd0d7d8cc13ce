// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Static partitioning of the frame range.  Every worker calls
//! `plan` with the same job and its own rank and gets back the slice
//! of frames it owns; nothing is negotiated at runtime, so the
//! function must stay pure.

use std::ops::Range;

use crate::error::FractalError;

/// Frames narrower than this are refused.
pub const MIN_FRAME_WIDTH: usize = 10;

/// The rank that owns the global buffer and writes the images.
pub const COORDINATOR: usize = 0;

/// Job-wide configuration.  Immutable once built.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FractalJob {
    frame_width: usize,
    frame_count: usize,
    worker_count: usize,
}

impl FractalJob {
    /// Validates the configuration errors: too narrow, no frames, no
    /// workers.  Divisibility is a partition concern and is left to
    /// `plan`.
    pub fn new(
        frame_width: usize,
        frame_count: usize,
        worker_count: usize,
    ) -> Result<FractalJob, FractalError> {
        if frame_width < MIN_FRAME_WIDTH {
            return Err(FractalError::FrameTooNarrow {
                minimum: MIN_FRAME_WIDTH,
            });
        }
        if frame_count < 1 {
            return Err(FractalError::NoFrames);
        }
        if worker_count < 1 {
            return Err(FractalError::NoWorkers);
        }
        Ok(FractalJob {
            frame_width,
            frame_count,
            worker_count,
        })
    }

    /// Pixels per side of each frame.
    pub fn frame_width(&self) -> usize {
        self.frame_width
    }

    /// Total frames in the animation.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Size of the worker group.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Frames per worker, if the frames divide evenly.
    pub fn range_len(&self) -> Option<usize> {
        if self.frame_count % self.worker_count == 0 {
            Some(self.frame_count / self.worker_count)
        } else {
            None
        }
    }

    /// Bytes in one frame.
    pub fn frame_len(&self) -> usize {
        self.frame_width * self.frame_width
    }
}

/// A half-open run of global frame indices owned by one worker.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameRange {
    start: usize,
    end: usize,
}

impl FrameRange {
    /// The frames `start..end`.  A range that runs backwards is
    /// refused.
    pub fn new(start: usize, end: usize) -> Result<FrameRange, FractalError> {
        if start > end {
            return Err(FractalError::BackwardsRange { start, end });
        }
        Ok(FrameRange { start, end })
    }

    /// First frame owned.
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last frame owned.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of frames in the range.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True when the range owns nothing.
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Whether `frame` belongs to this range.
    pub fn contains(&self, frame: usize) -> bool {
        frame >= self.start && frame < self.end
    }

    /// The range as an iterator over global frame indices.
    pub fn frames(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Position of a global frame within this range.
    pub fn local_index(&self, frame: usize) -> Option<usize> {
        if self.contains(frame) {
            Some(frame - self.start)
        } else {
            None
        }
    }
}

/// The frames owned by worker `rank`.
pub fn plan(job: &FractalJob, rank: usize) -> Result<FrameRange, FractalError> {
    let per_worker = job.range_len().ok_or(FractalError::Indivisible {
        frames: job.frame_count,
        workers: job.worker_count,
    })?;
    if rank >= job.worker_count {
        return Err(FractalError::NoSuchWorker {
            rank,
            workers: job.worker_count,
        });
    }
    Ok(FrameRange {
        start: rank * per_worker,
        end: (rank + 1) * per_worker,
    })
}

/// The worker that owns a given global frame.
pub fn owner(job: &FractalJob, frame: usize) -> Result<usize, FractalError> {
    let per_worker = job.range_len().ok_or(FractalError::Indivisible {
        frames: job.frame_count,
        workers: job.worker_count,
    })?;
    Ok(frame / per_worker)
}
