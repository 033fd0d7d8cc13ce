// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The zoom schedule.  Every frame looks at a square window around
//! the same point, and each frame's window is a fixed fraction of
//! the previous one.
//!
//! A worker does not replay the schedule from frame zero.  It seeds
//! its delta with `decay^start` once and then multiplies by `decay`
//! before each of its frames, so two workers can disagree with a
//! single sequential run in the last bit of delta.  Reference
//! renders are made this way, so that is the path reproduced here.

use num::Complex;

use crate::planes::FramePlane;

/// Half-width of the window before the first decay step.
pub const BASE_DELTA: f64 = 0.005491;

/// The point every frame is centered on.
pub const X_MID: f64 = 0.745796;
/// See `X_MID`.
pub const Y_MID: f64 = 0.105089;

/// Per-frame shrink factor of the window.
pub const DECAY: f64 = 0.99;

/// Where the animation looks and how fast it closes in.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ZoomParams {
    /// Half-width of the window before any decay.
    pub base_delta: f64,
    /// Window center.
    pub center: Complex<f64>,
    /// Applied once per frame.
    pub decay: f64,
}

impl Default for ZoomParams {
    fn default() -> Self {
        ZoomParams {
            base_delta: BASE_DELTA,
            center: Complex::new(X_MID, Y_MID),
            decay: DECAY,
        }
    }
}

impl ZoomParams {
    /// The schedule as seen by a worker whose first frame is `start`.
    pub fn starting_at(&self, start: usize) -> ZoomState {
        ZoomState {
            delta: self.base_delta * self.decay.powf(start as f64),
            decay: self.decay,
            center: self.center,
            frame: start,
        }
    }
}

/// One worker's walk through the schedule.  Yields each frame index
/// together with that frame's half-width; never shared between
/// workers.
#[derive(Clone, Debug)]
pub struct ZoomState {
    delta: f64,
    decay: f64,
    center: Complex<f64>,
    frame: usize,
}

/// A single frame's place in the schedule.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameZoom {
    /// Global frame index.
    pub frame: usize,
    /// Half-width of the window.
    pub delta: f64,
    /// Window center.
    pub center: Complex<f64>,
}

impl FrameZoom {
    /// The pixel-to-point mapping for this frame.
    pub fn plane(&self, width: usize) -> FramePlane {
        FramePlane::new(self.center, self.delta, width)
    }
}

impl ZoomState {
    /// The frame the next call to `next()` produces.
    pub fn frame(&self) -> usize {
        self.frame
    }
}

impl Iterator for ZoomState {
    type Item = FrameZoom;

    fn next(&mut self) -> Option<FrameZoom> {
        self.delta *= self.decay;
        let zoom = FrameZoom {
            frame: self.frame,
            delta: self.delta,
            center: self.center,
        };
        self.frame += 1;
        Some(zoom)
    }
}
