// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The frame renderer.  Walks a worker's range through the zoom
//! schedule and runs the kernel over every pixel of every frame,
//! filling that worker's local buffer.
//!
//! Pixels don't depend on each other, so inside a frame the rows can
//! be split into bands and handed to scoped threads.  The bands are
//! disjoint slices of the frame, so no locking is needed and the
//! output is the same no matter how many threads are used.

use itertools::iproduct;

use crate::buffer::FrameBuffer;
use crate::error::FractalError;
use crate::kernel::{depth, EscapeParams};
use crate::partition::FrameRange;
use crate::planes::{FramePlane, Pixel};
use crate::zoom::ZoomParams;

/// Everything the renderer needs besides the job geometry.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderSettings {
    /// The zoom schedule.
    pub zoom: ZoomParams,
    /// The kernel's knobs.
    pub escape: EscapeParams,
    /// Threads per worker for row bands.  1 renders on the calling
    /// thread.
    pub threads: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            zoom: ZoomParams::default(),
            escape: EscapeParams::default(),
            threads: 1,
        }
    }
}

/// Fill one frame's pixels in `rows`, which starts at `first_row`.
fn render_rows(plane: &FramePlane, escape: &EscapeParams, first_row: usize, rows: &mut [u8]) {
    let width = plane.width;
    let height = rows.len() / width;
    for (row, col) in iproduct!(0..height, 0..width) {
        let point = plane.pixel_to_point(&Pixel(col, first_row + row));
        rows[row * width + col] = depth(point, escape);
    }
}

/// A frame needs at least one pixel per side.
fn check_width(width: usize) -> Result<(), FractalError> {
    if width == 0 {
        return Err(FractalError::FrameTooNarrow { minimum: 1 });
    }
    Ok(())
}

/// Fill a whole frame, splitting its rows into `threads` bands.
pub fn render_frame(
    plane: &FramePlane,
    escape: &EscapeParams,
    threads: usize,
    pixels: &mut [u8],
) -> Result<(), FractalError> {
    check_width(plane.width)?;
    if pixels.len() != plane.len() {
        return Err(FractalError::BufferSize {
            expected: plane.len(),
            actual: pixels.len(),
        });
    }
    if threads <= 1 {
        render_rows(plane, escape, 0, pixels);
        return Ok(());
    }

    let band = (plane.width + threads - 1) / threads;
    crossbeam::scope(|spawner| {
        for (i, rows) in pixels.chunks_mut(band * plane.width).enumerate() {
            spawner.spawn(move |_| render_rows(plane, escape, i * band, rows));
        }
    })
    .map_err(|_| FractalError::WorkerPanicked(0))
}

/// Render every frame of `range` into a fresh local buffer.
pub fn render_range(
    range: &FrameRange,
    width: usize,
    settings: &RenderSettings,
) -> Result<FrameBuffer, FractalError> {
    check_width(width)?;
    let mut buffer = FrameBuffer::new(width, range.len());
    let schedule = settings.zoom.starting_at(range.start()).take(range.len());
    for (local, zoom) in schedule.enumerate() {
        trace!("frame {} delta {:e}", zoom.frame, zoom.delta);
        let plane = zoom.plane(width);
        render_frame(&plane, &settings.escape, settings.threads, buffer.frame_mut(local))?;
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zoom::{BASE_DELTA, X_MID, Y_MID};
    use num::Complex;

    #[test]
    fn first_pixel_matches_the_kernel() {
        let settings = RenderSettings::default();
        let buffer = render_range(&FrameRange::new(0, 2).unwrap(), 10, &settings).unwrap();
        assert_eq!(buffer.len(), 200);

        let delta = BASE_DELTA * 0.99;
        let c = Complex::new(-(X_MID - delta), -(Y_MID - delta));
        assert_eq!(buffer.get(0, 0, 0), depth(c, &settings.escape));

        let delta = BASE_DELTA * 0.99 * 0.99;
        let dw = 2.0 * delta / 10.0;
        let c = Complex::new(-(X_MID - delta) - 7.0 * dw, -(Y_MID - delta) - 4.0 * dw);
        assert_eq!(buffer.get(1, 4, 7), depth(c, &settings.escape));
    }

    #[test]
    fn bands_match_a_single_thread() {
        let single = render_range(&FrameRange::new(3, 5).unwrap(), 37, &RenderSettings::default()).unwrap();
        for threads in &[2, 3, 5, 8, 64] {
            let settings = RenderSettings {
                threads: *threads,
                ..RenderSettings::default()
            };
            let banded = render_range(&FrameRange::new(3, 5).unwrap(), 37, &settings).unwrap();
            assert_eq!(single, banded);
        }
    }

    #[test]
    fn a_range_seeds_its_own_schedule() {
        let settings = RenderSettings::default();
        let buffer = render_range(&FrameRange::new(4, 6).unwrap(), 12, &settings).unwrap();
        let zoom = settings.zoom.starting_at(4).nth(1).unwrap();
        assert_eq!(zoom.frame, 5);
        let mut expected = vec![0u8; 144];
        render_frame(&zoom.plane(12), &settings.escape, 1, &mut expected).unwrap();
        assert_eq!(buffer.frame(1), &expected[..]);
    }

    #[test]
    fn zero_width_is_refused() {
        let settings = RenderSettings::default();
        match render_range(&FrameRange::new(0, 1).unwrap(), 0, &settings) {
            Err(FractalError::FrameTooNarrow { minimum }) => assert_eq!(minimum, 1),
            other => panic!("unexpected {:?}", other),
        }
        let plane = settings.zoom.starting_at(0).next().unwrap().plane(0);
        for threads in &[1, 4] {
            assert!(render_frame(&plane, &settings.escape, *threads, &mut []).is_err());
        }
    }

    #[test]
    fn mismatched_frame_buffer_is_refused() {
        let settings = RenderSettings::default();
        let plane = settings.zoom.starting_at(0).next().unwrap().plane(10);
        let mut short = vec![0u8; 99];
        assert!(render_frame(&plane, &settings.escape, 2, &mut short).is_err());
    }

    #[test]
    fn zoomed_frames_show_structure() {
        let buffer = render_range(&FrameRange::new(0, 1).unwrap(), 40, &RenderSettings::default()).unwrap();
        let first = buffer.frame(0)[0];
        assert!(buffer.frame(0).iter().any(|&d| d != first));
    }
}
