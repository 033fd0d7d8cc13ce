#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Zooming fractal renderer
//!
//! Renders an animation that dives into the Mandelbrot set: every
//! frame looks at the same point through a window one percent
//! narrower than the frame before it.  Each pixel holds the
//! escape-time "depth" of its point, so a frame is just a square of
//! bytes.
//!
//! The frames are split statically across a fixed group of workers.
//! Each worker works out its own contiguous run of frames from its
//! rank alone, renders them into a private buffer, and then the whole
//! group meets in a gather that concatenates every buffer, in rank
//! order, on the coordinator (rank 0).  Only the coordinator writes
//! images.
//!
//! ```no_run
//! use fractalzoom::{run_job, FractalJob, RenderSettings};
//!
//! let job = FractalJob::new(200, 8, 4).unwrap();
//! let output = run_job(&job, &RenderSettings::default()).unwrap();
//! assert_eq!(output.frames.frame_count(), 8);
//! ```

extern crate crossbeam;
extern crate failure;
extern crate image;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;

pub mod buffer;
pub mod collective;
pub mod error;
pub mod job;
pub mod kernel;
pub mod partition;
pub mod planes;
pub mod render;
pub mod sink;
pub mod zoom;

pub use buffer::FrameBuffer;
pub use collective::{Collective, Endpoint, ThreadGroup};
pub use error::FractalError;
pub use job::{run_job, run_worker, JobOutput};
pub use kernel::{depth, EscapeParams};
pub use partition::{plan, FractalJob, FrameRange, COORDINATOR};
pub use render::{render_range, RenderSettings};
pub use sink::{write_frames, ImageKind};
pub use zoom::{ZoomParams, ZoomState};
