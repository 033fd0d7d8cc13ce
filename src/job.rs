// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! What each worker does, and how a group of them is started and
//! torn down.
//!
//! A worker plans its range, waits for the rest of the group, renders
//! its frames, and hands them to the gather.  Only the coordinator
//! comes back with anything: every frame of the job, in order, plus
//! how long the compute phase took.

use std::time::{Duration, Instant};

use crate::buffer::FrameBuffer;
use crate::collective::{Collective, Endpoint, ThreadGroup};
use crate::error::FractalError;
use crate::partition::{plan, FractalJob};
use crate::render::{render_range, RenderSettings};

/// What the coordinator holds when the job is done.
#[derive(Debug)]
pub struct JobOutput {
    /// Every frame, in global order.
    pub frames: FrameBuffer,
    /// From the start barrier to the end of the gather.
    pub compute_time: Duration,
}

/// Run one worker's share of `job`.
///
/// A partition error is returned by every worker before it touches
/// the group, so nobody is left waiting at a barrier.
pub fn run_worker<C: Collective>(
    group: &C,
    job: &FractalJob,
    settings: &RenderSettings,
) -> Result<Option<JobOutput>, FractalError> {
    let range = plan(job, group.rank())?;
    if group.is_coordinator() {
        info!("{} workers, {} frames each", group.size(), range.len());
    }
    debug!("worker {} owns frames {}..{}", group.rank(), range.start(), range.end());

    group.barrier()?;
    let start = Instant::now();

    let local = render_range(&range, job.frame_width(), settings)?;
    debug!("worker {} rendered {} frames", group.rank(), local.frame_count());

    let gathered = group.gather(local.into_raw())?;
    let compute_time = start.elapsed();

    match gathered {
        Some(all) => {
            let frames = FrameBuffer::from_raw(job.frame_width(), job.frame_count(), all)?;
            Ok(Some(JobOutput {
                frames,
                compute_time,
            }))
        }
        None => Ok(None),
    }
}

/// Start a group of `job.worker_count()` threads, run every worker,
/// and tear the group down.  Returns the coordinator's output.
///
/// A worker that fails or panics breaks the group, so the others come
/// back with `Disconnected`; the failure that caused it is the one
/// reported.
pub fn run_job(job: &FractalJob, settings: &RenderSettings) -> Result<JobOutput, FractalError> {
    run_group(job.worker_count(), |endpoint| run_worker(endpoint, job, settings))
}

fn run_group<F>(size: usize, body: F) -> Result<JobOutput, FractalError>
where
    F: Fn(&Endpoint) -> Result<Option<JobOutput>, FractalError> + Sync,
{
    let body = &body;
    let endpoints = ThreadGroup::new(size);
    let results: Vec<Result<Option<JobOutput>, FractalError>> = crossbeam::scope(|spawner| {
        let handles: Vec<_> = endpoints
            .into_iter()
            .map(|endpoint| spawner.spawn(move |_| body(&endpoint)))
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| {
                handle
                    .join()
                    .unwrap_or(Err(FractalError::WorkerPanicked(rank)))
            })
            .collect()
    })
    .map_err(|_| FractalError::WorkerPanicked(0))?;

    let mut output = None;
    let mut failure: Option<FractalError> = None;
    for result in results {
        match result {
            Ok(Some(done)) => output = Some(done),
            Ok(None) => {}
            Err(err) => {
                if failure.as_ref().map_or(true, |seen| severity(&err) > severity(seen)) {
                    failure = Some(err);
                }
            }
        }
    }
    if let Some(err) = failure {
        warn!("worker group failed: {}", err);
        return Err(err);
    }
    output.ok_or(FractalError::NoCoordinatorOutput)
}

/// Disconnects are fallout from some other worker's failure.
fn severity(err: &FractalError) -> u8 {
    match *err {
        FractalError::WorkerPanicked(_) => 2,
        FractalError::Disconnected(_) => 0,
        _ => 1,
    }
}
