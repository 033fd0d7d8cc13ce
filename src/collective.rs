// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Collective operations over a fixed group of workers.
//!
//! Every member of the group has a stable rank in `0..size` and runs
//! the same program.  The two collectives are blocking for every
//! member: `barrier` returns once all members have called it, and
//! `gather` returns once all members have contributed.  Every member
//! must call each collective the same number of times, in the same
//! order.  A member that is still alive but never arrives stalls the
//! group; there is no timeout.
//!
//! `ThreadGroup` implements the group with one thread per member.
//! Contributions travel to the coordinator over a channel, so a local
//! buffer changes hands by being moved rather than shared.  Dropping
//! an `Endpoint` (a worker returning early, or unwinding from a
//! panic) breaks the group: every member waiting in, or later
//! entering, a collective that can no longer complete gets
//! `FractalError::Disconnected` instead of blocking.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crossbeam::channel::{unbounded, Receiver, Sender};

use crate::error::FractalError;
use crate::partition::COORDINATOR;

/// A member's view of its group.
pub trait Collective {
    /// This member's 0-based identity.
    fn rank(&self) -> usize;

    /// Number of members in the group.
    fn size(&self) -> usize;

    /// True for the member that receives gathered data.
    fn is_coordinator(&self) -> bool {
        self.rank() == COORDINATOR
    }

    /// Block until every member has reached the barrier.
    fn barrier(&self) -> Result<(), FractalError>;

    /// Concatenate every member's `local` in rank order.  The
    /// coordinator gets `Some(all)`; everyone else gets `None`.  All
    /// contributions must be the same length.  Blocks until every
    /// member has called it.
    fn gather(&self, local: Vec<u8>) -> Result<Option<Vec<u8>>, FractalError>;
}

type Contribution = (usize, Vec<u8>);

struct Arrivals {
    arrived: usize,
    generation: u64,
    broken: bool,
}

/// A reusable barrier that a departing member can break.
struct Rendezvous {
    size: usize,
    state: Mutex<Arrivals>,
    wakeup: Condvar,
}

impl Rendezvous {
    fn new(size: usize) -> Rendezvous {
        Rendezvous {
            size,
            state: Mutex::new(Arrivals {
                arrived: 0,
                generation: 0,
                broken: false,
            }),
            wakeup: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<Arrivals> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait(&self) -> Result<(), FractalError> {
        let mut state = self.lock();
        if state.broken {
            return Err(FractalError::Disconnected("barrier"));
        }
        let generation = state.generation;
        state.arrived += 1;
        if state.arrived == self.size {
            state.arrived = 0;
            state.generation += 1;
            self.wakeup.notify_all();
            return Ok(());
        }
        // A release of our generation wins over a later break.
        while state.generation == generation && !state.broken {
            state = self.wakeup.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        if state.generation != generation {
            Ok(())
        } else {
            Err(FractalError::Disconnected("barrier"))
        }
    }

    fn leave(&self) {
        self.lock().broken = true;
        self.wakeup.notify_all();
    }
}

/// Bootstraps a group whose members are threads of this process.
pub struct ThreadGroup;

impl ThreadGroup {
    /// One endpoint per rank, in rank order.  Hand each to its own
    /// thread.
    pub fn new(size: usize) -> Vec<Endpoint> {
        let rendezvous = Arc::new(Rendezvous::new(size));
        let (sender, receiver) = unbounded();
        // Only the other members hold senders, so the coordinator's
        // inbox disconnects once all of them are gone.
        let mut inbox = Some(receiver);
        (0..size)
            .map(|rank| {
                let coordinator = if rank == COORDINATOR { inbox.take() } else { None };
                Endpoint {
                    rank,
                    size,
                    rendezvous: rendezvous.clone(),
                    role: coordinator
                        .map(Role::Coordinator)
                        .unwrap_or_else(|| Role::Member(sender.clone())),
                }
            })
            .collect()
    }
}

enum Role {
    Coordinator(Receiver<Contribution>),
    Member(Sender<Contribution>),
}

/// One member of a `ThreadGroup`.
pub struct Endpoint {
    rank: usize,
    size: usize,
    rendezvous: Arc<Rendezvous>,
    role: Role,
}

impl Endpoint {
    /// Collect everyone else's contribution next to `own`.  A length
    /// mismatch is held back until the closing barrier has been
    /// passed; a disconnect is returned at once.
    fn receive_all(
        &self,
        inbox: &Receiver<Contribution>,
        own: Vec<u8>,
    ) -> Result<(Vec<u8>, Option<FractalError>), FractalError> {
        let chunk = own.len();
        let mut all = vec![0u8; chunk * self.size];
        all[self.rank * chunk..(self.rank + 1) * chunk].copy_from_slice(&own);
        let mut mismatch = None;
        for _ in 1..self.size {
            let (rank, data) = inbox
                .recv()
                .map_err(|_| FractalError::Disconnected("gather"))?;
            trace!("gather: {} bytes from worker {}", data.len(), rank);
            if data.len() != chunk {
                mismatch.get_or_insert(FractalError::GatherMismatch {
                    rank,
                    expected: chunk,
                    actual: data.len(),
                });
                continue;
            }
            all[rank * chunk..(rank + 1) * chunk].copy_from_slice(&data);
        }
        Ok((all, mismatch))
    }
}

impl Collective for Endpoint {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn barrier(&self) -> Result<(), FractalError> {
        self.rendezvous.wait()
    }

    fn gather(&self, local: Vec<u8>) -> Result<Option<Vec<u8>>, FractalError> {
        match self.role {
            Role::Coordinator(ref inbox) => {
                let (all, mismatch) = self.receive_all(inbox, local)?;
                self.rendezvous.wait()?;
                match mismatch {
                    Some(err) => Err(err),
                    None => Ok(Some(all)),
                }
            }
            Role::Member(ref sender) => {
                sender
                    .send((self.rank, local))
                    .map_err(|_| FractalError::Disconnected("gather"))?;
                self.rendezvous.wait()?;
                Ok(None)
            }
        }
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        self.rendezvous.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn run_group<F, R>(size: usize, body: F) -> Vec<R>
    where
        F: Fn(&Endpoint) -> R + Sync,
        R: Send,
    {
        let body = &body;
        crossbeam::scope(|spawner| {
            let handles: Vec<_> = ThreadGroup::new(size)
                .into_iter()
                .map(|endpoint| spawner.spawn(move |_| body(&endpoint)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
        .unwrap()
    }

    /// Run `body` on its own thread and give up if it has not come
    /// back within a few seconds.
    fn within_deadline<F, R>(body: F) -> R
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (done, result) = crossbeam::channel::bounded(1);
        thread::spawn(move || {
            let _ = done.send(body());
        });
        result
            .recv_timeout(Duration::from_secs(5))
            .expect("collective did not return")
    }

    #[test]
    fn ranks_are_stable_and_dense() {
        let endpoints = ThreadGroup::new(4);
        let ranks: Vec<usize> = endpoints.iter().map(|e| e.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
        assert!(endpoints.iter().all(|e| e.size() == 4));
        assert!(endpoints[0].is_coordinator());
        assert!(!endpoints[3].is_coordinator());
    }

    #[test]
    fn gather_concatenates_in_rank_order() {
        let results = run_group(5, |endpoint| {
            // Later ranks finish first.
            thread::sleep(Duration::from_millis(5 * (5 - endpoint.rank()) as u64));
            let marker = endpoint.rank() as u8 + 10;
            endpoint.gather(vec![marker; 3]).unwrap()
        });
        let expected: Vec<u8> = (0..5u8).flat_map(|r| vec![r + 10; 3]).collect();
        assert_eq!(results[0], Some(expected));
        assert!(results[1..].iter().all(|r| r.is_none()));
    }

    #[test]
    fn single_member_gathers_itself() {
        let endpoints = ThreadGroup::new(1);
        endpoints[0].barrier().unwrap();
        assert_eq!(endpoints[0].gather(vec![1, 2, 3]).unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn gather_blocks_until_everyone_arrives() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let arrived = AtomicUsize::new(0);
        let seen = run_group(4, |endpoint| {
            if endpoint.rank() == 3 {
                thread::sleep(Duration::from_millis(30));
            }
            arrived.fetch_add(1, Ordering::SeqCst);
            endpoint.gather(vec![0; 2]).unwrap();
            arrived.load(Ordering::SeqCst)
        });
        assert!(seen.iter().all(|&n| n == 4));
    }

    #[test]
    fn mismatched_lengths_fail_on_the_coordinator_only() {
        let results = run_group(3, |endpoint| {
            let len = if endpoint.rank() == 2 { 4 } else { 3 };
            endpoint.gather(vec![0; len])
        });
        match results[0] {
            Err(FractalError::GatherMismatch { rank, expected, actual }) => {
                assert_eq!((rank, expected, actual), (2, 3, 4))
            }
            ref other => panic!("unexpected {:?}", other),
        }
        assert!(results[1].as_ref().unwrap().is_none());
        assert!(results[2].as_ref().unwrap().is_none());
    }

    #[test]
    fn collectives_can_be_repeated() {
        let results = run_group(3, |endpoint| {
            endpoint.barrier().unwrap();
            let first = endpoint.gather(vec![endpoint.rank() as u8]).unwrap();
            let second = endpoint.gather(vec![endpoint.rank() as u8 * 2]).unwrap();
            (first, second)
        });
        assert_eq!(results[0].0, Some(vec![0, 1, 2]));
        assert_eq!(results[0].1, Some(vec![0, 2, 4]));
    }

    #[test]
    fn dropped_member_disconnects_the_gather() {
        let mut endpoints = ThreadGroup::new(2);
        drop(endpoints.pop());
        let coordinator = endpoints.pop().unwrap();
        match within_deadline(move || coordinator.gather(vec![1, 2, 3])) {
            Err(FractalError::Disconnected(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn dropped_member_breaks_the_barrier() {
        let mut endpoints = ThreadGroup::new(3);
        drop(endpoints.pop());
        let waiting: Vec<_> = endpoints
            .into_iter()
            .map(|endpoint| thread::spawn(move || endpoint.barrier()))
            .collect();
        let results = within_deadline(move || {
            waiting
                .into_iter()
                .map(|h| h.join().unwrap())
                .collect::<Vec<_>>()
        });
        assert!(results.iter().all(|r| r.is_err()));
    }

    #[test]
    fn dropped_coordinator_disconnects_the_members() {
        let mut endpoints = ThreadGroup::new(2);
        let member = endpoints.pop().unwrap();
        drop(endpoints);
        match within_deadline(move || member.gather(vec![0; 4])) {
            Err(FractalError::Disconnected(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn panicking_member_does_not_hang_the_gather() {
        let mut endpoints = ThreadGroup::new(3).into_iter();
        let coordinator = endpoints.next().unwrap();
        let doomed = endpoints.next().unwrap();
        let survivor = endpoints.next().unwrap();

        let crashed = thread::spawn(move || {
            let _endpoint = doomed;
            panic!("worker 1 went down");
        });
        let survived = thread::spawn(move || survivor.gather(vec![2; 3]));
        let gathered = within_deadline(move || coordinator.gather(vec![0; 3]));

        assert!(crashed.join().is_err());
        match gathered {
            Err(FractalError::Disconnected(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
        let survived = within_deadline(move || survived.join().unwrap());
        assert!(survived.is_err());
    }

    #[test]
    fn finished_members_do_not_break_a_completed_barrier() {
        let results = run_group(4, |endpoint| {
            endpoint.barrier()?;
            endpoint.gather(vec![endpoint.rank() as u8])
        });
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(results[0].as_ref().unwrap(), &Some(vec![0, 1, 2, 3]));
    }
}
