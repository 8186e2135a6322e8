//! In-process communicator
//!
//! Each rank of a [`LocalUniverse`] is an OS thread. Ranks share a mailbox
//! guarded by a mutex, so point-to-point and collective operations behave
//! like their MPI counterparts: sends are rendezvous sends and collectives
//! must be entered by every rank of the context.
//!
//! Two extensions are available for testing:
//! - sends from chosen ranks can be made to fail, and the matching receive
//!   then fails too;
//! - blocking operations can be given a timeout after which they return
//!   [`Error::Timeout`] instead of waiting forever.
use crate::{
    error::{Error, Result},
    traits::Comm,
    types::RingMessage,
};
use itertools::Itertools;
use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread,
    time::Duration,
};
use tracing::{debug, error};

struct Envelope {
    seq: u64,
    payload: std::result::Result<RingMessage, i32>,
}

#[derive(Default)]
struct ContextState {
    mailbox: HashMap<(i32, i32, i32), VecDeque<Envelope>>,
    next_seq: u64,
    delivered: HashSet<u64>,
    gather_generation: u64,
    gather_values: Vec<Option<i32>>,
    gather_arrived: usize,
    gather_results: HashMap<u64, (Arc<Vec<i32>>, usize)>,
    splits: HashMap<(u64, i32), (Arc<Context>, usize)>,
}

struct Context {
    size: i32,
    timeout: Option<Duration>,
    failing_ranks: Arc<Mutex<HashMap<i32, i32>>>,
    state: Mutex<ContextState>,
    cond: Condvar,
}

impl Context {
    fn new(
        size: i32,
        timeout: Option<Duration>,
        failing_ranks: Arc<Mutex<HashMap<i32, i32>>>,
    ) -> Self {
        Self {
            size,
            timeout,
            failing_ranks,
            state: Mutex::new(ContextState {
                gather_values: vec![None; size as usize],
                ..Default::default()
            }),
            cond: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ContextState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Returns the guard and whether the wait timed out
    fn wait_until<'g, F: FnMut(&mut ContextState) -> bool>(
        &self,
        guard: MutexGuard<'g, ContextState>,
        mut done: F,
    ) -> (MutexGuard<'g, ContextState>, bool) {
        match self.timeout {
            None => (
                self.cond
                    .wait_while(guard, |s| !done(s))
                    .unwrap_or_else(PoisonError::into_inner),
                false,
            ),
            Some(timeout) => {
                let (guard, result) = self
                    .cond
                    .wait_timeout_while(guard, timeout, |s| !done(s))
                    .unwrap_or_else(PoisonError::into_inner);
                (guard, result.timed_out())
            }
        }
    }

    // All-gather returning the generation it completed in
    fn gather(&self, rank: i32, value: i32) -> Result<(u64, Arc<Vec<i32>>)> {
        let mut state = self.lock();
        let generation = state.gather_generation;
        state.gather_values[rank as usize] = Some(value);
        state.gather_arrived += 1;
        if state.gather_arrived == self.size as usize {
            let values = state.gather_values.iter().flatten().copied().collect_vec();
            state
                .gather_results
                .insert(generation, (Arc::new(values), self.size as usize));
            state.gather_values = vec![None; self.size as usize];
            state.gather_arrived = 0;
            state.gather_generation += 1;
            self.cond.notify_all();
        } else {
            let (guard, timed_out) =
                self.wait_until(state, |s| s.gather_generation > generation);
            state = guard;
            if timed_out {
                // The generation has not completed, so withdraw this rank's value
                state.gather_values[rank as usize] = None;
                state.gather_arrived -= 1;
                return Err(Error::Timeout);
            }
        }

        let (values, remaining) = state
            .gather_results
            .get_mut(&generation)
            .ok_or(Error::Timeout)?;
        let values = Arc::clone(values);
        *remaining -= 1;
        if *remaining == 0 {
            state.gather_results.remove(&generation);
        }
        Ok((generation, values))
    }
}

/// A set of in-process ranks
pub struct LocalUniverse {
    size: i32,
    timeout: Option<Duration>,
    failing_ranks: Arc<Mutex<HashMap<i32, i32>>>,
}

impl LocalUniverse {
    /// Create a universe of `size` ranks
    pub fn new(size: i32) -> Self {
        Self {
            size,
            timeout: None,
            failing_ranks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Fail blocking operations that wait longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Make every send from `rank` fail with transport code `code`
    pub fn fail_sends_from(&self, rank: i32, code: i32) {
        self.failing_ranks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(rank, code);
    }

    /// Number of ranks
    pub fn size(&self) -> i32 {
        self.size
    }

    /// One communicator per rank of a new world context
    pub fn comms(&self) -> Vec<LocalComm> {
        let context = Arc::new(Context::new(
            self.size,
            self.timeout,
            Arc::clone(&self.failing_ranks),
        ));
        (0..self.size)
            .map(|rank| LocalComm {
                context: Arc::clone(&context),
                rank,
                world_rank: rank,
            })
            .collect()
    }

    /// Run `f` on every rank, each on its own thread, and collect the results in rank order.
    ///
    /// A panic on any rank is propagated.
    pub fn run<T: Send, F: Fn(LocalComm) -> T + Sync>(&self, f: F) -> Vec<T> {
        let f = &f;
        thread::scope(|s| {
            let handles = self
                .comms()
                .into_iter()
                .map(|comm| s.spawn(move || f(comm)))
                .collect_vec();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        })
    }
}

/// One rank's view of a context of a [`LocalUniverse`]
#[derive(Clone)]
pub struct LocalComm {
    context: Arc<Context>,
    rank: i32,
    world_rank: i32,
}

impl LocalComm {
    /// Rank of this process in the universe
    pub fn world_rank(&self) -> i32 {
        self.world_rank
    }

    fn check_rank(&self, rank: i32) -> Result<()> {
        if rank < 0 || rank >= self.context.size {
            Err(Error::InvalidRank(rank))
        } else {
            Ok(())
        }
    }

    fn injected_failure(&self) -> Option<i32> {
        self.context
            .failing_ranks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&self.world_rank)
            .copied()
    }
}

impl Comm for LocalComm {
    type Sub = LocalComm;

    fn rank(&self) -> i32 {
        self.rank
    }

    fn size(&self) -> i32 {
        self.context.size
    }

    fn synchronous_send(&self, dest: i32, tag: i32, message: &RingMessage) -> Result<()> {
        self.check_rank(dest)?;
        let failure = self.injected_failure();

        let mut state = self.context.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state
            .mailbox
            .entry((self.rank, dest, tag))
            .or_default()
            .push_back(Envelope {
                seq,
                payload: failure.map_or(Ok(*message), Err),
            });
        self.context.cond.notify_all();

        if let Some(code) = failure {
            return Err(Error::Transport { peer: dest, code });
        }

        let (mut state, timed_out) = self
            .context
            .wait_until(state, |s| s.delivered.contains(&seq));
        if timed_out {
            if let Some(queue) = state.mailbox.get_mut(&(self.rank, dest, tag)) {
                queue.retain(|e| e.seq != seq);
            }
            return Err(Error::Timeout);
        }
        state.delivered.remove(&seq);
        Ok(())
    }

    fn receive(&self, source: i32, tag: i32) -> Result<RingMessage> {
        self.check_rank(source)?;
        let key = (source, self.rank, tag);

        let state = self.context.lock();
        let (mut state, timed_out) = self.context.wait_until(state, |s| {
            s.mailbox.get(&key).is_some_and(|q| !q.is_empty())
        });
        if timed_out {
            return Err(Error::Timeout);
        }
        let envelope = state
            .mailbox
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .ok_or(Error::Timeout)?;
        if envelope.payload.is_ok() {
            state.delivered.insert(envelope.seq);
            self.context.cond.notify_all();
        }

        envelope
            .payload
            .map_err(|code| Error::Transport { peer: source, code })
    }

    fn split(&self, color: i32, key: i32) -> Result<LocalComm> {
        if color < 0 {
            return Err(Error::SplitFailed { color });
        }
        let (generation, colors) = self.context.gather(self.rank, color)?;
        let (_, keys) = self.context.gather(self.rank, key)?;

        let members = (0..self.context.size)
            .filter(|r| colors[*r as usize] == color)
            .sorted_by_key(|r| (keys[*r as usize], *r))
            .collect_vec();
        let new_rank = members
            .iter()
            .position(|r| *r == self.rank)
            .ok_or(Error::SplitFailed { color })? as i32;

        let mut state = self.context.lock();
        let (context, remaining) = state
            .splits
            .entry((generation, color))
            .or_insert_with(|| {
                (
                    Arc::new(Context::new(
                        members.len() as i32,
                        self.context.timeout,
                        Arc::clone(&self.context.failing_ranks),
                    )),
                    members.len(),
                )
            });
        let context = Arc::clone(context);
        *remaining -= 1;
        if *remaining == 0 {
            state.splits.remove(&(generation, color));
        }

        Ok(LocalComm {
            context,
            rank: new_rank,
            world_rank: self.world_rank,
        })
    }

    fn all_gather(&self, value: i32) -> Result<Vec<i32>> {
        let (_, values) = self.context.gather(self.rank, value)?;
        Ok(values.as_ref().clone())
    }

    fn release(self) -> Result<()> {
        debug!(
            rank = self.rank,
            world_rank = self.world_rank,
            "releasing local context"
        );
        Ok(())
    }

    fn abort(&self, code: i32) -> ! {
        error!(world_rank = self.world_rank, code, "abort");
        panic!("rank {} aborted with code {code}", self.world_rank)
    }
}
