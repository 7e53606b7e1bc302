pub mod error;
pub mod trace;

use crate::core::latency::LatencySource;
use crate::core::pool::{Allocation, AllocationResult, FuPool, PoolStats};
use crate::params::CoreParams;
use crate::util::queue::Queue;
use error::{IssueError, Result};
use log::debug;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use trace::MicroOp;

/// An operation holding a functional unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Issued {
    seq: u64,
    alloc: Allocation,
}

/// Outcome of [IssueStage::run].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Cycle the last result became ready.
    pub cycles: u64,
    pub issued: u64,
    pub stats: PoolStats,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cycles {}, issued {}", self.cycles, self.issued)?;
        write!(f, "{}", self.stats)
    }
}

/// Drives a pool once per cycle from a bounded instruction queue.
///
/// Each cycle ticks the pool and then walks the queue oldest first, issuing
/// up to `issue_width` operations. An operation that stalls blocks every
/// younger operation of its class for the rest of the cycle.
pub struct IssueStage<L: LatencySource> {
    pool: FuPool,
    latency: L,
    queue: Queue<MicroOp>,
    issue_width: usize,
    in_flight: Vec<Issued>,
    cycle: u64,
    issued: u64,
    last_ready: u64,
    /// Latest ready cycle among completed operations.
    retired_ready: u64,
}

impl<L: LatencySource> fmt::Display for IssueStage<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "queue {}/{}, in flight {}",
            self.queue.len(),
            self.queue.capacity(),
            self.in_flight.len()
        )?;
        write!(f, "{}", self.pool)
    }
}

impl<L: LatencySource> IssueStage<L> {
    pub fn new(pool: FuPool, latency: L, params: &CoreParams) -> Self {
        Self {
            pool,
            latency,
            queue: Queue::new(params.num_iq_entries),
            issue_width: params.issue_width,
            in_flight: Vec::new(),
            cycle: 0,
            issued: 0,
            last_ready: 0,
            retired_ready: 0,
        }
    }
    pub fn pool(&self) -> &FuPool {
        &self.pool
    }
    /// The cycle the next call to [IssueStage::next_cycle] simulates.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
    /// Whether nothing is queued or executing.
    pub fn is_drained(&self) -> bool {
        self.queue.is_empty() && self.in_flight.is_empty()
    }
    /// Put an operation into the queue. A full queue hands it back.
    pub fn dispatch(&mut self, uop: MicroOp) -> std::result::Result<(), MicroOp> {
        debug!("cycle {}: dispatch {}", self.cycle, uop);
        self.queue.insert(uop)
    }
    /// Simulate one cycle. Return the number of operations issued.
    ///
    /// An unsupported operation or a width violation ends the walk with an
    /// error. Operations granted before it stay issued and the cycle still
    /// counts, so the caller may squash or split the offender and go on.
    pub fn next_cycle(&mut self) -> Result<usize> {
        let cycle = self.cycle;
        self.pool.tick(cycle);
        let mut retired_ready = self.retired_ready;
        self.in_flight.retain(|i| {
            if i.alloc.ready > cycle {
                return true;
            }
            retired_ready = retired_ready.max(i.alloc.ready);
            false
        });
        self.retired_ready = retired_ready;

        let mut granted = HashSet::new();
        let mut blocked = HashSet::new();
        let mut failure = None;
        for uop in &self.queue {
            if granted.len() == self.issue_width {
                break;
            }
            if blocked.contains(&uop.op) {
                continue;
            }
            let width = uop.requested_width();
            let result = match uop.latency {
                Some(lat) => self.pool.allocate_with_latency(uop.op, cycle, width, lat),
                None if uop.op.is_memory() => {
                    let lat = self.latency.latency(uop.op, cycle);
                    self.pool.allocate_with_latency(uop.op, cycle, width, lat)
                }
                None => self.pool.allocate(uop.op, cycle, width),
            };
            match result {
                Ok(AllocationResult::Granted(alloc)) => {
                    debug!("cycle {}: issued {} on #{}", cycle, uop, alloc.instance);
                    self.last_ready = self.last_ready.max(alloc.ready);
                    self.in_flight.push(Issued {
                        seq: uop.seq,
                        alloc,
                    });
                    granted.insert(uop.seq);
                }
                Ok(AllocationResult::Stall) => {
                    blocked.insert(uop.op);
                }
                Err(err) => {
                    debug!("cycle {}: {} rejected: {}", cycle, uop, err);
                    failure = Some(err);
                    break;
                }
            }
        }
        self.queue.retain(|uop| !granted.contains(&uop.seq));
        self.issued += granted.len() as u64;
        self.cycle += 1;
        match failure {
            Some(err) => Err(err.into()),
            None => Ok(granted.len()),
        }
    }
    /// Throw away operation `seq` and everything younger: queued ones are
    /// dropped, executing ones give their unit back, youngest first.
    /// Return the number of units released.
    pub fn squash(&mut self, seq: u64) -> Result<usize> {
        self.queue.retain(|uop| uop.seq < seq);
        let mut victims: Vec<Issued> = self
            .in_flight
            .iter()
            .filter(|i| i.seq >= seq)
            .copied()
            .collect();
        self.in_flight.retain(|i| i.seq < seq);
        victims.sort_by(|a, b| b.seq.cmp(&a.seq));

        let mut released = 0;
        for victim in victims.iter() {
            if self.pool.release(victim.alloc.instance, true)? {
                released += 1;
            }
        }
        self.last_ready = self
            .in_flight
            .iter()
            .map(|i| i.alloc.ready)
            .fold(self.retired_ready, u64::max);
        debug!(
            "cycle {}: squashed from {}, {} unit(s) released",
            self.cycle, seq, released
        );
        Ok(released)
    }
    /// Feed `program` through the queue until every operation completes.
    pub fn run(&mut self, program: Vec<MicroOp>, max_cycles: u64) -> Result<RunSummary> {
        let mut pending: VecDeque<MicroOp> = program.into();
        loop {
            while let Some(uop) = pending.pop_front() {
                if let Err(uop) = self.dispatch(uop) {
                    pending.push_front(uop);
                    break;
                }
            }
            if pending.is_empty() && self.is_drained() {
                break;
            }
            if self.cycle >= max_cycles {
                return Err(IssueError::CycleLimit {
                    limit: max_cycles,
                    pending: pending.len() + self.queue.len() + self.in_flight.len(),
                });
            }
            self.next_cycle()?;
        }
        Ok(RunSummary {
            cycles: self.last_ready,
            issued: self.issued,
            stats: *self.pool.stats(),
        })
    }
}
