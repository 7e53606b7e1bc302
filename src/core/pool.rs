use super::error::{PoolError, Result};
use super::op_class::OpClass;
use crate::display::{into_table, side_by_side};
use crate::functional_units::descriptor::FuDescriptor;
use crate::functional_units::factory::Factory;
use crate::functional_units::instance::FuInstance;
use crate::functional_units::power::{Aging, PowerGate};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

/// A granted allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub instance: usize,
    /// Base latency plus the wake up penalty, if any.
    pub latency: u32,
    /// Cycle the result is ready and, for an exclusive unit, the cycle it
    /// is free again.
    pub ready: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationResult {
    Granted(Allocation),
    /// Every candidate is occupied this cycle. Retry on a later cycle.
    Stall,
}

impl AllocationResult {
    pub fn granted(&self) -> Option<&Allocation> {
        match self {
            AllocationResult::Granted(alloc) => Some(alloc),
            AllocationResult::Stall => None,
        }
    }
    pub fn is_stall(&self) -> bool {
        matches!(self, AllocationResult::Stall)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub allocations: u64,
    pub stalls: u64,
    pub wakeups: u64,
    pub gatings: u64,
    pub squashes: u64,
    /// Sum over instances of the cycles spent gated.
    pub gated_cycles: u64,
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allocations {}, stalls {}, wakeups {}, gatings {}, squashes {}, gated cycles {}",
            self.allocations, self.stalls, self.wakeups, self.gatings, self.squashes, self.gated_cycles
        )
    }
}

/// All functional unit instances of one core.
///
/// The pool is driven once per cycle: [FuPool::tick] first, then one
/// [FuPool::allocate] per ready operation in program order.
#[derive(Debug)]
pub struct FuPool {
    descriptors: Vec<FuDescriptor>,
    instances: Vec<FuInstance>,
    /// Instance ids of each descriptor. Replicas are contiguous.
    by_descriptor: Vec<Range<usize>>,
    by_op: HashMap<OpClass, usize>,
    gate: PowerGate,
    cycle: u64,
    stats: PoolStats,
}

impl fmt::Display for FuPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units: Vec<String> = self.descriptors.iter().map(|d| d.to_string()).collect();
        let instances: Vec<String> = self.instances.iter().map(|i| i.to_string()).collect();
        let title = format!("Cycle {}", self.cycle);
        let tables = side_by_side(
            &into_table("Units", &units),
            &into_table(&title, &instances),
            2,
        );
        writeln!(f, "{}", tables)?;
        write!(f, "{}", self.stats)
    }
}

impl FuPool {
    /// Create every replica of every descriptor.
    /// Fail if two descriptors claim one operation class.
    pub fn build(descriptors: Vec<FuDescriptor>, gate: PowerGate) -> Result<Self> {
        let mut by_op: HashMap<OpClass, usize> = HashMap::new();
        for (idx, desc) in descriptors.iter().enumerate() {
            desc.validate()?;
            for spec in desc.ops() {
                if let Some(prev) = by_op.insert(spec.op, idx) {
                    return Err(PoolError::DuplicateOperationClass {
                        op: spec.op,
                        first: descriptors[prev].name().to_string(),
                        second: desc.name().to_string(),
                    });
                }
            }
        }

        let mut factory = Factory::new();
        let mut instances = Vec::new();
        let mut by_descriptor = Vec::with_capacity(descriptors.len());
        for (idx, desc) in descriptors.iter().enumerate() {
            let begin = instances.len();
            instances.extend(factory.new_units(idx, desc));
            by_descriptor.push(begin..instances.len());
        }
        info!(
            "Functional unit pool: {} units, {} instances, {} op classes, gating {}",
            descriptors.len(),
            instances.len(),
            by_op.len(),
            if gate.is_enabled() {
                format!("after {} cycles (+{})", gate.breakeven(), gate.wake_latency())
            } else {
                String::from("off")
            }
        );
        Ok(Self {
            descriptors,
            instances,
            by_descriptor,
            by_op,
            gate,
            cycle: 0,
            stats: PoolStats::default(),
        })
    }
    /// Descriptor servicing `op`.
    pub fn descriptor_for(&self, op: OpClass) -> Option<&FuDescriptor> {
        self.by_op.get(&op).map(|idx| &self.descriptors[*idx])
    }
    pub fn descriptors(&self) -> &[FuDescriptor] {
        &self.descriptors
    }
    pub fn instance(&self, id: usize) -> Option<&FuInstance> {
        self.instances.get(id)
    }
    pub fn instances(&self) -> &[FuInstance] {
        &self.instances
    }
    /// Instances able to service `op`, lowest id first.
    pub fn candidates(&self, op: OpClass) -> Result<&[FuInstance]> {
        let idx = self
            .by_op
            .get(&op)
            .ok_or(PoolError::UnsupportedOperation(op))?;
        Ok(&self.instances[self.by_descriptor[*idx].clone()])
    }
    pub fn power_gate(&self) -> &PowerGate {
        &self.gate
    }
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }
    /// Cycle of the last tick.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }
    /// Whether every instance is idle.
    pub fn is_idle(&self) -> bool {
        self.instances.iter().all(|i| i.is_idle())
    }
    /// Advance instance state to `cycle`: retire completed operations,
    /// then age idle instances toward gating.
    pub fn tick(&mut self, cycle: u64) {
        self.cycle = cycle;
        for inst in self.instances.iter_mut() {
            let retired = inst.retire(cycle);
            if retired > 0 {
                debug!("cycle {}: {} retired {} op(s)", cycle, inst.name(), retired);
            }
            match self.gate.age(inst) {
                Aging::Gated => {
                    self.stats.gatings += 1;
                    self.stats.gated_cycles += 1;
                }
                Aging::StillGated => self.stats.gated_cycles += 1,
                Aging::Busy | Aging::Idle => {}
            }
        }
    }
    /// Request a unit for `op` at `cycle` with the declared latency.
    ///
    /// `width` is the operand width in bits, if the requester knows it.
    pub fn allocate(
        &mut self,
        op: OpClass,
        cycle: u64,
        width: Option<u32>,
    ) -> Result<AllocationResult> {
        self.reserve(op, cycle, width, None)
    }
    /// Request a unit for `op` at `cycle` with a latency supplied by the
    /// caller, typically the cache hierarchy for a memory operation.
    pub fn allocate_with_latency(
        &mut self,
        op: OpClass,
        cycle: u64,
        width: Option<u32>,
        latency: u32,
    ) -> Result<AllocationResult> {
        self.reserve(op, cycle, width, Some(latency))
    }
    fn reserve(
        &mut self,
        op: OpClass,
        cycle: u64,
        width: Option<u32>,
        latency: Option<u32>,
    ) -> Result<AllocationResult> {
        let desc_idx = *self
            .by_op
            .get(&op)
            .ok_or(PoolError::UnsupportedOperation(op))?;
        let desc = &self.descriptors[desc_idx];
        let spec = *desc
            .spec(op)
            .ok_or(PoolError::UnsupportedOperation(op))?;

        if let (Some(requested), Some(cap)) = (width, desc.get_width_cap()) {
            if !desc.fits(requested) {
                return Err(PoolError::WidthExceeded {
                    op,
                    unit: desc.name().to_string(),
                    requested,
                    cap,
                });
            }
        }

        let chosen = self.by_descriptor[desc_idx]
            .clone()
            .find(|id| self.instances[*id].can_accept(spec.pipelined, cycle));
        let id = match chosen {
            Some(id) => id,
            None => {
                self.stats.stalls += 1;
                debug!("cycle {}: {} stalled, {} busy", cycle, op, desc.name());
                return Ok(AllocationResult::Stall);
            }
        };

        let base = match latency {
            Some(0) => {
                warn!("{} supplied with zero latency, using 1", op);
                1
            }
            Some(lat) => lat,
            None => spec.latency,
        };
        let inst = &mut self.instances[id];
        if inst.is_gated() {
            self.stats.wakeups += 1;
        }
        let penalty = self.gate.wake(inst);
        let effective = base.saturating_add(penalty);
        let ready = inst.occupy(spec.pipelined, cycle, effective);
        self.stats.allocations += 1;
        debug!(
            "cycle {}: {} -> {} ({} cycles, ready at {})",
            cycle,
            op,
            inst.name(),
            effective,
            ready
        );
        Ok(AllocationResult::Granted(Allocation {
            instance: id,
            latency: effective,
            ready,
        }))
    }
    /// Give an instance back.
    ///
    /// With `squash` the youngest operation is dropped at once, whatever its
    /// remaining cycles. Without it only operations already complete at the
    /// last tick are retired; normal completion needs no release at all.
    /// Releasing an idle instance does nothing.
    /// Return whether anything was released.
    pub fn release(&mut self, id: usize, squash: bool) -> Result<bool> {
        let cycle = self.cycle;
        let inst = self
            .instances
            .get_mut(id)
            .ok_or(PoolError::UnknownInstance(id))?;
        if inst.is_idle() {
            warn!("cycle {}: release of idle instance {} ignored", cycle, inst.name());
            return Ok(false);
        }
        if squash {
            inst.squash();
            self.stats.squashes += 1;
            debug!("cycle {}: {} squashed", cycle, inst.name());
            return Ok(true);
        }
        let retired = inst.retire(cycle);
        if retired == 0 {
            warn!(
                "cycle {}: {} released before completion, ignored",
                cycle,
                inst.name()
            );
        }
        Ok(retired > 0)
    }
}
