use std::fmt::{self, Display};

/// Occupancy of a functional unit instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitState {
    Idle,
    /// Exclusively held by a non-pipelined operation until the given cycle.
    Busy { until: u64 },
    /// Servicing pipelined operations, oldest first.
    Pipelined { in_flight: Vec<InFlight> },
}

/// A pipelined operation that has not produced its result yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    pub issued: u64,
    pub ready: u64,
}

impl Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitState::Idle => write!(f, "Idle"),
            UnitState::Busy { until } => write!(f, "Busy(->{})", until),
            UnitState::Pipelined { in_flight } => write!(f, "Pipe({})", in_flight.len()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Active,
    Gated,
}

impl Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerState::Active => write!(f, "on"),
            PowerState::Gated => write!(f, "gated"),
        }
    }
}

/// One concrete replica of a functional unit descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuInstance {
    id: usize,
    name: String,
    descriptor: usize,
    state: UnitState,
    pub(crate) power: PowerState,
    /// Consecutive idle cycles observed by `tick`.
    pub(crate) idle_cycles: u64,
}

impl Display for FuInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}] idle {}",
            self.name, self.state, self.power, self.idle_cycles
        )
    }
}

impl FuInstance {
    pub fn new(id: usize, name: String, descriptor: usize) -> Self {
        Self {
            id,
            name,
            descriptor,
            state: UnitState::Idle,
            power: PowerState::Active,
            idle_cycles: 0,
        }
    }
    pub fn id(&self) -> usize {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Index of the descriptor this instance was made from.
    pub fn descriptor(&self) -> usize {
        self.descriptor
    }
    pub fn state(&self) -> &UnitState {
        &self.state
    }
    pub fn power(&self) -> PowerState {
        self.power
    }
    pub fn idle_cycles(&self) -> u64 {
        self.idle_cycles
    }
    pub fn is_idle(&self) -> bool {
        matches!(self.state, UnitState::Idle)
    }
    pub fn is_gated(&self) -> bool {
        self.power == PowerState::Gated
    }
    /// Number of pipelined operations still in flight.
    pub fn in_flight(&self) -> usize {
        match &self.state {
            UnitState::Pipelined { in_flight } => in_flight.len(),
            UnitState::Busy { .. } => 1,
            UnitState::Idle => 0,
        }
    }
    /// Whether an operation with the given occupancy mode may start on
    /// this instance at `cycle`.
    pub fn can_accept(&self, pipelined: bool, cycle: u64) -> bool {
        match &self.state {
            UnitState::Idle => true,
            UnitState::Busy { .. } => false,
            UnitState::Pipelined { in_flight } => {
                pipelined && in_flight.last().map_or(true, |op| op.issued != cycle)
            }
        }
    }
    /// Start an operation taking `latency` cycles at `cycle`.
    /// Return the cycle its result is ready.
    /// Caller must have checked [FuInstance::can_accept].
    pub fn occupy(&mut self, pipelined: bool, cycle: u64, latency: u32) -> u64 {
        let ready = cycle.saturating_add(u64::from(latency));
        self.idle_cycles = 0;
        if !pipelined {
            self.state = UnitState::Busy { until: ready };
            return ready;
        }
        let op = InFlight {
            issued: cycle,
            ready,
        };
        match &mut self.state {
            UnitState::Pipelined { in_flight } => in_flight.push(op),
            state => *state = UnitState::Pipelined { in_flight: vec![op] },
        }
        ready
    }
    /// Retire everything that completes at or before `cycle`.
    /// Return the number of operations retired.
    pub fn retire(&mut self, cycle: u64) -> usize {
        let (retired, now_idle) = match &mut self.state {
            UnitState::Idle => (0, false),
            UnitState::Busy { until } => {
                if *until <= cycle {
                    (1, true)
                } else {
                    (0, false)
                }
            }
            UnitState::Pipelined { in_flight } => {
                let before = in_flight.len();
                in_flight.retain(|op| op.ready > cycle);
                (before - in_flight.len(), in_flight.is_empty())
            }
        };
        if now_idle {
            self.state = UnitState::Idle;
        }
        retired
    }
    /// Drop the youngest operation regardless of its remaining cycles.
    /// A squashed pipelined operation gives its issue slot back, so the
    /// instance may accept again in the cycle it was issued.
    /// Return false if there was nothing to drop.
    pub fn squash(&mut self) -> bool {
        let (squashed, now_idle) = match &mut self.state {
            UnitState::Idle => (false, false),
            UnitState::Busy { .. } => (true, true),
            UnitState::Pipelined { in_flight } => {
                in_flight.pop();
                (true, in_flight.is_empty())
            }
        };
        if now_idle {
            self.state = UnitState::Idle;
        }
        squashed
    }
}

#[cfg(test)]
mod instance {
    use super::*;

    fn new_instance() -> FuInstance {
        FuInstance::new(0, String::from("unit0"), 0)
    }

    #[test]
    fn non_pipelined_window() {
        let mut inst = new_instance();
        let ready = inst.occupy(false, 10, 8);
        assert_eq!(18, ready);
        for cycle in 10..18 {
            assert!(!inst.can_accept(false, cycle));
            assert!(!inst.can_accept(true, cycle));
            assert_eq!(0, inst.retire(cycle));
        }
        assert_eq!(1, inst.retire(18));
        assert!(inst.is_idle());
        assert!(inst.can_accept(false, 18));
    }

    #[test]
    fn pipelined_one_per_cycle() {
        let mut inst = new_instance();
        inst.occupy(true, 5, 4);
        assert!(!inst.can_accept(true, 5), "second op in the same cycle");
        assert!(inst.can_accept(true, 6));
        assert!(!inst.can_accept(false, 6), "exclusive op on a busy pipe");
        inst.occupy(true, 6, 4);
        assert_eq!(2, inst.in_flight());
        assert_eq!(1, inst.retire(9));
        assert_eq!(1, inst.in_flight());
        assert_eq!(1, inst.retire(10));
        assert!(inst.is_idle());
    }

    #[test]
    fn squash_youngest() {
        let mut inst = new_instance();
        inst.occupy(true, 0, 3);
        inst.occupy(true, 1, 3);
        assert!(!inst.can_accept(true, 1));
        assert!(inst.squash());
        assert!(inst.can_accept(true, 1), "issue slot reclaimed");
        assert_eq!(
            &UnitState::Pipelined {
                in_flight: vec![InFlight { issued: 0, ready: 3 }]
            },
            inst.state()
        );
        assert!(inst.squash());
        assert!(inst.is_idle());
        assert!(!inst.squash());
    }

    #[test]
    fn occupy_resets_idle_counter() {
        let mut inst = new_instance();
        inst.idle_cycles = 42;
        inst.occupy(false, 0, 1);
        assert_eq!(0, inst.idle_cycles());
    }

    #[test]
    fn ready_cycle_saturates() {
        let mut inst = new_instance();
        assert_eq!(u64::MAX, inst.occupy(true, u64::MAX - 1, 5));
        assert_eq!(1, inst.retire(u64::MAX));
        assert!(inst.is_idle());
    }
}
