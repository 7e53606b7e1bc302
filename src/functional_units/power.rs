use super::instance::{FuInstance, PowerState};
use log::debug;

/// What aging an instance for one cycle did to its power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aging {
    Busy,
    Idle,
    /// The instance crossed the breakeven threshold this cycle.
    Gated,
    StillGated,
}

/// Demotes long idle instances to a low power state.
///
/// Gating only pays off once an instance stays idle longer than the
/// breakeven threshold, and every wake up costs `wake_latency` cycles.
/// A threshold of zero turns gating off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerGate {
    breakeven: u64,
    wake_latency: u32,
}

impl PowerGate {
    pub fn new(breakeven: u64, wake_latency: u32) -> Self {
        Self {
            breakeven,
            wake_latency,
        }
    }
    pub fn disabled() -> Self {
        Self::new(0, 0)
    }
    pub fn is_enabled(&self) -> bool {
        self.breakeven > 0
    }
    pub fn breakeven(&self) -> u64 {
        self.breakeven
    }
    pub fn wake_latency(&self) -> u32 {
        self.wake_latency
    }
    /// Account one cycle for `inst`. Called by the pool tick after
    /// completions have been retired.
    pub fn age(&self, inst: &mut FuInstance) -> Aging {
        if !inst.is_idle() {
            inst.idle_cycles = 0;
            return Aging::Busy;
        }
        let aging = match inst.power {
            PowerState::Gated => Aging::StillGated,
            PowerState::Active if self.is_enabled() && inst.idle_cycles >= self.breakeven => {
                inst.power = PowerState::Gated;
                debug!(
                    "{} gated after {} idle cycles",
                    inst.name(),
                    inst.idle_cycles
                );
                Aging::Gated
            }
            PowerState::Active => Aging::Idle,
        };
        inst.idle_cycles += 1;
        aging
    }
    /// Reactivate `inst` for an allocation.
    /// Return the extra latency the allocation pays.
    pub fn wake(&self, inst: &mut FuInstance) -> u32 {
        inst.idle_cycles = 0;
        match inst.power {
            PowerState::Active => 0,
            PowerState::Gated => {
                inst.power = PowerState::Active;
                debug!("{} woken up, +{} cycles", inst.name(), self.wake_latency);
                self.wake_latency
            }
        }
    }
}

#[cfg(test)]
mod power_gate {
    use super::*;

    fn idle_instance() -> FuInstance {
        FuInstance::new(0, String::from("unit0"), 0)
    }

    #[test]
    fn gates_after_threshold() {
        let gate = PowerGate::new(3, 2);
        let mut inst = idle_instance();
        for _ in 0..3 {
            assert_eq!(Aging::Idle, gate.age(&mut inst));
        }
        assert_eq!(3, inst.idle_cycles());
        assert_eq!(Aging::Gated, gate.age(&mut inst));
        assert!(inst.is_gated());
        assert_eq!(Aging::StillGated, gate.age(&mut inst));
    }

    #[test]
    fn wake_charges_latency_once() {
        let gate = PowerGate::new(1, 5);
        let mut inst = idle_instance();
        gate.age(&mut inst);
        gate.age(&mut inst);
        assert!(inst.is_gated());
        assert_eq!(5, gate.wake(&mut inst));
        assert_eq!(0, inst.idle_cycles());
        assert_eq!(0, gate.wake(&mut inst));
    }

    #[test]
    fn disabled_never_gates() {
        let gate = PowerGate::disabled();
        let mut inst = idle_instance();
        for _ in 0..1000 {
            gate.age(&mut inst);
        }
        assert!(!inst.is_gated());
    }

    #[test]
    fn busy_instance_does_not_age() {
        let gate = PowerGate::new(1, 1);
        let mut inst = idle_instance();
        inst.occupy(false, 0, 10);
        for _ in 0..5 {
            assert_eq!(Aging::Busy, gate.age(&mut inst));
        }
        assert_eq!(0, inst.idle_cycles());
        assert!(!inst.is_gated());
    }
}
