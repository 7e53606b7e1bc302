use fupool_sim::core::error::PoolError;
use fupool_sim::core::op_class::OpClass::*;
use fupool_sim::core::pool::{Allocation, AllocationResult, FuPool};
use fupool_sim::functional_units::descriptor::FuDescriptor;
use fupool_sim::functional_units::power::PowerGate;

fn pool(descs: Vec<FuDescriptor>, gate: PowerGate) -> FuPool {
    FuPool::build(descs, gate).expect("valid pool")
}

fn grant(result: Result<AllocationResult, PoolError>) -> Allocation {
    match result {
        Ok(AllocationResult::Granted(alloc)) => alloc,
        other => panic!("expected a grant, got {:?}", other),
    }
}

fn stalls(result: Result<AllocationResult, PoolError>) -> bool {
    matches!(result, Ok(AllocationResult::Stall))
}

#[test]
fn integer_divide_scenario() {
    let mut p = pool(
        vec![FuDescriptor::create("ComplexInt").op(IntDiv, 8, false).count(2)],
        PowerGate::disabled(),
    );
    p.tick(10);
    let first = grant(p.allocate(IntDiv, 10, None));
    let second = grant(p.allocate(IntDiv, 10, None));
    assert_eq!((0, 8, 18), (first.instance, first.latency, first.ready));
    assert_eq!((1, 8, 18), (second.instance, second.latency, second.ready));
    assert!(stalls(p.allocate(IntDiv, 10, None)));

    for cycle in 11..18 {
        p.tick(cycle);
        assert!(stalls(p.allocate(IntDiv, cycle, None)), "cycle {}", cycle);
    }
    p.tick(18);
    assert!(p.is_idle());
    assert_eq!(0, grant(p.allocate(IntDiv, 18, None)).instance);
    assert_eq!(1, grant(p.allocate(IntDiv, 18, None)).instance);
}

#[test]
fn replicas_bound_concurrent_exclusive_ops() {
    for replicas in 1..=4 {
        let mut p = pool(
            vec![FuDescriptor::create("Div").op(FloatDiv, 9, false).count(replicas)],
            PowerGate::disabled(),
        );
        p.tick(0);
        for expected in 0..replicas {
            assert_eq!(expected, grant(p.allocate(FloatDiv, 0, None)).instance);
        }
        assert!(stalls(p.allocate(FloatDiv, 0, None)));
        assert_eq!(1, p.stats().stalls);
    }
}

#[test]
fn pipelined_unit_accepts_one_op_per_cycle() {
    let mut p = pool(
        vec![FuDescriptor::create("Mul").op(IntMult, 4, true)],
        PowerGate::disabled(),
    );
    for cycle in 0..10 {
        p.tick(cycle);
        let alloc = grant(p.allocate(IntMult, cycle, None));
        assert_eq!(cycle + 4, alloc.ready);
        assert!(stalls(p.allocate(IntMult, cycle, None)));
    }
    // four in flight at the steady state
    assert_eq!(4, p.instances()[0].in_flight());
    for cycle in 10..14 {
        p.tick(cycle);
    }
    assert!(p.is_idle());
}

#[test]
fn width_cap_checked_regardless_of_occupancy() {
    let mut p = pool(
        vec![FuDescriptor::create("Simd").op(SimdAdd, 3, true).width_cap(128)],
        PowerGate::disabled(),
    );
    p.tick(0);
    grant(p.allocate(SimdAdd, 0, Some(128)));
    // the unit is occupied this cycle, the width error still wins
    assert_eq!(
        Err(PoolError::WidthExceeded {
            op: SimdAdd,
            unit: String::from("Simd"),
            requested: 256,
            cap: 128,
        }),
        p.allocate(SimdAdd, 0, Some(256))
    );
}

#[test]
fn gating_starts_after_breakeven_idle_cycles() {
    let descs = || vec![FuDescriptor::create("Alu").op(IntAlu, 1, true)];

    // idle for cycles 0 to 4, used at cycle 4: still active
    let mut p = pool(descs(), PowerGate::new(5, 2));
    for cycle in 0..5 {
        p.tick(cycle);
    }
    assert!(!p.instances()[0].is_gated());
    assert_eq!(1, grant(p.allocate(IntAlu, 4, None)).latency);

    // one more idle cycle crosses the threshold
    let mut p = pool(descs(), PowerGate::new(5, 2));
    for cycle in 0..6 {
        p.tick(cycle);
    }
    assert!(p.instances()[0].is_gated());
    assert_eq!(1, p.stats().gatings);
    let alloc = grant(p.allocate(IntAlu, 5, None));
    assert_eq!(3, alloc.latency);
    assert_eq!(8, alloc.ready);
    assert!(!p.instances()[0].is_gated());
    assert_eq!(0, p.instances()[0].idle_cycles());
}

#[test]
fn zero_breakeven_never_gates() {
    let mut p = pool(
        vec![FuDescriptor::create("Alu").op(IntAlu, 1, true)],
        PowerGate::new(0, 10),
    );
    for cycle in 0..1000 {
        p.tick(cycle);
    }
    assert!(!p.instances()[0].is_gated());
    assert_eq!(1, grant(p.allocate(IntAlu, 1000, None)).latency);
}

#[test]
fn squash_frees_capacity_in_the_same_cycle() -> Result<(), PoolError> {
    let mut p = pool(
        vec![
            FuDescriptor::create("Div").op(IntDiv, 8, false),
            FuDescriptor::create("Mul").op(IntMult, 4, true),
        ],
        PowerGate::disabled(),
    );
    p.tick(3);
    let div = grant(p.allocate(IntDiv, 3, None));
    let mul = grant(p.allocate(IntMult, 3, None));
    assert!(stalls(p.allocate(IntDiv, 3, None)));
    assert!(stalls(p.allocate(IntMult, 3, None)));

    assert!(p.release(div.instance, true)?);
    assert!(p.release(mul.instance, true)?);
    grant(p.allocate(IntDiv, 3, None));
    grant(p.allocate(IntMult, 3, None));
    assert_eq!(2, p.stats().squashes);
    Ok(())
}

#[test]
fn double_release_is_harmless() -> Result<(), PoolError> {
    let mut p = pool(
        vec![FuDescriptor::create("Div").op(IntDiv, 8, false).count(2)],
        PowerGate::disabled(),
    );
    p.tick(0);
    let alloc = grant(p.allocate(IntDiv, 0, None));
    assert!(p.release(alloc.instance, true)?);
    let instances = p.instances().to_vec();
    let stats = *p.stats();

    assert!(!p.release(alloc.instance, true)?);
    assert!(!p.release(alloc.instance, false)?);
    assert!(!p.release(1, true)?);
    assert_eq!(instances, p.instances());
    assert_eq!(stats, *p.stats());
    Ok(())
}

#[test]
fn same_history_same_answers() {
    let run = || {
        let mut p = pool(
            vec![
                FuDescriptor::create("Alu").op(IntAlu, 1, true).count(2),
                FuDescriptor::create("Div").op(IntDiv, 8, false).count(2),
            ],
            PowerGate::new(3, 1),
        );
        let mut log = Vec::new();
        for cycle in 0..40 {
            p.tick(cycle);
            let op = if cycle % 3 == 0 { IntDiv } else { IntAlu };
            log.push(p.allocate(op, cycle, None));
            if cycle % 7 == 0 {
                log.push(p.allocate(IntAlu, cycle, None));
            }
        }
        (log, *p.stats())
    };
    assert_eq!(run(), run());
}
