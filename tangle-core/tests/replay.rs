//! Replay guardrail tests.
//!
//! These pin down the properties the explorer depends on: replaying a
//! schedule is deterministic, atomic ids are decided purely by
//! allocation order, and every state cell partitions the processes into
//! enabled and finished.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use tangle_core::{do_run, make, spawn, Atomic, AtomicId, OpKind, ProcessId, Step};

fn step(process: usize, op: OpKind, target: Option<u64>) -> Step {
    Step {
        process: ProcessId(process),
        op,
        target: target.map(AtomicId),
    }
}

/// Two processes doing a read-modify-write on a shared counter.
fn naive_counter(observed: Rc<RefCell<Vec<u64>>>) -> impl Fn() {
    move || {
        let counter = Atomic::new(0);
        for _ in 0..2 {
            let c = counter.clone();
            let observed = observed.clone();
            spawn(async move {
                let seen = c.get().await;
                observed.borrow_mut().push(seen);
                c.set(seen + 1).await;
            });
        }
    }
}

#[test]
fn replaying_any_prefix_reproduces_the_same_state() {
    let observed = Rc::new(RefCell::new(Vec::new()));
    let program = naive_counter(observed.clone());

    let full = [
        step(0, OpKind::Start, None),
        step(0, OpKind::Get, Some(1)),
        step(1, OpKind::Start, None),
        step(1, OpKind::Get, Some(1)),
        step(0, OpKind::Set, Some(1)),
        step(1, OpKind::Set, Some(1)),
    ];

    for prefix_len in 1..=full.len() {
        let prefix = &full[..prefix_len];
        let first = do_run(&program, prefix);
        let second = do_run(&program, prefix);
        assert_eq!(first, second, "prefix of length {prefix_len} diverged");
    }
}

#[test]
fn interleaved_gets_lose_an_update() {
    let observed = Rc::new(RefCell::new(Vec::new()));
    let program = naive_counter(observed.clone());

    // Both processes read before either writes: both see 0.
    do_run(&program, &[
        step(0, OpKind::Start, None),
        step(0, OpKind::Get, Some(1)),
        step(1, OpKind::Start, None),
        step(1, OpKind::Get, Some(1)),
        step(0, OpKind::Set, Some(1)),
        step(1, OpKind::Set, Some(1)),
    ]);
    assert_eq!(*observed.borrow(), vec![0, 0]);

    // Sequential order: the second read sees the first write.
    observed.borrow_mut().clear();
    do_run(&program, &[
        step(0, OpKind::Start, None),
        step(0, OpKind::Get, Some(1)),
        step(0, OpKind::Set, Some(1)),
        step(1, OpKind::Start, None),
        step(1, OpKind::Get, Some(1)),
        step(1, OpKind::Set, Some(1)),
    ]);
    assert_eq!(*observed.borrow(), vec![0, 1]);
}

#[test]
fn atomic_ids_follow_execution_order_of_allocations() {
    let program = || {
        spawn(async {
            let a = make(0).await;
            a.set(1).await;
        });
        spawn(async {
            let b = make(0).await;
            b.set(1).await;
        });
    };

    // P0 starts first: its allocation is minted first.
    let cell = do_run(&program, &[step(0, OpKind::Start, None), step(1, OpKind::Start, None)]);
    assert_eq!(cell.procs[0].target, Some(AtomicId(1)));
    assert_eq!(cell.procs[1].target, Some(AtomicId(2)));

    // P1 starts first: the assignment flips with the allocation order.
    let cell = do_run(&program, &[step(1, OpKind::Start, None), step(0, OpKind::Start, None)]);
    assert_eq!(cell.procs[0].target, Some(AtomicId(2)));
    assert_eq!(cell.procs[1].target, Some(AtomicId(1)));
}

#[test]
fn enabled_and_finished_partition_the_processes() {
    let observed = Rc::new(RefCell::new(Vec::new()));
    let program = naive_counter(observed);

    let full = [
        step(0, OpKind::Start, None),
        step(0, OpKind::Get, Some(1)),
        step(0, OpKind::Set, Some(1)),
        step(1, OpKind::Start, None),
        step(1, OpKind::Get, Some(1)),
        step(1, OpKind::Set, Some(1)),
    ];

    // P0 finishes after its Set (step 3), P1 after the full schedule.
    let expected_enabled: [&[usize]; 6] =
        [&[0, 1], &[0, 1], &[1], &[1], &[1], &[]];

    for (prefix_len, expected) in (1..=full.len()).zip(expected_enabled) {
        let cell = do_run(&program, &full[..prefix_len]);
        let enabled: BTreeSet<ProcessId> = cell.enabled.iter().copied().collect();
        let expected: BTreeSet<ProcessId> =
            expected.iter().map(|&i| ProcessId(i)).collect();
        assert_eq!(enabled, expected, "prefix of length {prefix_len}");
        assert_eq!(cell.procs.len(), 2);
    }
}
