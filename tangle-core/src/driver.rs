//! The run driver: executes one fixed schedule against a fresh registry.
//!
//! A schedule is a finite list of `(process, operation, target)` steps.
//! [`do_run`] rebuilds the registry by re-running the test body, then
//! advances each named process by exactly one step in schedule order,
//! asserting before every dispatch that the process really is parked at
//! the scheduled operation. Any prefix of an execution is itself a
//! replayable schedule, which is what the explorer relies on.

use std::collections::BTreeSet;
use std::task::{Context, Poll};

use tracing::trace;

use crate::ids::{AtomicId, ProcessId};
use crate::process::{OpKind, ProcStep};
use crate::scheduler::{self, noop_waker};

/// One entry of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub process: ProcessId,
    pub op: OpKind,
    pub target: Option<AtomicId>,
}

/// Snapshot of the frontier reached by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCell {
    /// Pending step of every spawned process, in id order.
    pub procs: Vec<ProcStep>,
    /// The step that led into this state (the schedule's last entry).
    pub run: Step,
    /// Processes not yet finished.
    pub enabled: BTreeSet<ProcessId>,
    /// Processes exploration must also diverge to from this state.
    pub backtrack: BTreeSet<ProcessId>,
}

/// Execute `schedule` against a fresh registry built by `program`.
///
/// `program` is re-run from the top under tracing; it spawns the
/// processes (parked at `Start`) and installs any `every`/`finally`
/// callbacks, then the schedule is walked. The `every` callback fires
/// after each step and `finally` fires once if every process finished.
/// Returns the state cell describing the post-run frontier; all parked
/// fibers are discontinued before returning.
///
/// Mismatches between a schedule entry and the named process's actual
/// pending operation are checker bugs and panic.
pub fn do_run(program: impl Fn(), schedule: &[Step]) -> StateCell {
    assert!(!schedule.is_empty(), "do_run requires a nonempty schedule");

    scheduler::begin_run();
    scheduler::set_tracing(true);
    program();

    for step in schedule {
        dispatch(*step);
        fire_every();
    }

    let cell = scheduler::with_context(|ctx| {
        let procs: Vec<ProcStep> = ctx
            .processes
            .iter()
            .enumerate()
            .map(|(i, p)| ProcStep {
                process: ProcessId(i),
                op: p.next_op,
                target: p.next_target,
            })
            .collect();
        let enabled: BTreeSet<ProcessId> = ctx
            .processes
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.finished)
            .map(|(i, _)| ProcessId(i))
            .collect();
        StateCell {
            procs,
            run: *schedule.last().expect("schedule is nonempty"),
            enabled,
            backtrack: BTreeSet::new(),
        }
    });

    if cell.enabled.is_empty() {
        fire_finally();
    }

    scheduler::end_run();
    cell
}

/// Advance one process by one step.
fn dispatch(step: Step) {
    trace!(
        process = step.process.0,
        op = step.op.name(),
        target = ?step.target,
        "dispatching step"
    );

    let mut fiber = scheduler::with_context(|ctx| {
        assert!(
            step.process.0 < ctx.processes.len(),
            "schedule names {} but only {} processes were spawned",
            step.process,
            ctx.processes.len()
        );
        assert!(
            ctx.finished_count < ctx.processes.len(),
            "no enabled processes"
        );
        let record = &mut ctx.processes[step.process.0];
        assert!(
            !record.finished,
            "schedule resumes finished process {}",
            step.process
        );
        assert_eq!(
            record.next_op, step.op,
            "schedule mismatch: {} is parked at {:?}, not {:?}",
            step.process, record.next_op, step.op
        );
        assert_eq!(
            record.next_target, step.target,
            "schedule target mismatch for {}",
            step.process
        );
        ctx.schedule_prefix.push(step);
        ctx.pending = None;
        record
            .fiber
            .take()
            .expect("parked process has no fiber")
    });

    // Polling happens outside the context borrow: the fiber's atomic
    // operations re-enter the run context.
    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);
    let poll = fiber.as_mut().poll(&mut cx);

    scheduler::with_context(|ctx| {
        let record = &mut ctx.processes[step.process.0];
        match poll {
            Poll::Ready(()) => {
                record.finished = true;
                ctx.finished_count += 1;
            }
            Poll::Pending => {
                let pending = ctx.pending.take().unwrap_or_else(|| {
                    panic!(
                        "process {} suspended outside an atomic operation",
                        step.process
                    )
                });
                record.next_op = pending.op;
                record.next_target = pending.target;
                record.fiber = Some(fiber);
            }
        }
    });
}

fn fire_every() {
    let callback = scheduler::with_context(|ctx| ctx.every_fn.take());
    if let Some(mut callback) = callback {
        scheduler::set_tracing(false);
        callback();
        scheduler::set_tracing(true);
        scheduler::with_context(|ctx| {
            if ctx.every_fn.is_none() {
                ctx.every_fn = Some(callback);
            }
        });
    }
}

fn fire_finally() {
    let callback = scheduler::with_context(|ctx| ctx.final_fn.take());
    if let Some(mut callback) = callback {
        scheduler::set_tracing(false);
        callback();
        scheduler::set_tracing(true);
    }
}
