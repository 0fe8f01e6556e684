//! Cooperative scheduling of logical processes.
//!
//! Every traced atomic operation is a suspension point: the executing
//! process parks there so the run driver can decide which process
//! advances next. Suspension is built on plain `Future`s. A process body
//! is a fiber polled exactly one step per dispatched schedule entry, and
//! each atomic operation is a two-phase future:
//!
//! 1. On its first poll under tracing it registers itself as the
//!    process's pending operation and returns `Poll::Pending`, parking
//!    the fiber.
//! 2. The driver polls the fiber again only when it dispatches exactly
//!    that step; the operation then performs its real memory action and
//!    resolves, and the fiber keeps running until the next operation's
//!    first poll (or until the body returns).
//!
//! With tracing off the first poll performs the action immediately, so
//! the same operations work outside a traced run.
//!
//! All run-global state lives in a single thread-local run context;
//! there is exactly one OS thread and processes are only simulated, so
//! no locking is involved.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

use crate::driver::Step;
use crate::ids::{AtomicId, ProcessId};
use crate::process::{OpKind, Process};

/// Run-global mutable state shared by the driver, the atomic operations
/// and the user-facing hooks. Reset at the start of every run.
pub(crate) struct RunContext {
    /// Whether atomic operations suspend to the scheduler.
    pub tracing: bool,
    /// Next atomic id to mint; reset to 1 at the start of each run.
    pub next_atomic_id: u64,
    pub processes: Vec<Process>,
    pub finished_count: usize,
    /// Pending operation registered by an op future during the current
    /// poll; the driver moves it into the process record afterwards.
    pub pending: Option<PendingOp>,
    /// Schedule entries dispatched so far in the current run.
    pub schedule_prefix: Vec<Step>,
    /// Total number of runs started on this thread.
    pub run_number: u64,
    pub every_fn: Option<Box<dyn FnMut()>>,
    pub final_fn: Option<Box<dyn FnMut()>>,
}

impl RunContext {
    fn new() -> Self {
        Self {
            tracing: false,
            next_atomic_id: 1,
            processes: Vec::new(),
            finished_count: 0,
            pending: None,
            schedule_prefix: Vec::new(),
            run_number: 0,
            every_fn: None,
            final_fn: None,
        }
    }
}

/// Operation an op future has registered while parking.
pub(crate) struct PendingOp {
    pub op: OpKind,
    pub target: Option<AtomicId>,
}

thread_local! {
    static RUN_CONTEXT: RefCell<RunContext> = RefCell::new(RunContext::new());
}

pub(crate) fn with_context<R>(f: impl FnOnce(&mut RunContext) -> R) -> R {
    RUN_CONTEXT.with(|ctx| f(&mut ctx.borrow_mut()))
}

pub(crate) fn tracing_enabled() -> bool {
    with_context(|ctx| ctx.tracing)
}

pub(crate) fn set_tracing(on: bool) {
    with_context(|ctx| ctx.tracing = on);
}

/// Mint the next dense atomic id.
pub(crate) fn mint_atomic_id() -> AtomicId {
    with_context(|ctx| {
        let id = ctx.next_atomic_id;
        ctx.next_atomic_id += 1;
        AtomicId(id)
    })
}

/// Record the operation the currently polled process is parking at.
pub(crate) fn register_pending(op: OpKind, target: Option<AtomicId>) {
    with_context(|ctx| {
        debug_assert!(
            ctx.pending.is_none(),
            "a process registered two pending operations in one step"
        );
        ctx.pending = Some(PendingOp { op, target });
    });
}

/// Reset the run context for a fresh run.
pub(crate) fn begin_run() {
    let stale = with_context(|ctx| {
        ctx.tracing = false;
        ctx.next_atomic_id = 1;
        ctx.finished_count = 0;
        ctx.pending = None;
        ctx.schedule_prefix.clear();
        ctx.run_number += 1;
        ctx.every_fn = None;
        ctx.final_fn = None;
        std::mem::take(&mut ctx.processes)
    });
    // Fibers left over from an aborted run are dropped outside the
    // context borrow, since their destructors run arbitrary user code.
    drop(stale);
}

/// Tear down at run end: discontinue every still-parked fiber and clear
/// the registry.
pub(crate) fn end_run() {
    let processes = with_context(|ctx| {
        ctx.tracing = false;
        ctx.finished_count = 0;
        ctx.pending = None;
        ctx.next_atomic_id = 1;
        std::mem::take(&mut ctx.processes)
    });
    drop(processes);
}

/// Register a logical process.
///
/// The body is parked immediately: it runs no further than its first
/// atomic operation, and only when the driver dispatches its synthetic
/// `Start` step. Process ids are registry indices in spawn order.
pub fn spawn(body: impl Future<Output = ()> + 'static) -> ProcessId {
    with_context(|ctx| {
        let id = ProcessId(ctx.processes.len());
        ctx.processes.push(Process::new(Box::pin(body)));
        id
    })
}

// The driver polls fibers explicitly at dispatch, so wakes carry no
// information and the waker is a no-op.
static NOOP_WAKER_VTABLE: RawWakerVTable =
    RawWakerVTable::new(noop_clone, noop, noop, noop);

unsafe fn noop_clone(_data: *const ()) -> RawWaker {
    RawWaker::new(std::ptr::null(), &NOOP_WAKER_VTABLE)
}

unsafe fn noop(_data: *const ()) {}

pub(crate) fn noop_waker() -> Waker {
    unsafe { Waker::from_raw(RawWaker::new(std::ptr::null(), &NOOP_WAKER_VTABLE)) }
}

enum OpPhase {
    Armed,
    Parked,
}

/// Two-phase future implementing one traced atomic operation.
pub(crate) struct TracedOp<R> {
    op: OpKind,
    target: Option<AtomicId>,
    action: Option<Box<dyn FnOnce() -> R>>,
    phase: OpPhase,
}

impl<R> TracedOp<R> {
    pub fn new(op: OpKind, target: Option<AtomicId>, action: impl FnOnce() -> R + 'static) -> Self {
        Self {
            op,
            target,
            action: Some(Box::new(action)),
            phase: OpPhase::Armed,
        }
    }

    fn perform(&mut self) -> R {
        let action = self
            .action
            .take()
            .expect("atomic operation polled after completion");
        action()
    }
}

impl<R> Future for TracedOp<R> {
    type Output = R;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<R> {
        let this = self.get_mut();
        match this.phase {
            OpPhase::Armed => {
                if !tracing_enabled() {
                    return Poll::Ready(this.perform());
                }
                register_pending(this.op, this.target);
                this.phase = OpPhase::Parked;
                Poll::Pending
            }
            OpPhase::Parked => Poll::Ready(this.perform()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll_once<F: Future + Unpin>(fut: &mut F) -> Poll<F::Output> {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        Pin::new(fut).poll(&mut cx)
    }

    #[test]
    fn untraced_op_resolves_on_first_poll() {
        let mut op = TracedOp::new(OpKind::Get, Some(AtomicId(1)), || 7u64);
        assert_eq!(poll_once(&mut op), Poll::Ready(7));
    }

    #[test]
    fn traced_op_parks_then_performs() {
        set_tracing(true);
        let mut op = TracedOp::new(OpKind::Set, Some(AtomicId(2)), || 3u64);
        assert_eq!(poll_once(&mut op), Poll::Pending);
        let pending = with_context(|ctx| ctx.pending.take()).expect("op registered itself");
        assert_eq!(pending.op, OpKind::Set);
        assert_eq!(pending.target, Some(AtomicId(2)));
        // The second poll is the dispatch: the action runs now.
        assert_eq!(poll_once(&mut op), Poll::Ready(3));
        set_tracing(false);
    }

    #[test]
    fn spawn_assigns_dense_ids() {
        let first = spawn(async {});
        let second = spawn(async {});
        assert_eq!(second.0, first.0 + 1);
        with_context(|ctx| ctx.processes.clear());
    }

    #[test]
    fn atomic_ids_are_minted_consecutively() {
        let first = mint_atomic_id();
        let second = mint_atomic_id();
        assert_eq!(second.0, first.0 + 1);
    }
}
