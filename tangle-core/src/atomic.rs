//! The atomic cell façade.
//!
//! An [`Atomic`] wraps a machine sequentially consistent atomic word
//! together with a stable per-run identifier. The identifier is the only
//! thing the explorer ever looks at; payload values are irrelevant to
//! the reduction, so the payload type is collapsed to `u64`.
//!
//! Inside a traced run each operation is a suspension point (see
//! [`crate::scheduler`]). Outside one, the same operations resolve
//! immediately against storage.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::ids::AtomicId;
use crate::process::OpKind;
use crate::scheduler::{self, TracedOp};

/// A shared atomic cell with a stable per-run identifier.
///
/// Clones share the same storage and id; clone the cell to hand it to
/// several process bodies.
#[derive(Debug, Clone)]
pub struct Atomic {
    storage: Arc<AtomicU64>,
    id: AtomicId,
}

impl Atomic {
    /// Create a cell outside any process body.
    ///
    /// This is the untraced constructor, used by the test body itself
    /// (before the processes run) and by standalone code. Ids continue
    /// the same run-local counter as [`make`], so allocation order fully
    /// determines them.
    pub fn new(value: u64) -> Self {
        Self {
            storage: Arc::new(AtomicU64::new(value)),
            id: scheduler::mint_atomic_id(),
        }
    }

    /// The cell's identifier within the current run.
    pub fn id(&self) -> AtomicId {
        self.id
    }

    /// Direct sequentially consistent load, bypassing the scheduler.
    ///
    /// For assertion callbacks (`check`, `every`, `finally`), which run
    /// with tracing off and are not processes.
    pub fn value(&self) -> u64 {
        self.storage.load(Ordering::SeqCst)
    }

    /// Read the cell.
    pub async fn get(&self) -> u64 {
        let storage = Arc::clone(&self.storage);
        TracedOp::new(OpKind::Get, Some(self.id), move || {
            storage.load(Ordering::SeqCst)
        })
        .await
    }

    /// Write `value` to the cell.
    pub async fn set(&self, value: u64) {
        let storage = Arc::clone(&self.storage);
        TracedOp::new(OpKind::Set, Some(self.id), move || {
            storage.store(value, Ordering::SeqCst)
        })
        .await
    }

    /// Write `value`, returning the previous value.
    pub async fn exchange(&self, value: u64) -> u64 {
        let storage = Arc::clone(&self.storage);
        TracedOp::new(OpKind::Exchange, Some(self.id), move || {
            storage.swap(value, Ordering::SeqCst)
        })
        .await
    }

    /// If the cell holds `expected`, replace it with `new`. Returns
    /// whether the swap happened.
    pub async fn compare_and_set(&self, expected: u64, new: u64) -> bool {
        let storage = Arc::clone(&self.storage);
        TracedOp::new(OpKind::CompareAndSwap, Some(self.id), move || {
            storage
                .compare_exchange(expected, new, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        })
        .await
    }

    /// Add `delta` (wrapping), returning the previous value.
    pub async fn fetch_and_add(&self, delta: i64) -> u64 {
        let storage = Arc::clone(&self.storage);
        TracedOp::new(OpKind::FetchAndAdd, Some(self.id), move || {
            storage.fetch_add(delta as u64, Ordering::SeqCst)
        })
        .await
    }

    /// `fetch_and_add(1)` with the result discarded.
    pub async fn incr(&self) {
        self.fetch_and_add(1).await;
    }

    /// `fetch_and_add(-1)` with the result discarded.
    pub async fn decr(&self) {
        self.fetch_and_add(-1).await;
    }
}

/// Allocate a new cell from inside a process body (the traced `Make`
/// operation).
///
/// The id is minted and the cell allocated when the process parks at
/// this operation, so a parked `Make` already has a definite target; the
/// cell is delivered when the step is dispatched.
pub async fn make(value: u64) -> Atomic {
    MakeOp {
        value,
        cell: None,
    }
    .await
}

struct MakeOp {
    value: u64,
    cell: Option<Atomic>,
}

impl Future for MakeOp {
    type Output = Atomic;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Atomic> {
        let this = self.get_mut();
        if let Some(cell) = this.cell.take() {
            return Poll::Ready(cell);
        }
        let cell = Atomic {
            storage: Arc::new(AtomicU64::new(this.value)),
            id: scheduler::mint_atomic_id(),
        };
        if !scheduler::tracing_enabled() {
            return Poll::Ready(cell);
        }
        scheduler::register_pending(OpKind::Make, Some(cell.id));
        this.cell = Some(cell);
        Poll::Pending
    }
}
