//! Serializable interleaving sets.
//!
//! These are mirrors of the core step types with serde derives, kept
//! separate so the wire format does not depend on checker internals.
//! The format is intentionally minimal; its main consumer is offline
//! bug-reproduction tooling.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use tangle_core::{OpKind, Step};

/// Operation kind as recorded in a dumped interleaving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TraceOp {
    Start,
    Make,
    Get,
    Set,
    Exchange,
    CompareAndSwap,
    FetchAndAdd,
}

impl From<OpKind> for TraceOp {
    fn from(op: OpKind) -> Self {
        match op {
            OpKind::Start => TraceOp::Start,
            OpKind::Make => TraceOp::Make,
            OpKind::Get => TraceOp::Get,
            OpKind::Set => TraceOp::Set,
            OpKind::Exchange => TraceOp::Exchange,
            OpKind::CompareAndSwap => TraceOp::CompareAndSwap,
            OpKind::FetchAndAdd => TraceOp::FetchAndAdd,
        }
    }
}

/// One recorded step: acting process, operation, optional target id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TraceStep {
    pub process: usize,
    pub op: TraceOp,
    pub target: Option<u64>,
}

impl From<Step> for TraceStep {
    fn from(step: Step) -> Self {
        Self {
            process: step.process.0,
            op: step.op.into(),
            target: step.target.map(|t| t.0),
        }
    }
}

/// A complete recorded interleaving, initial state to all-finished.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interleaving {
    pub steps: Vec<TraceStep>,
}

/// The set of interleavings recorded by one exploration.
///
/// Deduplicated and deterministically ordered, so dumps of identical
/// explorations are byte-identical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSet {
    pub interleavings: Vec<Interleaving>,
}

/// Collector fed by the explorer as interleavings complete.
#[derive(Debug, Default)]
pub struct TraceTracker {
    seen: BTreeSet<Interleaving>,
}

impl TraceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, steps: &[Step]) {
        self.seen.insert(Interleaving {
            steps: steps.iter().copied().map(Into::into).collect(),
        });
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn into_set(self) -> TraceSet {
        TraceSet {
            interleavings: self.seen.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangle_core::{AtomicId, ProcessId};

    fn step(process: usize, op: OpKind, target: Option<u64>) -> Step {
        Step {
            process: ProcessId(process),
            op,
            target: target.map(AtomicId),
        }
    }

    #[test]
    fn tracker_deduplicates_identical_interleavings() {
        let mut tracker = TraceTracker::new();
        let steps = [step(0, OpKind::Start, None), step(0, OpKind::Set, Some(1))];
        tracker.add(&steps);
        tracker.add(&steps);
        tracker.add(&[step(0, OpKind::Start, None)]);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn set_ordering_is_deterministic() {
        let a = [step(0, OpKind::Start, None), step(1, OpKind::Start, None)];
        let b = [step(0, OpKind::Start, None), step(0, OpKind::Get, Some(1))];

        let mut forward = TraceTracker::new();
        forward.add(&a);
        forward.add(&b);

        let mut reverse = TraceTracker::new();
        reverse.add(&b);
        reverse.add(&a);

        assert_eq!(forward.into_set(), reverse.into_set());
    }
}
