//! Systematic exploration for `tangle` test programs.
//!
//! This crate drives the `tangle-core` run driver through every
//! reduction-distinct interleaving of a test program (dynamic
//! partial-order reduction over a per-atomic last-access relation), or
//! through a seeded random sample of interleavings when exhaustion is
//! out of reach.
//!
//! # Example
//!
//! ```rust,no_run
//! use tangle_explore::prelude::*;
//!
//! let report = trace(|| {
//!     let counter = Atomic::new(0);
//!     for _ in 0..2 {
//!         let c = counter.clone();
//!         spawn(async move {
//!             c.incr().await;
//!         });
//!     }
//!     let c = counter.clone();
//!     finally(move || check(|| c.value() == 2));
//! })
//! .unwrap();
//! assert!(report.completed);
//! ```

mod explorer;

pub mod harness;
pub mod io;
pub mod random;
pub mod trace;

/// Prelude for writing checker tests.
pub mod prelude {
    pub use crate::harness::{
        trace, trace_to, trace_with, ExploreError, Report, TraceConfig, TRACE_FILE_ENV,
    };
    pub use crate::io::{
        format_from_extension, read_trace_set_from_path, write_trace_set_to_path, TraceFormat,
        TraceIoError,
    };
    pub use crate::random::{sample, sample_to};
    pub use crate::trace::{Interleaving, TraceOp, TraceSet, TraceStep, TraceTracker};
    pub use tangle_core::{
        check, do_run, every, finally, make, spawn, Atomic, AtomicId, OpKind, ProcStep,
        ProcessId, StateCell, Step,
    };
}
