//! Core substrate for the `tangle` model checker.
//!
//! This crate provides the pieces a systematic concurrency test is built
//! from: an atomic-cell façade whose operations double as scheduling
//! points, a registry of logical processes, the cooperative scheduler
//! that parks each process at every atomic operation, and the run driver
//! that replays a fixed schedule of `(process, operation, target)`
//! steps.
//!
//! Exploration lives in the companion `tangle-explore` crate; most users
//! interact with this crate through that crate's prelude.
//!
//! # Model
//!
//! Everything runs on a single OS thread. "Processes" are fibers
//! registered with [`spawn`]; only one advances at a time, and it
//! suspends deterministically at each of the six atomic operations (and
//! when its body returns). Because every globally observable action is
//! a suspension point, a schedule fully determines an execution, and
//! replaying a schedule reproduces it exactly.
//!
//! # Example
//!
//! ```rust,ignore
//! use tangle_core::{check, do_run, finally, spawn, Atomic};
//!
//! let program = || {
//!     let counter = Atomic::new(0);
//!     for _ in 0..2 {
//!         let c = counter.clone();
//!         spawn(async move { c.incr().await });
//!     }
//!     let c = counter.clone();
//!     finally(move || check(|| c.value() == 2));
//! };
//! // Replays one specific interleaving; the explorer enumerates them.
//! let state = do_run(&program, &schedule);
//! ```

pub mod atomic;
pub mod driver;
pub mod hooks;
pub mod ids;
pub mod logging;
pub mod process;
pub mod report;
pub mod scheduler;

pub use atomic::{make, Atomic};
pub use driver::{do_run, StateCell, Step};
pub use hooks::{check, every, finally};
pub use ids::{AtomicId, ProcessId};
pub use logging::{init_logging, init_logging_with_level};
pub use process::{OpKind, ProcStep};
pub use report::{format_interleaving, format_sequence};
pub use scheduler::spawn;
