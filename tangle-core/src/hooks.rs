//! User-facing observation hooks: `check`, `every`, `finally`.
//!
//! The callbacks are installed by the test body each time the driver
//! re-runs it, so they can capture that run's atomics directly.

use crate::report;
use crate::scheduler;

/// Install a callback fired after every dispatched step.
///
/// Tracing is off while the callback runs, so it can inspect atomics
/// with [`crate::Atomic::value`] without becoming part of the schedule.
pub fn every(callback: impl FnMut() + 'static) {
    scheduler::with_context(|ctx| ctx.every_fn = Some(Box::new(callback)));
}

/// Install a callback fired once per fully completed run (after the last
/// step, when every process has finished). Tracing is off while it runs.
pub fn finally(callback: impl FnMut() + 'static) {
    scheduler::with_context(|ctx| ctx.final_fn = Some(Box::new(callback)));
}

/// Assert a predicate about the current state.
///
/// The predicate is evaluated with tracing disabled (and the previous
/// tracing state restored afterwards). On failure the offending
/// interleaving is printed to stdout and the checker panics.
pub fn check(pred: impl FnOnce() -> bool) {
    let was_tracing = scheduler::tracing_enabled();
    scheduler::set_tracing(false);
    let ok = pred();
    scheduler::set_tracing(was_tracing);
    if ok {
        return;
    }

    let (run_number, steps, num_procs) = scheduler::with_context(|ctx| {
        (
            ctx.run_number,
            ctx.schedule_prefix.clone(),
            ctx.processes.len(),
        )
    });
    println!("Found assertion violation at run {run_number}:");
    print!("{}", report::format_interleaving(&steps, num_procs));
    panic!("assertion violation");
}
