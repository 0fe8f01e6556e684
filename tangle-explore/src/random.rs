//! Seeded random-walk sampling of interleavings.
//!
//! A cheap alternative to the exhaustive search for programs whose state
//! space is too large: each sample picks uniformly among the enabled
//! processes at every step until all processes finish. The schedule is
//! grown by replaying its prefix, exactly as the exhaustive explorer
//! does, so `check`/`every`/`finally` behave identically. Identical
//! seeds sample identical schedules.

use std::io::Write;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use tangle_core::{do_run, format_sequence, OpKind, ProcessId, Step};

use crate::harness::{ExploreError, Report};

/// Sample `runs` random maximal interleavings of `program`.
pub fn sample(seed: u64, runs: u64, program: impl Fn()) -> Result<Report, ExploreError> {
    sample_to(None, seed, runs, program)
}

/// Like [`sample`], also printing each interleaving and a summary to
/// `out`.
pub fn sample_to(
    mut out: Option<&mut dyn Write>,
    seed: u64,
    runs: u64,
    program: impl Fn(),
) -> Result<Report, ExploreError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut states = 0u64;

    for sample_number in 1..=runs {
        let mut schedule = vec![Step {
            process: ProcessId(0),
            op: OpKind::Start,
            target: None,
        }];

        loop {
            let cell = do_run(&program, &schedule);
            states += 1;

            if cell.enabled.is_empty() {
                debug!(sample = sample_number, steps = schedule.len(), "sample finished");
                if let Some(out) = out.as_deref_mut() {
                    write!(
                        out,
                        "{}",
                        format_sequence(sample_number, &schedule, cell.procs.len())
                    )?;
                }
                break;
            }

            let enabled: Vec<ProcessId> = cell.enabled.iter().copied().collect();
            let pick = enabled[rng.gen_range(0..enabled.len())];
            let next = cell.procs[pick.0];
            schedule.push(Step {
                process: pick,
                op: next.op,
                target: next.target,
            });
        }
    }

    let report = Report {
        interleavings: runs,
        states,
        completed: true,
    };
    if let Some(out) = out {
        writeln!(
            out,
            "explored {} interleavings and {} states",
            report.interleavings, report.states
        )?;
    }
    Ok(report)
}
