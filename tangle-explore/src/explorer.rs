//! The DPOR exploration loop.
//!
//! Exploration grows a tree of schedules, replaying each one with the
//! run driver. Two operations issued by different processes potentially
//! race when they target the same atomic, so for every pending operation
//! at the frontier, exploration must also diverge at the state that
//! precedes that atomic's most recent access on the current execution.
//! That is the whole reduction: states where no pending operation races
//! an earlier access get a single continuation.
//!
//! Wherever a deterministic choice is needed (which enabled process to
//! try first, which backtrack entry to dispatch next) the minimum
//! process id wins, keeping bug reports reproducible.

use std::collections::{BTreeSet, HashMap};
use std::io::{self, Write};

use tracing::{debug, trace};

use tangle_core::{do_run, format_sequence, AtomicId, OpKind, ProcessId, StateCell, Step};

use crate::trace::TraceTracker;

pub(crate) struct Explorer<'p, 'o, 't, F: Fn() + 'p> {
    program: &'p F,
    out: Option<&'o mut dyn Write>,
    tracker: Option<&'t mut TraceTracker>,
    max_runs: Option<u64>,
    pub num_runs: u64,
    pub num_interleavings: u64,
    pub truncated: bool,
}

impl<'p, 'o, 't, F: Fn() + 'p> Explorer<'p, 'o, 't, F> {
    pub fn new(
        program: &'p F,
        out: Option<&'o mut dyn Write>,
        tracker: Option<&'t mut TraceTracker>,
        max_runs: Option<u64>,
    ) -> Self {
        Self {
            program,
            out,
            tracker,
            max_runs,
            num_runs: 0,
            num_interleavings: 0,
            truncated: false,
        }
    }

    /// Explore every reduction-distinct interleaving of the program.
    pub fn run(&mut self) -> io::Result<()> {
        // Process 0's synthetic first step seeds the tree.
        let seed = Step {
            process: ProcessId(0),
            op: OpKind::Start,
            target: None,
        };
        let cell = do_run(self.program, &[seed]);
        self.num_runs = 1;

        let mut state = vec![cell];
        self.explore(&mut state, &HashMap::new(), &HashMap::new())
    }

    fn explore(
        &mut self,
        state: &mut Vec<StateCell>,
        clock: &HashMap<ProcessId, usize>,
        last_access: &HashMap<AtomicId, usize>,
    ) -> io::Result<()> {
        let sidx = state.len() - 1;

        // Seed backtracks: a pending operation on atomic `target` races
        // the step that last touched `target`, so at the state preceding
        // that step either the pending process itself or (if it was not
        // enabled there) every process still enabled must be tried.
        let pending = state[sidx].procs.clone();
        for proc in &pending {
            let Some(target) = proc.target else { continue };
            let Some(&access_time) = last_access.get(&target) else {
                continue;
            };
            debug_assert!(access_time >= 1, "state 0 is a Start step and touches no atomic");
            let pre = &mut state[access_time - 1];
            if pre.enabled.contains(&proc.process) {
                pre.backtrack.insert(proc.process);
            } else {
                let enabled = pre.enabled.clone();
                pre.backtrack.extend(enabled);
            }
        }

        if state[sidx].enabled.is_empty() {
            return self.complete(state);
        }

        let first = *state[sidx]
            .enabled
            .iter()
            .next()
            .expect("enabled is nonempty");
        state[sidx].backtrack = BTreeSet::from([first]);
        let mut dones: BTreeSet<ProcessId> = BTreeSet::new();

        loop {
            if self.truncated {
                break;
            }
            let Some(j) = state[sidx].backtrack.difference(&dones).next().copied() else {
                break;
            };
            dones.insert(j);

            if let Some(max) = self.max_runs {
                if self.num_runs >= max {
                    debug!(max_runs = max, "run budget exhausted, truncating search");
                    self.truncated = true;
                    break;
                }
            }

            let next = state[sidx].procs[j.0];
            let mut schedule: Vec<Step> = state.iter().map(|cell| cell.run).collect();
            schedule.push(Step {
                process: j,
                op: next.op,
                target: next.target,
            });

            trace!(depth = schedule.len(), process = j.0, "extending schedule");
            let cell = do_run(self.program, &schedule);
            self.num_runs += 1;
            state.push(cell);
            let time = state.len() - 1;

            let mut next_clock = clock.clone();
            next_clock.insert(j, time);
            let mut next_access = last_access.clone();
            if let Some(target) = next.target {
                next_access.insert(target, time);
            }

            self.explore(state, &next_clock, &next_access)?;
            state.pop();
        }

        Ok(())
    }

    /// Account for a fully finished execution.
    fn complete(&mut self, state: &[StateCell]) -> io::Result<()> {
        self.num_interleavings += 1;
        let steps: Vec<Step> = state.iter().map(|cell| cell.run).collect();
        let num_procs = state[state.len() - 1].procs.len();
        debug!(
            interleaving = self.num_interleavings,
            steps = steps.len(),
            "completed interleaving"
        );

        if let Some(out) = self.out.as_deref_mut() {
            write!(
                out,
                "{}",
                format_sequence(self.num_interleavings, &steps, num_procs)
            )?;
        }
        if let Some(tracker) = self.tracker.as_deref_mut() {
            tracker.add(&steps);
        }
        Ok(())
    }
}
